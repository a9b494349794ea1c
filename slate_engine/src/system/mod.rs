//! Per-frame systems
//!
//! Every system runs through the same state machine
//! (Inactive -> Starting -> Updating -> Stopping -> Inactive) and is driven
//! by a [`SystemManager`] in registration order.

mod lifecycle;
mod system_manager;
mod transform_system;
mod render_system;
mod shader_system;

pub use lifecycle::{ScheduledSystem, System, SystemContext, SystemState};
pub use system_manager::SystemManager;
pub use transform_system::TransformSystem;
pub use render_system::RenderSystem;
pub use shader_system::{ShaderId, ShaderSystem};
