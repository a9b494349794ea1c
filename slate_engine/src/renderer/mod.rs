/// Renderer module - the narrow interface the core drives the GPU through

pub mod backend;
pub mod buffer;
pub mod shader_module;
pub mod draw;
pub mod recording_backend;

pub use backend::*;
pub use buffer::*;
pub use shader_module::*;
pub use draw::*;
pub use recording_backend::{RecordingBackend, RecordingBuffer, RecordingShaderModule, DeviceUpdate};
