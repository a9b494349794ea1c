//! Entity/component storage
//!
//! Entities are generational handles; components live in per-type sparse
//! sets owned by a [`Registry`]. The registry also carries the dependency
//! table (auto-insert/cascade-remove) and the parent/child hierarchy.

mod entity;
mod component;
mod storage;
mod registry;
pub mod hierarchy;

pub use entity::Entity;
pub use component::Component;
pub use storage::ComponentStorage;
pub use registry::Registry;
pub use hierarchy::{ChildList, Hierarchy, MAX_CHILD_COUNT};
