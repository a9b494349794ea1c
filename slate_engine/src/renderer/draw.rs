/// Draw requests submitted by the render system

use glam::Mat4;
use std::sync::Arc;

use crate::ecs::Entity;
use crate::renderer::{GpuBuffer, GpuShaderModule};

/// Built-in primitive shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveShape {
    /// Nothing to draw
    #[default]
    Empty,
    Quad,
    Plane,
    Cube,
    Sphere,
}

/// Geometry source of a draw
#[derive(Clone)]
pub enum DrawGeometry {
    /// Backend-provided primitive mesh
    Primitive(PrimitiveShape),
    /// Uploaded mesh buffers
    Mesh {
        vertex_buffer: Arc<dyn GpuBuffer>,
        index_buffer: Option<Arc<dyn GpuBuffer>>,
        vertex_count: u32,
        index_count: u32,
    },
}

/// One draw, keyed by the entity that produced it
#[derive(Clone)]
pub struct DrawRequest {
    pub entity: Entity,
    /// World matrix of the entity
    pub world: Mat4,
    pub geometry: DrawGeometry,
    /// Shader module of the entity's Renderable, if any
    pub shader: Option<Arc<dyn GpuShaderModule>>,
}

impl DrawRequest {
    /// Primitive shape drawn, if this is a primitive draw
    pub fn primitive(&self) -> Option<PrimitiveShape> {
        match self.geometry {
            DrawGeometry::Primitive(shape) => Some(shape),
            DrawGeometry::Mesh { .. } => None,
        }
    }
}
