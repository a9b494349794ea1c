/// RenderSystem - turns the active scene tree into draw requests
///
/// Walks each root depth-first, skipping inactive subtrees. Mesh buffers and
/// shader modules are created on first use through the backend.

use std::any::Any;
use std::sync::Arc;

use glam::Mat4;

use crate::ecs::{hierarchy, Entity, Registry};
use crate::error::Result;
use crate::renderer::{DrawGeometry, DrawRequest, GpuShaderModule, PrimitiveShape, RenderBackend};
use crate::resource::write_resource;
use crate::scene::{Active, GeometryGltf, GeometryPrimitive, Renderable, Transform};
use crate::system::{System, SystemContext};

#[derive(Debug, Default)]
pub struct RenderSystem {
    /// Draws submitted by the last update
    submitted: usize,
}

impl RenderSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    fn submit_subtree(
        &mut self,
        registry: &Registry,
        backend: &mut dyn RenderBackend,
        entity: Entity,
    ) -> Result<()> {
        if registry.try_get::<Active>(entity).is_some_and(|a| !a.0) {
            return Ok(());
        }
        self.submit_entity(registry, backend, entity)?;
        for &child in hierarchy::children(registry, entity) {
            self.submit_subtree(registry, backend, child)?;
        }
        Ok(())
    }

    fn submit_entity(
        &mut self,
        registry: &Registry,
        backend: &mut dyn RenderBackend,
        entity: Entity,
    ) -> Result<()> {
        let primitive = registry.try_get::<GeometryPrimitive>(entity)
            .map(|g| g.shape)
            .filter(|&shape| shape != PrimitiveShape::Empty);
        let gltf = registry.try_get::<GeometryGltf>(entity);
        if primitive.is_none() && gltf.is_none() {
            return Ok(());
        }

        let world = registry.try_get::<Transform>(entity)
            .map_or(Mat4::IDENTITY, |t| t.world_matrix());
        let shader = match registry.try_get::<Renderable>(entity) {
            Some(renderable) => shader_module(renderable, backend)?,
            None => None,
        };

        if let Some(shape) = primitive {
            backend.submit_draw(DrawRequest {
                entity,
                world,
                geometry: DrawGeometry::Primitive(shape),
                shader: shader.clone(),
            })?;
            self.submitted += 1;
        }

        if let Some(gltf) = gltf {
            let mut mesh = write_resource(&gltf.mesh)?;
            let (vertex_buffer, index_buffer) = match mesh.ensure_gpu_buffers(backend) {
                Ok(buffers) => buffers,
                Err(err) => {
                    crate::engine_warn!("slate::RenderSystem", "Skipping mesh of {:?}: {}", entity, err);
                    return Ok(());
                }
            };
            backend.submit_draw(DrawRequest {
                entity,
                world,
                geometry: DrawGeometry::Mesh {
                    vertex_buffer,
                    index_buffer,
                    vertex_count: mesh.vertex_count(),
                    index_count: mesh.index_count(),
                },
                shader,
            })?;
            self.submitted += 1;
        }
        Ok(())
    }
}

/// Module of a compiled shader; uncompiled shaders draw without one
fn shader_module(
    renderable: &Renderable,
    backend: &mut dyn RenderBackend,
) -> Result<Option<Arc<dyn GpuShaderModule>>> {
    let mut shader = write_resource(&renderable.shader)?;
    if !shader.is_compiled() {
        return Ok(None);
    }
    shader.ensure_module(backend).map(Some)
}

impl System for RenderSystem {
    fn name(&self) -> &'static str {
        "RenderSystem"
    }

    fn on_update(&mut self, ctx: &mut SystemContext<'_>) -> Result<()> {
        self.submitted = 0;
        let Some(backend) = ctx.backend.as_deref_mut() else {
            return Ok(());
        };
        for root in hierarchy::roots(ctx.registry) {
            self.submit_subtree(ctx.registry, backend, root)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "render_system_tests.rs"]
mod tests;
