/// TransformSystem - derives world transforms from the hierarchy
///
/// Pre-order walk from the roots: each entity's world matrix is its
/// parent's world matrix times its local TRS matrix. Entities without a
/// `Transform` pass their parent's matrix through to their children.

use std::any::Any;

use glam::Mat4;

use crate::ecs::{hierarchy, Entity, Registry};
use crate::error::Result;
use crate::scene::Transform;
use crate::system::{System, SystemContext};

#[derive(Debug, Default)]
pub struct TransformSystem {
    /// Entities visited by the last update
    visited: usize,
}

impl TransformSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Recompute the world matrix of every entity reachable from a root
    pub fn propagate(registry: &mut Registry) -> usize {
        let mut stack: Vec<(Entity, Mat4)> = hierarchy::roots(registry)
            .into_iter()
            .rev()
            .map(|root| (root, Mat4::IDENTITY))
            .collect();
        let mut visited = 0;

        while let Some((entity, parent_world)) = stack.pop() {
            visited += 1;
            let world = match registry.try_get_mut::<Transform>(entity) {
                Some(transform) => {
                    transform.world = parent_world * transform.local.matrix();
                    transform.world
                }
                None => parent_world,
            };
            stack.extend(hierarchy::children(registry, entity).iter().rev().map(|&child| (child, world)));
        }
        visited
    }
}

impl System for TransformSystem {
    fn name(&self) -> &'static str {
        "TransformSystem"
    }

    fn on_update(&mut self, ctx: &mut SystemContext<'_>) -> Result<()> {
        self.visited = Self::propagate(ctx.registry);
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
#[path = "transform_system_tests.rs"]
mod tests;
