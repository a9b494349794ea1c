/// Scene - one registry plus the systems that run over it
///
/// Every entity created through the scene carries a `Name`, an `Active`
/// flag and a `Hierarchy` node. The component dependency table and the set
/// of components copied by `duplicate_entity` are installed at construction.

use std::sync::Arc;

use crate::config::DEFAULT_MAX_REGISTERED_SHADERS;
use crate::ecs::{hierarchy, Component, Entity, Hierarchy, Registry};
use crate::error::{Error, Result};
use crate::renderer::RenderBackend;
use crate::resource::{ResourceRef, ShaderResource};
use crate::scene::{
    Active, AmbientLight, Audio, DirectionalLight, GeometryGltf, GeometryPrimitive, Name, PointLight,
    Renderable, Script, SpotLight, Transform,
};
use crate::shader::ShaderCompiler;
use crate::system::{ShaderId, ShaderSystem, SystemContext, SystemManager};

/// Name given to entities created without one
pub const DEFAULT_ENTITY_NAME: &str = "Unnamed Entity";

pub struct Scene {
    registry: Registry,
    systems: SystemManager,
}

impl Scene {
    pub fn new(compiler: Arc<dyn ShaderCompiler>) -> Self {
        Self::with_shader_capacity(compiler, DEFAULT_MAX_REGISTERED_SHADERS)
    }

    pub fn with_shader_capacity(compiler: Arc<dyn ShaderCompiler>, max_shaders: usize) -> Self {
        Self {
            registry: scene_registry(),
            systems: SystemManager::with_default_systems(compiler, max_shaders),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn systems(&self) -> &SystemManager {
        &self.systems
    }

    pub fn systems_mut(&mut self) -> &mut SystemManager {
        &mut self.systems
    }

    // ===== ENTITIES =====

    /// Create an entity named [`DEFAULT_ENTITY_NAME`]
    pub fn create_entity(&mut self) -> Result<Entity> {
        self.create_named_entity(DEFAULT_ENTITY_NAME)
    }

    pub fn create_named_entity(&mut self, name: impl Into<String>) -> Result<Entity> {
        let entity = self.registry.create();
        self.registry.add(entity, Name(name.into()))?;
        self.registry.add(entity, Active(true))?;
        self.registry.add(entity, Hierarchy::default())?;
        Ok(entity)
    }

    /// Copy `source` into a new sibling with a derived name
    ///
    /// Children are not duplicated.
    pub fn duplicate_entity(&mut self, source: Entity) -> Result<Entity> {
        let name = next_duplicate_name(&self.registry.get::<Name>(source)?.0);
        let active = self.is_active(source);

        let parent = hierarchy::parent(&self.registry, source);
        if let Some(parent) = parent {
            if hierarchy::children(&self.registry, parent).len() >= hierarchy::MAX_CHILD_COUNT {
                crate::engine_error!("slate::Scene",
                    "Cannot duplicate {:?}: parent {:?} has no free child slot", source, parent);
                return Err(Error::CapacityExceeded {
                    what: "children per entity",
                    capacity: hierarchy::MAX_CHILD_COUNT,
                });
            }
        }

        let copy = self.create_named_entity(name)?;
        if let Err(err) = self.fill_duplicate(source, copy, active, parent) {
            self.registry.destroy(copy)?;
            return Err(err);
        }
        Ok(copy)
    }

    fn fill_duplicate(&mut self, source: Entity, copy: Entity, active: bool, parent: Option<Entity>) -> Result<()> {
        self.registry.copy_components(source, copy)?;
        self.registry.get_mut::<Active>(copy)?.0 = active;
        if let Some(parent) = parent {
            hierarchy::add_child(&mut self.registry, parent, copy)?;
        }
        Ok(())
    }

    /// Destroy `entity` and its whole subtree
    ///
    /// Returns the destroyed handles, children before their parents.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<Vec<Entity>> {
        if !self.registry.is_alive(entity) {
            crate::engine_bail!(NotFound, "slate::Scene", "Cannot destroy {:?}: not alive", entity);
        }
        hierarchy::detach(&mut self.registry, entity)?;

        let mut order = Vec::new();
        collect_post_order(&self.registry, entity, &mut order);
        for &doomed in &order {
            self.registry.destroy(doomed)?;
        }
        Ok(order)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    /// First entity called `name`
    pub fn entity_by_name(&self, name: &str) -> Result<Entity> {
        match self.find_entity_by_name(name) {
            Some(entity) => Ok(entity),
            None => Err(crate::engine_err!(NotFound, "slate::Scene", "No entity named '{}'", name)),
        }
    }

    pub fn find_entity_by_name(&self, name: &str) -> Option<Entity> {
        self.registry.view::<Name>().find(|(_, n)| n.0 == name).map(|(entity, _)| entity)
    }

    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.registry.try_get::<Name>(entity).map(|n| n.0.as_str())
    }

    pub fn set_name(&mut self, entity: Entity, name: impl Into<String>) -> Result<()> {
        self.registry.get_or_insert_with(entity, || Name(String::new()))?.0 = name.into();
        Ok(())
    }

    /// Entities without a parent
    pub fn root_entities(&self) -> Vec<Entity> {
        hierarchy::roots(&self.registry)
    }

    pub fn all_entities(&self) -> Vec<Entity> {
        self.registry.entities().collect()
    }

    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    // ===== HIERARCHY =====

    pub fn add_child(&mut self, parent: Entity, child: Entity) -> Result<()> {
        hierarchy::add_child(&mut self.registry, parent, child)
    }

    pub fn remove_child(&mut self, parent: Entity, child: Entity) -> Result<()> {
        hierarchy::remove_child(&mut self.registry, parent, child)
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        hierarchy::parent(&self.registry, entity)
    }

    pub fn children(&self, entity: Entity) -> &[Entity] {
        hierarchy::children(&self.registry, entity)
    }

    /// Entities without an `Active` flag count as active
    pub fn is_active(&self, entity: Entity) -> bool {
        self.registry.try_get::<Active>(entity).map_or(true, |a| a.0)
    }

    pub fn set_active(&mut self, entity: Entity, active: bool) -> Result<()> {
        self.registry.get_or_insert_with(entity, Active::default)?.0 = active;
        Ok(())
    }

    // ===== SINGLETONS =====

    /// First `T` in iteration order
    pub fn singleton<T: Component>(&self) -> Option<&T> {
        self.registry.first::<T>().map(|(_, component)| component)
    }

    /// First `T`, or `default` when the scene has none
    pub fn singleton_or<'a, T: Component>(&'a self, default: &'a T) -> &'a T {
        self.singleton::<T>().unwrap_or(default)
    }

    pub fn ambient_light_or<'a>(&'a self, default: &'a AmbientLight) -> &'a AmbientLight {
        self.singleton_or(default)
    }

    pub fn directional_light_or<'a>(&'a self, default: &'a DirectionalLight) -> &'a DirectionalLight {
        self.singleton_or(default)
    }

    // ===== SYSTEMS =====

    pub fn shader_system(&self) -> Option<&ShaderSystem> {
        self.systems.get::<ShaderSystem>()
    }

    pub fn shader_system_mut(&mut self) -> Option<&mut ShaderSystem> {
        self.systems.get_mut::<ShaderSystem>()
    }

    /// Compile and register `shader` with the scene's shader system
    pub fn register_shader(&mut self, shader: ResourceRef<ShaderResource>) -> Result<ShaderId> {
        match self.shader_system_mut() {
            Some(system) => system.register(shader),
            None => Err(crate::engine_err!(InvalidState, "slate::Scene", "Scene has no shader system")),
        }
    }

    pub fn is_running(&self) -> bool {
        self.systems.is_running()
    }

    pub fn start(&mut self) -> Result<()> {
        crate::engine_debug!("slate::Scene", "Starting systems {:?}", self.systems.names());
        self.systems.start_all(&mut self.registry)
    }

    /// Run one update of every system
    pub fn tick<'a>(&'a mut self, delta_time: f64, backend: Option<&'a mut dyn RenderBackend>) -> Result<()> {
        let mut ctx = SystemContext {
            registry: &mut self.registry,
            backend,
            delta_time,
        };
        self.systems.update_all(&mut ctx)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.systems.stop_all(&mut self.registry)
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        if self.systems.is_running() {
            if let Err(err) = self.stop() {
                crate::engine_warn!("slate::Scene", "Stopping systems on drop failed: {}", err);
            }
        }
    }
}

/// Registry with the scene's dependency table and duplicable components
fn scene_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_dependency::<Transform, GeometryGltf>();
    registry.register_dependency::<Transform, GeometryPrimitive>();
    registry.register_dependency::<Transform, PointLight>();
    registry.register_dependency::<Transform, SpotLight>();
    registry.register_dependency::<Transform, DirectionalLight>();

    registry.register_duplicable::<Transform>();
    registry.register_duplicable::<GeometryPrimitive>();
    registry.register_duplicable::<GeometryGltf>();
    registry.register_duplicable::<Renderable>();
    registry.register_duplicable::<Script>();
    registry.register_duplicable::<Audio>();
    registry.register_duplicable::<PointLight>();
    registry.register_duplicable::<SpotLight>();
    registry.register_duplicable::<DirectionalLight>();
    registry.register_duplicable::<AmbientLight>();
    registry
}

fn collect_post_order(registry: &Registry, entity: Entity, order: &mut Vec<Entity>) {
    for &child in hierarchy::children(registry, entity) {
        collect_post_order(registry, child, order);
    }
    order.push(entity);
}

/// Name for a copy of `name`: a trailing " N" becomes " N+1", anything
/// else gets " 2" appended
pub fn next_duplicate_name(name: &str) -> String {
    if let Some((base, suffix)) = name.rsplit_once(' ') {
        if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Some(next) = suffix.parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
                return format!("{} {}", base, next);
            }
        }
    }
    format!("{} 2", name)
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
