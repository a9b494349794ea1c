/// Registry - owns entities and their components
///
/// Dependencies between component types are an explicit table consulted
/// inside `add` and `remove`:
/// - adding a dependent attaches a default dependency when it is missing
/// - removing a dependency removes every dependent on that entity
///
/// so no entity can carry a dependent without its dependency.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use std::any::TypeId;

use crate::ecs::component::{component_name, Component};
use crate::ecs::storage::{AnyStorage, ComponentStorage};
use crate::ecs::{hierarchy, Entity};
use crate::error::{Error, Result};
use crate::{engine_err, engine_trace, engine_warn};

/// One "dependent requires dependency" pair
#[derive(Clone, Copy)]
struct DependencyRule {
    dependency: TypeId,
    dependent: TypeId,
    /// Inserts a default dependency (and, recursively, its own dependencies)
    attach_dependency: fn(&mut Registry, Entity) -> Result<()>,
}

/// Entity registry with sparse-set component storages
pub struct Registry {
    entities: SlotMap<Entity, ()>,
    storages: FxHashMap<TypeId, Box<dyn AnyStorage>>,
    dependencies: Vec<DependencyRule>,
    duplicable: Vec<TypeId>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            storages: FxHashMap::default(),
            dependencies: Vec::new(),
            duplicable: Vec::new(),
        }
    }

    // ===== ENTITIES =====

    /// Allocate a fresh entity
    pub fn create(&mut self) -> Entity {
        self.entities.insert(())
    }

    /// Destroy an entity and every component it carries
    ///
    /// The entity leaves its parent's child list and its children become
    /// roots; use `Scene::destroy_entity` to take a whole subtree down.
    pub fn destroy(&mut self, entity: Entity) -> Result<()> {
        if !self.is_alive(entity) {
            return Err(engine_err!(NotFound, "slate::Registry",
                "Cannot destroy entity {:?}: not alive", entity));
        }
        hierarchy::unlink(self, entity);
        self.entities.remove(entity);
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        Ok(())
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All live entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys()
    }

    /// Destroy every entity; registered tables are kept
    pub fn clear(&mut self) {
        self.entities.clear();
        for storage in self.storages.values_mut() {
            storage.clear();
        }
    }

    // ===== COMPONENTS =====

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.storage::<T>().map_or(false, |s| s.contains(entity))
    }

    /// Component of `entity`, if attached
    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>().and_then(|s| s.get(entity))
    }

    pub fn try_get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>().and_then(|s| s.get_mut(entity))
    }

    /// Component of `entity`; `NotFound` if absent
    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T> {
        self.try_get::<T>(entity).ok_or_else(|| engine_err!(NotFound, "slate::Registry",
            "Entity {:?} has no {} component", entity, component_name::<T>()))
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        match self.storage_mut::<T>().and_then(|s| s.get_mut(entity)) {
            Some(value) => Ok(value),
            None => Err(engine_err!(NotFound, "slate::Registry",
                "Entity {:?} has no {} component", entity, component_name::<T>())),
        }
    }

    /// Attach a component
    ///
    /// Fails with `AlreadyExists` if the entity already carries one, and with
    /// `NotFound` if the entity is dead. Missing dependencies are attached
    /// first with their default value.
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) -> Result<&mut T> {
        self.ensure_alive(entity)?;
        if self.has::<T>(entity) {
            return Err(engine_err!(AlreadyExists, "slate::Registry",
                "Entity {:?} already has a {} component", entity, component_name::<T>()));
        }
        self.attach_dependencies(TypeId::of::<T>(), entity)?;
        if T::UNIQUE && self.count::<T>() > 0 {
            engine_warn!("slate::Registry",
                "{} is unique but another instance already exists; the first one wins",
                component_name::<T>());
        }
        Ok(self.storage_entry::<T>()?.insert(entity, value))
    }

    /// Existing component, or a freshly attached one built by `make`
    pub fn get_or_insert_with<T: Component>(
        &mut self,
        entity: Entity,
        make: impl FnOnce() -> T,
    ) -> Result<&mut T> {
        self.ensure_alive(entity)?;
        if !self.has::<T>(entity) {
            self.attach_dependencies(TypeId::of::<T>(), entity)?;
            self.storage_entry::<T>()?.insert(entity, make());
        }
        self.get_mut::<T>(entity)
    }

    /// Detach a component and every component depending on it
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Result<T> {
        let removed = self.storage_mut::<T>().and_then(|s| s.remove(entity));
        match removed {
            Some(value) => {
                self.remove_dependents(TypeId::of::<T>(), entity);
                Ok(value)
            }
            None => Err(engine_err!(NotFound, "slate::Registry",
                "Cannot remove {} from entity {:?}: not attached", component_name::<T>(), entity)),
        }
    }

    // ===== VIEWS =====

    /// Entities carrying `T` with their component, in storage order
    pub fn view<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.storage::<T>().into_iter().flat_map(|s| s.iter())
    }

    pub fn view_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.storage_mut::<T>().into_iter().flat_map(|s| s.iter_mut())
    }

    /// Snapshot of the entities carrying `T`
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        self.storage::<T>().map(|s| s.entities().to_vec()).unwrap_or_default()
    }

    /// First instance of `T` in iteration order
    pub fn first<T: Component>(&self) -> Option<(Entity, &T)> {
        self.view::<T>().next()
    }

    pub fn count<T: Component>(&self) -> usize {
        self.storage::<T>().map_or(0, |s| s.len())
    }

    // ===== DEPENDENCY TABLE =====

    /// Declare that `T` requires `D`
    ///
    /// Registering the same pair twice has no effect.
    pub fn register_dependency<D: Component + Default, T: Component>(&mut self) {
        let dependency = TypeId::of::<D>();
        let dependent = TypeId::of::<T>();
        if self.dependencies.iter().any(|r| r.dependency == dependency && r.dependent == dependent) {
            return;
        }
        self.dependencies.push(DependencyRule {
            dependency,
            dependent,
            attach_dependency: Self::attach_default::<D>,
        });
    }

    /// Whether `T` has been declared to require `D`
    pub fn depends_on<D: Component, T: Component>(&self) -> bool {
        let (dependency, dependent) = (TypeId::of::<D>(), TypeId::of::<T>());
        self.dependencies.iter().any(|r| r.dependency == dependency && r.dependent == dependent)
    }

    fn attach_default<D: Component + Default>(&mut self, entity: Entity) -> Result<()> {
        if self.has::<D>(entity) {
            return Ok(());
        }
        self.attach_dependencies(TypeId::of::<D>(), entity)?;
        self.storage_entry::<D>()?.insert(entity, D::default());
        engine_trace!("slate::Registry", "Auto-attached {} to entity {:?}", component_name::<D>(), entity);
        Ok(())
    }

    fn attach_dependencies(&mut self, dependent: TypeId, entity: Entity) -> Result<()> {
        let missing: Vec<DependencyRule> = self.dependencies.iter()
            .filter(|r| r.dependent == dependent && !self.has_erased(r.dependency, entity))
            .copied()
            .collect();
        for rule in missing {
            (rule.attach_dependency)(self, entity)?;
        }
        Ok(())
    }

    fn remove_dependents(&mut self, dependency: TypeId, entity: Entity) {
        let dependents: Vec<TypeId> = self.dependencies.iter()
            .filter(|r| r.dependency == dependency)
            .map(|r| r.dependent)
            .collect();
        for dependent in dependents {
            let removed = match self.storages.get_mut(&dependent) {
                Some(storage) => {
                    if storage.remove_entity(entity) {
                        Some(storage.component_name())
                    } else {
                        None
                    }
                }
                None => None,
            };
            if let Some(name) = removed {
                engine_trace!("slate::Registry", "Removed dependent {} from entity {:?}", name, entity);
                self.remove_dependents(dependent, entity);
            }
        }
    }

    // ===== DUPLICATION =====

    /// Add `T` to the set of components copied by [`copy_components`](Self::copy_components)
    pub fn register_duplicable<T: Component>(&mut self) {
        let id = TypeId::of::<T>();
        if !self.duplicable.contains(&id) {
            self.duplicable.push(id);
        }
    }

    /// Copy every duplicable component of `src` onto `dst`, overwriting
    ///
    /// Returns the number of components copied.
    pub fn copy_components(&mut self, src: Entity, dst: Entity) -> Result<usize> {
        self.ensure_alive(src)?;
        self.ensure_alive(dst)?;
        let mut copied = 0;
        for id in self.duplicable.clone() {
            if !self.has_erased(id, src) {
                continue;
            }
            self.attach_dependencies(id, dst)?;
            if let Some(storage) = self.storages.get_mut(&id) {
                if storage.clone_entity(src, dst) {
                    copied += 1;
                }
            }
        }
        Ok(copied)
    }

    // ===== INTERNAL =====

    fn ensure_alive(&self, entity: Entity) -> Result<()> {
        if self.is_alive(entity) {
            Ok(())
        } else {
            Err(engine_err!(NotFound, "slate::Registry", "Entity {:?} is not alive", entity))
        }
    }

    fn has_erased(&self, id: TypeId, entity: Entity) -> bool {
        self.storages.get(&id).map_or(false, |s| s.contains(entity))
    }

    fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages.get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<ComponentStorage<T>>())
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages.get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStorage<T>>())
    }

    fn storage_entry<T: Component>(&mut self) -> Result<&mut ComponentStorage<T>> {
        self.storages.entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()))
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
            .ok_or_else(|| Error::BackendError(format!(
                "component storage for {} has a mismatched type", component_name::<T>())))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
