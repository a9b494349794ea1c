/// Sparse-set component storage
///
/// Components are packed in a dense array, with a parallel array of owning
/// entities. A sparse map from entity to dense index gives O(1) lookup;
/// removal swaps the last element into the hole.

use slotmap::SecondaryMap;
use std::any::Any;

use crate::ecs::component::{component_name, Component};
use crate::ecs::Entity;

/// Dense storage for one component type
pub struct ComponentStorage<T> {
    dense: Vec<T>,
    owners: Vec<Entity>,
    sparse: SecondaryMap<Entity, usize>,
}

impl<T> ComponentStorage<T> {
    /// Create an empty storage
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            owners: Vec::new(),
            sparse: SecondaryMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.sparse.contains_key(entity)
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.sparse.get(entity).map(|&index| &self.dense[index])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        match self.sparse.get(entity) {
            Some(&index) => Some(&mut self.dense[index]),
            None => None,
        }
    }

    /// Insert or overwrite the component of `entity`
    pub fn insert(&mut self, entity: Entity, value: T) -> &mut T {
        let index = match self.sparse.get(entity) {
            Some(&index) => {
                self.dense[index] = value;
                index
            }
            None => {
                let index = self.dense.len();
                self.dense.push(value);
                self.owners.push(entity);
                self.sparse.insert(entity, index);
                index
            }
        };
        &mut self.dense[index]
    }

    /// Remove the component of `entity` (swap-pop)
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let index = self.sparse.remove(entity)?;
        let value = self.dense.swap_remove(index);
        self.owners.swap_remove(index);
        if let Some(&moved) = self.owners.get(index) {
            self.sparse.insert(moved, index);
        }
        Some(value)
    }

    /// Entities owning a component, in dense order
    pub fn entities(&self) -> &[Entity] {
        &self.owners
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.owners.iter().copied().zip(self.dense.iter_mut())
    }
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ===== TYPE-ERASED ACCESS =====

/// Operations the registry performs without knowing the component type
pub(crate) trait AnyStorage {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn contains(&self, entity: Entity) -> bool;
    fn remove_entity(&mut self, entity: Entity) -> bool;
    /// Copy the component of `src` onto `dst`, overwriting; false if `src` has none
    fn clone_entity(&mut self, src: Entity, dst: Entity) -> bool;
    fn component_name(&self) -> &'static str;
    fn clear(&mut self);
}

impl<T: Component> AnyStorage for ComponentStorage<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn contains(&self, entity: Entity) -> bool {
        ComponentStorage::contains(self, entity)
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn clone_entity(&mut self, src: Entity, dst: Entity) -> bool {
        match self.get(src).cloned() {
            Some(value) => {
                self.insert(dst, value);
                true
            }
            None => false,
        }
    }

    fn component_name(&self) -> &'static str {
        component_name::<T>()
    }

    fn clear(&mut self) {
        self.dense.clear();
        self.owners.clear();
        self.sparse.clear();
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
