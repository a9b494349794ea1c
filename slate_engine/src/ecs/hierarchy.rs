/// Parent/child hierarchy
///
/// Each entity has at most one parent and an ordered list of children held
/// in fixed storage (`MAX_CHILD_COUNT` slots). The functions here keep both
/// directions of the link consistent.

use std::fmt;

use crate::ecs::{Component, Entity, Registry};
use crate::error::{Error, Result};
use crate::{engine_error, engine_warn};
use slotmap::Key;

/// Maximum number of direct children per entity
pub const MAX_CHILD_COUNT: usize = 128;

/// Fixed-capacity ordered child list
#[derive(Clone, Copy)]
pub struct ChildList {
    len: usize,
    slots: [Entity; MAX_CHILD_COUNT],
}

impl ChildList {
    pub fn new() -> Self {
        Self {
            len: 0,
            slots: [Entity::null(); MAX_CHILD_COUNT],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == MAX_CHILD_COUNT
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.slots[..self.len]
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.as_slice().contains(&entity)
    }

    /// Append a child; false when full
    pub fn push(&mut self, entity: Entity) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots[self.len] = entity;
        self.len += 1;
        true
    }

    /// Remove a child, keeping the order of the others
    pub fn remove(&mut self, entity: Entity) -> bool {
        match self.as_slice().iter().position(|&e| e == entity) {
            Some(index) => {
                self.slots.copy_within(index + 1..self.len, index);
                self.len -= 1;
                self.slots[self.len] = Entity::null();
                true
            }
            None => false,
        }
    }
}

impl Default for ChildList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChildList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Hierarchy links of one entity
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    parent: Option<Entity>,
    children: ChildList,
}

impl Hierarchy {
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    pub fn children(&self) -> &[Entity] {
        self.children.as_slice()
    }
}

impl Component for Hierarchy {}

// ===== OPERATIONS =====

/// Attach `child` under `parent`
///
/// No-op with a warning when `child == parent`, when `child` is already a
/// child of `parent`, or when `child` is an ancestor of `parent`. A child
/// that already has another parent is moved. Fails with `CapacityExceeded`
/// when `parent` has `MAX_CHILD_COUNT` children.
pub fn add_child(registry: &mut Registry, parent: Entity, child: Entity) -> Result<()> {
    for entity in [parent, child] {
        if !registry.is_alive(entity) {
            return Err(crate::engine_err!(NotFound, "slate::Hierarchy",
                "Cannot link {:?}: entity is not alive", entity));
        }
    }
    if parent == child {
        engine_warn!("slate::Hierarchy", "Entity {:?} cannot be its own child", parent);
        return Ok(());
    }
    if children(registry, parent).contains(&child) {
        engine_warn!("slate::Hierarchy", "Entity {:?} is already a child of {:?}", child, parent);
        return Ok(());
    }
    if is_ancestor(registry, child, parent) {
        engine_warn!("slate::Hierarchy",
            "Entity {:?} is an ancestor of {:?}; refusing to create a cycle", child, parent);
        return Ok(());
    }
    if registry.try_get::<Hierarchy>(parent).map_or(false, |h| h.children.is_full()) {
        engine_error!("slate::Hierarchy",
            "Entity {:?} already has {} children", parent, MAX_CHILD_COUNT);
        return Err(Error::CapacityExceeded { what: "children per entity", capacity: MAX_CHILD_COUNT });
    }

    if let Some(old_parent) = self::parent(registry, child) {
        remove_child(registry, old_parent, child)?;
    }

    registry.get_or_insert_with(parent, Hierarchy::default)?.children.push(child);
    registry.get_or_insert_with(child, Hierarchy::default)?.parent = Some(parent);
    Ok(())
}

/// Detach `child` from `parent`, clearing the child's back-reference
///
/// No-op with a warning when `child` is not a child of `parent`.
pub fn remove_child(registry: &mut Registry, parent: Entity, child: Entity) -> Result<()> {
    let removed = registry.try_get_mut::<Hierarchy>(parent)
        .map_or(false, |h| h.children.remove(child));
    if !removed {
        engine_warn!("slate::Hierarchy", "Entity {:?} is not a child of {:?}", child, parent);
        return Ok(());
    }
    if let Some(hierarchy) = registry.try_get_mut::<Hierarchy>(child) {
        hierarchy.parent = None;
    }
    Ok(())
}

/// Detach `entity` from its parent, if any
pub fn detach(registry: &mut Registry, entity: Entity) -> Result<()> {
    match parent(registry, entity) {
        Some(parent) => remove_child(registry, parent, entity),
        None => Ok(()),
    }
}

/// Cut every link of `entity`: it leaves its parent's child list and its
/// children lose their parent
pub(crate) fn unlink(registry: &mut Registry, entity: Entity) {
    let Some(hierarchy) = registry.try_get::<Hierarchy>(entity) else {
        return;
    };
    let (parent, children) = (hierarchy.parent, hierarchy.children);
    if let Some(parent) = parent {
        if let Some(links) = registry.try_get_mut::<Hierarchy>(parent) {
            links.children.remove(entity);
        }
    }
    for &child in children.as_slice() {
        if let Some(links) = registry.try_get_mut::<Hierarchy>(child) {
            links.parent = None;
        }
    }
}

pub fn parent(registry: &Registry, entity: Entity) -> Option<Entity> {
    registry.try_get::<Hierarchy>(entity).and_then(|h| h.parent)
}

pub fn children(registry: &Registry, entity: Entity) -> &[Entity] {
    registry.try_get::<Hierarchy>(entity).map(|h| h.children()).unwrap_or(&[])
}

/// Whether `ancestor` appears on the parent chain of `entity`
pub fn is_ancestor(registry: &Registry, ancestor: Entity, entity: Entity) -> bool {
    let mut current = parent(registry, entity);
    while let Some(e) = current {
        if e == ancestor {
            return true;
        }
        current = parent(registry, e);
    }
    false
}

/// Live entities without a parent, in registry order
pub fn roots(registry: &Registry) -> Vec<Entity> {
    registry.entities().filter(|&e| parent(registry, e).is_none()).collect()
}

#[cfg(test)]
#[path = "hierarchy_tests.rs"]
mod tests;
