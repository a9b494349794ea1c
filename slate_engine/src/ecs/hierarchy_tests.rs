use super::*;

fn registry_with(count: usize) -> (Registry, Vec<Entity>) {
    let mut registry = Registry::new();
    let entities = (0..count).map(|_| registry.create()).collect();
    (registry, entities)
}

// ============================================================================
// CHILD LIST
// ============================================================================

#[test]
fn test_child_list_keeps_order_on_remove() {
    let (_registry, e) = registry_with(4);
    let mut list = ChildList::new();
    for entity in &e {
        assert!(list.push(*entity));
    }

    assert!(list.remove(e[1]));
    assert_eq!(list.as_slice(), &[e[0], e[2], e[3]]);
    assert!(!list.remove(e[1]));
}

#[test]
fn test_child_list_capacity() {
    let (_registry, e) = registry_with(1);
    let mut list = ChildList::new();
    for _ in 0..MAX_CHILD_COUNT {
        assert!(list.push(e[0]));
    }
    assert!(list.is_full());
    assert!(!list.push(e[0]));
}

// ============================================================================
// LINKING
// ============================================================================

#[test]
fn test_add_child_links_both_directions() {
    let (mut registry, e) = registry_with(2);
    add_child(&mut registry, e[0], e[1]).unwrap();

    assert_eq!(children(&registry, e[0]), &[e[1]]);
    assert_eq!(parent(&registry, e[1]), Some(e[0]));
    assert_eq!(roots(&registry), vec![e[0]]);
}

#[test]
fn test_self_child_is_noop() {
    let (mut registry, e) = registry_with(1);
    add_child(&mut registry, e[0], e[0]).unwrap();
    assert!(children(&registry, e[0]).is_empty());
    assert_eq!(parent(&registry, e[0]), None);
}

#[test]
fn test_duplicate_child_is_noop() {
    let (mut registry, e) = registry_with(2);
    add_child(&mut registry, e[0], e[1]).unwrap();
    add_child(&mut registry, e[0], e[1]).unwrap();
    assert_eq!(children(&registry, e[0]).len(), 1);
}

#[test]
fn test_cycle_is_refused() {
    let (mut registry, e) = registry_with(3);
    add_child(&mut registry, e[0], e[1]).unwrap();
    add_child(&mut registry, e[1], e[2]).unwrap();

    add_child(&mut registry, e[2], e[0]).unwrap();

    assert_eq!(parent(&registry, e[0]), None);
    assert!(children(&registry, e[2]).is_empty());
    assert!(is_ancestor(&registry, e[0], e[2]));
}

#[test]
fn test_reparent_moves_child() {
    let (mut registry, e) = registry_with(3);
    add_child(&mut registry, e[0], e[2]).unwrap();
    add_child(&mut registry, e[1], e[2]).unwrap();

    assert!(children(&registry, e[0]).is_empty());
    assert_eq!(children(&registry, e[1]), &[e[2]]);
    assert_eq!(parent(&registry, e[2]), Some(e[1]));
}

#[test]
fn test_remove_child_clears_back_reference() {
    let (mut registry, e) = registry_with(2);
    add_child(&mut registry, e[0], e[1]).unwrap();

    remove_child(&mut registry, e[0], e[1]).unwrap();

    assert!(children(&registry, e[0]).is_empty());
    assert_eq!(parent(&registry, e[1]), None);
}

#[test]
fn test_remove_unrelated_child_is_noop() {
    let (mut registry, e) = registry_with(3);
    add_child(&mut registry, e[0], e[1]).unwrap();

    remove_child(&mut registry, e[2], e[1]).unwrap();

    assert_eq!(parent(&registry, e[1]), Some(e[0]));
}

#[test]
fn test_capacity_exceeded() {
    let (mut registry, e) = registry_with(MAX_CHILD_COUNT + 2);
    for child in &e[1..=MAX_CHILD_COUNT] {
        add_child(&mut registry, e[0], *child).unwrap();
    }

    let overflow = add_child(&mut registry, e[0], e[MAX_CHILD_COUNT + 1]);

    assert!(matches!(overflow, Err(Error::CapacityExceeded { capacity: MAX_CHILD_COUNT, .. })));
    assert_eq!(parent(&registry, e[MAX_CHILD_COUNT + 1]), None);
}

#[test]
fn test_add_child_to_dead_entity_is_not_found() {
    let (mut registry, e) = registry_with(2);
    registry.destroy(e[1]).unwrap();
    assert!(matches!(add_child(&mut registry, e[0], e[1]), Err(Error::NotFound(_))));
}

#[test]
fn test_detach() {
    let (mut registry, e) = registry_with(2);
    add_child(&mut registry, e[0], e[1]).unwrap();
    detach(&mut registry, e[1]).unwrap();
    detach(&mut registry, e[1]).unwrap();
    assert_eq!(roots(&registry).len(), 2);
}

#[test]
fn test_destroy_unlinks_from_parent_and_children() {
    let (mut registry, e) = registry_with(3);
    add_child(&mut registry, e[0], e[1]).unwrap();
    add_child(&mut registry, e[1], e[2]).unwrap();

    registry.destroy(e[1]).unwrap();

    assert!(children(&registry, e[0]).is_empty());
    assert_eq!(parent(&registry, e[2]), None);
    assert_eq!(roots(&registry), vec![e[0], e[2]]);
}
