use super::*;
use glam::{Mat4, Quat, Vec3, Vec4};

use crate::ecs::hierarchy::add_child;
use crate::scene::TransformData;

fn assert_vec3_eq(actual: Vec3, expected: Vec3) {
    assert!(actual.abs_diff_eq(expected, 1e-5), "expected {expected}, got {actual}");
}

fn spawn(registry: &mut Registry, position: Vec3) -> Entity {
    let entity = registry.create();
    registry.add(entity, Transform::from_position(position)).unwrap();
    entity
}

#[test]
fn test_chain_of_translations() {
    let mut registry = Registry::new();
    let root = spawn(&mut registry, Vec3::new(1.0, 0.0, 0.0));
    let child = spawn(&mut registry, Vec3::new(0.0, 1.0, 0.0));
    let grandchild = spawn(&mut registry, Vec3::new(0.0, 0.0, 1.0));
    add_child(&mut registry, root, child).unwrap();
    add_child(&mut registry, child, grandchild).unwrap();

    assert_eq!(TransformSystem::propagate(&mut registry), 3);

    assert_vec3_eq(registry.get::<Transform>(root).unwrap().global().position, Vec3::new(1.0, 0.0, 0.0));
    assert_vec3_eq(registry.get::<Transform>(child).unwrap().global().position, Vec3::new(1.0, 1.0, 0.0));
    assert_vec3_eq(registry.get::<Transform>(grandchild).unwrap().global().position, Vec3::ONE);
}

#[test]
fn test_parent_rotation_and_scale_apply_to_children() {
    let mut registry = Registry::new();
    let root = registry.create();
    registry.add(root, Transform {
        local: TransformData {
            position: Vec3::ZERO,
            rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        },
        ..Default::default()
    }).unwrap();
    let child = spawn(&mut registry, Vec3::new(1.0, 0.0, 0.0));
    add_child(&mut registry, root, child).unwrap();

    TransformSystem::propagate(&mut registry);

    let global = registry.get::<Transform>(child).unwrap().global();
    assert_vec3_eq(global.position, Vec3::new(0.0, 2.0, 0.0));
    assert_vec3_eq(global.scale, Vec3::splat(2.0));
}

#[test]
fn test_entity_without_transform_passes_parent_through() {
    let mut registry = Registry::new();
    let root = spawn(&mut registry, Vec3::new(5.0, 0.0, 0.0));
    let group = registry.create();
    let leaf = spawn(&mut registry, Vec3::new(0.0, 1.0, 0.0));
    add_child(&mut registry, root, group).unwrap();
    add_child(&mut registry, group, leaf).unwrap();

    TransformSystem::propagate(&mut registry);

    assert!(!registry.has::<Transform>(group));
    assert_vec3_eq(registry.get::<Transform>(leaf).unwrap().global().position, Vec3::new(5.0, 1.0, 0.0));
}

#[test]
fn test_local_change_is_picked_up_next_update() {
    let mut registry = Registry::new();
    let root = spawn(&mut registry, Vec3::ZERO);
    let child = spawn(&mut registry, Vec3::X);
    add_child(&mut registry, root, child).unwrap();

    let mut system = TransformSystem::new();
    let mut ctx = SystemContext { registry: &mut registry, backend: None, delta_time: 0.0 };
    system.on_update(&mut ctx).unwrap();
    assert_eq!(system.visited(), 2);

    registry.get_mut::<Transform>(root).unwrap().local.position = Vec3::new(0.0, 0.0, -3.0);
    let mut ctx = SystemContext { registry: &mut registry, backend: None, delta_time: 0.0 };
    system.on_update(&mut ctx).unwrap();

    assert_vec3_eq(registry.get::<Transform>(child).unwrap().global().position, Vec3::new(1.0, 0.0, -3.0));
}

#[test]
fn test_separate_roots_do_not_interact() {
    let mut registry = Registry::new();
    let a = spawn(&mut registry, Vec3::new(1.0, 2.0, 3.0));
    let b = spawn(&mut registry, Vec3::new(-1.0, 0.0, 0.0));

    assert_eq!(TransformSystem::propagate(&mut registry), 2);
    assert_vec3_eq(registry.get::<Transform>(a).unwrap().global().position, Vec3::new(1.0, 2.0, 3.0));
    assert_vec3_eq(registry.get::<Transform>(b).unwrap().global().position, Vec3::new(-1.0, 0.0, 0.0));
}

#[test]
fn test_world_matrix_keeps_shear_from_non_uniform_parent_scale() {
    let mut registry = Registry::new();
    let root = registry.create();
    let parent_local = TransformData { scale: Vec3::new(2.0, 1.0, 1.0), ..Default::default() };
    registry.add(root, Transform { local: parent_local, ..Default::default() }).unwrap();
    let child = registry.create();
    let child_local = TransformData {
        rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_4),
        ..Default::default()
    };
    registry.add(child, Transform { local: child_local, ..Default::default() }).unwrap();
    add_child(&mut registry, root, child).unwrap();

    TransformSystem::propagate(&mut registry);

    let expected = parent_local.matrix() * child_local.matrix();
    let world = registry.get::<Transform>(child).unwrap().world_matrix();
    assert!(world.abs_diff_eq(expected, 1e-5));
    let h = std::f32::consts::FRAC_1_SQRT_2;
    assert_vec3_eq(world.transform_point3(Vec3::X), Vec3::new(2.0 * h, h, 0.0));
}

#[test]
fn test_zero_scale_parent_gives_finite_global() {
    let mut registry = Registry::new();
    let root = registry.create();
    registry.add(root, Transform {
        local: TransformData { scale: Vec3::ZERO, ..Default::default() },
        ..Default::default()
    }).unwrap();
    let child = spawn(&mut registry, Vec3::X);
    add_child(&mut registry, root, child).unwrap();

    TransformSystem::propagate(&mut registry);

    let transform = registry.get::<Transform>(child).unwrap();
    assert_eq!(transform.world_matrix(), Mat4::from_cols(Vec4::ZERO, Vec4::ZERO, Vec4::ZERO, Vec4::W));
    let global = transform.global();
    assert!(global.rotation.is_finite());
    assert_eq!(global.rotation, Quat::IDENTITY);
    assert_vec3_eq(global.position, Vec3::ZERO);
}
