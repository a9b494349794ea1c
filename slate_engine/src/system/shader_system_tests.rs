use super::*;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::Error;
use crate::resource::{read_resource, resource_ref, Resource};
use crate::shader::{FixedCompiler, ProgramLayout, ScalarKind, TypeLayout, VariableLayout};

fn compiler() -> Arc<FixedCompiler> {
    Arc::new(FixedCompiler::new(ProgramLayout::new(vec![
        VariableLayout::new("tint", TypeLayout::vector(ScalarKind::Float32, 4), 0),
    ])))
}

fn shader_file(dir: &Path, name: &str, source: &str) -> ResourceRef<ShaderResource> {
    let path = dir.join(name);
    std::fs::write(&path, source).unwrap();
    let mut shader = ShaderResource::new();
    shader.load(&path).unwrap();
    resource_ref(shader)
}

fn touch(path: &Path) {
    let later = SystemTime::now() + Duration::from_secs(60);
    std::fs::File::options().write(true).open(path).unwrap().set_modified(later).unwrap();
}

// ============================================================================
// REGISTRATION
// ============================================================================

#[test]
fn test_register_compiles_and_reflects() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = compiler();
    let mut system = ShaderSystem::new(compiler.clone(), 4);
    let shader = shader_file(dir.path(), "a.slang", "float4 main() {}");

    let id = system.register(shader.clone()).unwrap();
    assert_eq!(id, ShaderId(0));
    assert_eq!(compiler.compilations(), 1);

    let shader = read_resource(&shader).unwrap();
    assert!(shader.is_compiled());
    assert!(shader.uniform("tint").is_some());
}

#[test]
fn test_register_same_shader_returns_same_id() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = compiler();
    let mut system = ShaderSystem::new(compiler.clone(), 4);
    let shader = shader_file(dir.path(), "a.slang", "");

    let first = system.register(shader.clone()).unwrap();
    let second = system.register(shader).unwrap();
    assert_eq!(first, second);
    assert_eq!(system.len(), 1);
    assert_eq!(compiler.compilations(), 1);
}

#[test]
fn test_capacity_is_not_evicted() {
    let dir = tempfile::tempdir().unwrap();
    let mut system = ShaderSystem::new(compiler(), 2);
    let a = shader_file(dir.path(), "a.slang", "");
    let b = shader_file(dir.path(), "b.slang", "");
    let c = shader_file(dir.path(), "c.slang", "");

    system.register(a.clone()).unwrap();
    system.register(b.clone()).unwrap();
    let err = system.register(c).unwrap_err();

    assert!(matches!(err, Error::CapacityExceeded { capacity: 2, .. }));
    assert_eq!(system.id_of(&a), Some(ShaderId(0)));
    assert_eq!(system.id_of(&b), Some(ShaderId(1)));
}

#[test]
fn test_full_table_rejects_without_compiling() {
    let dir = tempfile::tempdir().unwrap();
    let fixed = compiler();
    let mut system = ShaderSystem::new(fixed.clone(), 1);
    system.register(shader_file(dir.path(), "a.slang", "")).unwrap();
    assert_eq!(fixed.compilations(), 1);

    let overflow = shader_file(dir.path(), "b.slang", "");
    assert!(system.register(overflow.clone()).is_err());

    assert_eq!(fixed.compilations(), 1);
    assert!(!read_resource(&overflow).unwrap().is_compiled());
}

#[test]
fn test_unregister_recycles_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut system = ShaderSystem::new(compiler(), 2);
    let a = shader_file(dir.path(), "a.slang", "");
    let b = shader_file(dir.path(), "b.slang", "");
    let c = shader_file(dir.path(), "c.slang", "");

    let id_a = system.register(a.clone()).unwrap();
    system.register(b).unwrap();
    let removed = system.unregister(id_a).unwrap();
    assert!(Arc::ptr_eq(&removed, &a));
    assert!(system.get(id_a).is_none());

    assert_eq!(system.register(c).unwrap(), id_a);
    assert_eq!(system.ids().collect::<Vec<_>>(), vec![ShaderId(0), ShaderId(1)]);
}

#[test]
fn test_failed_compile_releases_slot() {
    let dir = tempfile::tempdir().unwrap();
    let mut system = ShaderSystem::new(compiler(), 1);
    let broken = shader_file(dir.path(), "broken.slang", "#error missing semicolon");
    let good = shader_file(dir.path(), "good.slang", "");

    let err = system.register(broken).unwrap_err();
    assert!(matches!(err, Error::CompileFailure { .. }));
    assert!(system.is_empty());
    assert_eq!(system.register(good).unwrap(), ShaderId(0));
}

#[test]
fn test_shader_id_display() {
    assert_eq!(ShaderId(3).to_string(), "shader#3");
}

// ============================================================================
// HOT RELOAD
// ============================================================================

#[test]
fn test_unchanged_shaders_are_not_recompiled() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = compiler();
    let mut system = ShaderSystem::new(compiler.clone(), 4);
    system.register(shader_file(dir.path(), "a.slang", "")).unwrap();

    assert_eq!(system.reload_stale().unwrap(), 0);
    assert_eq!(compiler.compilations(), 1);
}

#[test]
fn test_modified_source_is_reloaded() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = compiler();
    let mut system = ShaderSystem::new(compiler.clone(), 4);
    let shader = shader_file(dir.path(), "a.slang", "float4 main() {}");
    system.register(shader.clone()).unwrap();

    let path = dir.path().join("a.slang");
    std::fs::write(&path, "float4 main() { return 1; }").unwrap();
    touch(&path);

    assert_eq!(system.reload_stale().unwrap(), 1);
    assert_eq!(compiler.compilations(), 2);
    assert_eq!(read_resource(&shader).unwrap().source(), "float4 main() { return 1; }");
    assert_eq!(system.reload_stale().unwrap(), 0);
}

#[test]
fn test_failed_reload_keeps_previous_program() {
    let dir = tempfile::tempdir().unwrap();
    let mut system = ShaderSystem::new(compiler(), 4);
    let shader = shader_file(dir.path(), "a.slang", "float4 main() {}");
    system.register(shader.clone()).unwrap();
    let code = read_resource(&shader).unwrap().code().to_vec();

    let path = dir.path().join("a.slang");
    std::fs::write(&path, "#error broken edit").unwrap();
    touch(&path);

    assert_eq!(system.reload_stale().unwrap(), 0);
    let shader = read_resource(&shader).unwrap();
    assert!(shader.is_compiled());
    assert_eq!(shader.code(), code.as_slice());
    assert!(shader.uniform("tint").is_some());
    assert!(!shader.is_stale());
}

#[test]
fn test_update_runs_reload() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = compiler();
    let mut system = ShaderSystem::new(compiler.clone(), 4);
    system.register(shader_file(dir.path(), "a.slang", "")).unwrap();
    touch(&dir.path().join("a.slang"));

    let mut registry = crate::ecs::Registry::new();
    let mut ctx = SystemContext { registry: &mut registry, backend: None, delta_time: 0.0 };
    system.on_update(&mut ctx).unwrap();
    assert_eq!(compiler.compilations(), 2);
}
