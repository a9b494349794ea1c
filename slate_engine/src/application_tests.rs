use super::*;
use std::collections::VecDeque;

use crate::error::Error;
use crate::renderer::{PrimitiveShape, RecordingBackend};
use crate::scene::GeometryPrimitive;
use crate::shader::FixedCompiler;

/// Hands out one scripted batch of events per frame
#[derive(Default)]
struct ScriptedEvents {
    frames: VecDeque<Vec<PlatformEvent>>,
}

impl ScriptedEvents {
    fn new(frames: Vec<Vec<PlatformEvent>>) -> Self {
        Self { frames: frames.into() }
    }
}

impl EventSource for ScriptedEvents {
    fn poll_events(&mut self) -> Vec<PlatformEvent> {
        self.frames.pop_front().unwrap_or_else(|| vec![PlatformEvent::CloseRequested])
    }
}

fn app_in(root: &Path) -> Application {
    let config = EngineConfig {
        asset_root: root.to_path_buf(),
        max_registered_shaders: 2,
        ..EngineConfig::default()
    };
    Application::new(config, Arc::new(FixedCompiler::default()), Box::new(RecordingBackend::new()), (800, 600))
}

fn recording(app: &Application) -> &RecordingBackend {
    app.backend().as_any().downcast_ref::<RecordingBackend>().unwrap()
}

#[test]
fn test_frame_renders_scene() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_in(dir.path());
    let entity = app.scene_mut().create_named_entity("Cube").unwrap();
    app.scene_mut().registry_mut().add(entity, GeometryPrimitive { shape: PrimitiveShape::Cube }).unwrap();

    let mut events = ScriptedEvents::new(vec![vec![]]);
    assert_eq!(app.run_frame(&mut events).unwrap(), FrameStatus::Continue);

    let backend = recording(&app);
    assert_eq!(backend.frames_rendered, 1);
    assert_eq!(backend.last_frame().len(), 1);
    assert_eq!(app.timer().frame_count(), 1);
}

#[test]
fn test_close_request_exits_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_in(dir.path());
    let mut events = ScriptedEvents::new(vec![vec![PlatformEvent::CloseRequested]]);

    assert_eq!(app.run_frame(&mut events).unwrap(), FrameStatus::Exit);
    assert_eq!(recording(&app).frames_rendered, 0);
}

#[test]
fn test_resize_event_recreates_swapchain() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_in(dir.path());
    let mut events = ScriptedEvents::new(vec![
        vec![PlatformEvent::Resized { width: 1024, height: 768 }],
        vec![],
    ]);

    app.run_frame(&mut events).unwrap();
    app.run_frame(&mut events).unwrap();

    let backend = recording(&app);
    assert_eq!(backend.extent, (1024, 768));
    assert_eq!(backend.resize_count, 1);
    assert_eq!(app.window_extent(), (1024, 768));
}

#[test]
fn test_dirty_swapchain_uses_last_extent() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_in(dir.path());
    app.backend_mut().as_any_mut().downcast_mut::<RecordingBackend>().unwrap().mark_swapchain_dirty();

    app.run_frame(&mut ScriptedEvents::new(vec![vec![]])).unwrap();

    let backend = recording(&app);
    assert_eq!(backend.extent, (800, 600));
    assert_eq!(backend.resize_count, 1);
    assert!(!backend.swapchain_dirty());
}

#[test]
fn test_minimized_window_skips_presentation() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_in(dir.path());
    let mut events = ScriptedEvents::new(vec![vec![PlatformEvent::Resized { width: 0, height: 0 }]]);

    assert_eq!(app.run_frame(&mut events).unwrap(), FrameStatus::Continue);
    let backend = recording(&app);
    assert_eq!(backend.frames_rendered, 0);
    assert_eq!(backend.resize_count, 0);
}

#[test]
fn test_run_until_close_then_stops_scene() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_in(dir.path());
    let mut events = ScriptedEvents::new(vec![vec![], vec![], vec![]]);

    app.run(&mut events).unwrap();

    assert_eq!(recording(&app).frames_rendered, 3);
    assert!(!app.scene().is_running());
}

#[test]
fn test_load_shader_registers_once_cached() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("lit.slang"), "float4 main() {}").unwrap();
    let mut app = app_in(dir.path());

    let (shader, id) = app.load_shader("lit.slang").unwrap();
    let (again, same_id) = app.load_shader("lit.slang").unwrap();

    assert!(Arc::ptr_eq(&shader, &again));
    assert_eq!(id, same_id);
    assert_eq!(app.resources().len(), 1);
}

#[test]
fn test_load_shader_respects_capacity() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.slang", "b.slang", "c.slang"] {
        std::fs::write(dir.path().join(name), "").unwrap();
    }
    let mut app = app_in(dir.path());

    app.load_shader("a.slang").unwrap();
    app.load_shader("b.slang").unwrap();
    assert!(matches!(app.load_shader("c.slang"), Err(Error::CapacityExceeded { capacity: 2, .. })));
}

#[test]
fn test_environment_map_cache_lives_under_config() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_in(dir.path());
    assert_eq!(app.environment_maps().cache_dir(), dir.path().join("cache").as_path());
    assert!(app.load_environment_map("missing.hdr").is_err());
}
