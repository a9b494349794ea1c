/// Application - the explicit context that owns a running engine
///
/// Holds the configuration, the scene, the resource cache, the shader
/// compiler and the backend, and drives the single-threaded frame loop:
/// platform events, system updates, swapchain maintenance, presentation.

use std::path::Path;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::renderer::RenderBackend;
use crate::resource::{EnvironmentMapCache, HdrImage, ResourceManager, ResourceRef, ShaderResource};
use crate::scene::Scene;
use crate::shader::ShaderCompiler;
use crate::system::ShaderId;
use crate::time::FrameTimer;

/// Window events the frame loop reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    Resized { width: u32, height: u32 },
    CloseRequested,
}

/// Source of platform events (a window, or a scripted test double)
pub trait EventSource {
    /// Events received since the previous call
    fn poll_events(&mut self) -> Vec<PlatformEvent>;
}

/// Whether the loop should keep running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Exit,
}

pub struct Application {
    config: EngineConfig,
    scene: Scene,
    resources: ResourceManager,
    compiler: Arc<dyn ShaderCompiler>,
    environment_maps: EnvironmentMapCache,
    backend: Box<dyn RenderBackend>,
    timer: FrameTimer,
    window_extent: (u32, u32),
    resize_pending: bool,
}

impl Application {
    pub fn new(
        config: EngineConfig,
        compiler: Arc<dyn ShaderCompiler>,
        backend: Box<dyn RenderBackend>,
        window_extent: (u32, u32),
    ) -> Self {
        crate::engine_info!("slate::Application", "Creating '{}' (assets in {})",
            config.app_name, config.asset_root.display());
        let scene = Scene::with_shader_capacity(Arc::clone(&compiler), config.max_registered_shaders);
        let resources = ResourceManager::new(config.asset_root.clone());
        let environment_maps = EnvironmentMapCache::new(config.cache_path());
        Self {
            config,
            scene,
            resources,
            compiler,
            environment_maps,
            backend,
            timer: FrameTimer::new(),
            window_extent,
            resize_pending: false,
        }
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    pub fn compiler(&self) -> &Arc<dyn ShaderCompiler> {
        &self.compiler
    }

    pub fn environment_maps(&self) -> &EnvironmentMapCache {
        &self.environment_maps
    }

    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        self.backend.as_mut()
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    pub fn window_extent(&self) -> (u32, u32) {
        self.window_extent
    }

    // ===== RESOURCES =====

    /// Load a shader through the resource cache and register it with the
    /// scene's shader system
    pub fn load_shader(&mut self, path: impl AsRef<Path>) -> Result<(ResourceRef<ShaderResource>, ShaderId)> {
        let shader = self.resources.load_shader(path)?;
        let id = self.scene.register_shader(Arc::clone(&shader))?;
        Ok((shader, id))
    }

    /// Environment map for an equirectangular HDR, converted on first use
    pub fn load_environment_map(&self, path: impl AsRef<Path>) -> Result<HdrImage> {
        self.environment_maps.load_or_convert(&self.config.resolve(path))
    }

    // ===== FRAME LOOP =====

    /// Run one frame
    ///
    /// A close request ends the frame before the systems run.
    pub fn run_frame(&mut self, events: &mut dyn EventSource) -> Result<FrameStatus> {
        for event in events.poll_events() {
            match event {
                PlatformEvent::CloseRequested => {
                    crate::engine_info!("slate::Application", "Close requested");
                    return Ok(FrameStatus::Exit);
                }
                PlatformEvent::Resized { width, height } => {
                    crate::engine_debug!("slate::Application", "Window resized to {}x{}", width, height);
                    self.window_extent = (width, height);
                    self.resize_pending = true;
                }
            }
        }

        self.scene.tick(self.timer.delta(), Some(self.backend.as_mut()))?;

        let (width, height) = self.window_extent;
        if width == 0 || height == 0 {
            // Minimized: nothing to present into
            self.timer.tick();
            return Ok(FrameStatus::Continue);
        }
        if self.resize_pending || self.backend.swapchain_dirty() {
            self.backend.resize_swapchain(width, height)?;
            self.resize_pending = false;
        }
        self.backend.render_frame()?;

        self.timer.tick();
        Ok(FrameStatus::Continue)
    }

    /// Start the scene and run frames until the event source asks to close
    pub fn run(&mut self, events: &mut dyn EventSource) -> Result<()> {
        self.scene.start()?;
        let result = loop {
            match self.run_frame(events) {
                Ok(FrameStatus::Continue) => {}
                Ok(FrameStatus::Exit) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        crate::engine_info!("slate::Application", "Stopping after {} frames ({:.1} fps)",
            self.timer.frame_count(), self.timer.average_fps());
        self.scene.stop()?;
        result
    }
}

#[cfg(test)]
#[path = "application_tests.rs"]
mod tests;
