/*!
# Slate Engine

Platform-agnostic core of the Slate 3D engine.

The crate owns the scene graph and everything that runs over it; the GPU is
reached through the [`RenderBackend`](renderer::RenderBackend) trait, which
backend crates (Vulkan) implement. A headless
[`RecordingBackend`](renderer::RecordingBackend) lets the whole frame loop run
without a device.

## Architecture

- **ecs**: generational entities, sparse-set component storage, dependency
  table and the parent/child hierarchy
- **scene**: built-in components and the `Scene` (create, duplicate, destroy,
  lookup by name, singleton lights)
- **system**: `System` lifecycle, `SystemManager`, transform, render and
  shader systems
- **shader**: program layouts, reflection, `ShaderType` tags and the cursor
  used to write uniform data
- **resource**: meshes, textures, shaders, scripts and media, dispatched by
  file extension, plus the environment-map cache
- **application**: the explicit engine context and frame loop
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod ecs;
pub mod renderer;
pub mod resource;
pub mod scene;
pub mod shader;
pub mod system;
pub mod time;
pub mod application;
pub mod utils;

// Main slate namespace module
pub mod slate {
    // Error types
    pub use crate::error::{CompileStage, Error, Result};

    // Engine singleton (logger holder)
    pub use crate::engine::Engine;

    // Context and configuration
    pub use crate::application::{Application, EventSource, FrameStatus, PlatformEvent};
    pub use crate::config::EngineConfig;
    pub use crate::scene::Scene;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    pub mod ecs {
        pub use crate::ecs::*;
    }

    pub mod render {
        pub use crate::renderer::*;
    }

    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod shader {
        pub use crate::shader::*;
    }

    pub mod system {
        pub use crate::system::*;
    }
}

// Re-export math library at crate root
pub use glam;
