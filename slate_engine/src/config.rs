/// Engine configuration
///
/// Passed explicitly to the `Application` context; nothing here is global.

use std::path::{Path, PathBuf};

/// Default capacity of the registered-shader table
pub const DEFAULT_MAX_REGISTERED_SHADERS: usize = 128;

/// Configuration for an engine instance
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Application name (used in logs)
    pub app_name: String,

    /// Root directory relative asset paths are resolved against
    pub asset_root: PathBuf,

    /// Cache directory, relative to `asset_root` unless absolute
    pub cache_directory: PathBuf,

    /// Capacity of the shader system's registration table
    pub max_registered_shaders: usize,

    /// Include directories handed to the shader compiler
    pub shader_search_paths: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "Slate".to_string(),
            asset_root: PathBuf::from("."),
            cache_directory: PathBuf::from("cache"),
            max_registered_shaders: DEFAULT_MAX_REGISTERED_SHADERS,
            shader_search_paths: vec![PathBuf::from("shaders/BuiltIn")],
        }
    }
}

impl EngineConfig {
    /// Resolve an asset path against `asset_root`
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.asset_root.join(path)
        }
    }

    /// Absolute location of the on-disk cache
    pub fn cache_path(&self) -> PathBuf {
        self.resolve(&self.cache_directory)
    }

    /// Shader include directories resolved against `asset_root`
    pub fn resolved_shader_search_paths(&self) -> Vec<PathBuf> {
        self.shader_search_paths.iter().map(|p| self.resolve(p)).collect()
    }
}
