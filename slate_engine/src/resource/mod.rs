//! Disk-backed assets
//!
//! Every asset follows the same lifecycle: construct empty, then `load` a
//! path. Loading checks that the file exists, is not a directory and has an
//! extension of the right kind before the type-specific parse runs. Assets
//! are shared as [`ResourceRef`]s and own the GPU objects derived from them.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};

mod mesh;
mod texture;
mod shader;
mod script;
mod media;
mod resource_manager;
pub mod environment;

pub use mesh::{MeshResource, Vertex};
pub use texture::TextureResource;
pub use shader::ShaderResource;
pub use script::ScriptResource;
pub use media::{AudioResource, FontResource};
pub use resource_manager::{ManagedResource, ResourceEntry, ResourceId, ResourceManager};
pub use environment::{EnvironmentMapCache, HdrImage};

// ===== SHARED HANDLES =====

/// Shared, lockable asset
pub type ResourceRef<T> = Arc<RwLock<T>>;

pub fn resource_ref<T>(resource: T) -> ResourceRef<T> {
    Arc::new(RwLock::new(resource))
}

/// Read-lock a resource
pub fn read_resource<T>(resource: &ResourceRef<T>) -> Result<RwLockReadGuard<'_, T>> {
    resource.read()
        .map_err(|_| Error::BackendError("Resource lock poisoned".to_string()))
}

/// Write-lock a resource
pub fn write_resource<T>(resource: &ResourceRef<T>) -> Result<RwLockWriteGuard<'_, T>> {
    resource.write()
        .map_err(|_| Error::BackendError("Resource lock poisoned".to_string()))
}

// ===== KINDS =====

/// Asset kind, decided by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Mesh,
    Shader,
    Texture,
    Script,
    Audio,
    Font,
    Unknown,
}

impl ResourceKind {
    /// Kind of `path`, from its extension (case-insensitive)
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let Some(extension) = path.as_ref().extension().and_then(|e| e.to_str()) else {
            return ResourceKind::Unknown;
        };
        match extension.to_ascii_lowercase().as_str() {
            "gltf" | "glb" => ResourceKind::Mesh,
            "slang" => ResourceKind::Shader,
            "png" | "jpg" | "jpeg" | "bmp" => ResourceKind::Texture,
            "lua" => ResourceKind::Script,
            "mp3" | "wav" => ResourceKind::Audio,
            "ttf" | "otf" => ResourceKind::Font,
            _ => ResourceKind::Unknown,
        }
    }

    /// Extensions accepted for this kind
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Mesh => &["gltf", "glb"],
            ResourceKind::Shader => &["slang"],
            ResourceKind::Texture => &["png", "jpg", "jpeg", "bmp"],
            ResourceKind::Script => &["lua"],
            ResourceKind::Audio => &["mp3", "wav"],
            ResourceKind::Font => &["ttf", "otf"],
            ResourceKind::Unknown => &[],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Mesh => "mesh",
            ResourceKind::Shader => "shader",
            ResourceKind::Texture => "texture",
            ResourceKind::Script => "script",
            ResourceKind::Audio => "audio",
            ResourceKind::Font => "font",
            ResourceKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

// ===== FILE INFO =====

/// File-level metadata of a loaded asset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceInfo {
    pub path: PathBuf,
    pub file_name: String,
    /// Size in bytes at load time
    pub file_size: u64,
    pub loaded: bool,
}

impl ResourceInfo {
    /// Validate `path` for a resource of `kind` and read its metadata
    pub fn probe(path: &Path, kind: ResourceKind) -> Result<Self> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(_) => return Err(crate::engine_err!(NotFound, "slate::Resource",
                "File '{}' does not exist", path.display())),
        };
        if metadata.is_dir() {
            return Err(crate::engine_err!(InvalidResource, "slate::Resource",
                "'{}' is a directory", path.display()));
        }
        let actual = ResourceKind::from_path(path);
        if actual != kind {
            return Err(crate::engine_err!(InvalidResource, "slate::Resource",
                "'{}' is not a {} file (expected one of {:?})", path.display(), kind, kind.extensions()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            file_name: file_name_of(path),
            file_size: metadata.len(),
            loaded: false,
        })
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ===== RESOURCE TRAIT =====

/// Disk-backed asset
pub trait Resource: Send + Sync + 'static {
    /// Kind whose extensions this resource accepts
    const KIND: ResourceKind;

    fn info(&self) -> &ResourceInfo;

    fn info_mut(&mut self) -> &mut ResourceInfo;

    /// Type-specific parse of an already validated path
    fn parse(&mut self, path: &Path) -> Result<()>;

    /// Validate and load `path`, replacing any previous content
    fn load(&mut self, path: &Path) -> Result<()> {
        let mut info = ResourceInfo::probe(path, Self::KIND)?;
        self.parse(path)?;
        info.loaded = true;
        *self.info_mut() = info;
        crate::engine_debug!("slate::Resource", "Loaded {} '{}'", Self::KIND, path.display());
        Ok(())
    }

    /// Rename the backing file
    fn move_to(&mut self, new_path: &Path) -> Result<()> {
        let info = self.info();
        if !info.loaded {
            crate::engine_bail!(InvalidState, "slate::Resource", "Cannot move a resource that is not loaded");
        }
        fs::rename(&info.path, new_path)?;
        let info = self.info_mut();
        info.path = new_path.to_path_buf();
        info.file_name = file_name_of(new_path);
        Ok(())
    }

    /// Delete the backing file; the in-memory content stays usable
    fn delete(&mut self) -> Result<()> {
        let info = self.info();
        if !info.loaded {
            crate::engine_bail!(InvalidState, "slate::Resource", "Cannot delete a resource that is not loaded");
        }
        fs::remove_file(&info.path)?;
        self.info_mut().loaded = false;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.info().path
    }

    fn is_loaded(&self) -> bool {
        self.info().loaded
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
