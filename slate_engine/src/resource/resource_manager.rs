/// Central asset cache
///
/// Assets are keyed by canonical path: loading the same file twice hands
/// back the same `ResourceRef`. Entries live in a `SlotMap` so ids stay
/// valid (and stale ids stay detectable) across unloads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::error::Result;
use crate::resource::{
    resource_ref, AudioResource, FontResource, MeshResource, Resource, ResourceKind, ResourceRef,
    ScriptResource, ShaderResource, TextureResource,
};

new_key_type! {
    /// Handle to a cached asset
    pub struct ResourceId;
}

/// Cached asset of any kind
#[derive(Clone)]
pub enum ResourceEntry {
    Mesh(ResourceRef<MeshResource>),
    Shader(ResourceRef<ShaderResource>),
    Texture(ResourceRef<TextureResource>),
    Script(ResourceRef<ScriptResource>),
    Audio(ResourceRef<AudioResource>),
    Font(ResourceRef<FontResource>),
}

impl ResourceEntry {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceEntry::Mesh(_) => ResourceKind::Mesh,
            ResourceEntry::Shader(_) => ResourceKind::Shader,
            ResourceEntry::Texture(_) => ResourceKind::Texture,
            ResourceEntry::Script(_) => ResourceKind::Script,
            ResourceEntry::Audio(_) => ResourceKind::Audio,
            ResourceEntry::Font(_) => ResourceKind::Font,
        }
    }

    /// Owners of the asset, the cache included
    pub fn strong_count(&self) -> usize {
        match self {
            ResourceEntry::Mesh(r) => Arc::strong_count(r),
            ResourceEntry::Shader(r) => Arc::strong_count(r),
            ResourceEntry::Texture(r) => Arc::strong_count(r),
            ResourceEntry::Script(r) => Arc::strong_count(r),
            ResourceEntry::Audio(r) => Arc::strong_count(r),
            ResourceEntry::Font(r) => Arc::strong_count(r),
        }
    }
}

/// Resource types the manager can cache
pub trait ManagedResource: Resource + Default + Sized {
    fn into_entry(resource: ResourceRef<Self>) -> ResourceEntry;

    fn from_entry(entry: &ResourceEntry) -> Option<&ResourceRef<Self>>;
}

macro_rules! managed_resource {
    ($ty:ty, $variant:ident) => {
        impl ManagedResource for $ty {
            fn into_entry(resource: ResourceRef<Self>) -> ResourceEntry {
                ResourceEntry::$variant(resource)
            }

            fn from_entry(entry: &ResourceEntry) -> Option<&ResourceRef<Self>> {
                match entry {
                    ResourceEntry::$variant(resource) => Some(resource),
                    _ => None,
                }
            }
        }
    };
}

managed_resource!(MeshResource, Mesh);
managed_resource!(ShaderResource, Shader);
managed_resource!(TextureResource, Texture);
managed_resource!(ScriptResource, Script);
managed_resource!(AudioResource, Audio);
managed_resource!(FontResource, Font);

// ===== MANAGER =====

pub struct ResourceManager {
    /// Relative paths resolve against this directory
    asset_root: PathBuf,
    entries: SlotMap<ResourceId, ResourceEntry>,
    by_path: FxHashMap<PathBuf, ResourceId>,
}

impl ResourceManager {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            entries: SlotMap::with_key(),
            by_path: FxHashMap::default(),
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    /// Load `path` as `T`, or return the cached asset for that file
    pub fn load<T: ManagedResource>(&mut self, path: impl AsRef<Path>) -> Result<ResourceRef<T>> {
        let key = self.cache_key(path.as_ref());

        if let Some(&id) = self.by_path.get(&key) {
            if let Some(entry) = self.entries.get(id) {
                return match T::from_entry(entry) {
                    Some(resource) => Ok(Arc::clone(resource)),
                    None => Err(crate::engine_err!(AlreadyExists, "slate::ResourceManager",
                        "'{}' is already cached as a {}", key.display(), entry.kind())),
                };
            }
        }

        let mut resource = T::default();
        resource.load(&key)?;
        let shared = resource_ref(resource);
        let id = self.entries.insert(T::into_entry(Arc::clone(&shared)));
        self.by_path.insert(key, id);
        Ok(shared)
    }

    pub fn load_mesh(&mut self, path: impl AsRef<Path>) -> Result<ResourceRef<MeshResource>> {
        self.load(path)
    }

    pub fn load_shader(&mut self, path: impl AsRef<Path>) -> Result<ResourceRef<ShaderResource>> {
        self.load(path)
    }

    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<ResourceRef<TextureResource>> {
        self.load(path)
    }

    pub fn load_script(&mut self, path: impl AsRef<Path>) -> Result<ResourceRef<ScriptResource>> {
        self.load(path)
    }

    pub fn load_audio(&mut self, path: impl AsRef<Path>) -> Result<ResourceRef<AudioResource>> {
        self.load(path)
    }

    pub fn load_font(&mut self, path: impl AsRef<Path>) -> Result<ResourceRef<FontResource>> {
        self.load(path)
    }

    /// Load `path` with the loader its extension selects
    pub fn load_any(&mut self, path: impl AsRef<Path>) -> Result<ResourceEntry> {
        let path = path.as_ref();
        Ok(match ResourceKind::from_path(path) {
            ResourceKind::Mesh => ResourceEntry::Mesh(self.load_mesh(path)?),
            ResourceKind::Shader => ResourceEntry::Shader(self.load_shader(path)?),
            ResourceKind::Texture => ResourceEntry::Texture(self.load_texture(path)?),
            ResourceKind::Script => ResourceEntry::Script(self.load_script(path)?),
            ResourceKind::Audio => ResourceEntry::Audio(self.load_audio(path)?),
            ResourceKind::Font => ResourceEntry::Font(self.load_font(path)?),
            ResourceKind::Unknown => crate::engine_bail!(InvalidResource, "slate::ResourceManager",
                "No loader for '{}'", path.display()),
        })
    }

    pub fn id_of(&self, path: impl AsRef<Path>) -> Option<ResourceId> {
        self.by_path.get(&self.cache_key(path.as_ref())).copied()
    }

    pub fn get(&self, id: ResourceId) -> Option<&ResourceEntry> {
        self.entries.get(id)
    }

    /// Cached asset of type `T` at `path`
    pub fn get_by_path<T: ManagedResource>(&self, path: impl AsRef<Path>) -> Option<ResourceRef<T>> {
        let id = self.id_of(path)?;
        self.entries.get(id).and_then(T::from_entry).cloned()
    }

    /// Drop the cache's reference; outstanding `ResourceRef`s stay valid
    pub fn unload(&mut self, id: ResourceId) -> Option<ResourceEntry> {
        let entry = self.entries.remove(id)?;
        self.by_path.retain(|_, cached| *cached != id);
        Some(entry)
    }

    /// Drop every asset only the cache still references
    ///
    /// Returns the number of entries removed.
    pub fn purge_unused(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.strong_count() > 1);
        let entries = &self.entries;
        self.by_path.retain(|_, id| entries.contains_key(*id));
        let purged = before - self.entries.len();
        if purged > 0 {
            crate::engine_debug!("slate::ResourceManager", "Purged {} unused resources", purged);
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &ResourceEntry)> {
        self.entries.iter()
    }

    fn cache_key(&self, path: &Path) -> PathBuf {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.asset_root.join(path)
        };
        resolved.canonicalize().unwrap_or(resolved)
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
