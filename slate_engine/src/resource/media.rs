/// Audio and font resources
///
/// Neither is decoded yet; loading validates the file and records its size.

use std::path::Path;

use crate::error::Result;
use crate::resource::{Resource, ResourceInfo, ResourceKind};

#[derive(Debug, Default)]
pub struct AudioResource {
    info: ResourceInfo,
}

impl AudioResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn byte_size(&self) -> u64 {
        self.info.file_size
    }
}

impl Resource for AudioResource {
    const KIND: ResourceKind = ResourceKind::Audio;

    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ResourceInfo {
        &mut self.info
    }

    fn parse(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FontResource {
    info: ResourceInfo,
}

impl FontResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn byte_size(&self) -> u64 {
        self.info.file_size
    }
}

impl Resource for FontResource {
    const KIND: ResourceKind = ResourceKind::Font;

    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ResourceInfo {
        &mut self.info
    }

    fn parse(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
