/// Script resource - UTF-8 source text

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::resource::{Resource, ResourceInfo, ResourceKind};

#[derive(Debug, Default)]
pub struct ScriptResource {
    info: ResourceInfo,
    source: String,
}

impl ScriptResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Resource for ScriptResource {
    const KIND: ResourceKind = ResourceKind::Script;

    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ResourceInfo {
        &mut self.info
    }

    fn parse(&mut self, path: &Path) -> Result<()> {
        let bytes = fs::read(path)?;
        self.source = String::from_utf8(bytes).map_err(|_| {
            crate::engine_err!(InvalidResource, "slate::ScriptResource",
                "Script '{}' is not valid UTF-8", path.display())
        })?;
        Ok(())
    }
}
