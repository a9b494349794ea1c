/// ShaderSystem - table of registered shaders with hot reload
///
/// Registration compiles and reflects the shader through the shared
/// compiler. The table has a fixed capacity; ids of unregistered shaders
/// are recycled. Each update recompiles shaders whose source changed on
/// disk; a failed recompilation keeps the previous program.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::resource::{write_resource, ResourceRef, ShaderResource};
use crate::shader::ShaderCompiler;
use crate::system::{System, SystemContext};
use crate::utils::SlotAllocator;

/// Slot of a registered shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

impl fmt::Display for ShaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shader#{}", self.0)
    }
}

pub struct ShaderSystem {
    compiler: Arc<dyn ShaderCompiler>,
    slots: SlotAllocator,
    shaders: Vec<Option<ResourceRef<ShaderResource>>>,
}

impl ShaderSystem {
    pub fn new(compiler: Arc<dyn ShaderCompiler>, capacity: usize) -> Self {
        Self {
            compiler,
            slots: SlotAllocator::new("registered shaders", capacity as u32),
            shaders: Vec::new(),
        }
    }

    pub fn compiler(&self) -> &Arc<dyn ShaderCompiler> {
        &self.compiler
    }

    /// Compile, reflect and register `shader`
    ///
    /// Registering the same resource twice returns its existing id. Fails
    /// with `CapacityExceeded` once the table is full; nothing is evicted.
    pub fn register(&mut self, shader: ResourceRef<ShaderResource>) -> Result<ShaderId> {
        if let Some(id) = self.id_of(&shader) {
            return Ok(id);
        }
        let slot = self.slots.alloc()?;
        if let Err(err) = write_resource(&shader).and_then(|mut s| s.compile(self.compiler.as_ref())) {
            self.slots.free(slot);
            return Err(err);
        }

        let index = slot as usize;
        if self.shaders.len() <= index {
            self.shaders.resize(index + 1, None);
        }
        self.shaders[index] = Some(shader);
        crate::engine_debug!("slate::ShaderSystem", "Registered {} ({}/{})",
            ShaderId(slot), self.slots.len(), self.slots.capacity());
        Ok(ShaderId(slot))
    }

    /// Remove a shader from the table; its id becomes reusable
    pub fn unregister(&mut self, id: ShaderId) -> Option<ResourceRef<ShaderResource>> {
        let shader = self.shaders.get_mut(id.0 as usize)?.take()?;
        self.slots.free(id.0);
        Some(shader)
    }

    pub fn get(&self, id: ShaderId) -> Option<&ResourceRef<ShaderResource>> {
        self.shaders.get(id.0 as usize)?.as_ref()
    }

    pub fn id_of(&self, shader: &ResourceRef<ShaderResource>) -> Option<ShaderId> {
        self.shaders.iter().position(|s| s.as_ref().is_some_and(|s| Arc::ptr_eq(s, shader)))
            .map(|index| ShaderId(index as u32))
    }

    pub fn ids(&self) -> impl Iterator<Item = ShaderId> + '_ {
        self.shaders.iter().enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(index, _)| ShaderId(index as u32))
    }

    pub fn len(&self) -> usize {
        self.slots.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity() as usize
    }

    /// Recompile every shader whose source changed since its last compile
    ///
    /// Returns the number of successful recompilations.
    pub fn reload_stale(&mut self) -> Result<usize> {
        let mut reloaded = 0;
        for (index, shader) in self.shaders.iter().enumerate() {
            let Some(shader) = shader else { continue };
            let mut shader = write_resource(shader)?;
            if !shader.is_stale() {
                continue;
            }
            match shader.reload(self.compiler.as_ref()) {
                Ok(()) => {
                    crate::engine_info!("slate::ShaderSystem", "Reloaded {}", ShaderId(index as u32));
                    reloaded += 1;
                }
                Err(err) => {
                    crate::engine_warn!("slate::ShaderSystem",
                        "Keeping previous program of {}: {}", ShaderId(index as u32), err);
                }
            }
        }
        Ok(reloaded)
    }
}

impl System for ShaderSystem {
    fn name(&self) -> &'static str {
        "ShaderSystem"
    }

    fn on_update(&mut self, _ctx: &mut SystemContext<'_>) -> Result<()> {
        self.reload_stale().map(|_| ())
    }

    fn on_stop(&mut self, _registry: &mut crate::ecs::Registry) -> Result<()> {
        crate::engine_debug!("slate::ShaderSystem", "Stopping with {} registered shaders", self.len());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "shader_system_tests.rs"]
mod tests;
