/// SystemManager - owns the systems and drives them in registration order

use std::sync::Arc;

use crate::ecs::Registry;
use crate::error::Result;
use crate::shader::ShaderCompiler;
use crate::system::{
    RenderSystem, ScheduledSystem, ShaderSystem, System, SystemContext, SystemState, TransformSystem,
};

#[derive(Default)]
pub struct SystemManager {
    systems: Vec<ScheduledSystem>,
}

impl SystemManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform, Render and Shader systems, in that order
    pub fn with_default_systems(compiler: Arc<dyn ShaderCompiler>, max_shaders: usize) -> Self {
        let mut manager = Self::new();
        manager.register(TransformSystem::new());
        manager.register(RenderSystem::new());
        manager.register(ShaderSystem::new(compiler, max_shaders));
        manager
    }

    /// Append a system; a second system of the same type replaces the first
    pub fn register<S: System>(&mut self, system: S) {
        let scheduled = ScheduledSystem::new(Box::new(system));
        match self.position::<S>() {
            Some(index) => {
                crate::engine_warn!("slate::SystemManager",
                    "System '{}' registered twice; replacing", scheduled.name());
                self.systems[index] = scheduled;
            }
            None => self.systems.push(scheduled),
        }
    }

    pub fn get<S: System>(&self) -> Option<&S> {
        self.systems.iter().find_map(|s| s.system().as_any().downcast_ref::<S>())
    }

    pub fn get_mut<S: System>(&mut self) -> Option<&mut S> {
        self.systems.iter_mut().find_map(|s| s.system_mut().as_any_mut().downcast_mut::<S>())
    }

    pub fn state_of<S: System>(&self) -> Option<SystemState> {
        self.position::<S>().map(|index| self.systems[index].state())
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Whether any system is past its start
    pub fn is_running(&self) -> bool {
        self.systems.iter().any(|s| s.state() != SystemState::Inactive)
    }

    pub fn start_all(&mut self, registry: &mut Registry) -> Result<()> {
        for system in &mut self.systems {
            system.start(registry)?;
        }
        Ok(())
    }

    pub fn update_all(&mut self, ctx: &mut SystemContext<'_>) -> Result<()> {
        for system in &mut self.systems {
            system.update(ctx)?;
        }
        Ok(())
    }

    pub fn stop_all(&mut self, registry: &mut Registry) -> Result<()> {
        for system in &mut self.systems {
            system.stop(registry)?;
        }
        Ok(())
    }

    fn position<S: System>(&self) -> Option<usize> {
        self.systems.iter().position(|s| s.system().as_any().is::<S>())
    }
}

#[cfg(test)]
#[path = "system_manager_tests.rs"]
mod tests;
