/// System trait and its lifecycle state machine

use std::any::Any;
use std::fmt;

use crate::ecs::Registry;
use crate::error::Result;
use crate::renderer::RenderBackend;

/// Lifecycle state of a system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SystemState {
    #[default]
    Inactive,
    Starting,
    Updating,
    Stopping,
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SystemState::Inactive => "Inactive",
            SystemState::Starting => "Starting",
            SystemState::Updating => "Updating",
            SystemState::Stopping => "Stopping",
        };
        f.write_str(name)
    }
}

/// What a system sees during one update
pub struct SystemContext<'a> {
    pub registry: &'a mut Registry,
    /// Absent for headless ticks
    pub backend: Option<&'a mut dyn RenderBackend>,
    /// Seconds since the previous frame
    pub delta_time: f64,
}

/// Per-frame logic over the registry
pub trait System: Any {
    fn name(&self) -> &'static str;

    fn on_start(&mut self, _registry: &mut Registry) -> Result<()> {
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut SystemContext<'_>) -> Result<()>;

    fn on_stop(&mut self, _registry: &mut Registry) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A system plus its lifecycle state
///
/// Transitions requested from the wrong state are skipped with a warning.
pub struct ScheduledSystem {
    state: SystemState,
    system: Box<dyn System>,
}

impl ScheduledSystem {
    pub fn new(system: Box<dyn System>) -> Self {
        Self {
            state: SystemState::Inactive,
            system,
        }
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn name(&self) -> &'static str {
        self.system.name()
    }

    pub fn system(&self) -> &dyn System {
        self.system.as_ref()
    }

    pub fn system_mut(&mut self) -> &mut dyn System {
        self.system.as_mut()
    }

    /// Inactive -> Starting
    pub fn start(&mut self, registry: &mut Registry) -> Result<()> {
        if self.state != SystemState::Inactive {
            crate::engine_warn!("slate::System",
                "{}: start can only be called while inactive (state is {})", self.name(), self.state);
            return Ok(());
        }
        self.state = SystemState::Starting;
        self.system.on_start(registry)
    }

    /// Any state -> Updating
    pub fn update(&mut self, ctx: &mut SystemContext<'_>) -> Result<()> {
        self.state = SystemState::Updating;
        self.system.on_update(ctx)
    }

    /// Updating -> Stopping -> Inactive
    pub fn stop(&mut self, registry: &mut Registry) -> Result<()> {
        if self.state != SystemState::Updating {
            crate::engine_warn!("slate::System",
                "{}: stop can only be called while updating (state is {})", self.name(), self.state);
            return Ok(());
        }
        self.state = SystemState::Stopping;
        let result = self.system.on_stop(registry);
        self.state = SystemState::Inactive;
        result
    }
}
