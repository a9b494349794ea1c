/// Vulkan debug messenger - routes validation layer messages into engine logging
///
/// Messages are filtered by severity and category, counted, and logged under
/// the `slate::Vulkan` source. Repeated messages carry a repetition count.

use ash::vk;
use rustc_hash::FxHashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use slate_engine::{engine_debug, engine_error, engine_info, engine_warn};

static DEBUG_CONFIG: Mutex<Option<DebugConfig>> = Mutex::new(None);

static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

static MESSAGE_COUNTS: Mutex<Option<FxHashMap<String, u32>>> = Mutex::new(None);

/// Lowest severity forwarded by the validation layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugSeverity {
    ErrorsOnly,
    #[default]
    ErrorsAndWarnings,
    All,
}

impl DebugSeverity {
    /// Messenger severity mask for this level
    pub fn message_severity(self) -> vk::DebugUtilsMessageSeverityFlagsEXT {
        use vk::DebugUtilsMessageSeverityFlagsEXT as Severity;
        match self {
            DebugSeverity::ErrorsOnly => Severity::ERROR,
            DebugSeverity::ErrorsAndWarnings => Severity::ERROR | Severity::WARNING,
            DebugSeverity::All => Severity::ERROR | Severity::WARNING | Severity::INFO | Severity::VERBOSE,
        }
    }
}

/// Which message categories are logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: true,
        }
    }
}

impl DebugMessageFilter {
    fn accepts(&self, message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> bool {
        if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
            self.show_validation
        } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
            self.show_performance
        } else {
            self.show_general
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugConfig {
    pub severity: DebugSeverity,
    pub message_filter: DebugMessageFilter,
    pub enable_stats: bool,
}

/// Validation message counts since the messenger was set up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn record(&self, level: MessageLevel) {
        let counter = match level {
            MessageLevel::Error => &self.errors,
            MessageLevel::Warning => &self.warnings,
            MessageLevel::Info => &self.info,
            MessageLevel::Verbose => &self.verbose,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageLevel {
    Error,
    Warning,
    Info,
    Verbose,
}

impl MessageLevel {
    fn from_severity(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Self {
        if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            MessageLevel::Error
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            MessageLevel::Warning
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            MessageLevel::Info
        } else {
            MessageLevel::Verbose
        }
    }
}

fn message_category(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

/// Install the messenger configuration and reset the counters
pub fn init_debug_config(config: DebugConfig) {
    VALIDATION_STATS.reset();
    if let Ok(mut counts) = MESSAGE_COUNTS.lock() {
        *counts = Some(FxHashMap::default());
    }
    if let Ok(mut current) = DEBUG_CONFIG.lock() {
        *current = Some(config);
    }
}

/// Stop handling messages (called before the messenger is destroyed)
pub fn cleanup_debug_config() {
    if let Ok(mut current) = DEBUG_CONFIG.lock() {
        *current = None;
    }
    if let Ok(mut counts) = MESSAGE_COUNTS.lock() {
        *counts = None;
    }
}

pub fn validation_stats() -> ValidationStats {
    VALIDATION_STATS.snapshot()
}

/// Log a summary of the validation counters
pub fn log_validation_stats() {
    let stats = validation_stats();
    if stats.total() == 0 {
        engine_info!("slate::Vulkan", "No validation messages");
        return;
    }
    let repeated = MESSAGE_COUNTS.lock()
        .ok()
        .and_then(|counts| counts.as_ref().map(|c| c.values().filter(|&&n| n > 1).count()))
        .unwrap_or(0);
    engine_info!("slate::Vulkan",
        "Validation messages: {} errors, {} warnings, {} info, {} verbose ({} repeated)",
        stats.errors, stats.warnings, stats.info, stats.verbose, repeated);
}

/// Handle one message; returns the line that was logged, if any
fn handle_message(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    message_id: &str,
    message: &str,
) -> Option<String> {
    let config = DEBUG_CONFIG.lock().ok().and_then(|config| *config)?;

    if !config.severity.message_severity().intersects(severity) {
        return None;
    }
    if !config.message_filter.accepts(message_type) {
        return None;
    }

    let level = MessageLevel::from_severity(severity);
    let occurrences = if config.enable_stats {
        VALIDATION_STATS.record(level);
        MESSAGE_COUNTS.lock().ok()
            .map(|mut counts| {
                let count = counts.get_or_insert_with(FxHashMap::default)
                    .entry(message.to_string())
                    .or_insert(0);
                *count += 1;
                *count
            })
            .unwrap_or(1)
    } else {
        1
    };

    let repeat = if occurrences > 1 {
        format!(" [x{}]", occurrences)
    } else {
        String::new()
    };
    let line = format!("[{}]{} {}: {}", message_category(message_type), repeat, message_id, message);
    match level {
        MessageLevel::Error => engine_error!("slate::Vulkan", "{}", line),
        MessageLevel::Warning => engine_warn!("slate::Vulkan", "{}", line),
        MessageLevel::Info => engine_info!("slate::Vulkan", "{}", line),
        MessageLevel::Verbose => engine_debug!("slate::Vulkan", "{}", line),
    }
    Some(line)
}

/// Messenger callback registered with `VK_EXT_debug_utils`
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = &*p_callback_data;
    let message_id = if callback_data.p_message_id_name.is_null() {
        "Unknown"
    } else {
        CStr::from_ptr(callback_data.p_message_id_name).to_str().unwrap_or("Invalid UTF-8")
    };
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message).to_str().unwrap_or("Invalid UTF-8")
    };

    handle_message(message_severity, message_type, message_id, message);
    vk::FALSE
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
