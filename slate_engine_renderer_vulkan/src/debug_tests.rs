use super::*;
use serial_test::serial;

use ash::vk::DebugUtilsMessageSeverityFlagsEXT as Severity;
use ash::vk::DebugUtilsMessageTypeFlagsEXT as MessageType;

fn config(severity: DebugSeverity) -> DebugConfig {
    DebugConfig {
        severity,
        message_filter: DebugMessageFilter::default(),
        enable_stats: true,
    }
}

#[test]
fn test_severity_masks() {
    assert_eq!(DebugSeverity::ErrorsOnly.message_severity(), Severity::ERROR);
    assert_eq!(DebugSeverity::ErrorsAndWarnings.message_severity(), Severity::ERROR | Severity::WARNING);
    assert!(DebugSeverity::All.message_severity().contains(Severity::VERBOSE));
}

#[test]
fn test_message_filter_by_category() {
    let filter = DebugMessageFilter {
        show_general: false,
        show_validation: true,
        show_performance: false,
    };
    assert!(filter.accepts(MessageType::VALIDATION));
    assert!(!filter.accepts(MessageType::PERFORMANCE));
    assert!(!filter.accepts(MessageType::GENERAL));
}

#[test]
#[serial]
fn test_messages_counted_by_level() {
    init_debug_config(config(DebugSeverity::All));

    handle_message(Severity::ERROR, MessageType::VALIDATION, "VUID-1", "bad");
    handle_message(Severity::WARNING, MessageType::PERFORMANCE, "Perf-1", "slow");
    handle_message(Severity::VERBOSE, MessageType::GENERAL, "Loader", "loaded");

    let stats = validation_stats();
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.warnings, 1);
    assert_eq!(stats.verbose, 1);
    assert_eq!(stats.total(), 3);
    cleanup_debug_config();
}

#[test]
#[serial]
fn test_messages_below_severity_are_dropped() {
    init_debug_config(config(DebugSeverity::ErrorsOnly));

    assert!(handle_message(Severity::WARNING, MessageType::VALIDATION, "VUID-2", "meh").is_none());
    assert_eq!(validation_stats().total(), 0);
    cleanup_debug_config();
}

#[test]
#[serial]
fn test_repeated_message_carries_count() {
    init_debug_config(config(DebugSeverity::All));

    let first = handle_message(Severity::ERROR, MessageType::VALIDATION, "VUID-3", "again").unwrap();
    let second = handle_message(Severity::ERROR, MessageType::VALIDATION, "VUID-3", "again").unwrap();

    assert_eq!(first, "[Validation] VUID-3: again");
    assert_eq!(second, "[Validation] [x2] VUID-3: again");
    cleanup_debug_config();
}

#[test]
#[serial]
fn test_no_config_ignores_messages() {
    cleanup_debug_config();
    assert!(handle_message(Severity::ERROR, MessageType::GENERAL, "id", "msg").is_none());
}
