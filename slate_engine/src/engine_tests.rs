//! Unit tests for the global logger entry point
//!
//! LOGGER is a global OnceLock shared across all tests, so every test here
//! is marked #[serial].

use crate::slate::Engine;
use crate::slate::log::{LogEntry, LogSeverity, Logger};
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// TEST HELPERS
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

fn capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        // Other test threads may log concurrently; keep only ours
        if entry.source == "slate::test" {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

// ============================================================================
// LOGGER TESTS
// ============================================================================

#[test]
#[serial]
fn test_set_logger_captures_entries() {
    let entries = capture();

    Engine::log(LogSeverity::Info, "slate::test", "hello".to_string());
    Engine::log(LogSeverity::Warn, "slate::test", "careful".to_string());

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].severity, LogSeverity::Info);
    assert_eq!(entries[1].message, "careful");
    assert!(entries[1].file.is_none());
    drop(entries);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_log_detailed_records_location() {
    let entries = capture();

    crate::engine_error!("slate::test", "failed with code {}", 7);

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert_eq!(entries[0].message, "failed with code 7");
    assert!(entries[0].file.unwrap().ends_with("engine_tests.rs"));
    assert!(entries[0].line.is_some());
    drop(entries);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_err_logs_before_returning() {
    let entries = capture();

    let _err = crate::engine_err!(NotFound, "slate::test", "missing '{}'", "Sun");

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].source, "slate::test");
    assert_eq!(entries[0].message, "missing 'Sun'");
    drop(entries);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_reset_logger_stops_capture() {
    let entries = capture();
    Engine::reset_logger();

    Engine::log(LogSeverity::Debug, "slate::test", "to stdout".to_string());

    assert!(entries.lock().unwrap().is_empty());
}
