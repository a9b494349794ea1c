//! Unit tests for error.rs
//!
//! Tests Error variants, their Display output and the error macros.

use crate::error::{CompileStage, Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_not_found_display() {
    let err = Error::NotFound("component Transform on entity 3v1".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Not found"));
    assert!(display.contains("Transform"));
}

#[test]
fn test_already_exists_display() {
    let err = Error::AlreadyExists("component Name".to_string());
    assert_eq!(format!("{}", err), "Already exists: component Name");
}

#[test]
fn test_compile_failure_keeps_diagnostics_verbatim() {
    let diagnostics = "shaders/lit.slang(12): error 30015: undefined identifier 'albedo'";
    let err = Error::CompileFailure {
        path: "shaders/lit.slang".to_string(),
        stage: CompileStage::Link,
        diagnostics: diagnostics.to_string(),
    };
    let display = format!("{}", err);
    assert!(display.contains("link stage"));
    assert!(display.contains("shaders/lit.slang"));
    assert!(display.ends_with(diagnostics));
}

#[test]
fn test_capacity_exceeded_display() {
    let err = Error::CapacityExceeded { what: "registered shaders", capacity: 128 };
    assert_eq!(format!("{}", err), "Capacity exceeded: registered shaders (max 128)");
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_compile_stage_display() {
    assert_eq!(CompileStage::Module.to_string(), "module");
    assert_eq!(CompileStage::Compose.to_string(), "compose");
    assert_eq!(CompileStage::Link.to_string(), "link");
    assert_eq!(CompileStage::Layout.to_string(), "layout");
    assert_eq!(CompileStage::CodeGen.to_string(), "codegen");
}

// ============================================================================
// CONVERSIONS
// ============================================================================

#[test]
fn test_io_error_converts_to_io_failure() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume");
    let err: Error = io.into();
    match err {
        Error::IoFailure(msg) => assert!(msg.contains("read-only volume")),
        other => panic!("expected IoFailure, got {:?}", other),
    }
}

#[test]
fn test_error_is_std_error() {
    let err = Error::InvalidState("stop before start".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone() {
    let err = Error::CompileFailure {
        path: "a.slang".to_string(),
        stage: CompileStage::CodeGen,
        diagnostics: "boom".to_string(),
    };
    assert_eq!(format!("{}", err), format!("{}", err.clone()));
}

// ============================================================================
// MACROS
// ============================================================================

#[test]
fn test_engine_err_defaults_to_backend_error() {
    let err = crate::engine_err!("slate::error_tests", "device lost after {} frames", 3);
    match err {
        Error::BackendError(msg) => assert_eq!(msg, "device lost after 3 frames"),
        other => panic!("expected BackendError, got {:?}", other),
    }
}

#[test]
fn test_engine_err_with_variant() {
    let err = crate::engine_err!(NotFound, "slate::error_tests", "no entity named '{}'", "Sun");
    match err {
        Error::NotFound(msg) => assert_eq!(msg, "no entity named 'Sun'"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_engine_bail_returns_early() {
    fn check(value: u32) -> Result<u32> {
        if value > 10 {
            crate::engine_bail!(InvalidResource, "slate::error_tests", "value {} too large", value);
        }
        Ok(value)
    }

    assert_eq!(check(4).unwrap(), 4);
    assert!(matches!(check(11), Err(Error::InvalidResource(_))));
}
