//! Error types for the Slate engine
//!
//! This module defines the error types used throughout the engine:
//! component and entity access, shader compilation, resource loading
//! and the rendering backend.

use std::fmt;

/// Result type for Slate engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stage of the shader toolchain that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStage {
    /// Loading and parsing the source module
    Module,
    /// Composing the module with its entry points
    Compose,
    /// Linking the composed program
    Link,
    /// Querying the program layout
    Layout,
    /// Emitting target code
    CodeGen,
}

impl fmt::Display for CompileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompileStage::Module => "module",
            CompileStage::Compose => "compose",
            CompileStage::Link => "link",
            CompileStage::Layout => "layout",
            CompileStage::CodeGen => "codegen",
        };
        f.write_str(name)
    }
}

/// Slate engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Missing component, entity, resource or file
    NotFound(String),

    /// Component already attached, or name already taken
    AlreadyExists(String),

    /// Shader compilation failed; diagnostics are the compiler's text verbatim
    CompileFailure {
        path: String,
        stage: CompileStage,
        diagnostics: String,
    },

    /// A bounded table is full
    CapacityExceeded {
        what: &'static str,
        capacity: usize,
    },

    /// Operation called in the wrong lifecycle state
    InvalidState(String),

    /// File open, read, write or parse failure
    IoFailure(String),

    /// Backend-specific error (Vulkan, headless, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (unknown extension, malformed data, ...)
    InvalidResource(String),

    /// Initialization failed (engine, backend, subsystems)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::AlreadyExists(msg) => write!(f, "Already exists: {}", msg),
            Error::CompileFailure { path, stage, diagnostics } => {
                write!(f, "Shader compilation failed at {} stage for '{}':\n{}", stage, path, diagnostics)
            }
            Error::CapacityExceeded { what, capacity } => {
                write!(f, "Capacity exceeded: {} (max {})", what, capacity)
            }
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::IoFailure(msg) => write!(f, "I/O failure: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoFailure(err.to_string())
    }
}

// ===== ERROR MACROS =====

/// Log an ERROR message and build the matching `Error`
///
/// With a leading variant name the message goes into that variant,
/// otherwise into `Error::BackendError`.
///
/// # Example
///
/// ```no_run
/// # use slate_engine::engine_err;
/// let missing = engine_err!(NotFound, "slate::Scene", "No entity named '{}'", "Camera");
/// let backend = engine_err!("slate::vulkan", "vkCreateBuffer failed: {}", -2);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($kind:ident, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::slate::Error::$kind(message)
    }};
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::slate::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return early with the matching `Error`
///
/// Accepts the same forms as [`engine_err!`].
#[macro_export]
macro_rules! engine_bail {
    ($($arg:tt)*) => {
        return Err($crate::engine_err!($($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
