/// Shader compiler interface
///
/// The core never talks to a compiler toolchain directly. A driver (the
/// Slang driver in the Vulkan crate, or a test double) turns a module path
/// into target code plus a `ProgramLayout`.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{CompileStage, Error};
use crate::shader::ProgramLayout;

/// Marker that disables reflection for a source file
pub const NO_REFLECT_MARKER: &str = "#define NOREFLECT";

/// Output of a successful compilation
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProgram {
    pub layout: ProgramLayout,
    /// Target code (SPIR-V words as bytes for Vulkan)
    pub code: Vec<u8>,
}

/// Compiler failure with its diagnostics text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileDiagnostics {
    pub stage: CompileStage,
    /// Free-form text as emitted by the compiler
    pub message: String,
}

impl CompileDiagnostics {
    pub fn new(stage: CompileStage, message: impl Into<String>) -> Self {
        Self { stage, message: message.into() }
    }

    /// Convert into an engine error for `path`
    pub fn into_error(self, path: &Path) -> Error {
        Error::CompileFailure {
            path: path.display().to_string(),
            stage: self.stage,
            diagnostics: self.message,
        }
    }
}

/// Compiles a shader module to target code and reflects its layout
pub trait ShaderCompiler: Send + Sync {
    /// Compile the module at `path`
    ///
    /// Implementations skip reflection (returning `ProgramLayout::empty()`)
    /// when the source contains [`NO_REFLECT_MARKER`].
    fn compile(&self, path: &Path) -> std::result::Result<CompiledProgram, CompileDiagnostics>;
}

/// Whether `source` opts out of reflection
pub fn skips_reflection(source: &str) -> bool {
    source.contains(NO_REFLECT_MARKER)
}

// ============================================================================
// Fixed compiler
// ============================================================================

/// SPIR-V magic number, little-endian
const SPIRV_MAGIC: [u8; 4] = [0x03, 0x02, 0x23, 0x07];

/// Compiler returning a fixed program for every source
///
/// Reads the source so missing files and `#error` lines fail the way a real
/// compiler would (at the module stage). Used by headless tools and tests.
pub struct FixedCompiler {
    layout: ProgramLayout,
    code: Vec<u8>,
    compilations: AtomicUsize,
}

impl FixedCompiler {
    pub fn new(layout: ProgramLayout) -> Self {
        Self {
            layout,
            code: SPIRV_MAGIC.to_vec(),
            compilations: AtomicUsize::new(0),
        }
    }

    pub fn with_code(mut self, code: Vec<u8>) -> Self {
        self.code = code;
        self
    }

    /// Number of successful compilations
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }
}

impl Default for FixedCompiler {
    fn default() -> Self {
        Self::new(ProgramLayout::empty())
    }
}

impl ShaderCompiler for FixedCompiler {
    fn compile(&self, path: &Path) -> std::result::Result<CompiledProgram, CompileDiagnostics> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| CompileDiagnostics::new(CompileStage::Module, e.to_string()))?;
        if let Some(line) = source.lines().find(|l| l.trim_start().starts_with("#error")) {
            return Err(CompileDiagnostics::new(CompileStage::Module,
                format!("{}: {}", path.display(), line.trim())));
        }
        self.compilations.fetch_add(1, Ordering::Relaxed);
        let layout = if skips_reflection(&source) {
            ProgramLayout::empty()
        } else {
            self.layout.clone()
        };
        Ok(CompiledProgram { layout, code: self.code.clone() })
    }
}
