/// Slang compiler driver
///
/// Runs `slangc` to produce SPIR-V 1.5 with column-major matrices and
/// entry-point names preserved, then reflects the SPIR-V into a
/// `ProgramLayout`. Sources containing `#define NOREFLECT` skip reflection.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use slate_engine::slate::shader::{
    skips_reflection, CompileDiagnostics, CompiledProgram, ProgramLayout, ShaderCompiler,
};
use slate_engine::slate::{CompileStage, EngineConfig};
use slate_engine::{engine_debug, engine_trace};

use crate::spirv_reflect::reflect_spirv;
use crate::vulkan_shader::spirv_words;

/// Environment variable overriding the compiler executable
pub const SLANGC_ENV: &str = "SLANGC";

const SPIRV_PROFILE: &str = "spirv_1_5";

static OUTPUT_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct SlangCompiler {
    executable: PathBuf,
    search_paths: Vec<PathBuf>,
    scratch_directory: PathBuf,
}

impl SlangCompiler {
    /// Compiler using `$SLANGC` or `slangc` from `PATH`
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        let executable = std::env::var_os(SLANGC_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("slangc"));
        Self {
            executable,
            search_paths,
            scratch_directory: std::env::temp_dir(),
        }
    }

    /// Compiler with the configured include directories, resolved against
    /// the asset root
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.resolved_shader_search_paths())
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Directory intermediate SPIR-V files are written to
    pub fn with_scratch_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.scratch_directory = directory.into();
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Command-line arguments compiling `source` into `output`
    pub fn arguments(&self, source: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-target", "spirv",
            "-profile", SPIRV_PROFILE,
            "-matrix-layout-column-major",
            "-fvk-use-entrypoint-name",
            "-fvk-use-gl-layout",
            "-fvk-invert-y",
            "-emit-spirv-directly",
        ]
        .iter()
        .map(OsString::from)
        .collect();

        for path in &self.search_paths {
            args.push("-I".into());
            args.push(path.as_os_str().to_owned());
        }
        args.push("-o".into());
        args.push(output.as_os_str().to_owned());
        args.push(source.as_os_str().to_owned());
        args
    }

    fn scratch_output(&self) -> PathBuf {
        let id = OUTPUT_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.scratch_directory.join(format!("slate_{}_{}.spv", std::process::id(), id))
    }

    fn run(&self, path: &Path, output: &Path) -> Result<Vec<u8>, CompileDiagnostics> {
        let args = self.arguments(path, output);
        engine_trace!("slate::SlangCompiler", "{} {:?}", self.executable.display(), args);

        let result = Command::new(&self.executable)
            .args(&args)
            .output()
            .map_err(|e| CompileDiagnostics::new(CompileStage::Module,
                format!("Failed to run {}: {}", self.executable.display(), e)))?;

        if !result.status.success() {
            let mut message = String::from_utf8_lossy(&result.stderr).trim().to_string();
            if message.is_empty() {
                message = format!("{} exited with {}", self.executable.display(), result.status);
            }
            return Err(CompileDiagnostics::new(CompileStage::Module, message));
        }

        std::fs::read(output)
            .map_err(|e| CompileDiagnostics::new(CompileStage::CodeGen,
                format!("Failed to read {}: {}", output.display(), e)))
    }
}

impl ShaderCompiler for SlangCompiler {
    fn compile(&self, path: &Path) -> Result<CompiledProgram, CompileDiagnostics> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| CompileDiagnostics::new(CompileStage::Module,
                format!("{}: {}", path.display(), e)))?;

        let output = self.scratch_output();
        let code = self.run(path, &output);
        std::fs::remove_file(&output).ok();
        let code = code?;

        let layout = if skips_reflection(&source) {
            ProgramLayout::empty()
        } else {
            let words = spirv_words(&code)
                .map_err(|e| CompileDiagnostics::new(CompileStage::CodeGen, e.to_string()))?;
            reflect_spirv(&words)
                .map_err(|e| CompileDiagnostics::new(CompileStage::Layout, e.to_string()))?
        };

        engine_debug!("slate::SlangCompiler", "Compiled {} ({} bytes of SPIR-V, {} parameters)",
            path.display(), code.len(), layout.parameters().len());
        Ok(CompiledProgram { layout, code })
    }
}

#[cfg(test)]
#[path = "slang_compiler_tests.rs"]
mod tests;
