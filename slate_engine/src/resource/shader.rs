/// Shader resource - source file, compiled code and reflection
///
/// `compile` replaces code, layout and reflection only on success, so a
/// failed recompilation leaves the previous program in place.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::Result;
use crate::renderer::{GpuShaderModule, RenderBackend};
use crate::resource::{Resource, ResourceInfo, ResourceKind};
use crate::shader::{
    skips_reflection, ProgramLayout, ShaderCompiler, ShaderCursor, ShaderReflection, Uniform,
};

#[derive(Default)]
pub struct ShaderResource {
    info: ResourceInfo,
    source: String,
    code: Vec<u8>,
    layout: ProgramLayout,
    reflection: ShaderReflection,
    module: Option<Arc<dyn GpuShaderModule>>,
    /// Source modification time seen by the last compile attempt
    compiled_at: Option<SystemTime>,
}

impl ShaderResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Target code of the last successful compilation
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn is_compiled(&self) -> bool {
        !self.code.is_empty()
    }

    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    /// Reflected uniform by name or dotted path
    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.reflection.uniform(name)
    }

    /// Cursor at the root of the program layout
    pub fn cursor(&self) -> ShaderCursor<'_> {
        self.layout.root_cursor()
    }

    /// Compile and reflect the loaded source
    pub fn compile(&mut self, compiler: &dyn ShaderCompiler) -> Result<()> {
        if !self.info.loaded {
            crate::engine_bail!(InvalidState, "slate::ShaderResource", "Shader has no source loaded");
        }
        let path = self.info.path.clone();
        self.compiled_at = source_modified(&path);

        match compiler.compile(&path) {
            Ok(program) => {
                self.layout = if skips_reflection(&self.source) {
                    ProgramLayout::empty()
                } else {
                    program.layout
                };
                self.reflection = ShaderReflection::from_program(&self.layout);
                self.code = program.code;
                self.module = None;
                crate::engine_debug!("slate::ShaderResource",
                    "Compiled '{}' ({} bytes, {} parameters)",
                    self.info.file_name, self.code.len(), self.reflection.uniforms.len());
                Ok(())
            }
            Err(diagnostics) => {
                crate::engine_error!("slate::ShaderResource",
                    "Compilation of '{}' failed at {} stage:\n{}",
                    path.display(), diagnostics.stage, diagnostics.message);
                Err(diagnostics.into_error(&path))
            }
        }
    }

    /// Whether the source file changed since the last compile attempt
    pub fn is_stale(&self) -> bool {
        match (source_modified(&self.info.path), self.compiled_at) {
            (Some(modified), Some(compiled)) => modified > compiled,
            (Some(_), None) => true,
            _ => false,
        }
    }

    /// Re-read the source and compile it again
    pub fn reload(&mut self, compiler: &dyn ShaderCompiler) -> Result<()> {
        let path = self.info.path.clone();
        self.source = fs::read_to_string(&path)?;
        self.compile(compiler)
    }

    pub fn module(&self) -> Option<&Arc<dyn GpuShaderModule>> {
        self.module.as_ref()
    }

    /// Shader module on the GPU, created on first call
    pub fn ensure_module(&mut self, backend: &mut dyn RenderBackend) -> Result<Arc<dyn GpuShaderModule>> {
        if let Some(module) = &self.module {
            return Ok(Arc::clone(module));
        }
        if self.code.is_empty() {
            crate::engine_bail!(InvalidState, "slate::ShaderResource",
                "Shader '{}' has not been compiled", self.info.file_name);
        }
        let module = backend.create_shader_module(&self.code)?;
        self.module = Some(Arc::clone(&module));
        Ok(module)
    }
}

impl Resource for ShaderResource {
    const KIND: ResourceKind = ResourceKind::Shader;

    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ResourceInfo {
        &mut self.info
    }

    fn parse(&mut self, path: &Path) -> Result<()> {
        self.source = fs::read_to_string(path)?;
        Ok(())
    }
}

fn source_modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
