//! Shader reflection layer
//!
//! - [`layout`]: program layout model filled in by compiler drivers
//! - [`ShaderType`]: engine-native type tags, total over every layout kind
//! - [`ShaderReflection`]: uniform tree and binding tables of a program
//! - [`ShaderCursor`]: offset/binding walker writing into GPU-visible memory

pub mod layout;
mod shader_type;
mod reflection;
mod compiler;
mod cursor;

pub use layout::{ParameterCategory, ProgramLayout, ResourceShape, ScalarKind, TypeKind, TypeLayout, VariableLayout};
pub use shader_type::ShaderType;
pub use reflection::{BindingKind, ShaderBinding, ShaderReflection, Uniform};
pub use compiler::{
    skips_reflection, CompileDiagnostics, CompiledProgram, FixedCompiler, ShaderCompiler, NO_REFLECT_MARKER,
};
pub use cursor::{CursorTarget, GpuBufferTarget, HostBuffer, ShaderCursor};

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
