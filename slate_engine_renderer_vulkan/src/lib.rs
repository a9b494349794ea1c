/*!
# Slate Engine - Vulkan Backend

Vulkan implementation of the Slate `RenderBackend`, built on ash for the
Vulkan bindings and gpu-allocator for memory management, plus the Slang
compiler driver that turns `.slang` modules into SPIR-V and reflects them
into the engine's program layout.

```no_run
use slate_engine_renderer_vulkan::slate::{SlangCompiler, VulkanBackend, VulkanConfig};
use slate_engine::slate::EngineConfig;

let backend = VulkanBackend::new(VulkanConfig::default())?;
let compiler = SlangCompiler::from_config(&EngineConfig::default());
# Ok::<(), slate_engine::slate::Error>(())
```
*/

mod vulkan_context;
mod vulkan_buffer;
mod vulkan_shader;
mod vulkan_backend;
mod spirv_reflect;
mod slang_compiler;
pub mod debug;

pub mod slate {
    pub use crate::vulkan_backend::{FrameRecorder, PresentStatus, VulkanBackend, VulkanConfig, MAX_UPDATE_CHUNK};
    pub use crate::vulkan_buffer::VulkanBuffer;
    pub use crate::vulkan_context::GpuContext;
    pub use crate::vulkan_shader::VulkanShaderModule;
    pub use crate::slang_compiler::{SlangCompiler, SLANGC_ENV};
    pub use crate::spirv_reflect::reflect_spirv;
    pub use crate::debug::{DebugMessageFilter, DebugSeverity, ValidationStats};
}
