/// VulkanShaderModule - Vulkan implementation of the GpuShaderModule trait

use ash::vk;
use std::any::Any;
use std::io::Cursor;
use std::sync::Arc;

use slate_engine::slate::render::GpuShaderModule;
use slate_engine::slate::Result;
use slate_engine::{engine_bail, engine_err};

use crate::vulkan_context::GpuContext;

/// Decode SPIR-V bytes into words, checking size and magic number
pub(crate) fn spirv_words(code: &[u8]) -> Result<Vec<u32>> {
    if code.is_empty() || code.len() % 4 != 0 {
        engine_bail!(InvalidResource, "slate::Vulkan",
            "Shader code must be a non-empty multiple of 4 bytes (got {})", code.len());
    }
    ash::util::read_spv(&mut Cursor::new(code))
        .map_err(|e| engine_err!(InvalidResource, "slate::Vulkan", "Invalid SPIR-V: {}", e))
}

pub struct VulkanShaderModule {
    ctx: Arc<GpuContext>,
    pub(crate) module: vk::ShaderModule,
    code_size: usize,
}

impl VulkanShaderModule {
    pub(crate) fn create(ctx: &Arc<GpuContext>, code: &[u8]) -> Result<Self> {
        let words = spirv_words(code)?;
        let create_info = vk::ShaderModuleCreateInfo::default().code(&words);
        let module = unsafe {
            ctx.device.create_shader_module(&create_info, None)
                .map_err(|e| engine_err!("slate::Vulkan", "Failed to create shader module: {:?}", e))?
        };
        Ok(Self {
            ctx: Arc::clone(ctx),
            module,
            code_size: code.len(),
        })
    }

    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }
}

impl GpuShaderModule for VulkanShaderModule {
    fn code_size(&self) -> usize {
        self.code_size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}
