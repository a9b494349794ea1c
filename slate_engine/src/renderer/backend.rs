/// RenderBackend trait - what the core asks of the GPU

use std::any::Any;
use std::sync::Arc;

use crate::error::Result;
use crate::renderer::{BufferDesc, DrawRequest, GpuBuffer, GpuShaderModule};

/// Rendering backend driven by the scene and resources
///
/// Command recording, synchronization and presentation stay inside the
/// backend. The frame loop only reacts to `swapchain_dirty`.
pub trait RenderBackend: Send {
    /// Create a shader module from target code (SPIR-V for Vulkan)
    fn create_shader_module(&mut self, code: &[u8]) -> Result<Arc<dyn GpuShaderModule>>;

    /// Create a buffer
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn GpuBuffer>>;

    /// Write into a buffer through a device-side update command
    ///
    /// Used for memory the host cannot map.
    fn update_buffer(&mut self, buffer: &dyn GpuBuffer, offset: u64, data: &[u8]) -> Result<()>;

    /// Queue a draw for the current frame
    fn submit_draw(&mut self, draw: DrawRequest) -> Result<()>;

    /// Render and present the queued draws
    fn render_frame(&mut self) -> Result<()>;

    /// The swapchain no longer matches the surface
    fn swapchain_dirty(&self) -> bool;

    /// Recreate the swapchain for a new surface size
    fn resize_swapchain(&mut self, width: u32, height: u32) -> Result<()>;

    /// For downcasting to the concrete backend
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
