/// Headless backend recording everything it is asked to do
///
/// Buffers live in host memory; device-local buffers are only writable
/// through `update_buffer`, which applies the copy immediately and records
/// it. Used by tests and by tools that run the scene without a GPU.

use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::renderer::{
    check_buffer_range, BufferDesc, BufferUsage, DrawRequest, GpuBuffer, GpuShaderModule,
    RenderBackend,
};
use crate::{engine_bail, engine_debug};

// ============================================================================
// Recording Buffer
// ============================================================================

pub struct RecordingBuffer {
    desc: BufferDesc,
    data: Mutex<Vec<u8>>,
    address: Option<u64>,
}

impl RecordingBuffer {
    fn new(desc: BufferDesc, address: Option<u64>) -> Self {
        let data = Mutex::new(vec![0; desc.size as usize]);
        Self { desc, data, address }
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    /// Copy of the buffer contents
    pub fn contents(&self) -> Result<Vec<u8>> {
        self.data.lock()
            .map(|data| data.clone())
            .map_err(|_| Error::BackendError("Recording buffer lock poisoned".to_string()))
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        check_buffer_range(self.desc.size, offset, data.len())?;
        let mut bytes = self.data.lock()
            .map_err(|_| Error::BackendError("Recording buffer lock poisoned".to_string()))?;
        let start = offset as usize;
        bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl GpuBuffer for RecordingBuffer {
    fn size(&self) -> u64 {
        self.desc.size
    }

    fn usage(&self) -> BufferUsage {
        self.desc.usage
    }

    fn is_host_visible(&self) -> bool {
        self.desc.host_visible
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        if !self.desc.host_visible {
            engine_bail!("slate::RecordingBackend",
                "Buffer '{}' is device-local and cannot be mapped", self.desc.name);
        }
        self.write(offset, data)
    }

    fn device_address(&self) -> Option<u64> {
        self.address
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Recording Shader Module
// ============================================================================

pub struct RecordingShaderModule {
    code: Vec<u8>,
}

impl RecordingShaderModule {
    pub fn code(&self) -> &[u8] {
        &self.code
    }
}

impl GpuShaderModule for RecordingShaderModule {
    fn code_size(&self) -> usize {
        self.code.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Recording Backend
// ============================================================================

/// Device-side update recorded by `update_buffer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUpdate {
    pub buffer: String,
    pub offset: u64,
    pub len: usize,
}

pub struct RecordingBackend {
    next_address: u64,
    pub buffers_created: usize,
    pub shader_modules_created: usize,
    pub device_updates: Vec<DeviceUpdate>,
    pending_draws: Vec<DrawRequest>,
    last_frame: Vec<DrawRequest>,
    pub frames_rendered: u64,
    swapchain_dirty: bool,
    pub extent: (u32, u32),
    pub resize_count: u32,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            next_address: 0x1000,
            buffers_created: 0,
            shader_modules_created: 0,
            device_updates: Vec::new(),
            pending_draws: Vec::new(),
            last_frame: Vec::new(),
            frames_rendered: 0,
            swapchain_dirty: false,
            extent: (0, 0),
            resize_count: 0,
        }
    }

    /// Draws queued since the last `render_frame`
    pub fn pending_draws(&self) -> &[DrawRequest] {
        &self.pending_draws
    }

    /// Draws presented by the last `render_frame`
    pub fn last_frame(&self) -> &[DrawRequest] {
        &self.last_frame
    }

    /// Act as if presentation reported an out-of-date swapchain
    pub fn mark_swapchain_dirty(&mut self) {
        self.swapchain_dirty = true;
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for RecordingBackend {
    fn create_shader_module(&mut self, code: &[u8]) -> Result<Arc<dyn GpuShaderModule>> {
        if code.is_empty() || code.len() % 4 != 0 {
            engine_bail!(InvalidResource, "slate::RecordingBackend",
                "Shader code must be a non-empty multiple of 4 bytes (got {})", code.len());
        }
        self.shader_modules_created += 1;
        Ok(Arc::new(RecordingShaderModule { code: code.to_vec() }))
    }

    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn GpuBuffer>> {
        if desc.size == 0 {
            engine_bail!(InvalidResource, "slate::RecordingBackend",
                "Buffer '{}' has zero size", desc.name);
        }
        let address = if desc.usage.contains(BufferUsage::DEVICE_ADDRESS) {
            let address = self.next_address;
            self.next_address += desc.size.next_multiple_of(256);
            Some(address)
        } else {
            None
        };
        self.buffers_created += 1;
        Ok(Arc::new(RecordingBuffer::new(desc, address)))
    }

    fn update_buffer(&mut self, buffer: &dyn GpuBuffer, offset: u64, data: &[u8]) -> Result<()> {
        let Some(buffer) = buffer.as_any().downcast_ref::<RecordingBuffer>() else {
            engine_bail!("slate::RecordingBackend", "Buffer was not created by this backend");
        };
        buffer.write(offset, data)?;
        self.device_updates.push(DeviceUpdate {
            buffer: buffer.desc.name.clone(),
            offset,
            len: data.len(),
        });
        Ok(())
    }

    fn submit_draw(&mut self, draw: DrawRequest) -> Result<()> {
        self.pending_draws.push(draw);
        Ok(())
    }

    fn render_frame(&mut self) -> Result<()> {
        self.last_frame = std::mem::take(&mut self.pending_draws);
        self.frames_rendered += 1;
        Ok(())
    }

    fn swapchain_dirty(&self) -> bool {
        self.swapchain_dirty
    }

    fn resize_swapchain(&mut self, width: u32, height: u32) -> Result<()> {
        engine_debug!("slate::RecordingBackend", "Swapchain resized to {}x{}", width, height);
        self.extent = (width, height);
        self.swapchain_dirty = false;
        self.resize_count += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "recording_backend_tests.rs"]
mod tests;
