/// GpuContext - device state shared by every Vulkan object
///
/// Buffers and shader modules hold an `Arc<GpuContext>` so they can release
/// their handles on drop without going back through the backend.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

use slate_engine::slate::{Error, Result};

pub struct GpuContext {
    pub device: ash::Device,

    /// Dropped by `VulkanBackend` before the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,

    /// Pool for one-shot transfer commands (TRANSIENT | RESET_COMMAND_BUFFER)
    pub upload_command_pool: Mutex<vk::CommandPool>,

    /// Whether `bufferDeviceAddress` was enabled on the device
    pub buffer_device_address: bool,
}

impl GpuContext {
    pub fn new(
        device: ash::Device,
        allocator: Allocator,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        upload_command_pool: vk::CommandPool,
        buffer_device_address: bool,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue,
            graphics_queue_family,
            upload_command_pool: Mutex::new(upload_command_pool),
            buffer_device_address,
        }
    }

    /// Lock the allocator, mapping a poisoned lock to a backend error
    pub fn lock_allocator(&self) -> Result<std::sync::MutexGuard<'_, Allocator>> {
        self.allocator.lock()
            .map_err(|_| Error::BackendError("GPU allocator lock poisoned".to_string()))
    }
}
