/// VulkanBuffer - Vulkan implementation of the GpuBuffer trait

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::any::Any;
use std::sync::Arc;

use slate_engine::slate::render::{check_buffer_range, BufferDesc, BufferUsage, GpuBuffer};
use slate_engine::slate::{Error, Result};
use slate_engine::{engine_bail, engine_err, engine_error};

use crate::vulkan_context::GpuContext;

/// Vulkan usage flags for engine usage flags
///
/// Every buffer is a transfer destination so device-local memory can be
/// written with `vkCmdUpdateBuffer`.
pub(crate) fn buffer_usage_flags(usage: BufferUsage) -> vk::BufferUsageFlags {
    let mut flags = vk::BufferUsageFlags::TRANSFER_DST;
    if usage.contains(BufferUsage::VERTEX) {
        flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }
    if usage.contains(BufferUsage::INDEX) {
        flags |= vk::BufferUsageFlags::INDEX_BUFFER;
    }
    if usage.contains(BufferUsage::UNIFORM) {
        flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }
    if usage.contains(BufferUsage::STORAGE) {
        flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }
    if usage.contains(BufferUsage::DEVICE_ADDRESS) {
        flags |= vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS;
    }
    flags
}

pub(crate) fn memory_location(host_visible: bool) -> MemoryLocation {
    if host_visible {
        MemoryLocation::CpuToGpu
    } else {
        MemoryLocation::GpuOnly
    }
}

pub struct VulkanBuffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    name: String,
    size: u64,
    usage: BufferUsage,
    host_visible: bool,
    address: Option<u64>,
}

impl VulkanBuffer {
    pub(crate) fn create(ctx: &Arc<GpuContext>, desc: BufferDesc) -> Result<Self> {
        if desc.size == 0 {
            engine_bail!(InvalidResource, "slate::Vulkan", "Buffer '{}' has zero size", desc.name);
        }
        let wants_address = desc.usage.contains(BufferUsage::DEVICE_ADDRESS);
        if wants_address && !ctx.buffer_device_address {
            engine_bail!(InvalidState, "slate::Vulkan",
                "Buffer '{}' needs a device address but bufferDeviceAddress is disabled", desc.name);
        }

        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(buffer_usage_flags(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx.device.create_buffer(&create_info, None)
                .map_err(|e| engine_err!("slate::Vulkan",
                    "Failed to create buffer '{}' of {} bytes: {:?}", desc.name, desc.size, e))?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = ctx.lock_allocator()
                .and_then(|mut allocator| {
                    allocator.allocate(&AllocationCreateDesc {
                        name: &desc.name,
                        requirements,
                        location: memory_location(desc.host_visible),
                        linear: true,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|_| {
                        let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                        engine_error!("slate::Vulkan",
                            "Out of GPU memory for buffer '{}' (required: {:.2} MB)", desc.name, size_mb);
                        Error::OutOfMemory
                    })
                });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            if let Err(e) = ctx.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
                if let Ok(mut allocator) = ctx.lock_allocator() {
                    allocator.free(allocation).ok();
                }
                ctx.device.destroy_buffer(buffer, None);
                engine_bail!("slate::Vulkan", "Failed to bind memory of buffer '{}': {:?}", desc.name, e);
            }

            let address = wants_address.then(|| {
                let info = vk::BufferDeviceAddressInfo::default().buffer(buffer);
                ctx.device.get_buffer_device_address(&info)
            });

            Ok(Self {
                ctx: Arc::clone(ctx),
                buffer,
                allocation: Some(allocation),
                name: desc.name,
                size: desc.size,
                usage: desc.usage,
                host_visible: desc.host_visible,
                address,
            })
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl GpuBuffer for VulkanBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn is_host_visible(&self) -> bool {
        self.host_visible
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        check_buffer_range(self.size, offset, data.len())?;
        let Some(allocation) = &self.allocation else {
            engine_bail!("slate::Vulkan", "Buffer '{}' has no GPU allocation", self.name);
        };
        let Some(mapped) = allocation.mapped_ptr() else {
            engine_bail!(InvalidState, "slate::Vulkan",
                "Buffer '{}' is device-local and cannot be mapped", self.name);
        };
        unsafe {
            let dst = (mapped.as_ptr() as *mut u8).add(offset as usize);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }
        Ok(())
    }

    fn device_address(&self) -> Option<u64> {
        self.address
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                // The buffer is destroyed even if the allocator lock is poisoned
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_buffer_tests.rs"]
mod tests;
