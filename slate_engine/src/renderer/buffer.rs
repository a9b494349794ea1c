/// Buffer trait and buffer descriptor

use bitflags::bitflags;
use std::any::Any;

use crate::error::Result;

bitflags! {
    /// Buffer usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Vertex buffer
        const VERTEX = 1 << 0;
        /// Index buffer
        const INDEX = 1 << 1;
        /// Uniform/constant buffer
        const UNIFORM = 1 << 2;
        /// Storage buffer
        const STORAGE = 1 << 3;
        /// Queryable GPU address (buffer device address)
        const DEVICE_ADDRESS = 1 << 4;
    }
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Debug name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
    /// Memory the host can map and write directly
    pub host_visible: bool,
}

/// GPU buffer owned through an `Arc`
///
/// Implemented by backend-specific buffer types. The buffer is destroyed
/// when the last reference drops.
pub trait GpuBuffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    fn usage(&self) -> BufferUsage;

    /// Whether `update` can write through mapped memory
    fn is_host_visible(&self) -> bool;

    /// Write `data` at `offset` through mapped memory
    ///
    /// Fails for device-local buffers; those go through
    /// `RenderBackend::update_buffer`.
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// GPU virtual address, when created with `DEVICE_ADDRESS`
    fn device_address(&self) -> Option<u64> {
        None
    }

    /// Access to the concrete backend type
    fn as_any(&self) -> &dyn Any;
}

/// Check that `len` bytes at `offset` fit in a buffer of `size` bytes
pub fn check_buffer_range(size: u64, offset: u64, len: usize) -> Result<()> {
    match offset.checked_add(len as u64) {
        Some(end) if end <= size => Ok(()),
        _ => Err(crate::engine_err!(InvalidResource, "slate::Buffer",
            "Write of {} bytes at offset {} overflows buffer of {} bytes", len, offset, size)),
    }
}
