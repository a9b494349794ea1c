/// Compiled shader module trait

use std::any::Any;

/// Backend shader module created from target code
///
/// Destroyed when the last reference drops.
pub trait GpuShaderModule: Send + Sync {
    /// Size of the code the module was created from, in bytes
    fn code_size(&self) -> usize;

    fn as_any(&self) -> &dyn Any;
}
