/// Shader cursor - addresses a location inside a reflected type
///
/// A cursor starts at a root layout (byte offset 0) and narrows down
/// through fields and array elements, accumulating the byte offset and, for
/// descriptor-bound fields, the binding index. Narrowing composes:
/// `field("a")?.field("b")?` lands where `path("a.b")` lands.

use crate::error::{Error, Result};
use crate::renderer::{GpuBuffer, RenderBackend};
use crate::shader::{ParameterCategory, ShaderType, TypeKind, TypeLayout, VariableLayout};

// ============================================================================
// Targets
// ============================================================================

/// Memory a cursor writes into
pub trait CursorTarget {
    /// Whether the host can write the memory directly
    fn is_host_visible(&self) -> bool;

    /// Direct write into mapped/staging memory
    fn write_mapped(&mut self, offset: u64, data: &[u8]) -> Result<()>;

    /// Device-side update command for memory the host cannot map
    fn record_update(&mut self, offset: u64, data: &[u8]) -> Result<()>;
}

/// Host-visible staging buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostBuffer {
    bytes: Vec<u8>,
}

impl HostBuffer {
    pub fn new(size: usize) -> Self {
        Self { bytes: vec![0; size] }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `len` bytes at `offset`, if in range
    pub fn read(&self, offset: u32, len: usize) -> Option<&[u8]> {
        let start = offset as usize;
        self.bytes.get(start..start.checked_add(len)?)
    }
}

impl CursorTarget for HostBuffer {
    fn is_host_visible(&self) -> bool {
        true
    }

    fn write_mapped(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        crate::renderer::check_buffer_range(self.bytes.len() as u64, offset, data.len())?;
        let start = offset as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn record_update(&mut self, _offset: u64, _data: &[u8]) -> Result<()> {
        Err(Error::InvalidState("host buffers are written directly".to_string()))
    }
}

/// A backend buffer; device-local memory goes through `update_buffer`
pub struct GpuBufferTarget<'a> {
    pub buffer: &'a dyn GpuBuffer,
    pub backend: &'a mut dyn RenderBackend,
}

impl CursorTarget for GpuBufferTarget<'_> {
    fn is_host_visible(&self) -> bool {
        self.buffer.is_host_visible()
    }

    fn write_mapped(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.buffer.update(offset, data)
    }

    fn record_update(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.backend.update_buffer(self.buffer, offset, data)
    }
}

// ============================================================================
// Cursor
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ShaderCursor<'a> {
    layout: &'a TypeLayout,
    offset: u32,
    binding_index: u32,
    binding_space: u32,
}

impl<'a> ShaderCursor<'a> {
    /// Cursor at byte offset 0 of `layout`
    pub fn new(layout: &'a TypeLayout) -> Self {
        Self {
            layout,
            offset: 0,
            binding_index: 0,
            binding_space: 0,
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn binding_index(&self) -> u32 {
        self.binding_index
    }

    pub fn binding_space(&self) -> u32 {
        self.binding_space
    }

    pub fn type_layout(&self) -> &'a TypeLayout {
        self.layout
    }

    pub fn shader_type(&self) -> ShaderType {
        ShaderType::from_type_kind(&self.layout.kind)
    }

    /// Narrow to the field called `name`
    pub fn field(&self, name: &str) -> Result<Self> {
        match self.layout.fields().iter().find(|f| f.name == name) {
            Some(field) => self.enter(field),
            None => Err(crate::engine_err!(NotFound, "slate::ShaderCursor",
                "Type {} has no field '{}'", self.type_name(), name)),
        }
    }

    /// Narrow to the field at `index`
    pub fn field_at(&self, index: usize) -> Result<Self> {
        match self.layout.fields().get(index) {
            Some(field) => self.enter(field),
            None => Err(crate::engine_err!(NotFound, "slate::ShaderCursor",
                "Type {} has no field #{}", self.type_name(), index)),
        }
    }

    /// Narrow to array element `index`
    pub fn element(&self, index: u32) -> Result<Self> {
        let (TypeKind::Array { count }, Some(element)) = (self.layout.kind, self.layout.element_type()) else {
            return Err(crate::engine_err!(InvalidResource, "slate::ShaderCursor",
                "Type {} is not an array", self.type_name()));
        };
        if index >= count {
            return Err(crate::engine_err!(NotFound, "slate::ShaderCursor",
                "Index {} out of bounds for array of {}", index, count));
        }
        let offset = index.checked_mul(self.layout.stride)
            .and_then(|relative| self.offset.checked_add(relative))
            .ok_or_else(|| self.overflow("element", index))?;
        Ok(Self {
            layout: element,
            offset,
            ..*self
        })
    }

    /// Resolve a dotted path of field names ("light.color")
    pub fn path(&self, path: &str) -> Result<Self> {
        path.split('.').try_fold(*self, |cursor, name| cursor.field(name))
    }

    /// Write `data` at this location
    ///
    /// Host-visible targets are written directly; others receive a
    /// device-side update command.
    pub fn write(&self, target: &mut dyn CursorTarget, data: &[u8]) -> Result<()> {
        if self.layout.size > 0 && data.len() > self.layout.size as usize {
            return Err(crate::engine_err!(InvalidResource, "slate::ShaderCursor",
                "Writing {} bytes into {} of {} bytes", data.len(), self.type_name(), self.layout.size));
        }
        if target.is_host_visible() {
            target.write_mapped(self.offset as u64, data)
        } else {
            target.record_update(self.offset as u64, data)
        }
    }

    /// Write a plain-old-data value
    pub fn write_value<T: bytemuck::Pod>(&self, target: &mut dyn CursorTarget, value: &T) -> Result<()> {
        self.write(target, bytemuck::bytes_of(value))
    }

    fn enter(&self, field: &'a VariableLayout) -> Result<Self> {
        let (binding_index, binding_space) = match field.category {
            ParameterCategory::DescriptorTableSlot => {
                let index = self.binding_index.checked_add(field.binding_index)
                    .ok_or_else(|| self.overflow("binding of", &field.name))?;
                (index, field.binding_space)
            }
            _ => (self.binding_index, self.binding_space),
        };
        let offset = self.offset.checked_add(field.offset)
            .ok_or_else(|| self.overflow("field", &field.name))?;
        Ok(Self {
            layout: &field.type_layout,
            offset,
            binding_index,
            binding_space,
        })
    }

    fn overflow(&self, what: &str, item: impl std::fmt::Display) -> Error {
        crate::engine_err!(InvalidResource, "slate::ShaderCursor",
            "Location of {} {} in type {} overflows u32", what, item, self.type_name())
    }

    fn type_name(&self) -> String {
        self.layout.name.clone().unwrap_or_else(|| format!("{:?}", self.layout.kind))
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;
