/// Program layout model
///
/// Engine-side mirror of what a shader compiler reports after linking: a
/// list of top-level parameters, each with a type layout, a byte offset, a
/// binding index/space and a binding category. Compiler drivers translate
/// their own reflection into these types.

use crate::shader::ShaderCursor;

/// Scalar kinds a compiler can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 13] = [
        ScalarKind::Void,
        ScalarKind::Bool,
        ScalarKind::Int8,
        ScalarKind::Int16,
        ScalarKind::Int32,
        ScalarKind::Int64,
        ScalarKind::UInt8,
        ScalarKind::UInt16,
        ScalarKind::UInt32,
        ScalarKind::UInt64,
        ScalarKind::Float16,
        ScalarKind::Float32,
        ScalarKind::Float64,
    ];

    /// Size in bytes (booleans are 32-bit in buffers)
    pub fn size(self) -> u32 {
        match self {
            ScalarKind::Void => 0,
            ScalarKind::Int8 | ScalarKind::UInt8 => 1,
            ScalarKind::Int16 | ScalarKind::UInt16 | ScalarKind::Float16 => 2,
            ScalarKind::Bool | ScalarKind::Int32 | ScalarKind::UInt32 | ScalarKind::Float32 => 4,
            ScalarKind::Int64 | ScalarKind::UInt64 | ScalarKind::Float64 => 8,
        }
    }
}

/// Shapes of resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceShape {
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
    TextureBuffer,
    StructuredBuffer,
    ByteAddressBuffer,
    AccelerationStructure,
}

impl ResourceShape {
    pub const ALL: [ResourceShape; 8] = [
        ResourceShape::Texture1D,
        ResourceShape::Texture2D,
        ResourceShape::Texture3D,
        ResourceShape::TextureCube,
        ResourceShape::TextureBuffer,
        ResourceShape::StructuredBuffer,
        ResourceShape::ByteAddressBuffer,
        ResourceShape::AccelerationStructure,
    ];
}

/// Kind of a reflected type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    None,
    Scalar(ScalarKind),
    Vector { scalar: ScalarKind, count: u32 },
    Matrix { scalar: ScalarKind, rows: u32, columns: u32 },
    Array { count: u32 },
    Struct,
    Resource(ResourceShape),
    SamplerState,
    ConstantBuffer,
    ParameterBlock,
    Pointer,
    GenericTypeParameter,
}

/// How a parameter is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterCategory {
    None,
    /// Plain bytes inside an enclosing buffer
    Uniform,
    /// Descriptor set slot (UBO, SSBO, texture, sampler)
    DescriptorTableSlot,
    PushConstantBuffer,
    VaryingInput,
    VaryingOutput,
}

/// Layout of a type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeLayout {
    pub kind: TypeKind,
    /// Struct name, when the compiler reports one
    pub name: Option<String>,
    /// Size in bytes of the uniform data
    pub size: u32,
    /// Element stride for arrays
    pub stride: u32,
    /// Fields of a struct
    pub fields: Vec<VariableLayout>,
    /// Element type of arrays, buffers and pointers
    pub element: Option<Box<TypeLayout>>,
}

impl TypeLayout {
    fn leaf(kind: TypeKind, size: u32) -> Self {
        Self {
            kind,
            name: None,
            size,
            stride: 0,
            fields: Vec::new(),
            element: None,
        }
    }

    pub fn scalar(scalar: ScalarKind) -> Self {
        Self::leaf(TypeKind::Scalar(scalar), scalar.size())
    }

    pub fn vector(scalar: ScalarKind, count: u32) -> Self {
        Self::leaf(TypeKind::Vector { scalar, count }, scalar.size() * count)
    }

    /// Column-major matrix: `columns` vectors of `rows` scalars
    pub fn matrix(scalar: ScalarKind, rows: u32, columns: u32) -> Self {
        Self::leaf(TypeKind::Matrix { scalar, rows, columns }, scalar.size() * rows * columns)
    }

    pub fn array(element: TypeLayout, count: u32, stride: u32) -> Self {
        Self {
            kind: TypeKind::Array { count },
            name: None,
            size: stride.saturating_mul(count),
            stride,
            fields: Vec::new(),
            element: Some(Box::new(element)),
        }
    }

    /// Struct whose size is the end of its last field
    pub fn structure(name: impl Into<String>, fields: Vec<VariableLayout>) -> Self {
        let size = fields.iter()
            .map(|f| f.offset.saturating_add(f.type_layout.size))
            .max()
            .unwrap_or(0);
        Self {
            kind: TypeKind::Struct,
            name: Some(name.into()),
            size,
            stride: 0,
            fields,
            element: None,
        }
    }

    pub fn resource(shape: ResourceShape) -> Self {
        Self::leaf(TypeKind::Resource(shape), 0)
    }

    pub fn sampler() -> Self {
        Self::leaf(TypeKind::SamplerState, 0)
    }

    /// Wrapper around `element`: constant buffer, parameter block,
    /// structured buffer or pointer
    pub fn wrapping(kind: TypeKind, element: TypeLayout) -> Self {
        Self {
            kind,
            name: None,
            size: element.size,
            stride: 0,
            fields: Vec::new(),
            element: Some(Box::new(element)),
        }
    }

    /// Whether field lookups should go through `element`
    fn is_wrapper(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::ConstantBuffer
                | TypeKind::ParameterBlock
                | TypeKind::Pointer
                | TypeKind::Resource(ResourceShape::StructuredBuffer)
        )
    }

    /// Struct fields, looking through buffer and pointer wrappers
    pub fn fields(&self) -> &[VariableLayout] {
        match &self.element {
            Some(element) if self.is_wrapper() => element.fields(),
            _ => &self.fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&VariableLayout> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn element_type(&self) -> Option<&TypeLayout> {
        self.element.as_deref()
    }
}

/// Layout of a named variable (parameter or struct field)
#[derive(Debug, Clone, PartialEq)]
pub struct VariableLayout {
    pub name: String,
    pub type_layout: TypeLayout,
    /// Byte offset inside the enclosing type
    pub offset: u32,
    /// Binding index relative to the enclosing type
    pub binding_index: u32,
    /// Descriptor set / register space
    pub binding_space: u32,
    pub category: ParameterCategory,
}

impl VariableLayout {
    /// Uniform-category variable at `offset`
    pub fn new(name: impl Into<String>, type_layout: TypeLayout, offset: u32) -> Self {
        Self {
            name: name.into(),
            type_layout,
            offset,
            binding_index: 0,
            binding_space: 0,
            category: ParameterCategory::Uniform,
        }
    }

    /// Descriptor-bound variable at (`space`, `index`)
    pub fn descriptor(name: impl Into<String>, type_layout: TypeLayout, space: u32, index: u32) -> Self {
        Self {
            name: name.into(),
            type_layout,
            offset: 0,
            binding_index: index,
            binding_space: space,
            category: ParameterCategory::DescriptorTableSlot,
        }
    }

    pub fn push_constant(name: impl Into<String>, type_layout: TypeLayout) -> Self {
        Self {
            name: name.into(),
            type_layout,
            offset: 0,
            binding_index: 0,
            binding_space: 0,
            category: ParameterCategory::PushConstantBuffer,
        }
    }
}

/// Linked program layout
///
/// The top-level parameters are held as the fields of a root struct so a
/// cursor can start at the root like at any other type.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramLayout {
    root: TypeLayout,
}

impl ProgramLayout {
    pub fn new(parameters: Vec<VariableLayout>) -> Self {
        Self {
            root: TypeLayout::structure("GlobalParams", parameters),
        }
    }

    /// Layout with no parameters (reflection skipped)
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Top-level parameters, in declaration order
    pub fn parameters(&self) -> &[VariableLayout] {
        &self.root.fields
    }

    pub fn parameter(&self, name: &str) -> Option<&VariableLayout> {
        self.root.field(name)
    }

    pub fn root_type(&self) -> &TypeLayout {
        &self.root
    }

    /// Cursor at byte offset 0 of the root layout
    pub fn root_cursor(&self) -> ShaderCursor<'_> {
        ShaderCursor::new(&self.root)
    }
}

impl Default for ProgramLayout {
    fn default() -> Self {
        Self::empty()
    }
}
