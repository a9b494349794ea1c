/// Engine-native shader type tags

use std::fmt;

use crate::shader::{ResourceShape, ScalarKind, TypeKind};

/// Closed set of types the engine understands in shader interfaces
///
/// `Unknown` is a valid value: anything the engine has no tag for maps to
/// it instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    Boolean,
    Int,
    UInt,
    Short,
    Float,
    Double,
    Texture2D,
    Texture3D,
    TextureCube,
    Sampler,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Struct,
    Pointer,
    Unknown,
}

impl ShaderType {
    /// Map a reflected type kind; total over every kind
    ///
    /// Sampler states map to `Sampler`, and constant buffers and parameter
    /// blocks map to `Struct` so that their members can be walked. See
    /// [`from_scalar`](Self::from_scalar) for scalar widths.
    pub fn from_type_kind(kind: &TypeKind) -> Self {
        match *kind {
            TypeKind::Scalar(scalar) => Self::from_scalar(scalar),
            TypeKind::Vector { count, .. } => match count {
                2 => ShaderType::Vec2,
                3 => ShaderType::Vec3,
                4 => ShaderType::Vec4,
                _ => ShaderType::Unknown,
            },
            TypeKind::Matrix { columns, .. } => match columns {
                2 => ShaderType::Mat2,
                3 => ShaderType::Mat3,
                4 => ShaderType::Mat4,
                _ => ShaderType::Unknown,
            },
            TypeKind::Resource(shape) => match shape {
                ResourceShape::Texture2D => ShaderType::Texture2D,
                ResourceShape::Texture3D => ShaderType::Texture3D,
                ResourceShape::TextureCube => ShaderType::TextureCube,
                _ => ShaderType::Unknown,
            },
            TypeKind::SamplerState => ShaderType::Sampler,
            TypeKind::Struct | TypeKind::ConstantBuffer | TypeKind::ParameterBlock => ShaderType::Struct,
            TypeKind::Pointer => ShaderType::Pointer,
            TypeKind::None
            | TypeKind::Array { .. }
            | TypeKind::GenericTypeParameter => ShaderType::Unknown,
        }
    }

    /// Scalar kind to shader type
    ///
    /// 16-bit integers of either sign are `Short` and 64-bit floats are
    /// `Double`; no width is folded into a neighbouring variant.
    pub fn from_scalar(scalar: ScalarKind) -> Self {
        match scalar {
            ScalarKind::Bool => ShaderType::Boolean,
            ScalarKind::Int16 | ScalarKind::UInt16 => ShaderType::Short,
            ScalarKind::Int8 | ScalarKind::Int32 | ScalarKind::Int64 => ShaderType::Int,
            ScalarKind::UInt8 | ScalarKind::UInt32 | ScalarKind::UInt64 => ShaderType::UInt,
            ScalarKind::Float16 | ScalarKind::Float32 => ShaderType::Float,
            ScalarKind::Float64 => ShaderType::Double,
            ScalarKind::Void => ShaderType::Unknown,
        }
    }

    /// Display name ("Bool", "Vec3", ...)
    pub fn name(self) -> &'static str {
        match self {
            ShaderType::Boolean => "Bool",
            ShaderType::Int => "Int",
            ShaderType::UInt => "UInt",
            ShaderType::Short => "Short",
            ShaderType::Float => "Float",
            ShaderType::Double => "Double",
            ShaderType::Texture2D => "Texture2D",
            ShaderType::Texture3D => "Texture3D",
            ShaderType::TextureCube => "TextureCube",
            ShaderType::Sampler => "Sampler",
            ShaderType::Vec2 => "Vec2",
            ShaderType::Vec3 => "Vec3",
            ShaderType::Vec4 => "Vec4",
            ShaderType::Mat2 => "Mat2",
            ShaderType::Mat3 => "Mat3",
            ShaderType::Mat4 => "Mat4",
            ShaderType::Struct => "Struct",
            ShaderType::Pointer => "Pointer",
            ShaderType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ShaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
