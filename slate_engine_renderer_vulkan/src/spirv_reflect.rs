/// SPIR-V reflection into the engine's program layout
///
/// Descriptor and push-constant variables of every entry point become
/// top-level parameters. A variable shared by several entry points is kept
/// once.

use spirq::ty::{DescriptorType, ScalarType, Type};
use spirq::var::Variable;

use slate_engine::engine_err;
use slate_engine::slate::shader::{
    ParameterCategory, ProgramLayout, ResourceShape, ScalarKind, TypeKind, TypeLayout, VariableLayout,
};
use slate_engine::slate::Result;

/// First word of every SPIR-V module
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Words in a SPIR-V module header
const SPIRV_HEADER_WORDS: usize = 5;

pub fn reflect_spirv(words: &[u32]) -> Result<ProgramLayout> {
    if words.len() < SPIRV_HEADER_WORDS {
        return Err(engine_err!(InvalidResource, "slate::SpirvReflect",
            "SPIR-V module has {} words, shorter than its {}-word header", words.len(), SPIRV_HEADER_WORDS));
    }
    if words[0] != SPIRV_MAGIC {
        return Err(engine_err!(InvalidResource, "slate::SpirvReflect",
            "Bad SPIR-V magic number {:#010x}", words[0]));
    }

    let entry_points = spirq::ReflectConfig::new()
        .spv(words)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| engine_err!("slate::SpirvReflect", "SPIR-V reflection failed: {:?}", e))?;

    let mut parameters: Vec<VariableLayout> = Vec::new();
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            let parameter = match var {
                Variable::Descriptor { name, desc_bind, desc_ty, ty, .. } => {
                    let name = name.clone()
                        .unwrap_or_else(|| format!("set{}_binding{}", desc_bind.set(), desc_bind.bind()));
                    let layout = descriptor_layout(desc_ty, ty, &name);
                    VariableLayout::descriptor(name, layout, desc_bind.set(), desc_bind.bind())
                }
                Variable::PushConstant { name, ty } => {
                    let name = name.clone().unwrap_or_else(|| "PushConstants".to_string());
                    let layout = type_layout(ty, &name);
                    VariableLayout::push_constant(name, layout)
                }
                _ => continue,
            };
            if !parameters.iter().any(|existing| same_parameter(existing, &parameter)) {
                parameters.push(parameter);
            }
        }
    }

    Ok(ProgramLayout::new(parameters))
}

fn same_parameter(a: &VariableLayout, b: &VariableLayout) -> bool {
    if a.category != b.category {
        return false;
    }
    match a.category {
        ParameterCategory::DescriptorTableSlot => {
            a.binding_space == b.binding_space && a.binding_index == b.binding_index
        }
        _ => a.name == b.name,
    }
}

/// Layout of a descriptor-bound variable
fn descriptor_layout(desc_ty: &DescriptorType, ty: &Type, name: &str) -> TypeLayout {
    match desc_ty {
        DescriptorType::UniformBuffer() => {
            TypeLayout::wrapping(TypeKind::ConstantBuffer, type_layout(ty, name))
        }
        DescriptorType::StorageBuffer(..) => {
            TypeLayout::wrapping(TypeKind::Resource(ResourceShape::StructuredBuffer), type_layout(ty, name))
        }
        DescriptorType::CombinedImageSampler()
        | DescriptorType::SampledImage()
        | DescriptorType::StorageImage(..) => TypeLayout::resource(ResourceShape::Texture2D),
        DescriptorType::UniformTexelBuffer() | DescriptorType::StorageTexelBuffer(..) => {
            TypeLayout::resource(ResourceShape::TextureBuffer)
        }
        DescriptorType::AccelStruct() => TypeLayout::resource(ResourceShape::AccelerationStructure),
        DescriptorType::Sampler() => TypeLayout::sampler(),
        _ => opaque_layout(ty),
    }
}

/// Layout of a data type; `name` names anonymous structs
pub(crate) fn type_layout(ty: &Type, name: &str) -> TypeLayout {
    let mut layout = match ty {
        Type::Scalar(scalar) => TypeLayout::scalar(scalar_kind(scalar)),
        Type::Vector(vector) => {
            TypeLayout::vector(scalar_kind(&vector.scalar_ty), vector.nscalar as u32)
        }
        // Column-major: `nvector` columns of `nscalar` rows
        Type::Matrix(matrix) => TypeLayout::matrix(
            scalar_kind(&matrix.vector_ty.scalar_ty),
            matrix.vector_ty.nscalar as u32,
            matrix.nvector as u32,
        ),
        Type::Array(array) => {
            let element = type_layout(&array.element_ty, name);
            let stride = array.stride.map(|s| s as u32).unwrap_or(element.size);
            let count = array.nelement.map(|n| n as u32).unwrap_or(0);
            TypeLayout::array(element, count, stride)
        }
        Type::Struct(structure) => {
            let fields = structure.members.iter()
                .enumerate()
                .map(|(index, member)| {
                    let field_name = member.name.clone().unwrap_or_else(|| format!("field{}", index));
                    let offset = member.offset.unwrap_or(0) as u32;
                    VariableLayout::new(field_name.clone(), type_layout(&member.ty, &field_name), offset)
                })
                .collect();
            TypeLayout::structure(name, fields)
        }
        _ => opaque_layout(ty),
    };
    if let Some(size) = ty.nbyte() {
        layout.size = size as u32;
    }
    layout
}

/// Layout for types with no engine counterpart
fn opaque_layout(ty: &Type) -> TypeLayout {
    TypeLayout {
        kind: TypeKind::None,
        name: None,
        size: ty.nbyte().unwrap_or(0) as u32,
        stride: 0,
        fields: Vec::new(),
        element: None,
    }
}

pub(crate) fn scalar_kind(scalar: &ScalarType) -> ScalarKind {
    match *scalar {
        ScalarType::Void => ScalarKind::Void,
        ScalarType::Boolean => ScalarKind::Bool,
        ScalarType::Integer { bits, is_signed: true } => match bits {
            8 => ScalarKind::Int8,
            16 => ScalarKind::Int16,
            64 => ScalarKind::Int64,
            _ => ScalarKind::Int32,
        },
        ScalarType::Integer { bits, is_signed: false } => match bits {
            8 => ScalarKind::UInt8,
            16 => ScalarKind::UInt16,
            64 => ScalarKind::UInt64,
            _ => ScalarKind::UInt32,
        },
        ScalarType::Float { bits } => match bits {
            16 => ScalarKind::Float16,
            64 => ScalarKind::Float64,
            _ => ScalarKind::Float32,
        },
    }
}

#[cfg(test)]
#[path = "spirv_reflect_tests.rs"]
mod tests;
