/// Shader reflection - engine-side description of a program's interface
///
/// Built once per compilation from a `ProgramLayout`: a Uniform tree for
/// every top-level parameter plus binding tables grouped by kind.

use crate::shader::{ParameterCategory, ProgramLayout, ResourceShape, ShaderType, TypeKind, VariableLayout};

/// One reflected variable with its nested members
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    pub name: String,
    pub ty: ShaderType,
    /// Size in bytes
    pub size: u32,
    /// Byte offset inside the enclosing type
    pub offset: u32,
    pub members: Vec<Uniform>,
}

impl Uniform {
    /// Walk a variable layout recursively
    pub fn from_variable(variable: &VariableLayout) -> Self {
        let layout = &variable.type_layout;
        Self {
            name: variable.name.clone(),
            ty: ShaderType::from_type_kind(&layout.kind),
            size: layout.size,
            offset: variable.offset,
            members: layout.fields().iter().map(Uniform::from_variable).collect(),
        }
    }

    /// Nested member by dotted path ("light.color")
    pub fn member(&self, path: &str) -> Option<&Uniform> {
        path.split('.').try_fold(self, |current, name| {
            current.members.iter().find(|m| m.name == name)
        })
    }
}

/// Binding table a parameter belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    PushConstant,
    UniformBuffer,
    StorageBuffer,
    Texture,
    Sampler,
    Other,
}

impl BindingKind {
    /// Binding table of a top-level parameter; `None` for loose uniforms
    pub fn classify(parameter: &VariableLayout) -> Option<Self> {
        match parameter.category {
            ParameterCategory::PushConstantBuffer => Some(BindingKind::PushConstant),
            ParameterCategory::DescriptorTableSlot => Some(match parameter.type_layout.kind {
                TypeKind::ConstantBuffer | TypeKind::ParameterBlock => BindingKind::UniformBuffer,
                TypeKind::Resource(ResourceShape::StructuredBuffer)
                | TypeKind::Resource(ResourceShape::ByteAddressBuffer) => BindingKind::StorageBuffer,
                TypeKind::Resource(_) => BindingKind::Texture,
                TypeKind::SamplerState => BindingKind::Sampler,
                _ => BindingKind::Other,
            }),
            _ => None,
        }
    }
}

/// Descriptor or push-constant binding
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderBinding {
    pub name: String,
    pub kind: BindingKind,
    /// Descriptor set
    pub set: u32,
    pub binding: u32,
    /// Size in bytes of the bound data
    pub size: u32,
    pub layout: Uniform,
}

/// Reflection of one compiled program
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderReflection {
    /// Every top-level parameter, in declaration order
    pub uniforms: Vec<Uniform>,
    pub push_constants: Vec<ShaderBinding>,
    pub uniform_buffers: Vec<ShaderBinding>,
    pub storage_buffers: Vec<ShaderBinding>,
    pub textures: Vec<ShaderBinding>,
    pub samplers: Vec<ShaderBinding>,
    /// Descriptor parameters of kinds with no table of their own
    pub other_bindings: Vec<ShaderBinding>,
}

impl ShaderReflection {
    pub fn from_program(program: &ProgramLayout) -> Self {
        let mut reflection = ShaderReflection::default();

        for parameter in program.parameters() {
            let uniform = Uniform::from_variable(parameter);
            crate::engine_trace!("slate::ShaderReflection",
                "Parameter '{}': {} ({} bytes at offset {}, {:?})",
                uniform.name, uniform.ty, uniform.size, uniform.offset, parameter.category);

            if let Some(kind) = BindingKind::classify(parameter) {
                let binding = ShaderBinding {
                    name: parameter.name.clone(),
                    kind,
                    set: parameter.binding_space,
                    binding: parameter.binding_index,
                    size: parameter.type_layout.size,
                    layout: uniform.clone(),
                };
                let table = match kind {
                    BindingKind::PushConstant => &mut reflection.push_constants,
                    BindingKind::UniformBuffer => &mut reflection.uniform_buffers,
                    BindingKind::StorageBuffer => &mut reflection.storage_buffers,
                    BindingKind::Texture => &mut reflection.textures,
                    BindingKind::Sampler => &mut reflection.samplers,
                    BindingKind::Other => &mut reflection.other_bindings,
                };
                table.push(binding);
            }

            reflection.uniforms.push(uniform);
        }

        reflection
    }

    /// Uniform by name, or nested member by dotted path
    pub fn uniform(&self, path: &str) -> Option<&Uniform> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let root = self.uniforms.iter().find(|u| u.name == head)?;
        match rest {
            Some(rest) => root.member(rest),
            None => Some(root),
        }
    }

    /// Binding by parameter name, across all tables
    pub fn binding(&self, name: &str) -> Option<&ShaderBinding> {
        self.all_bindings().find(|b| b.name == name)
    }

    pub fn all_bindings(&self) -> impl Iterator<Item = &ShaderBinding> {
        self.push_constants.iter()
            .chain(&self.uniform_buffers)
            .chain(&self.storage_buffers)
            .chain(&self.textures)
            .chain(&self.samplers)
            .chain(&self.other_bindings)
    }

    /// Bytes of push-constant range the program needs
    pub fn push_constant_size(&self) -> u32 {
        self.push_constants.iter()
            .map(|b| b.layout.offset.saturating_add(b.size))
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }
}
