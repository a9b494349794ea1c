/// Built-in scene components

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

use crate::ecs::Component;
use crate::resource::{MeshResource, ResourceRef, ScriptResource, ShaderResource};

pub use crate::renderer::PrimitiveShape;

// ===== BOOKKEEPING =====

/// Display name of an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);
impl Component for Name {}

/// Inactive entities and their subtrees are skipped by rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Active(pub bool);
impl Component for Active {}

impl Default for Active {
    fn default() -> Self {
        Active(true)
    }
}

// ===== TRANSFORM =====

/// Position, rotation and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformData {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl TransformData {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    /// Scale, then rotate, then translate
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Decompose an affine matrix
    ///
    /// Shear has no TRS form and is dropped. A matrix with a zero scale axis
    /// has no defined rotation and decomposes with `Quat::IDENTITY`.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        let rotation = if rotation.is_finite() { rotation } else { Quat::IDENTITY };
        Self { position, rotation, scale }
    }
}

/// Local transform (relative to the parent) and the world matrix the
/// transform system derives from it
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub local: TransformData,
    /// Parent world matrix times the local matrix, kept as a full matrix so
    /// shear from non-uniform parent scale survives
    pub world: Mat4,
}
impl Component for Transform {}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        let local = TransformData::from_position(position);
        Self { local, world: local.matrix() }
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    /// World transform as position, rotation and scale
    pub fn global(&self) -> TransformData {
        TransformData::from_matrix(&self.world)
    }
}

// ===== GEOMETRY & RENDERING =====

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryPrimitive {
    pub shape: PrimitiveShape,
}
impl Component for GeometryPrimitive {}

#[derive(Clone)]
pub struct GeometryGltf {
    pub mesh: ResourceRef<MeshResource>,
}
impl Component for GeometryGltf {}

#[derive(Clone)]
pub struct Renderable {
    pub shader: ResourceRef<ShaderResource>,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
}
impl Component for Renderable {}

impl Renderable {
    pub fn new(shader: ResourceRef<ShaderResource>) -> Self {
        Self {
            shader,
            cast_shadows: true,
            receive_shadows: true,
        }
    }
}

// ===== LIGHTS =====

/// Where a light's colour comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LightAppearance {
    #[default]
    Color,
    /// Black-body colour of `temperature` kelvin
    Temperature,
}

/// Linear RGB of a black body at `kelvin` (clamped to 1000..40000)
pub fn kelvin_to_rgb(kelvin: f32) -> Vec3 {
    let t = kelvin.clamp(1000.0, 40000.0) / 100.0;
    let red = if t <= 66.0 {
        255.0
    } else {
        329.698_73 * (t - 60.0).powf(-0.133_204_76)
    };
    let green = if t <= 66.0 {
        99.470_8 * t.ln() - 161.119_57
    } else {
        288.122_16 * (t - 60.0).powf(-0.075_514_85)
    };
    let blue = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.517_73 * (t - 10.0).ln() - 305.044_8
    };
    (Vec3::new(red, green, blue) / 255.0).clamp(Vec3::ZERO, Vec3::ONE)
}

const DEFAULT_TEMPERATURE: f32 = 6500.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuSpotLight {
    pub color: Vec3,
    pub intensity: f32,
    pub direction: Vec3,
    pub range: f32,
    /// Cosine of the inner cone half-angle
    pub inner_cutoff: f32,
    /// Cosine of the outer cone half-angle
    pub outer_cutoff: f32,
    pub _pad: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuDirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub direction: Vec3,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuAmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for GpuPointLight {
    fn default() -> Self {
        Self { color: Vec3::ONE, intensity: 1.0, range: 10.0, _pad: [0.0; 3] }
    }
}

impl Default for GpuSpotLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            direction: Vec3::NEG_Z,
            range: 10.0,
            inner_cutoff: 12.5f32.to_radians().cos(),
            outer_cutoff: 17.5f32.to_radians().cos(),
            _pad: [0.0; 2],
        }
    }
}

impl Default for GpuDirectionalLight {
    fn default() -> Self {
        Self { color: Vec3::ONE, intensity: 1.0, direction: Vec3::new(0.0, -1.0, 0.0), _pad: 0.0 }
    }
}

impl Default for GpuAmbientLight {
    fn default() -> Self {
        Self { color: Vec3::ONE, intensity: 0.1 }
    }
}

macro_rules! light_component {
    ($(#[$meta:meta])* $name:ident, $gpu:ty, unique = $unique:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            pub appearance: LightAppearance,
            /// Colour temperature in kelvin, used in `Temperature` mode
            pub temperature: f32,
            pub light: $gpu,
        }

        impl Component for $name {
            const UNIQUE: bool = $unique;
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    appearance: LightAppearance::Color,
                    temperature: DEFAULT_TEMPERATURE,
                    light: <$gpu>::default(),
                }
            }
        }

        impl $name {
            /// Colour after applying the appearance mode
            pub fn effective_color(&self) -> Vec3 {
                match self.appearance {
                    LightAppearance::Color => self.light.color,
                    LightAppearance::Temperature => kelvin_to_rgb(self.temperature),
                }
            }

            /// GPU block with the effective colour applied
            pub fn gpu_data(&self) -> $gpu {
                let mut light = self.light;
                light.color = self.effective_color();
                light
            }
        }
    };
}

light_component!(PointLight, GpuPointLight, unique = false);
light_component!(SpotLight, GpuSpotLight, unique = false);
light_component!(
    /// Only one per scene is used
    DirectionalLight, GpuDirectionalLight, unique = true
);
light_component!(
    /// Only one per scene is used
    AmbientLight, GpuAmbientLight, unique = true
);

// ===== MISC =====

#[derive(Clone)]
pub struct Script {
    pub script: ResourceRef<ScriptResource>,
}
impl Component for Script {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Audio {
    pub name: String,
}
impl Component for Audio {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collider;
impl Component for Collider {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Animation;
impl Component for Animation {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Network;
impl Component for Network {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_matrix_is_trs() {
        let data = TransformData {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        let point = data.matrix().transform_point3(Vec3::X);
        assert!((point - Vec3::new(1.0, 2.0, 1.0)).length() < 1e-5);
        let back = TransformData::from_matrix(&data.matrix());
        assert!((back.position - data.position).length() < 1e-5);
        assert!((back.scale - data.scale).length() < 1e-5);
    }

    #[test]
    fn test_gpu_light_sizes() {
        assert_eq!(std::mem::size_of::<GpuPointLight>(), 32);
        assert_eq!(std::mem::size_of::<GpuSpotLight>(), 48);
        assert_eq!(std::mem::size_of::<GpuDirectionalLight>(), 32);
        assert_eq!(std::mem::size_of::<GpuAmbientLight>(), 16);
    }

    #[test]
    fn test_effective_color_modes() {
        let mut light = PointLight::default();
        light.light.color = Vec3::new(0.2, 0.4, 0.6);
        assert_eq!(light.effective_color(), Vec3::new(0.2, 0.4, 0.6));

        light.appearance = LightAppearance::Temperature;
        light.temperature = 2000.0;
        let warm = light.effective_color();
        assert!(warm.x > warm.z);
        assert_eq!(light.gpu_data().color, warm);
    }

    #[test]
    fn test_kelvin_daylight_is_near_white() {
        let daylight = kelvin_to_rgb(6600.0);
        assert!(daylight.min_element() > 0.9);
        let cool = kelvin_to_rgb(12000.0);
        assert!(cool.z >= cool.x);
    }

    #[test]
    fn test_unique_lights() {
        assert!(DirectionalLight::UNIQUE);
        assert!(AmbientLight::UNIQUE);
        assert!(!PointLight::UNIQUE);
        assert!(!Transform::UNIQUE);
    }
}
