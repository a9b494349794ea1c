//! Scene - entities, built-in components and the systems that drive them

mod components;
mod scene;

pub use components::{
    kelvin_to_rgb, Active, AmbientLight, Animation, Audio, Collider, DirectionalLight, GeometryGltf,
    GeometryPrimitive, GpuAmbientLight, GpuDirectionalLight, GpuPointLight, GpuSpotLight,
    LightAppearance, Name, Network, PointLight, PrimitiveShape, Renderable, Script, SpotLight,
    Transform, TransformData,
};
pub use scene::{next_duplicate_name, Scene, DEFAULT_ENTITY_NAME};
