//! Tests for VulkanBackend on a real device
//!
//! All tests require a GPU and are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_backend_tests -- --ignored

use std::sync::{Arc, Mutex};

use slate_engine::glam::Mat4;
use slate_engine::slate::ecs::Registry;
use slate_engine::slate::render::{
    BufferDesc, BufferUsage, DrawGeometry, DrawRequest, PrimitiveShape, RenderBackend,
};
use slate_engine::slate::shader::{
    GpuBufferTarget, ProgramLayout, ScalarKind, TypeLayout, VariableLayout,
};
use slate_engine::slate::{Error, Result};
use slate_engine_renderer_vulkan::slate::{
    FrameRecorder, GpuContext, PresentStatus, VulkanBackend, VulkanBuffer, VulkanConfig, MAX_UPDATE_CHUNK,
};

fn create_backend() -> VulkanBackend {
    VulkanBackend::new(VulkanConfig {
        enable_validation: true,
        ..VulkanConfig::default()
    })
    .unwrap()
}

fn buffer_desc(name: &str, size: u64, host_visible: bool) -> BufferDesc {
    BufferDesc {
        name: name.to_string(),
        size,
        usage: BufferUsage::UNIFORM,
        host_visible,
    }
}

/// Empty compute shader (`void main() {}`), SPIR-V 1.0
fn empty_compute_spirv() -> Vec<u8> {
    let words: Vec<u32> = vec![
        0x0723_0203, 0x0001_0000, 0, 5, 0,
        0x0002_0011, 1,                         // OpCapability Shader
        0x0003_000e, 0, 1,                      // OpMemoryModel Logical GLSL450
        0x0005_000f, 5, 4, 0x6e69_616d, 0,      // OpEntryPoint GLCompute %4 "main"
        0x0006_0010, 4, 17, 1, 1, 1,            // OpExecutionMode %4 LocalSize 1 1 1
        0x0002_0013, 1,                         // %1 = OpTypeVoid
        0x0003_0021, 2, 1,                      // %2 = OpTypeFunction %1
        0x0005_0036, 1, 4, 0, 2,                // %4 = OpFunction %1 None %2
        0x0002_00f8, 3,                         // %3 = OpLabel
        0x0001_00fd,                            // OpReturn
        0x0001_0038,                            // OpFunctionEnd
    ];
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn primitive_draw(shape: PrimitiveShape) -> DrawRequest {
    let mut registry = Registry::new();
    DrawRequest {
        entity: registry.create(),
        world: Mat4::IDENTITY,
        geometry: DrawGeometry::Primitive(shape),
        shader: None,
    }
}

/// Recorder remembering what it was handed
#[derive(Default)]
struct CapturingRecorder {
    frames: Arc<Mutex<Vec<usize>>>,
    resizes: Arc<Mutex<Vec<(u32, u32)>>>,
    report_out_of_date: bool,
}

impl FrameRecorder for CapturingRecorder {
    fn record_frame(&mut self, _ctx: &GpuContext, draws: &[DrawRequest]) -> Result<PresentStatus> {
        self.frames.lock().unwrap().push(draws.len());
        if self.report_out_of_date {
            Ok(PresentStatus::OutOfDate)
        } else {
            Ok(PresentStatus::Presented)
        }
    }

    fn resize(&mut self, _ctx: &GpuContext, width: u32, height: u32) -> Result<()> {
        self.resizes.lock().unwrap().push((width, height));
        Ok(())
    }
}

// ============================================================================
// BUFFER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_host_visible_buffer_update() {
    let mut backend = create_backend();
    let buffer = backend.create_buffer(buffer_desc("constants", 256, true)).unwrap();

    assert!(buffer.is_host_visible());
    assert_eq!(buffer.size(), 256);
    buffer.update(16, &[1, 2, 3, 4]).unwrap();
    assert!(buffer.update(254, &[0; 4]).is_err());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_device_local_buffer_needs_device_update() {
    let mut backend = create_backend();
    let buffer = backend.create_buffer(buffer_desc("device", 256, false)).unwrap();

    assert!(!buffer.is_host_visible());
    assert!(matches!(buffer.update(0, &[0; 4]), Err(Error::InvalidState(_))));
    backend.update_buffer(buffer.as_ref(), 0, &[7; 64]).unwrap();
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_device_update_larger_than_one_chunk() {
    let mut backend = create_backend();
    let size = (MAX_UPDATE_CHUNK * 2 + 256) as u64;
    let buffer = backend.create_buffer(buffer_desc("large", size, false)).unwrap();

    let data = vec![0xab; size as usize];
    backend.update_buffer(buffer.as_ref(), 0, &data).unwrap();
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_device_update_rejects_unaligned_writes() {
    let mut backend = create_backend();
    let buffer = backend.create_buffer(buffer_desc("device", 64, false)).unwrap();

    assert!(matches!(backend.update_buffer(buffer.as_ref(), 2, &[0; 4]), Err(Error::InvalidResource(_))));
    assert!(matches!(backend.update_buffer(buffer.as_ref(), 60, &[0; 8]), Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_buffer_device_address() {
    let mut backend = create_backend();
    let desc = BufferDesc {
        usage: BufferUsage::STORAGE | BufferUsage::DEVICE_ADDRESS,
        ..buffer_desc("addressed", 1024, false)
    };
    let buffer = backend.create_buffer(desc).unwrap();

    assert!(buffer.device_address().is_some_and(|address| address != 0));
    let vk_buffer = buffer.as_any().downcast_ref::<VulkanBuffer>().unwrap();
    assert_eq!(vk_buffer.name(), "addressed");
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_cursor_writes_device_local_buffer() {
    let mut backend = create_backend();
    let buffer = backend.create_buffer(buffer_desc("camera", 64, false)).unwrap();

    let program = ProgramLayout::new(vec![VariableLayout::new(
        "exposure",
        TypeLayout::scalar(ScalarKind::Float32),
        16,
    )]);
    let cursor = program.root_cursor().field("exposure").unwrap();
    let mut target = GpuBufferTarget { buffer: buffer.as_ref(), backend: &mut backend };
    cursor.write_value(&mut target, &1.5f32).unwrap();
}

// ============================================================================
// SHADER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_create_shader_module() {
    let mut backend = create_backend();
    let code = empty_compute_spirv();
    let module = backend.create_shader_module(&code).unwrap();
    assert_eq!(module.code_size(), code.len());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_create_shader_module_rejects_bad_code() {
    let mut backend = create_backend();
    assert!(backend.create_shader_module(&[1, 2, 3]).is_err());
    assert!(backend.create_shader_module(&[0; 8]).is_err());
}

// ============================================================================
// FRAME TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_frame_hands_draws_to_recorder() {
    let mut backend = create_backend();
    let recorder = CapturingRecorder::default();
    let frames = Arc::clone(&recorder.frames);
    backend.set_frame_recorder(Box::new(recorder));

    backend.submit_draw(primitive_draw(PrimitiveShape::Cube)).unwrap();
    backend.submit_draw(primitive_draw(PrimitiveShape::Sphere)).unwrap();
    backend.render_frame().unwrap();
    backend.render_frame().unwrap();

    assert_eq!(*frames.lock().unwrap(), vec![2, 0]);
    assert_eq!(backend.frames_rendered(), 2);
    assert!(!backend.swapchain_dirty());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_out_of_date_marks_swapchain_dirty_until_resize() {
    let mut backend = create_backend();
    let recorder = CapturingRecorder {
        report_out_of_date: true,
        ..CapturingRecorder::default()
    };
    let resizes = Arc::clone(&recorder.resizes);
    backend.set_frame_recorder(Box::new(recorder));

    backend.render_frame().unwrap();
    assert!(backend.swapchain_dirty());

    backend.resize_swapchain(1280, 720).unwrap();
    assert!(!backend.swapchain_dirty());
    assert_eq!(backend.extent(), (1280, 720));
    assert_eq!(*resizes.lock().unwrap(), vec![(1280, 720)]);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_headless_frame_without_recorder() {
    let mut backend = create_backend();
    backend.submit_draw(primitive_draw(PrimitiveShape::Quad)).unwrap();
    backend.render_frame().unwrap();
    assert_eq!(backend.frames_rendered(), 1);
}
