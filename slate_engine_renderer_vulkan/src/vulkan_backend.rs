/// VulkanBackend - Vulkan implementation of the RenderBackend trait
///
/// Owns the instance, device, allocator and upload command pool. Buffers and
/// shader modules are created here; device-local buffer writes go through a
/// one-shot `vkCmdUpdateBuffer` submission. Pass recording and presentation
/// are delegated to a `FrameRecorder`, which receives the frame's draw list.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use std::any::Any;
use std::ffi::CStr;
use std::mem::ManuallyDrop;
use std::ops::Range;
use std::sync::Arc;

use slate_engine::slate::render::{
    check_buffer_range, BufferDesc, DrawRequest, GpuBuffer, GpuShaderModule, RenderBackend,
};
use slate_engine::slate::{Error, Result};
use slate_engine::{engine_bail, engine_debug, engine_err, engine_error, engine_info, engine_warn};

use crate::debug::{DebugConfig, DebugMessageFilter, DebugSeverity};
use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_shader::VulkanShaderModule;

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Largest payload of a single `vkCmdUpdateBuffer`
pub const MAX_UPDATE_CHUNK: usize = 65536;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct VulkanConfig {
    /// Application name reported to the driver
    pub app_name: String,
    /// Enable the Khronos validation layer when it is installed
    pub enable_validation: bool,
    pub debug_severity: DebugSeverity,
    pub debug_message_filter: DebugMessageFilter,
    /// Count validation messages (see `debug::validation_stats`)
    pub enable_validation_stats: bool,
    /// Enable `bufferDeviceAddress` so buffers can report GPU addresses
    pub buffer_device_address: bool,
}

impl Default for VulkanConfig {
    fn default() -> Self {
        Self {
            app_name: "Slate".to_string(),
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_message_filter: DebugMessageFilter::default(),
            enable_validation_stats: true,
            buffer_device_address: true,
        }
    }
}

// ============================================================================
// Frame recorder
// ============================================================================

/// Outcome of presenting a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    Presented,
    /// The swapchain no longer matches the surface
    OutOfDate,
}

/// Records passes and presents; owned by the backend
pub trait FrameRecorder: Send {
    fn record_frame(&mut self, ctx: &GpuContext, draws: &[DrawRequest]) -> Result<PresentStatus>;

    /// Recreate size-dependent objects; the device is idle when called
    fn resize(&mut self, ctx: &GpuContext, width: u32, height: u32) -> Result<()>;
}

// ============================================================================
// Device update planning
// ============================================================================

/// Split an update of `len` bytes at `offset` into `vkCmdUpdateBuffer`-sized
/// pieces: (destination offset, source range)
pub(crate) fn update_chunks(offset: u64, len: usize) -> Vec<(u64, Range<usize>)> {
    (0..len).step_by(MAX_UPDATE_CHUNK)
        .map(|start| {
            let end = (start + MAX_UPDATE_CHUNK).min(len);
            (offset + start as u64, start..end)
        })
        .collect()
}

/// `vkCmdUpdateBuffer` needs 4-byte aligned offset and size
pub(crate) fn check_update_alignment(offset: u64, len: usize) -> Result<()> {
    if offset % 4 != 0 || len % 4 != 0 {
        engine_bail!(InvalidResource, "slate::Vulkan",
            "Device update of {} bytes at offset {} is not 4-byte aligned", len, offset);
    }
    Ok(())
}

// ============================================================================
// Backend
// ============================================================================

pub struct VulkanBackend {
    _entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    ctx: Arc<GpuContext>,
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    upload_fence: vk::Fence,
    recorder: Option<Box<dyn FrameRecorder>>,
    pending_draws: Vec<DrawRequest>,
    swapchain_dirty: bool,
    extent: (u32, u32),
    frames_rendered: u64,
}

impl VulkanBackend {
    /// Create a headless device on the best available GPU
    pub fn new(config: VulkanConfig) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| engine_err!(InitializationFailed, "slate::Vulkan",
                    "Failed to load Vulkan library: {:?}", e))?;

            let requested = config.enable_validation && cfg!(feature = "vulkan-validation");
            let validation = requested && Self::validation_layer_available(&entry);
            if requested && !validation {
                engine_warn!("slate::Vulkan", "Validation requested but {:?} is not installed", VALIDATION_LAYER);
            }

            let app_name = std::ffi::CString::new(config.app_name.clone())
                .map_err(|_| engine_err!(InitializationFailed, "slate::Vulkan",
                    "Application name '{}' contains a nul byte", config.app_name))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Slate")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let mut extension_names = Vec::new();
            let mut layer_names = Vec::new();
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                layer_names.push(VALIDATION_LAYER.as_ptr());
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None)
                .map_err(|e| engine_err!(InitializationFailed, "slate::Vulkan",
                    "Failed to create instance: {:?}", e))?;

            let debug_messenger = if validation {
                match Self::create_debug_messenger(&entry, &instance, &config) {
                    Ok(messenger) => Some(messenger),
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                }
            } else {
                None
            };

            let mut parts = DeviceParts::default();
            let device_result = Self::create_device(&instance, &config, &mut parts);
            let (physical_device, ctx, upload_fence) = match device_result {
                Ok(created) => created,
                Err(e) => {
                    parts.destroy();
                    if let Some((utils, messenger)) = &debug_messenger {
                        crate::debug::cleanup_debug_config();
                        utils.destroy_debug_utils_messenger(*messenger, None);
                    }
                    instance.destroy_instance(None);
                    return Err(e);
                }
            };

            engine_info!("slate::Vulkan", "Vulkan backend ready (validation: {}, device address: {})",
                validation, ctx.buffer_device_address);

            Ok(Self {
                _entry: entry,
                instance,
                physical_device,
                ctx: Arc::new(ctx),
                debug_messenger,
                upload_fence,
                recorder: None,
                pending_draws: Vec::new(),
                swapchain_dirty: false,
                extent: (0, 0),
                frames_rendered: 0,
            })
        }
    }

    fn validation_layer_available(entry: &ash::Entry) -> bool {
        let layers = unsafe { entry.enumerate_instance_layer_properties() }.unwrap_or_default();
        layers.iter().any(|layer| layer.layer_name_as_c_str().is_ok_and(|name| name == VALIDATION_LAYER))
    }

    unsafe fn create_debug_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
        config: &VulkanConfig,
    ) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
        let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);

        crate::debug::init_debug_config(DebugConfig {
            severity: config.debug_severity,
            message_filter: config.debug_message_filter,
            enable_stats: config.enable_validation_stats,
        });

        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(config.debug_severity.message_severity())
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

        let messenger = debug_utils.create_debug_utils_messenger(&debug_info, None)
            .map_err(|e| engine_err!(InitializationFailed, "slate::Vulkan",
                "Failed to create debug messenger: {:?}", e))?;
        Ok((debug_utils, messenger))
    }

    /// Pick a GPU with a graphics queue, preferring discrete GPUs
    unsafe fn pick_physical_device(instance: &ash::Instance) -> Result<(vk::PhysicalDevice, u32)> {
        let devices = instance.enumerate_physical_devices()
            .map_err(|e| engine_err!(InitializationFailed, "slate::Vulkan",
                "Failed to enumerate physical devices: {:?}", e))?;

        devices.into_iter()
            .filter_map(|device| {
                let family = instance.get_physical_device_queue_family_properties(device)
                    .iter()
                    .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))?;
                let properties = instance.get_physical_device_properties(device);
                let score = match properties.device_type {
                    vk::PhysicalDeviceType::DISCRETE_GPU => 3,
                    vk::PhysicalDeviceType::INTEGRATED_GPU => 2,
                    vk::PhysicalDeviceType::VIRTUAL_GPU => 1,
                    _ => 0,
                };
                Some((score, device, family as u32))
            })
            .max_by_key(|(score, _, _)| *score)
            .map(|(_, device, family)| (device, family))
            .ok_or_else(|| engine_err!(InitializationFailed, "slate::Vulkan",
                "No Vulkan GPU with a graphics queue found"))
    }

    unsafe fn create_device(
        instance: &ash::Instance,
        config: &VulkanConfig,
        parts: &mut DeviceParts,
    ) -> Result<(vk::PhysicalDevice, GpuContext, vk::Fence)> {
        let (physical_device, graphics_family) = Self::pick_physical_device(instance)?;

        let properties = instance.get_physical_device_properties(physical_device);
        if let Ok(name) = properties.device_name_as_c_str() {
            engine_debug!("slate::Vulkan", "Using GPU {:?}", name);
        }

        let mut supported_12 = vk::PhysicalDeviceVulkan12Features::default();
        let mut supported = vk::PhysicalDeviceFeatures2::default().push_next(&mut supported_12);
        instance.get_physical_device_features2(physical_device, &mut supported);
        let buffer_device_address = config.buffer_device_address && supported_12.buffer_device_address == vk::TRUE;
        if config.buffer_device_address && !buffer_device_address {
            engine_warn!("slate::Vulkan", "bufferDeviceAddress is not supported by this GPU");
        }

        let queue_priorities = [1.0];
        let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
            .queue_family_index(graphics_family)
            .queue_priorities(&queue_priorities)];

        let mut features_12 = vk::PhysicalDeviceVulkan12Features::default()
            .buffer_device_address(buffer_device_address);
        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .push_next(&mut features_12);

        let device = instance.create_device(physical_device, &device_create_info, None)
            .map_err(|e| engine_err!(InitializationFailed, "slate::Vulkan",
                "Failed to create device: {:?}", e))?;
        parts.device = Some(device.clone());

        let graphics_queue = device.get_device_queue(graphics_family, 0);

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| engine_err!(InitializationFailed, "slate::Vulkan",
            "Failed to create allocator: {:?}", e))?;

        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(graphics_family)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let upload_command_pool = device.create_command_pool(&pool_info, None)
            .map_err(|e| engine_err!(InitializationFailed, "slate::Vulkan",
                "Failed to create upload command pool: {:?}", e))?;
        parts.command_pool = upload_command_pool;

        let upload_fence = device.create_fence(&vk::FenceCreateInfo::default(), None)
            .map_err(|e| engine_err!(InitializationFailed, "slate::Vulkan",
                "Failed to create upload fence: {:?}", e))?;

        *parts = DeviceParts::default();
        let ctx = GpuContext::new(
            device,
            allocator,
            graphics_queue,
            graphics_family,
            upload_command_pool,
            buffer_device_address,
        );
        Ok((physical_device, ctx, upload_fence))
    }

    /// Hand pass recording and presentation to `recorder`
    pub fn set_frame_recorder(&mut self, recorder: Box<dyn FrameRecorder>) {
        self.recorder = Some(recorder);
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx.device.device_wait_idle()
                .map_err(|e| engine_err!("slate::Vulkan", "Failed to wait idle: {:?}", e))
        }
    }

    /// Record, submit and wait for a one-shot command buffer
    fn submit_one_shot(&self, record: impl FnOnce(vk::CommandBuffer)) -> Result<()> {
        let device = &self.ctx.device;
        let pool = self.ctx.upload_command_pool.lock()
            .map_err(|_| Error::BackendError("Upload command pool lock poisoned".to_string()))?;

        unsafe {
            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffers = device.allocate_command_buffers(&alloc_info)
                .map_err(|e| engine_err!("slate::Vulkan", "Failed to allocate upload command buffer: {:?}", e))?;
            let cmd = command_buffers[0];

            let result = (|| {
                let begin_info = vk::CommandBufferBeginInfo::default()
                    .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
                device.begin_command_buffer(cmd, &begin_info)
                    .map_err(|e| engine_err!("slate::Vulkan", "Failed to begin upload command buffer: {:?}", e))?;
                record(cmd);
                device.end_command_buffer(cmd)
                    .map_err(|e| engine_err!("slate::Vulkan", "Failed to end upload command buffer: {:?}", e))?;

                device.reset_fences(&[self.upload_fence])
                    .map_err(|e| engine_err!("slate::Vulkan", "Failed to reset upload fence: {:?}", e))?;
                let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
                device.queue_submit(self.ctx.graphics_queue, &[submit_info], self.upload_fence)
                    .map_err(|e| engine_err!("slate::Vulkan", "Failed to submit upload: {:?}", e))?;
                device.wait_for_fences(&[self.upload_fence], true, u64::MAX)
                    .map_err(|e| engine_err!("slate::Vulkan", "Failed to wait for upload: {:?}", e))
            })();

            device.free_command_buffers(*pool, &command_buffers);
            result
        }
    }
}

/// Objects created during device setup, released if setup fails midway
#[derive(Default)]
struct DeviceParts {
    device: Option<ash::Device>,
    command_pool: vk::CommandPool,
}

impl DeviceParts {
    unsafe fn destroy(&mut self) {
        if let Some(device) = self.device.take() {
            if self.command_pool != vk::CommandPool::null() {
                device.destroy_command_pool(self.command_pool, None);
            }
            device.destroy_device(None);
        }
    }
}

impl RenderBackend for VulkanBackend {
    fn create_shader_module(&mut self, code: &[u8]) -> Result<Arc<dyn GpuShaderModule>> {
        Ok(Arc::new(VulkanShaderModule::create(&self.ctx, code)?))
    }

    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn GpuBuffer>> {
        Ok(Arc::new(VulkanBuffer::create(&self.ctx, desc)?))
    }

    fn update_buffer(&mut self, buffer: &dyn GpuBuffer, offset: u64, data: &[u8]) -> Result<()> {
        let Some(vk_buffer) = buffer.as_any().downcast_ref::<VulkanBuffer>() else {
            engine_bail!("slate::Vulkan", "Buffer was not created by the Vulkan backend");
        };
        check_buffer_range(buffer.size(), offset, data.len())?;
        check_update_alignment(offset, data.len())?;
        if data.is_empty() {
            return Ok(());
        }

        let chunks = update_chunks(offset, data.len());
        let device = &self.ctx.device;
        self.submit_one_shot(|cmd| unsafe {
            for (dst_offset, range) in chunks {
                device.cmd_update_buffer(cmd, vk_buffer.buffer, dst_offset, &data[range]);
            }
        })
    }

    fn submit_draw(&mut self, draw: DrawRequest) -> Result<()> {
        self.pending_draws.push(draw);
        Ok(())
    }

    fn render_frame(&mut self) -> Result<()> {
        let draws = std::mem::take(&mut self.pending_draws);
        if let Some(recorder) = self.recorder.as_mut() {
            match recorder.record_frame(&self.ctx, &draws)? {
                PresentStatus::Presented => {}
                PresentStatus::OutOfDate => {
                    engine_debug!("slate::Vulkan", "Swapchain out of date");
                    self.swapchain_dirty = true;
                }
            }
        }
        self.frames_rendered += 1;
        Ok(())
    }

    fn swapchain_dirty(&self) -> bool {
        self.swapchain_dirty
    }

    fn resize_swapchain(&mut self, width: u32, height: u32) -> Result<()> {
        self.wait_idle()?;
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.resize(&self.ctx, width, height)?;
        }
        self.extent = (width, height);
        self.swapchain_dirty = false;
        engine_debug!("slate::Vulkan", "Swapchain resized to {}x{}", width, height);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();

            // Recorder objects are created on this device
            self.recorder = None;
            self.pending_draws.clear();

            let Some(ctx) = Arc::get_mut(&mut self.ctx) else {
                engine_error!("slate::Vulkan",
                    "GPU objects outlive the Vulkan backend; leaking the device");
                return;
            };

            ctx.device.destroy_fence(self.upload_fence, None);
            if let Ok(pool) = ctx.upload_command_pool.get_mut() {
                ctx.device.destroy_command_pool(*pool, None);
                *pool = vk::CommandPool::null();
            }

            // Allocator memory is freed before the device goes away
            ManuallyDrop::drop(&mut ctx.allocator);

            crate::debug::cleanup_debug_config();
            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            ctx.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_backend_tests.rs"]
mod tests;
