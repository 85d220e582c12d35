/// VulkanDevice - Vulkan implementation of the RenderDevice trait
///
/// Core handles are the raw Vulkan handles (`Handle::as_raw`), so the
/// conversions below are free and no handle registry exists. All methods
/// take `&self`; Vulkan requires external synchronization for pool
/// allocation, which the single-submission-thread contract of the core
/// provides.

use nova_rt_engine::novart::{Error, Result};
use nova_rt_engine::novart::device::{
    RenderDevice,
    ImageHandle, ImageViewHandle,
    DescriptorSetLayoutHandle, DescriptorPoolHandle, DescriptorSetHandle,
    ImageDesc, DescriptorSetLayoutDesc, StorageImageWrite,
    ImageFormat, ImageLayout, ImageUsageFlags, AccessFlags, ShaderStageFlags,
    MemoryRequirements, MemoryBlock,
    CommandStream,
};
use nova_rt_engine::{engine_error, engine_err};
use ash::vk;
use ash::vk::Handle;

/// Vulkan render device implementation
pub struct VulkanDevice {
    /// Vulkan logical device
    device: ash::Device,

    /// Debug-utils device functions for object naming (validation builds only)
    #[cfg(feature = "vulkan-validation")]
    debug_utils: Option<ash::ext::debug_utils::Device>,
}

impl VulkanDevice {
    /// Wrap a logical device
    ///
    /// The caller retains ownership of device destruction; this wrapper only
    /// creates and destroys the resources requested through the trait.
    pub fn new(device: ash::Device) -> Self {
        Self {
            device,
            #[cfg(feature = "vulkan-validation")]
            debug_utils: None,
        }
    }

    /// Enable object naming through VK_EXT_debug_utils
    #[cfg(feature = "vulkan-validation")]
    pub fn with_debug_utils(mut self, debug_utils: ash::ext::debug_utils::Device) -> Self {
        self.debug_utils = Some(debug_utils);
        self
    }

    #[cfg(feature = "vulkan-validation")]
    fn set_object_name<T: Handle + Copy>(&self, handle: T, name: &str) {
        let Some(debug_utils) = &self.debug_utils else {
            return;
        };
        let Ok(name) = std::ffi::CString::new(name) else {
            return;
        };
        let name_info = vk::DebugUtilsObjectNameInfoEXT::default()
            .object_handle(handle)
            .object_name(&name);
        unsafe {
            // Naming is best-effort; a failure never fails resource creation
            let _ = debug_utils.set_debug_utils_object_name(&name_info);
        }
    }

    #[cfg(not(feature = "vulkan-validation"))]
    fn set_object_name<T: Handle + Copy>(&self, _handle: T, _name: &str) {}
}

// ============================================================================
// Conversions
// ============================================================================

fn format_to_vk(format: ImageFormat) -> vk::Format {
    match format {
        ImageFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        ImageFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        ImageFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
    }
}

fn usage_to_vk(usage: ImageUsageFlags) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(ImageUsageFlags::STORAGE) {
        flags |= vk::ImageUsageFlags::STORAGE;
    }
    if usage.contains(ImageUsageFlags::TRANSFER_SRC) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    flags
}

fn layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::General => vk::ImageLayout::GENERAL,
    }
}

fn access_to_vk(access: AccessFlags) -> vk::AccessFlags {
    let mut flags = vk::AccessFlags::empty();
    if access.contains(AccessFlags::SHADER_READ) {
        flags |= vk::AccessFlags::SHADER_READ;
    }
    if access.contains(AccessFlags::SHADER_WRITE) {
        flags |= vk::AccessFlags::SHADER_WRITE;
    }
    flags
}

fn stages_to_vk(stages: ShaderStageFlags) -> vk::ShaderStageFlags {
    let mut flags = vk::ShaderStageFlags::empty();
    if stages.contains(ShaderStageFlags::COMPUTE) {
        flags |= vk::ShaderStageFlags::COMPUTE;
    }
    if stages.contains(ShaderStageFlags::RAYGEN) {
        flags |= vk::ShaderStageFlags::RAYGEN_KHR;
    }
    flags
}

/// Full-image color subresource range (single mip, single layer)
fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

// ============================================================================
// RenderDevice implementation
// ============================================================================

impl RenderDevice for VulkanDevice {
    fn create_image(&self, desc: &ImageDesc) -> Result<ImageHandle> {
        let create_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format_to_vk(desc.format))
            .extent(vk::Extent3D {
                width: desc.width,
                height: desc.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage_to_vk(desc.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe {
            self.device.create_image(&create_info, None).map_err(|e| {
                engine_error!("novart::vulkan",
                    "Failed to create {}x{} image: {:?}", desc.width, desc.height, e);
                Error::ResourceCreationFailed(format!("image: {:?}", e))
            })?
        };

        if let Some(name) = desc.debug_name {
            self.set_object_name(image, name);
        }

        Ok(ImageHandle(image.as_raw()))
    }

    fn image_memory_requirements(&self, image: ImageHandle) -> MemoryRequirements {
        let requirements = unsafe {
            self.device
                .get_image_memory_requirements(vk::Image::from_raw(image.0))
        };
        MemoryRequirements {
            size: requirements.size,
            alignment: requirements.alignment,
            memory_type_bits: requirements.memory_type_bits,
        }
    }

    fn bind_image_memory(&self, image: ImageHandle, memory: &MemoryBlock) -> Result<()> {
        unsafe {
            self.device
                .bind_image_memory(
                    vk::Image::from_raw(image.0),
                    vk::DeviceMemory::from_raw(memory.device_memory),
                    memory.offset,
                )
                .map_err(|e| engine_err!("novart::vulkan",
                    "Failed to bind image memory: {:?}", e))
        }
    }

    fn create_image_view(&self, image: ImageHandle, format: ImageFormat) -> Result<ImageViewHandle> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(vk::Image::from_raw(image.0))
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format_to_vk(format))
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(color_subresource_range());

        let view = unsafe {
            self.device.create_image_view(&create_info, None).map_err(|e| {
                engine_error!("novart::vulkan", "Failed to create image view: {:?}", e);
                Error::ResourceCreationFailed(format!("image view: {:?}", e))
            })?
        };

        Ok(ImageViewHandle(view.as_raw()))
    }

    fn destroy_image(&self, image: ImageHandle) {
        unsafe {
            self.device.destroy_image(vk::Image::from_raw(image.0), None);
        }
    }

    fn destroy_image_view(&self, view: ImageViewHandle) {
        unsafe {
            self.device
                .destroy_image_view(vk::ImageView::from_raw(view.0), None);
        }
    }

    fn create_descriptor_set_layout(
        &self,
        desc: &DescriptorSetLayoutDesc,
    ) -> Result<DescriptorSetLayoutHandle> {
        let bindings = [vk::DescriptorSetLayoutBinding::default()
            .binding(desc.binding)
            .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
            .descriptor_count(1)
            .stage_flags(stages_to_vk(desc.stages))];

        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);

        let layout = unsafe {
            self.device
                .create_descriptor_set_layout(&create_info, None)
                .map_err(|e| {
                    engine_error!("novart::vulkan",
                        "Failed to create descriptor set layout: {:?}", e);
                    Error::ResourceCreationFailed(format!("descriptor set layout: {:?}", e))
                })?
        };

        Ok(DescriptorSetLayoutHandle(layout.as_raw()))
    }

    fn create_descriptor_pool(&self, max_sets: u32) -> Result<DescriptorPoolHandle> {
        let pool_sizes = [vk::DescriptorPoolSize {
            ty: vk::DescriptorType::STORAGE_IMAGE,
            descriptor_count: max_sets,
        }];
        // No FREE_DESCRIPTOR_SET: sets live as long as the pool
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(max_sets);

        let pool = unsafe {
            self.device
                .create_descriptor_pool(&create_info, None)
                .map_err(|e| {
                    engine_error!("novart::vulkan",
                        "Failed to create descriptor pool ({} sets): {:?}", max_sets, e);
                    Error::ResourceCreationFailed(format!("descriptor pool: {:?}", e))
                })?
        };

        Ok(DescriptorPoolHandle(pool.as_raw()))
    }

    fn allocate_descriptor_set(
        &self,
        pool: DescriptorPoolHandle,
        layout: DescriptorSetLayoutHandle,
    ) -> Result<DescriptorSetHandle> {
        let layouts = [vk::DescriptorSetLayout::from_raw(layout.0)];
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(vk::DescriptorPool::from_raw(pool.0))
            .set_layouts(&layouts);

        let sets = unsafe {
            self.device
                .allocate_descriptor_sets(&allocate_info)
                .map_err(|e| {
                    engine_error!("novart::vulkan",
                        "Failed to allocate descriptor set: {:?}", e);
                    Error::ResourceCreationFailed(format!("descriptor set: {:?}", e))
                })?
        };

        Ok(DescriptorSetHandle(sets[0].as_raw()))
    }

    fn update_descriptor_sets(&self, writes: &[StorageImageWrite]) {
        // Image infos must stay alive until the update call below
        let image_infos: Vec<[vk::DescriptorImageInfo; 1]> = writes
            .iter()
            .map(|write| {
                [vk::DescriptorImageInfo::default()
                    .image_view(vk::ImageView::from_raw(write.view.0))
                    .image_layout(layout_to_vk(write.layout))]
            })
            .collect();

        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .zip(image_infos.iter())
            .map(|(write, image_info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(vk::DescriptorSet::from_raw(write.set.0))
                    .dst_binding(write.binding)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
                    .image_info(image_info)
            })
            .collect();

        unsafe {
            self.device.update_descriptor_sets(&vk_writes, &[]);
        }
    }

    fn destroy_descriptor_pool(&self, pool: DescriptorPoolHandle) {
        unsafe {
            self.device
                .destroy_descriptor_pool(vk::DescriptorPool::from_raw(pool.0), None);
        }
    }

    fn destroy_descriptor_set_layout(&self, layout: DescriptorSetLayoutHandle) {
        unsafe {
            self.device.destroy_descriptor_set_layout(
                vk::DescriptorSetLayout::from_raw(layout.0),
                None,
            );
        }
    }

    fn cmd_image_barrier(
        &self,
        stream: CommandStream,
        image: ImageHandle,
        src_access: AccessFlags,
        dst_access: AccessFlags,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
    ) {
        let barrier = vk::ImageMemoryBarrier::default()
            .src_access_mask(access_to_vk(src_access))
            .dst_access_mask(access_to_vk(dst_access))
            .old_layout(layout_to_vk(old_layout))
            .new_layout(layout_to_vk(new_layout))
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(vk::Image::from_raw(image.0))
            .subresource_range(color_subresource_range());

        unsafe {
            self.device.cmd_pipeline_barrier(
                vk::CommandBuffer::from_raw(stream.0),
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }
}

#[cfg(test)]
#[path = "vulkan_device_tests.rs"]
mod tests;
