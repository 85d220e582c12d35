/// OutputImage - the GPU-resident storage image ray-tracing shaders write
/// into and post-processing reads from
///
/// Owns the image/view/memory triple and drives its lifecycle from surface
/// events: the image is created when the surface is ready, destroyed when it
/// is lost, and recreated with new dimensions on resize. The three handles
/// are valid together or invalid together; a failure partway through
/// creation rolls back whatever was already created.
///
/// Threading contract: `create`, `destroy`, and `barrier` must be invoked
/// from the single thread that drives command submission for this resource.
/// `create` and `destroy` block on the queue; `barrier` only records.

use std::sync::Arc;

use crate::error::{Result, Error};
use crate::{engine_debug, engine_info, engine_warn, engine_error};
use crate::device::{
    RenderDevice, DeviceAllocator, CommandExecutor,
    ImageHandle, ImageViewHandle, DescriptorSetHandle,
    ImageDesc, ImageUsageFlags, ImageLayout, AccessFlags,
    MemoryBlock, MemoryLocation,
    CommandStream,
};
use crate::shader_interface::OUTPUT_IMAGE_FORMAT;
use crate::output_image::OutputImageDescriptors;

/// The renderer's output storage image
///
/// A single image shared across all frame slots; the owning render loop
/// serializes writes across frames via its frame fences. Within one frame's
/// command stream, `barrier` orders the write pass before the read pass.
pub struct OutputImage {
    /// Device for image/view/descriptor operations
    device: Arc<dyn RenderDevice>,
    /// Dedicated device-memory allocator (owned by the surrounding pipeline)
    allocator: Arc<dyn DeviceAllocator>,
    /// One-shot command executor (owned by the surrounding pipeline)
    executor: Arc<dyn CommandExecutor>,

    /// Image handle, null when not created
    image: ImageHandle,
    /// Full-image 2D view, null when not created
    view: ImageViewHandle,
    /// Dedicated device-local memory backing the image, null when not created
    memory: MemoryBlock,

    /// Current width in pixels (0 when not created)
    width: u32,
    /// Current height in pixels (0 when not created)
    height: u32,
    /// Current layout state
    layout: ImageLayout,

    /// Per-frame descriptor sets; layout and pool outlive image recreations
    descriptors: OutputImageDescriptors,
}

impl OutputImage {
    /// Create the output-image subsystem with no image yet
    ///
    /// Descriptor layout, pool, and sets are created here, once per object
    /// lifetime; the image itself is created on the first surface-ready
    /// event (or an explicit `create`).
    ///
    /// # Arguments
    ///
    /// * `device` - Device for image and descriptor operations
    /// * `allocator` - Dedicated device-memory allocator
    /// * `executor` - One-shot command executor
    /// * `frame_count` - Number of frames that may be in flight concurrently
    ///
    /// # Errors
    ///
    /// `Error::ResourceCreationFailed` if the descriptor objects cannot be
    /// created.
    pub fn new(
        device: Arc<dyn RenderDevice>,
        allocator: Arc<dyn DeviceAllocator>,
        executor: Arc<dyn CommandExecutor>,
        frame_count: u32,
    ) -> Result<Self> {
        let descriptors = OutputImageDescriptors::new(device.clone(), frame_count)?;

        Ok(Self {
            device,
            allocator,
            executor,
            image: ImageHandle::null(),
            view: ImageViewHandle::null(),
            memory: MemoryBlock::null(),
            width: 0,
            height: 0,
            layout: ImageLayout::Undefined,
            descriptors,
        })
    }

    /// Create the image, view, and memory for the given dimensions
    ///
    /// Blocks the calling thread until the initial layout transition
    /// (Undefined to General, none to shader-write) has completed on the
    /// device, then rewrites all per-frame descriptor sets to reference the
    /// new view. The image is immediately usable on return.
    ///
    /// Every `create` after the first must be preceded by a `destroy`; use
    /// `recreate` for resize events.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidDimensions` - width or height is zero
    /// * `Error::OutOfDeviceMemory` - the allocator refused the allocation
    /// * `Error::ResourceCreationFailed` - any device creation call failed
    ///
    /// All failures are fatal for the render context; on failure everything
    /// already created is released, so no partially valid handles survive.
    pub fn create(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            engine_error!("novart::OutputImage",
                "Rejected output image creation with dimensions {}x{}", width, height);
            return Err(Error::InvalidDimensions { width, height });
        }
        debug_assert!(
            self.image.is_null(),
            "create() while an image is alive; destroy() first"
        );

        if let Err(e) = self.create_resources(width, height) {
            self.destroy();
            self.width = 0;
            self.height = 0;
            return Err(e);
        }

        self.descriptors.rewrite_all(self.view);

        engine_info!("novart::OutputImage", "Created {}x{} output image", width, height);
        Ok(())
    }

    fn create_resources(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;

        let desc = ImageDesc {
            width,
            height,
            format: OUTPUT_IMAGE_FORMAT,
            usage: ImageUsageFlags::STORAGE | ImageUsageFlags::TRANSFER_SRC,
            debug_name: Some("Output image"),
        };
        self.image = self.device.create_image(&desc).map_err(|e| {
            engine_error!("novart::OutputImage", "Failed to create image: {}", e);
            e
        })?;

        let requirements = self.device.image_memory_requirements(self.image);
        self.memory = self
            .allocator
            .alloc_dedicated(&requirements, MemoryLocation::DeviceLocal)
            .map_err(|e| {
                engine_error!("novart::OutputImage",
                    "Failed to allocate {} bytes of device-local memory: {}",
                    requirements.size, e);
                e
            })?;

        self.device.bind_image_memory(self.image, &self.memory).map_err(|e| {
            engine_error!("novart::OutputImage", "Failed to bind image memory: {}", e);
            e
        })?;

        self.view = self.device.create_image_view(self.image, OUTPUT_IMAGE_FORMAT).map_err(|e| {
            engine_error!("novart::OutputImage", "Failed to create image view: {}", e);
            e
        })?;

        // One-shot transition to General so raygen can write immediately.
        // Blocks until the queue drains; on return the image is usable.
        let stream = self.executor.begin_one_shot()?;
        self.device.cmd_image_barrier(
            stream,
            self.image,
            AccessFlags::empty(),
            AccessFlags::SHADER_WRITE,
            ImageLayout::Undefined,
            ImageLayout::General,
        );
        self.layout = ImageLayout::General;
        self.executor.submit(stream)?;
        self.executor.wait_idle()?;

        Ok(())
    }

    /// Destroy the image, view, and memory if currently valid
    ///
    /// Idempotent: calling on an already-destroyed image is a no-op. Waits
    /// for the queue to drain first, so frames still in flight can no longer
    /// reference the image when it is released.
    ///
    /// Descriptor sets still referencing the destroyed view are stale until
    /// the next `create` rewrites them; reading through them is undefined.
    pub fn destroy(&mut self) {
        if self.image.is_null() && self.view.is_null() && self.memory.is_null() {
            return;
        }

        // Frames may still be in flight referencing the image
        if let Err(e) = self.executor.wait_idle() {
            engine_warn!("novart::OutputImage",
                "wait_idle before image destruction failed: {}", e);
        }

        if !self.view.is_null() {
            self.device.destroy_image_view(self.view);
            self.view = ImageViewHandle::null();
        }
        if !self.memory.is_null() {
            self.allocator.free_dedicated(self.memory);
            self.memory = MemoryBlock::null();
        }
        if !self.image.is_null() {
            self.device.destroy_image(self.image);
            self.image = ImageHandle::null();
        }
        self.layout = ImageLayout::Undefined;
        self.width = 0;
        self.height = 0;

        engine_debug!("novart::OutputImage", "Destroyed output image");
    }

    /// Destroy-then-create for resize events
    ///
    /// # Errors
    ///
    /// Same as `create`.
    pub fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        self.destroy();
        self.create(width, height)
    }

    /// Record the write-before-read barrier into a frame's command stream
    ///
    /// Sequences the producing (shader-write) pass before the consuming
    /// (shader-read) pass on this image, layout staying General. Call
    /// between the two passes within the same frame's stream. Only records
    /// an ordering constraint; no host-visible state changes, and repeated
    /// calls within one stream are safe.
    pub fn barrier(&self, stream: CommandStream) {
        debug_assert!(!self.image.is_null(), "barrier() on a destroyed output image");

        self.device.cmd_image_barrier(
            stream,
            self.image,
            AccessFlags::SHADER_WRITE,
            AccessFlags::SHADER_READ,
            ImageLayout::General,
            ImageLayout::General,
        );
    }

    /// Surface became ready (created or resized) with the given dimensions
    ///
    /// # Errors
    ///
    /// Same as `create`.
    pub fn on_surface_ready(&mut self, width: u32, height: u32) -> Result<()> {
        self.recreate(width, height)
    }

    /// Surface was lost; drop the image until the next surface-ready event
    pub fn on_surface_lost(&mut self) {
        self.destroy();
    }

    /// Get the descriptor set for a frame slot
    ///
    /// # Panics
    ///
    /// Panics if `frame_index >= frame_count`.
    pub fn descriptor_set(&self, frame_index: u32) -> DescriptorSetHandle {
        self.descriptors.set(frame_index)
    }

    /// Access the descriptor manager (e.g. for pipeline-layout construction)
    pub fn descriptors(&self) -> &OutputImageDescriptors {
        &self.descriptors
    }

    /// Image handle, for the presentation blit (image is TRANSFER_SRC)
    pub fn image_handle(&self) -> ImageHandle {
        self.image
    }

    /// View handle currently bound into the descriptor sets
    pub fn view_handle(&self) -> ImageViewHandle {
        self.view
    }

    /// Current width in pixels (0 when not created)
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Current height in pixels (0 when not created)
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the image/view/memory triple is currently valid
    pub fn is_ready(&self) -> bool {
        !self.image.is_null()
    }

    /// Current layout state
    pub fn layout(&self) -> ImageLayout {
        self.layout
    }
}

impl Drop for OutputImage {
    fn drop(&mut self) {
        self.destroy();
        // descriptors (pool, layout) are torn down by their own Drop
    }
}

#[cfg(test)]
#[path = "output_image_tests.rs"]
mod tests;
