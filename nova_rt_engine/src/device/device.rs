/// RenderDevice trait - resource creation, descriptor, and barrier interface
///
/// The output-image subsystem never talks to the GPU API directly; it goes
/// through this trait so the lifecycle and descriptor logic can be exercised
/// against a mock device in unit tests. Backend implementations (Vulkan)
/// map the opaque handles below to their native handle types.

use crate::error::Result;
use crate::device::{CommandStream, MemoryBlock, MemoryRequirements};

// ============================================================================
// Opaque handles
// ============================================================================

/// Defines a copyable opaque handle newtype with a null sentinel.
///
/// Handles mirror non-dispatchable GPU API handles: plain identifiers with
/// no ownership semantics. `null()` is the invalid sentinel a destroyed
/// resource resets to.
macro_rules! define_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u64);

        impl $name {
            /// The invalid sentinel handle
            pub const fn null() -> Self {
                Self(0)
            }

            /// Whether this handle is the invalid sentinel
            pub fn is_null(&self) -> bool {
                self.0 == 0
            }
        }
    };
}

define_handle!(
    /// Opaque GPU image handle
    ImageHandle
);
define_handle!(
    /// Opaque image view handle
    ImageViewHandle
);
define_handle!(
    /// Opaque descriptor-set-layout handle
    DescriptorSetLayoutHandle
);
define_handle!(
    /// Opaque descriptor-pool handle
    DescriptorPoolHandle
);
define_handle!(
    /// Opaque descriptor-set handle
    DescriptorSetHandle
);

// ============================================================================
// Descriptions and flags
// ============================================================================

/// Image pixel formats
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// 8-bit RGBA, unsigned normalized
    R8G8B8A8_UNORM,
    /// 8-bit BGRA, unsigned normalized (common swapchain format)
    B8G8R8A8_UNORM,
    /// 32-bit float RGBA (ray-tracing output accumulation)
    R32G32B32A32_SFLOAT,
}

impl ImageFormat {
    /// Bytes per pixel for this format
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            ImageFormat::R8G8B8A8_UNORM => 4,
            ImageFormat::B8G8R8A8_UNORM => 4,
            ImageFormat::R32G32B32A32_SFLOAT => 16,
        }
    }
}

/// GPU image layout states
///
/// Only the two states the output image moves through. Layout changes happen
/// exclusively inside recorded barriers; once General, the image stays
/// General until it is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    /// Initial layout of a freshly created image; contents undefined
    Undefined,
    /// General-purpose layout allowing storage reads and writes
    General,
}

bitflags::bitflags! {
    /// Image usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ImageUsageFlags: u32 {
        /// Shader storage reads/writes
        const STORAGE = 1 << 0;
        /// Source of transfer (copy/blit) operations
        const TRANSFER_SRC = 1 << 1;
    }
}

bitflags::bitflags! {
    /// Memory access kinds ordered by barriers
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessFlags: u32 {
        /// Shader storage read
        const SHADER_READ = 1 << 0;
        /// Shader storage write
        const SHADER_WRITE = 1 << 1;
    }
}

bitflags::bitflags! {
    /// Shader stages a descriptor binding is visible to
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShaderStageFlags: u32 {
        /// Compute stage
        const COMPUTE = 1 << 0;
        /// Ray-generation stage
        const RAYGEN = 1 << 1;
    }
}

/// Description of a 2D image to create
#[derive(Debug, Clone, Copy)]
pub struct ImageDesc {
    /// Width in pixels (> 0)
    pub width: u32,
    /// Height in pixels (> 0)
    pub height: u32,
    /// Pixel format
    pub format: ImageFormat,
    /// Usage flags
    pub usage: ImageUsageFlags,
    /// Optional debug name, applied by backends that support object naming
    pub debug_name: Option<&'static str>,
}

/// Description of a single-binding descriptor-set layout
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSetLayoutDesc {
    /// Set-local binding slot (see `shader_interface::binding_slot`)
    pub binding: u32,
    /// Shader stages the binding is visible to
    pub stages: ShaderStageFlags,
}

/// A single storage-image descriptor write
///
/// Writes are batched so backends can flush a whole rewrite in one
/// update call.
#[derive(Debug, Clone, Copy)]
pub struct StorageImageWrite {
    /// Destination descriptor set
    pub set: DescriptorSetHandle,
    /// Set-local binding slot
    pub binding: u32,
    /// Image view the binding will reference
    pub view: ImageViewHandle,
    /// Layout the image will be in when shaders access it
    pub layout: ImageLayout,
}

// ============================================================================
// RenderDevice trait
// ============================================================================

/// GPU device interface for the output-image subsystem
///
/// All methods take `&self`; implementations handle their own interior
/// synchronization where the native API requires it. Destroy methods accept
/// handles the same device created; passing foreign or stale handles is a
/// caller bug.
pub trait RenderDevice: Send + Sync {
    /// Create a 2D image (no memory bound yet)
    ///
    /// # Errors
    ///
    /// `Error::ResourceCreationFailed` if the device rejects the creation.
    fn create_image(&self, desc: &ImageDesc) -> Result<ImageHandle>;

    /// Query the memory requirements of an image
    fn image_memory_requirements(&self, image: ImageHandle) -> MemoryRequirements;

    /// Bind an allocated memory block to an image
    ///
    /// Must be called exactly once per image, before view creation.
    fn bind_image_memory(&self, image: ImageHandle, memory: &MemoryBlock) -> Result<()>;

    /// Create a 2D view covering the full image (one mip, one layer)
    fn create_image_view(&self, image: ImageHandle, format: ImageFormat) -> Result<ImageViewHandle>;

    /// Destroy an image
    fn destroy_image(&self, image: ImageHandle);

    /// Destroy an image view
    fn destroy_image_view(&self, view: ImageViewHandle);

    /// Create a descriptor-set layout with a single storage-image binding
    fn create_descriptor_set_layout(
        &self,
        desc: &DescriptorSetLayoutDesc,
    ) -> Result<DescriptorSetLayoutHandle>;

    /// Create a descriptor pool holding exactly `max_sets` storage-image sets
    ///
    /// The pool never grows; allocating beyond `max_sets` fails.
    fn create_descriptor_pool(&self, max_sets: u32) -> Result<DescriptorPoolHandle>;

    /// Allocate one descriptor set from a pool using a layout
    fn allocate_descriptor_set(
        &self,
        pool: DescriptorPoolHandle,
        layout: DescriptorSetLayoutHandle,
    ) -> Result<DescriptorSetHandle>;

    /// Flush a batch of storage-image descriptor writes
    fn update_descriptor_sets(&self, writes: &[StorageImageWrite]);

    /// Destroy a descriptor pool (implicitly freeing its sets)
    fn destroy_descriptor_pool(&self, pool: DescriptorPoolHandle);

    /// Destroy a descriptor-set layout
    fn destroy_descriptor_set_layout(&self, layout: DescriptorSetLayoutHandle);

    /// Record an image memory barrier into a command stream
    ///
    /// Records (does not submit) a dependency ordering `src_access` before
    /// `dst_access` on `image`, transitioning `old_layout` to `new_layout`.
    /// No host-visible state changes.
    fn cmd_image_barrier(
        &self,
        stream: CommandStream,
        image: ImageHandle,
        src_access: AccessFlags,
        dst_access: AccessFlags,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
    );
}
