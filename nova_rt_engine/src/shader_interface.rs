//! Shader interface constants shared between host and device-side code
//!
//! Binding slot numbers, the output image format, and the in-flight frame
//! count must agree with the values compiled into the ray-tracing shaders.
//! They live in this single table instead of being scattered as free
//! constants next to their call sites.

use crate::device::{ImageFormat, ShaderStageFlags};

/// Maximum number of frames whose GPU work may be outstanding at once.
///
/// Used as the default descriptor-set count for per-frame resources; the
/// frame fences in the owning render loop are sized to the same value.
pub const MAX_FRAMES_IN_FLIGHT: u32 = 2;

/// Descriptor binding slots, per descriptor-set layout
pub mod binding_slot {
    /// The output storage image, set-local binding in the raygen stage
    pub const STORAGE_IMAGE: u32 = 0;
}

/// Pixel format of the ray-tracing output image (4-channel, 32-bit float)
pub const OUTPUT_IMAGE_FORMAT: ImageFormat = ImageFormat::R32G32B32A32_SFLOAT;

/// Shader stages that read or write the output image through its descriptor
pub const OUTPUT_IMAGE_STAGES: ShaderStageFlags = ShaderStageFlags::RAYGEN;
