/// Output image module - the ray-tracing output storage image and its
/// per-frame descriptor sets

// Module declarations
pub mod descriptors;
pub mod output_image;

// Re-exports
pub use descriptors::OutputImageDescriptors;
pub use output_image::OutputImage;
