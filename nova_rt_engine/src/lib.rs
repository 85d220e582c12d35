/*!
# NovaRT Engine

Core traits and types for the NovaRT ray-tracing renderer.

This crate owns the renderer's output storage image: a single GPU-resident,
shader-writable/readable RGBA32F image whose lifetime and dimensions track the
presentation surface, plus the fixed pool of per-in-flight-frame descriptor
sets the ray-generation stage uses to address it.

The GPU itself is reached only through traits, so the lifecycle and
descriptor logic can be unit-tested against a mock device:

- **RenderDevice**: image, view, descriptor, and barrier operations
- **DeviceAllocator**: dedicated device-memory allocation (external collaborator)
- **CommandExecutor**: one-shot command recording and submission (external collaborator)

Backend implementations (Vulkan) provide concrete types that implement these
traits.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod device;
pub mod shader_interface;
pub mod output_image;

// Main novart namespace module
pub mod novart {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (logging dispatch)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they live at the crate root
    }

    // Device sub-module with the GPU abstraction traits
    pub mod device {
        pub use crate::device::*;
    }

    // Shader-interface constants shared with device-side code
    pub mod shader_interface {
        pub use crate::shader_interface::*;
    }

    // Output image sub-module
    pub mod output_image {
        pub use crate::output_image::*;
    }
}
