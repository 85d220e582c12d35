/// Device module - GPU abstraction traits and handle types

// Module declarations
pub mod device;
pub mod allocator;
pub mod commands;

#[cfg(test)]
pub mod mock_device;

// Re-export everything from device.rs
pub use device::*;

// Re-export from other modules
pub use allocator::*;
pub use commands::*;
