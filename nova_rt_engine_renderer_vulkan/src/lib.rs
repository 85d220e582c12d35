/*!
# NovaRT Engine - Vulkan Renderer Backend

Vulkan implementation of the NovaRT device abstraction.

This crate implements the nova_rt_engine device traits using the Ash library
for Vulkan bindings and gpu-allocator for device memory management:

- **VulkanDevice**: image, view, descriptor, and barrier operations
- **VulkanDeviceAllocator**: dedicated device-memory allocation
- **VulkanCommandExecutor**: one-shot command recording and blocking submission

The opaque core handles are the raw Vulkan handles; converting between the
two is a free `Handle::as_raw`/`from_raw` pair, so no handle registry is
kept on either side.

With the `vulkan-validation` feature enabled, resources created with a debug
name are labelled through VK_EXT_debug_utils so validation-layer messages
identify them.
*/

// Vulkan implementation modules
mod vulkan_device;
mod vulkan_allocator;
mod vulkan_commands;

pub use vulkan_device::VulkanDevice;
pub use vulkan_allocator::VulkanDeviceAllocator;
pub use vulkan_commands::VulkanCommandExecutor;
