/// VulkanDeviceAllocator - Vulkan implementation of the DeviceAllocator trait
///
/// Wraps the gpu-allocator Vulkan allocator shared with the rest of the
/// renderer. Core memory blocks carry the raw device-memory handle and
/// offset for binding; the gpu-allocator Allocation itself is not Copy, so
/// live allocations are kept here keyed by the block identifier and looked
/// up on free.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};

use nova_rt_engine::novart::{Error, Result};
use nova_rt_engine::novart::device::{
    DeviceAllocator, MemoryBlock, MemoryLocation, MemoryRequirements,
};
use nova_rt_engine::{engine_error, engine_warn};
use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use rustc_hash::FxHashMap;

/// Vulkan device-memory allocator implementation
pub struct VulkanDeviceAllocator {
    /// GPU memory allocator shared with the rest of the renderer
    allocator: Arc<Mutex<Allocator>>,
    /// Live allocations by block identifier
    live: Mutex<FxHashMap<u64, Allocation>>,
    /// Next block identifier (0 is the null sentinel)
    next_id: AtomicU64,
}

impl VulkanDeviceAllocator {
    /// Wrap a shared gpu-allocator instance
    pub fn new(allocator: Arc<Mutex<Allocator>>) -> Self {
        Self {
            allocator,
            live: Mutex::new(FxHashMap::default()),
            next_id: AtomicU64::new(1),
        }
    }
}

fn location_to_gpu_allocator(location: MemoryLocation) -> gpu_allocator::MemoryLocation {
    match location {
        MemoryLocation::DeviceLocal => gpu_allocator::MemoryLocation::GpuOnly,
        MemoryLocation::HostVisible => gpu_allocator::MemoryLocation::CpuToGpu,
    }
}

impl DeviceAllocator for VulkanDeviceAllocator {
    fn alloc_dedicated(
        &self,
        requirements: &MemoryRequirements,
        location: MemoryLocation,
    ) -> Result<MemoryBlock> {
        let vk_requirements = vk::MemoryRequirements {
            size: requirements.size,
            alignment: requirements.alignment,
            memory_type_bits: requirements.memory_type_bits,
        };

        let allocation = self
            .allocator
            .lock()
            .unwrap()
            .allocate(&AllocationCreateDesc {
                name: "output_image",
                requirements: vk_requirements,
                location: location_to_gpu_allocator(location),
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|_e| {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!("novart::vulkan",
                    "Out of GPU memory for dedicated allocation ({:.2} MB)", size_mb);
                Error::OutOfDeviceMemory
            })?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let block = MemoryBlock {
            id,
            device_memory: unsafe { allocation.memory() }.as_raw(),
            offset: allocation.offset(),
            size: allocation.size(),
        };
        self.live.lock().unwrap().insert(id, allocation);

        Ok(block)
    }

    fn free_dedicated(&self, block: MemoryBlock) {
        let allocation = self.live.lock().unwrap().remove(&block.id);
        match allocation {
            Some(allocation) => {
                if self.allocator.lock().unwrap().free(allocation).is_err() {
                    engine_warn!("novart::vulkan",
                        "Failed to free dedicated allocation {}", block.id);
                }
            }
            None => {
                engine_warn!("novart::vulkan",
                    "free_dedicated called with unknown block {}", block.id);
            }
        }
    }
}
