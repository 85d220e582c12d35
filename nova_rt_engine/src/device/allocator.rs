/// DeviceAllocator trait - external dedicated-memory allocation contract
///
/// The allocator is a borrowed collaborator owned by the surrounding
/// pipeline; this subsystem only consumes the dedicated alloc/free pair and
/// never sees the allocator's internal strategy.

use crate::error::Result;

/// Memory requirements of a resource, as reported by the device
#[derive(Debug, Clone, Copy)]
pub struct MemoryRequirements {
    /// Required allocation size in bytes
    pub size: u64,
    /// Required alignment in bytes
    pub alignment: u64,
    /// Bitmask of memory types the resource can be bound to
    pub memory_type_bits: u32,
}

/// Placement policy for an allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryLocation {
    /// Memory resident on the accelerator, fastest for shader access
    DeviceLocal,
    /// Memory mappable from the host
    HostVisible,
}

/// A dedicated memory block returned by the allocator
///
/// Carries the placement information the device needs for binding, plus an
/// allocator-private `id` used to return the block on free. `null()` is the
/// invalid sentinel a destroyed resource resets to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBlock {
    /// Allocator-private identifier of this block
    pub id: u64,
    /// Raw device-memory handle backing the block
    pub device_memory: u64,
    /// Byte offset of the block within the device memory
    pub offset: u64,
    /// Size of the block in bytes
    pub size: u64,
}

impl MemoryBlock {
    /// The invalid sentinel block
    pub const fn null() -> Self {
        Self { id: 0, device_memory: 0, offset: 0, size: 0 }
    }

    /// Whether this block is the invalid sentinel
    pub fn is_null(&self) -> bool {
        self.id == 0
    }
}

/// Dedicated device-memory allocator interface
///
/// One block per resource; blocks are never shared or sub-allocated from the
/// caller's point of view.
pub trait DeviceAllocator: Send + Sync {
    /// Allocate a dedicated block satisfying `requirements` at `location`
    ///
    /// # Errors
    ///
    /// `Error::OutOfDeviceMemory` if the device cannot satisfy the request.
    /// Fatal for the caller; this subsystem never retries.
    fn alloc_dedicated(
        &self,
        requirements: &MemoryRequirements,
        location: MemoryLocation,
    ) -> Result<MemoryBlock>;

    /// Return a block to the allocator
    fn free_dedicated(&self, block: MemoryBlock);
}
