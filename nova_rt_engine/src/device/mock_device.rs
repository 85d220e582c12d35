/// Mock device, allocator, and executor for unit tests (no GPU required)
///
/// The mock device mints unique handle identifiers and captures every call
/// relevant to the output-image lifecycle: live/destroyed resources, the
/// last storage-image write per descriptor set, pool capacities, and
/// recorded barriers. The mock allocator has a programmable failure switch
/// for exercising creation rollback; the mock executor records the
/// begin/submit/wait-idle ordering.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::device::{
    RenderDevice, DeviceAllocator, CommandExecutor,
    ImageHandle, ImageViewHandle,
    DescriptorSetLayoutHandle, DescriptorPoolHandle, DescriptorSetHandle,
    ImageDesc, DescriptorSetLayoutDesc, StorageImageWrite,
    ImageLayout, AccessFlags,
    MemoryRequirements, MemoryLocation, MemoryBlock,
    CommandStream,
};

// ============================================================================
// Mock Device
// ============================================================================

/// A barrier recorded through `cmd_image_barrier`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedBarrier {
    pub stream: CommandStream,
    pub image: ImageHandle,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
}

#[derive(Debug, Default)]
struct MockDeviceState {
    live_images: HashSet<u64>,
    destroyed_images: Vec<u64>,
    bound_memory: HashMap<u64, u64>, // image -> memory block id
    live_views: HashMap<u64, u64>,   // view -> image
    destroyed_views: Vec<u64>,
    live_layouts: HashSet<u64>,
    destroyed_layouts: Vec<u64>,
    pools: HashMap<u64, PoolState>,
    destroyed_pools: Vec<u64>,
    sets: HashMap<u64, u64>, // set -> pool
    writes: HashMap<u64, StorageImageWrite>, // set -> last write
    barriers: Vec<RecordedBarrier>,
}

#[derive(Debug)]
struct PoolState {
    capacity: u32,
    allocated: u32,
}

/// Mock RenderDevice that captures calls without a GPU
#[derive(Debug)]
pub struct MockDevice {
    next_handle: AtomicU64,
    fail_image_creation: AtomicBool,
    fail_view_creation: AtomicBool,
    state: Mutex<MockDeviceState>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            // Handle 0 is the null sentinel
            next_handle: AtomicU64::new(1),
            fail_image_creation: AtomicBool::new(false),
            fail_view_creation: AtomicBool::new(false),
            state: Mutex::new(MockDeviceState::default()),
        }
    }

    fn mint(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::SeqCst)
    }

    /// Make the next create_image call fail
    pub fn fail_next_image_creation(&self) {
        self.fail_image_creation.store(true, Ordering::SeqCst);
    }

    /// Make the next create_image_view call fail
    pub fn fail_next_view_creation(&self) {
        self.fail_view_creation.store(true, Ordering::SeqCst);
    }

    pub fn live_image_count(&self) -> usize {
        self.state.lock().unwrap().live_images.len()
    }

    pub fn live_view_count(&self) -> usize {
        self.state.lock().unwrap().live_views.len()
    }

    pub fn destroyed_images(&self) -> Vec<u64> {
        self.state.lock().unwrap().destroyed_images.clone()
    }

    pub fn destroyed_view_count(&self) -> usize {
        self.state.lock().unwrap().destroyed_views.len()
    }

    pub fn live_layout_count(&self) -> usize {
        self.state.lock().unwrap().live_layouts.len()
    }

    pub fn live_pool_count(&self) -> usize {
        self.state.lock().unwrap().pools.len()
    }

    pub fn destroyed_pool_count(&self) -> usize {
        self.state.lock().unwrap().destroyed_pools.len()
    }

    pub fn destroyed_layout_count(&self) -> usize {
        self.state.lock().unwrap().destroyed_layouts.len()
    }

    /// Last storage-image write captured for a descriptor set
    pub fn last_write(&self, set: DescriptorSetHandle) -> Option<StorageImageWrite> {
        self.state.lock().unwrap().writes.get(&set.0).copied()
    }

    /// All barriers recorded so far, in order
    pub fn barriers(&self) -> Vec<RecordedBarrier> {
        self.state.lock().unwrap().barriers.clone()
    }
}

impl RenderDevice for MockDevice {
    fn create_image(&self, desc: &ImageDesc) -> Result<ImageHandle> {
        if self.fail_image_creation.swap(false, Ordering::SeqCst) {
            return Err(Error::ResourceCreationFailed(format!(
                "mock: image creation failed ({}x{})",
                desc.width, desc.height
            )));
        }
        let id = self.mint();
        self.state.lock().unwrap().live_images.insert(id);
        Ok(ImageHandle(id))
    }

    fn image_memory_requirements(&self, _image: ImageHandle) -> MemoryRequirements {
        MemoryRequirements {
            size: 1 << 20,
            alignment: 256,
            memory_type_bits: 0b1,
        }
    }

    fn bind_image_memory(&self, image: ImageHandle, memory: &MemoryBlock) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        assert!(state.live_images.contains(&image.0), "bind on unknown image");
        let previous = state.bound_memory.insert(image.0, memory.id);
        assert!(previous.is_none(), "image memory bound twice");
        Ok(())
    }

    fn create_image_view(&self, image: ImageHandle, _format: crate::device::ImageFormat) -> Result<ImageViewHandle> {
        if self.fail_view_creation.swap(false, Ordering::SeqCst) {
            return Err(Error::ResourceCreationFailed(
                "mock: view creation failed".to_string(),
            ));
        }
        let id = self.mint();
        let mut state = self.state.lock().unwrap();
        assert!(state.live_images.contains(&image.0), "view on unknown image");
        state.live_views.insert(id, image.0);
        Ok(ImageViewHandle(id))
    }

    fn destroy_image(&self, image: ImageHandle) {
        let mut state = self.state.lock().unwrap();
        assert!(state.live_images.remove(&image.0), "double destroy of image");
        state.bound_memory.remove(&image.0);
        state.destroyed_images.push(image.0);
    }

    fn destroy_image_view(&self, view: ImageViewHandle) {
        let mut state = self.state.lock().unwrap();
        assert!(state.live_views.remove(&view.0).is_some(), "double destroy of view");
        state.destroyed_views.push(view.0);
    }

    fn create_descriptor_set_layout(
        &self,
        _desc: &DescriptorSetLayoutDesc,
    ) -> Result<DescriptorSetLayoutHandle> {
        let id = self.mint();
        self.state.lock().unwrap().live_layouts.insert(id);
        Ok(DescriptorSetLayoutHandle(id))
    }

    fn create_descriptor_pool(&self, max_sets: u32) -> Result<DescriptorPoolHandle> {
        let id = self.mint();
        self.state.lock().unwrap().pools.insert(
            id,
            PoolState { capacity: max_sets, allocated: 0 },
        );
        Ok(DescriptorPoolHandle(id))
    }

    fn allocate_descriptor_set(
        &self,
        pool: DescriptorPoolHandle,
        layout: DescriptorSetLayoutHandle,
    ) -> Result<DescriptorSetHandle> {
        let id = self.mint();
        let mut state = self.state.lock().unwrap();
        assert!(state.live_layouts.contains(&layout.0), "allocation with unknown layout");
        let pool_state = state.pools.get_mut(&pool.0).expect("allocation from unknown pool");
        if pool_state.allocated >= pool_state.capacity {
            return Err(Error::ResourceCreationFailed(format!(
                "mock: descriptor pool exhausted (capacity {})",
                pool_state.capacity
            )));
        }
        pool_state.allocated += 1;
        state.sets.insert(id, pool.0);
        Ok(DescriptorSetHandle(id))
    }

    fn update_descriptor_sets(&self, writes: &[StorageImageWrite]) {
        let mut state = self.state.lock().unwrap();
        for write in writes {
            assert!(state.sets.contains_key(&write.set.0), "write to unknown set");
            state.writes.insert(write.set.0, *write);
        }
    }

    fn destroy_descriptor_pool(&self, pool: DescriptorPoolHandle) {
        let mut state = self.state.lock().unwrap();
        assert!(state.pools.remove(&pool.0).is_some(), "double destroy of pool");
        // Sets are freed with their pool
        state.sets.retain(|_, owner| *owner != pool.0);
        state.destroyed_pools.push(pool.0);
    }

    fn destroy_descriptor_set_layout(&self, layout: DescriptorSetLayoutHandle) {
        let mut state = self.state.lock().unwrap();
        assert!(state.live_layouts.remove(&layout.0), "double destroy of layout");
        state.destroyed_layouts.push(layout.0);
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
        self.state.lock().unwrap().barriers.push(RecordedBarrier {
            stream,
            image,
            src_access,
            dst_access,
            old_layout,
            new_layout,
        });
    }
}

// ============================================================================
// Mock Allocator
// ============================================================================

/// Mock DeviceAllocator tracking outstanding blocks, with a failure switch
#[derive(Debug)]
pub struct MockAllocator {
    next_id: AtomicU64,
    fail_next: AtomicBool,
    outstanding: Mutex<HashSet<u64>>,
    freed: Mutex<Vec<u64>>,
}

impl MockAllocator {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            fail_next: AtomicBool::new(false),
            outstanding: Mutex::new(HashSet::new()),
            freed: Mutex::new(Vec::new()),
        }
    }

    /// Make the next alloc_dedicated call fail with OutOfDeviceMemory
    pub fn fail_next_allocation(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of blocks allocated but not yet freed
    pub fn outstanding_blocks(&self) -> usize {
        self.outstanding.lock().unwrap().len()
    }

    /// Identifiers of freed blocks, in free order
    pub fn freed_blocks(&self) -> Vec<u64> {
        self.freed.lock().unwrap().clone()
    }
}

impl DeviceAllocator for MockAllocator {
    fn alloc_dedicated(
        &self,
        requirements: &MemoryRequirements,
        _location: MemoryLocation,
    ) -> Result<MemoryBlock> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::OutOfDeviceMemory);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.outstanding.lock().unwrap().insert(id);
        Ok(MemoryBlock {
            id,
            device_memory: id,
            offset: 0,
            size: requirements.size,
        })
    }

    fn free_dedicated(&self, block: MemoryBlock) {
        let mut outstanding = self.outstanding.lock().unwrap();
        assert!(outstanding.remove(&block.id), "double free of memory block");
        self.freed.lock().unwrap().push(block.id);
    }
}

// ============================================================================
// Mock Executor
// ============================================================================

/// Executor events in call order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorEvent {
    BeginOneShot(CommandStream),
    Submit(CommandStream),
    WaitIdle,
}

/// Mock CommandExecutor recording begin/submit/wait-idle ordering
#[derive(Debug)]
pub struct MockExecutor {
    next_stream: AtomicU64,
    events: Mutex<Vec<ExecutorEvent>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            next_stream: AtomicU64::new(1),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ExecutorEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn wait_idle_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| **e == ExecutorEvent::WaitIdle)
            .count()
    }
}

impl CommandExecutor for MockExecutor {
    fn begin_one_shot(&self) -> Result<CommandStream> {
        let stream = CommandStream(self.next_stream.fetch_add(1, Ordering::SeqCst));
        self.events.lock().unwrap().push(ExecutorEvent::BeginOneShot(stream));
        Ok(stream)
    }

    fn submit(&self, stream: CommandStream) -> Result<()> {
        self.events.lock().unwrap().push(ExecutorEvent::Submit(stream));
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.events.lock().unwrap().push(ExecutorEvent::WaitIdle);
        Ok(())
    }
}
