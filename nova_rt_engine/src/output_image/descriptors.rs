/// OutputImageDescriptors - per-in-flight-frame descriptor sets for the
/// output storage image
///
/// Owns one descriptor-set layout (single storage-image binding, raygen
/// visibility), one fixed-capacity pool, and exactly one pre-allocated set
/// per frame that may be in flight. Layout and pool are created once and
/// outlive any number of image recreations; only the set contents are
/// rewritten when the image changes.

use std::sync::Arc;

use crate::error::{Result, Error};
use crate::engine_error;
use crate::device::{
    RenderDevice,
    DescriptorSetLayoutHandle, DescriptorPoolHandle, DescriptorSetHandle,
    DescriptorSetLayoutDesc, StorageImageWrite,
    ImageViewHandle, ImageLayout,
};
use crate::shader_interface::{binding_slot, OUTPUT_IMAGE_STAGES};

/// Per-frame descriptor bindings for the output storage image
pub struct OutputImageDescriptors {
    /// Device the descriptor objects were created on (kept for teardown)
    device: Arc<dyn RenderDevice>,
    /// Set layout, created once per object lifetime
    layout: DescriptorSetLayoutHandle,
    /// Pool with capacity exactly `sets.len()`, never resized
    pool: DescriptorPoolHandle,
    /// One set per frame slot; length fixed at construction
    sets: Vec<DescriptorSetHandle>,
}

impl OutputImageDescriptors {
    /// Create the layout, pool, and `frame_count` descriptor sets
    ///
    /// # Arguments
    ///
    /// * `device` - Device to create the descriptor objects on
    /// * `frame_count` - Number of frames that may be in flight concurrently (> 0)
    ///
    /// # Errors
    ///
    /// `Error::ResourceCreationFailed` if any descriptor object cannot be
    /// created. Fatal; the pool capacity is fixed and never resized, so
    /// there is no fallback allocation path.
    pub fn new(device: Arc<dyn RenderDevice>, frame_count: u32) -> Result<Self> {
        assert!(frame_count > 0, "frame_count must be > 0");

        let layout_desc = DescriptorSetLayoutDesc {
            binding: binding_slot::STORAGE_IMAGE,
            stages: OUTPUT_IMAGE_STAGES,
        };
        let layout = device.create_descriptor_set_layout(&layout_desc).map_err(|e| {
            engine_error!("novart::OutputImageDescriptors",
                "Failed to create set layout: {}", e);
            Error::ResourceCreationFailed(format!("descriptor set layout: {}", e))
        })?;

        let pool = match device.create_descriptor_pool(frame_count) {
            Ok(pool) => pool,
            Err(e) => {
                engine_error!("novart::OutputImageDescriptors",
                    "Failed to create descriptor pool: {}", e);
                device.destroy_descriptor_set_layout(layout);
                return Err(Error::ResourceCreationFailed(format!("descriptor pool: {}", e)));
            }
        };

        let mut sets = Vec::with_capacity(frame_count as usize);
        for i in 0..frame_count {
            match device.allocate_descriptor_set(pool, layout) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    engine_error!("novart::OutputImageDescriptors",
                        "Failed to allocate set {} of {}: {}", i, frame_count, e);
                    device.destroy_descriptor_pool(pool);
                    device.destroy_descriptor_set_layout(layout);
                    return Err(Error::ResourceCreationFailed(format!(
                        "descriptor set {}: {}", i, e
                    )));
                }
            }
        }

        Ok(Self { device, layout, pool, sets })
    }

    /// Rewrite the storage-image binding of every set to reference `view`
    ///
    /// Must be called after every successful image creation and before any
    /// frame records a dispatch that reads its set. Reading through a set
    /// whose bound view has since been destroyed is undefined; always
    /// rewrite before use.
    pub fn rewrite_all(&self, view: ImageViewHandle) {
        let writes: Vec<StorageImageWrite> = self
            .sets
            .iter()
            .map(|set| StorageImageWrite {
                set: *set,
                binding: binding_slot::STORAGE_IMAGE,
                view,
                layout: ImageLayout::General,
            })
            .collect();

        self.device.update_descriptor_sets(&writes);
    }

    /// Get the descriptor set for a frame slot
    ///
    /// # Arguments
    ///
    /// * `frame_index` - Frame slot, must be in `[0, frame_count)`
    ///
    /// # Panics
    ///
    /// Panics if `frame_index` is out of range.
    pub fn set(&self, frame_index: u32) -> DescriptorSetHandle {
        assert!(
            (frame_index as usize) < self.sets.len(),
            "frame_index {} out of range (frame_count = {})",
            frame_index,
            self.sets.len()
        );
        self.sets[frame_index as usize]
    }

    /// Number of frame slots
    pub fn frame_count(&self) -> u32 {
        self.sets.len() as u32
    }

    /// Layout handle, for pipeline-layout construction by the owning pipeline
    pub fn layout(&self) -> DescriptorSetLayoutHandle {
        self.layout
    }

    pub(crate) fn pool(&self) -> DescriptorPoolHandle {
        self.pool
    }
}

impl Drop for OutputImageDescriptors {
    fn drop(&mut self) {
        // Sets are freed implicitly with their pool
        self.device.destroy_descriptor_pool(self.pool);
        self.device.destroy_descriptor_set_layout(self.layout);
    }
}

#[cfg(test)]
#[path = "descriptors_tests.rs"]
mod tests;
