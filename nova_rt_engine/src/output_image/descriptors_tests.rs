//! Unit tests for OutputImageDescriptors (mock device, no GPU)

use std::sync::Arc;

use crate::device::RenderDevice;
use crate::device::mock_device::MockDevice;
use crate::device::{ImageViewHandle, ImageLayout};
use crate::output_image::OutputImageDescriptors;
use crate::shader_interface::binding_slot;

fn new_descriptors(frame_count: u32) -> (Arc<MockDevice>, OutputImageDescriptors) {
    let device = Arc::new(MockDevice::new());
    let descriptors = OutputImageDescriptors::new(device.clone(), frame_count)
        .expect("descriptor construction failed");
    (device, descriptors)
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_construction_allocates_one_set_per_frame() {
    let (device, descriptors) = new_descriptors(2);

    assert_eq!(descriptors.frame_count(), 2);
    assert_eq!(device.live_layout_count(), 1);
    assert_eq!(device.live_pool_count(), 1);

    // Distinct set handles per frame slot
    assert_ne!(descriptors.set(0), descriptors.set(1));
}

#[test]
#[should_panic(expected = "frame_count must be > 0")]
fn test_construction_rejects_zero_frames() {
    let device = Arc::new(MockDevice::new());
    let _ = OutputImageDescriptors::new(device, 0);
}

// ============================================================================
// REWRITE
// ============================================================================

#[test]
fn test_rewrite_all_targets_every_set() {
    let (device, descriptors) = new_descriptors(2);
    let view = ImageViewHandle(1234);

    descriptors.rewrite_all(view);

    for i in 0..descriptors.frame_count() {
        let write = device
            .last_write(descriptors.set(i))
            .expect("set was never written");
        assert_eq!(write.view, view);
        assert_eq!(write.layout, ImageLayout::General);
        assert_eq!(write.binding, binding_slot::STORAGE_IMAGE);
    }
}

#[test]
fn test_rewrite_all_with_three_frames() {
    // A single rewrite covers all three sets, whatever the frame count
    let (device, descriptors) = new_descriptors(3);
    let view = ImageViewHandle(77);

    descriptors.rewrite_all(view);

    assert_eq!(descriptors.frame_count(), 3);
    for i in 0..3 {
        let write = device.last_write(descriptors.set(i)).unwrap();
        assert_eq!(write.view, view);
    }
}

#[test]
fn test_rewrite_replaces_previous_view() {
    let (device, descriptors) = new_descriptors(2);

    descriptors.rewrite_all(ImageViewHandle(1));
    descriptors.rewrite_all(ImageViewHandle(2));

    for i in 0..2 {
        assert_eq!(device.last_write(descriptors.set(i)).unwrap().view, ImageViewHandle(2));
    }
}

#[test]
fn test_layout_and_pool_survive_rewrites() {
    // Only set contents change on image recreation; layout and pool are
    // created once per object lifetime
    let (device, descriptors) = new_descriptors(2);
    let layout_before = descriptors.layout();

    descriptors.rewrite_all(ImageViewHandle(10));
    descriptors.rewrite_all(ImageViewHandle(20));

    assert_eq!(descriptors.layout(), layout_before);
    assert_eq!(device.live_layout_count(), 1);
    assert_eq!(device.live_pool_count(), 1);
}

// ============================================================================
// FIXED POOL CAPACITY
// ============================================================================

#[test]
fn test_pool_capacity_is_fixed() {
    let (device, descriptors) = new_descriptors(2);

    // The pool was sized for exactly two sets; a third allocation must fail
    let result = device.allocate_descriptor_set(descriptors.pool(), descriptors.layout());
    assert!(result.is_err());
}

// ============================================================================
// BOUNDS (set access)
// ============================================================================

#[test]
#[should_panic(expected = "out of range")]
fn test_set_rejects_out_of_range_frame_index() {
    let (_device, descriptors) = new_descriptors(2);
    let _ = descriptors.set(2);
}

// ============================================================================
// TEARDOWN
// ============================================================================

#[test]
fn test_drop_destroys_pool_and_layout() {
    let (device, descriptors) = new_descriptors(2);
    drop(descriptors);

    assert_eq!(device.live_pool_count(), 0);
    assert_eq!(device.live_layout_count(), 0);
    assert_eq!(device.destroyed_pool_count(), 1);
    assert_eq!(device.destroyed_layout_count(), 1);
}
