use core::alloc::Layout;
use core::ptr::NonNull;

use super::RawAllocator;

/// Allocator calling directly into the system allocator.
///
/// `Mallocator` uses rust's global allocator to retrieve memory and is the
/// default policy for every container in this crate. With the
/// `memory_tracking` feature enabled, every allocation and release it serves
/// is recorded in the global statistics.
#[derive(Clone, Copy, Default, Debug)]
pub struct Mallocator;

impl RawAllocator for Mallocator {
    unsafe fn alloc(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() != 0, "zero-size allocation request");

        let ptr = NonNull::new(std::alloc::alloc(layout))?;
        #[cfg(feature = "memory_tracking")]
        super::tracking::record_alloc(layout.size());
        Some(ptr)
    }

    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout) {
        #[cfg(feature = "memory_tracking")]
        super::tracking::record_dealloc(layout.size());
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }
}
