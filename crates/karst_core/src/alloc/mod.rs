mod mallocator;
#[cfg(feature = "memory_tracking")]
mod tracking;

pub use mallocator::Mallocator;
#[cfg(feature = "memory_tracking")]
pub use tracking::{stats, tag_stats, AllocStats, ScopedMemTag, TagStats};

use core::alloc::Layout;
use core::fmt;
use core::ptr::NonNull;

/// Minimal allocate/free capability consumed by every container.
///
/// An allocator is supplied per container instantiation through a type
/// parameter defaulting to [`Mallocator`]; containers never reach for
/// process-wide mutable state to find their memory.
pub trait RawAllocator {
    /// Allocate `layout.size()` bytes with `layout.align()` alignment.
    ///
    /// Returns `None` when no memory could be provided. `layout.size()`
    /// must be non-zero.
    ///
    /// # Safety
    ///
    /// The caller must pass a valid, non-zero-size layout.
    unsafe fn alloc(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Release an allocation previously returned by [`RawAllocator::alloc`]
    /// on this allocator with the same layout.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `alloc` on this allocator with `layout`.
    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Failure to reserve storage.
///
/// Allocation failure on the infallible paths terminates the process via
/// [`std::alloc::handle_alloc_error`]; the `try_*` paths surface this error
/// instead so a caller can back off.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReserveError {
    /// The requested capacity does not fit in the address space.
    CapacityOverflow,
    /// The allocator refused the request.
    AllocFailed { layout: Layout },
}

impl fmt::Display for ReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReserveError::CapacityOverflow => write!(f, "requested capacity overflowed"),
            ReserveError::AllocFailed { layout } => {
                write!(f, "allocation of {} bytes failed", layout.size())
            }
        }
    }
}

impl std::error::Error for ReserveError {}

/// Escalate a reserve failure on an infallible path.
///
/// Capacity overflow is a programmer error; exhaustion is fatal with no
/// recovery, matching the container contract.
pub(crate) fn infallible(result: Result<(), ReserveError>) {
    match result {
        Ok(()) => {}
        Err(ReserveError::CapacityOverflow) => panic!("capacity overflow"),
        Err(ReserveError::AllocFailed { layout }) => std::alloc::handle_alloc_error(layout),
    }
}
