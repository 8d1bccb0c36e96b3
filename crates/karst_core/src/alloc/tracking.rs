//! Global allocation statistics, enabled by the `memory_tracking` feature.
//!
//! Allocations served by [`Mallocator`](super::Mallocator) are counted
//! globally and attributed to the active memory tag of the allocating
//! thread. Tags are plain static strings scoped with [`ScopedMemTag`]; the
//! registry records statistics only and never influences allocation
//! behaviour.

use core::cell::Cell;
use core::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

const UNTAGGED: &str = "untagged";

struct Counters {
    allocs: AtomicU64,
    deallocs: AtomicU64,
    live_bytes: AtomicU64,
    peak_bytes: AtomicU64,
}

static GLOBAL: Counters = Counters {
    allocs: AtomicU64::new(0),
    deallocs: AtomicU64::new(0),
    live_bytes: AtomicU64::new(0),
    peak_bytes: AtomicU64::new(0),
};

/// Per-tag totals, accumulated for the lifetime of the process.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct TagStats {
    pub allocs: u64,
    pub bytes: u64,
}

static TAGS: Lazy<Mutex<Vec<(&'static str, TagStats)>>> = Lazy::new(|| Mutex::new(Vec::new()));

thread_local! {
    static ACTIVE_TAG: Cell<&'static str> = Cell::new(UNTAGGED);
}

/// Snapshot of the global allocation counters.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct AllocStats {
    pub allocs: u64,
    pub deallocs: u64,
    pub live_bytes: u64,
    pub peak_bytes: u64,
}

/// Sets the active memory tag on this thread for the current scope and
/// restores the previous tag when dropped.
pub struct ScopedMemTag {
    prev: &'static str,
}

impl ScopedMemTag {
    pub fn new(tag: &'static str) -> Self {
        let prev = ACTIVE_TAG.with(|t| t.replace(tag));
        Self { prev }
    }
}

impl Drop for ScopedMemTag {
    fn drop(&mut self) {
        ACTIVE_TAG.with(|t| t.set(self.prev));
    }
}

pub(super) fn record_alloc(size: usize) {
    let size = size as u64;
    GLOBAL.allocs.fetch_add(1, Ordering::Relaxed);
    let live = GLOBAL.live_bytes.fetch_add(size, Ordering::Relaxed) + size;
    GLOBAL.peak_bytes.fetch_max(live, Ordering::Relaxed);

    let tag = ACTIVE_TAG.with(|t| t.get());
    let mut tags = TAGS.lock();
    match tags.iter_mut().find(|(name, _)| *name == tag) {
        Some((_, counters)) => {
            counters.allocs += 1;
            counters.bytes += size;
        }
        None => tags.push((tag, TagStats { allocs: 1, bytes: size })),
    }
}

pub(super) fn record_dealloc(size: usize) {
    GLOBAL.deallocs.fetch_add(1, Ordering::Relaxed);
    GLOBAL.live_bytes.fetch_sub(size as u64, Ordering::Relaxed);
}

/// Current global allocation counters.
pub fn stats() -> AllocStats {
    AllocStats {
        allocs: GLOBAL.allocs.load(Ordering::Relaxed),
        deallocs: GLOBAL.deallocs.load(Ordering::Relaxed),
        live_bytes: GLOBAL.live_bytes.load(Ordering::Relaxed),
        peak_bytes: GLOBAL.peak_bytes.load(Ordering::Relaxed),
    }
}

/// Lifetime totals recorded against `tag`, if anything allocated under it.
pub fn tag_stats(tag: &str) -> Option<TagStats> {
    TAGS.lock()
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, counters)| *counters)
}
