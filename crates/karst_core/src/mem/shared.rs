use core::alloc::Layout;
use core::{
    cell::{Cell, UnsafeCell},
    fmt,
    marker::PhantomData,
    mem::ManuallyDrop,
    ops::Deref,
    ptr::NonNull,
    sync::atomic::{fence, AtomicUsize, Ordering},
};

use static_assertions::assert_eq_size;

use crate::alloc::{Mallocator, RawAllocator};

/// Counting strategy for [`Shared`].
///
/// Implementations keep a strong count and a weak count. The weak count is
/// "collective": all strong handles together hold one weak reference, which
/// is released when the last strong handle drops. This means the control
/// block is freed by whichever side drops the weak count to zero, and there
/// is no window where a weak handle can observe a freed block.
pub trait RefCount {
    /// Counts for a freshly created strong handle: strong 1, weak 1 (the
    /// collective reference).
    fn new() -> Self;

    fn inc_strong(&self);
    /// Returns true when this call released the last strong reference.
    fn dec_strong(&self) -> bool;
    /// Increment the strong count only if it is nonzero. Used by weak
    /// upgrade.
    fn try_inc_strong(&self) -> bool;
    /// Atomically claim a strong count of exactly 1, dropping it to 0.
    /// Used by try_unwrap.
    fn try_take_strong(&self) -> bool;

    fn inc_weak(&self);
    /// Returns true when this call released the last weak reference.
    fn dec_weak(&self) -> bool;

    fn strong(&self) -> usize;
    fn weak(&self) -> usize;
}

/// Plain cell-based counting for single-threaded sharing.
pub struct LocalCount {
    strong: Cell<usize>,
    weak: Cell<usize>,
}

impl RefCount for LocalCount {
    fn new() -> Self {
        Self { strong: Cell::new(1), weak: Cell::new(1) }
    }

    #[inline]
    fn inc_strong(&self) {
        self.strong.set(self.strong.get() + 1);
    }

    #[inline]
    fn dec_strong(&self) -> bool {
        let n = self.strong.get() - 1;
        self.strong.set(n);
        n == 0
    }

    #[inline]
    fn try_inc_strong(&self) -> bool {
        let n = self.strong.get();
        if n == 0 {
            false
        } else {
            self.strong.set(n + 1);
            true
        }
    }

    #[inline]
    fn try_take_strong(&self) -> bool {
        if self.strong.get() == 1 {
            self.strong.set(0);
            true
        } else {
            false
        }
    }

    #[inline]
    fn inc_weak(&self) {
        self.weak.set(self.weak.get() + 1);
    }

    #[inline]
    fn dec_weak(&self) -> bool {
        let n = self.weak.get() - 1;
        self.weak.set(n);
        n == 0
    }

    #[inline]
    fn strong(&self) -> usize {
        self.strong.get()
    }

    #[inline]
    fn weak(&self) -> usize {
        self.weak.get()
    }
}

/// Atomic counting for cross-thread sharing.
///
/// Increments are relaxed (a new reference can only be created through an
/// existing one), decrements release, and the thread that observes the count
/// reach zero takes an acquire fence before destroying, so every earlier use
/// of the value happens-before its destruction.
pub struct AtomicCount {
    strong: AtomicUsize,
    weak: AtomicUsize,
}

impl RefCount for AtomicCount {
    fn new() -> Self {
        Self { strong: AtomicUsize::new(1), weak: AtomicUsize::new(1) }
    }

    #[inline]
    fn inc_strong(&self) {
        self.strong.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn dec_strong(&self) -> bool {
        if self.strong.fetch_sub(1, Ordering::Release) == 1 {
            fence(Ordering::Acquire);
            true
        } else {
            false
        }
    }

    fn try_inc_strong(&self) -> bool {
        let mut n = self.strong.load(Ordering::Relaxed);
        loop {
            if n == 0 {
                return false;
            }
            match self.strong.compare_exchange_weak(
                n,
                n + 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(current) => n = current,
            }
        }
    }

    #[inline]
    fn try_take_strong(&self) -> bool {
        if self
            .strong
            .compare_exchange(1, 0, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            fence(Ordering::Acquire);
            true
        } else {
            false
        }
    }

    #[inline]
    fn inc_weak(&self) {
        self.weak.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn dec_weak(&self) -> bool {
        if self.weak.fetch_sub(1, Ordering::Release) == 1 {
            fence(Ordering::Acquire);
            true
        } else {
            false
        }
    }

    #[inline]
    fn strong(&self) -> usize {
        self.strong.load(Ordering::Acquire)
    }

    #[inline]
    fn weak(&self) -> usize {
        self.weak.load(Ordering::Acquire)
    }
}

/// Where the shared value lives relative to its control block.
///
/// `Inline` colocates the value with the counts in one allocation.
/// `Boxed` keeps the value in its own heap allocation and the control block
/// points at it; adopting an existing `Box` takes this form since the value
/// cannot be moved next to the counts without reallocating.
/// `Dead` is the post-destruction state, reached when the last strong handle
/// drops while weak handles still pin the control block.
enum ObjSlot<T> {
    Inline(ManuallyDrop<T>),
    Boxed(NonNull<T>),
    Dead,
}

struct RcBox<T, C> {
    counts: C,
    slot: UnsafeCell<ObjSlot<T>>,
}

fn alloc_block<T, C: RefCount>(slot: ObjSlot<T>) -> NonNull<RcBox<T, C>> {
    let layout = Layout::new::<RcBox<T, C>>();
    let ptr = unsafe { Mallocator.alloc(layout) };
    let ptr = match ptr {
        Some(ptr) => ptr.cast::<RcBox<T, C>>(),
        None => std::alloc::handle_alloc_error(layout),
    };
    unsafe {
        ptr.as_ptr().write(RcBox { counts: C::new(), slot: UnsafeCell::new(slot) });
    }
    ptr
}

unsafe fn free_block<T, C: RefCount>(ptr: NonNull<RcBox<T, C>>) {
    debug_assert!(matches!(&*(*ptr.as_ptr()).slot.get(), ObjSlot::Dead));
    core::ptr::drop_in_place(ptr.as_ptr());
    Mallocator.dealloc(ptr.cast(), Layout::new::<RcBox<T, C>>());
}

/// Reference-counted shared ownership of a `T`.
///
/// Generic over the counting strategy; use the [`Rc`]/[`Arc`] aliases. The
/// value is destroyed when the last strong handle drops, the control block
/// when the last handle of either kind drops.
pub struct Shared<T, C: RefCount> {
    ctrl: NonNull<RcBox<T, C>>,
    phantom: PhantomData<RcBox<T, C>>,
}

/// Non-owning observer of a [`Shared`] value.
pub struct Weak<T, C: RefCount> {
    ctrl: NonNull<RcBox<T, C>>,
    phantom: PhantomData<RcBox<T, C>>,
}

/// Single-threaded shared pointer.
pub type Rc<T> = Shared<T, LocalCount>;
/// Weak counterpart of [`Rc`].
pub type RcWeak<T> = Weak<T, LocalCount>;
/// Thread-safe shared pointer.
pub type Arc<T> = Shared<T, AtomicCount>;
/// Weak counterpart of [`Arc`].
pub type ArcWeak<T> = Weak<T, AtomicCount>;

// Handles are a bare pointer to the control block.
assert_eq_size!(Rc<u64>, usize);
assert_eq_size!(Arc<u64>, usize);

impl<T, C: RefCount> Shared<T, C> {
    /// Allocate a control block with the value stored inline next to the
    /// counts.
    #[must_use]
    pub fn new(value: T) -> Self {
        let ctrl = alloc_block(ObjSlot::Inline(ManuallyDrop::new(value)));
        Self { ctrl, phantom: PhantomData }
    }

    /// Adopt an existing boxed value. The control block points at the box's
    /// allocation instead of absorbing the value.
    #[must_use]
    pub fn from_box(value: Box<T>) -> Self {
        let raw = NonNull::new(Box::into_raw(value)).unwrap_or_else(|| {
            unreachable!("Box::into_raw returned null")
        });
        let ctrl = alloc_block(ObjSlot::Boxed(raw));
        Self { ctrl, phantom: PhantomData }
    }

    fn counts(&self) -> &C {
        unsafe { &self.ctrl.as_ref().counts }
    }

    fn value_ptr(&self) -> *const T {
        unsafe {
            match &*self.ctrl.as_ref().slot.get() {
                ObjSlot::Inline(v) => &**v as *const T,
                ObjSlot::Boxed(p) => p.as_ptr(),
                ObjSlot::Dead => unreachable!("strong handle to a destroyed value"),
            }
        }
    }

    pub fn strong_count(&self) -> usize {
        self.counts().strong()
    }

    /// Number of outstanding weak handles. The collective weak reference the
    /// strong handles hold is not counted.
    pub fn weak_count(&self) -> usize {
        self.counts().weak().saturating_sub(1)
    }

    pub fn downgrade(&self) -> Weak<T, C> {
        self.counts().inc_weak();
        Weak { ctrl: self.ctrl, phantom: PhantomData }
    }

    /// Whether two handles share one control block.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.ctrl == other.ctrl
    }

    /// Exclusive access, available only when no other handle of either kind
    /// exists.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.counts().strong() == 1 && self.counts().weak() == 1 {
            unsafe {
                match &mut *self.ctrl.as_ref().slot.get() {
                    ObjSlot::Inline(v) => Some(&mut **v),
                    ObjSlot::Boxed(p) => Some(&mut *p.as_ptr()),
                    ObjSlot::Dead => unreachable!("strong handle to a destroyed value"),
                }
            }
        } else {
            None
        }
    }

    /// Take the value back out if this is the only strong handle.
    pub fn try_unwrap(self) -> Result<T, Self> {
        if !self.counts().try_take_strong() {
            return Err(self);
        }

        let this = ManuallyDrop::new(self);
        unsafe {
            let slot = this.ctrl.as_ref().slot.get();
            let value = match core::mem::replace(&mut *slot, ObjSlot::Dead) {
                ObjSlot::Inline(v) => ManuallyDrop::into_inner(v),
                ObjSlot::Boxed(p) => *Box::from_raw(p.as_ptr()),
                ObjSlot::Dead => unreachable!("strong handle to a destroyed value"),
            };
            if this.counts().dec_weak() {
                free_block(this.ctrl);
            }
            Ok(value)
        }
    }

    /// Destroy the value in place, leaving the slot `Dead`.
    ///
    /// # Safety
    ///
    /// Only after the last strong reference is released.
    unsafe fn destroy_object(&self) {
        let slot = self.ctrl.as_ref().slot.get();
        match core::mem::replace(&mut *slot, ObjSlot::Dead) {
            ObjSlot::Inline(v) => drop(ManuallyDrop::into_inner(v)),
            ObjSlot::Boxed(p) => drop(Box::from_raw(p.as_ptr())),
            ObjSlot::Dead => unreachable!("value destroyed twice"),
        }
    }
}

impl<T, C: RefCount> Deref for Shared<T, C> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        unsafe { &*self.value_ptr() }
    }
}

impl<T, C: RefCount> Clone for Shared<T, C> {
    fn clone(&self) -> Self {
        self.counts().inc_strong();
        Self { ctrl: self.ctrl, phantom: PhantomData }
    }
}

impl<T, C: RefCount> Drop for Shared<T, C> {
    fn drop(&mut self) {
        unsafe {
            if self.counts().dec_strong() {
                self.destroy_object();
                // Last strong handle also releases the collective weak
                // reference.
                if self.counts().dec_weak() {
                    free_block(self.ctrl);
                }
            }
        }
    }
}

impl<T: fmt::Debug, C: RefCount> fmt::Debug for Shared<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: fmt::Display, C: RefCount> fmt::Display for Shared<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<T: PartialEq, C: RefCount> PartialEq for Shared<T, C> {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl<T: Eq, C: RefCount> Eq for Shared<T, C> {}

impl<T, C: RefCount> From<T> for Shared<T, C> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T, C: RefCount> From<Box<T>> for Shared<T, C> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<T, C: RefCount> Weak<T, C> {
    fn counts(&self) -> &C {
        unsafe { &self.ctrl.as_ref().counts }
    }

    /// Try to recover a strong handle. Fails once the value has been
    /// destroyed; a successful upgrade can never observe a dead value.
    pub fn upgrade(&self) -> Option<Shared<T, C>> {
        if self.counts().try_inc_strong() {
            Some(Shared { ctrl: self.ctrl, phantom: PhantomData })
        } else {
            None
        }
    }

    /// Whether the observed value is still alive.
    pub fn is_valid(&self) -> bool {
        self.counts().strong() > 0
    }

    pub fn strong_count(&self) -> usize {
        self.counts().strong()
    }
}

impl<T, C: RefCount> Clone for Weak<T, C> {
    fn clone(&self) -> Self {
        self.counts().inc_weak();
        Self { ctrl: self.ctrl, phantom: PhantomData }
    }
}

impl<T, C: RefCount> Drop for Weak<T, C> {
    fn drop(&mut self) {
        unsafe {
            if self.counts().dec_weak() {
                free_block(self.ctrl);
            }
        }
    }
}

impl<T, C: RefCount> fmt::Debug for Weak<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(Weak)")
    }
}

// The atomic aliases may cross threads; value access requires T: Sync,
// dropping on another thread requires T: Send.
unsafe impl<T: Send + Sync> Send for Shared<T, AtomicCount> {}
unsafe impl<T: Send + Sync> Sync for Shared<T, AtomicCount> {}
unsafe impl<T: Send + Sync> Send for Weak<T, AtomicCount> {}
unsafe impl<T: Send + Sync> Sync for Weak<T, AtomicCount> {}

#[cfg(test)]
mod test {
    use super::*;
    use core::cell::Cell;

    struct Probe<'a>(&'a Cell<u32>);

    impl Drop for Probe<'_> {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn strong_lifecycle() {
        let drops = Cell::new(0);
        let a = Rc::new(Probe(&drops));
        assert_eq!(a.strong_count(), 1);

        let b = a.clone();
        assert_eq!(a.strong_count(), 2);
        assert!(a.ptr_eq(&b));

        drop(b);
        assert_eq!(drops.get(), 0);
        drop(a);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn deref_reads_value() {
        let a = Rc::new(41);
        assert_eq!(*a + 1, 42);
    }

    #[test]
    fn boxed_storage_behaves_like_inline() {
        let drops = Cell::new(0);
        let a = Rc::from_box(Box::new(Probe(&drops)));
        let b = a.clone();
        assert_eq!(a.strong_count(), 2);
        drop(a);
        drop(b);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn weak_upgrade_while_alive() {
        let a = Rc::new(5);
        let w = a.downgrade();
        assert_eq!(a.weak_count(), 1);
        assert!(w.is_valid());

        let b = w.upgrade().unwrap();
        assert_eq!(a.strong_count(), 2);
        assert_eq!(*b, 5);
    }

    #[test]
    fn weak_upgrade_after_death_fails() {
        let drops = Cell::new(0);
        let a = Rc::new(Probe(&drops));
        let w = a.downgrade();

        drop(a);
        assert_eq!(drops.get(), 1);
        assert!(!w.is_valid());
        assert!(w.upgrade().is_none());
    }

    #[test]
    fn weak_outliving_strong_frees_block_last() {
        // The value dies with the last strong handle; the control block
        // must stay readable for the weak handle until it drops too.
        let a = Rc::new(String::from("x"));
        let w1 = a.downgrade();
        let w2 = w1.clone();
        drop(a);

        assert_eq!(w1.strong_count(), 0);
        assert!(w2.upgrade().is_none());
        drop(w1);
        assert!(!w2.is_valid());
    }

    #[test]
    fn get_mut_requires_uniqueness() {
        let mut a = Rc::new(1);
        *a.get_mut().unwrap() = 2;
        assert_eq!(*a, 2);

        let b = a.clone();
        assert!(a.get_mut().is_none());
        drop(b);

        let w = a.downgrade();
        assert!(a.get_mut().is_none());
        drop(w);
        assert!(a.get_mut().is_some());
    }

    #[test]
    fn try_unwrap_inline() {
        let a = Rc::new(7);
        assert_eq!(a.try_unwrap().ok(), Some(7));

        let b = Rc::new(8);
        let c = b.clone();
        let b = b.try_unwrap().unwrap_err();
        assert_eq!(*b, 8);
        drop(c);
    }

    #[test]
    fn try_unwrap_boxed() {
        let a = Rc::from_box(Box::new(9));
        assert_eq!(a.try_unwrap().ok(), Some(9));
    }

    #[test]
    fn try_unwrap_with_outstanding_weak() {
        let a = Rc::new(3);
        let w = a.downgrade();
        let v = a.try_unwrap().unwrap();
        assert_eq!(v, 3);
        assert!(w.upgrade().is_none());
    }

    #[test]
    fn atomic_counts_across_threads() {
        let a = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let a = a.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        a.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(a.strong_count(), 1);
        assert_eq!(a.load(Ordering::Relaxed), 4000);
    }

    #[test]
    fn atomic_weak_upgrade_across_threads() {
        let a = Arc::new(17u64);
        let w = a.downgrade();
        let t = std::thread::spawn(move || w.upgrade().map(|s| *s));
        assert_eq!(t.join().unwrap(), Some(17));
    }
}
