use core::{
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
    ptr::NonNull,
};

/// Destruction policy for [`Unique`].
pub trait Deleter<T> {
    /// # Safety
    ///
    /// `ptr` must point at a live value previously handed to the owning
    /// `Unique`, and must not be used afterwards.
    unsafe fn delete(&mut self, ptr: NonNull<T>);
}

/// Deleter for values allocated through `Box`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDeleter;

impl<T> Deleter<T> for DefaultDeleter {
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        drop(Box::from_raw(ptr.as_ptr()));
    }
}

/// Sole-ownership pointer with a pluggable deleter.
///
/// May be empty. Dropping a set pointer runs the deleter exactly once;
/// `release` hands the raw pointer back without running it.
pub struct Unique<T, D: Deleter<T> = DefaultDeleter> {
    ptr: Option<NonNull<T>>,
    deleter: D,
    phantom: PhantomData<T>,
}

impl<T> Unique<T, DefaultDeleter> {
    /// Allocate a value and take ownership of it.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    #[must_use]
    pub fn from_box(value: Box<T>) -> Self {
        let raw = NonNull::new(Box::into_raw(value)).unwrap_or_else(|| {
            unreachable!("Box::into_raw returned null")
        });
        unsafe { Self::from_raw_in(raw, DefaultDeleter) }
    }

    /// Move the value out, consuming the pointer.
    ///
    /// # Panics
    ///
    /// Panics when empty.
    pub fn take(mut self) -> T {
        match self.ptr.take() {
            Some(ptr) => *unsafe { Box::from_raw(ptr.as_ptr()) },
            None => panic!("take on an empty Unique"),
        }
    }
}

impl<T, D: Deleter<T>> Unique<T, D> {
    /// An empty pointer carrying its deleter.
    #[must_use]
    pub fn empty(deleter: D) -> Self {
        Self { ptr: None, deleter, phantom: PhantomData }
    }

    /// Adopt a raw pointer with a specific deleter.
    ///
    /// # Safety
    ///
    /// `ptr` must point at a live value that `deleter` knows how to destroy,
    /// and nothing else may own or free it.
    #[must_use]
    pub unsafe fn from_raw_in(ptr: NonNull<T>, deleter: D) -> Self {
        Self { ptr: Some(ptr), deleter, phantom: PhantomData }
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.ptr.is_some()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        match self.ptr {
            Some(ptr) => ptr.as_ptr(),
            None => core::ptr::null(),
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.ptr.map(|p| unsafe { &*p.as_ptr() })
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.ptr.map(|p| unsafe { &mut *p.as_ptr() })
    }

    /// Give up ownership without running the deleter.
    pub fn release(&mut self) -> Option<NonNull<T>> {
        self.ptr.take()
    }

    /// Destroy the current value (if any) and optionally adopt a new
    /// pointer.
    ///
    /// # Safety
    ///
    /// Same contract as [`Unique::from_raw_in`] for `new_ptr`.
    pub unsafe fn reset(&mut self, new_ptr: Option<NonNull<T>>) {
        if let Some(old) = self.ptr.take() {
            self.deleter.delete(old);
        }
        self.ptr = new_ptr;
    }

    pub fn deleter(&self) -> &D {
        &self.deleter
    }
}

impl<T, D: Deleter<T>> Drop for Unique<T, D> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            unsafe { self.deleter.delete(ptr) };
        }
    }
}

impl<T, D: Deleter<T>> Deref for Unique<T, D> {
    type Target = T;

    /// # Panics
    ///
    /// Panics when empty.
    fn deref(&self) -> &T {
        match self.get() {
            Some(v) => v,
            None => panic!("deref of an empty Unique"),
        }
    }
}

impl<T, D: Deleter<T>> DerefMut for Unique<T, D> {
    fn deref_mut(&mut self) -> &mut T {
        match self.get_mut() {
            Some(v) => v,
            None => panic!("deref of an empty Unique"),
        }
    }
}

impl<T: fmt::Debug, D: Deleter<T>> fmt::Debug for Unique<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(v) => f.debug_tuple("Unique").field(v).finish(),
            None => f.write_str("Unique(empty)"),
        }
    }
}

impl<T> Default for Unique<T, DefaultDeleter> {
    fn default() -> Self {
        Self::empty(DefaultDeleter)
    }
}

impl<T> From<Box<T>> for Unique<T, DefaultDeleter> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

unsafe impl<T: Send, D: Deleter<T> + Send> Send for Unique<T, D> {}
unsafe impl<T: Sync, D: Deleter<T> + Sync> Sync for Unique<T, D> {}
