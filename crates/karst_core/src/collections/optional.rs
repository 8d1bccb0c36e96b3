use core::{fmt, mem::MaybeUninit};

use static_assertions::const_assert;

/// Tag value for constructing or assigning an empty [`Optional`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Nothing;

/// A value that may or may not be present, with in-place storage.
///
/// Unlike `Option`, the payload lives in a `MaybeUninit` slot next to an
/// explicit flag, so `emplace` can construct directly into the container and
/// accessors can hand out stable references without moving the payload.
pub struct Optional<T> {
    storage: MaybeUninit<T>,
    set: bool,
}

// Flag plus payload, no niche tricks.
const_assert!(core::mem::size_of::<Optional<u8>>() == 2);

impl<T> Optional<T> {
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self { storage: MaybeUninit::uninit(), set: false }
    }

    #[inline]
    #[must_use]
    pub fn some(value: T) -> Self {
        Self { storage: MaybeUninit::new(value), set: true }
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.set
    }

    /// Construct a new value in place, dropping any previous one, and return
    /// a reference to it.
    pub fn emplace(&mut self, value: T) -> &mut T {
        self.reset();
        self.storage.write(value);
        self.set = true;
        unsafe { self.storage.assume_init_mut() }
    }

    /// # Panics
    ///
    /// Panics when no value is set.
    #[inline]
    pub fn value(&self) -> &T {
        assert!(self.set, "no value set");
        unsafe { self.storage.assume_init_ref() }
    }

    /// # Panics
    ///
    /// Panics when no value is set.
    #[inline]
    pub fn value_mut(&mut self) -> &mut T {
        assert!(self.set, "no value set");
        unsafe { self.storage.assume_init_mut() }
    }

    #[inline]
    pub fn as_ref(&self) -> Option<&T> {
        if self.set {
            Some(unsafe { self.storage.assume_init_ref() })
        } else {
            None
        }
    }

    #[inline]
    pub fn as_mut(&mut self) -> Option<&mut T> {
        if self.set {
            Some(unsafe { self.storage.assume_init_mut() })
        } else {
            None
        }
    }

    pub fn value_or(&self, default: T) -> T
    where
        T: Clone,
    {
        match self.as_ref() {
            Some(v) => v.clone(),
            None => default,
        }
    }

    /// Move the value out, leaving the container empty.
    pub fn take(&mut self) -> Option<T> {
        if self.set {
            self.set = false;
            Some(unsafe { self.storage.assume_init_read() })
        } else {
            None
        }
    }

    /// Drop the contained value, if any.
    pub fn reset(&mut self) {
        if self.set {
            self.set = false;
            unsafe { self.storage.assume_init_drop() };
        }
    }

    /// # Panics
    ///
    /// Panics when no value is set.
    pub fn into_value(mut self) -> T {
        match self.take() {
            Some(v) => v,
            None => panic!("no value set"),
        }
    }
}

impl<T> Drop for Optional<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> Default for Optional<T> {
    #[inline]
    fn default() -> Self {
        Self::none()
    }
}

impl<T: Clone> Clone for Optional<T> {
    fn clone(&self) -> Self {
        match self.as_ref() {
            Some(v) => Self::some(v.clone()),
            None => Self::none(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Optional<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_ref() {
            Some(v) => f.debug_tuple("Optional").field(v).finish(),
            None => f.write_str("Optional(Nothing)"),
        }
    }
}

impl<T: PartialEq> PartialEq for Optional<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_ref() == other.as_ref()
    }
}

impl<T: Eq> Eq for Optional<T> {}

impl<T> From<T> for Optional<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self::some(value)
    }
}

impl<T> From<Nothing> for Optional<T> {
    #[inline]
    fn from(_: Nothing) -> Self {
        Self::none()
    }
}

impl<T> From<Option<T>> for Optional<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::some(v),
            None => Self::none(),
        }
    }
}

impl<T> From<Optional<T>> for Option<T> {
    fn from(mut value: Optional<T>) -> Self {
        value.take()
    }
}

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
    fn starts_empty() {
        let opt = Optional::<i32>::none();
        assert!(!opt.is_set());
        assert_eq!(opt.as_ref(), None);
    }

    #[test]
    fn set_and_read() {
        let mut opt = Optional::some(5);
        assert!(opt.is_set());
        assert_eq!(*opt.value(), 5);
        *opt.value_mut() = 7;
        assert_eq!(*opt.value(), 7);
    }

    #[test]
    #[should_panic(expected = "no value set")]
    fn value_on_empty_panics() {
        let opt = Optional::<i32>::none();
        let _ = opt.value();
    }

    #[test]
    fn emplace_replaces_and_drops_old() {
        let drops = Cell::new(0);
        let mut opt = Optional::some(Probe(&drops));
        opt.emplace(Probe(&drops));
        assert_eq!(drops.get(), 1);
        opt.reset();
        assert_eq!(drops.get(), 2);
        opt.reset();
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn take_leaves_empty() {
        let drops = Cell::new(0);
        let mut opt = Optional::some(Probe(&drops));
        let taken = opt.take();
        assert!(!opt.is_set());
        assert_eq!(drops.get(), 0);
        drop(taken);
        assert_eq!(drops.get(), 1);
        drop(opt);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn drop_runs_once() {
        let drops = Cell::new(0);
        {
            let _opt = Optional::some(Probe(&drops));
        }
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn conversions() {
        let opt: Optional<i32> = 3.into();
        assert_eq!(*opt.value(), 3);

        let empty: Optional<i32> = Nothing.into();
        assert!(!empty.is_set());

        let back: Option<i32> = opt.into();
        assert_eq!(back, Some(3));
    }

    #[test]
    fn value_or_default() {
        let opt = Optional::some(4);
        assert_eq!(opt.value_or(9), 4);
        let empty = Optional::<i32>::none();
        assert_eq!(empty.value_or(9), 9);
    }
}
