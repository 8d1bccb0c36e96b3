use core::alloc::Layout;
use core::{
    cmp, fmt,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    mem::{self, ManuallyDrop},
    ops::{Deref, DerefMut, Index, IndexMut},
    ptr::{self, NonNull},
    slice::{self, SliceIndex},
};

use crate::alloc::{infallible, Mallocator, RawAllocator, ReserveError};

/// Raw capacity-managed buffer behind [`DynArray`].
///
/// Owns `cap` uninitialized slots; which of them hold live values is the
/// owning container's business. The buffer only ever grows, relocating the
/// live prefix into the new allocation and releasing the old one.
pub(crate) struct RawBuffer<T, A: RawAllocator> {
    ptr: NonNull<T>,
    cap: usize,
    alloc: A,
}

impl<T, A: RawAllocator> RawBuffer<T, A> {
    /// Floor for implicit growth. Tiny buffers churn the allocator for no
    /// benefit, so the first expansion lands directly on 16 slots.
    const MIN_CAP: usize = 16;

    fn new(alloc: A) -> Self {
        Self { ptr: NonNull::dangling(), cap: 0, alloc }
    }

    fn capacity(&self) -> usize {
        if mem::size_of::<T>() == 0 {
            usize::MAX
        } else {
            self.cap
        }
    }

    fn needs_to_grow(&self, len: usize, additional: usize) -> bool {
        additional > self.capacity().wrapping_sub(len)
    }

    fn array_layout(cap: usize) -> Result<Layout, ReserveError> {
        Layout::array::<T>(cap).map_err(|_| ReserveError::CapacityOverflow)
    }

    /// 1.5x growth with a floor of [`Self::MIN_CAP`]: slower run-away than
    /// doubling while still amortizing appends to O(1).
    fn grow_amortized(&mut self, len: usize, additional: usize) -> Result<(), ReserveError> {
        debug_assert!(additional > 0);

        if mem::size_of::<T>() == 0 {
            // Capacity is reported as usize::MAX for ZSTs; getting here
            // means the container overflowed.
            return Err(ReserveError::CapacityOverflow);
        }

        let required = len.checked_add(additional).ok_or(ReserveError::CapacityOverflow)?;
        let cap = cmp::max(self.cap + self.cap / 2, required);
        let cap = cmp::max(Self::MIN_CAP, cap);

        self.finish_grow(cap, len)
    }

    fn grow_exact(&mut self, len: usize, additional: usize) -> Result<(), ReserveError> {
        if mem::size_of::<T>() == 0 {
            return Err(ReserveError::CapacityOverflow);
        }

        let cap = len.checked_add(additional).ok_or(ReserveError::CapacityOverflow)?;
        if cap <= self.cap {
            return Ok(());
        }

        self.finish_grow(cap, len)
    }

    /// Relocation move-constructs every live element into the new buffer and
    /// then releases the old one; on failure nothing has been touched.
    fn finish_grow(&mut self, new_cap: usize, len: usize) -> Result<(), ReserveError> {
        debug_assert!(new_cap >= len);

        let new_layout = Self::array_layout(new_cap)?;
        let new_ptr = unsafe { self.alloc.alloc(new_layout) }
            .ok_or(ReserveError::AllocFailed { layout: new_layout })?
            .cast::<T>();

        if self.cap != 0 {
            unsafe {
                ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), len);
                self.release();
            }
        }

        self.ptr = new_ptr;
        self.cap = new_cap;
        Ok(())
    }

    /// Reallocate down to exactly `new_cap >= len` slots.
    fn shrink(&mut self, new_cap: usize, len: usize) {
        debug_assert!(new_cap >= len && new_cap < self.cap);

        if mem::size_of::<T>() == 0 {
            return;
        }

        if new_cap == 0 {
            unsafe { self.release() };
            self.ptr = NonNull::dangling();
            self.cap = 0;
            return;
        }

        // The smaller layout was valid as part of the larger one.
        let new_layout = Layout::array::<T>(new_cap).expect("shrink layout");
        let new_ptr = unsafe { self.alloc.alloc(new_layout) };
        let new_ptr = match new_ptr {
            Some(ptr) => ptr.cast::<T>(),
            None => std::alloc::handle_alloc_error(new_layout),
        };

        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), len);
            self.release();
        }
        self.ptr = new_ptr;
        self.cap = new_cap;
    }

    /// Free the current allocation without touching `ptr`/`cap`.
    ///
    /// # Safety
    ///
    /// Live elements must already have been moved out or destroyed.
    unsafe fn release(&mut self) {
        let layout = Layout::array::<T>(self.cap).expect("layout validated at allocation");
        self.alloc.dealloc(self.ptr.cast(), layout);
    }
}

impl<T, A: RawAllocator> Drop for RawBuffer<T, A> {
    fn drop(&mut self) {
        if self.cap != 0 && mem::size_of::<T>() != 0 {
            unsafe { self.release() };
        }
    }
}

/// Contiguous growable array: the foundation the other containers build on.
///
/// Live, constructed values occupy `[0, len)`; slots in `[len, capacity)`
/// are allocated but raw. Implicit growth follows a 1.5x policy with a floor
/// of 16 slots and never shrinks.
pub struct DynArray<T, A: RawAllocator = Mallocator> {
    buf: RawBuffer<T, A>,
    len: usize,
}

impl<T> DynArray<T, Mallocator> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(Mallocator)
    }

    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Mallocator)
    }
}

impl<T, A: RawAllocator> DynArray<T, A> {
    #[inline]
    #[must_use]
    pub fn new_in(alloc: A) -> Self {
        Self { buf: RawBuffer::new(alloc), len: 0 }
    }

    #[must_use]
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let mut arr = Self::new_in(alloc);
        if arr.buf.needs_to_grow(0, capacity) {
            infallible(arr.buf.grow_exact(0, capacity));
        }
        arr
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Ensure room for at least `additional` more elements, growing
    /// amortized (1.5x, floor 16).
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        if self.buf.needs_to_grow(self.len, additional) {
            infallible(self.buf.grow_amortized(self.len, additional));
        }
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), ReserveError> {
        if self.buf.needs_to_grow(self.len, additional) {
            self.buf.grow_amortized(self.len, additional)
        } else {
            Ok(())
        }
    }

    /// Ensure room for exactly `additional` more elements beyond the current
    /// length, without the amortized over-allocation.
    #[inline]
    pub fn reserve_exact(&mut self, additional: usize) {
        if self.buf.needs_to_grow(self.len, additional) {
            infallible(self.buf.grow_exact(self.len, additional));
        }
    }

    pub fn try_reserve_exact(&mut self, additional: usize) -> Result<(), ReserveError> {
        if self.buf.needs_to_grow(self.len, additional) {
            self.buf.grow_exact(self.len, additional)
        } else {
            Ok(())
        }
    }

    /// Grow capacity to at least `total` slots. Never shrinks.
    pub fn reserve_total(&mut self, total: usize) {
        if total > self.capacity() {
            infallible(self.buf.grow_exact(self.len, total - self.len));
        }
    }

    /// Grow capacity by exactly `delta` slots beyond the current capacity.
    pub fn reserve_additional(&mut self, delta: usize) {
        if delta == 0 {
            return;
        }
        let total = self.capacity().checked_add(delta).unwrap_or(usize::MAX);
        self.reserve_total(total);
    }

    pub fn shrink_to_fit(&mut self) {
        if mem::size_of::<T>() != 0 && self.len < self.buf.cap {
            self.buf.shrink(self.len, self.len);
        }
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        if self.len == self.capacity() {
            self.reserve(1);
        }
        unsafe {
            ptr::write(self.buf.ptr.as_ptr().add(self.len), value);
        }
        self.len += 1;
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            unsafe { Some(ptr::read(self.buf.ptr.as_ptr().add(self.len))) }
        }
    }

    /// Insert at `index`, shifting `[index, len)` one slot right. O(n).
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(index <= self.len, "insertion index {index} out of bounds (len {})", self.len);

        if self.len == self.capacity() {
            self.reserve(1);
        }
        unsafe {
            let slot = self.buf.ptr.as_ptr().add(index);
            ptr::copy(slot, slot.add(1), self.len - index);
            ptr::write(slot, value);
        }
        self.len += 1;
    }

    /// Remove the element at `index`, shifting `[index + 1, len)` one slot
    /// left, and return it. O(n).
    pub fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "removal index {index} out of bounds (len {})", self.len);

        unsafe {
            let slot = self.buf.ptr.as_ptr().add(index);
            let value = ptr::read(slot);
            ptr::copy(slot.add(1), slot, self.len - index - 1);
            self.len -= 1;
            value
        }
    }

    /// Remove the element at `index` by swapping the last element into its
    /// place. O(1), does not preserve order.
    pub fn swap_remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "removal index {index} out of bounds (len {})", self.len);

        unsafe {
            let last = ptr::read(self.buf.ptr.as_ptr().add(self.len - 1));
            let slot = self.buf.ptr.as_ptr().add(index);
            self.len -= 1;
            if index == self.len {
                last
            } else {
                mem::replace(&mut *slot, last)
            }
        }
    }

    /// Remove the first element matching the predicate, if any.
    pub fn remove_first_if<F>(&mut self, pred: F) -> Option<T>
    where
        F: FnMut(&T) -> bool,
    {
        let index = self.index_of_by(pred)?;
        Some(self.remove(index))
    }

    /// Replace the element at `index`, dropping the previous value. Returns
    /// false when the index is out of bounds.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        if index < self.len {
            self[index] = value;
            true
        } else {
            false
        }
    }

    /// Index of the first element equal to `value`, or `None`.
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.iter().position(|v| v == value)
    }

    /// Index of the first element matching the predicate, or `None`.
    pub fn index_of_by<F>(&self, pred: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        let mut pred = pred;
        self.iter().position(|v| pred(v))
    }

    pub fn contains_by<F>(&self, pred: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.index_of_by(pred).is_some()
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = self.len - len;
        self.len = len;
        unsafe {
            let begin = self.buf.ptr.as_ptr().add(len);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(begin, tail));
        }
    }

    /// Keep only the elements the predicate approves, preserving order.
    pub fn retain<F>(&mut self, mut pred: F)
    where
        F: FnMut(&T) -> bool,
    {
        let original_len = self.len;
        let data = self.buf.ptr.as_ptr();
        let len_slot: *mut usize = &mut self.len;
        self.len = 0;

        // Guard state is (processed, kept). If the predicate panics, the
        // unprocessed tail is backshifted onto the kept prefix and the length
        // restored, so every remaining element stays reachable and droppable.
        // The element under inspection at the panic is leaked, not dropped.
        let mut cursor = scopeguard::guard((0usize, 0usize), move |(processed, kept)| unsafe {
            let tail = original_len - processed;
            if processed != kept {
                ptr::copy(data.add(processed), data.add(kept), tail);
            }
            *len_slot = kept + tail;
        });

        unsafe {
            while cursor.0 < original_len {
                let index = cursor.0;
                cursor.0 += 1;
                let item = data.add(index);
                if pred(&*item) {
                    if cursor.1 != index {
                        ptr::copy_nonoverlapping(item, data.add(cursor.1), 1);
                    }
                    cursor.1 += 1;
                } else {
                    ptr::drop_in_place(item);
                }
            }
        }
    }

    pub fn resize_with<F>(&mut self, new_len: usize, mut f: F)
    where
        F: FnMut() -> T,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }
        self.reserve(new_len - self.len);
        while self.len < new_len {
            self.push(f());
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.buf.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.ptr.as_ptr()
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.buf.alloc
    }

    /// # Safety
    ///
    /// `new_len <= capacity()` and `[0, new_len)` must hold live values.
    #[inline]
    pub unsafe fn set_len(&mut self, new_len: usize) {
        debug_assert!(new_len <= self.capacity());
        self.len = new_len;
    }
}

impl<T: PartialEq, A: RawAllocator> DynArray<T, A> {
    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }

    /// Remove the first element equal to `value`. Returns whether anything
    /// was removed.
    pub fn remove_value(&mut self, value: &T) -> bool {
        match self.index_of(value) {
            Some(index) => {
                self.remove(index);
                true
            }
            None => false,
        }
    }
}

impl<T: Clone, A: RawAllocator> DynArray<T, A> {
    pub fn resize(&mut self, new_len: usize, value: T) {
        self.resize_with(new_len, || value.clone());
    }

    pub fn extend_from_slice(&mut self, other: &[T]) {
        self.reserve(other.len());
        for value in other {
            self.push(value.clone());
        }
    }
}

impl<T, A: RawAllocator> Drop for DynArray<T, A> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.buf.ptr.as_ptr(), self.len));
        }
        // RawBuffer frees the storage.
    }
}

//------------------------------------------------------------------------------------------------------------------------------

impl<T, A: RawAllocator> Deref for DynArray<T, A> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.buf.ptr.as_ptr(), self.len) }
    }
}

impl<T, A: RawAllocator> DerefMut for DynArray<T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.buf.ptr.as_ptr(), self.len) }
    }
}

impl<T: Clone, A: RawAllocator + Clone> Clone for DynArray<T, A> {
    fn clone(&self) -> Self {
        let mut arr = Self::with_capacity_in(self.len, self.buf.alloc.clone());
        arr.extend_from_slice(self);
        arr
    }
}

impl<T, A: RawAllocator + Default> Default for DynArray<T, A> {
    #[inline]
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: fmt::Debug, A: RawAllocator> fmt::Debug for DynArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

impl<T: Hash, A: RawAllocator> Hash for DynArray<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Hash::hash(self.as_slice(), state)
    }
}

impl<T, A, I> Index<I> for DynArray<T, A>
where
    A: RawAllocator,
    I: SliceIndex<[T]>,
{
    type Output = I::Output;

    #[inline]
    fn index(&self, index: I) -> &Self::Output {
        Index::index(self.as_slice(), index)
    }
}

impl<T, A, I> IndexMut<I> for DynArray<T, A>
where
    A: RawAllocator,
    I: SliceIndex<[T]>,
{
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<T, U: PartialEq<T>, A: RawAllocator, B: RawAllocator> PartialEq<DynArray<T, A>>
    for DynArray<U, B>
{
    fn eq(&self, other: &DynArray<T, A>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: RawAllocator> Eq for DynArray<T, A> {}

impl<T: PartialEq, A: RawAllocator> PartialEq<[T]> for DynArray<T, A> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, A: RawAllocator, const N: usize> PartialEq<[T; N]> for DynArray<T, A> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T, A: RawAllocator> Extend<T> for DynArray<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for value in iter {
            self.push(value);
        }
    }
}

impl<T> FromIterator<T> for DynArray<T, Mallocator> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut arr = Self::new();
        arr.extend(iter);
        arr
    }
}

impl<T: Clone> From<&[T]> for DynArray<T, Mallocator> {
    fn from(values: &[T]) -> Self {
        let mut arr = Self::with_capacity(values.len());
        arr.extend_from_slice(values);
        arr
    }
}

impl<T, const N: usize> From<[T; N]> for DynArray<T, Mallocator> {
    fn from(values: [T; N]) -> Self {
        let mut arr = Self::with_capacity(N);
        arr.extend(values);
        arr
    }
}

//------------------------------------------------------------------------------------------------------------------------------

pub struct IntoIter<T, A: RawAllocator = Mallocator> {
    buf: RawBuffer<T, A>,
    start: usize,
    end: usize,
}

impl<T, A: RawAllocator> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            None
        } else {
            let value = unsafe { ptr::read(self.buf.ptr.as_ptr().add(self.start)) };
            self.start += 1;
            Some(value)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.start;
        (remaining, Some(remaining))
    }
}

impl<T, A: RawAllocator> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            None
        } else {
            self.end -= 1;
            unsafe { Some(ptr::read(self.buf.ptr.as_ptr().add(self.end))) }
        }
    }
}

impl<T, A: RawAllocator> ExactSizeIterator for IntoIter<T, A> {}
impl<T, A: RawAllocator> FusedIterator for IntoIter<T, A> {}

impl<T, A: RawAllocator> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        unsafe {
            let begin = self.buf.ptr.as_ptr().add(self.start);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(begin, self.end - self.start));
        }
    }
}

impl<T, A: RawAllocator> IntoIterator for DynArray<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        let this = ManuallyDrop::new(self);
        let buf = unsafe { ptr::read(&this.buf) };
        IntoIter { buf, start: 0, end: this.len }
    }
}

impl<'a, T, A: RawAllocator> IntoIterator for &'a DynArray<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> slice::Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A: RawAllocator> IntoIterator for &'a mut DynArray<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> slice::IterMut<'a, T> {
        self.iter_mut()
    }
}

unsafe impl<T: Send, A: RawAllocator + Send> Send for DynArray<T, A> {}
unsafe impl<T: Sync, A: RawAllocator + Sync> Sync for DynArray<T, A> {}

#[macro_export]
macro_rules! dynarr {
    () => {
        $crate::collections::DynArray::new()
    };
    ($($val:expr),* $(,)?) => {
        {
            let mut arr = $crate::collections::DynArray::new();
            $(
                arr.push($val);
            )*
            arr
        }
    }
}

//------------------------------------------------------------------------------------------------------------------------------

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
    fn growth_policy_16_then_24() {
        let mut arr = DynArray::new();
        assert_eq!(arr.capacity(), 0);

        for i in 0..16 {
            arr.push(i);
        }
        assert_eq!(arr.capacity(), 16);

        arr.push(16);
        assert_eq!(arr.capacity(), 24);
        assert_eq!(arr.len(), 17);

        for (i, v) in arr.iter().enumerate() {
            assert_eq!(i as i32, *v);
        }
    }

    #[test]
    fn reserve_total_and_additional() {
        let mut arr = DynArray::<u32>::new();
        arr.reserve_total(10);
        assert_eq!(arr.capacity(), 10);

        // never shrinks
        arr.reserve_total(4);
        assert_eq!(arr.capacity(), 10);

        arr.reserve_additional(6);
        assert_eq!(arr.capacity(), 16);
    }

    #[test]
    fn remove_shifts_left() {
        let mut arr: DynArray<i32> = (0..10).collect();
        assert_eq!(arr.remove(3), 3);
        assert_eq!(arr.len(), 9);
        assert_eq!(arr.as_slice(), &[0, 1, 2, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn remove_drops_exactly_once() {
        let drops = Cell::new(0);
        let mut arr = DynArray::new();
        for _ in 0..4 {
            arr.push(Probe(&drops));
        }

        drop(arr.remove(1));
        assert_eq!(drops.get(), 1);

        drop(arr);
        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn insert_shifts_right() {
        let mut arr = dynarr![1, 2, 4, 5];
        arr.insert(2, 3);
        assert_eq!(arr.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn insert_past_len_panics() {
        let mut arr = dynarr![1];
        arr.insert(3, 2);
    }

    #[test]
    fn find_and_sentinel() {
        let arr = dynarr![10, 20, 30];
        assert_eq!(arr.index_of(&20), Some(1));
        assert_eq!(arr.index_of(&99), None);
        assert!(arr.contains(&30));
        assert_eq!(arr.index_of_by(|v| *v > 15), Some(1));
    }

    #[test]
    fn retain_keeps_order() {
        let mut arr: DynArray<i32> = (0..10).collect();
        arr.retain(|v| v % 2 == 0);
        assert_eq!(arr.as_slice(), &[0, 2, 4, 6, 8]);
    }

    #[test]
    fn retain_drops_rejected() {
        let drops = Cell::new(0);
        let mut arr = DynArray::new();
        for _ in 0..6 {
            arr.push(Probe(&drops));
        }
        let mut index = 0;
        arr.retain(|_| {
            index += 1;
            index % 2 == 0
        });
        assert_eq!(drops.get(), 3);
        assert_eq!(arr.len(), 3);
    }

    #[test]
    fn into_iter_drops_remainder() {
        let drops = Cell::new(0);
        let mut arr = DynArray::new();
        for _ in 0..5 {
            arr.push(Probe(&drops));
        }

        let mut it = arr.into_iter();
        drop(it.next());
        assert_eq!(drops.get(), 1);
        drop(it);
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn clone_is_deep() {
        let mut a = dynarr![1, 2, 3];
        let b = a.clone();
        a.push(4);
        assert_eq!(b.as_slice(), &[1, 2, 3]);
        assert_eq!(a.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn swap_remove_moves_last() {
        let mut arr = dynarr![1, 2, 3, 4];
        assert_eq!(arr.swap_remove(0), 1);
        assert_eq!(arr.as_slice(), &[4, 2, 3]);
        assert_eq!(arr.swap_remove(2), 3);
        assert_eq!(arr.as_slice(), &[4, 2]);
    }

    #[test]
    fn zero_sized_elements() {
        let mut arr = DynArray::new();
        for _ in 0..100 {
            arr.push(());
        }
        assert_eq!(arr.len(), 100);
        assert_eq!(arr.capacity(), usize::MAX);
        assert_eq!(arr.pop(), Some(()));
        assert_eq!(arr.len(), 99);
    }

    #[test]
    fn try_reserve_overflow() {
        let mut arr = DynArray::<u64>::new();
        assert_eq!(arr.try_reserve(usize::MAX), Err(ReserveError::CapacityOverflow));
    }
}
