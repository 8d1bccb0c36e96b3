use core::{cmp::Ordering, fmt};

use crate::alloc::{Mallocator, RawAllocator};
use crate::collections::{DynArray, KeyValue};

/// Ordering policy for [`SortedMap`] keys.
pub trait Comparator<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// Comparator that defers to the key's own `Ord`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<T: Ord> Comparator<T> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Association sorted by key, backed by a single [`DynArray`] of pairs.
///
/// The backing array is fully sorted after every insert, so lookups are a
/// binary search. Insert is O(n log n) from the re-sort; this trades insert
/// cost for a flat, cache-friendly layout and cheap ordered iteration, which
/// suits read-mostly tables.
///
/// Invariant: `entries` is sorted ascending by `cmp` at every public-API
/// boundary, with no two keys comparing equal.
pub struct SortedMap<K, V, C = NaturalOrder, A: RawAllocator = Mallocator> {
    entries: DynArray<KeyValue<K, V>, A>,
    cmp: C,
}

impl<K: Ord, V> SortedMap<K, V, NaturalOrder, Mallocator> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K, V, C: Comparator<K>> SortedMap<K, V, C, Mallocator> {
    #[inline]
    #[must_use]
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_comparator_in(cmp, Mallocator)
    }
}

impl<K, V, C: Comparator<K>, A: RawAllocator> SortedMap<K, V, C, A> {
    #[must_use]
    pub fn with_comparator_in(cmp: C, alloc: A) -> Self {
        Self { entries: DynArray::new_in(alloc), cmp }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or overwrite. An existing key keeps its position and only the
    /// value changes; a new key is appended and the whole array re-sorted.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(index) = self.find_index(&key) {
            return Some(core::mem::replace(&mut self.entries[index].value, value));
        }

        self.entries.push(KeyValue::new(key, value));
        let Self { entries, cmp } = self;
        entries.sort_unstable_by(|a, b| cmp.compare(&a.key, &b.key));
        None
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.find_index(key).map(|i| &self.entries[i].value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.find_index(key).map(|i| &mut self.entries[i].value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find_index(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let index = self.find_index(key)?;
        Some(self.entries.remove(index).value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// First entry in comparator order.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.entries.first().map(|kv| (&kv.key, &kv.value))
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.entries.last().map(|kv| (&kv.key, &kv.value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|kv| (&kv.key, &kv.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|kv| &kv.key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|kv| &kv.value)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.iter_mut().map(|kv| &mut kv.value)
    }

    /// Binary search over the sorted backing array.
    fn find_index(&self, key: &K) -> Option<usize> {
        let mut lo = 0usize;
        let mut hi = self.entries.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.cmp.compare(&self.entries[mid].key, key) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Some(mid),
            }
        }
        None
    }
}

impl<K: Ord, V> Default for SortedMap<K, V, NaturalOrder, Mallocator> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, A> fmt::Debug for SortedMap<K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    C: Comparator<K>,
    A: RawAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C: Comparator<K>, A: RawAllocator> core::ops::Index<&'a K>
    for SortedMap<K, V, C, A>
{
    type Output = V;

    /// # Panics
    ///
    /// Panics when the key is not present.
    fn index(&self, key: &'a K) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("key not found"),
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for SortedMap<K, V, NaturalOrder, Mallocator> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, C: Comparator<K>, A: RawAllocator> Extend<(K, V)> for SortedMap<K, V, C, A> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_sorted<K: Ord + Clone + core::fmt::Debug, V>(map: &SortedMap<K, V>) {
        let keys: Vec<K> = map.keys().cloned().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn inserts_stay_sorted() {
        let mut map = SortedMap::new();
        for key in [5, 1, 9, 3, 7, 2, 8] {
            map.insert(key, key * 10);
            assert_sorted(&map);
        }
        assert_eq!(map.len(), 7);
        assert_eq!(map.first(), Some((&1, &10)));
        assert_eq!(map.last(), Some((&9, &90)));
    }

    #[test]
    fn lookup_hits_and_misses() {
        let map: SortedMap<i32, i32> = (0..20).map(|k| (k * 2, k)).collect();
        assert_eq!(map.get(&6), Some(&3));
        assert_eq!(map.get(&7), None);
        assert!(map.contains_key(&38));
        assert!(!map.contains_key(&39));
    }

    #[test]
    fn insert_overwrites_existing() {
        let mut map = SortedMap::new();
        assert_eq!(map.insert(1, "a"), None);
        assert_eq!(map.insert(1, "b"), Some("a"));
        assert_eq!(map.len(), 1);
        assert_eq!(map[&1], "b");
    }

    #[test]
    fn remove_keeps_order() {
        let mut map: SortedMap<i32, i32> = (0..10).map(|k| (k, k)).collect();
        assert_eq!(map.remove(&4), Some(4));
        assert_eq!(map.remove(&4), None);
        assert_sorted(&map);
        assert_eq!(map.len(), 9);
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn index_missing_panics() {
        let map = SortedMap::<i32, i32>::new();
        let _ = map[&1];
    }

    #[test]
    fn custom_comparator_reverses() {
        let mut map = SortedMap::with_comparator(|a: &i32, b: &i32| b.cmp(a));
        for key in [1, 3, 2] {
            map.insert(key, ());
        }
        let keys: Vec<i32> = map.keys().copied().collect();
        assert_eq!(keys, [3, 2, 1]);
        assert_eq!(map.get(&2), Some(&()));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut map = SortedMap::new();
        map.insert("k", 1);
        *map.get_mut(&"k").unwrap() += 10;
        assert_eq!(map[&"k"], 11);
    }
}
