use core::{
    fmt,
    hash::{BuildHasher, Hash, Hasher},
};

use crate::alloc::{Mallocator, RawAllocator};
use crate::collections::{DynArray, KeyValue};
use crate::hash::FnvBuildHasher;

/// Open-addressing hash map over three parallel arrays.
///
/// `hashes[i]` is the (nonzero) hash of the occupant of slot `i`, or 0 for a
/// vacant slot. `buckets[i]` holds the occupant's pair. `keys` records every
/// live key in insertion order and doubles as the count; iteration walks it
/// and re-probes, so iteration order is insertion order rather than slot
/// order.
///
/// Collisions resolve by linear probing, and removal backshifts the
/// displaced run into the hole, so a probe can always stop at the first
/// vacant slot and no tombstones exist. The table rehashes to twice its
/// size when an insert would push the load factor past 3/4.
pub struct HashMap<K, V, S = FnvBuildHasher, A: RawAllocator + Clone = Mallocator> {
    hashes: DynArray<u64, A>,
    buckets: DynArray<Option<KeyValue<K, V>>, A>,
    keys: DynArray<K, A>,
    hasher: S,
}

/// Slot count of the first allocated table.
const INITIAL_BUCKETS: usize = 16;

/// Stand-in for keys whose real hash is 0, since 0 marks a vacant slot.
const ZERO_HASH_SUBSTITUTE: u64 = 0x9E37_79B9_7F4A_7C15;

impl<K: Hash + Eq + Clone, V> HashMap<K, V, FnvBuildHasher, Mallocator> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(FnvBuildHasher::default())
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher> HashMap<K, V, S, Mallocator> {
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_in(hasher, Mallocator)
    }
}

impl<K, V, S, A> HashMap<K, V, S, A>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
    A: RawAllocator + Clone,
{
    #[must_use]
    pub fn with_hasher_in(hasher: S, alloc: A) -> Self {
        Self {
            hashes: DynArray::new_in(alloc.clone()),
            buckets: DynArray::new_in(alloc.clone()),
            keys: DynArray::new_in(alloc),
            hasher,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Current slot count of the table.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Insert or overwrite, returning the previous value for an existing
    /// key. Two distinct keys whose hashes collide both stay resident; the
    /// later one probes forward to the next vacant slot.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_of(&key);

        if self.bucket_count() != 0 {
            if let Ok(slot) = self.probe(hash, &key) {
                let pair = self.buckets[slot].as_mut().unwrap_or_else(|| {
                    unreachable!("occupied slot with empty bucket")
                });
                return Some(core::mem::replace(&mut pair.value, value));
            }
        }

        // 3/4 load factor, checked against the table size the new entry
        // would see.
        if (self.keys.len() + 1) * 4 > self.bucket_count() * 3 {
            let new_cap = core::cmp::max(INITIAL_BUCKETS, self.bucket_count() * 2);
            self.rehash(new_cap);
        }

        let slot = match self.probe(hash, &key) {
            Ok(_) => unreachable!("key vanished across rehash"),
            Err(vacant) => vacant,
        };
        self.hashes[slot] = hash;
        self.buckets[slot] = Some(KeyValue::new(key.clone(), value));
        self.keys.push(key);
        None
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let slot = self.find_slot(key)?;
        self.buckets[slot].as_ref().map(|pair| &pair.value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let slot = self.find_slot(key)?;
        self.buckets[slot].as_mut().map(|pair| &mut pair.value)
    }

    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let slot = self.find_slot(key)?;
        self.buckets[slot].as_ref().map(|pair| (&pair.key, &pair.value))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find_slot(key).is_some()
    }

    /// Remove a key, backshifting the displaced run so later probes for the
    /// run's other members still terminate correctly.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.find_slot(key)?;
        let pair = self.buckets[slot].take().unwrap_or_else(|| {
            unreachable!("occupied slot with empty bucket")
        });
        self.hashes[slot] = 0;
        self.backward_shift(slot);
        self.keys.remove_value(key);
        Some(pair.value)
    }

    pub fn clear(&mut self) {
        for hash in self.hashes.iter_mut() {
            *hash = 0;
        }
        for bucket in self.buckets.iter_mut() {
            *bucket = None;
        }
        self.keys.clear();
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V, S, A> {
        Iter { map: self, index: 0 }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    fn hash_of(&self, key: &K) -> u64 {
        let mut hasher = self.hasher.build_hasher();
        key.hash(&mut hasher);
        match hasher.finish() {
            0 => ZERO_HASH_SUBSTITUTE,
            h => h,
        }
    }

    /// Linear probe from the hash's home slot. `Ok(slot)` holds the key,
    /// `Err(slot)` is the first vacant slot of the probe run.
    ///
    /// Relies on the table never being full (load factor < 1), so the scan
    /// always meets a vacant slot.
    fn probe(&self, hash: u64, key: &K) -> Result<usize, usize> {
        let cap = self.bucket_count();
        debug_assert!(cap.is_power_of_two());

        let mut slot = (hash as usize) & (cap - 1);
        loop {
            let slot_hash = self.hashes[slot];
            if slot_hash == 0 {
                return Err(slot);
            }
            if slot_hash == hash {
                if let Some(pair) = &self.buckets[slot] {
                    if pair.key == *key {
                        return Ok(slot);
                    }
                }
            }
            slot = (slot + 1) & (cap - 1);
        }
    }

    fn find_slot(&self, key: &K) -> Option<usize> {
        if self.bucket_count() == 0 {
            return None;
        }
        self.probe(self.hash_of(key), key).ok()
    }

    /// Close the hole left by a removal: walk the probe run after `hole`
    /// and pull back every entry whose home slot is at or before the hole,
    /// leaving the vacated trailing slot truly empty.
    fn backward_shift(&mut self, mut hole: usize) {
        let cap = self.bucket_count();
        let mut slot = (hole + 1) & (cap - 1);
        loop {
            let slot_hash = self.hashes[slot];
            if slot_hash == 0 {
                return;
            }
            let home = (slot_hash as usize) & (cap - 1);
            // Distance the occupant has already probed vs. the distance the
            // hole is behind it. The occupant may move back only if its home
            // lies at or before the hole along the run.
            let probed = (slot + cap - home) & (cap - 1);
            let gap = (slot + cap - hole) & (cap - 1);
            if probed >= gap {
                self.hashes[hole] = slot_hash;
                self.buckets[hole] = self.buckets[slot].take();
                self.hashes[slot] = 0;
                hole = slot;
            }
            slot = (slot + 1) & (cap - 1);
        }
    }

    /// Grow (or establish) the table and reinsert every live entry.
    fn rehash(&mut self, new_cap: usize) {
        debug_assert!(new_cap.is_power_of_two() && new_cap > self.bucket_count());

        let mut fresh = DynArray::with_capacity_in(new_cap, self.buckets.allocator().clone());
        fresh.resize_with(new_cap, || None);
        let old_buckets = core::mem::replace(&mut self.buckets, fresh);
        self.hashes.clear();
        self.hashes.resize(new_cap, 0);

        for pair in old_buckets.into_iter().flatten() {
            let hash = self.hash_of(&pair.key);
            let new_slot = match self.probe(hash, &pair.key) {
                Ok(_) => unreachable!("duplicate key while rehashing"),
                Err(vacant) => vacant,
            };
            self.hashes[new_slot] = hash;
            self.buckets[new_slot] = Some(pair);
        }
    }
}

impl<K: Hash + Eq + Clone, V> Default for HashMap<K, V, FnvBuildHasher, Mallocator> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, A> fmt::Debug for HashMap<K, V, S, A>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
    A: RawAllocator + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, S, A> core::ops::Index<&'a K> for HashMap<K, V, S, A>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
    A: RawAllocator + Clone,
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

impl<K, V, S, A> Extend<(K, V)> for HashMap<K, V, S, A>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
    A: RawAllocator + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Hash + Eq + Clone, V> FromIterator<(K, V)> for HashMap<K, V, FnvBuildHasher, Mallocator> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// Insertion-order iterator. Walks the recorded key order and probes the
/// table for each key's current slot.
pub struct Iter<'a, K, V, S, A: RawAllocator + Clone> {
    map: &'a HashMap<K, V, S, A>,
    index: usize,
}

impl<'a, K, V, S, A> Iterator for Iter<'a, K, V, S, A>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
    A: RawAllocator + Clone,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        let key = self.map.keys.get(self.index)?;
        self.index += 1;
        self.map.get_key_value(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.map.keys.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a, K, V, S, A> IntoIterator for &'a HashMap<K, V, S, A>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
    A: RawAllocator + Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
