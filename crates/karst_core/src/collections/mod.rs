//! In-house container types.
//!
//! These replace their `std` counterparts throughout the codebase so that
//! growth policies and allocation behavior stay under our control.

mod dyn_array;
mod hash_map;
mod linked_list;
mod optional;
mod sorted_map;

pub use dyn_array::{DynArray, IntoIter as DynArrayIntoIter};
pub use hash_map::HashMap;
pub use linked_list::LinkedList;
pub use optional::{Nothing, Optional};
pub use sorted_map::{Comparator, NaturalOrder, SortedMap};

/// A key and its associated value, stored together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> KeyValue<K, V> {
    #[inline]
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}
