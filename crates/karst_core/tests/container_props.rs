use std::collections::{BTreeMap, VecDeque};

use proptest::prelude::*;

use karst_core::collections::{DynArray, HashMap, LinkedList, SortedMap};

// Model DynArray operations against Vec and assert the contents agree after
// every step.
proptest! {
    #[test]
    fn prop_dyn_array_matches_vec(ops in proptest::collection::vec((0u8..=4u8, any::<u16>()), 1..200) ) {
        let mut arr: DynArray<u16> = DynArray::new();
        let mut model: Vec<u16> = Vec::new();

        for (op, value) in ops {
            match op {
                // Push
                0 => {
                    arr.push(value);
                    model.push(value);
                }
                // Pop
                1 => {
                    prop_assert_eq!(arr.pop(), model.pop());
                }
                // Insert at a position derived from the value
                2 => {
                    let at = (value as usize) % (model.len() + 1);
                    arr.insert(at, value);
                    model.insert(at, value);
                }
                // Remove at a position derived from the value
                3 => {
                    if !model.is_empty() {
                        let at = (value as usize) % model.len();
                        prop_assert_eq!(arr.remove(at), model.remove(at));
                    }
                }
                // Overwrite in place
                4 => {
                    if !model.is_empty() {
                        let at = (value as usize) % model.len();
                        prop_assert!(arr.set(at, value));
                        model[at] = value;
                    }
                }
                _ => unreachable!(),
            }

            prop_assert_eq!(arr.len(), model.len());
            prop_assert!(arr.capacity() >= arr.len());
            prop_assert_eq!(arr.as_slice(), model.as_slice());
        }
    }

    #[test]
    fn prop_dyn_array_retain_matches_vec(
        values in proptest::collection::vec(any::<u16>(), 0..100),
        modulus in 1u16..8,
    ) {
        let mut arr: DynArray<u16> = values.iter().copied().collect();
        let mut model = values;

        arr.retain(|v| v % modulus == 0);
        model.retain(|v| v % modulus == 0);
        prop_assert_eq!(arr.as_slice(), model.as_slice());
    }

    // Model the linked list against VecDeque; also re-check the closed-ring
    // length invariant by walking the public iterator.
    #[test]
    fn prop_linked_list_matches_deque(ops in proptest::collection::vec((0u8..=4u8, any::<u16>()), 1..200)) {
        let mut list: LinkedList<u16> = LinkedList::new();
        let mut model: VecDeque<u16> = VecDeque::new();

        for (op, value) in ops {
            match op {
                0 => {
                    list.push_back(value);
                    model.push_back(value);
                }
                1 => {
                    list.push_front(value);
                    model.push_front(value);
                }
                2 => {
                    prop_assert_eq!(list.pop_front(), model.pop_front());
                }
                3 => {
                    prop_assert_eq!(list.pop_back(), model.pop_back());
                }
                // Remove by value, first occurrence
                4 => {
                    let removed_model = match model.iter().position(|v| *v == value) {
                        Some(at) => {
                            model.remove(at);
                            true
                        }
                        None => false,
                    };
                    prop_assert_eq!(list.remove(&value), removed_model);
                }
                _ => unreachable!(),
            }

            prop_assert_eq!(list.len(), model.len());
            let walked: Vec<u16> = list.iter().copied().collect();
            prop_assert_eq!(walked.len(), model.len());
            prop_assert!(walked.iter().eq(model.iter()));
        }
    }

    // Model SortedMap against BTreeMap; iteration of both is ordered, so
    // whole-map comparison also checks sortedness.
    #[test]
    fn prop_sorted_map_matches_btree(ops in proptest::collection::vec((0u8..=2u8, 0u16..64, any::<u16>()), 1..200)) {
        let mut map: SortedMap<u16, u16> = SortedMap::new();
        let mut model: BTreeMap<u16, u16> = BTreeMap::new();

        for (op, key, value) in ops {
            match op {
                0 => {
                    prop_assert_eq!(map.insert(key, value), model.insert(key, value));
                }
                1 => {
                    prop_assert_eq!(map.remove(&key), model.remove(&key));
                }
                2 => {
                    prop_assert_eq!(map.get(&key), model.get(&key));
                }
                _ => unreachable!(),
            }

            prop_assert_eq!(map.len(), model.len());
        }

        prop_assert!(map.iter().eq(model.iter()));
    }

    // Model HashMap against std's map for content, and against an
    // insertion-order list for iteration order.
    #[test]
    fn prop_hash_map_matches_std(ops in proptest::collection::vec((0u8..=2u8, 0u64..48, any::<u32>()), 1..300)) {
        let mut map: HashMap<u64, u32> = HashMap::new();
        let mut model: std::collections::HashMap<u64, u32> = std::collections::HashMap::new();
        let mut order: Vec<u64> = Vec::new();

        for (op, key, value) in ops {
            match op {
                0 => {
                    let prev = map.insert(key, value);
                    prop_assert_eq!(prev, model.insert(key, value));
                    if prev.is_none() {
                        order.push(key);
                    }
                }
                1 => {
                    let removed = map.remove(&key);
                    prop_assert_eq!(removed, model.remove(&key));
                    if removed.is_some() {
                        order.retain(|k| *k != key);
                    }
                }
                2 => {
                    prop_assert_eq!(map.get(&key), model.get(&key));
                }
                _ => unreachable!(),
            }

            prop_assert_eq!(map.len(), model.len());
            // Load factor stays below 3/4 once the table exists.
            if map.bucket_count() != 0 {
                prop_assert!(map.len() * 4 <= map.bucket_count() * 3);
            }
        }

        for key in &order {
            prop_assert_eq!(map.get(key), model.get(key));
        }
        let iterated: Vec<u64> = map.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(iterated, order);
    }
}
