use core::fmt;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    struct NodeKey;
}

struct Node<T> {
    value: T,
    next: NodeKey,
    prev: NodeKey,
}

/// Doubly linked list with a circular topology.
///
/// There is no sentinel node. The nodes form a closed ring through their
/// `next`/`prev` links, and the list keeps a `root` key marking the front.
/// The back is therefore always `root.prev`. Nodes live in a slot arena, so
/// links are stable keys rather than pointers.
///
/// Invariant: `root` is `None` exactly when the list is empty; otherwise
/// following `next` from root `len` times returns to root, and likewise for
/// `prev`.
pub struct LinkedList<T> {
    nodes: SlotMap<NodeKey, Node<T>>,
    root: Option<NodeKey>,
}

impl<T> LinkedList<T> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: SlotMap::with_key(), root: None }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Append at the back of the ring, i.e. link the new node just before
    /// root. O(1).
    pub fn push_back(&mut self, value: T) {
        match self.root {
            None => self.establish_ring(value),
            Some(root) => {
                self.link_before(root, value);
            }
        }
    }

    /// Insert at the front: link before root, then make the new node root.
    /// O(1).
    pub fn push_front(&mut self, value: T) {
        match self.root {
            None => self.establish_ring(value),
            Some(root) => {
                let key = self.link_before(root, value);
                self.root = Some(key);
            }
        }
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let root = self.root?;
        let next = self.nodes[root].next;
        let value = self.unlink(root);
        // unlink's removed-root rule picks the predecessor; a front pop
        // wants the old front's successor as the new front.
        if self.root.is_some() {
            self.root = Some(next);
        }
        Some(value)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let root = self.root?;
        let back = self.nodes[root].prev;
        Some(self.unlink(back))
    }

    pub fn front(&self) -> Option<&T> {
        self.root.map(|k| &self.nodes[k].value)
    }

    pub fn back(&self) -> Option<&T> {
        self.root.map(|k| &self.nodes[self.nodes[k].prev].value)
    }

    /// Remove the first node holding a value equal to `value`. O(n) search,
    /// O(1) unlink. Returns whether anything was removed.
    pub fn remove(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.remove_if(|v| v == value)
    }

    /// Remove the first node matching the predicate and return its value.
    pub fn remove_if<F>(&mut self, mut pred: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        let Some(key) = self.find_key(|v| pred(v)) else {
            return false;
        };
        self.unlink(key);
        true
    }

    /// Position of the first value equal to `value`, or `None`.
    pub fn find(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.iter().position(|v| v == value)
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.find(value).is_some()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.key_at(index).map(|k| &self.nodes[k].value)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.key_at(index).map(|k| &mut self.nodes[k].value)
    }

    /// Overwrite the value at `index`, returning the previous one. Returns
    /// `None` when the index is out of bounds.
    pub fn replace(&mut self, index: usize, value: T) -> Option<T> {
        let key = self.key_at(index)?;
        Some(core::mem::replace(&mut self.nodes[key].value, value))
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter { list: self, cursor: self.root, remaining: self.len() }
    }

    fn establish_ring(&mut self, value: T) {
        let key = self.nodes.insert_with_key(|k| Node { value, next: k, prev: k });
        self.root = Some(key);
    }

    /// Splice a fresh node into the ring just before `anchor`.
    fn link_before(&mut self, anchor: NodeKey, value: T) -> NodeKey {
        let prev = self.nodes[anchor].prev;
        let key = self.nodes.insert(Node { value, next: anchor, prev });
        self.nodes[prev].next = key;
        self.nodes[anchor].prev = key;
        key
    }

    /// Unlink `key` from the ring and return its value. Removing the root
    /// moves root to its predecessor; removing the last node empties the
    /// list.
    fn unlink(&mut self, key: NodeKey) -> T {
        let node = match self.nodes.remove(key) {
            Some(node) => node,
            None => unreachable!("unlink of a key not in the arena"),
        };

        if node.next == key {
            self.root = None;
        } else {
            self.nodes[node.prev].next = node.next;
            self.nodes[node.next].prev = node.prev;
            if self.root == Some(key) {
                self.root = Some(node.prev);
            }
        }
        node.value
    }

    fn find_key<F>(&self, mut pred: F) -> Option<NodeKey>
    where
        F: FnMut(&T) -> bool,
    {
        let root = self.root?;
        let mut cursor = root;
        loop {
            if pred(&self.nodes[cursor].value) {
                return Some(cursor);
            }
            cursor = self.nodes[cursor].next;
            if cursor == root {
                return None;
            }
        }
    }

    /// Walk to position `index` from whichever end of the ring is closer,
    /// so access costs O(min(i, n - i)).
    fn key_at(&self, index: usize) -> Option<NodeKey> {
        let len = self.len();
        if index >= len {
            return None;
        }
        let root = self.root?;
        let mut cursor = root;
        if index <= len / 2 {
            for _ in 0..index {
                cursor = self.nodes[cursor].next;
            }
        } else {
            for _ in 0..len - index {
                cursor = self.nodes[cursor].prev;
            }
        }
        Some(cursor)
    }
}

impl<T> Default for LinkedList<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::ops::Index<usize> for LinkedList<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics when `index >= len`, including on an empty list.
    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(v) => v,
            None => panic!("index {index} out of bounds (len {})", self.len()),
        }
    }
}

impl<T> core::ops::IndexMut<usize> for LinkedList<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.get_mut(index) {
            Some(v) => v,
            None => panic!("index {index} out of bounds (len {len})"),
        }
    }
}

impl<T: Clone> Clone for LinkedList<T> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T: fmt::Debug> fmt::Debug for LinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for LinkedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for LinkedList<T> {}

impl<T> FromIterator<T> for LinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T> Extend<T> for LinkedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

pub struct Iter<'a, T> {
    list: &'a LinkedList<T>,
    cursor: Option<NodeKey>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let key = self.cursor?;
        let node = &self.list.nodes[key];
        self.remaining -= 1;
        self.cursor = Some(node.next);
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a LinkedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
