use core::{
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
};

use crate::alloc::{Mallocator, RawAllocator};
use crate::collections::DynArray;

/// UTF-8 string over a [`DynArray`] byte buffer, so string storage follows
/// the same growth policy as every other container.
///
/// Invariant: `bytes` always holds valid UTF-8.
pub struct String<A: RawAllocator = Mallocator> {
    bytes: DynArray<u8, A>,
}

impl String<Mallocator> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { bytes: DynArray::new() }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { bytes: DynArray::with_capacity(capacity) }
    }
}

impl<A: RawAllocator> String<A> {
    #[must_use]
    pub fn new_in(alloc: A) -> Self {
        Self { bytes: DynArray::new_in(alloc) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        unsafe { core::str::from_utf8_unchecked(&self.bytes) }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn push(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.push_str(ch.encode_utf8(&mut buf));
    }

    pub fn push_str(&mut self, s: &str) {
        self.bytes.extend_from_slice(s.as_bytes());
    }

    /// Remove and return the last character.
    pub fn pop(&mut self) -> Option<char> {
        let ch = self.as_str().chars().next_back()?;
        let new_len = self.bytes.len() - ch.len_utf8();
        self.bytes.truncate(new_len);
        Some(ch)
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.bytes.reserve(additional);
    }
}

impl Default for String<Mallocator> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<A: RawAllocator> Deref for String<A> {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl<A: RawAllocator + Clone> Clone for String<A> {
    fn clone(&self) -> Self {
        Self { bytes: self.bytes.clone() }
    }
}

impl<A: RawAllocator> fmt::Debug for String<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<A: RawAllocator> fmt::Display for String<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl<A: RawAllocator> fmt::Write for String<A> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

impl<A: RawAllocator, B: RawAllocator> PartialEq<String<B>> for String<A> {
    fn eq(&self, other: &String<B>) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<A: RawAllocator> Eq for String<A> {}

impl<A: RawAllocator> PartialEq<str> for String<A> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<A: RawAllocator> PartialEq<&str> for String<A> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<A: RawAllocator> Hash for String<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl From<&str> for String<Mallocator> {
    fn from(s: &str) -> Self {
        let mut out = Self::with_capacity(s.len());
        out.push_str(s);
        out
    }
}

impl FromIterator<char> for String<Mallocator> {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        let mut out = Self::new();
        for ch in iter {
            out.push(ch);
        }
        out
    }
}

impl<'a> FromIterator<&'a str> for String<Mallocator> {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut out = Self::new();
        for s in iter {
            out.push_str(s);
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn push_and_read_back() {
        let mut s = String::new();
        s.push_str("hello");
        s.push(' ');
        s.push_str("world");
        assert_eq!(s, "hello world");
        assert_eq!(s.len(), 11);
    }

    #[test]
    fn multibyte_push_and_pop() {
        let mut s = String::from("ab");
        s.push('é');
        s.push('🦀');
        assert_eq!(s.len(), 2 + 2 + 4);
        assert_eq!(s.pop(), Some('🦀'));
        assert_eq!(s.pop(), Some('é'));
        assert_eq!(s, "ab");
    }

    #[test]
    fn pop_on_empty() {
        let mut s = String::new();
        assert_eq!(s.pop(), None);
    }

    #[test]
    fn deref_to_str_methods() {
        let s = String::from("Hello World");
        assert!(s.starts_with("Hello"));
        assert_eq!(s.find("World"), Some(6));
    }

    #[test]
    fn write_trait_formats() {
        use core::fmt::Write as _;
        let mut s = String::new();
        write!(s, "{}-{}", 1, 2).unwrap();
        assert_eq!(s, "1-2");
    }

    #[test]
    fn collect_chars() {
        let s: String = "abc".chars().collect();
        assert_eq!(s, "abc");
    }
}
