//! Core runtime for the karst project: containers, smart pointers, strings
//! and callable binding, all built on a swappable allocation layer instead
//! of the standard library's collections.
//!
//! Containers allocate through [`alloc::RawAllocator`] (default
//! [`alloc::Mallocator`]) and share one growth policy, defined by
//! [`collections::DynArray`]. With the `memory_tracking` feature, every
//! allocation is counted and can be attributed to a scope tag.

pub mod alloc;
pub mod collections;
pub mod event;
pub mod hash;
pub mod mem;
pub mod strings;

pub use alloc::{Mallocator, RawAllocator, ReserveError};
pub use collections::{DynArray, HashMap, LinkedList, Optional, SortedMap};
pub use mem::{Arc, ArcWeak, Rc, RcWeak, Unique};
