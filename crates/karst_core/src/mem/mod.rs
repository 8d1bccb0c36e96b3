//! Smart pointers with explicit counting and storage strategies.

mod shared;
mod unique;

pub use shared::{Arc, ArcWeak, AtomicCount, LocalCount, Rc, RcWeak, RefCount, Shared, Weak};
pub use unique::{DefaultDeleter, Deleter, Unique};
