//! String types built on the in-house containers.

mod fixed_string;
mod string;

pub use fixed_string::{CapacityError, FixedString};
pub use string::String;
