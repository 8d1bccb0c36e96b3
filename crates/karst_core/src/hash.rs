//! Default hash policy for the hashed containers.
//!
//! [`HashMap`](crate::collections::HashMap) takes any
//! [`BuildHasher`]; this FNV-1a implementation is the default because the
//! keys this crate is typically fed are short integers and strings, where
//! FNV beats sip-style hashers on latency.

use core::hash::{BuildHasher, Hasher};

cfg_if::cfg_if! {
    if #[cfg(target_pointer_width = "32")] {
        const FNV_OFFSET: u64 = 0x811c_9dc5;
        const FNV_PRIME: u64 = 0x0100_0193;
    } else {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    }
}

/// Streaming FNV-1a over the fed bytes.
#[derive(Clone, Debug)]
pub struct FnvHasher(u64);

impl Default for FnvHasher {
    fn default() -> Self {
        Self(FNV_OFFSET)
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= byte as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }
}

#[derive(Clone, Copy, Default, Debug)]
pub struct FnvBuildHasher;

impl BuildHasher for FnvBuildHasher {
    type Hasher = FnvHasher;

    fn build_hasher(&self) -> FnvHasher {
        FnvHasher::default()
    }
}
