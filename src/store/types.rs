use serde::{Serialize, Deserialize};
use std::fmt;

/// Identity of one host instance, issued by a [`Schema`](crate::Schema).
///
/// The slot index is recycled once an instance is released, but the
/// generation is bumped each time, so a stale id never aliases the instance
/// that took over its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct InstanceId {
    pub index: u32,
    pub generation: u32,
}

impl InstanceId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.index as usize }

    /// First-generation id for slot `idx`.
    pub fn new(idx: u32) -> Self { Self { index: idx, generation: 0 } }

    /// Packs index and generation into one integer for foreign callers.
    pub fn to_bits(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    pub fn from_bits(bits: u64) -> Self {
        Self { index: bits as u32, generation: (bits >> 32) as u32 }
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.generation {
            0 => write!(f, "#{}", self.index),
            g => write!(f, "#{}v{}", self.index, g),
        }
    }
}

/// Handle to a declared attribute within a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AttrId(pub u32);

impl AttrId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}
