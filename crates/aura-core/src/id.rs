//! Identity types for the AURA engine
//!
//! User identifiers are 64-bit: large enough for practical populations,
//! cheap to copy, hash, and sort.

use std::fmt;

/// User identity - opaque 64-bit handle assigned by the account system
///
/// Ordered so result lists can break tier ties deterministically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserId(pub u64);

impl UserId {
    pub const ZERO: UserId = UserId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        UserId(id)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        UserId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User({:016x})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
