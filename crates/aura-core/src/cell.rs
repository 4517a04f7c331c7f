//! Cell keys - opaque identifiers for coarse spatial cells
//!
//! A key is a quadkey: one base-4 digit per resolution level, appended as
//! the cell grid bisects latitude and longitude. Truncating a key yields the
//! enclosing cell at a coarser resolution, so coarsening is monotonic by
//! construction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deepest resolution level the codec will produce
pub const MAX_RESOLUTION: u8 = 20;

/// Opaque cell key; length equals the resolution level
///
/// Treat the contents as opaque outside the codec. The only structure
/// callers may rely on is the prefix property: an ancestor's key is a strict
/// prefix of every descendant's key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellKey(pub String);

impl CellKey {
    /// The whole-world cell at resolution zero
    pub fn root() -> Self {
        CellKey(String::new())
    }

    #[inline]
    pub fn new(digits: impl Into<String>) -> Self {
        CellKey(digits.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn resolution(&self) -> u8 {
        self.0.len() as u8
    }

    /// Enclosing cell one level coarser; `None` at the root
    pub fn parent(&self) -> Option<CellKey> {
        if self.0.is_empty() {
            return None;
        }
        Some(CellKey(self.0[..self.0.len() - 1].to_string()))
    }

    /// Enclosing cell at the given resolution; `None` if it is finer than
    /// this key's own resolution
    pub fn ancestor_at(&self, resolution: u8) -> Option<CellKey> {
        if resolution > self.resolution() {
            return None;
        }
        Some(CellKey(self.0[..resolution as usize].to_string()))
    }

    /// Strict ancestry test (a cell is not its own ancestor)
    pub fn is_ancestor_of(&self, other: &CellKey) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Ancestry test that also accepts the cell itself
    pub fn covers(&self, other: &CellKey) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl fmt::Debug for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell({})", self.0)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
