//! AURA GeoCell Codec - coordinates in, opaque cells out
//!
//! Pure functions, no state. The codec maps a coordinate and a resolution
//! level to a quadkey cell, and back to coarse geometry (bounds, center,
//! area). Cells coarsen monotonically: the key of the enclosing cell at any
//! coarser resolution is a prefix of the fine key.
//!
//! Raw coordinates exist only as inputs here; nothing downstream of the
//! codec ever sees them again.

pub mod codec;
pub mod grid;

pub use codec::*;
pub use grid::*;
