//! AURA Spatial Index - who is where, without saying exactly where
//!
//! This crate implements the live occupancy layer:
//! - Sharded cell → occupant index with staleness eviction
//! - K-anonymity resolution (coarsen before disclosing)
//! - Density estimation over true cell geometry
//! - Versioned, reloadable hotspot tables

pub mod occupancy;
pub mod anonymity;
pub mod density;
pub mod hotspot;

pub use occupancy::*;
pub use anonymity::*;
pub use density::*;
pub use hotspot::*;
