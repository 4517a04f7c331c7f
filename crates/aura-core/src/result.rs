//! Query result model - the only shapes that cross the external interface
//!
//! Nothing in this module can carry a raw coordinate.

use crate::{CellKey, UserId};

/// Coarse proximity tier, derived from cell adjacency, never from metric
/// distance
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DistanceTier {
    /// Caller's own effective cell
    Same,
    /// Adjacent ring of the effective cell
    Near,
    /// Outer rings within the search radius, and hotspot fallback
    Far,
}

/// Radius trajectory of a user's aura
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    /// Density above the target band; radius shrinking
    Contracting,
    /// Density within the target band; radius holding
    Stable,
    /// Density below the target band; radius growing
    Expanding,
    /// Nothing reachable at maximum radius; serving hotspot candidates
    Tunneling,
}

impl Default for Trend {
    fn default() -> Self {
        Trend::Stable
    }
}

/// One nearby user. Contains no coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NearbyResult {
    pub user: UserId,
    pub tier: DistanceTier,
    /// Cell the user was found under, at the query's effective resolution
    pub cell: CellKey,
}

/// Acknowledgement for a location update
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocationAck {
    /// Effective (possibly coarsened) cell; safe to echo to the caller
    pub cell: CellKey,
    /// True when anonymity enforcement coarsened or hid the exact cell
    pub anonymized: bool,
}

/// Reply to a nearby query
#[derive(Clone, Debug)]
pub struct QueryResponse {
    /// Stable order: tier first, then user id
    pub results: Vec<NearbyResult>,
    pub radius_km: f64,
    pub trend: Trend,
    /// True when the query deadline cut enumeration short
    pub partial: bool,
}
