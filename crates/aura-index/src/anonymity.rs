//! K-anonymity resolution - coarsen before disclosing
//!
//! A cell may only be disclosed once enough distinct users stand inside it.
//! Under-populated cells are merged upward until the anonymity set is met;
//! if the coarsening budget runs out first, the resolver answers with a
//! sentinel instead of leaking a nearly-empty cell. A lone occupant of a
//! small cell is indistinguishable from nobody at all.

use aura_core::{CellKey, GridConfig, PrivacyConfig, Timestamp};

use crate::occupancy::OccupancyIndex;

/// Outcome of anonymity resolution
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedCell {
    /// Effective cell with at least the configured anonymity set inside
    Cell(CellKey),
    /// No ancestor within the coarsening budget reached the anonymity set
    LowDensity,
}

impl ResolvedCell {
    pub fn cell(&self) -> Option<&CellKey> {
        match self {
            ResolvedCell::Cell(cell) => Some(cell),
            ResolvedCell::LowDensity => None,
        }
    }
}

/// Read-only resolver over the occupancy index
#[derive(Clone, Debug)]
pub struct AnonymityResolver {
    min_anonymity: usize,
    max_coarsening: u8,
    floor_resolution: u8,
}

impl AnonymityResolver {
    pub fn new(privacy: &PrivacyConfig, grid: &GridConfig) -> Self {
        AnonymityResolver {
            min_anonymity: privacy.min_anonymity,
            max_coarsening: privacy.max_coarsening,
            floor_resolution: grid.floor_resolution,
        }
    }

    pub fn min_anonymity(&self) -> usize {
        self.min_anonymity
    }

    /// Walk toward the root until the anonymity set is satisfied
    ///
    /// INVARIANT: every `ResolvedCell::Cell` holds at least `min_anonymity`
    /// fresh occupants at resolution time; counts in between are never
    /// disclosed.
    pub fn resolve(
        &self,
        cell: &CellKey,
        index: &OccupancyIndex,
        now: Timestamp,
    ) -> ResolvedCell {
        let mut current = cell.clone();
        let mut steps = 0u8;

        loop {
            if index.count_under(&current, now) >= self.min_anonymity {
                return ResolvedCell::Cell(current);
            }
            if steps >= self.max_coarsening || current.resolution() <= self.floor_resolution {
                return ResolvedCell::LowDensity;
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return ResolvedCell::LowDensity,
            }
            steps += 1;
        }
    }
}
