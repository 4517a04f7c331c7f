//! Density estimation - the feedback signal for the elastic radius
//!
//! "Magic density" is distinct fresh occupants divided by the true
//! geometric area of the cell they stand in. A coarsened cell is measured
//! at its own area, not at the area of the resolution it was coarsened
//! from.

use aura_core::{AuraResult, CellKey, Timestamp, UserId};

use crate::occupancy::OccupancyIndex;

/// Users per km² under a cell
///
/// Zero occupants or a degenerate area yield 0.0; never NaN, never a
/// division by zero.
pub fn estimate_density(
    cell: &CellKey,
    index: &OccupancyIndex,
    now: Timestamp,
) -> AuraResult<f64> {
    let area_km2 = aura_geo::cell_area_km2(cell)?;
    let occupants = index.count_under(cell, now);

    if occupants == 0 || area_km2 <= f64::EPSILON {
        return Ok(0.0);
    }
    Ok(occupants as f64 / area_km2)
}

/// Users per km² under a cell, leaving one user out
///
/// The querying user never counts toward their own density signal;
/// otherwise an empty region would still read as populated and the radius
/// could never tunnel.
pub fn estimate_density_excluding(
    cell: &CellKey,
    index: &OccupancyIndex,
    excluded: UserId,
    now: Timestamp,
) -> AuraResult<f64> {
    let area_km2 = aura_geo::cell_area_km2(cell)?;
    let occupants = index.count_under_excluding(cell, excluded, now);

    if occupants == 0 || area_km2 <= f64::EPSILON {
        return Ok(0.0);
    }
    Ok(occupants as f64 / area_km2)
}
