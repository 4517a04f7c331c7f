//! Neighbor and ring enumeration on the cell grid
//!
//! Longitude wraps at the antimeridian; latitude clamps at the poles
//! (missing polar neighbors are omitted, never duplicated). All functions
//! return cells in sorted order so enumeration is deterministic.

use aura_core::{AuraResult, CellKey};

use crate::codec::CellIndex;

/// The 8-neighborhood of a cell at its own resolution
pub fn neighbors(cell: &CellKey) -> AuraResult<Vec<CellKey>> {
    ring(cell, 1)
}

/// Cells at Chebyshev distance exactly `distance`
pub fn ring(cell: &CellKey, distance: u32) -> AuraResult<Vec<CellKey>> {
    if distance == 0 {
        return Ok(vec![cell.clone()]);
    }

    let center = CellIndex::parse(cell)?;
    let side = center.side() as i64;
    let d = distance as i64;

    let mut cells = Vec::new();
    for dr in -d..=d {
        let row = center.row as i64 + dr;
        if row < 0 || row >= side {
            continue;
        }

        let col_offsets: Vec<i64> = if dr.abs() == d {
            (-d..=d).collect()
        } else {
            vec![-d, d]
        };

        for dc in col_offsets {
            let col = (center.col as i64 + dc).rem_euclid(side);
            if row as u32 == center.row && col as u32 == center.col {
                // Wrapped all the way around to the center.
                continue;
            }
            cells.push(
                CellIndex {
                    row: row as u32,
                    col: col as u32,
                    resolution: center.resolution,
                }
                .key(),
            );
        }
    }

    cells.sort();
    cells.dedup();
    Ok(cells)
}

/// Cells at Chebyshev distance at most `max_distance`, center included
pub fn disc(cell: &CellKey, max_distance: u32) -> AuraResult<Vec<CellKey>> {
    let mut cells = Vec::new();
    for d in 0..=max_distance {
        cells.extend(ring(cell, d)?);
    }
    cells.sort();
    cells.dedup();
    Ok(cells)
}
