//! Quadkey encoding and cell geometry

use aura_core::{AuraError, AuraResult, CellKey, Coordinate, MAX_RESOLUTION};

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Pole-to-pole extent of the grid in kilometers
pub const MERIDIONAL_EXTENT_KM: f64 = std::f64::consts::PI * EARTH_RADIUS_KM;

/// Integer position of a cell in the grid at its resolution
///
/// Row 0 touches the north pole; column 0 touches the antimeridian.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellIndex {
    pub row: u32,
    pub col: u32,
    pub resolution: u8,
}

impl CellIndex {
    /// Parse an opaque key back into grid coordinates
    pub fn parse(cell: &CellKey) -> AuraResult<CellIndex> {
        let digits = cell.as_str();
        if digits.len() > MAX_RESOLUTION as usize {
            return Err(AuraError::InvalidCell(digits.to_string()));
        }

        let mut row = 0u32;
        let mut col = 0u32;
        for ch in digits.chars() {
            let digit = match ch {
                '0'..='3' => ch as u32 - '0' as u32,
                _ => return Err(AuraError::InvalidCell(digits.to_string())),
            };
            row = (row << 1) | (digit >> 1);
            col = (col << 1) | (digit & 1);
        }

        Ok(CellIndex {
            row,
            col,
            resolution: digits.len() as u8,
        })
    }

    /// Rebuild the opaque key
    pub fn key(&self) -> CellKey {
        let mut digits = String::with_capacity(self.resolution as usize);
        for level in (0..self.resolution).rev() {
            let row_bit = (self.row >> level) & 1;
            let col_bit = (self.col >> level) & 1;
            let digit = (row_bit << 1) | col_bit;
            digits.push(char::from(b'0' + digit as u8));
        }
        CellKey::new(digits)
    }

    /// Cells per axis at this resolution
    #[inline]
    pub fn side(&self) -> u32 {
        1u32 << self.resolution
    }
}

/// Coarse bounding region of a cell, in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellRect {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// Encode a coordinate into its cell at the given resolution
///
/// Deterministic; the degenerate upper edges (+90, +180) fold into the last
/// row/column so every valid coordinate lands in exactly one cell.
pub fn encode(coord: Coordinate, resolution: u8) -> AuraResult<CellKey> {
    if resolution > MAX_RESOLUTION {
        return Err(AuraError::ResolutionOutOfRange(resolution));
    }
    let side = 1u32 << resolution;

    let col = ((coord.longitude() + 180.0) / 360.0 * side as f64) as i64;
    let row = ((90.0 - coord.latitude()) / 180.0 * side as f64) as i64;

    let col = col.clamp(0, side as i64 - 1) as u32;
    let row = row.clamp(0, side as i64 - 1) as u32;

    Ok(CellIndex {
        row,
        col,
        resolution,
    }
    .key())
}

/// Bounding region of a cell
pub fn bounds(cell: &CellKey) -> AuraResult<CellRect> {
    let index = CellIndex::parse(cell)?;
    let side = index.side() as f64;

    let lat_span = 180.0 / side;
    let lon_span = 360.0 / side;

    let north = 90.0 - index.row as f64 * lat_span;
    let west = -180.0 + index.col as f64 * lon_span;

    Ok(CellRect {
        south: north - lat_span,
        west,
        north,
        east: west + lon_span,
    })
}

/// Approximate center of a cell; coarse by design, used only for area and
/// demo output, never for matching
pub fn approx_center(cell: &CellKey) -> AuraResult<Coordinate> {
    let rect = bounds(cell)?;
    Coordinate::new(
        (rect.south + rect.north) / 2.0,
        (rect.west + rect.east) / 2.0,
    )
}

/// True geometric area of a cell in km²
///
/// Spherical band formula, so a coarsened cell reports its own area rather
/// than the area of the resolution it was coarsened from.
pub fn cell_area_km2(cell: &CellKey) -> AuraResult<f64> {
    let rect = bounds(cell)?;

    let lon_span_rad = (rect.east - rect.west).to_radians();
    let sin_band = rect.north.to_radians().sin() - rect.south.to_radians().sin();

    let area = EARTH_RADIUS_KM * EARTH_RADIUS_KM * lon_span_rad * sin_band;
    if !area.is_finite() || area < 0.0 {
        return Ok(0.0);
    }
    Ok(area)
}

/// Meridional extent of one cell at the given resolution, in kilometers
#[inline]
pub fn cell_span_km(resolution: u8) -> f64 {
    MERIDIONAL_EXTENT_KM / (1u64 << resolution) as f64
}

/// Number of neighbor rings needed to cover a radius at a resolution
///
/// Always at least one: a radius below one cell span still reaches across
/// cell edges.
pub fn rings_for_radius(radius_km: f64, resolution: u8) -> u32 {
    let span = cell_span_km(resolution);
    let rings = (radius_km / span).ceil();
    let side = 1u64 << resolution;
    (rings.max(1.0) as u64).min(side) as u32
}
