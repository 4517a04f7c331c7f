//! Geographic coordinate handling
//!
//! Coordinates are ephemeral: validated at the boundary, consumed for cell
//! encoding, and never stored, serialized, or logged.

use std::fmt;

use crate::{AuraError, AuraResult};

/// A validated WGS84 coordinate
///
/// INVARIANT: latitude ∈ [-90, 90], longitude ∈ [-180, 180], both finite.
/// Construction is only possible through `Coordinate::new`, and the type is
/// deliberately not serializable.
#[derive(Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> AuraResult<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(AuraError::InvalidCoordinate);
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(AuraError::InvalidCoordinate);
        }
        Ok(Coordinate {
            latitude,
            longitude,
        })
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

// Debug redacts the values: a coordinate must never reach logs, even through
// a stray `{:?}`.
impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinate() {
        let c = Coordinate::new(48.8566, 2.3522).unwrap();
        assert_eq!(c.latitude(), 48.8566);
        assert_eq!(c.longitude(), 2.3522);
    }

    #[test]
    fn test_range_edges_accepted() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(Coordinate::new(90.0001, 0.0).is_err());
        assert!(Coordinate::new(-91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, 180.5).is_err());
        assert!(Coordinate::new(0.0, -200.0).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_debug_redacts_values() {
        let c = Coordinate::new(48.8566, 2.3522).unwrap();
        let rendered = format!("{:?}", c);
        assert!(!rendered.contains("48"));
        assert!(!rendered.contains('2'));
    }
}
