//! Engine configuration
//!
//! All tunables are plain data: deployments load them from JSON and hand
//! them to the engines at construction. Nothing here is read from a global.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cell grid configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridConfig {
    /// Resolution used to index fresh location updates
    pub resolution: u8,
    /// Coarsest resolution the anonymity resolver may fall back to
    pub floor_resolution: u8,
}

impl Default for GridConfig {
    fn default() -> Self {
        // Level 14 cells are roughly 1.2 km tall; level 8 roughly 78 km.
        GridConfig {
            resolution: 14,
            floor_resolution: 8,
        }
    }
}

/// K-anonymity configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrivacyConfig {
    /// Minimum anonymity-set size before a cell may be disclosed
    pub min_anonymity: usize,
    /// Maximum coarsening steps before giving up with the low-density
    /// sentinel
    pub max_coarsening: u8,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        PrivacyConfig {
            min_anonymity: 5,
            max_coarsening: 6,
        }
    }
}

/// Elastic radius configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RadiusConfig {
    pub min_radius_km: f64,
    pub max_radius_km: f64,
    /// Lower edge of the target density band, users per km²
    pub density_floor: f64,
    /// Upper edge of the target density band, users per km²
    pub density_ceiling: f64,
    /// Multiplier applied to the target when contracting
    pub shrink_factor: f64,
    /// Multiplier applied to the target when expanding
    pub grow_factor: f64,
    /// Exponential smoothing applied when moving the current radius toward
    /// the target
    pub smoothing: f64,
    /// Consecutive zero-density observations at maximum radius before the
    /// aura tunnels to hotspots
    pub tunnel_after: u32,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        RadiusConfig {
            min_radius_km: 0.5,
            max_radius_km: 50.0,
            density_floor: 2.0,
            density_ceiling: 8.0,
            shrink_factor: 0.7,
            grow_factor: 1.4,
            smoothing: 0.35,
            tunnel_after: 3,
        }
    }
}

impl RadiusConfig {
    /// Preset for dense metropolitan deployments
    pub fn dense_urban() -> Self {
        RadiusConfig {
            min_radius_km: 0.25,
            max_radius_km: 10.0,
            density_floor: 4.0,
            density_ceiling: 16.0,
            shrink_factor: 0.6,
            grow_factor: 1.3,
            smoothing: 0.4,
            tunnel_after: 5,
        }
    }

    /// Preset for sparse rural deployments
    pub fn sparse_rural() -> Self {
        RadiusConfig {
            min_radius_km: 2.0,
            max_radius_km: 150.0,
            density_floor: 0.2,
            density_ceiling: 2.0,
            shrink_factor: 0.75,
            grow_factor: 1.6,
            smoothing: 0.3,
            tunnel_after: 2,
        }
    }
}

/// Service-level configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Staleness window: records older than this are never returned
    pub staleness: Duration,
    /// Cooperative query deadline; exceeding it yields a partial response
    pub query_deadline: Duration,
    /// Idle expiry for per-user aura state
    pub aura_idle_expiry: Duration,
    /// Interval between background staleness sweeps
    pub sweep_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            staleness: Duration::from_secs(300),
            query_deadline: Duration::from_millis(200),
            aura_idle_expiry: Duration::from_secs(1800),
            sweep_interval: Duration::from_secs(30),
        }
    }
}

/// Aggregate configuration handed to the runtime
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub grid: GridConfig,
    pub privacy: PrivacyConfig,
    pub radius: RadiusConfig,
    pub service: ServiceConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_is_coherent() {
        let grid = GridConfig::default();
        assert!(grid.floor_resolution < grid.resolution);
    }

    #[test]
    fn test_default_band_is_ordered() {
        let radius = RadiusConfig::default();
        assert!(radius.density_floor < radius.density_ceiling);
        assert!(radius.min_radius_km < radius.max_radius_km);
        assert!(radius.shrink_factor < 1.0);
        assert!(radius.grow_factor > 1.0);
        assert!(radius.smoothing > 0.0 && radius.smoothing <= 1.0);
    }

    #[test]
    fn test_profiles_stay_ordered() {
        for radius in [RadiusConfig::dense_urban(), RadiusConfig::sparse_rural()] {
            assert!(radius.density_floor < radius.density_ceiling);
            assert!(radius.min_radius_km < radius.max_radius_km);
        }
    }

    #[test]
    fn test_engine_config_json_roundtrip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.grid.resolution, config.grid.resolution);
        assert_eq!(back.service.staleness, config.service.staleness);
    }
}
