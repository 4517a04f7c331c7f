//! Per-user aura state

use aura_core::{RadiusConfig, Timestamp, Trend};

/// Adaptive search state for one querying user
///
/// Created lazily on first query, mutated only by the radius controller,
/// dropped at session end or after idle expiry.
#[derive(Clone, Debug, PartialEq)]
pub struct AuraState {
    /// Radius currently in effect, kilometers
    pub current_radius_km: f64,
    /// Radius the controller is steering toward
    pub target_radius_km: f64,
    /// Last density observation, users per km²
    pub density: f64,
    pub trend: Trend,
    /// Consecutive zero-density observations with the target pinned at
    /// maximum radius
    pub zero_streak: u32,
    pub last_updated: Timestamp,
}

impl AuraState {
    /// Fresh state: starts at the minimum radius and grows outward, which
    /// is the privacy-conservative default
    pub fn initial(config: &RadiusConfig, now: Timestamp) -> Self {
        AuraState {
            current_radius_km: config.min_radius_km,
            target_radius_km: config.min_radius_km,
            density: 0.0,
            trend: Trend::Stable,
            zero_streak: 0,
            last_updated: now,
        }
    }

    /// Whether the target can no longer grow
    #[inline]
    pub fn target_at_max(&self, config: &RadiusConfig) -> bool {
        self.target_radius_km >= config.max_radius_km
    }
}
