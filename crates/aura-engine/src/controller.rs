//! Elastic radius control loop
//!
//! Each observation feeds one density sample into the per-user state
//! machine. The radius never snaps: the current value moves toward the
//! target by exponential smoothing, so consecutive queries see a steady
//! contraction or expansion instead of flicker.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

use aura_core::{RadiusConfig, Timestamp, Trend, UserId};

use crate::aura::AuraState;

/// Per-user radius controller
///
/// Sharded by user id: one user's radius never depends on another's, so
/// shards only serialize observations for users that hash together.
pub struct RadiusController {
    config: RadiusConfig,
    shards: Box<[Mutex<HashMap<UserId, AuraState>>]>,
    idle_expiry: Duration,
}

impl RadiusController {
    pub fn new(config: RadiusConfig, idle_expiry: Duration, shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| Mutex::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        RadiusController {
            config,
            shards,
            idle_expiry,
        }
    }

    fn shard_of(&self, user: UserId) -> &Mutex<HashMap<UserId, AuraState>> {
        &self.shards[user.0 as usize % self.shards.len()]
    }

    pub fn config(&self) -> &RadiusConfig {
        &self.config
    }

    /// Feed one density sample and return the updated state
    ///
    /// `None` means density estimation failed: the radius holds exactly as
    /// it was. It never resets to a default, which would make the user's
    /// search area observably different from what they had.
    pub fn observe(&self, user: UserId, density: Option<f64>, now: Timestamp) -> AuraState {
        let mut shard = self.shard_of(user).lock();
        let state = shard
            .entry(user)
            .or_insert_with(|| AuraState::initial(&self.config, now));

        match density {
            Some(density) => Self::apply(&self.config, state, density, now),
            None => {
                tracing::warn!(user = %user, "density unavailable, holding radius");
                state.last_updated = now;
            }
        }

        state.clone()
    }

    fn apply(config: &RadiusConfig, state: &mut AuraState, density: f64, now: Timestamp) {
        state.density = density;

        if density > 0.0 {
            state.zero_streak = 0;
        } else if state.target_at_max(config) {
            state.zero_streak = state.zero_streak.saturating_add(1);
        }

        if density == 0.0 && state.zero_streak >= config.tunnel_after {
            // Nothing reachable even at full expansion: stop growing and
            // serve hotspot candidates instead.
            if state.trend != Trend::Tunneling {
                tracing::debug!(streak = state.zero_streak, "aura tunneling");
            }
            state.trend = Trend::Tunneling;
            state.target_radius_km = config.max_radius_km;
        } else if density > config.density_ceiling {
            state.trend = Trend::Contracting;
            state.target_radius_km =
                (state.current_radius_km * config.shrink_factor).max(config.min_radius_km);
        } else if density < config.density_floor {
            state.trend = Trend::Expanding;
            state.target_radius_km =
                (state.current_radius_km * config.grow_factor).min(config.max_radius_km);
        } else {
            state.trend = Trend::Stable;
            state.target_radius_km = state.current_radius_km;
        }

        state.current_radius_km +=
            (state.target_radius_km - state.current_radius_km) * config.smoothing;
        state.current_radius_km = state
            .current_radius_km
            .clamp(config.min_radius_km, config.max_radius_km);
        state.last_updated = now;
    }

    pub fn state_of(&self, user: UserId) -> Option<AuraState> {
        self.shard_of(user).lock().get(&user).cloned()
    }

    /// Drop one user's state (session end)
    pub fn remove(&self, user: UserId) -> bool {
        self.shard_of(user).lock().remove(&user).is_some()
    }

    /// Drop states idle past the expiry window
    pub fn expire_idle(&self, now: Timestamp) -> usize {
        let mut expired = 0;
        for shard in self.shards.iter() {
            let mut states = shard.lock();
            let before = states.len();
            states.retain(|_, state| now.since(state.last_updated) <= self.idle_expiry);
            expired += before - states.len();
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
