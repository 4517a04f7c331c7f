//! Population simulator for proximity testing
//!
//! Deterministic: everything is driven by a seeded RNG, so two simulators
//! built with the same seed produce byte-identical populations.

use aura_core::{AuraResult, Coordinate, UserId};
use aura_runtime::ProximityService;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded population generator
pub struct PopulationSimulator {
    rng: StdRng,
    next_user: u64,
}

impl PopulationSimulator {
    pub fn with_seed(seed: u64) -> Self {
        PopulationSimulator {
            rng: StdRng::seed_from_u64(seed),
            next_user: 1,
        }
    }

    fn allocate(&mut self) -> UserId {
        let user = UserId::new(self.next_user);
        self.next_user += 1;
        user
    }

    /// Scatter `count` users uniformly within `spread_deg` of a center
    pub fn place_cluster(
        &mut self,
        service: &ProximityService,
        lat: f64,
        lon: f64,
        spread_deg: f64,
        count: usize,
    ) -> AuraResult<Vec<UserId>> {
        let mut users = Vec::with_capacity(count);
        for _ in 0..count {
            let user = self.allocate();
            let dlat: f64 = self.rng.gen_range(-spread_deg..=spread_deg);
            let dlon: f64 = self.rng.gen_range(-spread_deg..=spread_deg);
            let coord = Coordinate::new(
                (lat + dlat).clamp(-90.0, 90.0),
                (lon + dlon).clamp(-180.0, 180.0),
            )?;
            service.update_location(user, coord)?;
            users.push(user);
        }
        Ok(users)
    }

    /// One user with nobody around
    pub fn place_loner(
        &mut self,
        service: &ProximityService,
        lat: f64,
        lon: f64,
    ) -> AuraResult<UserId> {
        let user = self.allocate();
        service.update_location(user, Coordinate::new(lat, lon)?)?;
        Ok(user)
    }

    /// Nudge an existing user by up to `step_deg` in each axis
    pub fn wander(
        &mut self,
        service: &ProximityService,
        user: UserId,
        lat: f64,
        lon: f64,
        step_deg: f64,
    ) -> AuraResult<Coordinate> {
        let dlat: f64 = self.rng.gen_range(-step_deg..=step_deg);
        let dlon: f64 = self.rng.gen_range(-step_deg..=step_deg);
        let coord = Coordinate::new(
            (lat + dlat).clamp(-90.0, 90.0),
            (lon + dlon).clamp(-180.0, 180.0),
        )?;
        service.update_location(user, coord)?;
        Ok(coord)
    }
}
