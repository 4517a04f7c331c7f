//! End-to-end integration scenarios
//!
//! These tests exercise the whole stack - codec, occupancy, anonymity,
//! density, radius controller, query service - through the two external
//! operations only.

use std::sync::Arc;

use aura_core::{EngineConfig, ManualClock, PrivacyConfig, Timestamp};
use aura_index::{HotspotRegistry, OccupancyIndex};
use aura_runtime::{InMemoryInterests, ProximityService};

/// Fully wired service over a manual clock
pub struct Fixture {
    pub service: Arc<ProximityService>,
    pub clock: Arc<ManualClock>,
    pub interests: Arc<InMemoryInterests>,
}

/// Build a fixture from an arbitrary engine configuration
pub fn fixture(config: EngineConfig) -> Fixture {
    let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1000)));
    let interests = Arc::new(InMemoryInterests::new());
    let index = Arc::new(OccupancyIndex::new(8, config.service.staleness));
    let hotspots = Arc::new(HotspotRegistry::empty());

    let service = Arc::new(ProximityService::new(
        config,
        index,
        hotspots,
        interests.clone(),
        clock.clone(),
    ));

    Fixture {
        service,
        clock,
        interests,
    }
}

/// Fixture with anonymity effectively disabled (k = 1)
pub fn open_fixture() -> Fixture {
    fixture(EngineConfig {
        privacy: PrivacyConfig {
            min_anonymity: 1,
            max_coarsening: 6,
        },
        ..EngineConfig::default()
    })
}
