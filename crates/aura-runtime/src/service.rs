//! Proximity query service
//!
//! Orchestrates codec, index, anonymity, density, and the radius
//! controller into the two external operations. Raw coordinates enter
//! here, are consumed for one upsert, and never leave.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use aura_core::{
    AuraResult, CellKey, Clock, Coordinate, DistanceTier, EngineConfig, GridConfig, LocationAck,
    NearbyResult, QueryResponse, ServiceConfig, Timestamp, Trend, UserId,
};
use aura_engine::RadiusController;
use aura_index::{
    estimate_density_excluding, AnonymityResolver, HotspotRegistry, OccupancyIndex, ResolvedCell,
};

use crate::interest::InterestDirectory;

/// How many snapshot entries are classified between deadline checks
const DEADLINE_CHECK_STRIDE: usize = 64;

/// Options for a nearby query
#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    /// Keep only users sharing at least one of these tags; empty means no
    /// filtering
    pub interest_filter: Vec<String>,
}

/// The narrow query interface the rest of the application consumes
pub struct ProximityService {
    index: Arc<OccupancyIndex>,
    controller: RadiusController,
    resolver: AnonymityResolver,
    hotspots: Arc<HotspotRegistry>,
    interests: Arc<dyn InterestDirectory>,
    clock: Arc<dyn Clock>,
    grid: GridConfig,
    service: ServiceConfig,
}

impl ProximityService {
    pub fn new(
        config: EngineConfig,
        index: Arc<OccupancyIndex>,
        hotspots: Arc<HotspotRegistry>,
        interests: Arc<dyn InterestDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let resolver = AnonymityResolver::new(&config.privacy, &config.grid);
        let controller =
            RadiusController::new(config.radius, config.service.aura_idle_expiry, 16);

        ProximityService {
            index,
            controller,
            resolver,
            hotspots,
            interests,
            clock,
            grid: config.grid,
            service: config.service,
        }
    }

    /// Record a fresh GPS reading
    ///
    /// The acknowledgement carries the effective cell only; never the
    /// coordinate, and never an exact cell that anonymity had to hide.
    pub fn update_location(&self, user: UserId, coord: Coordinate) -> AuraResult<LocationAck> {
        let now = self.clock.now();
        let exact = self.index.upsert(user, coord, self.grid.resolution, now)?;

        match self.resolver.resolve(&exact, &self.index, now) {
            ResolvedCell::Cell(effective) => {
                let anonymized = effective != exact;
                Ok(LocationAck {
                    cell: effective,
                    anonymized,
                })
            }
            ResolvedCell::LowDensity => Ok(LocationAck {
                cell: self.floor_cell(&exact),
                anonymized: true,
            }),
        }
    }

    /// Answer "who is near this user" with tiered, anonymized results
    pub fn query_nearby(
        &self,
        user: UserId,
        coord: Coordinate,
        opts: QueryOptions,
    ) -> AuraResult<QueryResponse> {
        let started = Instant::now();
        let now = self.clock.now();

        let exact = self.index.upsert(user, coord, self.grid.resolution, now)?;

        // A low-density sentinel widens the search instead of surfacing as
        // an error: search from the coarsest allowed ancestor at density
        // zero and let the controller expand or tunnel.
        let (effective, density) = match self.resolver.resolve(&exact, &self.index, now) {
            ResolvedCell::Cell(cell) => {
                let density = estimate_density_excluding(&cell, &self.index, user, now).ok();
                (cell, density)
            }
            ResolvedCell::LowDensity => (self.floor_cell(&exact), Some(0.0)),
        };

        let state = self.controller.observe(user, density, now);

        let mut partial = false;
        let distances =
            self.distance_map(&effective, state.current_radius_km, started, &mut partial)?;
        let mut results =
            self.classify(user, &effective, &distances, &opts, now, started, &mut partial);

        if state.trend == Trend::Tunneling {
            self.append_hotspots(user, &opts, now, &mut results);
        }

        // Stable order: tier first, then user id; a user found both
        // geometrically and via a hotspot keeps the nearer tier.
        results.sort_by_key(|r| (r.tier, r.user));
        let mut seen = HashSet::new();
        results.retain(|r| seen.insert(r.user));

        Ok(QueryResponse {
            results,
            radius_km: state.current_radius_km,
            trend: state.trend,
            partial,
        })
    }

    /// Drop all state for a user (session end)
    pub fn end_session(&self, user: UserId) {
        self.index.remove(user);
        self.controller.remove(user);
    }

    /// One staleness pass over occupancy and aura state
    ///
    /// Returns `(evicted_records, expired_auras)`.
    pub fn sweep_once(&self) -> (usize, usize) {
        let now = self.clock.now();
        (self.index.sweep(now), self.controller.expire_idle(now))
    }

    pub fn index(&self) -> &OccupancyIndex {
        &self.index
    }

    pub fn controller(&self) -> &RadiusController {
        &self.controller
    }

    pub fn hotspots(&self) -> &HotspotRegistry {
        &self.hotspots
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn service_config(&self) -> &ServiceConfig {
        &self.service
    }

    fn floor_cell(&self, exact: &CellKey) -> CellKey {
        exact
            .ancestor_at(self.grid.floor_resolution)
            .unwrap_or_else(|| exact.clone())
    }

    /// Candidate cells within the radius, keyed by ring distance
    fn distance_map(
        &self,
        effective: &CellKey,
        radius_km: f64,
        started: Instant,
        partial: &mut bool,
    ) -> AuraResult<HashMap<CellKey, u32>> {
        let rings = aura_geo::rings_for_radius(radius_km, effective.resolution());

        let mut distances = HashMap::new();
        for d in 0..=rings {
            if started.elapsed() > self.service.query_deadline {
                *partial = true;
                break;
            }
            for cell in aura_geo::ring(effective, d)? {
                distances.entry(cell).or_insert(d);
            }
        }
        Ok(distances)
    }

    /// Classify every fresh occupant against the candidate cells
    #[allow(clippy::too_many_arguments)]
    fn classify(
        &self,
        caller: UserId,
        effective: &CellKey,
        distances: &HashMap<CellKey, u32>,
        opts: &QueryOptions,
        now: Timestamp,
        started: Instant,
        partial: &mut bool,
    ) -> Vec<NearbyResult> {
        let effective_res = effective.resolution();
        let snapshot = self.index.snapshot(now);

        let mut results = Vec::new();
        for (i, (user, cell)) in snapshot.iter().enumerate() {
            if i % DEADLINE_CHECK_STRIDE == 0 && started.elapsed() > self.service.query_deadline {
                *partial = true;
                break;
            }
            if *user == caller {
                continue;
            }
            let Some(bucket) = cell.ancestor_at(effective_res) else {
                continue;
            };
            let Some(&distance) = distances.get(&bucket) else {
                continue;
            };
            if !self.passes_filter(*user, &opts.interest_filter) {
                continue;
            }

            let tier = match distance {
                0 => DistanceTier::Same,
                1 => DistanceTier::Near,
                _ => DistanceTier::Far,
            };
            results.push(NearbyResult {
                user: *user,
                tier,
                cell: bucket,
            });
        }
        results
    }

    /// Union in hotspot occupants; always `Far`, since tier comes from cell
    /// adjacency and hotspots sit outside the geometric disc by definition
    fn append_hotspots(
        &self,
        caller: UserId,
        opts: &QueryOptions,
        now: Timestamp,
        results: &mut Vec<NearbyResult>,
    ) {
        for (cell, users) in self.hotspots.occupants(&self.index, now) {
            for user in users {
                if user == caller || !self.passes_filter(user, &opts.interest_filter) {
                    continue;
                }
                results.push(NearbyResult {
                    user,
                    tier: DistanceTier::Far,
                    cell: cell.clone(),
                });
            }
        }
    }

    fn passes_filter(&self, user: UserId, filter: &[String]) -> bool {
        if filter.is_empty() {
            return true;
        }
        match self.interests.interests_of(user) {
            Some(tags) => filter.iter().any(|tag| tags.contains(tag)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interest::InMemoryInterests;
    use aura_core::{ManualClock, PrivacyConfig, RadiusConfig};
    use aura_index::HotspotTable;
    use std::time::Duration;

    struct Fixture {
        service: ProximityService,
        clock: Arc<ManualClock>,
        interests: Arc<InMemoryInterests>,
    }

    fn fixture(config: EngineConfig) -> Fixture {
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1000)));
        let interests = Arc::new(InMemoryInterests::new());
        let index = Arc::new(OccupancyIndex::new(8, config.service.staleness));
        let hotspots = Arc::new(HotspotRegistry::empty());

        let service = ProximityService::new(
            config,
            index,
            hotspots,
            interests.clone(),
            clock.clone(),
        );
        Fixture {
            service,
            clock,
            interests,
        }
    }

    /// Anonymity effectively off: every cell resolves to itself.
    fn open_config() -> EngineConfig {
        EngineConfig {
            privacy: PrivacyConfig {
                min_anonymity: 1,
                max_coarsening: 6,
            },
            ..EngineConfig::default()
        }
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_update_location_ack_crowded_cell_not_anonymized() {
        let f = fixture(open_config());

        let ack = f
            .service
            .update_location(UserId::new(1), coord(48.85, 2.35))
            .unwrap();
        assert!(!ack.anonymized);
        assert_eq!(ack.cell.resolution(), 14);
    }

    #[test]
    fn test_update_location_lone_user_is_anonymized() {
        let mut config = open_config();
        config.privacy.min_anonymity = 3;
        let f = fixture(config);

        let ack = f
            .service
            .update_location(UserId::new(1), coord(48.85, 2.35))
            .unwrap();
        assert!(ack.anonymized);
        // Only the coarse floor cell leaks out.
        assert_eq!(ack.cell.resolution(), 8);
    }

    #[test]
    fn test_rejects_invalid_coordinate_before_mutation() {
        let f = fixture(open_config());

        assert!(Coordinate::new(95.0, 0.0).is_err());
        // Nothing was indexed for the user.
        assert!(!f.service.index().contains(UserId::new(1)));
    }

    #[test]
    fn test_query_excludes_caller() {
        let f = fixture(open_config());
        let here = coord(48.85, 2.35);

        f.service.update_location(UserId::new(2), here).unwrap();
        let response = f
            .service
            .query_nearby(UserId::new(1), here, QueryOptions::default())
            .unwrap();

        let users: Vec<UserId> = response.results.iter().map(|r| r.user).collect();
        assert_eq!(users, vec![UserId::new(2)]);
    }

    #[test]
    fn test_same_and_near_tiers() {
        let f = fixture(open_config());
        let here = coord(48.85, 2.35);

        // One user in the caller's cell, one in an adjacent cell.
        f.service.update_location(UserId::new(2), here).unwrap();
        let home = f.service.index().cell_of(UserId::new(2)).unwrap();
        let neighbor = aura_geo::neighbors(&home).unwrap()[0].clone();
        let neighbor_center = aura_geo::approx_center(&neighbor).unwrap();
        f.service
            .update_location(UserId::new(3), neighbor_center)
            .unwrap();

        let response = f
            .service
            .query_nearby(UserId::new(1), here, QueryOptions::default())
            .unwrap();

        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].user, UserId::new(2));
        assert_eq!(response.results[0].tier, DistanceTier::Same);
        assert_eq!(response.results[1].user, UserId::new(3));
        assert_eq!(response.results[1].tier, DistanceTier::Near);
    }

    #[test]
    fn test_far_tier_beyond_adjacent_ring() {
        let mut config = open_config();
        // A radius wide enough for several rings at resolution 14.
        config.radius = RadiusConfig {
            min_radius_km: 5.0,
            ..RadiusConfig::default()
        };
        let f = fixture(config);
        let here = coord(48.85, 2.35);

        f.service.update_location(UserId::new(2), here).unwrap();
        let home = f.service.index().cell_of(UserId::new(2)).unwrap();

        let outer = aura_geo::ring(&home, 2).unwrap()[0].clone();
        let outer_center = aura_geo::approx_center(&outer).unwrap();
        f.service
            .update_location(UserId::new(3), outer_center)
            .unwrap();

        let response = f
            .service
            .query_nearby(UserId::new(1), here, QueryOptions::default())
            .unwrap();

        let far: Vec<&NearbyResult> = response
            .results
            .iter()
            .filter(|r| r.tier == DistanceTier::Far)
            .collect();
        assert_eq!(far.len(), 1);
        assert_eq!(far[0].user, UserId::new(3));
    }

    #[test]
    fn test_results_carry_no_fine_cells() {
        let f = fixture(open_config());
        let here = coord(48.85, 2.35);

        f.service.update_location(UserId::new(2), here).unwrap();
        let response = f
            .service
            .query_nearby(UserId::new(1), here, QueryOptions::default())
            .unwrap();

        for result in &response.results {
            assert!(result.cell.resolution() <= 14);
        }
    }

    #[test]
    fn test_interest_filter() {
        let f = fixture(open_config());
        let here = coord(48.85, 2.35);

        f.service.update_location(UserId::new(2), here).unwrap();
        f.service.update_location(UserId::new(3), here).unwrap();
        f.interests.set(UserId::new(2), ["music"]);
        f.interests.set(UserId::new(3), ["chess"]);

        let opts = QueryOptions {
            interest_filter: vec!["music".to_string()],
        };
        let response = f.service.query_nearby(UserId::new(1), here, opts).unwrap();

        let users: Vec<UserId> = response.results.iter().map(|r| r.user).collect();
        assert_eq!(users, vec![UserId::new(2)]);
    }

    #[test]
    fn test_user_without_tags_filtered_out() {
        let f = fixture(open_config());
        let here = coord(48.85, 2.35);

        f.service.update_location(UserId::new(2), here).unwrap();

        let opts = QueryOptions {
            interest_filter: vec!["music".to_string()],
        };
        let response = f.service.query_nearby(UserId::new(1), here, opts).unwrap();
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_zero_deadline_yields_partial() {
        let mut config = open_config();
        config.service.query_deadline = Duration::ZERO;
        let f = fixture(config);
        let here = coord(48.85, 2.35);

        f.service.update_location(UserId::new(2), here).unwrap();
        let response = f
            .service
            .query_nearby(UserId::new(1), here, QueryOptions::default())
            .unwrap();

        assert!(response.partial);
        // The radius still comes back even when enumeration was cut short.
        assert!(response.radius_km > 0.0);
    }

    #[test]
    fn test_tunneling_serves_hotspot_occupants() {
        let mut config = open_config();
        // Tight radius band so the target pins at max almost immediately.
        config.radius = RadiusConfig {
            min_radius_km: 0.5,
            max_radius_km: 0.6,
            tunnel_after: 1,
            ..RadiusConfig::default()
        };
        let f = fixture(config);

        // A crowd on the other side of the planet, registered as a hotspot.
        let tokyo = coord(35.67, 139.65);
        for id in 10..13u64 {
            f.service.update_location(UserId::new(id), tokyo).unwrap();
        }
        let hotspot_cell = f
            .service
            .index()
            .cell_of(UserId::new(10))
            .unwrap()
            .ancestor_at(8)
            .unwrap();
        f.service
            .hotspots()
            .reload(HotspotTable::new(1, vec![hotspot_cell.clone()]));

        // Alone in the Pacific; density stays zero until the aura tunnels.
        let caller = UserId::new(1);
        let nowhere = coord(-40.0, -140.0);
        let mut response = f
            .service
            .query_nearby(caller, nowhere, QueryOptions::default())
            .unwrap();
        let mut hops = 0;
        while response.trend != Trend::Tunneling {
            response = f
                .service
                .query_nearby(caller, nowhere, QueryOptions::default())
                .unwrap();
            hops += 1;
            assert!(hops < 100, "never entered tunneling");
        }

        assert_eq!(response.results.len(), 3);
        for result in &response.results {
            assert_eq!(result.tier, DistanceTier::Far);
            assert_eq!(result.cell, hotspot_cell);
        }
        // Radius stayed bounded the whole way.
        assert!(response.radius_km <= 0.6);
    }

    #[test]
    fn test_results_ordered_by_tier_then_user() {
        let f = fixture(open_config());
        let here = coord(48.85, 2.35);

        f.service.update_location(UserId::new(9), here).unwrap();
        f.service.update_location(UserId::new(4), here).unwrap();
        let home = f.service.index().cell_of(UserId::new(9)).unwrap();
        let neighbor = aura_geo::neighbors(&home).unwrap()[0].clone();
        let neighbor_center = aura_geo::approx_center(&neighbor).unwrap();
        f.service.update_location(UserId::new(2), neighbor_center).unwrap();

        let response = f
            .service
            .query_nearby(UserId::new(1), here, QueryOptions::default())
            .unwrap();

        let order: Vec<(DistanceTier, UserId)> = response
            .results
            .iter()
            .map(|r| (r.tier, r.user))
            .collect();
        assert_eq!(
            order,
            vec![
                (DistanceTier::Same, UserId::new(4)),
                (DistanceTier::Same, UserId::new(9)),
                (DistanceTier::Near, UserId::new(2)),
            ]
        );
    }

    #[test]
    fn test_end_session_drops_all_state() {
        let f = fixture(open_config());
        let user = UserId::new(1);
        let here = coord(48.85, 2.35);

        f.service
            .query_nearby(user, here, QueryOptions::default())
            .unwrap();
        assert!(f.service.index().contains(user));
        assert!(f.service.controller().state_of(user).is_some());

        f.service.end_session(user);
        assert!(!f.service.index().contains(user));
        assert!(f.service.controller().state_of(user).is_none());
    }

    #[test]
    fn test_sweep_once_uses_service_clock() {
        let f = fixture(open_config());
        let user = UserId::new(1);

        f.service
            .query_nearby(user, coord(10.0, 10.0), QueryOptions::default())
            .unwrap();

        f.clock.advance(Duration::from_secs(301));
        let (evicted, _) = f.service.sweep_once();
        assert_eq!(evicted, 1);
        assert!(!f.service.index().contains(user));
    }
}
