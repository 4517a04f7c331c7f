//! AURA Radar Demo
//!
//! Seeds a small world - a dense downtown crowd and a lot of empty ocean -
//! then walks one user through it, showing the aura contract, expand, and
//! finally tunnel to a hotspot when nothing is reachable.

use std::sync::Arc;
use std::time::Duration;

use aura_core::{
    Coordinate, DistanceTier, EngineConfig, PrivacyConfig, SystemClock, Trend, UserId,
};
use aura_engine::AuraState;
use aura_index::{HotspotRegistry, HotspotTable, OccupancyIndex};
use aura_runtime::{spawn_sweeper, InMemoryInterests, ProximityService, QueryOptions};
use aura_test::PopulationSimulator;

fn tier_counts(results: &[aura_core::NearbyResult]) -> (usize, usize, usize) {
    let same = results.iter().filter(|r| r.tier == DistanceTier::Same).count();
    let near = results.iter().filter(|r| r.tier == DistanceTier::Near).count();
    let far = results.iter().filter(|r| r.tier == DistanceTier::Far).count();
    (same, near, far)
}

fn describe(label: &str, state: Option<&AuraState>) {
    if let Some(state) = state {
        println!(
            "    [{label}] radius {:.2} km -> {:.2} km, density {:.2}/km², trend {:?}",
            state.current_radius_km, state.target_radius_km, state.density, state.trend
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║        AURA Radar Demo - Elastic Proximity Engine        ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();
    println!(
        "grid: level 14 cells ≈ {:.2} km tall",
        aura_geo::cell_span_km(14)
    );
    println!();

    let config = EngineConfig {
        privacy: PrivacyConfig {
            min_anonymity: 3,
            max_coarsening: 6,
        },
        ..EngineConfig::default()
    };

    let index = Arc::new(OccupancyIndex::new(16, config.service.staleness));
    let interests = Arc::new(InMemoryInterests::new());
    let hotspots = Arc::new(HotspotRegistry::empty());
    let sweep_interval = config.service.sweep_interval;
    let service = Arc::new(ProximityService::new(
        config,
        index,
        hotspots,
        interests.clone(),
        Arc::new(SystemClock),
    ));

    let sweeper = spawn_sweeper(service.clone(), sweep_interval);

    // A downtown crowd, half into music, half into chess.
    let mut sim = PopulationSimulator::with_seed(2024);
    let downtown = sim.place_cluster(&service, 40.7580, -73.9855, 0.02, 250)?;
    for (i, user) in downtown.iter().enumerate() {
        let tag = if i % 2 == 0 { "music" } else { "chess" };
        interests.set(*user, [tag]);
    }
    println!("seeded {} users around Times Square", downtown.len());

    // Register downtown as a hotspot for users stranded elsewhere.
    let anchor = service
        .index()
        .cell_of(downtown[0])
        .and_then(|cell| cell.ancestor_at(8))
        .ok_or("no anchor cell for hotspot")?;
    service.hotspots().reload(HotspotTable::new(1, vec![anchor]));
    println!("hotspot table v1 loaded");
    println!();

    let me = UserId::new(777_000);
    let times_square = Coordinate::new(40.7580, -73.9855)?;

    println!("-- standing in the crowd --");
    for _ in 0..6 {
        let response = service.query_nearby(me, times_square, QueryOptions::default())?;
        let (same, near, far) = tier_counts(&response.results);
        println!(
            "    {} nearby (same {same} / near {near} / far {far}), radius {:.2} km, {:?}",
            response.results.len(),
            response.radius_km,
            response.trend
        );
    }
    describe("aura", service.controller().state_of(me).as_ref());
    println!();

    println!("-- same crowd, music lovers only --");
    let opts = QueryOptions {
        interest_filter: vec!["music".to_string()],
    };
    let response = service.query_nearby(me, times_square, opts)?;
    println!("    {} matches share an interest", response.results.len());
    println!();

    println!("-- adrift in the south pacific --");
    let adrift = Coordinate::new(-44.0, -130.0)?;
    let mut step = 0u32;
    loop {
        let response = service.query_nearby(me, adrift, QueryOptions::default())?;
        step += 1;
        if step % 5 == 0 || response.trend == Trend::Tunneling {
            println!(
                "    query {step:>2}: radius {:.1} km, {:?}, {} reachable",
                response.radius_km,
                response.trend,
                response.results.len()
            );
        }
        if response.trend == Trend::Tunneling {
            let (_, _, far) = tier_counts(&response.results);
            println!("    tunneled: {far} users surfaced from the hotspot table");
            break;
        }
        if step > 80 {
            println!("    gave up before tunneling (unexpected)");
            break;
        }
    }
    describe("aura", service.controller().state_of(me).as_ref());
    println!();

    service.end_session(me);
    sweeper.abort();
    println!("session ended, goodbye");
    Ok(())
}
