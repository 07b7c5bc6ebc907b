//! Tower-defense arena demo
//!
//! Runs a fixed-step headless simulation on top of the collision engine and
//! logs what happens. An optional TOML or RON engine configuration can be
//! passed as the first argument.

mod arena;

use arena::{Arena, ArenaError};
use collision_engine::foundation::logging;
use collision_engine::prelude::*;

const TICKS: u32 = 1200;
const DT: f32 = 1.0 / 60.0;

fn load_config() -> Result<EngineConfig, ArenaError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading engine configuration from {}", path);
            let config = EngineConfig::load_from_file(&path)?;
            config.validate()?;
            Ok(config)
        }
        None => {
            log::info!("No configuration given, using the tower-defense defaults");
            Ok(EngineConfig::default())
        }
    }
}

fn run() -> Result<(), ArenaError> {
    let config = load_config()?;
    let mut arena = Arena::new(&config)?;

    for tick in 0..TICKS {
        arena.step(DT)?;
        if tick % 300 == 0 {
            let stats = arena.stats();
            log::info!(
                "Tick {}: {} actors, {} destroyed, {} leaked",
                tick,
                arena.actor_count(),
                stats.destroyed,
                stats.leaked
            );
        }
    }

    for probe in [Vec2::zeros(), Vec2::new(120.0, 45.0), Vec2::new(350.0, 0.0)] {
        match arena.pick(probe) {
            Some(id) => log::info!("Probe {:?} picks {:?} at {:?}", probe, id, arena.position_of(id)),
            None => log::info!("Probe {:?} hits nothing", probe),
        }
    }

    for (id, snapshot) in arena.colliders() {
        log::debug!("{:?}: {:?} in {:?}", id, snapshot.group, snapshot.bounds);
    }

    let stats = arena.stats();
    log::info!(
        "Spawned {} enemies, fired {} shots, destroyed {}, leaked {}",
        stats.spawned,
        stats.shots,
        stats.destroyed,
        stats.leaked
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level(logging::LevelFilter::Info);

    log::info!("Starting arena demo");

    match run() {
        Ok(()) => {
            log::info!("Arena demo finished successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Arena error: {}", e);
            Err(e.into())
        }
    }
}
