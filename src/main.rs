//! Arcade Pools headless demo
//!
//! Runs the simulation on autopilot with a simulated 60 Hz frame clock and
//! logs pool occupancy. Usage: `arcade-pools [settings.json] [ticks]`

use std::path::Path;

use arcade_pools::render::build_draw_list;
use arcade_pools::sim::{GameEvent, GamePhase, TickInput, World};
use arcade_pools::{FixedStep, Settings};

/// Default run length (one minute of simulated time)
const DEFAULT_TICKS: u64 = 60 * 60;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load_or_default(Path::new(&path)),
        None => Settings::default(),
    };
    let ticks = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TICKS);

    log::info!(
        "Arcade Pools starting: seed {}, quality {}, {} ticks",
        settings.seed,
        settings.quality.as_str(),
        ticks
    );

    let mut world = match World::new(&settings) {
        Ok(world) => world,
        Err(e) => {
            log::error!("Invalid settings: {}", e);
            std::process::exit(1);
        }
    };
    let mut stepper = FixedStep::default();
    let mut input = TickInput {
        start: true,
        autopilot: true,
        ..Default::default()
    };

    let mut total = 0u64;
    let mut peak_instances = 0usize;
    let mut asteroids_destroyed = 0u64;
    let mut ships_lost = 0u64;
    while total < ticks {
        // Simulated frame: exactly one tick of wall time
        total += stepper.advance(&mut world, &mut input, stepper.dt()) as u64;

        for event in world.drain_events() {
            match event {
                GameEvent::AsteroidDestroyed { .. } => asteroids_destroyed += 1,
                GameEvent::ShipDestroyed { .. } => ships_lost += 1,
                _ => {}
            }
        }

        if world.phase == GamePhase::GameOver {
            input.restart = true;
        }

        peak_instances = peak_instances.max(build_draw_list(&world).instance_count());

        if total % 60 == 0 {
            let stats = world.stats();
            log::debug!(
                "t={}s wave={} score={} lives={} bullets={}/{} asteroids={}/{} enemies={}/{} particles={}/{} dropped={}",
                total / 60,
                world.wave,
                world.score,
                world.lives,
                stats.bullets.active,
                stats.bullets.capacity,
                stats.asteroids.active,
                stats.asteroids.capacity,
                stats.enemies.active,
                stats.enemies.capacity,
                stats.particles.active,
                stats.particles.capacity,
                stats.total_dropped(),
            );
        }
    }

    let stats = world.stats();
    println!("Ticks:           {}", total);
    println!("Wave reached:    {}", world.wave);
    println!("Score:           {}", world.score);
    println!("Peak instances:  {}", peak_instances);
    println!("Rocks destroyed: {}", asteroids_destroyed);
    println!("Ships lost:      {}", ships_lost);
    println!(
        "Dropped spawns:  bullets {} / asteroids {} / enemies {} / particles {}",
        stats.bullets.dropped,
        stats.asteroids.dropped,
        stats.enemies.dropped,
        stats.particles.dropped
    );
}
