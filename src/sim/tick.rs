//! Fixed timestep simulation tick
//!
//! One tick, in order: phase transitions from input, ship control,
//! integration of every pool, collision passes, wave progression.

use glam::Vec2;
use rand::Rng;

use super::collision::{Aabb, aabb_overlap, circles_overlap, collect_hits};
use super::integrate::step;
use super::state::{Asteroid, GameEvent, GamePhase, World};
use crate::consts::*;
use crate::{heading, normalize_angle};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Turn rate in [-1, 1] (negative = counter-clockwise)
    pub turn: f32,
    /// Main engine on
    pub thrust: bool,
    /// Fire held
    pub fire: bool,
    /// Start a run from the title screen
    pub start: bool,
    /// Pause toggle
    pub pause: bool,
    /// Restart after game over
    pub restart: bool,
    /// Demo mode - the ship flies itself
    pub autopilot: bool,
}

impl TickInput {
    /// Drop one-shot flags once a tick has consumed them
    pub fn clear_one_shots(&mut self) {
        self.start = false;
        self.pause = false;
        self.restart = false;
    }
}

/// Advance the world by one fixed timestep.
///
/// Events are appended to `world.events`; the caller drains them.
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match world.phase {
            GamePhase::Playing => {
                world.phase = GamePhase::Paused;
                log::debug!("Paused at tick {}", world.time_ticks);
                return;
            }
            GamePhase::Paused => world.phase = GamePhase::Playing,
            _ => {}
        }
    }

    match world.phase {
        GamePhase::Paused => return,
        GamePhase::Title | GamePhase::GameOver => {
            // Attract mode: background keeps drifting
            step(&mut world.stars, dt, &world.bounds);
            step(&mut world.particles, dt, &world.bounds);

            let begin = match world.phase {
                GamePhase::Title => input.start,
                _ => input.restart || input.start,
            };
            if begin {
                world.start_game();
                log::info!("Run started (seed {})", world.seed);
            }
            return;
        }
        GamePhase::Playing => {}
    }

    world.time_ticks += 1;

    let input = if input.autopilot {
        autopilot(world, input)
    } else {
        input.clone()
    };

    update_ship(world, &input, dt);

    // Integrate every pool before any collision test reads positions
    let bounds = world.bounds;
    step(&mut world.stars, dt, &bounds);
    step(&mut world.bullets, dt, &bounds);
    step(&mut world.asteroids, dt, &bounds);
    step(&mut world.enemies, dt, &bounds);
    step(&mut world.particles, dt, &bounds);

    run_collisions(world);

    if world.phase == GamePhase::Playing
        && world.asteroids.active_count() == 0
        && world.enemies.active_count() == 0
    {
        world.next_wave();
    }
}

/// Steer toward the nearest asteroid and fire when roughly aligned
fn autopilot(world: &World, input: &TickInput) -> TickInput {
    let mut input = input.clone();
    let ship = &world.ship;

    let target = world
        .asteroids
        .iter_active()
        .map(|(_, a)| a.pos)
        .min_by(|a, b| {
            a.distance_squared(ship.pos)
                .partial_cmp(&b.distance_squared(ship.pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    input.thrust = false;
    input.fire = false;
    input.turn = 0.0;

    if let Some(target) = target {
        let to_target = target - ship.pos;
        let want = to_target.y.atan2(to_target.x);
        let delta = normalize_angle(want - ship.angle);
        input.turn = (delta * 4.0).clamp(-1.0, 1.0);
        input.fire = delta.abs() < 0.15;
        // Back off when a rock gets close; drift otherwise
        input.thrust = to_target.length() > 250.0 && delta.abs() < 0.5;
    }

    input
}

/// Ship rotation, thrust, drag, firing and respawn
fn update_ship(world: &mut World, input: &TickInput, dt: f32) {
    if !world.ship.alive {
        if world.lives == 0 {
            return;
        }
        world.ship.respawn_timer -= dt;
        if world.ship.respawn_timer <= 0.0 {
            world.ship = super::state::Ship::new(world.bounds.center());
            world.events.push(GameEvent::ShipRespawned);
        }
        return;
    }

    let ship = &mut world.ship;
    ship.angle = normalize_angle(ship.angle + input.turn.clamp(-1.0, 1.0) * SHIP_TURN_SPEED * dt);
    ship.thrusting = input.thrust;
    if input.thrust {
        ship.vel += heading(ship.angle) * SHIP_THRUST * dt;
    }
    ship.vel *= SHIP_DRAG;
    ship.vel = ship.vel.clamp_length_max(SHIP_MAX_SPEED);
    ship.pos = world.bounds.wrap(ship.pos + ship.vel * dt);

    ship.invulnerable_timer = (ship.invulnerable_timer - dt).max(0.0);
    ship.fire_cooldown = (ship.fire_cooldown - dt).max(0.0);

    if input.thrust {
        world.emit_exhaust();
    }

    if input.fire && world.ship.fire_cooldown <= 0.0 {
        let nose = world.ship.nose();
        let vel = heading(world.ship.angle) * BULLET_SPEED + world.ship.vel;
        // A full bullet pool means the trigger simply does nothing this tick
        if world.spawn_bullet(nose, vel).is_ok() {
            world.ship.fire_cooldown = FIRE_COOLDOWN_SECS;
            world.events.push(GameEvent::BulletFired);
        }
    }
}

/// All collision passes for one tick: bullets vs asteroids, bullets vs
/// enemies, ship vs asteroids, ship vs enemies.
///
/// Each pass detects against the positions integrated this tick, then
/// resolves. Bullets consumed by one pass are inactive for the next.
pub fn run_collisions(world: &mut World) {
    bullets_vs_asteroids(world);
    bullets_vs_enemies(world);
    ship_vs_hazards(world);
}

fn bullets_vs_asteroids(world: &mut World) {
    let hits = collect_hits(&world.bullets, &world.asteroids, |b, a| {
        circles_overlap(b.pos, b.radius, a.pos, a.radius())
    });
    if hits.is_empty() {
        return;
    }

    // Deactivate everything first so spawns below cannot reuse a slot that a
    // later hit pair still refers to.
    let mut destroyed: Vec<Asteroid> = Vec::new();
    for &(bullet, asteroid) in &hits {
        world.bullets.deactivate(bullet);
        if let Some(a) = world.asteroids.get(asteroid) {
            destroyed.push(a.clone());
            world.asteroids.deactivate(asteroid);
        }
    }

    for asteroid in destroyed {
        destroy_asteroid(world, &asteroid);
    }
}

/// Score, split into two children of the next tier, explode
fn destroy_asteroid(world: &mut World, asteroid: &Asteroid) {
    let size = asteroid.size();
    world.score += size.points();
    world.events.push(GameEvent::AsteroidDestroyed {
        size,
        pos: asteroid.pos,
    });

    if let Some(child) = size.split_into() {
        let base_speed = asteroid.vel.length().max(ASTEROID_MIN_SPEED) * 1.3;
        let base_dir = asteroid.vel.normalize_or(Vec2::X);
        for side in [-1.0f32, 1.0] {
            let spread = world.rng().random_range(0.3f32..0.9) * side;
            let vel = Vec2::from_angle(spread).rotate(base_dir) * base_speed;
            let offset = vel.normalize_or_zero() * child.radius() * 0.5;
            // Children that do not fit are dropped and counted by the pool
            let _ = world.spawn_asteroid(child, asteroid.pos + offset, vel);
        }
    }

    world.emit_explosion(asteroid.pos, asteroid.vel, size.intensity());
}

fn bullets_vs_enemies(world: &mut World) {
    let hits = collect_hits(&world.bullets, &world.enemies, |b, e| {
        aabb_overlap(
            &Aabb::around_circle(b.pos, b.radius),
            &Aabb::new(e.pos, e.half_extents()),
        )
    });

    let mut killed = Vec::new();
    for (bullet, enemy) in hits {
        world.bullets.deactivate(bullet);
        if let Some(e) = world.enemies.get_mut(enemy) {
            e.health = e.health.saturating_sub(1);
            if e.health == 0 {
                killed.push((e.kind, e.pos, e.vel));
                world.enemies.deactivate(enemy);
            }
        }
    }

    for (kind, pos, vel) in killed {
        world.score += kind.points();
        world.events.push(GameEvent::EnemyDestroyed { kind, pos });
        world.emit_explosion(pos, vel, 2);
    }
}

fn ship_vs_hazards(world: &mut World) {
    if !world.ship.is_vulnerable() {
        return;
    }
    let ship_pos = world.ship.pos;
    let ship_radius = world.ship.radius;

    let rock = world
        .asteroids
        .iter_active()
        .find(|(_, a)| circles_overlap(ship_pos, ship_radius, a.pos, a.radius()))
        .map(|(i, _)| i);

    if let Some(index) = rock {
        if let Some(a) = world.asteroids.get(index).cloned() {
            world.asteroids.deactivate(index);
            destroy_asteroid(world, &a);
        }
        kill_ship(world);
        return;
    }

    let ship_box = Aabb::around_circle(ship_pos, ship_radius);
    let rammed = world
        .enemies
        .iter_active()
        .find(|(_, e)| aabb_overlap(&ship_box, &Aabb::new(e.pos, e.half_extents())))
        .map(|(i, e)| (i, e.kind, e.pos, e.vel));

    if let Some((index, kind, pos, vel)) = rammed {
        world.enemies.deactivate(index);
        world.events.push(GameEvent::EnemyDestroyed { kind, pos });
        world.emit_explosion(pos, vel, 2);
        kill_ship(world);
    }
}

fn kill_ship(world: &mut World) {
    let pos = world.ship.pos;
    let vel = world.ship.vel;
    world.ship.alive = false;
    world.ship.thrusting = false;
    world.ship.respawn_timer = SHIP_RESPAWN_SECS;
    world.lives = world.lives.saturating_sub(1);
    world.events.push(GameEvent::ShipDestroyed { pos });
    world.emit_explosion(pos, vel, 4);

    if world.lives == 0 {
        world.phase = GamePhase::GameOver;
        world.events.push(GameEvent::GameOver { score: world.score });
        log::info!(
            "Game over: score {} on wave {} after {} ticks",
            world.score,
            world.wave,
            world.time_ticks
        );
    } else {
        log::debug!("Ship destroyed, {} lives left", world.lives);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::{AsteroidSize, EnemyKind, ParticleKind, explosion_particle_count};

    /// A world in `Playing` with every gameplay pool emptied
    fn empty_playing_world() -> World {
        let mut world = World::new(&Settings::default()).unwrap();
        world.start_game();
        world.asteroids.clear();
        world.enemies.clear();
        world.particles.clear();
        world.events.clear();
        world
    }

    #[test]
    fn test_tick_title_to_playing() {
        let mut world = World::new(&Settings::default()).unwrap();
        assert_eq!(world.phase, GamePhase::Title);

        tick(&mut world, &TickInput::default(), SIM_DT);
        assert_eq!(world.phase, GamePhase::Title);

        let input = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut world, &input, SIM_DT);
        assert_eq!(world.phase, GamePhase::Playing);
        assert_eq!(world.wave, 1);
    }

    #[test]
    fn test_tick_pause() {
        let mut world = empty_playing_world();
        // Keep the wave from clearing underneath us
        world
            .spawn_asteroid(AsteroidSize::Large, Vec2::new(50.0, 50.0), Vec2::ZERO)
            .unwrap();

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut world, &pause, SIM_DT);
        assert_eq!(world.phase, GamePhase::Paused);

        let ticks = world.time_ticks;
        tick(&mut world, &TickInput::default(), SIM_DT);
        assert_eq!(world.time_ticks, ticks);

        tick(&mut world, &pause, SIM_DT);
        assert_eq!(world.phase, GamePhase::Playing);
        assert_eq!(world.time_ticks, ticks + 1);
    }

    #[test]
    fn test_bullet_hits_asteroid_and_splits() {
        let mut world = empty_playing_world();
        world.bullets.clear();

        let rock = world
            .spawn_asteroid(AsteroidSize::Large, Vec2::new(100.0, 100.0), Vec2::new(20.0, 0.0))
            .unwrap();
        assert_eq!(world.asteroids.get(rock).unwrap().radius(), 30.0);
        world
            .spawn_bullet(Vec2::new(110.0, 100.0), Vec2::ZERO)
            .unwrap();

        run_collisions(&mut world);

        assert_eq!(world.bullets.active_count(), 0);
        let children: Vec<_> = world.asteroids.iter_active().map(|(_, a)| a.clone()).collect();
        assert_eq!(children.len(), 2);
        for child in &children {
            assert_eq!(child.size(), AsteroidSize::Medium);
            assert_eq!(child.radius(), 15.0);
        }
        assert_eq!(
            world.particles.active_count() as u32,
            explosion_particle_count(AsteroidSize::Large.intensity())
        );
        assert_eq!(world.score, AsteroidSize::Large.points());
        assert!(world.events.iter().any(|e| matches!(
            e,
            GameEvent::AsteroidDestroyed {
                size: AsteroidSize::Large,
                ..
            }
        )));
    }

    #[test]
    fn test_small_asteroid_does_not_split() {
        let mut world = empty_playing_world();
        world
            .spawn_asteroid(AsteroidSize::Small, Vec2::new(300.0, 300.0), Vec2::ZERO)
            .unwrap();
        world.spawn_bullet(Vec2::new(301.0, 300.0), Vec2::ZERO).unwrap();
        run_collisions(&mut world);
        assert_eq!(world.asteroids.active_count(), 0);
    }

    #[test]
    fn test_two_bullets_one_asteroid_splits_once() {
        let mut world = empty_playing_world();
        world.bullets.clear();
        world
            .spawn_asteroid(AsteroidSize::Large, Vec2::new(400.0, 100.0), Vec2::ZERO)
            .unwrap();
        world.spawn_bullet(Vec2::new(395.0, 100.0), Vec2::ZERO).unwrap();
        world.spawn_bullet(Vec2::new(405.0, 100.0), Vec2::ZERO).unwrap();

        run_collisions(&mut world);

        // Both projectiles are consumed, the rock splits once
        assert_eq!(world.bullets.active_count(), 0);
        assert_eq!(world.asteroids.active_count(), 2);
        assert_eq!(world.score, AsteroidSize::Large.points());
    }

    #[test]
    fn test_full_asteroid_pool_drops_children() {
        let settings = Settings {
            max_asteroids: 2,
            initial_asteroids: 1,
            ..Settings::default()
        };
        let mut world = World::new(&settings).unwrap();
        world.start_game();
        world.asteroids.clear();
        world
            .spawn_asteroid(AsteroidSize::Large, Vec2::new(100.0, 500.0), Vec2::ZERO)
            .unwrap();
        world
            .spawn_asteroid(AsteroidSize::Large, Vec2::new(700.0, 500.0), Vec2::ZERO)
            .unwrap();
        world.spawn_bullet(Vec2::new(100.0, 500.0), Vec2::ZERO).unwrap();

        run_collisions(&mut world);

        // One slot freed by the hit, two children requested
        assert_eq!(world.asteroids.active_count(), 2);
        assert_eq!(world.asteroids.dropped(), 1);
    }

    #[test]
    fn test_enemy_needs_health_hits() {
        let mut world = empty_playing_world();
        world.bullets.clear();
        world
            .spawn_enemy(EnemyKind::Baiter, Vec2::new(200.0, 80.0), 1.0, 0.0)
            .unwrap();

        world.spawn_bullet(Vec2::new(200.0, 80.0), Vec2::ZERO).unwrap();
        run_collisions(&mut world);
        assert_eq!(world.enemies.active_count(), 1);
        assert_eq!(world.score, 0);

        world.spawn_bullet(Vec2::new(210.0, 82.0), Vec2::ZERO).unwrap();
        run_collisions(&mut world);
        assert_eq!(world.enemies.active_count(), 0);
        assert_eq!(world.score, EnemyKind::Baiter.points());
    }

    #[test]
    fn test_ship_collision_costs_a_life() {
        let mut world = empty_playing_world();
        world.ship.invulnerable_timer = 0.0;
        let lives = world.lives;
        let ship_pos = world.ship.pos;
        world
            .spawn_asteroid(AsteroidSize::Medium, ship_pos + Vec2::new(5.0, 0.0), Vec2::ZERO)
            .unwrap();

        run_collisions(&mut world);

        assert!(!world.ship.alive);
        assert_eq!(world.lives, lives - 1);
        assert!(
            world
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::ShipDestroyed { .. }))
        );
    }

    #[test]
    fn test_invulnerable_ship_ignores_hazards() {
        let mut world = empty_playing_world();
        assert!(world.ship.invulnerable_timer > 0.0);
        let ship_pos = world.ship.pos;
        world
            .spawn_asteroid(AsteroidSize::Large, ship_pos, Vec2::ZERO)
            .unwrap();
        run_collisions(&mut world);
        assert!(world.ship.alive);
        assert_eq!(world.asteroids.active_count(), 1);
    }

    #[test]
    fn test_last_life_ends_the_run() {
        let mut world = empty_playing_world();
        world.lives = 1;
        world.ship.invulnerable_timer = 0.0;
        let ship_pos = world.ship.pos;
        world
            .spawn_enemy(EnemyKind::Lander, ship_pos, 1.0, 0.0)
            .unwrap();

        run_collisions(&mut world);
        assert_eq!(world.phase, GamePhase::GameOver);

        let restart = TickInput {
            restart: true,
            ..Default::default()
        };
        tick(&mut world, &restart, SIM_DT);
        assert_eq!(world.phase, GamePhase::Playing);
        assert_eq!(world.lives, world.config.starting_lives);
        assert_eq!(world.score, 0);
    }

    #[test]
    fn test_ship_respawns_after_delay() {
        let mut world = empty_playing_world();
        world
            .spawn_asteroid(AsteroidSize::Large, Vec2::new(20.0, 20.0), Vec2::ZERO)
            .unwrap();
        world.ship.alive = false;
        world.ship.respawn_timer = SHIP_RESPAWN_SECS;

        let ticks = (SHIP_RESPAWN_SECS / SIM_DT).ceil() as usize + 1;
        for _ in 0..ticks {
            tick(&mut world, &TickInput::default(), SIM_DT);
        }
        assert!(world.ship.alive);
        assert_eq!(world.ship.pos, world.bounds.center());
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let mut world = empty_playing_world();
        world
            .spawn_asteroid(AsteroidSize::Large, Vec2::new(20.0, 20.0), Vec2::ZERO)
            .unwrap();
        world.bullets.clear();
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut world, &fire, SIM_DT);
        assert_eq!(world.drain_events(), vec![GameEvent::BulletFired]);
        tick(&mut world, &fire, SIM_DT);
        assert_eq!(world.bullets.active_count(), 1);
        assert!(!world.events.contains(&GameEvent::BulletFired));
    }

    #[test]
    fn test_thrust_emits_exhaust() {
        let mut world = empty_playing_world();
        world
            .spawn_asteroid(AsteroidSize::Large, Vec2::new(20.0, 20.0), Vec2::ZERO)
            .unwrap();
        let thrust = TickInput {
            thrust: true,
            ..Default::default()
        };
        tick(&mut world, &thrust, SIM_DT);
        assert!(world.ship.vel.length() > 0.0);
        assert!(
            world
                .particles
                .iter_active()
                .any(|(_, p)| p.kind == ParticleKind::Ember)
        );
    }

    #[test]
    fn test_cleared_wave_starts_next() {
        let mut world = empty_playing_world();
        assert_eq!(world.wave, 1);
        tick(&mut world, &TickInput::default(), SIM_DT);
        assert_eq!(world.wave, 2);
        assert!(world.events.contains(&GameEvent::WaveStarted(2)));
    }

    #[test]
    fn test_events_accumulate_across_ticks() {
        let mut world = empty_playing_world();
        world
            .spawn_asteroid(AsteroidSize::Large, Vec2::new(20.0, 20.0), Vec2::ZERO)
            .unwrap();
        world.bullets.clear();
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut world, &fire, SIM_DT);
        world.ship.fire_cooldown = 0.0;
        tick(&mut world, &fire, SIM_DT);

        let fired = world
            .drain_events()
            .iter()
            .filter(|e| **e == GameEvent::BulletFired)
            .count();
        assert_eq!(fired, 2);
        assert!(world.events.is_empty());
    }

    #[test]
    fn test_determinism() {
        let mut a = World::new(&Settings::default()).unwrap();
        let mut b = World::new(&Settings::default()).unwrap();
        let start = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut a, &start, SIM_DT);
        tick(&mut b, &start, SIM_DT);

        let demo = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..600 {
            tick(&mut a, &demo, SIM_DT);
            tick(&mut b, &demo, SIM_DT);
        }

        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.score, b.score);
        assert_eq!(a.stats(), b.stats());
        assert_eq!(a.ship.pos, b.ship.pos);
    }
}
