//! World state and entity records
//!
//! Everything the simulation mutates lives in `World`: one pool per entity
//! type, the player ship, the seeded RNG and the run counters. The world is
//! serializable so a run can be snapshotted and replayed deterministically.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::integrate::{Body, Boundary};
use super::pool::{Pool, SpawnError};
use crate::consts::*;
use crate::settings::{Settings, SettingsError};
use crate::{Bounds, heading};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Attract screen, waiting for start
    Title,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Run ended, waiting for restart
    GameOver,
}

/// Something gameplay glue (audio, HUD) may want to react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BulletFired,
    AsteroidDestroyed { size: AsteroidSize, pos: Vec2 },
    EnemyDestroyed { kind: EnemyKind, pos: Vec2 },
    ShipDestroyed { pos: Vec2 },
    ShipRespawned,
    WaveStarted(u32),
    GameOver { score: u64 },
}

// ---------------------------------------------------------------------------
// Particles

/// Particle behaviour selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Bright explosion spark
    #[default]
    Spark,
    /// Slow, expanding puff
    Smoke,
    /// Heavy fragment that keeps its momentum
    Debris,
    /// Thruster exhaust; removed at the screen edge instead of wrapping
    Ember,
}

impl ParticleKind {
    /// Multiplicative velocity damping applied once per tick
    pub fn drag(self) -> f32 {
        match self {
            ParticleKind::Spark => 0.96,
            ParticleKind::Smoke => 0.90,
            ParticleKind::Debris => 0.99,
            ParticleKind::Ember => 0.98,
        }
    }

    pub fn boundary(self) -> Boundary {
        match self {
            ParticleKind::Ember => Boundary::Cull,
            _ => Boundary::Wrap,
        }
    }

    /// Base RGBA color
    pub fn color(self) -> [f32; 4] {
        match self {
            ParticleKind::Spark => [1.0, 0.85, 0.4, 1.0],
            ParticleKind::Smoke => [0.5, 0.5, 0.55, 0.6],
            ParticleKind::Debris => [0.75, 0.7, 0.65, 1.0],
            ParticleKind::Ember => [1.0, 0.45, 0.1, 1.0],
        }
    }
}

/// A visual particle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds remaining
    pub life: f32,
    /// Lifetime at spawn, for fading
    pub max_life: f32,
    pub color: [f32; 4],
    /// Alpha at spawn; `color[3]` fades from this
    #[serde(default)]
    pub base_alpha: f32,
    pub size: f32,
    pub kind: ParticleKind,
}

impl Particle {
    pub fn new(kind: ParticleKind, pos: Vec2, vel: Vec2, life: f32, size: f32) -> Self {
        let color = kind.color();
        Self {
            pos,
            vel,
            life,
            max_life: life,
            color,
            base_alpha: color[3],
            size,
            kind,
        }
    }

    /// Remaining fraction of life in [0, 1]
    pub fn life_fraction(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0)
    }
}

impl Body for Particle {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    fn vel(&self) -> Vec2 {
        self.vel
    }

    fn life_mut(&mut self) -> Option<&mut f32> {
        Some(&mut self.life)
    }

    fn boundary(&self) -> Boundary {
        self.kind.boundary()
    }

    fn secondary(&mut self, _dt: f32) {
        self.vel *= self.kind.drag();
        match self.kind {
            ParticleKind::Smoke => self.size *= 1.01,
            ParticleKind::Spark | ParticleKind::Ember => self.size *= 0.995,
            ParticleKind::Debris => {}
        }
        self.color[3] = self.base_alpha * self.life_fraction();
    }
}

// ---------------------------------------------------------------------------
// Asteroids

/// Number of outline points per asteroid
pub const ASTEROID_SHAPE_POINTS: usize = 10;

/// Asteroid size tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AsteroidSize {
    #[default]
    Large,
    Medium,
    Small,
}

impl AsteroidSize {
    /// Collision radius for this tier
    pub fn radius(self) -> f32 {
        match self {
            AsteroidSize::Large => 30.0,
            AsteroidSize::Medium => 15.0,
            AsteroidSize::Small => 7.5,
        }
    }

    pub fn points(self) -> u64 {
        match self {
            AsteroidSize::Large => 20,
            AsteroidSize::Medium => 50,
            AsteroidSize::Small => 100,
        }
    }

    /// Tier of the two children spawned on destruction
    pub fn split_into(self) -> Option<AsteroidSize> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }

    /// Explosion intensity when destroyed
    pub fn intensity(self) -> u32 {
        match self {
            AsteroidSize::Large => 3,
            AsteroidSize::Medium => 2,
            AsteroidSize::Small => 1,
        }
    }
}

/// A drifting, spinning rock. Radius is always derived from `size`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Current rotation (radians)
    pub angle: f32,
    /// Angular velocity (radians/s)
    pub spin: f32,
    size: AsteroidSize,
    radius: f32,
    /// Outline offsets from `pos` at zero rotation
    shape: [Vec2; ASTEROID_SHAPE_POINTS],
}

impl Default for Asteroid {
    fn default() -> Self {
        let size = AsteroidSize::default();
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            angle: 0.0,
            spin: 0.0,
            size,
            radius: size.radius(),
            shape: [Vec2::ZERO; ASTEROID_SHAPE_POINTS],
        }
    }
}

impl Asteroid {
    /// Build an asteroid with a jagged outline drawn from `rng`
    pub fn new(size: AsteroidSize, pos: Vec2, vel: Vec2, rng: &mut Pcg32) -> Self {
        let radius = size.radius();
        let mut shape = [Vec2::ZERO; ASTEROID_SHAPE_POINTS];
        for (i, point) in shape.iter_mut().enumerate() {
            let theta = i as f32 / ASTEROID_SHAPE_POINTS as f32 * TAU;
            let jitter: f32 = rng.random_range(0.75..1.15);
            *point = heading(theta) * radius * jitter;
        }
        Self {
            pos,
            vel,
            angle: rng.random_range(0.0..TAU),
            spin: rng.random_range(-1.5..1.5),
            size,
            radius,
            shape,
        }
    }

    pub fn size(&self) -> AsteroidSize {
        self.size
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn shape(&self) -> &[Vec2; ASTEROID_SHAPE_POINTS] {
        &self.shape
    }

    /// Outline points in world space at the current rotation
    pub fn outline(&self) -> impl Iterator<Item = Vec2> + '_ {
        let rot = Vec2::from_angle(self.angle);
        self.shape.iter().map(move |p| self.pos + rot.rotate(*p))
    }
}

impl Body for Asteroid {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    fn vel(&self) -> Vec2 {
        self.vel
    }

    fn secondary(&mut self, dt: f32) {
        self.angle = crate::normalize_angle(self.angle + self.spin * dt);
    }
}

// ---------------------------------------------------------------------------
// Bullets

/// A player projectile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds remaining
    pub life: f32,
    pub radius: f32,
}

impl Bullet {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self {
            pos,
            vel,
            life: BULLET_LIFE,
            radius: BULLET_RADIUS,
        }
    }
}

impl Body for Bullet {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    fn vel(&self) -> Vec2 {
        self.vel
    }

    fn life_mut(&mut self) -> Option<&mut f32> {
        Some(&mut self.life)
    }
}

// ---------------------------------------------------------------------------
// Enemies

/// Defender-style enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnemyKind {
    #[default]
    Lander,
    Baiter,
}

impl EnemyKind {
    /// Horizontal cruise speed (pixels/s)
    pub fn speed(self) -> f32 {
        match self {
            EnemyKind::Lander => 60.0,
            EnemyKind::Baiter => 140.0,
        }
    }

    /// Vertical bob amplitude (pixels) and angular frequency (rad/s)
    pub fn bob(self) -> (f32, f32) {
        match self {
            EnemyKind::Lander => (40.0, 2.0),
            EnemyKind::Baiter => (15.0, 5.0),
        }
    }

    pub fn half_extents(self) -> Vec2 {
        match self {
            EnemyKind::Lander => Vec2::new(10.0, 8.0),
            EnemyKind::Baiter => Vec2::new(14.0, 5.0),
        }
    }

    pub fn health(self) -> u8 {
        match self {
            EnemyKind::Lander => 1,
            EnemyKind::Baiter => 2,
        }
    }

    pub fn points(self) -> u64 {
        match self {
            EnemyKind::Lander => 150,
            EnemyKind::Baiter => 200,
        }
    }
}

/// A box-shaped enemy that cruises horizontally and bobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Enemy {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: EnemyKind,
    /// Bob phase (radians)
    pub phase: f32,
    pub health: u8,
}

impl Enemy {
    /// `direction` is the sign of horizontal travel
    pub fn new(kind: EnemyKind, pos: Vec2, direction: f32, phase: f32) -> Self {
        Self {
            pos,
            vel: Vec2::new(kind.speed() * direction.signum(), 0.0),
            kind,
            phase,
            health: kind.health(),
        }
    }

    pub fn half_extents(&self) -> Vec2 {
        self.kind.half_extents()
    }
}

impl Body for Enemy {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    fn vel(&self) -> Vec2 {
        self.vel
    }

    fn secondary(&mut self, dt: f32) {
        // Vertical velocity is the derivative of amp * sin(freq * t)
        let (amp, freq) = self.kind.bob();
        self.phase = (self.phase + freq * dt) % TAU;
        self.vel.y = amp * freq * self.phase.cos();
    }
}

// ---------------------------------------------------------------------------
// Starfield

/// Number of parallax layers
pub const STAR_LAYERS: u8 = 3;

/// A background star. Stars never expire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Star {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Parallax layer, 0 = farthest
    pub layer: u8,
    pub brightness: f32,
}

impl Star {
    pub fn new(layer: u8, pos: Vec2) -> Self {
        let layer = layer.min(STAR_LAYERS - 1);
        let (speed, brightness) = match layer {
            0 => (10.0, 0.3),
            1 => (25.0, 0.6),
            _ => (60.0, 1.0),
        };
        Self {
            pos,
            vel: Vec2::new(-speed, 0.0),
            layer,
            brightness,
        }
    }

    pub fn size(&self) -> f32 {
        1.0 + self.layer as f32 * 0.5
    }
}

impl Body for Star {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    fn vel(&self) -> Vec2 {
        self.vel
    }
}

// ---------------------------------------------------------------------------
// Ship

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Facing (radians, 0 = +x)
    pub angle: f32,
    pub radius: f32,
    pub alive: bool,
    /// Seconds until respawn while dead
    pub respawn_timer: f32,
    /// Seconds of remaining spawn protection
    pub invulnerable_timer: f32,
    /// Seconds until the gun can fire again
    pub fire_cooldown: f32,
    /// Whether thrust was applied this tick (for exhaust and rendering)
    #[serde(default)]
    pub thrusting: bool,
}

impl Ship {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            angle: -std::f32::consts::FRAC_PI_2, // Nose up (screen y grows downward)
            radius: SHIP_RADIUS,
            alive: true,
            respawn_timer: 0.0,
            invulnerable_timer: SHIP_INVULNERABLE_SECS,
            fire_cooldown: 0.0,
            thrusting: false,
        }
    }

    pub fn is_vulnerable(&self) -> bool {
        self.alive && self.invulnerable_timer <= 0.0
    }

    /// Muzzle position
    pub fn nose(&self) -> Vec2 {
        self.pos + heading(self.angle) * self.radius
    }
}

// ---------------------------------------------------------------------------
// World

/// Snapshot of one pool's occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStats {
    pub active: usize,
    pub capacity: usize,
    pub dropped: u64,
}

impl PoolStats {
    fn of<T>(pool: &Pool<T>) -> Self {
        Self {
            active: pool.active_count(),
            capacity: pool.capacity(),
            dropped: pool.dropped(),
        }
    }
}

/// Occupancy of every pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WorldStats {
    pub bullets: PoolStats,
    pub asteroids: PoolStats,
    pub enemies: PoolStats,
    pub particles: PoolStats,
    pub stars: PoolStats,
}

impl WorldStats {
    pub fn total_dropped(&self) -> u64 {
        self.bullets.dropped
            + self.asteroids.dropped
            + self.enemies.dropped
            + self.particles.dropped
            + self.stars.dropped
    }
}

/// Per-run tunables copied from `Settings`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub starting_lives: u8,
    pub initial_asteroids: u32,
    pub enemies_per_wave: u32,
}

/// Complete simulation state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub bounds: Bounds,
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    pub config: RunConfig,
    pub phase: GamePhase,
    pub score: u64,
    pub lives: u8,
    /// Current wave (1-based once play starts)
    pub wave: u32,
    /// Simulation tick counter (Playing ticks only)
    pub time_ticks: u64,
    pub ship: Ship,
    pub bullets: Pool<Bullet>,
    pub asteroids: Pool<Asteroid>,
    pub enemies: Pool<Enemy>,
    pub particles: Pool<Particle>,
    pub stars: Pool<Star>,
    /// Events raised since the last `drain_events`
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl World {
    /// Create a world in the `Title` phase with its starfield populated.
    ///
    /// Settings are validated first, so a world never has empty bounds.
    pub fn new(settings: &Settings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let bounds = Bounds::new(settings.screen_width, settings.screen_height);
        let mut world = Self {
            bounds,
            seed: settings.seed,
            rng: Pcg32::seed_from_u64(settings.seed),
            config: RunConfig {
                starting_lives: settings.starting_lives,
                initial_asteroids: settings.initial_asteroids,
                enemies_per_wave: settings.enemies_per_wave,
            },
            phase: GamePhase::Title,
            score: 0,
            lives: settings.starting_lives,
            wave: 0,
            time_ticks: 0,
            ship: Ship::new(bounds.center()),
            bullets: Pool::new(settings.max_bullets),
            asteroids: Pool::new(settings.max_asteroids),
            enemies: Pool::new(settings.max_enemies),
            particles: Pool::new(settings.max_particles()),
            stars: Pool::new(settings.max_stars()),
            events: Vec::new(),
        };
        world.populate_starfield();
        Ok(world)
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Reset run state and enter `Playing` at wave 1
    pub fn start_game(&mut self) {
        self.score = 0;
        self.lives = self.config.starting_lives;
        self.wave = 0;
        self.time_ticks = 0;
        self.ship = Ship::new(self.bounds.center());
        self.bullets.clear();
        self.asteroids.clear();
        self.enemies.clear();
        self.particles.clear();
        self.phase = GamePhase::Playing;
        self.next_wave();
    }

    /// Advance the wave counter and spawn its asteroids and enemies
    pub fn next_wave(&mut self) {
        self.wave += 1;
        let asteroid_count = self.config.initial_asteroids + self.wave - 1;
        let mut spawned = 0;
        for _ in 0..asteroid_count {
            let pos = self.edge_position_away_from_ship();
            let dir = self.rng.random_range(0.0..TAU);
            let speed = self.rng.random_range(ASTEROID_MIN_SPEED..ASTEROID_MAX_SPEED);
            if self
                .spawn_asteroid(AsteroidSize::Large, pos, heading(dir) * speed)
                .is_ok()
            {
                spawned += 1;
            }
        }

        for i in 0..self.config.enemies_per_wave {
            let kind = if self.wave % 3 == 0 && i % 2 == 1 {
                EnemyKind::Baiter
            } else {
                EnemyKind::Lander
            };
            let x = self.rng.random_range(0.0..self.bounds.width);
            let y = self.rng.random_range(0.1f32..0.4) * self.bounds.height;
            let direction = if self.rng.random::<bool>() { 1.0 } else { -1.0 };
            let phase = self.rng.random_range(0.0..TAU);
            let _ = self.spawn_enemy(kind, Vec2::new(x, y), direction, phase);
        }

        log::info!(
            "Wave {}: {} asteroids, {} enemies",
            self.wave,
            spawned,
            self.enemies.active_count()
        );
        self.events.push(GameEvent::WaveStarted(self.wave));
    }

    /// Random point on the screen border, at least a large asteroid's
    /// diameter from the ship when possible
    fn edge_position_away_from_ship(&mut self) -> Vec2 {
        let keep_out = AsteroidSize::Large.radius() * 4.0;
        let mut pos = Vec2::ZERO;
        for _ in 0..8 {
            let t: f32 = self.rng.random();
            pos = match self.rng.random_range(0..4) {
                0 => Vec2::new(t * self.bounds.width, 0.0),
                1 => Vec2::new(t * self.bounds.width, self.bounds.height),
                2 => Vec2::new(0.0, t * self.bounds.height),
                _ => Vec2::new(self.bounds.width, t * self.bounds.height),
            };
            if pos.distance(self.ship.pos) > keep_out {
                break;
            }
        }
        pos
    }

    /// Fill the star pool across all parallax layers
    pub fn populate_starfield(&mut self) {
        self.stars.clear();
        for i in 0..self.stars.capacity() {
            let layer = (i % STAR_LAYERS as usize) as u8;
            let pos = Vec2::new(
                self.rng.random_range(0.0..=self.bounds.width),
                self.rng.random_range(0.0..=self.bounds.height),
            );
            let _ = self.spawn_star(layer, pos);
        }
    }

    /// Spawn a particle; its current alpha becomes the one it fades from
    pub fn spawn_particle(&mut self, mut particle: Particle) -> Result<usize, SpawnError> {
        particle.base_alpha = particle.color[3];
        self.particles.spawn(particle)
    }

    pub fn spawn_asteroid(
        &mut self,
        size: AsteroidSize,
        pos: Vec2,
        vel: Vec2,
    ) -> Result<usize, SpawnError> {
        let asteroid = Asteroid::new(size, pos, vel, &mut self.rng);
        self.asteroids.spawn(asteroid)
    }

    pub fn spawn_bullet(&mut self, pos: Vec2, vel: Vec2) -> Result<usize, SpawnError> {
        self.bullets.spawn(Bullet::new(pos, vel))
    }

    pub fn spawn_enemy(
        &mut self,
        kind: EnemyKind,
        pos: Vec2,
        direction: f32,
        phase: f32,
    ) -> Result<usize, SpawnError> {
        self.enemies.spawn(Enemy::new(kind, pos, direction, phase))
    }

    pub fn spawn_star(&mut self, layer: u8, pos: Vec2) -> Result<usize, SpawnError> {
        self.stars.spawn(Star::new(layer, pos))
    }

    /// Burst of `intensity * EXPLOSION_PER_INTENSITY + EXPLOSION_BASE`
    /// particles at `pos`, carrying some of `inherit_vel`.
    ///
    /// Returns how many particles were actually spawned; the rest were
    /// dropped by the particle pool.
    pub fn emit_explosion(&mut self, pos: Vec2, inherit_vel: Vec2, intensity: u32) -> u32 {
        if self.particles.capacity() == 0 {
            return 0;
        }
        let count = explosion_particle_count(intensity);
        let mut spawned = 0;
        for i in 0..count {
            let kind = match i % 4 {
                0 => ParticleKind::Smoke,
                1 => ParticleKind::Debris,
                _ => ParticleKind::Spark,
            };
            let dir = self.rng.random_range(0.0..TAU);
            let speed: f32 = match kind {
                ParticleKind::Smoke => self.rng.random_range(20.0..60.0),
                _ => self.rng.random_range(60.0..220.0),
            };
            let life: f32 = self.rng.random_range(0.4..1.2);
            let size: f32 = self.rng.random_range(1.5..3.5);
            let vel = heading(dir) * speed + inherit_vel * 0.5;
            if self
                .particles
                .spawn(Particle::new(kind, pos, vel, life, size))
                .is_ok()
            {
                spawned += 1;
            }
        }
        spawned
    }

    /// Two exhaust embers behind a thrusting ship
    pub fn emit_exhaust(&mut self) {
        if self.particles.capacity() == 0 {
            return;
        }
        let back = -heading(self.ship.angle);
        let origin = self.ship.pos + back * self.ship.radius;
        for _ in 0..2 {
            let spread: f32 = self.rng.random_range(-0.35..0.35);
            let speed: f32 = self.rng.random_range(80.0..140.0);
            let vel = Vec2::from_angle(spread).rotate(back) * speed + self.ship.vel;
            let life: f32 = self.rng.random_range(0.2..0.45);
            let _ = self
                .particles
                .spawn(Particle::new(ParticleKind::Ember, origin, vel, life, 1.5));
        }
    }

    /// Take every event raised since the previous drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            bullets: PoolStats::of(&self.bullets),
            asteroids: PoolStats::of(&self.asteroids),
            enemies: PoolStats::of(&self.enemies),
            particles: PoolStats::of(&self.particles),
            stars: PoolStats::of(&self.stars),
        }
    }
}

/// Explosion size for a given intensity
#[inline]
pub fn explosion_particle_count(intensity: u32) -> u32 {
    intensity * EXPLOSION_PER_INTENSITY + EXPLOSION_BASE
}
