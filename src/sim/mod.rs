//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by pool slot index)
//! - No rendering or platform dependencies

pub mod collision;
pub mod integrate;
pub mod pool;
pub mod state;
pub mod tick;

pub use collision::{Aabb, aabb_overlap, check_all, circles_overlap, collect_hits};
pub use integrate::{Body, Boundary, LIFE_EPSILON, StepReport, step};
pub use pool::{Pool, PoolSlot, SpawnError};
pub use state::{
    Asteroid, AsteroidSize, Bullet, Enemy, EnemyKind, GameEvent, GamePhase, Particle,
    ParticleKind, PoolStats, Ship, Star, World, WorldStats, explosion_particle_count,
};
pub use tick::{TickInput, run_collisions, tick};
