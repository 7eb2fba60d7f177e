//! Fixed-timestep Euler integration over pools
//!
//! One `step` advances every active body in a pool: move, count down
//! lifetime, expire, apply per-type behaviour, then the boundary policy.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pool::Pool;
use crate::Bounds;

/// Lifetimes at or below this are treated as expired.
///
/// Repeated `life -= dt` in f32 lands a few ulps either side of zero
/// (`1.0` stepped 60 times at 1/60 leaves about 2.8e-7), so the threshold
/// sits just above that residue and far below any real remaining life.
pub const LIFE_EPSILON: f32 = 1e-6;

/// What happens when a body leaves the playfield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Boundary {
    /// Jump to the opposite edge
    #[default]
    Wrap,
    /// Deactivate the slot
    Cull,
}

/// A pooled entity the integrator can move
pub trait Body {
    fn pos(&self) -> Vec2;
    fn set_pos(&mut self, pos: Vec2);
    fn vel(&self) -> Vec2;

    /// Remaining lifetime in seconds, `None` for bodies that never expire
    fn life_mut(&mut self) -> Option<&mut f32> {
        None
    }

    fn boundary(&self) -> Boundary {
        Boundary::Wrap
    }

    /// Per-type behaviour for a body that survived this step (drag, spin, ...)
    fn secondary(&mut self, _dt: f32) {}
}

/// Outcome counts of a single `step`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    /// Bodies whose lifetime ran out
    pub expired: usize,
    /// Bodies removed by a `Cull` boundary
    pub culled: usize,
}

/// Advance every active body in `pool` by `dt`
pub fn step<T: Body>(pool: &mut Pool<T>, dt: f32, bounds: &Bounds) -> StepReport {
    let mut report = StepReport::default();

    for slot in pool.slots_mut().iter_mut().filter(|s| s.active) {
        let body = &mut slot.payload;
        body.set_pos(body.pos() + body.vel() * dt);

        if let Some(life) = body.life_mut() {
            *life -= dt;
            if *life <= LIFE_EPSILON {
                slot.active = false;
                report.expired += 1;
                continue;
            }
        }

        body.secondary(dt);

        match body.boundary() {
            Boundary::Wrap => body.set_pos(bounds.wrap(body.pos())),
            Boundary::Cull => {
                if !bounds.contains(body.pos()) {
                    slot.active = false;
                    report.culled += 1;
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::state::{Asteroid, Bullet, Particle, ParticleKind, Star};
    use proptest::prelude::*;

    fn bounds() -> Bounds {
        Bounds::new(800.0, 600.0)
    }

    #[test]
    fn test_spawn_and_expire() {
        let mut pool: Pool<Particle> = Pool::new(4);
        let start = Vec2::new(100.0, 100.0);
        let idx = pool
            .spawn(Particle::new(ParticleKind::Spark, start, Vec2::ZERO, 1.0, 2.0))
            .unwrap();

        for tick in 1..=60 {
            if tick < 60 {
                step(&mut pool, SIM_DT, &bounds());
                let p = pool.get(idx).expect("particle should still be alive");
                assert_eq!(p.pos, start);
            } else {
                let report = step(&mut pool, SIM_DT, &bounds());
                assert_eq!(report.expired, 1);
            }
        }
        assert!(!pool.is_active(idx));

        // Stays inactive afterwards
        step(&mut pool, SIM_DT, &bounds());
        assert!(!pool.is_active(idx));
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_small_remaining_life_survives_the_step() {
        let mut pool: Pool<Bullet> = Pool::new(1);
        let mut bullet = Bullet::new(Vec2::new(400.0, 300.0), Vec2::ZERO);
        bullet.life = SIM_DT + 5e-6;
        pool.spawn(bullet).unwrap();

        let report = step(&mut pool, SIM_DT, &bounds());
        assert_eq!(report.expired, 0);
        assert!(pool.is_active(0));

        let report = step(&mut pool, SIM_DT, &bounds());
        assert_eq!(report.expired, 1);
    }

    #[test]
    fn test_position_integrates_velocity() {
        let mut pool: Pool<Bullet> = Pool::new(1);
        pool.spawn(Bullet::new(Vec2::new(10.0, 300.0), Vec2::new(60.0, -30.0)))
            .unwrap();
        step(&mut pool, 0.5, &bounds());
        let b = pool.get(0).unwrap();
        assert!((b.pos - Vec2::new(40.0, 285.0)).length() < 1e-4);
        assert!((b.life - (crate::consts::BULLET_LIFE - 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_wrap_at_right_edge() {
        let mut pool: Pool<Star> = Pool::new(1);
        let mut star = Star::new(0, Vec2::new(801.0, 50.0));
        star.vel = Vec2::ZERO;
        pool.spawn(star).unwrap();
        step(&mut pool, SIM_DT, &bounds());
        assert_eq!(pool.get(0).unwrap().pos.x, 0.0);
    }

    #[test]
    fn test_ember_is_culled_offscreen() {
        let mut pool: Pool<Particle> = Pool::new(1);
        pool.spawn(Particle::new(
            ParticleKind::Ember,
            Vec2::new(799.0, 10.0),
            Vec2::new(600.0, 0.0),
            5.0,
            1.0,
        ))
        .unwrap();
        let report = step(&mut pool, SIM_DT, &bounds());
        assert_eq!(report.culled, 1);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_drag_applies_per_tick() {
        let mut pool: Pool<Particle> = Pool::new(1);
        pool.spawn(Particle::new(
            ParticleKind::Smoke,
            Vec2::new(400.0, 300.0),
            Vec2::new(10.0, 0.0),
            5.0,
            1.0,
        ))
        .unwrap();
        step(&mut pool, SIM_DT, &bounds());
        let p = pool.get(0).unwrap();
        assert!((p.vel.x - 10.0 * ParticleKind::Smoke.drag()).abs() < 1e-5);
        assert!(p.size > 1.0);
    }

    #[test]
    fn test_immortal_bodies_never_expire() {
        let mut pool: Pool<Asteroid> = Pool::new(1);
        pool.spawn(Asteroid::default()).unwrap();
        for _ in 0..10_000 {
            step(&mut pool, SIM_DT, &bounds());
        }
        assert_eq!(pool.active_count(), 1);
    }

    proptest! {
        #[test]
        fn prop_life_decreases_by_dt(life in 0.5f32..5.0, ticks in 1usize..20) {
            let mut pool: Pool<Bullet> = Pool::new(1);
            let mut bullet = Bullet::new(Vec2::new(400.0, 300.0), Vec2::ZERO);
            bullet.life = life;
            pool.spawn(bullet).unwrap();

            for k in 1..=ticks {
                step(&mut pool, SIM_DT, &bounds());
                let expected = life - k as f32 * SIM_DT;
                match pool.get(0) {
                    Some(b) => prop_assert!((b.life - expected).abs() < 1e-4),
                    None => {
                        prop_assert!(expected <= LIFE_EPSILON + 1e-4);
                        break;
                    }
                }
            }
        }
    }
}
