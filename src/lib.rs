//! Arcade Pools - fixed-capacity entity pools for 2D arcade demos
//!
//! Core modules:
//! - `sim`: Deterministic simulation (pools, integration, collisions, world state)
//! - `render`: Draw-list extraction for an external renderer
//! - `driver`: Fixed-timestep accumulator for the frame loop
//! - `settings`: Data-driven configuration

pub mod driver;
pub mod render;
pub mod settings;
pub mod sim;

pub use driver::FixedStep;
pub use settings::{QualityPreset, Settings, SettingsError};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, independent of render cadence)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;

    /// Default playfield dimensions
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;

    /// Ship handling
    pub const SHIP_RADIUS: f32 = 10.0;
    pub const SHIP_THRUST: f32 = 300.0;
    pub const SHIP_TURN_SPEED: f32 = 4.0; // radians per second
    pub const SHIP_MAX_SPEED: f32 = 350.0;
    pub const SHIP_DRAG: f32 = 0.99;
    pub const SHIP_RESPAWN_SECS: f32 = 2.0;
    pub const SHIP_INVULNERABLE_SECS: f32 = 3.0;
    pub const FIRE_COOLDOWN_SECS: f32 = 0.15;

    /// Bullets
    pub const BULLET_SPEED: f32 = 500.0;
    pub const BULLET_LIFE: f32 = 1.2;
    pub const BULLET_RADIUS: f32 = 2.0;

    /// Explosion particle count = intensity * EXPLOSION_PER_INTENSITY + EXPLOSION_BASE
    pub const EXPLOSION_PER_INTENSITY: u32 = 8;
    pub const EXPLOSION_BASE: u32 = 4;

    /// Asteroid drift speed range for fresh spawns (pixels/s)
    pub const ASTEROID_MIN_SPEED: f32 = 30.0;
    pub const ASTEROID_MAX_SPEED: f32 = 90.0;
}

/// Playfield rectangle `[0, width] x [0, height]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: consts::SCREEN_WIDTH,
            height: consts::SCREEN_HEIGHT,
        }
    }
}

impl Bounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Inclusive containment test
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Toroidal wrap: an axis below 0 jumps to the far edge exactly, an axis
    /// beyond the far edge jumps to 0.
    #[inline]
    pub fn wrap(&self, mut p: Vec2) -> Vec2 {
        if p.x < 0.0 {
            p.x = self.width;
        }
        if p.x > self.width {
            p.x = 0.0;
        }
        if p.y < 0.0 {
            p.y = self.height;
        }
        if p.y > self.height {
            p.y = 0.0;
        }
        p
    }
}

/// Unit vector for a heading angle (radians, 0 = +x)
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wrap_right_edge_goes_to_zero() {
        let bounds = Bounds::new(800.0, 600.0);
        let p = bounds.wrap(Vec2::new(801.0, 300.0));
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 300.0);
    }

    #[test]
    fn test_wrap_left_edge_goes_to_width() {
        let bounds = Bounds::new(800.0, 600.0);
        let p = bounds.wrap(Vec2::new(-0.5, -2.0));
        assert_eq!(p, Vec2::new(800.0, 600.0));
    }

    #[test]
    fn test_wrap_keeps_exact_edges() {
        let bounds = Bounds::new(800.0, 600.0);
        assert_eq!(bounds.wrap(Vec2::new(800.0, 0.0)), Vec2::new(800.0, 0.0));
    }

    #[test]
    fn test_normalize_angle() {
        use std::f32::consts::{PI, TAU};
        assert!((normalize_angle(2.0 * TAU + 0.5) - 0.5).abs() < 1e-5);
        assert!((normalize_angle(-TAU - 0.5) - (-0.5)).abs() < 1e-5);
        assert!((normalize_angle(-0.5) - (-0.5)).abs() < 1e-6);
        // Odd multiples of PI land on either side of the seam
        assert!((normalize_angle(3.0 * PI).abs() - PI).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_wrap_is_noop_inside_bounds(x in 0.0f32..=800.0, y in 0.0f32..=600.0) {
            let bounds = Bounds::new(800.0, 600.0);
            let p = Vec2::new(x, y);
            prop_assert_eq!(bounds.wrap(p), p);
        }

        #[test]
        fn prop_wrap_lands_inside_bounds(x in -50.0f32..850.0, y in -50.0f32..650.0) {
            let bounds = Bounds::new(800.0, 600.0);
            prop_assert!(bounds.contains(bounds.wrap(Vec2::new(x, y))));
        }
    }
}
