//! Fixed-timestep accumulator
//!
//! Converts variable frame times into whole `SIM_DT` ticks so the simulation
//! is independent of render cadence.

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::sim::{TickInput, World, tick};

/// Longest frame time accepted before clamping (e.g. after a debugger stop)
const MAX_FRAME_SECS: f32 = 0.1;

/// Frame-time accumulator driving `tick`
#[derive(Debug, Clone)]
pub struct FixedStep {
    accumulator: f32,
    dt: f32,
    max_substeps: u32,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_SUBSTEPS)
    }
}

impl FixedStep {
    pub fn new(dt: f32, max_substeps: u32) -> Self {
        Self {
            accumulator: 0.0,
            dt,
            max_substeps,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Fraction of a tick left in the accumulator, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    /// Run as many ticks as `frame_dt` covers, up to the substep cap.
    ///
    /// One-shot inputs are cleared after the first tick that sees them.
    /// `world.events` holds every event raised by this frame's ticks.
    /// Returns the number of ticks run.
    pub fn advance(&mut self, world: &mut World, input: &mut TickInput, frame_dt: f32) -> u32 {
        world.events.clear();
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_SECS);

        let mut substeps = 0;
        while self.accumulator >= self.dt && substeps < self.max_substeps {
            tick(world, input, self.dt);
            self.accumulator -= self.dt;
            substeps += 1;

            input.clear_one_shots();
        }

        if substeps == self.max_substeps && self.accumulator >= self.dt {
            log::trace!(
                "Frame fell behind, carrying {:.3}s of simulation",
                self.accumulator
            );
        }

        substeps
    }
}
