//! Fixed-step scheduling.
//!
//! Frames arrive with a variable step; agent physics runs on a fixed step.
//! [`StepClock`] converts one into the other with an accumulator.

/// Most fixed steps run for a single frame.
const MAX_STEPS_PER_FRAME: u32 = 10;

/// Accumulator turning frame time into fixed steps.
#[derive(Debug, Clone)]
pub struct StepClock {
    /// Leftover time not yet consumed by a fixed step
    accumulator: f32,
    /// Fixed timestep
    fixed_dt: f32,
    /// Maximum frame delta to prevent spiral of death
    max_dt: f32,
    /// Total fixed steps run
    steps: u64,
}

impl StepClock {
    /// Creates a clock with the given fixed step and frame clamp.
    #[must_use]
    pub fn new(fixed_dt: f32, max_dt: f32) -> Self {
        Self {
            accumulator: 0.0,
            fixed_dt: fixed_dt.max(0.001),
            max_dt,
            steps: 0,
        }
    }

    /// Fixed timestep.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Clamps a frame delta.
    #[must_use]
    pub fn clamp_frame(&self, dt: f32) -> f32 {
        dt.clamp(0.0, self.max_dt)
    }

    /// Accumulates frame time.
    /// Returns the number of fixed steps to run this frame.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += self.clamp_frame(dt);
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind: drop the backlog instead of catching up.
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        self.steps += u64::from(count);
        count
    }

    /// Total fixed steps run.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }
}
