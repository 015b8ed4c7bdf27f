//! Fixed-step clock.
//!
//! Wall time is measured in whole microseconds and banked; the main loop
//! drains the bank one [`FIXED_DT_US`] step at a time. The bank never holds
//! more than [`MAX_PENDING_US`], so a stall (window drag, breakpoint) costs
//! at most a quarter second of catch-up steps.

use std::time::{Duration, Instant};

/// One simulation step, 1/60 s rounded to microseconds. Animation timing
/// counts in these units so frame transitions never drift.
pub const FIXED_DT_US: u64 = 16_667;

/// [`FIXED_DT_US`] in seconds, for physics integration.
pub const FIXED_DT_SECS: f32 = FIXED_DT_US as f32 / 1_000_000.0;

/// Upper bound on banked, not yet simulated time.
pub const MAX_PENDING_US: u64 = 250_000;

const STAT_SAMPLES: usize = 60;

pub struct TimeState {
    last_instant: Instant,
    pending_us: u64,
    frame_us: u64,
    pub steps_this_frame: u32,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    samples: [u64; STAT_SAMPLES],
    next_sample: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self {
            last_instant: Instant::now(),
            pending_us: 0,
            frame_us: 0,
            steps_this_frame: 0,
            fixed_step_count: 0,
            frame_count: 0,
            samples: [FIXED_DT_US; STAT_SAMPLES],
            next_sample: 0,
            smoothed_fps: 1_000_000.0 / FIXED_DT_US as f64,
            smoothed_frame_time_ms: FIXED_DT_US as f64 / 1000.0,
        }
    }

    /// Banks the wall time since the previous call.
    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_instant);
        self.last_instant = now;
        self.advance(elapsed);
    }

    /// Banks `elapsed` of wall time. Deterministic: tests drive the clock
    /// through this instead of [`TimeState::begin_frame`].
    pub fn advance(&mut self, elapsed: Duration) {
        self.frame_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.frame_count += 1;
        self.steps_this_frame = 0;

        self.pending_us = self.pending_us.saturating_add(self.frame_us);
        if self.pending_us > MAX_PENDING_US {
            log::warn!(
                "Frame took {:.1}ms, dropping {:.1}ms of simulation",
                self.frame_us as f64 / 1000.0,
                (self.pending_us - MAX_PENDING_US) as f64 / 1000.0
            );
            self.pending_us = MAX_PENDING_US;
        }
    }

    /// Consumes one fixed step if the bank holds one.
    pub fn should_step(&mut self) -> bool {
        if self.pending_us < FIXED_DT_US {
            return false;
        }
        self.pending_us -= FIXED_DT_US;
        self.fixed_step_count += 1;
        self.steps_this_frame += 1;
        true
    }

    /// Forgets owed steps. Called while the simulation is paused.
    pub fn discard_pending(&mut self) {
        self.pending_us = 0;
    }

    /// Folds this frame's duration into the rolling stats.
    pub fn end_frame(&mut self) {
        self.samples[self.next_sample] = self.frame_us;
        self.next_sample = (self.next_sample + 1) % STAT_SAMPLES;
        let mean_us = self.samples.iter().sum::<u64>() as f64 / STAT_SAMPLES as f64;
        self.smoothed_frame_time_ms = mean_us / 1000.0;
        self.smoothed_fps = if mean_us > 0.0 {
            1_000_000.0 / mean_us
        } else {
            0.0
        };
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}
