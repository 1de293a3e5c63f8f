//! Fixed-timestep clock.
//!
//! Simulation ticks run at a constant rate no matter how long a frame took.
//! Frame time is poured into an accumulator, whole ticks are drained from
//! it, and whatever is left becomes the interpolation fraction used for
//! rendering between the last two ticks.
//!
//! After a long stall the number of ticks per frame is capped; time beyond
//! the cap is dropped instead of being replayed in a burst.

use tracing::debug;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid clock configuration (rate or cap).
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// A frame reported a negative or non-finite duration.
    #[error("invalid frame duration: {seconds}")]
    InvalidFrame {
        /// The rejected duration.
        seconds: f32,
    },
}

/// Accumulator that turns frame durations into fixed ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedTimestep {
    /// Seconds per tick.
    tick_seconds: f32,
    /// Unconsumed time, always below `tick_seconds` between frames.
    accumulator: f32,
    max_ticks_per_frame: u32,
    /// Ticks run since creation.
    tick: u64,
}

impl FixedTimestep {
    /// A clock running `ticks_per_second` ticks, at most
    /// `max_ticks_per_frame` of them per frame.
    pub fn new(ticks_per_second: f32, max_ticks_per_frame: u32) -> Result<Self, ClockError> {
        if !(ticks_per_second.is_finite() && ticks_per_second > 0.0) {
            return Err(ClockError::InvalidConfig {
                reason: format!("ticks_per_second must be positive, got {ticks_per_second}"),
            });
        }
        if max_ticks_per_frame == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "max_ticks_per_frame must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick_seconds: ticks_per_second.recip(),
            accumulator: 0.0,
            max_ticks_per_frame,
            tick: 0,
        })
    }

    /// Feed one frame's duration. Returns the number of ticks to run now.
    pub fn advance(&mut self, frame_seconds: f32) -> Result<u32, ClockError> {
        if !(frame_seconds.is_finite() && frame_seconds >= 0.0) {
            return Err(ClockError::InvalidFrame {
                seconds: frame_seconds,
            });
        }

        self.accumulator += frame_seconds;
        let mut ticks: u32 = 0;
        while self.accumulator >= self.tick_seconds && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.tick_seconds;
            ticks = ticks.saturating_add(1);
        }
        if self.accumulator >= self.tick_seconds {
            let kept = self.accumulator % self.tick_seconds;
            debug!(
                dropped_seconds = self.accumulator - kept,
                max_ticks_per_frame = self.max_ticks_per_frame,
                "Frame too long, dropping simulation time"
            );
            self.accumulator = kept;
        }

        self.tick = self
            .tick
            .checked_add(u64::from(ticks))
            .ok_or(ClockError::TickOverflow)?;
        Ok(ticks)
    }

    /// Fraction of a tick elapsed since the last tick, in `[0, 1)`.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.tick_seconds).clamp(0.0, 1.0 - f32::EPSILON)
    }

    /// Ticks run since creation.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Length of one tick in seconds.
    pub const fn tick_seconds(&self) -> f32 {
        self.tick_seconds
    }
}
