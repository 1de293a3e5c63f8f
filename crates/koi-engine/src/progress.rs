//! Frame callback that reports progress through `tracing`.

use koi_pond::{FrameCallback, FrameSummary, Simulation};
use tracing::{debug, info};

/// Logs a population line every `interval` frames and a debug line for
/// every frame that ran at least one tick.
pub struct ProgressCallback {
    interval: u64,
}

impl ProgressCallback {
    /// Report every `interval` frames (at least every frame).
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
        }
    }
}

impl FrameCallback for ProgressCallback {
    fn on_frame(&mut self, summary: &FrameSummary, simulation: &Simulation) {
        if summary.ticks_run > 0 {
            debug!(
                frame = summary.frame,
                tick = summary.tick,
                ticks_run = summary.ticks_run,
                births = summary.births,
                deaths = summary.deaths,
                interactions = summary.interactions,
                "Frame simulated"
            );
        }
        if summary.frame.checked_rem(self.interval) == Some(0) {
            info!(
                frame = summary.frame,
                tick = summary.tick,
                population = summary.population,
                capacity = simulation.pond.capacity(),
                free_slots = simulation.atlas.available(),
                vertices = summary.vertices,
                "Pond status"
            );
        }
    }
}
