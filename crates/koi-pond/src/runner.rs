//! Frame loop driving a pond.
//!
//! [`run_simulation`] is the top-level loop. Each frame it:
//!
//! 1. Feeds the frame duration to the [`FixedTimestep`].
//! 2. Runs the resulting number of ticks: a spawn attempt, then
//!    [`Pond::update`].
//! 3. Rebuilds the strip batch, interpolated by the timestep's alpha.
//! 4. Hands a [`FrameSummary`] to the [`FrameCallback`].
//!
//! Spawn errors and isolated fish failures are logged and counted; only
//! clock errors stop the run.

use std::sync::Arc;

use koi_body::StripBatch;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;
use tracing::{info, warn};

use crate::atlas::Atlas;
use crate::clock::{ClockError, FixedTimestep};
use crate::config::{ConfigError, KoiConfig};
use crate::constraint::Constraint;
use crate::error::{PondError, SpawnError};
use crate::pond::Pond;
use crate::spawner::Spawner;

/// Errors that can occur while building or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configuration was rejected.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The constraint or atlas could not be built.
    #[error("pond error: {source}")]
    Pond {
        /// The underlying pond error.
        #[from]
        source: PondError,
    },

    /// The clock could not be built or advanced.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// Seeding the initial population failed.
    #[error("spawn error: {source}")]
    Spawn {
        /// The underlying spawn error.
        #[from]
        source: SpawnError,
    },
}

/// Everything one running pond needs.
#[derive(Debug)]
pub struct Simulation {
    /// The population.
    pub pond: Pond,
    /// Texture slots for the population.
    pub atlas: Atlas,
    /// Creates new fish.
    pub spawner: Spawner,
    /// Frame-to-tick clock.
    pub timestep: FixedTimestep,
    /// Seeded randomness for every stochastic decision.
    pub rng: SmallRng,
    /// Geometry of the most recent frame.
    pub batch: StripBatch,
}

impl Simulation {
    /// Build a pond from `config` and seed its initial population.
    pub fn from_config(config: &KoiConfig) -> Result<Self, RunnerError> {
        config.validate()?;

        let constraint = Constraint::new(config.pond.shape, config.pond.fish_density)?;
        let mut simulation = Self {
            pond: Pond::new(Arc::new(constraint), config.pond.spawn_overhead),
            atlas: Atlas::new(&config.atlas)?,
            spawner: Spawner::new(config.spawner, config.body, config.fish),
            timestep: FixedTimestep::new(
                config.simulation.ticks_per_second,
                config.simulation.max_ticks_per_frame,
            )?,
            rng: SmallRng::seed_from_u64(config.simulation.seed),
            batch: StripBatch::new(),
        };

        simulation.spawner.populate(
            &mut simulation.pond,
            &mut simulation.atlas,
            &mut simulation.rng,
            config.spawner.initial_fish,
        )?;

        info!(
            capacity = simulation.pond.capacity(),
            population = simulation.pond.len(),
            atlas_slots = simulation.atlas.capacity(),
            seed = config.simulation.seed,
            "Simulation built"
        );
        Ok(simulation)
    }

    /// Free every fish. Leaves an empty pond and a full atlas.
    pub fn teardown(&mut self) {
        self.pond.clear(&mut self.atlas);
        self.batch.clear();
    }
}

/// What happened during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameSummary {
    /// Frame number, starting at 0.
    pub frame: u64,
    /// Total ticks run after this frame.
    pub tick: u64,
    /// Ticks run during this frame.
    pub ticks_run: u32,
    /// Interpolation fraction used for rendering.
    pub alpha: f32,
    /// Live fish after this frame.
    pub population: usize,
    /// Fish spawned during this frame.
    pub births: usize,
    /// Fish removed during this frame.
    pub deaths: usize,
    /// Pairwise interactions during this frame.
    pub interactions: usize,
    /// Isolated fish failures during this frame.
    pub failures: usize,
    /// Spawn attempts that failed during this frame.
    pub spawn_errors: usize,
    /// Vertices in the frame's strip batch.
    pub vertices: usize,
    /// Strips in the frame's strip batch.
    pub strips: usize,
}

/// Totals over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimulationResult {
    /// Frames executed.
    pub total_frames: u64,
    /// Ticks executed.
    pub total_ticks: u64,
    /// Fish spawned.
    pub births: u64,
    /// Fish removed.
    pub deaths: u64,
    /// Pairwise interactions.
    pub interactions: u64,
    /// Isolated fish failures.
    pub failures: u64,
    /// Failed spawn attempts.
    pub spawn_errors: u64,
    /// Live fish at the end.
    pub final_population: usize,
}

impl SimulationResult {
    fn absorb(&mut self, frame: &FrameSummary) {
        self.total_frames = self.total_frames.saturating_add(1);
        self.total_ticks = frame.tick;
        self.births = self.births.saturating_add(widen(frame.births));
        self.deaths = self.deaths.saturating_add(widen(frame.deaths));
        self.interactions = self.interactions.saturating_add(widen(frame.interactions));
        self.failures = self.failures.saturating_add(widen(frame.failures));
        self.spawn_errors = self.spawn_errors.saturating_add(widen(frame.spawn_errors));
        self.final_population = frame.population;
    }
}

fn widen(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

/// Callback invoked after each frame.
///
/// Implementations can use this to upload the strip batch, sample
/// statistics, and so on.
pub trait FrameCallback: Send {
    /// Called after a frame has been simulated and rendered.
    fn on_frame(&mut self, summary: &FrameSummary, simulation: &Simulation);
}

/// A no-op frame callback.
pub struct NoOpCallback;

impl FrameCallback for NoOpCallback {
    fn on_frame(&mut self, _summary: &FrameSummary, _simulation: &Simulation) {}
}

/// Run `frames` frames of `frame_seconds` each.
///
/// # Errors
///
/// Returns [`RunnerError::Clock`] if `frame_seconds` is negative or not
/// finite, or the tick counter overflows.
pub fn run_simulation(
    simulation: &mut Simulation,
    frames: u64,
    frame_seconds: f32,
    callback: &mut dyn FrameCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut result = SimulationResult {
        final_population: simulation.pond.len(),
        total_ticks: simulation.timestep.tick(),
        ..SimulationResult::default()
    };

    info!(
        frames,
        frame_seconds,
        tick_seconds = simulation.timestep.tick_seconds(),
        population = simulation.pond.len(),
        capacity = simulation.pond.capacity(),
        "Simulation starting"
    );

    for frame in 0..frames {
        let ticks_run = simulation.timestep.advance(frame_seconds)?;
        let mut summary = FrameSummary {
            frame,
            ticks_run,
            ..FrameSummary::default()
        };

        for _ in 0..ticks_run {
            match simulation.spawner.try_spawn(
                &mut simulation.pond,
                &mut simulation.atlas,
                &mut simulation.rng,
            ) {
                Ok(Some(_)) => summary.births = summary.births.saturating_add(1),
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, "Spawn failed");
                    summary.spawn_errors = summary.spawn_errors.saturating_add(1);
                }
            }

            let report = simulation
                .pond
                .update(&mut simulation.atlas, &mut simulation.rng);
            summary.interactions = summary.interactions.saturating_add(report.interactions);
            summary.deaths = summary.deaths.saturating_add(report.removed.len());
            summary.failures = summary.failures.saturating_add(report.failures.len());
        }

        let alpha = simulation.timestep.alpha();
        simulation.batch.clear();
        simulation.pond.render(&mut simulation.batch, alpha);

        summary.tick = simulation.timestep.tick();
        summary.alpha = alpha;
        summary.population = simulation.pond.len();
        summary.vertices = simulation.batch.vertices().len();
        summary.strips = simulation.batch.strip_count();

        result.absorb(&summary);
        callback.on_frame(&summary, simulation);
    }

    log_simulation_end(&result);
    Ok(result)
}

/// Log the totals of a finished run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        total_frames = result.total_frames,
        total_ticks = result.total_ticks,
        births = result.births,
        deaths = result.deaths,
        interactions = result.interactions,
        final_population = result.final_population,
        "Simulation ended"
    );
    if result.failures > 0 || result.spawn_errors > 0 {
        warn!(
            failures = result.failures,
            spawn_errors = result.spawn_errors,
            "Simulation ended with isolated failures"
        );
    }
}
