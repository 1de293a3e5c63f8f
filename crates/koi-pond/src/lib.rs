//! Pond population and interaction controller for the Koi simulation.
//!
//! This crate owns everything above a single fish body:
//!
//! - [`constraint`] -- the region fish must stay inside, and its capacity
//! - [`atlas`] -- texture slots handed out to live fish
//! - [`fish`] -- one koi: steering, interactions, lifetime
//! - [`pond`] -- the population, the all-pairs interaction pass, death handling
//! - [`spawner`] -- gated creation of new fish
//! - [`clock`] -- fixed-timestep accumulator between frames and ticks
//! - [`config`] -- the `koi-config.yaml` document
//! - [`runner`] -- the frame loop tying it all together
//!
//! # Tick order
//!
//! Each tick, fish are visited from the back of the population to the
//! front. Every fish first interacts with all fish ahead of it (each
//! unordered pair exactly once), then updates itself. A fish that reports
//! death is removed on the spot and its atlas slot returned, which never
//! disturbs the fish still waiting to be visited.

pub mod atlas;
pub mod clock;
pub mod config;
pub mod constraint;
pub mod error;
pub mod fish;
pub mod pond;
pub mod runner;
pub mod spawner;

pub use atlas::{Atlas, AtlasConfig, AtlasSlot};
pub use clock::{ClockError, FixedTimestep};
pub use config::{ConfigError, KoiConfig, LoggingConfig, PondSettings, SimulationSettings};
pub use constraint::{Constraint, ConstraintShape};
pub use error::{FishError, PondError, SpawnError};
pub use fish::{Fish, FishConfig};
pub use pond::{FailureStage, FishFailure, Inhabitant, Pond, TickReport};
pub use runner::{
    FrameCallback, FrameSummary, NoOpCallback, RunnerError, Simulation, SimulationResult,
    run_simulation,
};
pub use spawner::{Spawner, SpawnerConfig};
