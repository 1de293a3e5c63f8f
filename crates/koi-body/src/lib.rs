//! Fish locomotion and body geometry for the Koi pond simulation.
//!
//! A fish is a chain of spine segments dragged behind a driven head. The
//! chain is relaxed once per tick in a single front-to-back pass, and the
//! body turns the two most recent chain snapshots into a ribbon of
//! triangle-strip vertices for any interpolation fraction between ticks.
//!
//! # Modules
//!
//! - [`body`] -- [`FishBody`]: swim phase, head wobble, ribbon derivation.
//! - [`config`] -- Tunables for spine stiffness and swimming ([`BodyConfig`]).
//! - [`error`] -- Error types for body construction ([`BodyError`]).
//! - [`shape`] -- Body outline ([`BodyShape`]) and texture placement ([`TextureRegion`]).
//! - [`spine`] -- [`SpringChain`]: the segment chain and its relaxation step.
//! - [`strip`] -- The [`StripSink`] renderer interface and a batching [`StripBatch`].

pub mod body;
pub mod config;
pub mod error;
pub mod shape;
pub mod spine;
pub mod strip;

pub use body::FishBody;
pub use config::{BodyConfig, SpineConfig, SwimConfig};
pub use error::BodyError;
pub use shape::{BodyShape, TextureRegion};
pub use spine::{MAX_SEGMENTS, SpringChain};
pub use strip::{RESTART_INDEX, StripBatch, StripSink, StripVertex};
