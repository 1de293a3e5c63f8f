//! Error types for the `koi-pond` crate.
//!
//! Configuration and clock errors live next to the code that raises them
//! ([`crate::config::ConfigError`], [`crate::clock::ClockError`]).

use koi_body::BodyError;
use koi_types::FishId;

/// Errors raised by a single fish during a tick.
///
/// The pond never aborts a tick for these: the failure is logged, recorded
/// in the tick report, and the remaining fish carry on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FishError {
    /// Steering produced a NaN or infinite position, heading, or speed.
    #[error("fish {fish} reached a non-finite state during {stage}")]
    NonFinite {
        /// The fish whose state broke.
        fish: FishId,
        /// Which step noticed the problem.
        stage: &'static str,
    },
}

/// Errors raised while creating a fish.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// Every atlas slot is in use.
    #[error("texture atlas is full ({capacity} slots)")]
    AtlasFull {
        /// Total number of slots in the atlas.
        capacity: usize,
    },

    /// The randomized body was rejected.
    #[error("body error: {source}")]
    Body {
        /// The underlying body error.
        #[from]
        source: BodyError,
    },
}

/// Errors raised while building pond infrastructure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PondError {
    /// The constraint shape or density is unusable.
    #[error("invalid constraint: {reason}")]
    InvalidConstraint {
        /// What is wrong with the constraint.
        reason: String,
    },

    /// The atlas layout is unusable.
    #[error("invalid atlas: {reason}")]
    InvalidAtlas {
        /// What is wrong with the layout.
        reason: String,
    },
}
