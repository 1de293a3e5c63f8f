//! Shared identifiers for the Koi pond simulation.
//!
//! Every crate in the workspace refers to fish through [`FishId`] so that
//! log lines, tick reports and removal records agree on identity without
//! depending on the fish type itself.

pub mod ids;

pub use ids::FishId;
