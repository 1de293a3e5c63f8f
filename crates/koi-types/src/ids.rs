//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Identifiers use UUID v7 (time-ordered) so that sorting a set of ids
//! roughly reproduces spawn order. Identity never feeds back into the
//! simulation itself, which keeps seeded runs deterministic.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a fish living in a pond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FishId(Uuid);

impl FishId {
    /// A fresh time-ordered identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The wrapped [`Uuid`].
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for FishId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FishId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for FishId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<FishId> for Uuid {
    fn from(id: FishId) -> Self {
        id.0
    }
}
