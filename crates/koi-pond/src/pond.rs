//! The population of one pond.
//!
//! [`Pond::update`] runs one tick over every inhabitant:
//!
//! 1. Walk the population from the last fish to the first.
//! 2. Let the current fish interact with every fish in front of it. Each
//!    interaction affects both participants, so this covers every
//!    unordered pair exactly once per tick.
//! 3. Update the current fish. If it reports death, remove it right away
//!    and hand its atlas slot back.
//!
//! Removing fish at the cursor only shifts fish that were already visited,
//! so the walk never skips or repeats anyone.
//!
//! Failures are isolated: a fish whose interaction or update goes wrong is
//! logged and listed in the [`TickReport`], and the tick carries on.

use std::sync::Arc;

use koi_body::StripSink;
use koi_types::FishId;
use rand::Rng;
use tracing::{debug, warn};

use crate::atlas::Atlas;
use crate::constraint::Constraint;
use crate::error::FishError;
use crate::fish::Fish;

/// Anything that can live in a [`Pond`].
pub trait Inhabitant: Sized {
    /// Stable identifier, used in reports and logs.
    fn id(&self) -> FishId;

    /// React to `other`, affecting both.
    fn interact<R: Rng>(&mut self, other: &mut Self, rng: &mut R) -> Result<(), FishError>;

    /// Advance one tick. `Ok(true)` means the inhabitant has died.
    fn update<R: Rng>(
        &mut self,
        constraint: &Constraint,
        rng: &mut R,
    ) -> Result<bool, FishError>;

    /// Emit geometry, interpolated by `time` in `[0, 1]`.
    fn render<S: StripSink + ?Sized>(&self, sink: &mut S, time: f32);

    /// Release held resources. Called exactly once, on removal.
    fn free(self, atlas: &mut Atlas);
}

/// Which step of the tick a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// The interaction with another fish.
    Interact {
        /// The other participant.
        other: FishId,
    },
    /// The fish's own update.
    Update,
}

/// One isolated failure during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FishFailure {
    /// The fish being visited when the failure happened.
    pub fish: FishId,
    /// Where in the tick it happened.
    pub stage: FailureStage,
    /// What went wrong.
    pub error: FishError,
}

/// Outcome of one [`Pond::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Number of pairwise interactions attempted.
    pub interactions: usize,
    /// Fish that died and were removed, in removal order.
    pub removed: Vec<FishId>,
    /// Interactions and updates that failed.
    pub failures: Vec<FishFailure>,
}

/// A bounded population of fish.
#[derive(Debug)]
pub struct Pond<F: Inhabitant = Fish> {
    fishes: Vec<F>,
    constraint: Arc<Constraint>,
    capacity: usize,
    spawn_overhead: usize,
}

impl<F: Inhabitant> Pond<F> {
    /// An empty pond inside `constraint`.
    ///
    /// The capacity is read from the constraint once. Spawning stops
    /// `spawn_overhead` fish short of it.
    pub fn new(constraint: Arc<Constraint>, spawn_overhead: usize) -> Self {
        let capacity = constraint.capacity();
        Self {
            fishes: Vec::new(),
            constraint,
            capacity,
            spawn_overhead,
        }
    }

    /// Maximum number of fish.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Headroom kept free by [`Self::can_spawn`].
    pub const fn spawn_overhead(&self) -> usize {
        self.spawn_overhead
    }

    /// Number of live fish.
    pub fn len(&self) -> usize {
        self.fishes.len()
    }

    /// Whether the pond is empty.
    pub fn is_empty(&self) -> bool {
        self.fishes.is_empty()
    }

    /// Whether a spontaneous spawn is allowed.
    pub fn can_spawn(&self) -> bool {
        self.fishes.len() < self.capacity.saturating_sub(self.spawn_overhead)
    }

    /// Whether a deliberately placed fish is allowed.
    pub fn can_drop(&self) -> bool {
        self.fishes.len() < self.capacity
    }

    /// Add a fish. Callers are expected to check [`Self::can_spawn`] or
    /// [`Self::can_drop`] first; going past capacity is only logged.
    pub fn add_fish(&mut self, fish: F) {
        if self.fishes.len() >= self.capacity {
            warn!(
                fish = %fish.id(),
                population = self.fishes.len(),
                capacity = self.capacity,
                "Adding fish beyond pond capacity"
            );
        }
        debug!(fish = %fish.id(), population = self.fishes.len().saturating_add(1), "Fish added");
        self.fishes.push(fish);
    }

    /// Live fish in population order.
    pub fn fishes(&self) -> &[F] {
        &self.fishes
    }

    /// The pond boundary.
    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// Run one tick. See the module docs for the visiting order.
    pub fn update<R: Rng>(&mut self, atlas: &mut Atlas, rng: &mut R) -> TickReport {
        let mut report = TickReport::default();

        for index in (0..self.fishes.len()).rev() {
            let (ahead, rest) = self.fishes.split_at_mut(index);
            let Some(fish) = rest.first_mut() else {
                continue;
            };
            let id = fish.id();

            for other in ahead.iter_mut() {
                report.interactions = report.interactions.saturating_add(1);
                if let Err(error) = fish.interact(other, rng) {
                    let other = other.id();
                    warn!(fish = %id, other = %other, %error, "Interaction failed");
                    report.failures.push(FishFailure {
                        fish: id,
                        stage: FailureStage::Interact { other },
                        error,
                    });
                }
            }

            match fish.update(&self.constraint, rng) {
                Ok(false) => {}
                Ok(true) => {
                    let dead = self.fishes.remove(index);
                    dead.free(atlas);
                    debug!(fish = %id, "Fish died");
                    report.removed.push(id);
                }
                Err(error) => {
                    warn!(fish = %id, %error, "Fish update failed");
                    report.failures.push(FishFailure {
                        fish: id,
                        stage: FailureStage::Update,
                        error,
                    });
                }
            }
        }

        debug!(
            population = self.fishes.len(),
            interactions = report.interactions,
            removed = report.removed.len(),
            failures = report.failures.len(),
            "Pond tick complete"
        );
        report
    }

    /// Draw the boundary, then every fish.
    pub fn render<S: StripSink + ?Sized>(&self, sink: &mut S, time: f32) {
        self.constraint.render(sink);
        for fish in &self.fishes {
            fish.render(sink, time);
        }
    }

    /// Remove and free every fish.
    pub fn clear(&mut self, atlas: &mut Atlas) {
        let count = self.fishes.len();
        for fish in self.fishes.drain(..) {
            fish.free(atlas);
        }
        debug!(count, "Pond cleared");
    }
}
