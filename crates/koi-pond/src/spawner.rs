//! Fish spawner for seeding and refilling a pond.
//!
//! Spontaneous spawns are gated by [`Pond::can_spawn`] and a per-tick
//! chance; fish placed deliberately (for instance dropped in by a user)
//! only need [`Pond::can_drop`]. Every new fish gets a random body shape,
//! a random lifetime, and the lowest free atlas slot.

use std::f32::consts::TAU;

use glam::Vec2;
use koi_body::{BodyConfig, BodyShape, FishBody};
use koi_types::FishId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::atlas::Atlas;
use crate::error::SpawnError;
use crate::fish::{Fish, FishConfig};
use crate::pond::Pond;

/// Configuration for the spawner, loaded from the `spawner` section of
/// `koi-config.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    /// Fish placed when the simulation starts (default: 6).
    #[serde(default = "default_initial_fish")]
    pub initial_fish: usize,

    /// Chance per tick of a spontaneous spawn while the pond has room (default: 0.01).
    #[serde(default = "default_spawn_chance")]
    pub spawn_chance: f32,

    /// Minimum distance between a spawn point and the pond edge (default: 1.0).
    #[serde(default = "default_spawn_inset")]
    pub spawn_inset: f32,

    /// Shortest body length (default: 0.9).
    #[serde(default = "default_length_min")]
    pub length_min: f32,

    /// Longest body length (default: 1.5).
    #[serde(default = "default_length_max")]
    pub length_max: f32,

    /// Smallest half-thickness as a fraction of the length (default: 0.1).
    #[serde(default = "default_thickness_min")]
    pub thickness_min: f32,

    /// Largest half-thickness as a fraction of the length (default: 0.13).
    #[serde(default = "default_thickness_max")]
    pub thickness_max: f32,

    /// Widest point of the outline as a fraction of the length (default: 0.3).
    #[serde(default = "default_widest")]
    pub widest: f32,

    /// Tail half-thickness as a fraction of the widest (default: 0.15).
    #[serde(default = "default_tail")]
    pub tail: f32,

    /// Shortest lifetime in ticks (default: 3000).
    #[serde(default = "default_lifetime_min")]
    pub lifetime_min: u32,

    /// Longest lifetime in ticks (default: 9000).
    #[serde(default = "default_lifetime_max")]
    pub lifetime_max: u32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            initial_fish: default_initial_fish(),
            spawn_chance: default_spawn_chance(),
            spawn_inset: default_spawn_inset(),
            length_min: default_length_min(),
            length_max: default_length_max(),
            thickness_min: default_thickness_min(),
            thickness_max: default_thickness_max(),
            widest: default_widest(),
            tail: default_tail(),
            lifetime_min: default_lifetime_min(),
            lifetime_max: default_lifetime_max(),
        }
    }
}

impl SpawnerConfig {
    /// Check that every range is ordered and usable.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.spawn_chance) {
            return Err(format!(
                "spawner.spawn_chance must be within [0, 1], got {}",
                self.spawn_chance
            ));
        }
        if !(self.spawn_inset.is_finite() && self.spawn_inset >= 0.0) {
            return Err(format!(
                "spawner.spawn_inset must be finite and non-negative, got {}",
                self.spawn_inset
            ));
        }
        for (name, min, max) in [
            ("length", self.length_min, self.length_max),
            ("thickness", self.thickness_min, self.thickness_max),
        ] {
            if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
                return Err(format!(
                    "spawner.{name}_min/{name}_max must be positive and ordered, got {min}..{max}"
                ));
            }
        }
        if self.lifetime_min == 0 || self.lifetime_min > self.lifetime_max {
            return Err(format!(
                "spawner lifetime range must be non-empty and start above zero, got {}..{}",
                self.lifetime_min, self.lifetime_max
            ));
        }
        Ok(())
    }
}

const fn default_initial_fish() -> usize {
    6
}

const fn default_spawn_chance() -> f32 {
    0.01
}

const fn default_spawn_inset() -> f32 {
    1.0
}

const fn default_length_min() -> f32 {
    0.9
}

const fn default_length_max() -> f32 {
    1.5
}

const fn default_thickness_min() -> f32 {
    0.1
}

const fn default_thickness_max() -> f32 {
    0.13
}

const fn default_widest() -> f32 {
    0.3
}

const fn default_tail() -> f32 {
    0.15
}

const fn default_lifetime_min() -> u32 {
    3000
}

const fn default_lifetime_max() -> u32 {
    9000
}

/// Creates fish and places them in a pond.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawner {
    config: SpawnerConfig,
    body: BodyConfig,
    fish: FishConfig,
}

impl Spawner {
    /// A spawner producing fish with the given body and steering settings.
    pub const fn new(config: SpawnerConfig, body: BodyConfig, fish: FishConfig) -> Self {
        Self { config, body, fish }
    }

    /// Spawner settings.
    pub const fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Maybe spawn one fish at a random spot.
    ///
    /// Returns `Ok(None)` when the pond has no spawn headroom or the dice
    /// say no this tick.
    pub fn try_spawn<R: Rng>(
        &self,
        pond: &mut Pond<Fish>,
        atlas: &mut Atlas,
        rng: &mut R,
    ) -> Result<Option<FishId>, SpawnError> {
        if !pond.can_spawn() || rng.random::<f32>() >= self.config.spawn_chance {
            return Ok(None);
        }
        let id = self.spawn_random(pond, atlas, rng)?;
        info!(fish = %id, population = pond.len(), "Fish spawned");
        Ok(Some(id))
    }

    /// Place a fish at `position` heading along `direction`.
    ///
    /// Only the hard capacity applies; returns `Ok(None)` when the pond is full.
    pub fn drop_fish<R: Rng>(
        &self,
        pond: &mut Pond<Fish>,
        atlas: &mut Atlas,
        position: Vec2,
        direction: Vec2,
        rng: &mut R,
    ) -> Result<Option<FishId>, SpawnError> {
        if !pond.can_drop() {
            debug!(population = pond.len(), "Pond full, drop ignored");
            return Ok(None);
        }
        let fish = self.create(atlas, position, direction, rng)?;
        let id = fish.id();
        pond.add_fish(fish);
        info!(fish = %id, %position, population = pond.len(), "Fish dropped");
        Ok(Some(id))
    }

    /// Spawn up to `count` fish at once, ignoring the spawn chance but not
    /// the headroom. Returns how many were placed.
    pub fn populate<R: Rng>(
        &self,
        pond: &mut Pond<Fish>,
        atlas: &mut Atlas,
        rng: &mut R,
        count: usize,
    ) -> Result<usize, SpawnError> {
        let mut placed: usize = 0;
        while placed < count && pond.can_spawn() {
            self.spawn_random(pond, atlas, rng)?;
            placed = placed.saturating_add(1);
        }
        info!(requested = count, placed, capacity = pond.capacity(), "Pond populated");
        Ok(placed)
    }

    fn spawn_random<R: Rng>(
        &self,
        pond: &mut Pond<Fish>,
        atlas: &mut Atlas,
        rng: &mut R,
    ) -> Result<FishId, SpawnError> {
        let position = pond.constraint().random_point(rng, self.config.spawn_inset);
        let direction = Vec2::from_angle(rng.random::<f32>() * TAU);
        let fish = self.create(atlas, position, direction, rng)?;
        let id = fish.id();
        pond.add_fish(fish);
        Ok(id)
    }

    fn create<R: Rng>(
        &self,
        atlas: &mut Atlas,
        position: Vec2,
        direction: Vec2,
        rng: &mut R,
    ) -> Result<Fish, SpawnError> {
        let cfg = &self.config;
        let length = between(cfg.length_min, cfg.length_max, rng.random());
        let shape = BodyShape {
            length,
            radius: length * between(cfg.thickness_min, cfg.thickness_max, rng.random()),
            widest: cfg.widest,
            tail: cfg.tail,
        };
        let lifetime = rng.random_range(cfg.lifetime_min..=cfg.lifetime_max.max(cfg.lifetime_min));

        let slot = atlas.allocate().ok_or_else(|| SpawnError::AtlasFull {
            capacity: atlas.capacity(),
        })?;
        let body = match FishBody::new(position, direction, &shape, &self.body, slot.region()) {
            Ok(body) => body,
            Err(source) => {
                atlas.release(slot);
                return Err(SpawnError::Body { source });
            }
        };
        Ok(Fish::new(body, slot, direction, self.fish, lifetime))
    }
}

fn between(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t
}
