//! Texture atlas slot allocation.
//!
//! Every live fish owns one rectangular slot of a shared pattern texture.
//! The atlas only does the bookkeeping: which slots are free, and where a
//! slot sits in UV space. Slots are handed out as [`AtlasSlot`] values that
//! can be neither cloned nor copied, so a slot goes back to the atlas at
//! most once.

use std::collections::BTreeSet;

use glam::Vec2;
use koi_body::TextureRegion;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PondError;

/// Layout of the pattern texture, in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// Edge length of the square atlas texture (default: 2048).
    #[serde(default = "default_resolution")]
    pub resolution: u32,

    /// Width of one slot (default: 256).
    #[serde(default = "default_slot_width")]
    pub slot_width: u32,

    /// Height of one slot (default: 128).
    #[serde(default = "default_slot_height")]
    pub slot_height: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            slot_width: default_slot_width(),
            slot_height: default_slot_height(),
        }
    }
}

const fn default_resolution() -> u32 {
    2048
}

const fn default_slot_width() -> u32 {
    256
}

const fn default_slot_height() -> u32 {
    128
}

/// One allocated atlas slot.
#[derive(Debug, PartialEq)]
pub struct AtlasSlot {
    index: u32,
    region: TextureRegion,
}

impl AtlasSlot {
    /// Position of the slot in the atlas grid (row-major).
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// The slot's rectangle in UV space.
    pub const fn region(&self) -> TextureRegion {
        self.region
    }
}

/// A grid of equally sized texture slots.
#[derive(Debug, Clone)]
pub struct Atlas {
    columns: u32,
    slots: u32,
    slot_size: Vec2,
    free: BTreeSet<u32>,
}

impl Atlas {
    /// Lay out the grid described by `config`.
    pub fn new(config: &AtlasConfig) -> Result<Self, PondError> {
        if config.resolution == 0 || config.slot_width == 0 || config.slot_height == 0 {
            return Err(PondError::InvalidAtlas {
                reason: "resolution and slot dimensions must be non-zero".to_owned(),
            });
        }
        let columns = config.resolution.checked_div(config.slot_width).unwrap_or(0);
        let rows = config.resolution.checked_div(config.slot_height).unwrap_or(0);
        if columns == 0 || rows == 0 {
            return Err(PondError::InvalidAtlas {
                reason: format!(
                    "a {}x{} slot does not fit a {} atlas",
                    config.slot_width, config.slot_height, config.resolution
                ),
            });
        }
        let slots = columns.checked_mul(rows).ok_or_else(|| PondError::InvalidAtlas {
            reason: "slot count overflows".to_owned(),
        })?;

        #[allow(clippy::cast_precision_loss)]
        let slot_size = Vec2::new(
            config.slot_width as f32 / config.resolution as f32,
            config.slot_height as f32 / config.resolution as f32,
        );

        Ok(Self {
            columns,
            slots,
            slot_size,
            free: (0..slots).collect(),
        })
    }

    /// Take the free slot with the lowest index.
    pub fn allocate(&mut self) -> Option<AtlasSlot> {
        let index = self.free.pop_first()?;
        Some(AtlasSlot {
            index,
            region: self.region(index),
        })
    }

    /// Return a slot to the pool.
    pub fn release(&mut self, slot: AtlasSlot) {
        if slot.index >= self.slots || !self.free.insert(slot.index) {
            warn!(index = slot.index, "Released a slot this atlas did not hand out");
        }
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        usize::try_from(self.slots).unwrap_or(usize::MAX)
    }

    #[allow(clippy::cast_precision_loss)]
    fn region(&self, index: u32) -> TextureRegion {
        let column = index.checked_rem(self.columns).unwrap_or(0);
        let row = index.checked_div(self.columns).unwrap_or(0);
        TextureRegion {
            origin: Vec2::new(column as f32, row as f32) * self.slot_size,
            size: self.slot_size,
        }
    }
}
