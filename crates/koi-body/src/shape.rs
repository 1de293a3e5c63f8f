//! Body outline and texture placement.
//!
//! The outline only feeds geometry. Spine dynamics never look at it.

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::BodyError;

/// Outline of a fish body along its spine.
///
/// The half-thickness starts at 60% of `radius` at the head, swells to the
/// full `radius` at fraction `widest` of the length, and tapers along a
/// quarter cosine to `tail * radius` at the tip of the tail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyShape {
    /// Spine length in world units.
    pub length: f32,
    /// Maximum half-thickness in world units.
    pub radius: f32,
    /// Position of the widest point as a fraction of the length, in `(0, 1)`.
    pub widest: f32,
    /// Tail half-thickness as a fraction of `radius`, in `[0, 1]`.
    pub tail: f32,
}

/// Half-thickness at the head relative to the widest point.
const HEAD_RADIUS: f32 = 0.6;

impl Default for BodyShape {
    fn default() -> Self {
        Self {
            length: 1.2,
            radius: 0.14,
            widest: 0.3,
            tail: 0.15,
        }
    }
}

impl BodyShape {
    /// Check the outline parameters.
    pub fn validate(&self) -> Result<(), BodyError> {
        if !(self.length.is_finite() && self.length > 0.0) {
            return Err(BodyError::InvalidLength {
                length: self.length,
            });
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(BodyError::InvalidShape {
                reason: format!("radius must be positive and finite, got {}", self.radius),
            });
        }
        if !(self.widest > 0.0 && self.widest < 1.0) {
            return Err(BodyError::InvalidShape {
                reason: format!("widest must be within (0, 1), got {}", self.widest),
            });
        }
        if !(0.0..=1.0).contains(&self.tail) {
            return Err(BodyError::InvalidShape {
                reason: format!("tail must be within [0, 1], got {}", self.tail),
            });
        }
        Ok(())
    }

    /// Half-thickness at fraction `t` of the length (0 = head, 1 = tail).
    pub fn radius_at(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t < self.widest {
            let rise = (t / self.widest * FRAC_PI_2).sin();
            self.radius * (HEAD_RADIUS + (1.0 - HEAD_RADIUS) * rise)
        } else {
            let fall = ((t - self.widest) / (1.0 - self.widest) * FRAC_PI_2).cos();
            self.radius * (self.tail + (1.0 - self.tail) * fall)
        }
    }
}

/// Rectangle of texture space (UV units) holding a fish's pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureRegion {
    /// Top-left corner in UV space.
    pub origin: Vec2,
    /// Width and height in UV space.
    pub size: Vec2,
}

impl TextureRegion {
    /// The whole texture.
    pub const FULL: Self = Self {
        origin: Vec2::ZERO,
        size: Vec2::ONE,
    };

    /// Vertical center of the region.
    pub fn center_v(&self) -> f32 {
        self.origin.y + self.size.y * 0.5
    }
}
