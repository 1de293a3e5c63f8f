//! Tunables for spine stiffness and swimming.
//!
//! These values live under the `body` key of `koi-config.yaml`. Every field
//! has a default, so an empty section (or no section at all) yields the
//! stock koi behavior.

use serde::{Deserialize, Serialize};

use crate::error::BodyError;

/// Parameters of the spring chain that forms a fish spine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpineConfig {
    /// Target distance between segments; decides the segment count (default: 0.15).
    #[serde(default = "default_resolution")]
    pub resolution: f32,

    /// Spring strength of the segment right behind the head (default: 0.9).
    #[serde(default = "default_spring_head")]
    pub spring_head: f32,

    /// Spring strength of the last segment (default: 0.35).
    #[serde(default = "default_spring_tail")]
    pub spring_tail: f32,

    /// Exponent of the head-to-tail strength curve (default: 1.6).
    #[serde(default = "default_spring_power")]
    pub spring_power: f32,
}

impl Default for SpineConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            spring_head: default_spring_head(),
            spring_tail: default_spring_tail(),
            spring_power: default_spring_power(),
        }
    }
}

impl SpineConfig {
    /// Check that every parameter is usable.
    ///
    /// Strengths must lie in `[0, 1]`; the power must be positive.
    pub fn validate(&self) -> Result<(), BodyError> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(BodyError::InvalidResolution {
                resolution: self.resolution,
            });
        }
        for (name, value) in [
            ("spring_head", self.spring_head),
            ("spring_tail", self.spring_tail),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BodyError::InvalidConfig {
                    reason: format!("{name} must be within [0, 1], got {value}"),
                });
            }
        }
        if !(self.spring_power.is_finite() && self.spring_power > 0.0) {
            return Err(BodyError::InvalidConfig {
                reason: format!(
                    "spring_power must be positive and finite, got {}",
                    self.spring_power
                ),
            });
        }
        Ok(())
    }

    /// Spring strength at link `index` of a chain with `segments` segments.
    ///
    /// Follows a power curve from `spring_head` (link 0) to `spring_tail`
    /// (link `segments - 2`).
    #[allow(clippy::cast_precision_loss)]
    pub fn strength_at(&self, index: usize, segments: usize) -> f32 {
        let last = segments.saturating_sub(2).max(1);
        let t = (index as f32 / last as f32).clamp(0.0, 1.0);
        self.spring_head + (self.spring_tail - self.spring_head) * t.powf(self.spring_power)
    }
}

/// Parameters of the swim cycle that wobbles the head.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwimConfig {
    /// Phase advance per unit of speed, in radians (default: 8.0).
    #[serde(default = "default_swim_speed")]
    pub swim_speed: f32,

    /// Wobble angle per unit of speed above the threshold, in radians (default: 8.0).
    #[serde(default = "default_swim_amplitude")]
    pub swim_amplitude: f32,

    /// Speed at which the wobble vanishes (default: 0.02).
    ///
    /// Below it the wobble term changes sign; idle fish settle regardless.
    #[serde(default = "default_speed_threshold")]
    pub speed_threshold: f32,
}

impl Default for SwimConfig {
    fn default() -> Self {
        Self {
            swim_speed: default_swim_speed(),
            swim_amplitude: default_swim_amplitude(),
            speed_threshold: default_speed_threshold(),
        }
    }
}

impl SwimConfig {
    /// Check that every parameter is finite and non-negative.
    pub fn validate(&self) -> Result<(), BodyError> {
        for (name, value) in [
            ("swim_speed", self.swim_speed),
            ("swim_amplitude", self.swim_amplitude),
            ("speed_threshold", self.speed_threshold),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(BodyError::InvalidConfig {
                    reason: format!("{name} must be finite and non-negative, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Everything a [`FishBody`](crate::FishBody) needs besides its shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Spring chain parameters.
    #[serde(default)]
    pub spine: SpineConfig,

    /// Swim cycle parameters.
    #[serde(default)]
    pub swim: SwimConfig,
}

impl BodyConfig {
    /// Validate both sections.
    pub fn validate(&self) -> Result<(), BodyError> {
        self.spine.validate()?;
        self.swim.validate()
    }
}

const fn default_resolution() -> f32 {
    0.15
}

const fn default_spring_head() -> f32 {
    0.9
}

const fn default_spring_tail() -> f32 {
    0.35
}

const fn default_spring_power() -> f32 {
    1.6
}

const fn default_swim_speed() -> f32 {
    8.0
}

const fn default_swim_amplitude() -> f32 {
    8.0
}

const fn default_speed_threshold() -> f32 {
    0.02
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(BodyConfig::default().validate().is_ok());
    }

    #[test]
    fn strength_runs_from_head_to_tail() {
        let cfg = SpineConfig::default();
        let first = cfg.strength_at(0, 9);
        let last = cfg.strength_at(7, 9);
        assert!((first - cfg.spring_head).abs() < 1e-6);
        assert!((last - cfg.spring_tail).abs() < 1e-6);
    }

    #[test]
    fn strength_is_monotonic() {
        let cfg = SpineConfig::default();
        let strengths: Vec<f32> = (0..8).map(|i| cfg.strength_at(i, 9)).collect();
        for pair in strengths.windows(2) {
            if let [a, b] = pair {
                assert!(b <= a, "{b} > {a}");
            }
        }
    }

    #[test]
    fn two_segment_chain_uses_head_strength() {
        let cfg = SpineConfig::default();
        assert!((cfg.strength_at(0, 2) - cfg.spring_head).abs() < 1e-6);
    }

    #[test]
    fn rejects_strength_outside_unit_range() {
        let cfg = SpineConfig {
            spring_tail: 1.5,
            ..SpineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(BodyError::InvalidConfig { .. })));
    }

    #[test]
    fn rejects_zero_resolution() {
        let cfg = SpineConfig {
            resolution: 0.0,
            ..SpineConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(BodyError::InvalidResolution { .. })
        ));
    }

    #[test]
    fn rejects_negative_swim_amplitude() {
        let cfg = SwimConfig {
            swim_amplitude: -1.0,
            ..SwimConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let cfg: BodyConfig = serde_yml::from_str("spine:\n  resolution: 0.25\n").unwrap();
        assert!((cfg.spine.resolution - 0.25).abs() < 1e-6);
        assert_eq!(cfg.swim, SwimConfig::default());
        assert!((cfg.spine.spring_head - 0.9).abs() < 1e-6);
    }
}
