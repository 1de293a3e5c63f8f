//! Geometric boundary of a pond.
//!
//! A [`Constraint`] is the region fish are steered back into. It also fixes
//! how many fish the pond may hold: `floor(area * fish_density)`, computed
//! once at construction and never changed afterwards.

use std::f32::consts::TAU;

use glam::Vec2;
use koi_body::StripSink;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::PondError;

/// Thickness of the rendered outline in world units.
const OUTLINE_WIDTH: f32 = 0.06;

/// Number of quads approximating a circular outline.
const OUTLINE_SEGMENTS: u16 = 64;

/// The outline of a pond.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintShape {
    /// A round pond.
    Circle {
        /// Center of the pond.
        center: Vec2,
        /// Radius of the pond.
        radius: f32,
    },
    /// An axis-aligned rectangular pond.
    Rect {
        /// Lower-left corner.
        min: Vec2,
        /// Upper-right corner.
        max: Vec2,
    },
}

impl Default for ConstraintShape {
    fn default() -> Self {
        Self::Circle {
            center: Vec2::ZERO,
            radius: 6.0,
        }
    }
}

impl ConstraintShape {
    fn validate(&self) -> Result<(), PondError> {
        match *self {
            Self::Circle { center, radius } => {
                if !center.is_finite() {
                    return Err(PondError::InvalidConstraint {
                        reason: format!("circle center must be finite, got {center}"),
                    });
                }
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(PondError::InvalidConstraint {
                        reason: format!("circle radius must be positive and finite, got {radius}"),
                    });
                }
            }
            Self::Rect { min, max } => {
                if !(min.is_finite() && max.is_finite()) {
                    return Err(PondError::InvalidConstraint {
                        reason: format!("rectangle corners must be finite, got {min} and {max}"),
                    });
                }
                if !(max.x > min.x && max.y > min.y) {
                    return Err(PondError::InvalidConstraint {
                        reason: format!("rectangle max {max} must exceed min {min} on both axes"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Surface area of the shape.
    pub fn area(&self) -> f32 {
        match *self {
            Self::Circle { radius, .. } => std::f32::consts::PI * radius * radius,
            Self::Rect { min, max } => {
                let size = max - min;
                size.x * size.y
            }
        }
    }

    /// Distance to the nearest edge (positive inside) and the inward normal
    /// of that edge.
    fn edge(&self, point: Vec2) -> (f32, Vec2) {
        match *self {
            Self::Circle { center, radius } => {
                let offset = point - center;
                let distance = offset.length();
                let inward = if distance > 0.0 {
                    -offset / distance
                } else {
                    Vec2::X
                };
                (radius - distance, inward)
            }
            Self::Rect { min, max } => [
                (point.x - min.x, Vec2::X),
                (max.x - point.x, Vec2::NEG_X),
                (point.y - min.y, Vec2::Y),
                (max.y - point.y, Vec2::NEG_Y),
            ]
            .into_iter()
            .fold((f32::INFINITY, Vec2::X), |nearest, side| {
                if side.0 < nearest.0 { side } else { nearest }
            }),
        }
    }
}

/// A pond boundary with a fixed fish capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    shape: ConstraintShape,
    capacity: usize,
}

impl Constraint {
    /// Build a constraint whose capacity is `floor(area * fish_density)`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(shape: ConstraintShape, fish_density: f32) -> Result<Self, PondError> {
        shape.validate()?;
        if !(fish_density.is_finite() && fish_density >= 0.0) {
            return Err(PondError::InvalidConstraint {
                reason: format!("fish density must be finite and non-negative, got {fish_density}"),
            });
        }
        let capacity = (shape.area() * fish_density).floor();
        if !capacity.is_finite() {
            return Err(PondError::InvalidConstraint {
                reason: format!("capacity overflows for density {fish_density}"),
            });
        }
        // Non-negative and finite per the checks above; `as` saturates.
        Ok(Self {
            shape,
            capacity: capacity as usize,
        })
    }

    /// Build a constraint with an explicit capacity.
    pub fn with_capacity(shape: ConstraintShape, capacity: usize) -> Result<Self, PondError> {
        shape.validate()?;
        Ok(Self { shape, capacity })
    }

    /// The boundary shape.
    pub const fn shape(&self) -> &ConstraintShape {
        &self.shape
    }

    /// Maximum number of fish this pond may hold.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `point` lies inside the boundary (edges included).
    pub fn contains(&self, point: Vec2) -> bool {
        self.shape.edge(point).0 >= 0.0
    }

    /// Push back toward the interior for a fish at `point`.
    ///
    /// Returns the inward normal of the nearest edge scaled by how deep
    /// into the `margin` band the point is: approaching `0` at `margin`
    /// from the edge, `1` on the edge or outside. `None` when the point is
    /// further than `margin` inside.
    pub fn repel(&self, point: Vec2, margin: f32) -> Option<Vec2> {
        let (depth, inward) = self.shape.edge(point);
        if !depth.is_finite() || depth >= margin {
            return None;
        }
        let proximity = if margin > 0.0 {
            (1.0 - depth / margin).min(1.0)
        } else {
            1.0
        };
        Some(inward * proximity)
    }

    /// A uniformly distributed point at least `inset` away from the edge.
    ///
    /// When `inset` swallows the whole shape the center is returned.
    pub fn random_point<R: Rng>(&self, rng: &mut R, inset: f32) -> Vec2 {
        let inset = inset.max(0.0);
        match self.shape {
            ConstraintShape::Circle { center, radius } => {
                let reach = (radius - inset).max(0.0);
                let distance = reach * rng.random::<f32>().sqrt();
                let angle = rng.random::<f32>() * TAU;
                center + Vec2::from_angle(angle) * distance
            }
            ConstraintShape::Rect { min, max } => {
                let low = min + inset;
                let high = max - inset;
                let pick = |low: f32, high: f32, t: f32| {
                    if high > low {
                        low + (high - low) * t
                    } else {
                        (low + high) * 0.5
                    }
                };
                Vec2::new(
                    pick(low.x, high.x, rng.random::<f32>()),
                    pick(low.y, high.y, rng.random::<f32>()),
                )
            }
        }
    }

    /// Draw the boundary as one closed outline strip.
    #[allow(clippy::cast_precision_loss)]
    pub fn render<S: StripSink + ?Sized>(&self, sink: &mut S) {
        let half = OUTLINE_WIDTH * 0.5;
        match self.shape {
            ConstraintShape::Circle { center, radius } => {
                let inner = (radius - half).max(0.0);
                let outer = radius + half;
                for step in 0..=OUTLINE_SEGMENTS {
                    let t = f32::from(step) / f32::from(OUTLINE_SEGMENTS);
                    let normal = Vec2::from_angle(t * TAU);
                    emit_ring_pair(
                        sink,
                        step == 0,
                        center + normal * inner,
                        center + normal * outer,
                        t,
                    );
                }
            }
            ConstraintShape::Rect { min, max } => {
                let corners = [
                    (Vec2::new(min.x, min.y), Vec2::new(-1.0, -1.0)),
                    (Vec2::new(max.x, min.y), Vec2::new(1.0, -1.0)),
                    (Vec2::new(max.x, max.y), Vec2::new(1.0, 1.0)),
                    (Vec2::new(min.x, max.y), Vec2::new(-1.0, 1.0)),
                ];
                let closed = corners.iter().chain(corners.first());
                for (step, (corner, outward)) in closed.enumerate() {
                    let t = step as f32 / corners.len() as f32;
                    emit_ring_pair(
                        sink,
                        step == 0,
                        *corner - *outward * half,
                        *corner + *outward * half,
                        t,
                    );
                }
            }
        }
    }
}

fn emit_ring_pair<S: StripSink + ?Sized>(
    sink: &mut S,
    first: bool,
    inner: Vec2,
    outer: Vec2,
    u: f32,
) {
    if first {
        sink.cut(inner, Vec2::new(u, 0.0));
    } else {
        sink.append(inner, Vec2::new(u, 0.0));
    }
    sink.append(outer, Vec2::new(u, 1.0));
}
