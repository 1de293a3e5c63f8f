//! Spring chain approximating a fish spine.
//!
//! The chain is an ordered run of 2-D points, head first. Once per tick the
//! head is moved to wherever the fish is steering, and every following
//! segment is relaxed in a single front-to-back pass:
//!
//! 1. Snapshot the current segments as the previous render state.
//! 2. Place the head.
//! 3. For each segment `i >= 1`, blend its current offset from the (already
//!    moved) segment `i - 1` with the offset it would have if `i - 1` kept
//!    travelling along the propagated direction, then rescale the result to
//!    exactly `spacing`.
//!
//! The propagated direction starts as the caller's virtual forward vector
//! and becomes each segment's own pre-blend offset direction on the way
//! back, so the heading ripples down the body like a trailing rope. Segment
//! `i` depends on segment `i - 1` of the same tick, which is why the pass
//! must run head to tail.
//!
//! The pass is analytic and O(N): spacing is exact after every tick, while
//! total rope inextensibility under large head jumps is only approximate.

use glam::Vec2;
use tracing::trace;

use crate::config::SpineConfig;
use crate::error::BodyError;

/// Maximum number of segments in one spine.
pub const MAX_SEGMENTS: usize = 256;

/// A chain of spine segments connected by distance constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct SpringChain {
    /// Current positions, head first.
    segments: Vec<Vec2>,
    /// Positions at the start of the most recent tick.
    segments_previous: Vec<Vec2>,
    /// Distance between consecutive segments; fixed for the chain's lifetime.
    spacing: f32,
    /// Blend coefficient per link (`segments.len() - 1` entries).
    spring_strength: Vec<f32>,
    /// Half-thickness per segment. Geometry only.
    radius: Vec<f32>,
}

impl SpringChain {
    /// Build a straight chain trailing behind `head`, opposite to `direction`.
    ///
    /// The segment count is `ceil(length / resolution) + 1`. `radius` maps a
    /// fraction of the length (0 = head, 1 = tail) to the half-thickness at
    /// that point.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn new(
        head: Vec2,
        direction: Vec2,
        length: f32,
        config: &SpineConfig,
        radius: impl Fn(f32) -> f32,
    ) -> Result<Self, BodyError> {
        config.validate()?;
        if !(length.is_finite() && length > 0.0) {
            return Err(BodyError::InvalidLength { length });
        }

        let links = (length / config.resolution).ceil();
        if !links.is_finite() || links > (MAX_SEGMENTS - 1) as f32 {
            return Err(BodyError::TooManySegments {
                length,
                resolution: config.resolution,
                max: MAX_SEGMENTS,
            });
        }
        // links >= 1 because length > 0, and <= MAX_SEGMENTS - 1 per the check above.
        let links = (links as usize).max(1);
        let count = links.saturating_add(1);
        let spacing = length / links as f32;

        let back = -direction.try_normalize().unwrap_or(Vec2::X);
        let segments: Vec<Vec2> = (0..count)
            .map(|i| head + back * (spacing * i as f32))
            .collect();
        let spring_strength = (0..links).map(|i| config.strength_at(i, count)).collect();
        let radius = (0..count)
            .map(|i| radius(i as f32 / links as f32))
            .collect();

        Ok(Self {
            segments_previous: segments.clone(),
            segments,
            spacing,
            spring_strength,
            radius,
        })
    }

    /// Advance the chain by one tick.
    ///
    /// `head` is the new head position. `forward` is the direction in which
    /// the first link continues from the head; for a fish this points
    /// backwards from the heading, with the swim wobble already applied.
    /// It is normalized here; a zero or non-finite `forward` keeps the
    /// first link's current direction.
    pub fn update(&mut self, head: Vec2, forward: Vec2) {
        let forward = forward.try_normalize().unwrap_or_else(|| -self.heading());
        self.segments_previous.copy_from_slice(&self.segments);

        let spacing = self.spacing;
        let mut direction = forward;
        let mut anchor = head;

        let mut segments = self.segments.iter_mut();
        if let Some(first) = segments.next() {
            *first = head;
        }

        for (segment, strength) in segments.zip(&self.spring_strength) {
            let offset = *segment - anchor;
            let distance = offset.length();
            let continuation = anchor + direction * spacing - *segment;

            if distance > 0.0 && distance.is_finite() {
                direction = offset / distance;
            }

            let blended = offset + continuation * *strength;
            let blended_length = blended.length();

            *segment = if blended_length > 0.0 && blended_length.is_finite() {
                anchor + blended * (spacing / blended_length)
            } else {
                trace!("degenerate spine link, continuing along propagated direction");
                anchor + direction * spacing
            };
            anchor = *segment;
        }
    }

    /// Current segment positions, head first.
    pub fn segments(&self) -> &[Vec2] {
        &self.segments
    }

    /// Segment positions at the start of the most recent tick.
    pub fn segments_previous(&self) -> &[Vec2] {
        &self.segments_previous
    }

    /// Target distance between consecutive segments.
    pub const fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Blend coefficient per link, head first.
    pub fn spring_strength(&self) -> &[f32] {
        &self.spring_strength
    }

    /// Half-thickness per segment, head first.
    pub fn radius(&self) -> &[f32] {
        &self.radius
    }

    /// Number of segments (including the head).
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`: a chain holds at least two segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Current head position.
    pub fn head(&self) -> Vec2 {
        self.segments.first().copied().unwrap_or(Vec2::ZERO)
    }

    /// Unit direction from the second segment to the head.
    ///
    /// Falls back to `+X` while the two coincide.
    pub fn heading(&self) -> Vec2 {
        match self.segments.as_slice() {
            [head, neck, ..] => (*head - *neck).try_normalize().unwrap_or(Vec2::X),
            _ => Vec2::X,
        }
    }

    /// Segment `index` blended between the previous and current snapshot.
    pub fn interpolated(&self, index: usize, time: f32) -> Option<Vec2> {
        let previous = self.segments_previous.get(index)?;
        let current = self.segments.get(index)?;
        Some(previous.lerp(*current, time))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    fn unit_config() -> SpineConfig {
        SpineConfig {
            resolution: 1.0,
            ..SpineConfig::default()
        }
    }

    fn chain(length: f32, config: &SpineConfig) -> SpringChain {
        SpringChain::new(Vec2::ZERO, Vec2::X, length, config, |_| 0.1).unwrap()
    }

    fn assert_spacing(chain: &SpringChain) {
        for pair in chain.segments().windows(2) {
            let distance = pair[0].distance(pair[1]);
            assert!(
                (distance - chain.spacing()).abs() < 1e-4,
                "link length {distance} != spacing {}",
                chain.spacing()
            );
        }
    }

    #[test]
    fn segment_count_and_spacing() {
        let c = chain(4.0, &unit_config());
        assert_eq!(c.len(), 5);
        assert!((c.spacing() - 1.0).abs() < 1e-6);
        assert_eq!(c.spring_strength().len(), 4);
        assert_eq!(c.radius().len(), 5);
        assert_eq!(c.segments_previous().len(), 5);
    }

    #[test]
    fn partial_resolution_rounds_up() {
        // 1.2 / 0.5 = 2.4 -> 3 links, 4 segments, spacing 0.4
        let config = SpineConfig {
            resolution: 0.5,
            ..SpineConfig::default()
        };
        let c = chain(1.2, &config);
        assert_eq!(c.len(), 4);
        assert!((c.spacing() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn starts_straight_behind_the_head() {
        let c = chain(4.0, &unit_config());
        for (i, segment) in c.segments().iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let expected = Vec2::new(-(i as f32), 0.0);
            assert!(segment.distance(expected) < 1e-6);
        }
    }

    #[test]
    fn rejects_bad_lengths() {
        let config = unit_config();
        for length in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let result = SpringChain::new(Vec2::ZERO, Vec2::X, length, &config, |_| 0.1);
            assert!(result.is_err(), "length {length} accepted");
        }
    }

    #[test]
    fn rejects_too_many_segments() {
        let config = SpineConfig {
            resolution: 0.001,
            ..SpineConfig::default()
        };
        let result = SpringChain::new(Vec2::ZERO, Vec2::X, 10.0, &config, |_| 0.1);
        assert!(matches!(result, Err(BodyError::TooManySegments { .. })));
    }

    #[test]
    fn head_move_keeps_exact_spacing() {
        let mut c = chain(4.0, &unit_config());
        c.update(Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0));
        assert_spacing(&c);
        assert!(c.head().distance(Vec2::new(1.0, 0.0)) < 1e-6);
    }

    #[test]
    fn spacing_survives_violent_head_motion() {
        let mut c = chain(3.0, &SpineConfig::default());
        let mut angle = 0.0_f32;
        for step in 0..500 {
            angle += 0.7;
            #[allow(clippy::cast_precision_loss)]
            let radius = 5.0 + (step % 7) as f32 * 3.0;
            let head = Vec2::new(angle.cos(), angle.sin()) * radius;
            let forward = Vec2::new((angle + PI).cos(), (angle + PI).sin());
            c.update(head, forward);
            assert_spacing(&c);
            assert_eq!(c.len(), c.segments_previous().len());
        }
    }

    #[test]
    fn previous_snapshot_holds_pre_tick_state() {
        let mut c = chain(4.0, &unit_config());
        let before = c.segments().to_vec();
        c.update(Vec2::new(0.5, 0.5), Vec2::new(-1.0, 0.0));
        assert_eq!(c.segments_previous(), before.as_slice());
        assert_ne!(c.segments(), before.as_slice());
    }

    #[test]
    fn relaxes_head_to_tail_within_one_tick() {
        // Each segment must end up `spacing` away from the *moved* segment in
        // front of it. A tail-first pass would leave it relative to the
        // stale position instead.
        let mut c = chain(4.0, &unit_config());
        let before = c.segments().to_vec();
        c.update(Vec2::new(0.0, 3.0), Vec2::new(0.0, -1.0));
        assert_spacing(&c);
        let mut stale_matches = 0;
        for i in 1..c.len() {
            let stale = before[i - 1].distance(c.segments()[i]);
            if (stale - c.spacing()).abs() < 1e-4 {
                stale_matches += 1;
            }
        }
        assert!(stale_matches < c.len() - 1);
    }

    #[test]
    fn coincident_segments_stay_finite() {
        let mut c = chain(4.0, &unit_config());
        // Drop the head exactly onto segment 1.
        let onto = c.segments()[1];
        c.update(onto, Vec2::new(-1.0, 0.0));
        assert!(c.segments().iter().all(|p| p.is_finite()));
        assert_spacing(&c);
    }

    #[test]
    fn zero_strength_coincidence_uses_fallback() {
        let config = SpineConfig {
            resolution: 1.0,
            spring_head: 0.0,
            spring_tail: 0.0,
            ..SpineConfig::default()
        };
        let mut c = chain(4.0, &config);
        let onto = c.segments()[1];
        c.update(onto, Vec2::new(0.0, 1.0));
        assert!(c.segments().iter().all(|p| p.is_finite()));
        assert_spacing(&c);
        // The fallback continues along the propagated direction.
        assert!(c.segments()[1].distance(onto + Vec2::new(0.0, 1.0)) < 1e-5);
    }

    #[test]
    fn forward_length_does_not_matter() {
        let mut unit = chain(4.0, &unit_config());
        let mut long = unit.clone();
        unit.update(Vec2::new(0.5, 0.5), Vec2::new(-1.0, 0.0));
        long.update(Vec2::new(0.5, 0.5), Vec2::new(-7.5, 0.0));
        for (a, b) in unit.segments().iter().zip(long.segments()) {
            assert!(a.distance(*b) < 1e-6, "{a} != {b}");
        }
    }

    #[test]
    fn zero_forward_keeps_the_current_heading() {
        let mut c = chain(4.0, &unit_config());
        let mut reference = c.clone();
        c.update(Vec2::new(0.2, 0.0), Vec2::ZERO);
        reference.update(Vec2::new(0.2, 0.0), Vec2::new(-1.0, 0.0));
        assert_eq!(c.segments(), reference.segments());
        assert!(c.segments().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn heading_points_from_neck_to_head() {
        let c = chain(4.0, &unit_config());
        assert!(c.heading().distance(Vec2::X) < 1e-6);
        let turned = SpringChain::new(Vec2::ZERO, Vec2::Y, 2.0, &unit_config(), |_| 0.1).unwrap();
        assert!(turned.heading().distance(Vec2::Y) < 1e-6);
    }

    #[test]
    fn interpolation_blends_snapshots() {
        let mut c = chain(4.0, &unit_config());
        c.update(Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0));
        let start = c.interpolated(0, 0.0).unwrap();
        let middle = c.interpolated(0, 0.5).unwrap();
        let end = c.interpolated(0, 1.0).unwrap();
        assert!(start.distance(Vec2::ZERO) < 1e-6);
        assert!(middle.distance(Vec2::new(0.5, 0.0)) < 1e-6);
        assert!(end.distance(Vec2::new(1.0, 0.0)) < 1e-6);
        assert!(c.interpolated(99, 0.5).is_none());
    }
}
