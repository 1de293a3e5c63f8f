//! Fish body: a spring chain driven by a swim phase, rendered as a ribbon.
//!
//! Each tick the body receives the head position, heading and speed chosen
//! by the fish's steering. The heading is turned around (the chain trails
//! behind the head) and wobbled by `cos(phase) * (speed - threshold) *
//! amplitude` before it seeds the chain relaxation. The phase then advances
//! with speed and wraps into `[0, 2π)`.
//!
//! Rendering is a pure read of the previous and current chain snapshots, so
//! any number of frames can be drawn between two ticks.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

use crate::config::{BodyConfig, SwimConfig};
use crate::error::BodyError;
use crate::shape::{BodyShape, TextureRegion};
use crate::spine::SpringChain;
use crate::strip::StripSink;

/// The deformable body of one fish.
#[derive(Debug, Clone, PartialEq)]
pub struct FishBody {
    chain: SpringChain,
    swim: SwimConfig,
    /// Swim phase in `[0, 2π)`.
    phase: f32,
    /// Texture U per segment.
    texture_u: Vec<f32>,
    /// Texture V at the spine.
    texture_v: f32,
    /// Texture-space half-thickness per segment.
    texture_radius: Vec<f32>,
}

impl FishBody {
    /// Build a body whose head sits at `head`, facing `direction`.
    ///
    /// Texture coordinates are derived from `region` once and never change.
    pub fn new(
        head: Vec2,
        direction: Vec2,
        shape: &BodyShape,
        config: &BodyConfig,
        region: TextureRegion,
    ) -> Result<Self, BodyError> {
        shape.validate()?;
        config.swim.validate()?;

        let chain = SpringChain::new(head, direction, shape.length, &config.spine, |t| {
            shape.radius_at(t)
        })?;

        let links = chain.len().saturating_sub(1).max(1);
        #[allow(clippy::cast_precision_loss)]
        let texture_u = (0..chain.len())
            .map(|i| region.origin.x + region.size.x * (i as f32 / links as f32))
            .collect();

        let half_height = region.size.y * 0.5;
        let texture_radius = chain
            .radius()
            .iter()
            .map(|r| half_height * (r / shape.radius).min(1.0))
            .collect();

        Ok(Self {
            chain,
            swim: config.swim,
            phase: 0.0,
            texture_u,
            texture_v: region.center_v(),
            texture_radius,
        })
    }

    /// Advance the body by one tick.
    ///
    /// `direction` is the fish heading, `speed` its forward speed this
    /// tick. Negative or non-finite speeds count as zero. A zero or
    /// non-finite heading keeps the direction the body already faces.
    pub fn update(&mut self, head: Vec2, direction: Vec2, speed: f32) {
        let speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
        let direction = direction
            .try_normalize()
            .unwrap_or_else(|| self.chain.heading());

        let angle = self.wobble_angle(direction, speed);
        self.chain.update(head, Vec2::new(angle.cos(), angle.sin()));

        self.phase = wrap_phase(self.phase + self.swim.swim_speed * speed);
    }

    /// Direction, as an angle, in which the first link leaves the head.
    ///
    /// Below `speed_threshold` the wobble term flips sign. That is the stock
    /// behavior and is kept as is.
    fn wobble_angle(&self, direction: Vec2, speed: f32) -> f32 {
        direction.y.atan2(direction.x)
            + PI
            + self.phase.cos() * (speed - self.swim.speed_threshold) * self.swim.swim_amplitude
    }

    /// Emit the body ribbon at interpolation fraction `time` into `sink`.
    ///
    /// The head starts a new strip with a single point; every following
    /// segment appends a left and a right vertex, offset along the local
    /// normal by the segment radius. The tangent between interpolated
    /// segments is `spacing` long, so dividing the radius by `spacing`
    /// normalizes the offset without a square root.
    pub fn render<S: StripSink + ?Sized>(&self, sink: &mut S, time: f32) {
        let time = if time.is_finite() {
            time.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let spacing = self.chain.spacing();

        let mut points = self
            .chain
            .segments_previous()
            .iter()
            .zip(self.chain.segments())
            .map(|(previous, current)| previous.lerp(*current, time));

        let Some(mut previous) = points.next() else {
            return;
        };
        let head_u = self.texture_u.first().copied().unwrap_or(0.0);
        sink.cut(previous, Vec2::new(head_u, self.texture_v));

        let attributes = self
            .chain
            .radius()
            .iter()
            .zip(&self.texture_u)
            .zip(&self.texture_radius)
            .skip(1);

        for (point, ((radius, u), v_radius)) in points.zip(attributes) {
            let tangent = previous - point;
            let scale = radius / spacing;

            let left = point + Vec2::new(-tangent.y, tangent.x) * scale;
            let right = point + Vec2::new(tangent.y, -tangent.x) * scale;

            sink.append(left, Vec2::new(*u, self.texture_v - v_radius));
            sink.append(right, Vec2::new(*u, self.texture_v + v_radius));

            previous = point;
        }
    }

    /// The underlying spine.
    pub const fn chain(&self) -> &SpringChain {
        &self.chain
    }

    /// Current swim phase in `[0, 2π)`.
    pub const fn phase(&self) -> f32 {
        self.phase
    }

    /// Current head position.
    pub fn head(&self) -> Vec2 {
        self.chain.head()
    }

    /// Texture U per segment.
    pub fn texture_u(&self) -> &[f32] {
        &self.texture_u
    }

    /// Texture-space half-thickness per segment.
    pub fn texture_radius(&self) -> &[f32] {
        &self.texture_radius
    }

    /// Texture V along the spine.
    pub const fn texture_v(&self) -> f32 {
        self.texture_v
    }
}

/// Wrap a phase into `[0, 2π)`.
fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(TAU);
    if wrapped.is_finite() && wrapped < TAU {
        wrapped
    } else {
        0.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::SpineConfig;
    use crate::strip::StripBatch;

    /// Records every strip command in order.
    #[derive(Default)]
    struct Recorder {
        cuts: Vec<(Vec2, Vec2)>,
        appends: Vec<(Vec2, Vec2)>,
    }

    impl StripSink for Recorder {
        fn cut(&mut self, position: Vec2, uv: Vec2) {
            self.cuts.push((position, uv));
        }

        fn append(&mut self, position: Vec2, uv: Vec2) {
            self.appends.push((position, uv));
        }
    }

    fn unit_body() -> FishBody {
        let shape = BodyShape {
            length: 4.0,
            radius: 0.5,
            ..BodyShape::default()
        };
        let config = BodyConfig {
            spine: SpineConfig {
                resolution: 1.0,
                ..SpineConfig::default()
            },
            ..BodyConfig::default()
        };
        FishBody::new(Vec2::ZERO, Vec2::X, &shape, &config, TextureRegion::FULL).unwrap()
    }

    fn assert_spacing(body: &FishBody) {
        let spacing = body.chain().spacing();
        for pair in body.chain().segments().windows(2) {
            let distance = pair[0].distance(pair[1]);
            assert!((distance - spacing).abs() < 1e-6, "{distance} != {spacing}");
        }
    }

    #[test]
    fn five_segment_head_step_keeps_unit_links() {
        let mut body = unit_body();
        assert_eq!(body.chain().len(), 5);
        assert!((body.chain().spacing() - 1.0).abs() < 1e-6);

        body.update(Vec2::new(1.0, 0.0), Vec2::X, 0.0);

        assert_spacing(&body);
        assert!(body.head().distance(Vec2::new(1.0, 0.0)) < 1e-6);
    }

    #[test]
    fn phase_stays_wrapped() {
        let mut body = unit_body();
        for step in 0..1_000 {
            #[allow(clippy::cast_precision_loss)]
            let speed = 0.05 + (step % 13) as f32 * 0.37;
            body.update(body.head() + Vec2::X * speed, Vec2::X, speed);
            assert!((0.0..TAU).contains(&body.phase()), "phase {}", body.phase());
        }
    }

    #[test]
    fn phase_advances_with_speed() {
        let mut body = unit_body();
        body.update(Vec2::new(0.1, 0.0), Vec2::X, 0.1);
        let expected = SwimConfig::default().swim_speed * 0.1;
        assert!((body.phase() - expected).abs() < 1e-6);
    }

    #[test]
    fn negative_speed_is_idle() {
        let mut body = unit_body();
        body.update(Vec2::ZERO, Vec2::X, -3.0);
        assert!(body.phase().abs() < f32::EPSILON);
    }

    #[test]
    fn idle_body_settles_into_a_line() {
        let mut body = unit_body();
        // Kink the body first, then hold the head still at zero speed.
        for step in 0..10 {
            #[allow(clippy::cast_precision_loss)]
            let y = (step % 2) as f32;
            body.update(Vec2::new(0.0, y), Vec2::Y, 0.3);
        }
        let head = Vec2::new(0.0, 1.0);
        for _ in 0..2_000 {
            body.update(head, Vec2::Y, 0.0);
        }

        let segments = body.chain().segments();
        let axis = (segments[1] - segments[0]).normalize();
        for segment in &segments[2..] {
            let offset = *segment - segments[0];
            let cross = axis.perp_dot(offset);
            assert!(cross.abs() < 1e-3, "segment off the line by {cross}");
            assert!(axis.dot(offset) > 0.0);
        }

        // A settled body no longer moves between ticks.
        let before = segments.to_vec();
        body.update(head, Vec2::Y, 0.0);
        for (a, b) in before.iter().zip(body.chain().segments()) {
            assert!(a.distance(*b) < 1e-4);
        }
    }

    #[test]
    fn below_threshold_wobble_inverts() {
        // At phase 0 the wobble is (speed - threshold) * amplitude, so a
        // stationary fish leans to the opposite side of a fast one.
        let body = unit_body();
        let swim = SwimConfig::default();
        let idle = body.wobble_angle(Vec2::X, 0.0) - PI;
        let fast = body.wobble_angle(Vec2::X, swim.speed_threshold * 2.0) - PI;
        assert!(idle < 0.0);
        assert!(fast > 0.0);
        assert!((idle + fast).abs() < 1e-6);
        assert!((body.wobble_angle(Vec2::X, swim.speed_threshold) - PI).abs() < 1e-6);
    }

    #[test]
    fn zero_heading_keeps_the_first_link() {
        let shape = BodyShape {
            length: 4.0,
            radius: 0.5,
            ..BodyShape::default()
        };
        let config = BodyConfig {
            spine: SpineConfig {
                resolution: 1.0,
                ..SpineConfig::default()
            },
            ..BodyConfig::default()
        };
        let mut body =
            FishBody::new(Vec2::ZERO, Vec2::Y, &shape, &config, TextureRegion::FULL).unwrap();
        let mut steered = body.clone();
        let head = Vec2::new(0.0, 0.1);

        body.update(head, Vec2::ZERO, 0.0);
        steered.update(head, Vec2::Y, 0.0);

        let first_link = |body: &FishBody| {
            let segments = body.chain().segments();
            (segments[1] - segments[0]).normalize()
        };
        let swing = first_link(&body).angle_to(first_link(&steered)).abs();
        assert!(swing < 1e-4, "first link swung by {swing} rad");
        assert!(body.chain().segments().iter().all(|p| p.is_finite()));
        assert_spacing(&body);
    }

    #[test]
    fn non_finite_heading_is_ignored() {
        let mut body = unit_body();
        let mut steered = body.clone();
        body.update(Vec2::new(0.3, 0.0), Vec2::new(f32::NAN, 1.0), 0.1);
        steered.update(Vec2::new(0.3, 0.0), Vec2::X, 0.1);
        assert_eq!(body.chain().segments(), steered.chain().segments());
    }

    #[test]
    fn render_emits_one_cut_and_two_vertices_per_segment() {
        let body = unit_body();
        let mut recorder = Recorder::default();
        body.render(&mut recorder, 1.0);
        assert_eq!(recorder.cuts.len(), 1);
        assert_eq!(recorder.appends.len(), 2 * (body.chain().len() - 1));
        assert!(recorder.cuts[0].0.distance(Vec2::ZERO) < 1e-6);
    }

    #[test]
    fn ribbon_width_matches_radius() {
        let body = unit_body();
        let mut recorder = Recorder::default();
        body.render(&mut recorder, 1.0);

        let radius = body.chain().radius();
        for (i, pair) in recorder.appends.chunks(2).enumerate() {
            let [(left, left_uv), (right, right_uv)] = pair else {
                panic!("odd vertex count");
            };
            let width = left.distance(*right);
            assert!((width - 2.0 * radius[i + 1]).abs() < 1e-5);
            // The straight body lies on the x axis, left is +y.
            assert!(left.y > right.y);
            assert!(left_uv.y < right_uv.y);
            assert!((left_uv.x - right_uv.x).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn texture_coordinates_span_the_region() {
        let shape = BodyShape::default();
        let region = TextureRegion {
            origin: Vec2::new(0.25, 0.5),
            size: Vec2::new(0.25, 0.125),
        };
        let body =
            FishBody::new(Vec2::ZERO, Vec2::X, &shape, &BodyConfig::default(), region).unwrap();
        let u = body.texture_u();
        assert!((u[0] - 0.25).abs() < 1e-6);
        assert!((u[u.len() - 1] - 0.5).abs() < 1e-6);
        assert!((body.texture_v() - 0.5625).abs() < 1e-6);
        assert!(body.texture_radius().iter().all(|r| *r <= 0.0625 + 1e-6));
    }

    #[test]
    fn render_is_repeatable_between_ticks() {
        let mut body = unit_body();
        body.update(Vec2::new(0.5, 0.2), Vec2::X, 0.2);

        let mut first = StripBatch::new();
        let mut second = StripBatch::new();
        body.render(&mut first, 0.25);
        body.render(&mut second, 0.75);
        let mut again = StripBatch::new();
        body.render(&mut again, 0.25);

        assert_eq!(first, again);
        assert_ne!(first, second);
    }

    #[test]
    fn render_interpolates_the_head() {
        let mut body = unit_body();
        body.update(Vec2::new(1.0, 0.0), Vec2::X, 0.0);
        let mut recorder = Recorder::default();
        body.render(&mut recorder, 0.5);
        assert!(recorder.cuts[0].0.distance(Vec2::new(0.5, 0.0)) < 1e-6);

        let mut clamped = Recorder::default();
        body.render(&mut clamped, 7.0);
        assert!(clamped.cuts[0].0.distance(Vec2::new(1.0, 0.0)) < 1e-6);
    }

    #[test]
    fn rejects_invalid_shape() {
        let shape = BodyShape {
            radius: -1.0,
            ..BodyShape::default()
        };
        let result = FishBody::new(
            Vec2::ZERO,
            Vec2::X,
            &shape,
            &BodyConfig::default(),
            TextureRegion::FULL,
        );
        assert!(matches!(result, Err(BodyError::InvalidShape { .. })));
    }
}
