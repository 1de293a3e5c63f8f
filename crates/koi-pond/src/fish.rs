//! A single koi.
//!
//! A [`Fish`] steers a point through the pond and drags a [`FishBody`]
//! behind it. Steering is a handful of additive nudges to the heading:
//! random turning, repulsion from the pond edge, and the three interaction
//! zones with other fish (repulsion, alignment, attraction). Speed eases
//! toward a base cruising speed plus a decaying boost.

use glam::Vec2;
use koi_body::{FishBody, StripSink};
use koi_types::FishId;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::atlas::{Atlas, AtlasSlot};
use crate::constraint::Constraint;
use crate::error::FishError;
use crate::pond::Inhabitant;

/// Steering and interaction tunables shared by every fish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FishConfig {
    /// Cruising speed in world units per tick (default: 0.035).
    #[serde(default = "default_speed_base")]
    pub speed_base: f32,

    /// Fraction of the gap to the target speed closed each tick (default: 0.1).
    #[serde(default = "default_speed_response")]
    pub speed_response: f32,

    /// Extra speed granted by a boost (default: 0.05).
    #[serde(default = "default_boost_speed")]
    pub boost_speed: f32,

    /// Per-tick multiplier applied to an active boost (default: 0.92).
    #[serde(default = "default_boost_decay")]
    pub boost_decay: f32,

    /// Chance that a repulsion contact boosts one of the two fish (default: 0.25).
    #[serde(default = "default_boost_chance")]
    pub boost_chance: f32,

    /// Per-tick chance of picking a new turn (default: 0.02).
    #[serde(default = "default_turn_chance")]
    pub turn_chance: f32,

    /// Largest turn rate in radians per tick (default: 0.06).
    #[serde(default = "default_turn_force")]
    pub turn_force: f32,

    /// Per-tick multiplier applied to the turn rate (default: 0.96).
    #[serde(default = "default_turn_decay")]
    pub turn_decay: f32,

    /// Distance from the edge at which the pond starts pushing back (default: 1.2).
    #[serde(default = "default_constraint_margin")]
    pub constraint_margin: f32,

    /// Turn rate in radians per tick when right at the edge (default: 0.12).
    #[serde(default = "default_constraint_force")]
    pub constraint_force: f32,

    /// Outer radius of the repulsion zone (default: 0.6).
    #[serde(default = "default_radius_repulsion")]
    pub radius_repulsion: f32,

    /// Outer radius of the alignment zone (default: 1.4).
    #[serde(default = "default_radius_alignment")]
    pub radius_alignment: f32,

    /// Outer radius of the attraction zone (default: 2.4).
    #[serde(default = "default_radius_attraction")]
    pub radius_attraction: f32,

    /// Heading change at zero distance inside the repulsion zone (default: 0.15).
    #[serde(default = "default_force_repulsion")]
    pub force_repulsion: f32,

    /// Weight of the other fish's heading inside the alignment zone (default: 0.03).
    #[serde(default = "default_force_alignment")]
    pub force_alignment: f32,

    /// Pull toward the other fish inside the attraction zone (default: 0.01).
    #[serde(default = "default_force_attraction")]
    pub force_attraction: f32,
}

impl Default for FishConfig {
    fn default() -> Self {
        Self {
            speed_base: default_speed_base(),
            speed_response: default_speed_response(),
            boost_speed: default_boost_speed(),
            boost_decay: default_boost_decay(),
            boost_chance: default_boost_chance(),
            turn_chance: default_turn_chance(),
            turn_force: default_turn_force(),
            turn_decay: default_turn_decay(),
            constraint_margin: default_constraint_margin(),
            constraint_force: default_constraint_force(),
            radius_repulsion: default_radius_repulsion(),
            radius_alignment: default_radius_alignment(),
            radius_attraction: default_radius_attraction(),
            force_repulsion: default_force_repulsion(),
            force_alignment: default_force_alignment(),
            force_attraction: default_force_attraction(),
        }
    }
}

impl FishConfig {
    /// Check ranges and zone ordering.
    pub fn validate(&self) -> Result<(), String> {
        let non_negative = [
            ("speed_base", self.speed_base),
            ("boost_speed", self.boost_speed),
            ("turn_force", self.turn_force),
            ("constraint_margin", self.constraint_margin),
            ("constraint_force", self.constraint_force),
            ("radius_repulsion", self.radius_repulsion),
            ("force_repulsion", self.force_repulsion),
            ("force_alignment", self.force_alignment),
            ("force_attraction", self.force_attraction),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(format!("fish.{name} must be finite and non-negative, got {value}"));
            }
        }
        let unit = [
            ("speed_response", self.speed_response),
            ("boost_decay", self.boost_decay),
            ("boost_chance", self.boost_chance),
            ("turn_chance", self.turn_chance),
            ("turn_decay", self.turn_decay),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("fish.{name} must be within [0, 1], got {value}"));
            }
        }
        if !(self.radius_repulsion <= self.radius_alignment
            && self.radius_alignment <= self.radius_attraction
            && self.radius_attraction.is_finite())
        {
            return Err(format!(
                "fish interaction radii must grow outward, got {} / {} / {}",
                self.radius_repulsion, self.radius_alignment, self.radius_attraction
            ));
        }
        Ok(())
    }
}

const fn default_speed_base() -> f32 {
    0.035
}

const fn default_speed_response() -> f32 {
    0.1
}

const fn default_boost_speed() -> f32 {
    0.05
}

const fn default_boost_decay() -> f32 {
    0.92
}

const fn default_boost_chance() -> f32 {
    0.25
}

const fn default_turn_chance() -> f32 {
    0.02
}

const fn default_turn_force() -> f32 {
    0.06
}

const fn default_turn_decay() -> f32 {
    0.96
}

const fn default_constraint_margin() -> f32 {
    1.2
}

const fn default_constraint_force() -> f32 {
    0.12
}

const fn default_radius_repulsion() -> f32 {
    0.6
}

const fn default_radius_alignment() -> f32 {
    1.4
}

const fn default_radius_attraction() -> f32 {
    2.4
}

const fn default_force_repulsion() -> f32 {
    0.15
}

const fn default_force_alignment() -> f32 {
    0.03
}

const fn default_force_attraction() -> f32 {
    0.01
}

/// One koi living in a pond.
#[derive(Debug)]
pub struct Fish {
    id: FishId,
    body: FishBody,
    slot: AtlasSlot,
    config: FishConfig,
    position: Vec2,
    /// Unit heading.
    direction: Vec2,
    speed: f32,
    boost: f32,
    /// Current turn rate in radians per tick.
    turn: f32,
    age: u32,
    lifetime: u32,
}

impl Fish {
    /// Wrap a freshly built body. The fish starts at the body's head,
    /// at rest, with `lifetime` ticks to live.
    pub fn new(
        body: FishBody,
        slot: AtlasSlot,
        direction: Vec2,
        config: FishConfig,
        lifetime: u32,
    ) -> Self {
        Self {
            id: FishId::new(),
            position: body.head(),
            body,
            slot,
            config,
            direction: direction.try_normalize().unwrap_or(Vec2::X),
            speed: 0.0,
            boost: 0.0,
            turn: 0.0,
            age: 0,
            lifetime,
        }
    }

    /// Unique identifier.
    pub const fn id(&self) -> FishId {
        self.id
    }

    /// Head position.
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Unit heading.
    pub const fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Current speed in world units per tick.
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Remaining boost on top of the cruising speed.
    pub const fn boost(&self) -> f32 {
        self.boost
    }

    /// Ticks lived so far.
    pub const fn age(&self) -> u32 {
        self.age
    }

    /// Ticks this fish lives in total.
    pub const fn lifetime(&self) -> u32 {
        self.lifetime
    }

    /// The deformable body.
    pub const fn body(&self) -> &FishBody {
        &self.body
    }

    /// The atlas slot holding this fish's pattern.
    pub const fn slot(&self) -> &AtlasSlot {
        &self.slot
    }

    /// Advance one tick. Returns `Ok(true)` once the fish has reached the
    /// end of its lifetime.
    pub fn update<R: Rng>(
        &mut self,
        constraint: &Constraint,
        rng: &mut R,
    ) -> Result<bool, FishError> {
        let cfg = self.config;
        self.age = self.age.saturating_add(1);

        if rng.random::<f32>() < cfg.turn_chance {
            self.turn = rng.random_range(-1.0_f32..=1.0) * cfg.turn_force;
        }
        self.direction = Vec2::from_angle(self.turn).rotate(self.direction);
        self.turn *= cfg.turn_decay;

        if let Some(push) = constraint.repel(self.position, cfg.constraint_margin) {
            // Rotate toward the interior, at most `limit` radians.
            let limit = cfg.constraint_force * push.length();
            let angle = self.direction.perp_dot(push).atan2(self.direction.dot(push));
            self.direction = Vec2::from_angle(angle.clamp(-limit, limit)).rotate(self.direction);
        }

        self.speed += (cfg.speed_base + self.boost - self.speed) * cfg.speed_response;
        self.boost *= cfg.boost_decay;
        self.position += self.direction * self.speed;

        if !(self.position.is_finite() && self.direction.is_finite() && self.speed.is_finite()) {
            return Err(FishError::NonFinite {
                fish: self.id,
                stage: "update",
            });
        }

        self.body.update(self.position, self.direction, self.speed);
        Ok(self.age >= self.lifetime)
    }

    /// Let two fish react to each other. Both are affected by one call.
    pub fn interact<R: Rng>(&mut self, other: &mut Self, rng: &mut R) -> Result<(), FishError> {
        let cfg = self.config;
        let offset = other.position - self.position;
        let distance = offset.length();
        if !distance.is_finite() {
            return Err(FishError::NonFinite {
                fish: self.id,
                stage: "interact",
            });
        }
        if distance <= 0.0 || distance >= cfg.radius_attraction {
            return Ok(());
        }

        let toward = offset / distance;
        if distance < cfg.radius_repulsion {
            let strength = cfg.force_repulsion * (1.0 - distance / cfg.radius_repulsion);
            self.steer(-toward * strength);
            other.steer(toward * strength);
            if rng.random::<f32>() < cfg.boost_chance {
                let boosted = if rng.random_bool(0.5) { self } else { other };
                boosted.boost = cfg.boost_speed;
            }
        } else if distance < cfg.radius_alignment {
            let (mine, theirs) = (self.direction, other.direction);
            self.steer(theirs * cfg.force_alignment);
            other.steer(mine * cfg.force_alignment);
        } else {
            self.steer(toward * cfg.force_attraction);
            other.steer(-toward * cfg.force_attraction);
        }
        Ok(())
    }

    /// Draw the body, interpolated by `time` between the last two ticks.
    pub fn render<S: StripSink + ?Sized>(&self, sink: &mut S, time: f32) {
        self.body.render(sink, time);
    }

    /// Consume the fish and give its atlas slot back.
    pub fn free(self, atlas: &mut Atlas) {
        atlas.release(self.slot);
    }

    fn steer(&mut self, force: Vec2) {
        if let Some(direction) = (self.direction + force).try_normalize() {
            self.direction = direction;
        }
    }
}

impl Inhabitant for Fish {
    fn id(&self) -> FishId {
        self.id
    }

    fn interact<R: Rng>(&mut self, other: &mut Self, rng: &mut R) -> Result<(), FishError> {
        Self::interact(self, other, rng)
    }

    fn update<R: Rng>(
        &mut self,
        constraint: &Constraint,
        rng: &mut R,
    ) -> Result<bool, FishError> {
        Self::update(self, constraint, rng)
    }

    fn render<S: StripSink + ?Sized>(&self, sink: &mut S, time: f32) {
        Self::render(self, sink, time);
    }

    fn free(self, atlas: &mut Atlas) {
        Self::free(self, atlas);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use koi_body::{BodyConfig, BodyShape, StripBatch};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::atlas::AtlasConfig;
    use crate::constraint::ConstraintShape;

    fn pond() -> Constraint {
        Constraint::new(ConstraintShape::default(), 0.25).unwrap()
    }

    fn spawn(atlas: &mut Atlas, position: Vec2, direction: Vec2, config: FishConfig) -> Fish {
        let slot = atlas.allocate().unwrap();
        let body = FishBody::new(
            position,
            direction,
            &BodyShape::default(),
            &BodyConfig::default(),
            slot.region(),
        )
        .unwrap();
        Fish::new(body, slot, direction, config, 100)
    }

    fn calm() -> FishConfig {
        FishConfig {
            turn_chance: 0.0,
            boost_chance: 0.0,
            ..FishConfig::default()
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(FishConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_zones() {
        let config = FishConfig {
            radius_alignment: 3.0,
            ..FishConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn accelerates_toward_cruising_speed() {
        let mut atlas = Atlas::new(&AtlasConfig::default()).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let constraint = pond();
        let mut fish = spawn(&mut atlas, Vec2::ZERO, Vec2::X, calm());
        let mut last = fish.speed();
        for _ in 0..30 {
            fish.update(&constraint, &mut rng).unwrap();
            assert!(fish.speed() > last);
            assert!(fish.speed() <= FishConfig::default().speed_base);
            last = fish.speed();
        }
        assert!(fish.position().x > 0.0);
        assert!(fish.position().y.abs() < 1e-5);
    }

    #[test]
    fn reports_death_at_end_of_lifetime() {
        let mut atlas = Atlas::new(&AtlasConfig::default()).unwrap();
        let mut rng = SmallRng::seed_from_u64(2);
        let constraint = pond();
        let mut fish = spawn(&mut atlas, Vec2::ZERO, Vec2::X, calm());
        fish.lifetime = 3;
        assert!(!fish.update(&constraint, &mut rng).unwrap());
        assert!(!fish.update(&constraint, &mut rng).unwrap());
        assert!(fish.update(&constraint, &mut rng).unwrap());
        assert_eq!(fish.age(), 3);
    }

    #[test]
    fn edge_turns_fish_back_inside() {
        let mut atlas = Atlas::new(&AtlasConfig::default()).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        let constraint = pond();
        // Radius 6 pond, heading straight for the rim.
        let mut fish = spawn(&mut atlas, Vec2::new(5.5, 0.0), Vec2::X, calm());
        for _ in 0..2_000 {
            fish.update(&constraint, &mut rng).unwrap();
            assert!(constraint.contains(fish.position()), "{}", fish.position());
        }
        assert!(fish.direction().is_normalized());
    }

    #[test]
    fn repulsion_pushes_both_apart() {
        let mut atlas = Atlas::new(&AtlasConfig::default()).unwrap();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut a = spawn(&mut atlas, Vec2::ZERO, Vec2::Y, calm());
        let mut b = spawn(&mut atlas, Vec2::new(0.3, 0.0), Vec2::Y, calm());
        a.interact(&mut b, &mut rng).unwrap();
        assert!(a.direction().x < 0.0);
        assert!(b.direction().x > 0.0);
    }

    #[test]
    fn alignment_pulls_headings_together() {
        let mut atlas = Atlas::new(&AtlasConfig::default()).unwrap();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut a = spawn(&mut atlas, Vec2::ZERO, Vec2::X, calm());
        let mut b = spawn(&mut atlas, Vec2::new(0.0, 1.0), Vec2::Y, calm());
        let before = a.direction().dot(b.direction());
        a.interact(&mut b, &mut rng).unwrap();
        assert!(a.direction().dot(b.direction()) > before);
    }

    #[test]
    fn attraction_pulls_both_closer() {
        let mut atlas = Atlas::new(&AtlasConfig::default()).unwrap();
        let mut rng = SmallRng::seed_from_u64(6);
        let mut a = spawn(&mut atlas, Vec2::ZERO, Vec2::Y, calm());
        let mut b = spawn(&mut atlas, Vec2::new(2.0, 0.0), Vec2::Y, calm());
        a.interact(&mut b, &mut rng).unwrap();
        assert!(a.direction().x > 0.0);
        assert!(b.direction().x < 0.0);
    }

    #[test]
    fn distant_fish_ignore_each_other() {
        let mut atlas = Atlas::new(&AtlasConfig::default()).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut a = spawn(&mut atlas, Vec2::ZERO, Vec2::Y, calm());
        let mut b = spawn(&mut atlas, Vec2::new(5.0, 0.0), Vec2::X, calm());
        a.interact(&mut b, &mut rng).unwrap();
        assert_eq!(a.direction(), Vec2::Y);
        assert_eq!(b.direction(), Vec2::X);
    }

    #[test]
    fn repulsion_contact_boosts_one_fish() {
        let mut atlas = Atlas::new(&AtlasConfig::default()).unwrap();
        let mut rng = SmallRng::seed_from_u64(8);
        let config = FishConfig {
            boost_chance: 1.0,
            ..calm()
        };
        let mut a = spawn(&mut atlas, Vec2::ZERO, Vec2::Y, config);
        let mut b = spawn(&mut atlas, Vec2::new(0.2, 0.0), Vec2::Y, config);
        a.interact(&mut b, &mut rng).unwrap();
        let boosted = [a.boost(), b.boost()]
            .iter()
            .filter(|boost| **boost > 0.0)
            .count();
        assert_eq!(boosted, 1);
    }

    #[test]
    fn non_finite_state_is_reported() {
        let mut atlas = Atlas::new(&AtlasConfig::default()).unwrap();
        let mut rng = SmallRng::seed_from_u64(9);
        let mut a = spawn(&mut atlas, Vec2::ZERO, Vec2::X, calm());
        let mut b = spawn(&mut atlas, Vec2::ONE, Vec2::X, calm());
        b.position = Vec2::new(f32::NAN, 0.0);
        assert!(matches!(
            a.interact(&mut b, &mut rng),
            Err(FishError::NonFinite { .. })
        ));
        a.speed = f32::INFINITY;
        assert!(a.update(&pond(), &mut rng).is_err());
    }

    #[test]
    fn free_returns_the_slot() {
        let mut atlas = Atlas::new(&AtlasConfig::default()).unwrap();
        let fish = spawn(&mut atlas, Vec2::ZERO, Vec2::X, calm());
        assert_eq!(atlas.available(), atlas.capacity() - 1);
        fish.free(&mut atlas);
        assert_eq!(atlas.available(), atlas.capacity());
    }

    #[test]
    fn render_emits_one_strip() {
        let mut atlas = Atlas::new(&AtlasConfig::default()).unwrap();
        let fish = spawn(&mut atlas, Vec2::ZERO, Vec2::X, calm());
        let mut batch = StripBatch::new();
        fish.render(&mut batch, 0.5);
        assert_eq!(batch.strip_count(), 1);
        assert_eq!(batch.vertices().len(), fish.body().chain().len() * 2 - 1);
    }
}
