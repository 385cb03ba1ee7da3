//! Global gravity field with periodic reshuffles and temporary reversal

use std::f32::consts::FRAC_1_SQRT_2;

use crate::ws::protocol::GameEvent;

use super::effects::IntervalTimer;
use super::entity::PlayerId;
use super::random::RandomSource;
use super::tuning::GameTuning;
use super::vec2::Vec2;

/// The 8 canonical unit directions
pub const GRAVITY_DIRECTIONS: [Vec2; 8] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(0.0, -1.0),
    Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    Vec2::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    Vec2::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
];

#[derive(Debug, Clone)]
pub struct GravityField {
    pub vector: Vec2,
    hold: IntervalTimer,
    /// Seconds left on an active reversal (0 = none)
    reversal_remaining: f32,
}

impl GravityField {
    pub fn new(rng: &mut dyn RandomSource, tuning: &GameTuning) -> Self {
        Self {
            vector: Self::random_vector(rng, tuning),
            hold: IntervalTimer::new(rng, tuning.gravity_min_duration, tuning.gravity_max_duration),
            reversal_remaining: 0.0,
        }
    }

    fn random_vector(rng: &mut dyn RandomSource, tuning: &GameTuning) -> Vec2 {
        GRAVITY_DIRECTIONS[rng.index(GRAVITY_DIRECTIONS.len())] * tuning.gravity_strength
    }

    /// New direction, new hold time, reversal cancelled
    pub fn reset(&mut self, rng: &mut dyn RandomSource, tuning: &GameTuning) {
        self.vector = Self::random_vector(rng, tuning);
        self.hold.reset(rng);
        self.reversal_remaining = 0.0;
    }

    /// Seconds until the next reshuffle
    pub fn hold_remaining(&self) -> f32 {
        self.hold.remaining()
    }

    pub fn is_reversed(&self) -> bool {
        self.reversal_remaining > 0.0
    }

    /// Negate the field now and arm the revert countdown
    pub fn flip(&mut self, player_id: PlayerId, tuning: &GameTuning, events: &mut Vec<GameEvent>) {
        self.vector = -self.vector;
        self.reversal_remaining = tuning.gravity_reversal_duration;
        events.push(GameEvent::GravityFlip { player_id });
    }

    /// Advance the reshuffle and reversal countdowns
    pub fn advance(
        &mut self,
        dt: f32,
        rng: &mut dyn RandomSource,
        tuning: &GameTuning,
        events: &mut Vec<GameEvent>,
    ) {
        if self.hold.advance(dt, rng) {
            self.vector = Self::random_vector(rng, tuning);
            events.push(GameEvent::GravityChange {
                gravity: self.vector,
            });
        }

        if self.is_reversed() {
            self.reversal_remaining -= dt;
            if self.reversal_remaining <= 0.0 {
                self.reversal_remaining = 0.0;
                self.vector = -self.vector;
                events.push(GameEvent::GravityRevert {
                    gravity: self.vector,
                });
            }
        }
    }
}
