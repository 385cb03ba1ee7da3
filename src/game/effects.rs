//! Timed effects, power-up pickups and spawn scheduling

use crate::ws::protocol::GameEvent;

use super::entity::{Effects, Player, PowerUp, PowerUpKind};
use super::gravity::GravityField;
use super::random::RandomSource;
use super::tuning::GameTuning;

impl Effects {
    /// Decay every active timer by `dt`, flooring at zero
    pub fn tick(&mut self, dt: f32) {
        for timer in [&mut self.shield, &mut self.speed_boost, &mut self.slow] {
            if *timer > 0.0 {
                *timer = (*timer - dt).max(0.0);
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Effects::default();
    }

    pub fn is_shielded(&self) -> bool {
        self.shield > 0.0
    }

    /// Slow never stacks: keep whichever remaining duration is longer
    pub fn apply_slow(&mut self, duration: f32) {
        self.slow = self.slow.max(duration);
    }

    /// Multiplier on the base max speed, bounded by the tuning limits
    pub fn speed_multiplier(&self, tuning: &GameTuning) -> f32 {
        let mut multiplier = 1.0;
        if self.speed_boost > 0.0 {
            multiplier += tuning.speed_boost_bonus;
        }
        if self.slow > 0.0 {
            multiplier -= tuning.slow_penalty;
        }
        multiplier.clamp(tuning.min_speed_multiplier, tuning.max_speed_multiplier)
    }
}

/// Countdown that fires once per expiry and redraws its next interval
/// uniformly from `[min, max)`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTimer {
    remaining: f32,
    min: f32,
    max: f32,
}

impl IntervalTimer {
    pub fn new(rng: &mut dyn RandomSource, min: f32, max: f32) -> Self {
        Self {
            remaining: rng.range(min, max),
            min,
            max,
        }
    }

    /// Seconds until the next expiry
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Draw a fresh interval
    pub fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.remaining = rng.range(self.min, self.max);
    }

    /// Advance by `dt`; returns true (and redraws) when the timer expires
    pub fn advance(&mut self, dt: f32, rng: &mut dyn RandomSource) -> bool {
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.reset(rng);
            true
        } else {
            false
        }
    }
}

/// Power-up pickup and application
pub struct EffectSystem;

impl EffectSystem {
    /// Advance pulses, then let every alive player collect overlapping power-ups
    pub fn collect_power_ups<'a>(
        players: impl Iterator<Item = &'a mut Player>,
        power_ups: &mut Vec<PowerUp>,
        gravity: &mut GravityField,
        tuning: &GameTuning,
        dt: f32,
        events: &mut Vec<GameEvent>,
    ) {
        for power_up in power_ups.iter_mut() {
            power_up.pulse += dt;
        }

        for player in players {
            if !player.is_alive() {
                continue;
            }
            let mut i = power_ups.len();
            while i > 0 {
                i -= 1;
                let reach = player.radius + power_ups[i].radius * tuning.power_up_pickup_factor;
                let dist_sq = (player.position - power_ups[i].position).length_squared();
                if dist_sq < reach * reach {
                    let power_up = power_ups.remove(i);
                    Self::apply_power_up(player, power_up.kind, gravity, tuning, events);
                }
            }
        }
    }

    /// Latch a power-up's effect onto the player or the arena
    pub fn apply_power_up(
        player: &mut Player,
        kind: PowerUpKind,
        gravity: &mut GravityField,
        tuning: &GameTuning,
        events: &mut Vec<GameEvent>,
    ) {
        match kind {
            PowerUpKind::Shield => player.effects.shield = tuning.shield_duration,
            PowerUpKind::GravityReversal => gravity.flip(player.id, tuning, events),
            PowerUpKind::SpeedBoost => player.effects.speed_boost = tuning.speed_boost_duration,
        }
        events.push(GameEvent::PowerUp {
            player_id: player.id,
            power: kind,
        });
    }
}
