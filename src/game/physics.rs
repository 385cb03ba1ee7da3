//! Player movement integration and arena containment

use crate::ws::protocol::GameEvent;

use super::entity::Player;
use super::tuning::GameTuning;
use super::vec2::Vec2;

/// Physics system for updating player velocities and positions
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Run one integration step for an alive player.
    ///
    /// Stage order matters: each stage consumes the previous one's output.
    pub fn step_player(
        player: &mut Player,
        gravity: Vec2,
        tuning: &GameTuning,
        dt: f32,
        events: &mut Vec<GameEvent>,
    ) {
        if !player.is_alive() {
            return;
        }
        player.effects.tick(dt);
        Self::apply_gravity(player, gravity, tuning, dt);
        Self::apply_thrust(player, tuning, dt);
        Self::apply_friction(player, tuning);
        Self::apply_speed_limit(player, tuning);
        player.position += player.velocity * dt;
        Self::resolve_boundary(player, tuning, events);
    }

    /// Gentle constant drift along the global gravity vector
    pub fn apply_gravity(player: &mut Player, gravity: Vec2, tuning: &GameTuning, dt: f32) {
        let scale = dt * tuning.gravity_strength * tuning.gravity_drift_factor / tuning.player_base_speed;
        player.velocity += gravity * scale;
    }

    pub fn apply_thrust(player: &mut Player, tuning: &GameTuning, dt: f32) {
        player.velocity += player.thrust * (tuning.player_base_speed * dt);
    }

    /// Exponential per-tick damping
    pub fn apply_friction(player: &mut Player, tuning: &GameTuning) {
        player.velocity *= tuning.player_friction;
    }

    pub fn max_speed(player: &Player, tuning: &GameTuning) -> f32 {
        tuning.player_max_speed * player.effects.speed_multiplier(tuning)
    }

    pub fn apply_speed_limit(player: &mut Player, tuning: &GameTuning) {
        let max_speed = Self::max_speed(player, tuning);
        player.velocity = player.velocity.clamp_length(max_speed);
    }

    /// Clamp into the arena, bounce inward and chip health.
    ///
    /// Each axis is handled on its own, so a corner hit costs wall damage twice.
    pub fn resolve_boundary(player: &mut Player, tuning: &GameTuning, events: &mut Vec<GameEvent>) {
        let r = player.radius;
        let restitution = tuning.wall_restitution;

        let hit_x = if player.position.x < r {
            player.position.x = r;
            player.velocity.x = player.velocity.x.abs() * restitution;
            true
        } else if player.position.x > tuning.arena_width - r {
            player.position.x = tuning.arena_width - r;
            player.velocity.x = -player.velocity.x.abs() * restitution;
            true
        } else {
            false
        };
        if hit_x {
            player.apply_damage(tuning.wall_damage, events);
        }

        let hit_y = if player.position.y < r {
            player.position.y = r;
            player.velocity.y = player.velocity.y.abs() * restitution;
            true
        } else if player.position.y > tuning.arena_height - r {
            player.position.y = tuning.arena_height - r;
            player.velocity.y = -player.velocity.y.abs() * restitution;
            true
        } else {
            false
        };
        if hit_y {
            player.apply_damage(tuning.wall_damage, events);
        }
    }
}
