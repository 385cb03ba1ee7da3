//! Simulation tuning values
//!
//! Production values live in `Default`. Tests override individual fields with
//! struct-update syntax to get accelerated or deterministic rounds.

/// Every tunable constant the simulation reads
#[derive(Debug, Clone, PartialEq)]
pub struct GameTuning {
    /// Arena width in world units
    pub arena_width: f32,
    /// Arena height in world units
    pub arena_height: f32,

    /// Player hitbox radius
    pub player_radius: f32,
    /// Thrust acceleration scale (also normalizes gravity)
    pub player_base_speed: f32,
    /// Speed cap before effect multipliers
    pub player_max_speed: f32,
    /// Per-tick velocity damping factor
    pub player_friction: f32,
    /// Health at round start
    pub max_health: f32,

    /// Player collision damage at an impulse equal to `player_max_speed`
    pub player_collision_damage: f32,
    /// Damage per obstacle hit
    pub obstacle_hit_damage: f32,
    /// Damage per axis per tick while pressed against the arena edge
    pub wall_damage: f32,
    /// Velocity kept when bouncing off the arena edge
    pub wall_restitution: f32,

    /// Slow effect applied by obstacles (seconds)
    pub slow_duration: f32,
    /// Shield power-up duration (seconds)
    pub shield_duration: f32,
    /// Speed boost power-up duration (seconds)
    pub speed_boost_duration: f32,
    /// Gravity reversal power-up duration (seconds)
    pub gravity_reversal_duration: f32,
    /// Speed multiplier bonus while boosted
    pub speed_boost_bonus: f32,
    /// Speed multiplier penalty while slowed
    pub slow_penalty: f32,
    /// Lower bound of the combined speed multiplier
    pub min_speed_multiplier: f32,
    /// Upper bound of the combined speed multiplier
    pub max_speed_multiplier: f32,

    /// Magnitude of the gravity vector
    pub gravity_strength: f32,
    /// Gentle drift factor applied on top of gravity
    pub gravity_drift_factor: f32,
    /// Shortest gravity hold (seconds)
    pub gravity_min_duration: f32,
    /// Longest gravity hold (seconds)
    pub gravity_max_duration: f32,

    /// Power-up pickup radius
    pub power_up_radius: f32,
    /// Fraction of the power-up radius that counts for pickup
    pub power_up_pickup_factor: f32,
    /// Shortest power-up spawn interval (seconds)
    pub power_up_min_interval: f32,
    /// Longest power-up spawn interval (seconds)
    pub power_up_max_interval: f32,

    /// Shortest obstacle spawn interval (seconds)
    pub obstacle_min_interval: f32,
    /// Longest obstacle spawn interval (seconds)
    pub obstacle_max_interval: f32,

    /// Countdown before a round (seconds)
    pub countdown_duration: f32,
    /// Pause after a round (seconds)
    pub round_over_duration: f32,
    /// Players needed to start a countdown
    pub min_players: usize,

    /// Simulation ticks per second
    pub tick_rate: f32,
    /// Snapshots per second
    pub broadcast_rate: f32,
}

impl GameTuning {
    /// Margin kept between spawn points and the arena edge
    pub fn spawn_padding(&self) -> f32 {
        self.player_radius * 2.0 + 20.0
    }

    /// Seconds between snapshots
    pub fn broadcast_interval(&self) -> f32 {
        1.0 / self.broadcast_rate
    }
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            arena_width: 1400.0,
            arena_height: 800.0,

            player_radius: 22.0,
            player_base_speed: 420.0,
            player_max_speed: 440.0,
            player_friction: 0.92,
            max_health: 100.0,

            player_collision_damage: 18.0,
            obstacle_hit_damage: 30.0 * 0.6,
            wall_damage: 12.0 * 0.2,
            wall_restitution: 0.65,

            slow_duration: 2.4,
            shield_duration: 5.0,
            speed_boost_duration: 5.0,
            gravity_reversal_duration: 3.0,
            speed_boost_bonus: 0.6,
            slow_penalty: 0.55,
            min_speed_multiplier: 0.2,
            max_speed_multiplier: 2.2,

            gravity_strength: 180.0,
            gravity_drift_factor: 0.2,
            gravity_min_duration: 5.0,
            gravity_max_duration: 10.0,

            power_up_radius: 26.0,
            power_up_pickup_factor: 0.6,
            power_up_min_interval: 6.0,
            power_up_max_interval: 11.0,

            obstacle_min_interval: 8.0,
            obstacle_max_interval: 14.0,

            countdown_duration: 3.0,
            round_over_duration: 5.0,
            min_players: 2,

            tick_rate: 60.0,
            broadcast_rate: 20.0,
        }
    }
}
