//! Arena entities: players, obstacles and power-ups

use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use std::fmt;
use uuid::Uuid;

use crate::ws::protocol::GameEvent;

use super::random::RandomSource;
use super::tuning::GameTuning;
use super::vec2::Vec2;

/// Neon palette for player orbs
pub const PLAYER_COLORS: [&str; 8] = [
    "#4dfcff", "#ff71f8", "#ffe066", "#66ff9c", "#ff6f61", "#8a7dff", "#ffb347", "#4ecdc4",
];

/// Stable player key, assigned in join order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Avatar shapes, handed out round-robin in join order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Avatar {
    Triangle,
    Diamond,
    Square,
    Hex,
    Star,
}

impl Avatar {
    pub const ALL: [Avatar; 5] = [
        Avatar::Triangle,
        Avatar::Diamond,
        Avatar::Square,
        Avatar::Hex,
        Avatar::Star,
    ];

    /// Avatar for the `n`th join
    pub fn for_join(n: usize) -> Self {
        Self::ALL[n % Self::ALL.len()]
    }
}

/// Player lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Waiting,
    Alive,
    Eliminated,
}

/// Remaining seconds for each timed effect (0 = inactive)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effects {
    pub shield: f32,
    pub speed_boost: f32,
    pub slow: f32,
}

/// Authoritative player state
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: &'static str,
    pub avatar: Avatar,

    pub position: Vec2,
    pub velocity: Vec2,
    /// Thrust input, each axis in [-1, 1]
    pub thrust: Vec2,
    pub radius: f32,

    /// May dip below zero between broadcasts
    pub health: f32,
    pub wins: u32,
    pub status: PlayerStatus,
    pub effects: Effects,
}

impl Player {
    pub fn new(
        id: PlayerId,
        name: String,
        color: &'static str,
        avatar: Avatar,
        position: Vec2,
        tuning: &GameTuning,
    ) -> Self {
        Self {
            id,
            name,
            color,
            avatar,
            position,
            velocity: Vec2::ZERO,
            thrust: Vec2::ZERO,
            radius: tuning.player_radius,
            health: tuning.max_health,
            wins: 0,
            status: PlayerStatus::Waiting,
            effects: Effects::default(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == PlayerStatus::Alive
    }

    /// Store a thrust input, clamping each axis into [-1, 1]
    pub fn set_thrust(&mut self, x: f32, y: f32) {
        self.thrust = Vec2::new(clamp_axis(x), clamp_axis(y));
    }

    /// Subtract health and eliminate once it reaches zero.
    /// Returns true if this call eliminated the player.
    pub fn apply_damage(&mut self, amount: f32, events: &mut Vec<GameEvent>) -> bool {
        self.health -= amount;
        if self.health <= 0.0 {
            self.eliminate(events)
        } else {
            false
        }
    }

    /// Transition alive -> eliminated. No-op for any other status.
    pub fn eliminate(&mut self, events: &mut Vec<GameEvent>) -> bool {
        if self.status != PlayerStatus::Alive {
            return false;
        }
        self.status = PlayerStatus::Eliminated;
        self.velocity = Vec2::ZERO;
        self.thrust = Vec2::ZERO;
        events.push(GameEvent::PlayerEliminated { player_id: self.id });
        true
    }
}

fn clamp_axis(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Uniform point inside the arena, kept clear of the edges
pub fn random_spawn_point(rng: &mut dyn RandomSource, tuning: &GameTuning) -> Vec2 {
    let padding = tuning.spawn_padding();
    Vec2::new(
        rng.range(padding, tuning.arena_width - padding),
        rng.range(padding, tuning.arena_height - padding),
    )
}

/// Axis-aligned wall drifting across the arena
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingWall {
    pub id: Uuid,
    /// Center point
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub velocity: Vec2,
}

impl MovingWall {
    pub fn spawn(rng: &mut dyn RandomSource, tuning: &GameTuning) -> Self {
        let width = rng.range(160.0, 260.0);
        let height = rng.range(30.0, 60.0);
        let direction = rng.sign();
        let position = Vec2::new(
            rng.range(width / 2.0 + 80.0, tuning.arena_width - width / 2.0 - 80.0),
            rng.range(height / 2.0 + 80.0, tuning.arena_height - height / 2.0 - 80.0),
        );
        let vx = direction * rng.range(40.0, 80.0);
        let vy = direction * rng.range(40.0, 80.0) * rng.sign();
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            velocity: Vec2::new(vx, vy),
        }
    }
}

/// Rotating beam sweeping around its origin
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Laser {
    pub id: Uuid,
    pub origin: Vec2,
    /// Sweep length from the origin
    pub radius: f32,
    /// Current rotation in radians
    pub angle: f32,
    /// Radians per second
    pub angular_velocity: f32,
    /// Beam width
    pub width: f32,
}

impl Laser {
    pub fn spawn(rng: &mut dyn RandomSource, tuning: &GameTuning) -> Self {
        let radius = rng.range(120.0, 180.0);
        let origin = Vec2::new(
            rng.range(radius + 60.0, tuning.arena_width - radius - 60.0),
            rng.range(radius + 60.0, tuning.arena_height - radius - 60.0),
        );
        Self {
            id: Uuid::new_v4(),
            origin,
            radius,
            angle: rng.range(0.0, TAU),
            angular_velocity: rng.range(-PI / 6.0, PI / 6.0),
            width: rng.range(18.0, 26.0),
        }
    }
}

/// Arena hazard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Obstacle {
    MovingWall(MovingWall),
    Laser(Laser),
}

impl Obstacle {
    /// Spawn a wall or a laser with equal odds
    pub fn spawn(rng: &mut dyn RandomSource, tuning: &GameTuning) -> Self {
        if rng.coin() {
            Obstacle::MovingWall(MovingWall::spawn(rng, tuning))
        } else {
            Obstacle::Laser(Laser::spawn(rng, tuning))
        }
    }
}

/// Power-up kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerUpKind {
    Shield,
    GravityReversal,
    SpeedBoost,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::Shield,
        PowerUpKind::GravityReversal,
        PowerUpKind::SpeedBoost,
    ];

    pub fn color(self) -> &'static str {
        match self {
            PowerUpKind::Shield => "#67d5ff",
            PowerUpKind::GravityReversal => "#ff9bf7",
            PowerUpKind::SpeedBoost => "#ffe761",
        }
    }
}

/// Collectible lying in the arena
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerUp {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
    pub color: &'static str,
    pub radius: f32,
    pub position: Vec2,
    /// Cosmetic pulse phase
    pub pulse: f32,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind, position: Vec2, tuning: &GameTuning) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            color: kind.color(),
            radius: tuning.power_up_radius,
            position,
            pulse: 0.0,
        }
    }

    /// Spawn a power-up of uniformly random kind at a random spawn point
    pub fn spawn(rng: &mut dyn RandomSource, tuning: &GameTuning) -> Self {
        let kind = PowerUpKind::ALL[rng.index(PowerUpKind::ALL.len())];
        let position = random_spawn_point(rng, tuning);
        let mut power_up = Self::new(kind, position, tuning);
        power_up.pulse = rng.range(0.0, TAU);
        power_up
    }
}
