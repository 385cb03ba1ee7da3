//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

use crate::game::entity::{Avatar, Effects, Obstacle, PlayerId, PlayerStatus, PowerUp, PowerUpKind};
use crate::game::state::MatchPhase;
use crate::game::vec2::Vec2;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMsg {
    /// Thruster input, each axis expected in [-1, 1]
    Input {
        #[serde(default)]
        thrust_x: f32,
        #[serde(default)]
        thrust_y: f32,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    /// Sent once to the joining connection
    Joined {
        player_id: PlayerId,
        color: &'static str,
        avatar: Avatar,
        arena: ArenaSize,
    },

    /// Membership, wins or status changed
    LobbyUpdate { players: Vec<LobbyEntry> },

    /// Full simulation snapshot (sent at the broadcast rate)
    StateUpdate {
        state: MatchPhase,
        countdown: f32,
        round_over_timer: f32,
        gravity: Vec2,
        gravity_timer: f32,
        arena: ArenaSize,
        players: Vec<PlayerSnapshot>,
        obstacles: Vec<Obstacle>,
        power_ups: Vec<PowerUp>,
        /// Events that occurred since the last snapshot
        events: Vec<GameEvent>,
    },

    /// Connection rejected
    Error { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaSize {
    pub width: f32,
    pub height: f32,
}

/// Player row in the lobby list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LobbyEntry {
    pub id: PlayerId,
    pub name: String,
    pub color: &'static str,
    pub avatar: Avatar,
    pub wins: u32,
    pub status: PlayerStatus,
}

/// Player state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub color: &'static str,
    pub avatar: Avatar,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    /// Always within [0, 100]
    pub health: f32,
    pub wins: u32,
    pub status: PlayerStatus,
    pub effects: Effects,
}

/// Descriptive game events, used by clients for cosmetic and audio cues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum GameEvent {
    Collision {
        players: [PlayerId; 2],
        magnitude: f32,
    },
    ObstacleHit {
        player_id: PlayerId,
    },
    PowerUp {
        player_id: PlayerId,
        power: PowerUpKind,
    },
    PlayerEliminated {
        player_id: PlayerId,
    },
    RoundWin {
        player_id: PlayerId,
        wins: u32,
    },
    RoundStart,
    CountdownStart {
        duration: f32,
    },
    GravityChange {
        gravity: Vec2,
    },
    GravityFlip {
        player_id: PlayerId,
    },
    GravityRevert {
        gravity: Vec2,
    },
}
