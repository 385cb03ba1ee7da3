//! Snapshot building at the broadcast rate

use crate::ws::protocol::{PlayerSnapshot, ServerMsg};

use super::entity::Player;
use super::random::RandomSource;
use super::state::MatchState;

/// Decides when a snapshot is due and serializes match state into one
pub struct SnapshotBuilder {
    /// Seconds accumulated since the last snapshot
    accumulator: f32,
    /// Seconds between snapshots
    interval: f32,
}

impl SnapshotBuilder {
    pub fn new(interval: f32) -> Self {
        Self {
            accumulator: 0.0,
            interval,
        }
    }

    /// Accumulate a tick's `dt`; true when a snapshot is due
    pub fn should_send(&mut self, dt: f32) -> bool {
        self.accumulator += dt;
        if self.accumulator >= self.interval {
            self.accumulator = 0.0;
            true
        } else {
            false
        }
    }

    /// Serialize the match and drain its event log
    pub fn build<R: RandomSource>(&self, state: &mut MatchState<R>) -> ServerMsg {
        let events = state.take_events();
        let max_health = state.tuning().max_health;

        ServerMsg::StateUpdate {
            state: state.phase(),
            countdown: state.countdown_remaining().max(0.0),
            round_over_timer: state.round_over_remaining().max(0.0),
            gravity: state.gravity().vector,
            gravity_timer: state.gravity().hold_remaining().max(0.0),
            arena: state.arena(),
            players: state
                .players()
                .map(|p| player_snapshot(p, max_health))
                .collect(),
            obstacles: state.obstacles().to_vec(),
            power_ups: state.power_ups().to_vec(),
            events,
        }
    }
}

/// Public view of a player; health is clamped only here
fn player_snapshot(player: &Player, max_health: f32) -> PlayerSnapshot {
    PlayerSnapshot {
        id: player.id,
        name: player.name.clone(),
        color: player.color,
        avatar: player.avatar,
        position: player.position,
        velocity: player.velocity,
        radius: player.radius,
        health: player.health.clamp(0.0, max_health),
        wins: player.wins,
        status: player.status,
        effects: player.effects,
    }
}
