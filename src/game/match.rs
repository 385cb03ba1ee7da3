//! Match driver: the authoritative tick loop and its handle

use rand_chacha::ChaCha8Rng;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::time::{period_for_rate, TickClock};
use crate::ws::protocol::{LobbyEntry, ServerMsg};

use super::entity::PlayerId;
use super::random::RandomSource;
use super::snapshot::SnapshotBuilder;
use super::state::{JoinAck, JoinError, MatchPhase, MatchState};
use super::tuning::GameTuning;

/// Inbound operations, applied at the start of the next tick
#[derive(Debug)]
pub enum MatchCommand {
    Join {
        connection: Uuid,
        name: String,
        reply: oneshot::Sender<Result<JoinAck, JoinError>>,
    },
    Input {
        player_id: PlayerId,
        thrust_x: f32,
        thrust_y: f32,
    },
    Leave {
        player_id: PlayerId,
    },
}

/// Coarse view of the match for health checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSummary {
    pub players: usize,
    pub phase: MatchPhase,
}

/// Handle to the running match
#[derive(Clone)]
pub struct MatchHandle {
    command_tx: mpsc::Sender<MatchCommand>,
    update_tx: broadcast::Sender<ServerMsg>,
    summary_rx: watch::Receiver<MatchSummary>,
}

impl MatchHandle {
    /// Join (or rejoin) the match for a connection
    pub async fn join(&self, connection: Uuid, name: String) -> Result<JoinAck, JoinError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(MatchCommand::Join {
                connection,
                name,
                reply,
            })
            .await
            .map_err(|_| JoinError::MatchClosed)?;
        reply_rx.await.map_err(|_| JoinError::MatchClosed)?
    }

    /// Queue a thrust update; dropped if the queue is full
    pub fn input(&self, player_id: PlayerId, thrust_x: f32, thrust_y: f32) -> bool {
        self.command_tx
            .try_send(MatchCommand::Input {
                player_id,
                thrust_x,
                thrust_y,
            })
            .is_ok()
    }

    pub async fn leave(&self, player_id: PlayerId) {
        if self
            .command_tx
            .send(MatchCommand::Leave { player_id })
            .await
            .is_err()
        {
            debug!(player_id = %player_id, "Match gone before leave");
        }
    }

    /// Lobby and state updates for every connected client
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.update_tx.subscribe()
    }

    pub fn summary(&self) -> MatchSummary {
        *self.summary_rx.borrow()
    }
}

/// The authoritative game match
pub struct GameMatch<R: RandomSource = ChaCha8Rng> {
    state: MatchState<R>,
    command_rx: mpsc::Receiver<MatchCommand>,
    update_tx: broadcast::Sender<ServerMsg>,
    summary_tx: watch::Sender<MatchSummary>,
    snapshot_builder: SnapshotBuilder,
    last_lobby: Vec<LobbyEntry>,
}

impl<R: RandomSource> GameMatch<R> {
    /// Create a new match
    pub fn new(tuning: GameTuning, rng: R) -> (Self, MatchHandle) {
        let (command_tx, command_rx) = mpsc::channel(1024);
        let (update_tx, _) = broadcast::channel(64);
        let snapshot_builder = SnapshotBuilder::new(tuning.broadcast_interval());
        let state = MatchState::new(tuning, rng);
        let (summary_tx, summary_rx) = watch::channel(MatchSummary {
            players: 0,
            phase: state.phase(),
        });

        let handle = MatchHandle {
            command_tx,
            update_tx: update_tx.clone(),
            summary_rx,
        };

        let game_match = Self {
            state,
            command_rx,
            update_tx,
            summary_tx,
            snapshot_builder,
            last_lobby: Vec::new(),
        };

        (game_match, handle)
    }

    /// Run the tick loop until every handle is dropped
    pub async fn run(mut self) {
        info!(
            tick_rate = self.state.tuning().tick_rate,
            broadcast_rate = self.state.tuning().broadcast_rate,
            "Match loop started"
        );

        let mut tick_interval = interval(period_for_rate(self.state.tuning().tick_rate));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut clock = TickClock::new();

        loop {
            tick_interval.tick().await;

            if !self.drain_commands() {
                break;
            }
            self.step(clock.delta());
        }

        info!("Match loop stopped");
    }

    /// Apply queued commands. Returns false once all senders are gone.
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(command) => self.apply(command),
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, command: MatchCommand) {
        match command {
            MatchCommand::Join {
                connection,
                name,
                reply,
            } => {
                let result = self.state.join(connection, &name);
                if let Err(e) = &result {
                    warn!(connection = %connection, error = %e, "Join rejected");
                }
                if reply.send(result).is_err() {
                    debug!(connection = %connection, "Join requester went away");
                }
            }
            MatchCommand::Input {
                player_id,
                thrust_x,
                thrust_y,
            } => self.state.handle_input(player_id, thrust_x, thrust_y),
            MatchCommand::Leave { player_id } => {
                self.state.leave(player_id);
            }
        }
    }

    /// One tick: advance the simulation, then publish whatever is due
    fn step(&mut self, dt: f32) {
        if self.state.tick(dt) && self.snapshot_builder.should_send(dt) {
            let snapshot = self.snapshot_builder.build(&mut self.state);
            // No receivers is fine; clients come and go
            let _ = self.update_tx.send(snapshot);
        }
        self.publish_lobby();

        let summary = MatchSummary {
            players: self.state.player_count(),
            phase: self.state.phase(),
        };
        self.summary_tx.send_if_modified(|current| {
            let changed = *current != summary;
            *current = summary;
            changed
        });
    }

    /// Emit a lobby update when membership, wins or status changed
    fn publish_lobby(&mut self) {
        let lobby = self.state.lobby();
        if lobby != self.last_lobby {
            let _ = self.update_tx.send(ServerMsg::LobbyUpdate {
                players: lobby.clone(),
            });
            self.last_lobby = lobby;
        }
    }
}
