//! Match state: the single owned aggregate and its phase machine

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};
use uuid::Uuid;

use crate::ws::protocol::{ArenaSize, GameEvent, LobbyEntry};

use super::collision::CollisionSystem;
use super::effects::{EffectSystem, IntervalTimer};
use super::entity::{
    random_spawn_point, Avatar, Obstacle, Player, PlayerId, PlayerStatus, PowerUp, PLAYER_COLORS,
};
use super::gravity::GravityField;
use super::physics::PhysicsSystem;
use super::random::RandomSource;
use super::tuning::GameTuning;
use super::vec2::Vec2;

/// Longest accepted display name, in characters
pub const MAX_NAME_CHARS: usize = 24;

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Fewer than the minimum players
    Waiting,
    /// Countdown before a round
    Countdown,
    /// Round in progress
    Playing,
    /// Pause after a round
    RoundOver,
}

/// Join rejections
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("Name is required to join.")]
    EmptyName,

    #[error("The match is not running.")]
    MatchClosed,
}

/// Reply to a successful join
#[derive(Debug, Clone, PartialEq)]
pub struct JoinAck {
    pub player_id: PlayerId,
    pub color: &'static str,
    pub avatar: Avatar,
    pub arena: ArenaSize,
}

/// Authoritative match state (owned by the match task)
pub struct MatchState<R: RandomSource = ChaCha8Rng> {
    tuning: GameTuning,
    rng: R,

    phase: MatchPhase,
    countdown_remaining: f32,
    round_over_remaining: f32,

    /// Keyed by join order, so iteration is deterministic
    players: BTreeMap<PlayerId, Player>,
    connections: HashMap<Uuid, PlayerId>,
    next_player_id: u64,
    avatar_cursor: usize,

    obstacles: Vec<Obstacle>,
    power_ups: Vec<PowerUp>,
    gravity: GravityField,
    obstacle_timer: IntervalTimer,
    power_up_timer: IntervalTimer,

    /// Cleared after every snapshot
    events: Vec<GameEvent>,
}

impl<R: RandomSource> MatchState<R> {
    pub fn new(tuning: GameTuning, mut rng: R) -> Self {
        let gravity = GravityField::new(&mut rng, &tuning);
        let obstacle_timer = IntervalTimer::new(
            &mut rng,
            tuning.obstacle_min_interval,
            tuning.obstacle_max_interval,
        );
        let power_up_timer = IntervalTimer::new(
            &mut rng,
            tuning.power_up_min_interval,
            tuning.power_up_max_interval,
        );

        Self {
            tuning,
            rng,
            phase: MatchPhase::Waiting,
            countdown_remaining: 0.0,
            round_over_remaining: 0.0,
            players: BTreeMap::new(),
            connections: HashMap::new(),
            next_player_id: 1,
            avatar_cursor: 0,
            obstacles: Vec::new(),
            power_ups: Vec::new(),
            gravity,
            obstacle_timer,
            power_up_timer,
            events: Vec::new(),
        }
    }

    pub fn tuning(&self) -> &GameTuning {
        &self.tuning
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn countdown_remaining(&self) -> f32 {
        self.countdown_remaining
    }

    pub fn round_over_remaining(&self) -> f32 {
        self.round_over_remaining
    }

    pub fn arena(&self) -> ArenaSize {
        ArenaSize {
            width: self.tuning.arena_width,
            height: self.tuning.arena_height,
        }
    }

    pub fn gravity(&self) -> &GravityField {
        &self.gravity
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn power_ups(&self) -> &[PowerUp] {
        &self.power_ups
    }

    /// Hand over the event log accumulated since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.is_alive()).count()
    }

    /// Lobby rows in join order
    pub fn lobby(&self) -> Vec<LobbyEntry> {
        self.players
            .values()
            .map(|p| LobbyEntry {
                id: p.id,
                name: p.name.clone(),
                color: p.color,
                avatar: p.avatar,
                wins: p.wins,
                status: p.status,
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Inbound operations
    // ------------------------------------------------------------------

    /// Add a player for `connection`, or return the one it already owns
    pub fn join(&mut self, connection: Uuid, name: &str) -> Result<JoinAck, JoinError> {
        if let Some(existing) = self
            .connections
            .get(&connection)
            .and_then(|id| self.players.get(id))
        {
            return Ok(self.ack_for(existing));
        }

        let name: String = name.trim().chars().take(MAX_NAME_CHARS).collect();
        let name = name.trim_end().to_string();
        if name.is_empty() {
            return Err(JoinError::EmptyName);
        }

        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        let color = PLAYER_COLORS[self.rng.index(PLAYER_COLORS.len())];
        let avatar = Avatar::for_join(self.avatar_cursor);
        self.avatar_cursor += 1;
        let position = random_spawn_point(&mut self.rng, &self.tuning);

        let player = Player::new(id, name, color, avatar, position, &self.tuning);
        let ack = self.ack_for(&player);
        info!(player_id = %id, name = %player.name, avatar = ?avatar, "Player joined");
        self.players.insert(id, player);
        self.connections.insert(connection, id);

        if self.should_start_countdown() {
            self.begin_countdown();
        }
        Ok(ack)
    }

    fn ack_for(&self, player: &Player) -> JoinAck {
        JoinAck {
            player_id: player.id,
            color: player.color,
            avatar: player.avatar,
            arena: self.arena(),
        }
    }

    /// Store thrust input; ignored unless the player is alive
    pub fn handle_input(&mut self, id: PlayerId, thrust_x: f32, thrust_y: f32) {
        if let Some(player) = self.players.get_mut(&id) {
            if player.is_alive() {
                player.set_thrust(thrust_x, thrust_y);
            }
        }
    }

    /// Remove a player and re-evaluate the round. Unknown ids are a no-op.
    pub fn leave(&mut self, id: PlayerId) -> bool {
        let Some(player) = self.players.remove(&id) else {
            return false;
        };
        self.connections.retain(|_, pid| *pid != id);
        info!(player_id = %id, name = %player.name, phase = ?self.phase, alive = self.alive_count(), "Player left");

        // Nobody is alive during a countdown, so a leave there ends the round
        if matches!(self.phase, MatchPhase::Countdown | MatchPhase::Playing) {
            self.check_round_end();
        }

        if self.players.len() < self.tuning.min_players && self.phase != MatchPhase::Waiting {
            debug!(players = self.players.len(), "Not enough players, back to waiting");
            self.phase = MatchPhase::Waiting;
            self.countdown_remaining = 0.0;
            self.round_over_remaining = 0.0;
            for player in self.players.values_mut() {
                if player.is_alive() {
                    player.status = PlayerStatus::Waiting;
                }
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Phase machine
    // ------------------------------------------------------------------

    fn should_start_countdown(&self) -> bool {
        matches!(self.phase, MatchPhase::Waiting | MatchPhase::RoundOver)
            && self.players.len() >= self.tuning.min_players
    }

    fn begin_countdown(&mut self) {
        self.phase = MatchPhase::Countdown;
        self.countdown_remaining = self.tuning.countdown_duration;
        for player in self.players.values_mut() {
            player.status = PlayerStatus::Waiting;
            player.effects.clear();
            player.velocity = Vec2::ZERO;
        }
        self.events.push(GameEvent::CountdownStart {
            duration: self.tuning.countdown_duration,
        });
        info!(players = self.players.len(), "Countdown started");
    }

    fn start_round(&mut self) {
        self.phase = MatchPhase::Playing;
        self.countdown_remaining = 0.0;
        self.obstacles.clear();
        self.power_ups.clear();
        self.gravity.reset(&mut self.rng, &self.tuning);
        self.obstacle_timer.reset(&mut self.rng);
        self.power_up_timer.reset(&mut self.rng);

        for player in self.players.values_mut() {
            player.position = random_spawn_point(&mut self.rng, &self.tuning);
            player.velocity = Vec2::ZERO;
            player.thrust = Vec2::ZERO;
            player.health = self.tuning.max_health;
            player.status = PlayerStatus::Alive;
            player.effects.clear();
        }

        self.events.push(GameEvent::RoundStart);
        info!(players = self.players.len(), "Round started");
    }

    fn end_round(&mut self, winner: Option<PlayerId>) {
        self.phase = MatchPhase::RoundOver;
        self.countdown_remaining = 0.0;
        self.round_over_remaining = self.tuning.round_over_duration;

        if let Some(player) = winner.and_then(|id| self.players.get_mut(&id)) {
            player.wins += 1;
            self.events.push(GameEvent::RoundWin {
                player_id: player.id,
                wins: player.wins,
            });
            info!(player_id = %player.id, wins = player.wins, "Round won");
        } else {
            info!("Round ended without a winner");
        }

        for player in self.players.values_mut() {
            if player.is_alive() {
                player.status = PlayerStatus::Waiting;
            }
        }
    }

    /// End the round once at most one player is left alive
    fn check_round_end(&mut self) {
        let mut alive = self.players.values().filter(|p| p.is_alive());
        let first = alive.next().map(|p| p.id);
        if alive.next().is_none() {
            self.end_round(first);
        }
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds.
    ///
    /// Returns false (and leaves state untouched) for non-positive or
    /// non-finite deltas.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !dt.is_finite() || dt <= 0.0 {
            return false;
        }

        match self.phase {
            MatchPhase::Countdown => {
                self.countdown_remaining -= dt;
                if self.countdown_remaining <= 0.0 {
                    self.start_round();
                }
            }
            MatchPhase::RoundOver => {
                self.round_over_remaining -= dt;
                if self.round_over_remaining <= 0.0 {
                    self.round_over_remaining = 0.0;
                    if self.should_start_countdown() {
                        self.begin_countdown();
                    } else {
                        self.phase = MatchPhase::Waiting;
                    }
                }
            }
            MatchPhase::Waiting | MatchPhase::Playing => {}
        }

        if self.phase == MatchPhase::Playing {
            self.step_playing(dt);
        }
        true
    }

    fn step_playing(&mut self, dt: f32) {
        let tuning = &self.tuning;
        let events = &mut self.events;

        self.gravity.advance(dt, &mut self.rng, tuning, events);

        if self.obstacle_timer.advance(dt, &mut self.rng) {
            let obstacle = Obstacle::spawn(&mut self.rng, tuning);
            debug!(obstacle = ?obstacle, "Obstacle spawned");
            self.obstacles.push(obstacle);
        }

        let gravity = self.gravity.vector;
        for player in self.players.values_mut() {
            PhysicsSystem::step_player(player, gravity, tuning, dt, events);
        }

        let mut alive: Vec<&mut Player> = self
            .players
            .values_mut()
            .filter(|p| p.is_alive())
            .collect();
        CollisionSystem::resolve_players(&mut alive, tuning, events);
        CollisionSystem::resolve_obstacles(&mut self.obstacles, &mut alive, tuning, dt, events);
        drop(alive);

        EffectSystem::collect_power_ups(
            self.players.values_mut(),
            &mut self.power_ups,
            &mut self.gravity,
            tuning,
            dt,
            events,
        );

        if self.power_up_timer.advance(dt, &mut self.rng) {
            let power_up = PowerUp::spawn(&mut self.rng, tuning);
            debug!(kind = ?power_up.kind, "Power-up spawned");
            self.power_ups.push(power_up);
        }

        self.check_round_end();
    }
}

#[cfg(test)]
impl<R: RandomSource> MatchState<R> {
    pub(crate) fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub(crate) fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub(crate) fn power_ups_mut(&mut self) -> &mut Vec<PowerUp> {
        &mut self.power_ups
    }

    pub(crate) fn obstacles_mut(&mut self) -> &mut Vec<Obstacle> {
        &mut self.obstacles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::{MovingWall, PowerUpKind};
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    /// Long spawn intervals so nothing appears unless a test asks for it
    fn quiet_tuning() -> GameTuning {
        GameTuning {
            obstacle_min_interval: 1_000.0,
            obstacle_max_interval: 1_001.0,
            power_up_min_interval: 1_000.0,
            power_up_max_interval: 1_001.0,
            gravity_min_duration: 1_000.0,
            gravity_max_duration: 1_001.0,
            ..GameTuning::default()
        }
    }

    fn new_state(tuning: GameTuning) -> MatchState<ChaCha8Rng> {
        MatchState::new(tuning, ChaCha8Rng::seed_from_u64(1234))
    }

    fn join(state: &mut MatchState<ChaCha8Rng>, name: &str) -> PlayerId {
        state.join(Uuid::new_v4(), name).unwrap().player_id
    }

    fn run_for(state: &mut MatchState<ChaCha8Rng>, seconds: f32) {
        let ticks = (seconds / DT).ceil() as usize;
        for _ in 0..ticks {
            state.tick(DT);
        }
    }

    /// Two players past the countdown, parked far apart with no gravity
    fn playing_pair() -> (MatchState<ChaCha8Rng>, PlayerId, PlayerId) {
        let mut state = new_state(GameTuning {
            gravity_strength: 0.0,
            ..quiet_tuning()
        });
        let a = join(&mut state, "ada");
        let b = join(&mut state, "bo");
        let countdown = state.tuning().countdown_duration;
        run_for(&mut state, countdown + DT);
        assert_eq!(state.phase(), MatchPhase::Playing);
        state.player_mut(a).unwrap().position = Vec2::new(200.0, 400.0);
        state.player_mut(b).unwrap().position = Vec2::new(1200.0, 400.0);
        (state, a, b)
    }

    #[test]
    fn test_invalid_dt_is_skipped() {
        let mut state = new_state(quiet_tuning());
        join(&mut state, "ada");
        join(&mut state, "bo");
        let before = state.countdown_remaining();

        for dt in [0.0, -0.5, f32::NAN, f32::INFINITY] {
            assert!(!state.tick(dt));
        }
        assert_eq!(state.countdown_remaining(), before);
        assert_eq!(state.phase(), MatchPhase::Countdown);
    }

    #[test]
    fn test_join_sanitizes_name() {
        let mut state = new_state(quiet_tuning());
        assert_eq!(state.join(Uuid::new_v4(), "   "), Err(JoinError::EmptyName));

        let id = join(&mut state, "  an extremely long display name indeed  ");
        let name = &state.player(id).unwrap().name;
        assert_eq!(name, "an extremely long displa");
        assert_eq!(name.chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_join_is_idempotent_per_connection() {
        let mut state = new_state(quiet_tuning());
        let conn = Uuid::new_v4();
        let first = state.join(conn, "ada").unwrap();
        let second = state.join(conn, "someone else").unwrap();
        assert_eq!(first, second);
        assert_eq!(state.player_count(), 1);
    }

    #[test]
    fn test_avatars_cycle_in_join_order() {
        let mut state = new_state(quiet_tuning());
        let avatars: Vec<Avatar> = (0..6)
            .map(|i| state.join(Uuid::new_v4(), &format!("p{}", i)).unwrap().avatar)
            .collect();
        assert_eq!(avatars[0], Avatar::Triangle);
        assert_eq!(avatars[4], Avatar::Star);
        assert_eq!(avatars[5], Avatar::Triangle);
    }

    #[test]
    fn test_second_join_starts_countdown() {
        let mut state = new_state(quiet_tuning());
        join(&mut state, "ada");
        assert_eq!(state.phase(), MatchPhase::Waiting);

        join(&mut state, "bo");
        assert_eq!(state.phase(), MatchPhase::Countdown);
        assert!(state.players().all(|p| p.status == PlayerStatus::Waiting));
        assert!(state
            .events()
            .contains(&GameEvent::CountdownStart { duration: 3.0 }));
    }

    #[test]
    fn test_countdown_starts_round() {
        let mut state = new_state(quiet_tuning());
        let a = join(&mut state, "ada");
        let b = join(&mut state, "bo");
        let spawn_a = state.player(a).unwrap().position;
        state.player_mut(b).unwrap().health = 12.0;

        run_for(&mut state, 2.9);
        assert_eq!(state.phase(), MatchPhase::Countdown);

        run_for(&mut state, 0.2);
        assert_eq!(state.phase(), MatchPhase::Playing);
        for player in state.players() {
            assert_eq!(player.status, PlayerStatus::Alive);
        }
        assert_eq!(state.player(b).unwrap().health, 100.0);
        assert_ne!(state.player(a).unwrap().position, spawn_a);
        assert!(state.events().contains(&GameEvent::RoundStart));
    }

    #[test]
    fn test_last_survivor_wins() {
        let (mut state, a, b) = playing_pair();
        state.take_events();

        let mut scratch = Vec::new();
        state.player_mut(b).unwrap().eliminate(&mut scratch);
        state.tick(DT);

        assert_eq!(state.phase(), MatchPhase::RoundOver);
        assert_eq!(state.player(a).unwrap().wins, 1);
        assert_eq!(state.player(b).unwrap().wins, 0);
        assert_eq!(state.player(a).unwrap().status, PlayerStatus::Waiting);
        assert_eq!(state.player(b).unwrap().status, PlayerStatus::Eliminated);
        assert!(state
            .take_events()
            .contains(&GameEvent::RoundWin { player_id: a, wins: 1 }));
    }

    #[test]
    fn test_round_over_cycles_back_to_countdown() {
        let (mut state, _a, b) = playing_pair();
        let mut scratch = Vec::new();
        state.player_mut(b).unwrap().eliminate(&mut scratch);
        state.tick(DT);
        assert_eq!(state.phase(), MatchPhase::RoundOver);

        let round_over = state.tuning().round_over_duration;
        run_for(&mut state, round_over + DT);
        assert_eq!(state.phase(), MatchPhase::Countdown);
        assert!(state.players().all(|p| p.status == PlayerStatus::Waiting));
    }

    #[test]
    fn test_round_over_falls_back_to_waiting() {
        let (mut state, a, b) = playing_pair();
        let mut scratch = Vec::new();
        state.player_mut(b).unwrap().eliminate(&mut scratch);
        state.tick(DT);
        // Leaving during round_over collapses straight to waiting
        state.leave(b);
        assert_eq!(state.phase(), MatchPhase::Waiting);
        assert_eq!(state.player(a).unwrap().wins, 1);

        run_for(&mut state, 10.0);
        assert_eq!(state.phase(), MatchPhase::Waiting);
    }

    #[test]
    fn test_leave_mid_round_credits_survivor() {
        let (mut state, a, b) = playing_pair();
        state.take_events();

        assert!(state.leave(b));

        assert_eq!(state.phase(), MatchPhase::Waiting);
        assert_eq!(state.player(a).unwrap().wins, 1);
        assert_eq!(state.player(a).unwrap().status, PlayerStatus::Waiting);
        assert!(state
            .events()
            .contains(&GameEvent::RoundWin { player_id: a, wins: 1 }));
    }

    #[test]
    fn test_leave_with_three_players_ends_round_only_when_one_left() {
        let mut state = new_state(GameTuning {
            gravity_strength: 0.0,
            ..quiet_tuning()
        });
        let a = join(&mut state, "ada");
        let b = join(&mut state, "bo");
        let c = join(&mut state, "cy");
        run_for(&mut state, 3.1);
        assert_eq!(state.phase(), MatchPhase::Playing);

        state.leave(c);
        assert_eq!(state.phase(), MatchPhase::Playing);

        let mut scratch = Vec::new();
        state.player_mut(b).unwrap().eliminate(&mut scratch);
        state.tick(DT);
        assert_eq!(state.phase(), MatchPhase::RoundOver);
        assert_eq!(state.player(a).unwrap().wins, 1);
    }

    #[test]
    fn test_leave_during_countdown_collapses_to_waiting() {
        let mut state = new_state(quiet_tuning());
        let a = join(&mut state, "ada");
        join(&mut state, "bo");
        assert_eq!(state.phase(), MatchPhase::Countdown);

        state.leave(a);
        assert_eq!(state.phase(), MatchPhase::Waiting);
        assert_eq!(state.countdown_remaining(), 0.0);
    }

    #[test]
    fn test_leave_during_countdown_with_players_left_ends_round() {
        let mut state = new_state(quiet_tuning());
        let a = join(&mut state, "ada");
        let b = join(&mut state, "bo");
        join(&mut state, "cy");
        assert_eq!(state.phase(), MatchPhase::Countdown);
        state.take_events();

        state.leave(a);

        // No one is alive yet: the round ends without a winner
        assert_eq!(state.phase(), MatchPhase::RoundOver);
        assert_eq!(state.round_over_remaining(), state.tuning().round_over_duration);
        assert!(state.players().all(|p| p.wins == 0));
        assert!(!state
            .take_events()
            .iter()
            .any(|e| matches!(e, GameEvent::RoundWin { .. })));

        // Two players remain, so the pause leads into a fresh countdown
        let round_over = state.tuning().round_over_duration;
        run_for(&mut state, round_over + DT);
        assert_eq!(state.phase(), MatchPhase::Countdown);
        assert_eq!(state.player(b).unwrap().status, PlayerStatus::Waiting);
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut state = new_state(quiet_tuning());
        let a = join(&mut state, "ada");
        assert!(!state.leave(PlayerId(999)));
        state.handle_input(PlayerId(999), 1.0, 1.0);
        assert_eq!(state.player_count(), 1);
        assert!(state.player(a).is_some());
    }

    #[test]
    fn test_input_ignored_unless_alive() {
        let mut state = new_state(quiet_tuning());
        let a = join(&mut state, "ada");
        state.handle_input(a, 1.0, 0.0);
        assert_eq!(state.player(a).unwrap().thrust, Vec2::ZERO);

        let (mut state, a, _b) = playing_pair();
        state.handle_input(a, 4.0, -0.5);
        assert_eq!(state.player(a).unwrap().thrust, Vec2::new(1.0, -0.5));
    }

    #[test]
    fn test_players_stay_inside_arena() {
        let (mut state, a, _b) = playing_pair();
        state.player_mut(a).unwrap().position = Vec2::new(30.0, 400.0);
        state.handle_input(a, -1.0, 0.0);
        state.player_mut(a).unwrap().velocity = Vec2::new(-400.0, 0.0);

        state.tick(0.1);

        let p = state.player(a).unwrap();
        assert_eq!(p.position.x, p.radius);
        assert!(p.velocity.x > 0.0);
    }

    #[test]
    fn test_collision_event_is_recorded() {
        let (mut state, a, b) = playing_pair();
        state.take_events();
        state.player_mut(a).unwrap().position = Vec2::new(600.0, 400.0);
        state.player_mut(b).unwrap().position = Vec2::new(630.0, 400.0);

        state.tick(DT);

        let events = state.take_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Collision { players, .. } if *players == [a, b]
        )));
        let pa = state.player(a).unwrap().position;
        let pb = state.player(b).unwrap().position;
        assert!(((pb - pa).length() - 44.0).abs() < 1e-3);
    }

    #[test]
    fn test_shielded_player_takes_no_hazard_damage() {
        let (mut state, a, b) = playing_pair();
        {
            let pa = state.player_mut(a).unwrap();
            pa.position = Vec2::new(600.0, 400.0);
            pa.effects.shield = 5.0;
        }
        state.player_mut(b).unwrap().position = Vec2::new(630.0, 400.0);
        state.obstacles_mut().push(Obstacle::MovingWall(MovingWall {
            id: Uuid::nil(),
            position: Vec2::new(600.0, 400.0),
            width: 200.0,
            height: 40.0,
            velocity: Vec2::ZERO,
        }));

        state.tick(DT);

        assert_eq!(state.player(a).unwrap().health, 100.0);
        assert!(state.player(b).unwrap().health < 100.0);
    }

    #[test]
    fn test_gravity_reversal_pickup_reverts_once() {
        let (mut state, a, _b) = playing_pair();
        let tuning = state.tuning().clone();
        // Give the field a real vector without disturbing the round
        state.gravity.vector = Vec2::new(0.0, 180.0);
        state.take_events();

        let pos = state.player(a).unwrap().position;
        state
            .power_ups_mut()
            .push(PowerUp::new(PowerUpKind::GravityReversal, pos, &tuning));
        let before = state.gravity().vector;

        state.tick(DT);
        let flipped = state.gravity().vector;
        assert!(flipped.approx_eq(-before, 1e-5));
        assert!(state.power_ups().is_empty());

        run_for(&mut state, tuning.gravity_reversal_duration + 0.1);
        let restored = state.gravity().vector;
        assert!(restored.approx_eq(-flipped, 1e-5));

        let events = state.take_events();
        let reverts = events
            .iter()
            .filter(|e| matches!(e, GameEvent::GravityRevert { .. }))
            .count();
        assert_eq!(reverts, 1);
        assert!(events.contains(&GameEvent::GravityFlip { player_id: a }));
        assert!(events.contains(&GameEvent::PowerUp {
            player_id: a,
            power: PowerUpKind::GravityReversal
        }));
    }

    #[test]
    fn test_spawn_timers_fill_the_arena() {
        let mut state = new_state(GameTuning {
            obstacle_min_interval: 0.5,
            obstacle_max_interval: 0.6,
            power_up_min_interval: 0.5,
            power_up_max_interval: 0.6,
            gravity_strength: 0.0,
            ..GameTuning::default()
        });
        let a = join(&mut state, "ada");
        let b = join(&mut state, "bo");
        run_for(&mut state, 3.1);
        assert_eq!(state.phase(), MatchPhase::Playing);
        assert!(state.obstacles().is_empty());

        // Keep both players shielded and parked so the round keeps going
        for _ in 0..120 {
            for id in [a, b] {
                if let Some(p) = state.player_mut(id) {
                    p.effects.shield = 5.0;
                    p.health = 100.0;
                }
            }
            state.tick(DT);
        }
        assert_eq!(state.phase(), MatchPhase::Playing);
        assert!(state.obstacles().len() >= 3);
    }

    #[test]
    fn test_lobby_in_join_order() {
        let mut state = new_state(quiet_tuning());
        let a = join(&mut state, "ada");
        let b = join(&mut state, "bo");
        let lobby = state.lobby();
        assert_eq!(lobby.iter().map(|e| e.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(lobby[1].name, "bo");
    }
}
