//! Collision detection and response: player-player, player-obstacle

use crate::ws::protocol::GameEvent;

use super::entity::{Laser, MovingWall, Obstacle, Player};
use super::tuning::GameTuning;
use super::vec2::Vec2;

impl MovingWall {
    /// Drift and bounce off the arena edges
    pub fn advance(&mut self, dt: f32, tuning: &GameTuning) {
        self.position += self.velocity * dt;

        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        if self.position.x < half_w || self.position.x > tuning.arena_width - half_w {
            self.velocity.x = -self.velocity.x;
        }
        if self.position.y < half_h || self.position.y > tuning.arena_height - half_h {
            self.velocity.y = -self.velocity.y;
        }
    }

    /// Circle vs axis-aligned rectangle
    pub fn hits(&self, player: &Player) -> bool {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        let closest_x = player
            .position
            .x
            .clamp(self.position.x - half_w, self.position.x + half_w);
        let closest_y = player
            .position
            .y
            .clamp(self.position.y - half_h, self.position.y + half_h);
        let dx = player.position.x - closest_x;
        let dy = player.position.y - closest_y;
        dx * dx + dy * dy < player.radius * player.radius
    }
}

impl Laser {
    pub fn advance(&mut self, dt: f32) {
        self.angle += self.angular_velocity * dt;
    }

    /// Test the player's center in the beam's rotated frame against a
    /// `2 * radius` by `width + 2 * player radius` box.
    pub fn hits(&self, player: &Player) -> bool {
        let (sin, cos) = self.angle.sin_cos();
        let rel = player.position - self.origin;
        let local_x = rel.x * cos + rel.y * sin;
        let local_y = -rel.x * sin + rel.y * cos;
        let half_width = self.width / 2.0 + player.radius;
        local_x.abs() <= self.radius && local_y.abs() <= half_width
    }
}

impl Obstacle {
    pub fn advance(&mut self, dt: f32, tuning: &GameTuning) {
        match self {
            Obstacle::MovingWall(wall) => wall.advance(dt, tuning),
            Obstacle::Laser(laser) => laser.advance(dt),
        }
    }

    pub fn hits(&self, player: &Player) -> bool {
        match self {
            Obstacle::MovingWall(wall) => wall.hits(player),
            Obstacle::Laser(laser) => laser.hits(player),
        }
    }
}

/// Collision system for player impacts and hazard hits
pub struct CollisionSystem;

impl CollisionSystem {
    /// Resolve every unordered pair of alive players
    pub fn resolve_players(
        players: &mut [&mut Player],
        tuning: &GameTuning,
        events: &mut Vec<GameEvent>,
    ) {
        for i in 0..players.len() {
            let (head, tail) = players.split_at_mut(i + 1);
            let a = &mut *head[i];
            for b in tail.iter_mut() {
                Self::resolve_pair(a, b, tuning, events);
            }
        }
    }

    /// Equal-mass elastic bounce along the collision normal.
    ///
    /// Returns the impulse magnitude when the pair collided.
    pub fn resolve_pair(
        a: &mut Player,
        b: &mut Player,
        tuning: &GameTuning,
        events: &mut Vec<GameEvent>,
    ) -> Option<f32> {
        if !a.is_alive() || !b.is_alive() {
            return None;
        }
        if a.effects.is_shielded() || b.effects.is_shielded() {
            return None;
        }

        let delta = b.position - a.position;
        let dist = delta.length();
        let min_dist = a.radius + b.radius;
        if dist >= min_dist || dist <= 0.0 {
            return None;
        }

        let normal = Vec2::new(delta.x / dist, delta.y / dist);
        let push = normal * ((min_dist - dist) / 2.0);
        a.position -= push;
        b.position += push;

        let av = a.velocity.dot(normal);
        let bv = b.velocity.dot(normal);
        let exchange = bv - av;
        a.velocity += normal * exchange;
        b.velocity -= normal * exchange;

        // Full collision damage at an impulse equal to the base max speed
        let impact = exchange.abs();
        let damage = tuning.player_collision_damage * impact / tuning.player_max_speed;
        a.apply_damage(damage, events);
        b.apply_damage(damage, events);

        events.push(GameEvent::Collision {
            players: [a.id, b.id],
            magnitude: impact,
        });
        Some(impact)
    }

    /// Move every obstacle, then hit-test it against alive, unshielded players
    pub fn resolve_obstacles(
        obstacles: &mut [Obstacle],
        players: &mut [&mut Player],
        tuning: &GameTuning,
        dt: f32,
        events: &mut Vec<GameEvent>,
    ) {
        for obstacle in obstacles.iter_mut() {
            obstacle.advance(dt, tuning);
            for player in players.iter_mut() {
                if !player.is_alive() || player.effects.is_shielded() {
                    continue;
                }
                if obstacle.hits(player) {
                    Self::apply_obstacle_hit(player, tuning, events);
                }
            }
        }
    }

    pub fn apply_obstacle_hit(player: &mut Player, tuning: &GameTuning, events: &mut Vec<GameEvent>) {
        player.effects.apply_slow(tuning.slow_duration);
        player.apply_damage(tuning.obstacle_hit_damage, events);
        events.push(GameEvent::ObstacleHit {
            player_id: player.id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::{Avatar, PlayerId, PlayerStatus, PLAYER_COLORS};
    use std::f32::consts::FRAC_PI_2;
    use uuid::Uuid;

    const EPS: f32 = 1e-3;

    fn alive(id: u64, position: Vec2, velocity: Vec2, tuning: &GameTuning) -> Player {
        let mut p = Player::new(
            PlayerId(id),
            format!("p{}", id),
            PLAYER_COLORS[2],
            Avatar::Diamond,
            position,
            tuning,
        );
        p.status = PlayerStatus::Alive;
        p.velocity = velocity;
        p
    }

    fn wall(position: Vec2, width: f32, height: f32) -> MovingWall {
        MovingWall {
            id: Uuid::nil(),
            position,
            width,
            height,
            velocity: Vec2::new(50.0, 0.0),
        }
    }

    fn laser(origin: Vec2, angle: f32) -> Laser {
        Laser {
            id: Uuid::nil(),
            origin,
            radius: 150.0,
            angle,
            angular_velocity: 0.5,
            width: 20.0,
        }
    }

    #[test]
    fn test_head_on_collision_separates_and_swaps() {
        let tuning = GameTuning::default();
        let mut a = alive(1, Vec2::new(100.0, 400.0), Vec2::new(50.0, 0.0), &tuning);
        let mut b = alive(2, Vec2::new(130.0, 400.0), Vec2::new(-50.0, 0.0), &tuning);
        let mut events = Vec::new();

        let impact = CollisionSystem::resolve_pair(&mut a, &mut b, &tuning, &mut events);

        assert_eq!(impact, Some(100.0));
        assert!(((b.position - a.position).length() - 44.0).abs() < EPS);
        assert!((a.position.x - 93.0).abs() < EPS);
        assert!((b.position.x - 137.0).abs() < EPS);
        assert_eq!(a.position.y, 400.0);
        assert!((a.velocity.x + 50.0).abs() < EPS);
        assert!((b.velocity.x - 50.0).abs() < EPS);
        assert!(a.health < tuning.max_health);
        assert!(b.health < tuning.max_health);
        assert!(events.contains(&GameEvent::Collision {
            players: [PlayerId(1), PlayerId(2)],
            magnitude: 100.0,
        }));
    }

    #[test]
    fn test_gentle_collision_damage_is_proportional() {
        let tuning = GameTuning {
            player_collision_damage: 44.0,
            ..GameTuning::default()
        };
        let mut a = alive(1, Vec2::new(100.0, 400.0), Vec2::new(10.0, 0.0), &tuning);
        let mut b = alive(2, Vec2::new(140.0, 400.0), Vec2::ZERO, &tuning);
        let mut events = Vec::new();

        CollisionSystem::resolve_pair(&mut a, &mut b, &tuning, &mut events);

        assert!((a.health - 99.0).abs() < EPS);
        assert!((b.health - 99.0).abs() < EPS);
        assert!(a.velocity.x.abs() < EPS);
        assert!((b.velocity.x - 10.0).abs() < EPS);
    }

    #[test]
    fn test_shield_blocks_collision() {
        let tuning = GameTuning::default();
        let mut a = alive(1, Vec2::new(100.0, 400.0), Vec2::new(50.0, 0.0), &tuning);
        let mut b = alive(2, Vec2::new(130.0, 400.0), Vec2::new(-50.0, 0.0), &tuning);
        b.effects.shield = 1.0;
        let mut events = Vec::new();

        assert_eq!(CollisionSystem::resolve_pair(&mut a, &mut b, &tuning, &mut events), None);
        assert_eq!(a.health, tuning.max_health);
        assert_eq!(b.health, tuning.max_health);
        assert!(events.is_empty());
    }

    #[test]
    fn test_coincident_centers_are_skipped() {
        let tuning = GameTuning::default();
        let mut a = alive(1, Vec2::new(100.0, 400.0), Vec2::ZERO, &tuning);
        let mut b = alive(2, Vec2::new(100.0, 400.0), Vec2::ZERO, &tuning);
        let mut events = Vec::new();
        assert_eq!(CollisionSystem::resolve_pair(&mut a, &mut b, &tuning, &mut events), None);
    }

    #[test]
    fn test_resolve_players_checks_every_pair() {
        let tuning = GameTuning {
            player_collision_damage: 0.0,
            ..GameTuning::default()
        };
        let mut a = alive(1, Vec2::new(100.0, 100.0), Vec2::ZERO, &tuning);
        let mut b = alive(2, Vec2::new(130.0, 100.0), Vec2::ZERO, &tuning);
        let mut c = alive(3, Vec2::new(800.0, 600.0), Vec2::ZERO, &tuning);
        let mut d = alive(4, Vec2::new(800.0, 630.0), Vec2::ZERO, &tuning);
        let mut players = vec![&mut a, &mut b, &mut c, &mut d];
        let mut events = Vec::new();

        CollisionSystem::resolve_players(&mut players, &tuning, &mut events);

        let pairs: Vec<[PlayerId; 2]> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Collision { players, .. } => Some(*players),
                _ => None,
            })
            .collect();
        assert_eq!(pairs, vec![[PlayerId(1), PlayerId(2)], [PlayerId(3), PlayerId(4)]]);
    }

    #[test]
    fn test_circle_rect_hit() {
        let tuning = GameTuning::default();
        let w = wall(Vec2::new(500.0, 400.0), 200.0, 40.0);

        let touching = alive(1, Vec2::new(500.0, 440.0), Vec2::ZERO, &tuning);
        assert!(w.hits(&touching));

        let clear = alive(2, Vec2::new(500.0, 443.0), Vec2::ZERO, &tuning);
        assert!(!w.hits(&clear));

        let corner = alive(3, Vec2::new(615.0, 430.0), Vec2::ZERO, &tuning);
        assert!(w.hits(&corner));
    }

    #[test]
    fn test_laser_hit_in_rotated_frame() {
        let tuning = GameTuning::default();
        let beam = laser(Vec2::new(600.0, 400.0), FRAC_PI_2);

        // Beam points along +y after rotation
        let on_beam = alive(1, Vec2::new(600.0, 520.0), Vec2::ZERO, &tuning);
        assert!(beam.hits(&on_beam));

        let grazing = alive(2, Vec2::new(630.0, 400.0), Vec2::ZERO, &tuning);
        assert!(beam.hits(&grazing));

        let beside = alive(3, Vec2::new(640.0, 400.0), Vec2::ZERO, &tuning);
        assert!(!beam.hits(&beside));

        let past_tip = alive(4, Vec2::new(600.0, 560.0), Vec2::ZERO, &tuning);
        assert!(!beam.hits(&past_tip));
    }

    #[test]
    fn test_obstacle_hit_slows_and_damages() {
        let tuning = GameTuning::default();
        let mut obstacles = vec![Obstacle::MovingWall(wall(Vec2::new(500.0, 400.0), 200.0, 40.0))];
        let mut a = alive(1, Vec2::new(500.0, 400.0), Vec2::ZERO, &tuning);
        let mut b = alive(2, Vec2::new(500.0, 400.0), Vec2::ZERO, &tuning);
        b.effects.shield = 2.0;
        let mut players = vec![&mut a, &mut b];
        let mut events = Vec::new();

        CollisionSystem::resolve_obstacles(&mut obstacles, &mut players, &tuning, 0.0, &mut events);

        assert_eq!(a.effects.slow, tuning.slow_duration);
        assert!((a.health - (tuning.max_health - tuning.obstacle_hit_damage)).abs() < EPS);
        assert_eq!(b.health, tuning.max_health);
        assert_eq!(events, vec![GameEvent::ObstacleHit { player_id: PlayerId(1) }]);
    }

    #[test]
    fn test_wall_bounces_off_edges() {
        let tuning = GameTuning::default();
        let mut w = wall(Vec2::new(tuning.arena_width - 101.0, 400.0), 200.0, 40.0);
        w.advance(0.1, &tuning);
        assert!(w.velocity.x < 0.0);
        assert_eq!(w.velocity.y, 0.0);
    }

    #[test]
    fn test_laser_sweeps() {
        let mut beam = laser(Vec2::new(600.0, 400.0), 0.0);
        beam.advance(2.0);
        assert!((beam.angle - 1.0).abs() < EPS);
    }
}
