//! Enemy behaviour: a three-state machine re-evaluated every tick.

use std::f64::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{Millis, Position, config::Config, maze::Maze, motion::Delta, unit};

/// Unique identifier for enemies within a session.
pub type EntityId = usize;

/// Enemies closer than this to their target stop moving.
const ARRIVAL_DISTANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnemyState {
    #[default]
    Idle,
    Chasing,
    Attacking,
}

/// Damage dealt to the player by a single hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Damage {
    pub health: f64,
    pub sanity: f64,
}

/// What one enemy did during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyTick {
    pub position: Position,
    pub state: EnemyState,
    pub damage: Option<Damage>,
    /// Sanity this enemy's presence drains this tick; zero when out of range.
    pub sanity_drain: f64,
}

/// Read-only view of the world an enemy reacts to.
#[derive(Debug, Clone, Copy)]
pub struct EnemyView<'a> {
    pub maze: &'a Maze,
    pub player: Position,
    pub config: &'a Config,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub position: Position,
    pub target: Position,
    pub state: EnemyState,
    /// `None` until the first retarget, which therefore happens immediately.
    pub last_decision: Option<Millis>,
    /// Seconds until the next hit lands.
    pub attack_cooldown: f64,
}

impl Enemy {
    pub fn new(id: EntityId, position: Position) -> Self {
        Enemy {
            id,
            position,
            target: position,
            state: EnemyState::Idle,
            last_decision: None,
            attack_cooldown: 0.0,
        }
    }

    /// Picks the state for this tick from the distance to the player.
    ///
    /// Attacking ignores line of sight: an enemy close enough hits through walls.
    fn evaluate_state(&self, view: &EnemyView, distance: f64) -> EnemyState {
        let config = view.config;
        if distance < config.attack_range {
            EnemyState::Attacking
        } else if distance < config.enemy_detection_radius
            && view.maze.has_line_of_sight(self.position, view.player)
        {
            EnemyState::Chasing
        } else {
            EnemyState::Idle
        }
    }

    fn decision_due(&self, now: Millis, interval: Millis) -> bool {
        match self.last_decision {
            None => true,
            Some(last) => now.saturating_sub(last) > interval,
        }
    }

    /// A random point 1 to 4 units away; collapses to the current position
    /// when that point falls off the map.
    fn wander_target<R: Rng + ?Sized>(&self, maze: &Maze, rng: &mut R) -> Position {
        let angle = unit(rng) * TAU;
        let distance = 1.0 + unit(rng) * 3.0;
        let target = Position::new(
            self.position.x + angle.cos() * distance,
            self.position.z + angle.sin() * distance,
        );
        if maze.cell_at(target).is_some() {
            target
        } else {
            self.position
        }
    }

    /// Moves at most `speed * delta_time` towards the target, never past it.
    fn step_towards_target(&mut self, maze: &Maze, speed: f64, delta_time: f64) {
        let dx = self.target.x - self.position.x;
        let dz = self.target.z - self.position.z;
        let length = (dx * dx + dz * dz).sqrt();
        if length <= ARRIVAL_DISTANCE {
            return;
        }
        let step = (speed * delta_time).min(length) / length;
        self.position = maze.try_move(self.position, Delta::new(dx * step, dz * step));
    }

    /// Advances this enemy by one tick.
    ///
    /// # Arguments
    ///
    /// * `view`: The maze, player position and tunables for this frame.
    /// * `delta_time`: Frame delta in seconds; scales movement, cooldown and drain.
    /// * `now`: Wall-clock milliseconds; drives the retarget timers.
    /// * `rng`: Source for wander targets.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        view: &EnemyView,
        delta_time: f64,
        now: Millis,
        rng: &mut R,
    ) -> EnemyTick {
        let config = view.config;
        let distance = self.position.distance_to(&view.player);

        let state = self.evaluate_state(view, distance);
        if state != self.state {
            debug!(enemy = self.id, from = ?self.state, to = ?state, distance, "enemy state changed");
        }
        self.state = state;

        let mut damage = None;
        match state {
            EnemyState::Idle => {
                if self.decision_due(now, config.idle_retarget_ms) {
                    self.target = self.wander_target(view.maze, rng);
                    self.last_decision = Some(now);
                    trace!(enemy = self.id, target = ?self.target, "wandering");
                }
                self.step_towards_target(view.maze, config.enemy_speed, delta_time);
            }
            EnemyState::Chasing => {
                if self.decision_due(now, config.chase_retarget_ms) {
                    self.target = view.player;
                    self.last_decision = Some(now);
                    trace!(enemy = self.id, target = ?self.target, "chasing");
                }
                self.step_towards_target(
                    view.maze,
                    config.enemy_speed * config.chase_multiplier,
                    delta_time,
                );
            }
            EnemyState::Attacking => {
                if self.attack_cooldown <= 0.0 {
                    damage = Some(Damage {
                        health: config.attack_damage_health,
                        sanity: config.attack_damage_sanity,
                    });
                    self.attack_cooldown = config.attack_cooldown;
                } else {
                    self.attack_cooldown -= delta_time;
                }
            }
        }

        let radius = config.enemy_detection_radius;
        let sanity_drain = if distance < radius {
            (1.0 - distance / radius) * config.sanity_decrease_per_enemy * delta_time
        } else {
            0.0
        };

        EnemyTick {
            position: self.position,
            state,
            damage,
            sanity_drain,
        }
    }
}

/// Free-function form of [`Enemy::tick`].
pub fn tick_enemy<R: Rng + ?Sized>(
    enemy: &mut Enemy,
    view: &EnemyView,
    delta_time: f64,
    now: Millis,
    rng: &mut R,
) -> EnemyTick {
    enemy.tick(view, delta_time, now, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        map::create_grid,
        testing::{ScriptedRng, open_grid},
    };

    fn open_maze() -> Maze {
        Maze::new(open_grid(5), 4.0)
    }

    fn closed_maze() -> Maze {
        Maze::new(create_grid(5), 4.0)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn close_enemy_attacks_rather_than_chases() {
        let maze = open_maze();
        let config = Config {
            enemy_detection_radius: 100.0,
            ..Default::default()
        };
        let player = Position::new(10.0, 10.0);
        let mut enemy = Enemy::new(0, Position::new(10.0, 9.0));
        let view = EnemyView { maze: &maze, player, config: &config };

        assert!(maze.has_line_of_sight(enemy.position, player));
        let tick = enemy.tick(&view, 0.016, 0, &mut ScriptedRng::new(&[0.5]));
        assert_eq!(tick.state, EnemyState::Attacking);
        assert_eq!(
            tick.damage,
            Some(Damage {
                health: 10.0,
                sanity: 15.0
            })
        );
        assert_eq!(tick.position, Position::new(10.0, 9.0));
    }

    #[test]
    fn attacks_through_walls() {
        let maze = closed_maze();
        let config = Config::default();
        // Wall between cells (0, 0) and (0, 1) sits at z = 4.
        let player = Position::new(2.0, 4.6);
        let mut enemy = Enemy::new(0, Position::new(2.0, 3.2));
        let view = EnemyView { maze: &maze, player, config: &config };

        assert!(!maze.has_line_of_sight(enemy.position, player));
        let tick = enemy.tick(&view, 0.016, 0, &mut ScriptedRng::new(&[0.5]));
        assert_eq!(tick.state, EnemyState::Attacking);
        assert!(tick.damage.is_some());
    }

    #[test]
    fn walls_prevent_chasing() {
        let maze = closed_maze();
        let config = Config::default();
        let player = Position::new(6.0, 2.0);
        let mut enemy = Enemy::new(0, Position::new(2.0, 2.0));
        let view = EnemyView { maze: &maze, player, config: &config };

        let tick = enemy.tick(&view, 0.016, 0, &mut ScriptedRng::new(&[0.5]));
        assert_eq!(tick.state, EnemyState::Idle);
    }

    #[test]
    fn attack_cooldown_counts_down_by_delta() {
        let maze = open_maze();
        let config = Config::default();
        let player = Position::new(10.0, 10.0);
        let mut enemy = Enemy::new(0, Position::new(10.0, 9.0));
        let view = EnemyView { maze: &maze, player, config: &config };
        let mut rng = ScriptedRng::new(&[0.5]);

        let hits: Vec<bool> = (0..5)
            .map(|i| enemy.tick(&view, 0.4, i * 400, &mut rng).damage.is_some())
            .collect();
        // 1.0 -> 0.6 -> 0.2 -> -0.2, then the next hit lands.
        assert_eq!(hits, vec![true, false, false, false, true]);
        assert_eq!(enemy.attack_cooldown, 1.0);
    }

    #[test]
    fn chase_retargets_every_half_second() {
        let maze = open_maze();
        let config = Config::default();
        let mut enemy = Enemy::new(0, Position::new(2.0, 10.0));
        let mut rng = ScriptedRng::new(&[0.5]);

        let first = Position::new(7.0, 10.0);
        let view = EnemyView { maze: &maze, player: first, config: &config };
        assert_eq!(enemy.tick(&view, 0.0, 1000, &mut rng).state, EnemyState::Chasing);
        assert_eq!(enemy.target, first);

        let moved = Position::new(7.0, 11.0);
        let view = EnemyView { maze: &maze, player: moved, config: &config };
        enemy.tick(&view, 0.0, 1500, &mut rng);
        assert_eq!(enemy.target, first);
        enemy.tick(&view, 0.0, 1501, &mut rng);
        assert_eq!(enemy.target, moved);
    }

    #[test]
    fn chasing_moves_faster_than_wandering() {
        let maze = open_maze();
        let config = Config::default();
        let mut enemy = Enemy::new(0, Position::new(2.0, 10.0));
        let player = Position::new(7.0, 10.0);
        let view = EnemyView { maze: &maze, player, config: &config };

        let tick = enemy.tick(&view, 1.0, 0, &mut ScriptedRng::new(&[0.5]));
        assert_eq!(tick.state, EnemyState::Chasing);
        assert!(close(tick.position.x, 2.0 + 1.8 * 1.5));
        assert!(close(tick.position.z, 10.0));
    }

    #[test]
    fn idle_wanders_to_random_target() {
        let maze = open_maze();
        let config = Config::default();
        let start = Position::new(10.0, 10.0);
        let mut enemy = Enemy::new(0, start);
        // Far away and outside the detection radius.
        let view = EnemyView { maze: &maze, player: Position::new(19.0, 19.0), config: &config };

        // Angle 0, distance 1 + 0.5 * 3.
        let mut rng = ScriptedRng::new(&[0.0, 0.5]);
        let tick = enemy.tick(&view, 0.5, 0, &mut rng);
        assert_eq!(tick.state, EnemyState::Idle);
        assert!(close(enemy.target.x, 12.5));
        assert!(close(enemy.target.z, 10.0));
        assert!(close(tick.position.x, 10.0 + 1.8 * 0.5));
    }

    #[test]
    fn idle_waits_before_retargeting() {
        let maze = open_maze();
        let config = Config::default();
        let mut enemy = Enemy::new(0, Position::new(10.0, 10.0));
        let view = EnemyView { maze: &maze, player: Position::new(19.0, 19.0), config: &config };

        let mut rng = ScriptedRng::new(&[0.0, 0.5, 0.25, 0.5]);
        enemy.tick(&view, 0.0, 0, &mut rng);
        let first = enemy.target;
        enemy.tick(&view, 0.0, 3000, &mut rng);
        assert_eq!(enemy.target, first);
        enemy.tick(&view, 0.0, 3001, &mut rng);
        // Quarter turn: straight down +z.
        assert!(close(enemy.target.x, 10.0));
        assert!(close(enemy.target.z, 12.5));
    }

    #[test]
    fn off_map_wander_target_collapses() {
        let maze = open_maze();
        let config = Config::default();
        let start = Position::new(1.0, 10.0);
        let mut enemy = Enemy::new(0, start);
        let view = EnemyView { maze: &maze, player: Position::new(19.0, 19.0), config: &config };

        // Angle pi points towards negative x, 4 units out: off the map.
        let tick = enemy.tick(&view, 1.0, 0, &mut ScriptedRng::new(&[0.5, 0.999]));
        assert_eq!(enemy.target, start);
        assert_eq!(tick.position, start);
    }

    #[test]
    fn no_jitter_at_target() {
        let maze = open_maze();
        let config = Config::default();
        let start = Position::new(10.0, 10.0);
        let mut enemy = Enemy::new(0, start);
        enemy.target = Position::new(10.05, 10.0);
        enemy.last_decision = Some(0);
        let view = EnemyView { maze: &maze, player: Position::new(19.0, 19.0), config: &config };

        let tick = enemy.tick(&view, 1.0, 10, &mut ScriptedRng::new(&[0.5]));
        assert_eq!(tick.position, start);
    }

    #[test]
    fn long_frame_stops_on_target() {
        let maze = open_maze();
        let config = Config::default();
        let mut enemy = Enemy::new(0, Position::new(10.0, 10.0));
        let view = EnemyView { maze: &maze, player: Position::new(19.0, 19.0), config: &config };
        let mut rng = ScriptedRng::new(&[0.0, 0.5]);

        // 1.8 * 5.0 would carry the enemy well past a target 2.5 away.
        let tick = enemy.tick(&view, 5.0, 0, &mut rng);
        assert!(close(tick.position.x, 12.5));
        assert!(close(tick.position.z, 10.0));

        let tick = enemy.tick(&view, 5.0, 10, &mut rng);
        assert!(close(tick.position.x, 12.5));
    }

    #[test]
    fn sanity_drain_scales_with_proximity() {
        let maze = closed_maze();
        let config = Config::default();
        let mut enemy = Enemy::new(0, Position::new(2.0, 2.0));
        let mut rng = ScriptedRng::new(&[0.5]);

        let view = EnemyView { maze: &maze, player: Position::new(6.0, 2.0), config: &config };
        let tick = enemy.tick(&view, 2.0, 0, &mut rng);
        // (1 - 4 / 8) * 0.3 * 2.0
        assert!(close(tick.sanity_drain, 0.3));

        let view = EnemyView { maze: &maze, player: Position::new(2.0, 18.0), config: &config };
        let tick = enemy.tick(&view, 2.0, 0, &mut rng);
        assert_eq!(tick.sanity_drain, 0.0);
    }
}
