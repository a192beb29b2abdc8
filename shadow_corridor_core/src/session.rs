use std::{collections::VecDeque, f64::consts::TAU};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    ArtifactKind, CellCoord, Millis, Position,
    config::{Config, ConfigError},
    enemy::{Enemy, EnemyView, EntityId, tick_enemy},
    maze::{Maze, MazeError, generate_maze},
    motion::{MovementInput, desired_delta},
    player::Player,
    random_index, unit,
};

/// How many recent messages the session keeps for display.
const MESSAGE_LOG_LIMIT: usize = 8;

/// Sanity below which the view starts to distort.
const DISTORTION_SANITY: f64 = 30.0;

/// Sanity below which hallucinations may appear.
const HALLUCINATION_SANITY: f64 = 10.0;

/// Minimum distance, in cells and on each axis, between an enemy spawn and the player.
const SPAWN_CLEARANCE_CELLS: f64 = 3.0;

/// Represents errors that prevent a session from starting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Maze generation failed: {0}")]
    Maze(#[from] MazeError),
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Died,
    Escaped,
}

/// Something the presentation layer may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayerHurt {
        enemy: EntityId,
        health: f64,
        sanity: f64,
    },
    ArtifactCollected(ArtifactKind),
    GoalReached,
    Hallucination {
        position: Position,
        lifetime_ms: Millis,
    },
    FlashlightToggled(bool),
    Message(String),
    GameOver(Outcome),
}

/// A collectible placed at a cell centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub cell: CellCoord,
    pub position: Position,
    pub collected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashlight {
    pub on: bool,
    pub intensity: f64,
    pub distance: f64,
}

/// Manages one game from maze generation to its outcome.
pub struct Session {
    config: Config,
    maze: Maze,
    start: CellCoord,
    exit: CellCoord,
    player: Player,
    enemies: Vec<Enemy>,
    artifacts: Vec<Artifact>,
    inventory: Vec<ArtifactKind>,
    flashlight: Flashlight,
    goal_reached_at: Option<Millis>,
    outcome: Option<Outcome>,
    messages: VecDeque<String>,
}

impl Session {
    /// Validates `config`, carves a maze and populates it.
    ///
    /// # Arguments
    ///
    /// * `config`: Tunables for the session; rejected with [`SessionError::Config`] if invalid.
    /// * `rng`: Source for the maze layout and enemy spawn points.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the maze cannot be carved.
    pub fn new<R: Rng + ?Sized>(config: Config, rng: &mut R) -> Result<Self, SessionError> {
        config.validate()?;

        let generated = generate_maze(config.maze_size, config.cell_size, rng)?;
        let start_position = generated.start_position();
        let maze = generated.maze.with_wall_threshold(config.wall_threshold);

        let artifacts: Vec<Artifact> = config
            .artifact_cells
            .iter()
            .zip(ArtifactKind::ALL)
            .map(|(&cell, kind)| Artifact {
                kind,
                cell,
                position: maze.cell_center(cell),
                collected: false,
            })
            .collect();

        let flashlight = Flashlight {
            on: false,
            intensity: config.flashlight_intensity,
            distance: config.flashlight_distance,
        };

        let mut session = Session {
            maze,
            start: generated.start,
            exit: generated.exit,
            player: Player::new(start_position),
            enemies: Vec::with_capacity(config.enemy_count),
            artifacts,
            inventory: Vec::new(),
            flashlight,
            goal_reached_at: None,
            outcome: None,
            messages: VecDeque::with_capacity(MESSAGE_LOG_LIMIT),
            config,
        };
        session.spawn_enemies(rng);

        let names: Vec<String> = session.artifacts.iter().map(|a| format!("{:?}", a.kind)).collect();
        let goal = match names.as_slice() {
            [] => "Find the exit!".to_string(),
            [only] => format!("Find the artifact: {only}!"),
            [rest @ .., last] => format!(
                "Find the {} artifacts: {} and {}!",
                names.len(),
                rest.join(", "),
                last
            ),
        };
        session.log_message(goal);

        info!(
            size = session.config.maze_size,
            start = ?session.start,
            exit = ?session.exit,
            enemies = session.enemies.len(),
            "session started"
        );
        Ok(session)
    }

    fn spawn_clear_of_player(&self, cell: CellCoord) -> bool {
        let center = self.maze.cell_center(cell);
        let clearance = self.maze.cell_size() * SPAWN_CLEARANCE_CELLS;
        (center.x - self.player.position.x).abs() >= clearance
            && (center.z - self.player.position.z).abs() >= clearance
    }

    /// Rejection-samples random cells far enough from the player on both axes.
    fn spawn_enemies<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.config.enemy_count == 0 {
            return;
        }
        let size = self.maze.size();
        let any_clear = (0..size)
            .flat_map(|x| (0..size).map(move |z| CellCoord::new(x, z)))
            .any(|cell| self.spawn_clear_of_player(cell));
        if !any_clear {
            warn!(size, "no cell is far enough from the player; spawning no enemies");
            return;
        }

        for id in 0..self.config.enemy_count {
            let cell = loop {
                let candidate = CellCoord::new(random_index(rng, size), random_index(rng, size));
                if self.spawn_clear_of_player(candidate) {
                    break candidate;
                }
            };
            debug!(enemy = id, ?cell, "enemy spawned");
            self.enemies.push(Enemy::new(id, self.maze.cell_center(cell)));
        }
    }

    fn log_message(&mut self, text: String) {
        if self.messages.len() == MESSAGE_LOG_LIMIT {
            self.messages.pop_front();
        }
        self.messages.push_back(text);
    }

    fn push_message(&mut self, text: impl Into<String>, events: &mut Vec<GameEvent>) {
        let text = text.into();
        self.log_message(text.clone());
        events.push(GameEvent::Message(text));
    }

    fn finish(&mut self, outcome: Outcome, events: &mut Vec<GameEvent>) {
        if self.outcome.is_some() {
            return;
        }
        info!(?outcome, health = self.player.vitals.health(), "game over");
        self.outcome = Some(outcome);
        events.push(GameEvent::GameOver(outcome));
    }

    fn all_artifacts_collected(&self) -> bool {
        self.inventory.len() >= self.artifacts.len()
    }

    fn near_exit(&self) -> bool {
        self.player.position.distance_to(&self.exit_position()) < self.config.exit_radius
    }

    fn reach_goal(&mut self, now: Millis, events: &mut Vec<GameEvent>) {
        if self.goal_reached_at.is_some() {
            return;
        }
        info!(now, "goal reached");
        self.goal_reached_at = Some(now);
        events.push(GameEvent::GoalReached);
        self.push_message("You've escaped the shadow corridor... for now.", events);
    }

    /// Runs one frame of simulation.
    ///
    /// `delta_time` is the frame delta in seconds and drives motion and decay;
    /// `now` is wall-clock milliseconds and drives enemy timers and the escape
    /// delay. Once the game is over this does nothing. A negative or
    /// non-finite `delta_time` skips the frame.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        input: &MovementInput,
        delta_time: f64,
        now: Millis,
        rng: &mut R,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.outcome.is_some() {
            return events;
        }
        if !delta_time.is_finite() || delta_time < 0.0 {
            warn!(delta_time, "skipping frame with invalid delta");
            return events;
        }

        // Player motion.
        let speed = self.config.player_speed
            * if input.running {
                self.config.run_multiplier
            } else {
                1.0
            };
        let delta = desired_delta(input, self.player.facing, speed, delta_time);
        self.player.position = self.maze.try_move(self.player.position, delta);

        // Enemies.
        let view = EnemyView {
            maze: &self.maze,
            player: self.player.position,
            config: &self.config,
        };
        let mut sanity_drain = 0.0;
        let mut died = false;
        for enemy in &mut self.enemies {
            let tick = tick_enemy(enemy, &view, delta_time, now, rng);
            sanity_drain += tick.sanity_drain;
            if let Some(damage) = tick.damage {
                let vitals = &mut self.player.vitals;
                vitals.damage(damage.health);
                vitals.drain_sanity(damage.sanity);
                debug!(enemy = enemy.id, health = vitals.health(), "player hurt");
                events.push(GameEvent::PlayerHurt {
                    enemy: enemy.id,
                    health: vitals.health(),
                    sanity: vitals.sanity(),
                });
                if vitals.is_dead() && self.player.alive {
                    self.player.alive = false;
                    died = true;
                }
            }
        }
        self.player.vitals.drain_sanity(sanity_drain);
        if died {
            self.finish(Outcome::Died, &mut events);
            return events;
        }

        // Passive sanity.
        if self.flashlight.on {
            self.player
                .vitals
                .restore_sanity(self.config.sanity_recovery_rate * delta_time);
        } else {
            self.player
                .vitals
                .drain_sanity(self.config.sanity_decrease_rate * delta_time);
        }

        if self.player.vitals.sanity() < HALLUCINATION_SANITY
            && unit(rng) < self.config.hallucination_chance
        {
            let angle = unit(rng) * TAU;
            let distance = 3.0 + unit(rng) * 2.0;
            let position = Position::new(
                self.player.position.x + angle.sin() * distance,
                self.player.position.z + angle.cos() * distance,
            );
            let lifetime_ms = 500 + (unit(rng) * 1000.0) as Millis;
            debug!(?position, lifetime_ms, "hallucination");
            events.push(GameEvent::Hallucination {
                position,
                lifetime_ms,
            });
        }

        if self.all_artifacts_collected() && self.near_exit() {
            self.reach_goal(now, &mut events);
        }
        if let Some(reached) = self.goal_reached_at {
            if now.saturating_sub(reached) >= self.config.escape_delay_ms {
                self.finish(Outcome::Escaped, &mut events);
            }
        }

        events
    }

    /// Picks up a nearby artifact, or tries the exit.
    pub fn interact(&mut self, now: Millis) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.outcome.is_some() {
            return events;
        }

        let player = self.player.position;
        let radius = self.config.pickup_radius;
        if let Some(index) = self
            .artifacts
            .iter()
            .position(|a| !a.collected && a.position.distance_to(&player) < radius)
        {
            self.collect(index, &mut events);
            return events;
        }

        if self.near_exit() {
            if self.all_artifacts_collected() {
                self.reach_goal(now, &mut events);
            } else {
                let missing = self.artifacts.len() - self.inventory.len();
                self.push_message(format!("Find {missing} more artifacts to escape."), &mut events);
            }
        }
        events
    }

    fn collect(&mut self, index: usize, events: &mut Vec<GameEvent>) {
        let artifact = &mut self.artifacts[index];
        artifact.collected = true;
        let kind = artifact.kind;
        self.inventory.push(kind);
        debug!(?kind, inventory = self.inventory.len(), "artifact collected");
        events.push(GameEvent::ArtifactCollected(kind));

        let text = match kind {
            ArtifactKind::Key => "You found a mysterious key.",
            ArtifactKind::Medkit => {
                self.player.vitals.heal(self.config.medkit_heal);
                "You found a first aid kit. Health restored."
            }
            ArtifactKind::Battery => {
                self.flashlight.intensity += self.config.battery_intensity_bonus;
                self.flashlight.distance += self.config.battery_distance_bonus;
                "You found fresh batteries. Flashlight power increased."
            }
        };
        self.push_message(text, events);
    }

    /// Switches the flashlight and returns its new state.
    pub fn toggle_flashlight(&mut self) -> Option<GameEvent> {
        if self.outcome.is_some() {
            return None;
        }
        self.flashlight.on = !self.flashlight.on;
        Some(GameEvent::FlashlightToggled(self.flashlight.on))
    }

    /// Rotates the player's facing by `yaw_delta` radians.
    pub fn turn(&mut self, yaw_delta: f64) {
        if self.outcome.is_some() {
            return;
        }
        self.player.facing = (self.player.facing + yaw_delta).rem_euclid(TAU);
    }

    /// Strength of the low-sanity view distortion, from 0 (none) to 1.
    pub fn distortion(&self) -> f64 {
        let sanity = self.player.vitals.sanity();
        if sanity < DISTORTION_SANITY {
            (DISTORTION_SANITY - sanity) / DISTORTION_SANITY
        } else {
            0.0
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
    pub fn maze(&self) -> &Maze {
        &self.maze
    }
    pub fn start_cell(&self) -> CellCoord {
        self.start
    }
    pub fn exit_cell(&self) -> CellCoord {
        self.exit
    }
    pub fn exit_position(&self) -> Position {
        self.maze.cell_center(self.exit)
    }
    pub fn player(&self) -> &Player {
        &self.player
    }
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }
    pub fn inventory(&self) -> &[ArtifactKind] {
        &self.inventory
    }
    pub fn flashlight(&self) -> &Flashlight {
        &self.flashlight
    }
    pub fn goal_reached(&self) -> bool {
        self.goal_reached_at.is_some()
    }
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }
    /// Recent messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }
}
