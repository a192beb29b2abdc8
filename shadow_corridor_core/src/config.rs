use serde::{Deserialize, Serialize};

use crate::{ArtifactKind, CellCoord, Millis, maze::{MAX_MAZE_SIZE, WALL_THRESHOLD}};

/// Fatal problems with a configuration, reported before a session starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Maze size must be at least 1")]
    EmptyMaze,
    #[error("Maze size {size} exceeds the maximum of {max}")]
    MazeTooLarge { size: usize, max: usize },
    #[error("`{field}` must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("`{field}` must be a non-negative finite number, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("Wall threshold {threshold} must be smaller than half the cell size {cell_size}")]
    WallTooThick { threshold: f64, cell_size: f64 },
    #[error("Artifact cell ({x}, {z}) lies outside a maze of size {size}")]
    ArtifactOutOfBounds { x: usize, z: usize, size: usize },
    #[error("At most {max} artifacts are supported, got {count}")]
    TooManyArtifacts { count: usize, max: usize },
}

/// Static tunables for one game session.
///
/// Speeds and rates are per second; the simulation integrates them with the
/// frame delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub maze_size: usize,
    pub cell_size: f64,
    pub wall_threshold: f64,

    pub player_speed: f64,
    pub run_multiplier: f64,

    pub enemy_count: usize,
    pub enemy_speed: f64,
    pub enemy_detection_radius: f64,
    pub chase_multiplier: f64,
    pub attack_range: f64,
    pub attack_damage_health: f64,
    pub attack_damage_sanity: f64,
    /// Seconds between two hits from the same enemy.
    pub attack_cooldown: f64,
    pub idle_retarget_ms: Millis,
    pub chase_retarget_ms: Millis,

    pub sanity_decrease_rate: f64,
    pub sanity_decrease_per_enemy: f64,
    pub sanity_recovery_rate: f64,
    /// Chance per tick of a hallucination while sanity is critical.
    pub hallucination_chance: f64,

    /// Artifact cells, assigned key, medkit and battery in order.
    pub artifact_cells: Vec<CellCoord>,
    pub pickup_radius: f64,
    pub exit_radius: f64,
    pub escape_delay_ms: Millis,
    pub medkit_heal: f64,

    pub flashlight_intensity: f64,
    pub flashlight_distance: f64,
    pub battery_intensity_bonus: f64,
    pub battery_distance_bonus: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            maze_size: 10,
            cell_size: 4.0,
            wall_threshold: WALL_THRESHOLD,

            player_speed: 4.8,
            run_multiplier: 1.5,

            enemy_count: 3,
            enemy_speed: 1.8,
            enemy_detection_radius: 8.0,
            chase_multiplier: 1.5,
            attack_range: 1.5,
            attack_damage_health: 10.0,
            attack_damage_sanity: 15.0,
            attack_cooldown: 1.0,
            idle_retarget_ms: 3000,
            chase_retarget_ms: 500,

            sanity_decrease_rate: 0.1,
            sanity_decrease_per_enemy: 0.3,
            sanity_recovery_rate: 0.05,
            hallucination_chance: 0.0008,

            artifact_cells: vec![CellCoord::new(2, 2), CellCoord::new(5, 5), CellCoord::new(8, 8)],
            pickup_radius: 1.0,
            exit_radius: 1.5,
            escape_delay_ms: 3000,
            medkit_heal: 40.0,

            flashlight_intensity: 1.5,
            flashlight_distance: 10.0,
            battery_intensity_bonus: 0.5,
            battery_distance_bonus: 2.0,
        }
    }
}

impl Config {
    /// Checks every precondition a session relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maze_size == 0 {
            return Err(ConfigError::EmptyMaze);
        }
        if self.maze_size > MAX_MAZE_SIZE {
            return Err(ConfigError::MazeTooLarge {
                size: self.maze_size,
                max: MAX_MAZE_SIZE,
            });
        }

        let positive = [
            ("cell_size", self.cell_size),
            ("wall_threshold", self.wall_threshold),
            ("enemy_detection_radius", self.enemy_detection_radius),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        let non_negative = [
            ("player_speed", self.player_speed),
            ("run_multiplier", self.run_multiplier),
            ("enemy_speed", self.enemy_speed),
            ("chase_multiplier", self.chase_multiplier),
            ("attack_range", self.attack_range),
            ("attack_damage_health", self.attack_damage_health),
            ("attack_damage_sanity", self.attack_damage_sanity),
            ("attack_cooldown", self.attack_cooldown),
            ("sanity_decrease_rate", self.sanity_decrease_rate),
            ("sanity_decrease_per_enemy", self.sanity_decrease_per_enemy),
            ("sanity_recovery_rate", self.sanity_recovery_rate),
            ("hallucination_chance", self.hallucination_chance),
            ("pickup_radius", self.pickup_radius),
            ("exit_radius", self.exit_radius),
            ("medkit_heal", self.medkit_heal),
            ("flashlight_intensity", self.flashlight_intensity),
            ("flashlight_distance", self.flashlight_distance),
            ("battery_intensity_bonus", self.battery_intensity_bonus),
            ("battery_distance_bonus", self.battery_distance_bonus),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.wall_threshold * 2.0 >= self.cell_size {
            return Err(ConfigError::WallTooThick {
                threshold: self.wall_threshold,
                cell_size: self.cell_size,
            });
        }

        if self.artifact_cells.len() > ArtifactKind::ALL.len() {
            return Err(ConfigError::TooManyArtifacts {
                count: self.artifact_cells.len(),
                max: ArtifactKind::ALL.len(),
            });
        }
        if let Some(cell) = self
            .artifact_cells
            .iter()
            .find(|c| c.x >= self.maze_size || c.z >= self.maze_size)
        {
            return Err(ConfigError::ArtifactOutOfBounds {
                x: cell.x,
                z: cell.z,
                size: self.maze_size,
            });
        }

        Ok(())
    }
}
