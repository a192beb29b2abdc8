use serde::{Deserialize, Serialize};

use crate::Position;

/// Upper bound for both health and sanity.
pub const MAX_VITAL: f64 = 100.0;

/// Health and sanity, each kept within `[0, MAX_VITAL]` by every mutator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    health: f64,
    sanity: f64,
}

impl Default for Vitals {
    fn default() -> Self {
        Vitals {
            health: MAX_VITAL,
            sanity: MAX_VITAL,
        }
    }
}

fn clamp_vital(value: f64) -> f64 {
    value.clamp(0.0, MAX_VITAL)
}

impl Vitals {
    pub fn new(health: f64, sanity: f64) -> Self {
        Vitals {
            health: clamp_vital(health),
            sanity: clamp_vital(sanity),
        }
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn sanity(&self) -> f64 {
        self.sanity
    }

    pub fn damage(&mut self, amount: f64) {
        self.health = clamp_vital(self.health - amount);
    }

    pub fn heal(&mut self, amount: f64) {
        self.health = clamp_vital(self.health + amount);
    }

    pub fn drain_sanity(&mut self, amount: f64) {
        self.sanity = clamp_vital(self.sanity - amount);
    }

    pub fn restore_sanity(&mut self, amount: f64) {
        self.sanity = clamp_vital(self.sanity + amount);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// The single player of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: Position,
    /// Yaw in radians; 0 faces negative `z`.
    pub facing: f64,
    pub alive: bool,
    pub vitals: Vitals,
}

impl Player {
    pub fn new(position: Position) -> Self {
        Player {
            position,
            facing: 0.0,
            alive: true,
            vitals: Vitals::default(),
        }
    }
}
