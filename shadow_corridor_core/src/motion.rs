use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::{Position, maze::Maze};

/// A requested displacement for one tick, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Delta {
    pub dx: f64,
    pub dz: f64,
}

impl Delta {
    pub const ZERO: Delta = Delta { dx: 0.0, dz: 0.0 };

    pub const fn new(dx: f64, dz: f64) -> Self {
        Self { dx, dz }
    }

    pub fn length(&self) -> f64 {
        (self.dx * self.dx + self.dz * self.dz).sqrt()
    }
}

/// Movement keys held during a tick, already decoupled from any input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub running: bool,
}

/// Converts held keys and a facing yaw into this tick's displacement.
///
/// Forward at yaw 0 points towards negative `z`. Combined keys are normalised
/// so diagonals are not faster, and opposing keys cancel.
pub fn desired_delta(input: &MovementInput, yaw: f64, speed: f64, delta_time: f64) -> Delta {
    let mut dx = 0.0;
    let mut dz = 0.0;

    if input.forward {
        dx -= yaw.sin();
        dz -= yaw.cos();
    }
    if input.backward {
        dx += yaw.sin();
        dz += yaw.cos();
    }
    if input.left {
        dx -= (yaw + FRAC_PI_2).sin();
        dz -= (yaw + FRAC_PI_2).cos();
    }
    if input.right {
        dx -= (yaw - FRAC_PI_2).sin();
        dz -= (yaw - FRAC_PI_2).cos();
    }

    let length = (dx * dx + dz * dz).sqrt();
    // Opposing keys leave floating-point dust rather than an exact zero.
    if length < 1e-9 {
        return Delta::ZERO;
    }
    let scale = speed * delta_time / length;
    Delta::new(dx * scale, dz * scale)
}

impl Maze {
    /// Applies `delta` one axis at a time so that entities slide along walls.
    ///
    /// Both axis tests are made against the original position: the X test
    /// uses the old Z and the Z test uses the old X.
    pub fn try_move(&self, position: Position, delta: Delta) -> Position {
        let new_x = position.x + delta.dx;
        let new_z = position.z + delta.dz;

        let mut moved = position;
        if !self.is_blocked(new_x, position.z) {
            moved.x = new_x;
        }
        if !self.is_blocked(position.x, new_z) {
            moved.z = new_z;
        }
        moved
    }
}
