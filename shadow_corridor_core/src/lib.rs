use serde::{Deserialize, Serialize};

pub mod collision;
pub mod config;
pub mod enemy;
pub mod map;
pub mod maze;
pub mod motion;
pub mod player;
pub mod session;

/// Wall-clock milliseconds, supplied by the host's monotonic clock.
pub type Millis = u64;

/// Represents a continuous position on the maze floor, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Represents a discrete cell index in the maze grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: usize,
    pub z: usize,
}

impl CellCoord {
    pub const fn new(x: usize, z: usize) -> Self {
        Self { x, z }
    }

    /// Manhattan distance in grid index space.
    pub fn manhattan_distance(&self, other: &CellCoord) -> usize {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }
}

/// The artifacts the player must recover before the exit opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    Key,
    Medkit,
    Battery,
}

impl ArtifactKind {
    /// Kinds in placement order; the n-th configured artifact cell gets the n-th kind.
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Key, ArtifactKind::Medkit, ArtifactKind::Battery];
}

/// Draws a uniform `f64` in `[0, 1)`.
///
/// Every random decision in the core goes through this so that a scripted
/// generator controls the simulation exactly.
pub(crate) fn unit<R: rand::Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.random::<f64>()
}

/// Draws a uniform index in `0..len` as `floor(u * len)`.
pub(crate) fn random_index<R: rand::Rng + ?Sized>(rng: &mut R, len: usize) -> usize {
    let index = (unit(rng) * len as f64).floor() as usize;
    index.min(len.saturating_sub(1))
}

#[cfg(test)]
pub(crate) mod testing {
    use rand::RngCore;

    use crate::map::{Cell, Grid, create_grid};

    /// Replays a fixed list of unit draws, then repeats the last one.
    pub struct ScriptedRng {
        draws: Vec<f64>,
        next: usize,
    }

    impl ScriptedRng {
        pub fn new(draws: &[f64]) -> Self {
            Self {
                draws: draws.to_vec(),
                next: 0,
            }
        }
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            (self.next_u64() >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            let draw = self.draws[self.next.min(self.draws.len() - 1)];
            self.next += 1;
            // `random::<f64>()` keeps the top 53 bits.
            ((draw * (1u64 << 53) as f64) as u64) << 11
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            for chunk in dst.chunks_mut(8) {
                let bytes = self.next_u64().to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }
    }

    /// A grid with every interior wall removed.
    pub fn open_grid(size: usize) -> Grid<Cell> {
        let mut grid = create_grid(size);
        for z in 0..size {
            for x in 0..size {
                let cell = grid.get_mut(x, z).expect("in bounds");
                cell.north_wall = z == 0;
                cell.east_wall = x + 1 == size;
            }
        }
        grid
    }
}
