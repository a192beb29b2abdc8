//! Continuous-space collision and visibility over the discrete wall graph.

use crate::{CellCoord, Position, maze::Maze};

impl Maze {
    /// Whether the world point `(x, z)` is inside a wall band or off the map.
    ///
    /// Each stored wall is thickened into a band `wall_threshold` wide on the
    /// inner side of the cell edge. Edges of the outer boundary are left to
    /// the bounds check: a point just inside them is free, a point just past
    /// them is off the map.
    pub fn is_blocked(&self, x: f64, z: f64) -> bool {
        let (cell_x, cell_z) = self.cell_index(Position::new(x, z));
        if !self.grid().contains_signed(cell_x, cell_z) {
            return true;
        }
        let (cell_x, cell_z) = (cell_x as usize, cell_z as usize);

        let grid = self.grid();
        let size = self.size();
        let cell_size = self.cell_size();
        let threshold = self.wall_threshold();
        let cell = &grid[CellCoord::new(cell_x, cell_z)];

        let rel_x = x - cell_x as f64 * cell_size;
        let rel_z = z - cell_z as f64 * cell_size;

        if rel_z < threshold && cell_z > 0 && cell.north_wall {
            return true;
        }
        if rel_z > cell_size - threshold
            && cell_z < size - 1
            && grid[CellCoord::new(cell_x, cell_z + 1)].north_wall
        {
            return true;
        }
        if rel_x > cell_size - threshold && cell_x < size - 1 && cell.east_wall {
            return true;
        }
        if rel_x < threshold && cell_x > 0 && grid[CellCoord::new(cell_x - 1, cell_z)].east_wall {
            return true;
        }

        false
    }

    /// Samples the segment between two points at `ceil(2 * distance)`
    /// intervals, excluding both endpoints, and reports whether none of the
    /// samples is blocked.
    ///
    /// This is an approximation; a wall corner can slip between samples.
    pub fn has_line_of_sight(&self, from: Position, to: Position) -> bool {
        let dx = to.x - from.x;
        let dz = to.z - from.z;
        let steps = (from.distance_to(&to) * 2.0).ceil() as usize;
        if steps == 0 {
            return true;
        }

        let step_x = dx / steps as f64;
        let step_z = dz / steps as f64;
        (1..steps).all(|i| !self.is_blocked(from.x + step_x * i as f64, from.z + step_z * i as f64))
    }
}
