//! Randomized depth-first maze carving.
//!
//! The generator produces a perfect maze: every cell is reachable and there
//! is exactly one path between any two cells. The exit is placed on the cell
//! farthest from the start in Manhattan distance.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    CellCoord, Position,
    map::{Cell, Direction, Grid, GridError, create_grid},
    random_index,
};

/// Half-width of the collision band along each cell edge, in world units.
pub const WALL_THRESHOLD: f64 = 0.3;

/// Largest supported side length, in cells.
pub const MAX_MAZE_SIZE: usize = 256;

/// Errors raised when a maze cannot be built from the requested dimensions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MazeError {
    #[error("Maze size must be at least 1")]
    EmptyMaze,
    #[error("Maze size {size} exceeds the maximum of {max}")]
    TooLarge { size: usize, max: usize },
    #[error("Cell size must be a positive finite number, got {0}")]
    InvalidCellSize(f64),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// A carved maze together with the world scale used to interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maze {
    grid: Grid<Cell>,
    cell_size: f64,
    wall_threshold: f64,
}

impl Maze {
    /// Wraps a grid with the default wall threshold.
    pub fn new(grid: Grid<Cell>, cell_size: f64) -> Self {
        Self {
            grid,
            cell_size,
            wall_threshold: WALL_THRESHOLD,
        }
    }

    /// Overrides the collision band width.
    pub fn with_wall_threshold(mut self, wall_threshold: f64) -> Self {
        self.wall_threshold = wall_threshold;
        self
    }

    pub fn grid(&self) -> &Grid<Cell> {
        &self.grid
    }

    /// Number of cells along each side.
    pub fn size(&self) -> usize {
        self.grid.width()
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn wall_threshold(&self) -> f64 {
        self.wall_threshold
    }

    /// World position of a cell's centre.
    pub fn cell_center(&self, cell: CellCoord) -> Position {
        Position::new(
            cell.x as f64 * self.cell_size + self.cell_size / 2.0,
            cell.z as f64 * self.cell_size + self.cell_size / 2.0,
        )
    }

    /// Signed cell index containing a world position; may fall outside the grid.
    pub fn cell_index(&self, position: Position) -> (i64, i64) {
        (
            (position.x / self.cell_size).floor() as i64,
            (position.z / self.cell_size).floor() as i64,
        )
    }

    /// The cell containing `position`, or `None` when it lies off the map.
    pub fn cell_at(&self, position: Position) -> Option<CellCoord> {
        let (x, z) = self.cell_index(position);
        self.grid
            .contains_signed(x, z)
            .then(|| CellCoord::new(x as usize, z as usize))
    }

    /// Expands the maze into a `(2N+1)` square passage map, `true` meaning open floor.
    ///
    /// Cell `(x, z)` sits at `(2x+1, 2z+1)` and the wall between two cells at
    /// their midpoint.
    pub fn passage_map(&self) -> Grid<bool> {
        let size = self.size();
        let side = 2 * size + 1;
        let mut passages: Grid<bool> = Grid::new(side, side);
        for z in 0..size {
            for x in 0..size {
                let (gx, gz) = (2 * x + 1, 2 * z + 1);
                if let Some(floor) = passages.get_mut(gx, gz) {
                    *floor = true;
                }
                if self.grid.is_open(x, z, Direction::East) {
                    if let Some(gap) = passages.get_mut(gx + 1, gz) {
                        *gap = true;
                    }
                }
                if self.grid.is_open(x, z, Direction::South) {
                    if let Some(gap) = passages.get_mut(gx, gz + 1) {
                        *gap = true;
                    }
                }
            }
        }
        passages
    }

    /// Renders the maze as ASCII art, `#` for walls.
    pub fn to_ascii(&self) -> String {
        let passages = self.passage_map();
        let mut s = String::with_capacity(passages.height() * (passages.width() + 1));
        for gz in 0..passages.height() {
            for gx in 0..passages.width() {
                s.push(if passages.get(gx, gz).copied().unwrap_or(false) {
                    ' '
                } else {
                    '#'
                });
            }
            s.push('\n');
        }
        s
    }
}

/// Output of [`generate_maze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMaze {
    pub maze: Maze,
    pub start: CellCoord,
    pub exit: CellCoord,
}

impl GeneratedMaze {
    pub fn start_position(&self) -> Position {
        self.maze.cell_center(self.start)
    }

    pub fn exit_position(&self) -> Position {
        self.maze.cell_center(self.exit)
    }
}

/// Carves a `size` x `size` perfect maze with an iterative backtracker.
///
/// All randomness is drawn from `rng`, so a seeded generator reproduces the
/// same start, exit and wall layout.
///
/// # Arguments
///
/// * `size`: Cells along each side, from 1 to [`MAX_MAZE_SIZE`].
/// * `cell_size`: World units per cell; must be positive and finite.
/// * `rng`: Source for the start cell and every carving choice.
///
/// # Errors
///
/// Returns [`MazeError::EmptyMaze`], [`MazeError::TooLarge`] or
/// [`MazeError::InvalidCellSize`] for unusable dimensions.
pub fn generate_maze<R: Rng + ?Sized>(
    size: usize,
    cell_size: f64,
    rng: &mut R,
) -> Result<GeneratedMaze, MazeError> {
    if size == 0 {
        return Err(MazeError::EmptyMaze);
    }
    if size > MAX_MAZE_SIZE {
        return Err(MazeError::TooLarge {
            size,
            max: MAX_MAZE_SIZE,
        });
    }
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(MazeError::InvalidCellSize(cell_size));
    }

    let mut grid = create_grid(size);

    let start = CellCoord::new(random_index(rng, size), random_index(rng, size));
    grid[start].visited = true;
    let mut stack = vec![start];

    while let Some(&current) = stack.last() {
        let unvisited: Vec<_> = grid
            .neighbors(current.x, current.z)
            .into_iter()
            .filter(|n| !grid[n.coord].visited)
            .collect();

        if unvisited.is_empty() {
            stack.pop();
            continue;
        }

        let next = unvisited[random_index(rng, unvisited.len())];
        grid.open_wall(current, next.direction)?;
        grid[next.coord].visited = true;
        stack.push(next.coord);
    }

    let exit = farthest_cell(size, start);
    debug!(size, ?start, ?exit, "maze carved");

    Ok(GeneratedMaze {
        maze: Maze::new(grid, cell_size),
        start,
        exit,
    })
}

/// Scans x-major then z, keeping a cell only on a strictly greater distance.
/// Later cells therefore never displace an equally distant earlier one.
fn farthest_cell(size: usize, start: CellCoord) -> CellCoord {
    let mut best = start;
    let mut max_distance = 0;
    for x in 0..size {
        for z in 0..size {
            let cell = CellCoord::new(x, z);
            let distance = cell.manhattan_distance(&start);
            if distance > max_distance {
                max_distance = distance;
                best = cell;
            }
        }
    }
    best
}
