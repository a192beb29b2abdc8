use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::CellCoord;

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Coordinates ({x}, {z}) are out of bounds for grid size ({width}, {height})")]
    OutOfBounds {
        x: usize,
        z: usize,
        width: usize,
        height: usize,
    },
}

/// A generic 2D grid structure.
///
/// Stores elements of type `T` in a flat vector using row-major order, with
/// `z` selecting the row and `x` the column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Converts (x, z) coordinates to a flat vector index.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    #[inline]
    pub fn coords_to_index(&self, x: usize, z: usize) -> Option<usize> {
        if self.is_valid(x, z) {
            Some(z * self.width + x)
        } else {
            None
        }
    }

    /// Checks if the given coordinates are within the grid boundaries.
    #[inline]
    pub fn is_valid(&self, x: usize, z: usize) -> bool {
        x < self.width && z < self.height
    }

    /// Same as [`Grid::is_valid`] for signed coordinates, which continuous
    /// positions produce when they drift past the map edge.
    #[inline]
    pub fn contains_signed(&self, x: i64, z: i64) -> bool {
        x >= 0 && z >= 0 && self.is_valid(x as usize, z as usize)
    }

    /// Gets an immutable reference to the cell at the given coordinates.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get(&self, x: usize, z: usize) -> Option<&T> {
        let index = self.coords_to_index(x, z)?;
        self.cells.get(index)
    }

    /// Gets a mutable reference to the cell at the given coordinates.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get_mut(&mut self, x: usize, z: usize) -> Option<&mut T> {
        let index = self.coords_to_index(x, z)?;
        self.cells.get_mut(index)
    }

    /// Like [`Grid::get_mut`], but reports the offending coordinates.
    pub fn try_get_mut(&mut self, x: usize, z: usize) -> Result<&mut T, GridError> {
        let (width, height) = (self.width, self.height);
        self.get_mut(x, z).ok_or(GridError::OutOfBounds {
            x,
            z,
            width,
            height,
        })
    }

    /// Returns an iterator over the cells of the grid in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }
}

impl<T> Index<CellCoord> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: CellCoord) -> &Self::Output {
        match self.coords_to_index(index.x, index.z) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                index.x, index.z, self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<CellCoord> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, index: CellCoord) -> &mut Self::Output {
        let width = self.width;
        let height = self.height;
        match self.coords_to_index(index.x, index.z) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                index.x, index.z, width, height
            ),
        }
    }
}

/// One maze cell.
///
/// Only the north and east walls are stored. A cell's south wall is its
/// southern neighbour's north wall and its west wall is its western
/// neighbour's east wall. The outer south and west edges are never stored;
/// bounds checks imply them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub north_wall: bool,
    pub east_wall: bool,
    /// Only meaningful while the maze is being carved.
    pub visited: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            north_wall: true,
            east_wall: true,
            visited: false,
        }
    }
}

/// Cardinal directions in grid space. North is towards lower `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

/// An in-bounds neighbour of a cell, with the direction taken to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub coord: CellCoord,
    pub direction: Direction,
}

/// Creates a `size` x `size` grid with every wall standing and no cell visited.
pub fn create_grid(size: usize) -> Grid<Cell> {
    Grid::new(size, size)
}

impl Grid<Cell> {
    /// Returns the in-bounds neighbours of `(x, z)` in north, east, south, west order.
    ///
    /// Out-of-bounds origins simply have no neighbours.
    pub fn neighbors(&self, x: usize, z: usize) -> Vec<Neighbor> {
        if !self.is_valid(x, z) {
            return Vec::new();
        }

        let candidates = [
            (z.checked_sub(1).map(|nz| (x, nz)), Direction::North),
            (Some((x + 1, z)), Direction::East),
            (Some((x, z + 1)), Direction::South),
            (x.checked_sub(1).map(|nx| (nx, z)), Direction::West),
        ];

        candidates
            .into_iter()
            .filter_map(|(coords, direction)| {
                let (nx, nz) = coords?;
                self.is_valid(nx, nz).then_some(Neighbor {
                    coord: CellCoord::new(nx, nz),
                    direction,
                })
            })
            .collect()
    }

    /// Removes the wall between `from` and its neighbour in `direction`.
    ///
    /// The wall is cleared on whichever cell of the pair stores it.
    pub fn open_wall(&mut self, from: CellCoord, direction: Direction) -> Result<(), GridError> {
        let out_of_bounds = GridError::OutOfBounds {
            x: from.x,
            z: from.z,
            width: self.width,
            height: self.height,
        };
        match direction {
            Direction::North => {
                self.try_get_mut(from.x, from.z)?;
                if from.z == 0 {
                    return Err(out_of_bounds);
                }
                self.try_get_mut(from.x, from.z)?.north_wall = false;
            }
            Direction::South => {
                self.try_get_mut(from.x, from.z + 1)?.north_wall = false;
            }
            Direction::East => {
                self.try_get_mut(from.x + 1, from.z)?;
                self.try_get_mut(from.x, from.z)?.east_wall = false;
            }
            Direction::West => {
                self.try_get_mut(from.x, from.z)?;
                if from.x == 0 {
                    return Err(out_of_bounds);
                }
                self.try_get_mut(from.x - 1, from.z)?.east_wall = false;
            }
        }
        Ok(())
    }

    /// Whether the passage from `(x, z)` towards `direction` is open.
    ///
    /// The outer boundary and out-of-bounds cells are always closed.
    pub fn is_open(&self, x: usize, z: usize, direction: Direction) -> bool {
        if !self.is_valid(x, z) {
            return false;
        }
        match direction {
            Direction::North => z > 0 && !self[CellCoord::new(x, z)].north_wall,
            Direction::South => self.get(x, z + 1).is_some_and(|cell| !cell.north_wall),
            Direction::East => self.is_valid(x + 1, z) && !self[CellCoord::new(x, z)].east_wall,
            Direction::West => x > 0 && !self[CellCoord::new(x - 1, z)].east_wall,
        }
    }

    /// Counts the interior walls that have been carved away.
    pub fn open_passage_count(&self) -> usize {
        let mut count = 0;
        for z in 0..self.height {
            for x in 0..self.width {
                if self.is_open(x, z, Direction::North) {
                    count += 1;
                }
                if self.is_open(x, z, Direction::East) {
                    count += 1;
                }
            }
        }
        count
    }
}
