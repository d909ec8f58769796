//! Tile grid and the position index of placed entities.
//!
//! The grid owns one [`Tile`] per cell and a `BTreeMap` from position to the
//! entities standing there. A tile's occupancy flag is only written by
//! [`Grid::place`], which keeps it equal to "index has an entry here".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::rng::SimRng;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A position on the 2D grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent position in `direction`. May lie outside the grid.
    pub fn step(self, direction: Direction) -> Position {
        let (dx, dy) = direction.offset();
        Position::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    West,
    South,
    North,
}

impl Direction {
    /// Neighbor scan order: +x, -x, +y, -y.
    pub const SCAN_ORDER: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::South,
        Direction::North,
    ];

    /// Offset for this direction. +y points south.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::South => (0, 1),
            Direction::North => (0, -1),
        }
    }
}

/// Cosmetic ground type. Has no effect on the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Plains,
    Forest,
    Mountain,
    Water,
    Fertile,
}

impl Terrain {
    const ALL: [Terrain; 5] = [
        Terrain::Plains,
        Terrain::Forest,
        Terrain::Mountain,
        Terrain::Water,
        Terrain::Fertile,
    ];
    const WEIGHTS: [u32; 5] = [5, 2, 2, 1, 1];

    fn roll(rng: &mut SimRng) -> Terrain {
        rng.weighted_index(&Self::WEIGHTS)
            .map_or(Terrain::Plains, |i| Self::ALL[i])
    }
}

/// One grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub position: Position,
    pub terrain: Terrain,
    occupied: bool,
}

impl Tile {
    pub fn is_occupied(&self) -> bool {
        self.occupied
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GridError {
    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    /// Row-major.
    tiles: Vec<Tile>,
    occupants: BTreeMap<Position, Vec<EntityId>>,
}

impl Grid {
    /// Build an empty `width` x `height` grid with randomized terrain.
    pub fn generate(width: u32, height: u32, rng: &mut SimRng) -> Self {
        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                tiles.push(Tile {
                    position: Position::new(x, y),
                    terrain: Terrain::roll(rng),
                    occupied: false,
                });
            }
        }
        Self {
            width,
            height,
            tiles,
            occupants: BTreeMap::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn tile_index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.width as usize + pos.x as usize)
    }

    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.tile_index(pos).map(|i| &self.tiles[i])
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Record `entity` as standing on `pos` and mark the tile occupied.
    pub fn place(&mut self, pos: Position, entity: EntityId) -> Result<(), GridError> {
        let index = self.tile_index(pos).ok_or(GridError::OutOfBounds(pos))?;
        self.occupants.entry(pos).or_default().push(entity);
        self.tiles[index].occupied = true;
        Ok(())
    }

    /// Entities on `pos`, in placement order.
    pub fn entities_at(&self, pos: Position) -> &[EntityId] {
        self.occupants.get(&pos).map_or(&[], Vec::as_slice)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.tile(pos).is_some_and(Tile::is_occupied)
    }

    /// In-bounds orthogonal neighbors of `pos`, in scan order.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = (Direction, Position)> + '_ {
        Direction::SCAN_ORDER
            .into_iter()
            .map(move |d| (d, pos.step(d)))
            .filter(|(_, p)| self.in_bounds(*p))
    }
}
