//! Built-in entity factories.

pub mod belt;
pub mod container;
pub mod crafting;
pub mod inserter;
pub mod pipe;
pub mod rail;
pub mod signal;
pub mod storage_tank;
pub mod train_stop;
pub mod underground_belt;

use fbsr_core::geometry::{Bounds, Direction, Position};

/// The four half-tile logistics cells of a tile, named relative to a
/// direction of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileCells {
    pub back_left: Position,
    pub back_right: Position,
    pub front_left: Position,
    pub front_right: Position,
}

impl TileCells {
    pub fn new(center: Position, travel: Direction) -> Self {
        let front = travel.offset(center, 0.25);
        let back = travel.opposite().offset(center, 0.25);
        let left = travel.left();
        let right = travel.right();
        Self {
            back_left: left.offset(back, 0.25),
            back_right: right.offset(back, 0.25),
            front_left: left.offset(front, 0.25),
            front_right: right.offset(front, 0.25),
        }
    }

    pub fn all(&self) -> [Position; 4] {
        [self.back_left, self.back_right, self.front_left, self.front_right]
    }

    pub fn back(&self) -> [Position; 2] {
        [self.back_left, self.back_right]
    }

    pub fn front(&self) -> [Position; 2] {
        [self.front_left, self.front_right]
    }
}

/// Centres of the half-tile cells covered by an entity footprint. The
/// bounds are snapped to the half-tile lattice first, so slightly inset
/// selection boxes still cover their whole tiles.
pub fn footprint_cells(bounds: Bounds) -> Vec<Position> {
    let snap = |v: f64| (v * 2.0).round() / 2.0;
    let (x0, x1) = (snap(bounds.min_x()), snap(bounds.max_x()));
    let (y0, y1) = (snap(bounds.min_y()), snap(bounds.max_y()));
    let mut cells = Vec::new();
    let mut y = y0 + 0.25;
    while y < y1 {
        let mut x = x0 + 0.25;
        while x < x1 {
            cells.push(Position::new(x, y));
            x += 0.5;
        }
        y += 0.5;
    }
    cells
}

/// Sprite key fragment for a facing.
pub fn direction_key(dir: Direction) -> &'static str {
    match dir {
        Direction::North => "north",
        Direction::NorthEast => "north-east",
        Direction::East => "east",
        Direction::SouthEast => "south-east",
        Direction::South => "south",
        Direction::SouthWest => "south-west",
        Direction::West => "west",
        Direction::NorthWest => "north-west",
    }
}
