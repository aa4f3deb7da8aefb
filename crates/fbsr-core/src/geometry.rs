//! Geometry primitives shared by the world model and the renderer.
//!
//! World coordinates are continuous and measured in tiles. Sparse tables
//! (rail nodes, logistics cells, pipes) are addressed by [`GridKey`], an
//! integer pair at tile or half-tile resolution depending on the table.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A continuous 2D coordinate in tile units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by a raw delta.
    pub fn shifted(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

// ---------------------------------------------------------------------------
// GridKey
// ---------------------------------------------------------------------------

/// Integer address of a cell in one of the sparse world tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridKey {
    pub x: i32,
    pub y: i32,
}

impl GridKey {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Rail node key: rail joints sit on the half-tile lattice, so the
    /// position is doubled and rounded.
    pub fn rail(pos: Position) -> Self {
        Self::new((pos.x * 2.0).round() as i32, (pos.y * 2.0).round() as i32)
    }

    /// Logistics cell key: the half-tile cell containing `pos`.
    pub fn half_tile(pos: Position) -> Self {
        Self::new((pos.x * 2.0).floor() as i32, (pos.y * 2.0).floor() as i32)
    }

    /// Whole-tile key containing `pos`.
    pub fn tile(pos: Position) -> Self {
        Self::new(pos.x.floor() as i32, pos.y.floor() as i32)
    }

    /// World position of a rail node key.
    pub fn rail_position(&self) -> Position {
        Position::new(self.x as f64 / 2.0, self.y as f64 / 2.0)
    }

    /// World position of the center of a half-tile logistics cell.
    pub fn cell_center(&self) -> Position {
        Position::new(self.x as f64 / 2.0 + 0.25, self.y as f64 / 2.0 + 0.25)
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle in world units. Zero-sized bounds are valid and
/// describe a single point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from two opposite corners.
    pub fn from_diagonal(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let (min_x, max_x) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (min_y, max_y) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Zero-sized bounds at a point.
    pub fn point(pos: Position) -> Self {
        Self::new(pos.x, pos.y, 0.0, 0.0)
    }

    /// Bounds of a given size centered on `pos`.
    pub fn centered(pos: Position, width: f64, height: f64) -> Self {
        Self::new(pos.x - width / 2.0, pos.y - height / 2.0, width, height)
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Smallest bounds containing both rectangles.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::from_diagonal(
            self.min_x().min(other.min_x()),
            self.min_y().min(other.min_y()),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    /// The same rectangle moved by `offset`.
    pub fn translated(&self, offset: Position) -> Bounds {
        Bounds::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.min_x() && pos.x <= self.max_x() && pos.y >= self.min_y() && pos.y <= self.max_y()
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Eight compass directions, in clockwise order starting at north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// All eight directions in clockwise order.
    pub fn all() -> [Direction; 8] {
        [
            Direction::North,
            Direction::NorthEast,
            Direction::East,
            Direction::SouthEast,
            Direction::South,
            Direction::SouthWest,
            Direction::West,
            Direction::NorthWest,
        ]
    }

    /// The four cardinal directions.
    pub fn cardinals() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Direction {
        Direction::all()[index % 8]
    }

    /// Decode the `direction` field of a blueprint entity. The new format
    /// uses sixteen steps, the legacy format eight.
    pub fn from_entity_value(raw: i64, new_format: bool) -> Direction {
        let steps = if new_format { raw / 2 } else { raw };
        Direction::from_index(steps.rem_euclid(8) as usize)
    }

    /// Rotate by `steps` eighth-turns clockwise (negative is counter-clockwise).
    pub fn turn(self, steps: i32) -> Direction {
        Direction::from_index((self.index() as i32 + steps).rem_euclid(8) as usize)
    }

    pub fn opposite(self) -> Direction {
        self.turn(4)
    }

    /// Quarter turn counter-clockwise.
    pub fn left(self) -> Direction {
        self.turn(-2)
    }

    /// Quarter turn clockwise.
    pub fn right(self) -> Direction {
        self.turn(2)
    }

    pub fn is_cardinal(self) -> bool {
        self.index() % 2 == 0
    }

    /// Index of the cardinal at or counter-clockwise of this direction (0..4).
    pub fn cardinal(self) -> usize {
        self.index() / 2
    }

    /// Unit step on the tile lattice. Diagonals step one tile on both axes.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    /// Translate `pos` by `distance` steps in this direction.
    pub fn offset(self, pos: Position, distance: f64) -> Position {
        let (dx, dy) = self.delta();
        Position::new(pos.x + dx as f64 * distance, pos.y + dy as f64 * distance)
    }

    /// Rotate a vector given in north-facing coordinates to this direction's
    /// cardinal (diagonals round counter-clockwise).
    pub fn rotate_vector(self, v: Position) -> Position {
        match self.cardinal() {
            0 => v,
            1 => Position::new(-v.y, v.x),
            2 => Position::new(-v.x, -v.y),
            _ => Position::new(v.y, -v.x),
        }
    }

    /// Rotate bounds given in north-facing coordinates around the origin.
    pub fn rotate_bounds(self, b: Bounds) -> Bounds {
        match self.cardinal() {
            0 => b,
            1 => Bounds::new(-b.max_y(), b.x, b.height, b.width),
            2 => Bounds::new(-b.max_x(), -b.max_y(), b.width, b.height),
            _ => Bounds::new(b.y, -b.max_x(), b.height, b.width),
        }
    }
}

// ---------------------------------------------------------------------------
// DirectionSet
// ---------------------------------------------------------------------------

/// A compact set of directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all_cardinals() -> Self {
        Self(0b0101_0101)
    }

    pub fn insert(&mut self, dir: Direction) {
        self.0 |= 1 << dir.index();
    }

    pub fn remove(&mut self, dir: Direction) {
        self.0 &= !(1 << dir.index());
    }

    pub fn contains(&self, dir: Direction) -> bool {
        self.0 & (1 << dir.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::all().into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirectionSet::empty();
        for dir in iter {
            set.insert(dir);
        }
        set
    }
}
