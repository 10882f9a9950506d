//! Grid geometry primitives.
//!
//! The warehouse is a 4-connected grid of unit cells. `x` grows to the
//! right and `y` grows upward; headings are the four cardinal directions
//! encoded by their degree values (0/90/180/270).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A cardinal heading, encoded by its degree value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// 0° — toward larger `x`.
    Right,
    /// 90° — toward larger `y`.
    Up,
    /// 180° — toward smaller `x`.
    Left,
    /// 270° — toward smaller `y`.
    Down,
}

impl Direction {
    /// All four headings, in neighbour-expansion order.
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Up,
        Direction::Down,
    ];

    /// Degree encoding used by map and trajectory files.
    pub fn degrees(self) -> u16 {
        match self {
            Direction::Right => 0,
            Direction::Up => 90,
            Direction::Left => 180,
            Direction::Down => 270,
        }
    }

    /// Parses a degree value; only the four cardinal values are legal.
    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Direction::Right),
            90 => Some(Direction::Up),
            180 => Some(Direction::Left),
            270 => Some(Direction::Down),
            _ => None,
        }
    }

    /// Unit step `(dx, dy)` of one move along this heading.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Up => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Down => (0, -1),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

/// Raised when a heading is requested between two non-adjacent cells.
///
/// This is a programmer error: planned paths are adjacency-checked at
/// construction, so a failing derivation means a corrupted path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no cardinal heading from {from} to {to}: cells are not adjacent")]
pub struct NotAdjacentError {
    /// Cell the heading was derived from.
    pub from: Point,
    /// Requested neighbour cell.
    pub to: Point,
}

/// A grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Neighbour toward smaller `x`.
    pub fn left(self) -> Self {
        Self::new(self.x - 1, self.y)
    }

    /// Neighbour toward larger `x`.
    pub fn right(self) -> Self {
        Self::new(self.x + 1, self.y)
    }

    /// Neighbour toward larger `y`.
    pub fn up(self) -> Self {
        Self::new(self.x, self.y + 1)
    }

    /// Neighbour toward smaller `y`.
    pub fn down(self) -> Self {
        Self::new(self.x, self.y - 1)
    }

    /// The four 4-connected neighbours.
    pub fn neighbours(self) -> [Point; 4] {
        [self.left(), self.right(), self.up(), self.down()]
    }

    /// Neighbour along the given heading.
    pub fn neighbour(self, direction: Direction) -> Point {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Whether `other` is 4-connected to this cell.
    pub fn is_neighbour(self, other: Point) -> bool {
        (self.x == other.x && (self.y - other.y).abs() == 1)
            || (self.y == other.y && (self.x - other.x).abs() == 1)
    }

    /// Manhattan distance.
    pub fn manhattan(self, other: Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Heading from this cell to an adjacent one.
    ///
    /// `(1,0) → Right`, `(-1,0) → Left`, `(0,1) → Up`, `(0,-1) → Down`.
    pub fn heading_to(self, neighbour: Point) -> Result<Direction, NotAdjacentError> {
        let dx = neighbour.x - self.x;
        let dy = neighbour.y - self.y;
        match (dx, dy) {
            (1, 0) => Ok(Direction::Right),
            (-1, 0) => Ok(Direction::Left),
            (0, 1) => Ok(Direction::Up),
            (0, -1) => Ok(Direction::Down),
            _ => Err(NotAdjacentError {
                from: self,
                to: neighbour,
            }),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned bounds, `top >= bottom` and `right >= left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Creates a rect from its four edges.
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Whether the point lies inside (edges inclusive).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right
            && point.y >= self.bottom
            && point.y <= self.top
    }
}
