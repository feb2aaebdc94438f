//! Grid geometry: integer cells, rectangular footprints, and facing.
//!
//! The world is a rectangular grid of cells addressed by [`Position`]. The
//! x axis grows east and the y axis grows south, matching screen space.

use serde::{Deserialize, Serialize};

/// An integer grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column, growing east.
    pub x: i32,
    /// Row, growing south.
    pub y: i32,
}

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two cells.
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// The cell offset by `(dx, dy)`, or `None` on overflow.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }

    /// The four orthogonal neighbours in a fixed order (east, west, south, north).
    pub fn neighbors(self) -> impl Iterator<Item = Self> {
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .into_iter()
            .filter_map(move |(dx, dy)| self.offset(dx, dy))
    }

    /// The cell centre as floating point coordinates.
    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// A floating point position used for smooth sub-cell movement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate in cells.
    pub x: f64,
    /// Vertical coordinate in cells.
    pub y: f64,
}

impl Point {
    /// Create a point from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the vector from the origin to this point.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// The size of a rectangular object footprint in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    /// Width in cells (at least 1).
    pub width: u32,
    /// Height in cells (at least 1).
    pub height: u32,
}

impl Footprint {
    /// A single-cell footprint.
    pub const UNIT: Self = Self {
        width: 1,
        height: 1,
    };

    /// Create a footprint, clamping each side to at least one cell.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Every cell covered by this footprint when its top-left corner is at `origin`.
    pub fn cells(self, origin: Position) -> impl Iterator<Item = Position> {
        let width = i32::try_from(self.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.height).unwrap_or(i32::MAX);
        (0..height).flat_map(move |dy| (0..width).filter_map(move |dx| origin.offset(dx, dy)))
    }

    /// Whether `cell` lies inside this footprint placed at `origin`.
    pub fn covers(self, origin: Position, cell: Position) -> bool {
        let dx = i64::from(cell.x).saturating_sub(i64::from(origin.x));
        let dy = i64::from(cell.y).saturating_sub(i64::from(origin.y));
        (0..i64::from(self.width)).contains(&dx) && (0..i64::from(self.height)).contains(&dy)
    }

    /// Manhattan distance from `cell` to the nearest cell of this footprint
    /// placed at `origin` (zero when inside).
    pub fn distance(self, origin: Position, cell: Position) -> u32 {
        let right = i64::from(origin.x)
            .saturating_add(i64::from(self.width))
            .saturating_sub(1);
        let bottom = i64::from(origin.y)
            .saturating_add(i64::from(self.height))
            .saturating_sub(1);
        let dx = axis_gap(i64::from(cell.x), i64::from(origin.x), right);
        let dy = axis_gap(i64::from(cell.y), i64::from(origin.y), bottom);
        u32::try_from(dx.saturating_add(dy)).unwrap_or(u32::MAX)
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::UNIT
    }
}

impl From<(u32, u32)> for Footprint {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

/// Distance from `value` to the closed interval `[low, high]`.
const fn axis_gap(value: i64, low: i64, high: i64) -> i64 {
    if value < low {
        low.saturating_sub(value)
    } else if value > high {
        value.saturating_sub(high)
    } else {
        0
    }
}

/// The direction a character is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards negative y.
    North,
    /// Towards positive y.
    #[default]
    South,
    /// Towards positive x.
    East,
    /// Towards negative x.
    West,
}

impl Direction {
    /// Derive a facing from a movement vector.
    ///
    /// Horizontal movement wins over vertical movement. Returns `None` for
    /// the zero vector.
    pub fn from_vector(dx: f64, dy: f64) -> Option<Self> {
        if dx > 0.0 {
            Some(Self::East)
        } else if dx < 0.0 {
            Some(Self::West)
        } else if dy > 0.0 {
            Some(Self::South)
        } else if dy < 0.0 {
            Some(Self::North)
        } else {
            None
        }
    }

    /// Lowercase name, as used in logs and prompts.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        }
    }
}
