//! Geometric primitives for pedigree layout and positioning.
//!
//! - [`Point`] - A 2D coordinate in layout space
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//!
//! # Coordinate System
//!
//! The layout uses a coordinate system consistent with SVG and canvas
//! renderers:
//!
//! ```text
//!   (0,0) ────────► +X   (order within a generation)
//!     │
//!     │
//!     ▼
//!    +Y                  (generations, oldest at the top)
//! ```

use serde::Serialize;

/// A 2D point representing a position in layout coordinate space.
///
/// # Examples
///
/// ```
/// # use pedigree_core::geometry::Point;
/// let sire = Point::new(0.0, 160.0);
/// let dam = Point::new(180.0, 160.0);
///
/// let junction = sire.midpoint(dam);
/// assert_eq!(junction.x(), 90.0);
/// assert_eq!(junction.y(), 160.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Returns the point halfway between this point and `other`.
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Returns true when both coordinates have the same bit pattern.
    ///
    /// Used to verify that re-running a layout pass left a coordinate untouched.
    pub fn bitwise_eq(self, other: Point) -> bool {
        self.x.to_bits() == other.x.to_bits() && self.y.to_bits() == other.y.to_bits()
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Smallest bounds enclosing all `points`, or `None` for an empty iterator.
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points.into_iter().fold(None, |bounds, point| {
            Some(match bounds {
                None => Self {
                    min_x: point.x,
                    min_y: point.y,
                    max_x: point.x,
                    max_y: point.y,
                },
                Some(bounds) => Self {
                    min_x: bounds.min_x.min(point.x),
                    min_y: bounds.min_y.min(point.y),
                    max_x: bounds.max_x.max(point.x),
                    max_y: bounds.max_y.max(point.y),
                },
            })
        })
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }
}
