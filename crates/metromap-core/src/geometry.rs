//! Geometric primitives for map coordinates.
//!
//! This module provides the point and reflection types used by the solver
//! and the curve synthesizer.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in map space
//! - [`Reflection`] - A mirror transform across a line or the axes
//!
//! # Coordinate System
//!
//! Map coordinates follow the screen convention used by the renderer:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! "Up" on the map therefore means decreasing Y.

use serde::Deserialize;

/// A 2D point in map coordinate space.
///
/// Points use `f64` coordinates. Solved station positions and synthesized
/// control points are always integral; see [`Point::round`].
///
/// # Examples
///
/// ```
/// # use metromap_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(4.0, 6.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum, Point::new(14.0, 26.0));
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid, Point::new(7.0, 13.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Creates a point from integer coordinates
    pub fn from_grid(x: i64, y: i64) -> Self {
        Self {
            x: x as f64,
            y: y as f64,
        }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f64 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f64 {
        self.y
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Multiplies both coordinates by the given factor
    pub fn scale(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Dot product, treating both points as vectors
    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Calculates the hypotenuse (Euclidean distance from origin)
    pub fn hypot(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance between two points
    pub fn distance(self, other: Point) -> f64 {
        self.sub_point(other).hypot()
    }

    /// Rounds both coordinates to the nearest integer.
    ///
    /// Ties round away from zero, so `-2.5` becomes `-3` and `2.5` becomes `3`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use metromap_core::geometry::Point;
    /// let p = Point::new(2.5, -2.5).round();
    /// assert_eq!(p, Point::new(3.0, -3.0));
    /// ```
    pub fn round(self) -> Self {
        Self {
            x: self.x.round(),
            y: self.y.round(),
        }
    }

    /// Returns the coordinates as integers. Callers are expected to have
    /// rounded the point already.
    pub fn to_grid(self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}

/// A mirror transform in map space.
///
/// Every variant is an involution: applying the same reflection twice
/// returns the original point (up to floating point error).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reflection {
    /// Across the line through `through` and `toward`.
    Line { through: Point, toward: Point },

    /// Across the vertical line `x = c`.
    FlipX(f64),

    /// Across the horizontal line `y = c`.
    FlipY(f64),

    /// Across both `x = cx` and `y = cy`, i.e. a half turn around `(cx, cy)`.
    FlipXY { cx: f64, cy: f64 },
}

impl Reflection {
    /// Reflection across the 45° line through `origin` running down and to
    /// the right. It swaps the X and Y offsets relative to `origin`.
    pub fn diagonal_through(origin: Point) -> Self {
        Self::Line {
            through: origin,
            toward: origin.add_point(Point::new(1.0, 1.0)),
        }
    }

    /// Applies the reflection to a point.
    ///
    /// # Examples
    ///
    /// ```
    /// # use metromap_core::geometry::{Point, Reflection};
    /// let origin = Point::new(10.0, 10.0);
    /// let p = Point::new(30.0, 15.0);
    ///
    /// assert_eq!(Reflection::FlipY(10.0).apply(p), Point::new(30.0, 5.0));
    /// assert_eq!(Reflection::diagonal_through(origin).apply(p), Point::new(15.0, 30.0));
    /// ```
    pub fn apply(self, point: Point) -> Point {
        match self {
            Self::Line { through, toward } => {
                // Q' = Q + 2 (I - n n^T)(P - Q), with n along the mirror line.
                let direction = toward.sub_point(through);
                let to_line = through.sub_point(point);
                let along = direction.scale(to_line.dot(direction) / direction.dot(direction));
                let perpendicular = to_line.sub_point(along);
                point.add_point(perpendicular.scale(2.0))
            }
            Self::FlipX(c) => Point::new(2.0 * c - point.x, point.y),
            Self::FlipY(c) => Point::new(point.x, 2.0 * c - point.y),
            Self::FlipXY { cx, cy } => Point::new(2.0 * cx - point.x, 2.0 * cy - point.y),
        }
    }
}
