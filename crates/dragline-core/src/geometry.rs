#![forbid(unsafe_code)]

//! Pointer coordinates, displacements and element anchors.
//!
//! All values are in CSS-style pixels (`f64`). The machine never rounds;
//! hosts that work on an integer grid convert at the boundary.

use std::ops::Sub;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A pointer position in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin `(0, 0)`.
    pub const ZERO: Self = Self::new(0.0, 0.0);
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl Sub for Point {
    type Output = Displacement;

    fn sub(self, origin: Self) -> Displacement {
        Displacement::new(self.x - origin.x, self.y - origin.y)
    }
}

// ---------------------------------------------------------------------------
// Displacement
// ---------------------------------------------------------------------------

/// Signed pointer travel relative to some origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Displacement {
    pub dx: f64,
    pub dy: f64,
}

impl Displacement {
    /// No travel.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new displacement.
    #[must_use]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Euclidean length, `sqrt(|dx|² + |dy|²)`.
    #[must_use]
    pub fn length(self) -> f64 {
        self.dx.abs().hypot(self.dy.abs())
    }

    /// Whether the travel reaches `threshold`. Equality counts as reached.
    #[must_use]
    pub fn reaches(self, threshold: f64) -> bool {
        self.length() >= threshold
    }

    /// Whether both components are exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

// ---------------------------------------------------------------------------
// Anchor
// ---------------------------------------------------------------------------

/// Top-left corner of an element's bounding box at drag start.
///
/// The overlay layer positions its copy of the element here and then
/// translates it by the live [`Displacement`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anchor {
    pub top: f64,
    pub left: f64,
}

impl Anchor {
    /// Create a new anchor.
    #[must_use]
    pub const fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }

    /// Whether both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.top.is_finite() && self.left.is_finite()
    }
}
