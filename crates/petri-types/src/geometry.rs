//! Two-dimensional vector math.
//!
//! [`Vec2`] doubles as a point and a displacement. Normalizing a zero vector
//! is never attempted: [`Vec2::unit`] returns `None` and callers decide what
//! "no direction" means for them.
//!
//! Arithmetic goes through named methods rather than operator overloads.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A point or displacement in arena coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Vec2 {
    /// The origin / zero displacement.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Unit vector along +x.
    pub const UNIT_X: Self = Self { x: 1.0, y: 0.0 };

    /// Build a vector from its components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Direction of this vector with length 1, or `None` for a zero vector.
    pub fn unit(self) -> Option<Self> {
        let len = self.magnitude();
        if len > 0.0 && len.is_finite() {
            Some(Self::new(self.x / len, self.y / len))
        } else {
            None
        }
    }

    /// Component-wise sum.
    pub const fn plus(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// Component-wise difference.
    pub const fn minus(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Both components multiplied by `factor`.
    pub const fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Distance between two points.
    pub fn distance(self, other: Self) -> f64 {
        self.minus(other).magnitude()
    }

    /// Displacement from `self` to `target`.
    pub const fn to(self, target: Self) -> Self {
        target.minus(self)
    }

    /// Clamp each component into `[min, max]` of the matching axis.
    pub const fn clamp(self, min: Self, max: Self) -> Self {
        Self::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }
}

/// Distance between `(x1, y1)` and `(x2, y2)`.
pub fn distance_between(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    Vec2::new(x1, y1).distance(Vec2::new(x2, y2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn magnitude_of_3_4_is_5() {
        assert!(close(Vec2::new(3.0, 4.0).magnitude(), 5.0));
    }

    #[test]
    fn unit_has_length_one() {
        let u = Vec2::new(-6.0, 8.0).unit();
        assert!(u.is_some_and(|u| close(u.magnitude(), 1.0) && close(u.x, -0.6)));
    }

    #[test]
    fn zero_vector_has_no_unit() {
        assert!(Vec2::ZERO.unit().is_none());
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);
        assert!(close(a.distance(b), 5.0));
        assert!(close(b.distance(a), 5.0));
        assert!(close(distance_between(1.0, 2.0, 4.0, 6.0), 5.0));
    }

    #[test]
    fn clamp_is_per_axis() {
        let p = Vec2::new(-3.0, 500.0).clamp(Vec2::new(15.0, 15.0), Vec2::new(85.0, 385.0));
        assert!(close(p.x, 15.0));
        assert!(close(p.y, 385.0));
    }

    #[test]
    fn component_arithmetic() {
        let a = Vec2::new(1.0, 1.0).plus(Vec2::new(2.0, 3.0).scale(2.0));
        assert!(close(a.x, 5.0) && close(a.y, 7.0));
        let d = Vec2::new(1.0, 1.0).to(Vec2::new(4.0, 5.0));
        assert!(close(d.x, 3.0) && close(d.y, 4.0));
        let m = d.minus(Vec2::new(1.0, 1.0));
        assert!(close(m.x, 2.0) && close(m.y, 3.0));
    }
}
