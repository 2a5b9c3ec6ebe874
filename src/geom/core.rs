use std::ops::Sub;

use serde::Serialize;

// ─────────────────────────────────────────────────────────────────────────────
// Point2
// ─────────────────────────────────────────────────────────────────────────────

/// A planar position in the survey's world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    /// The origin point (0, 0).
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation between two points.
    /// Returns `self * (1 - t) + rhs * t`.
    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        Self::new(self.x + (rhs.x - self.x) * t, self.y + (rhs.y - self.y) * t)
    }

    #[must_use]
    pub fn distance_squared_to(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Sub for Point2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PointSample
// ─────────────────────────────────────────────────────────────────────────────

/// One surveyed point: planar position plus elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PointSample {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar position of the sample.
    #[must_use]
    pub const fn xy(self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BBox2
// ─────────────────────────────────────────────────────────────────────────────

/// Axis-aligned planar bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BBox2 {
    #[must_use]
    pub const fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// Bounding box of the planar positions of `samples`.
    #[must_use]
    pub fn from_samples(samples: &[PointSample]) -> Option<Self> {
        Self::from_iter(samples.iter().map(|s| s.xy()))
    }

    #[must_use]
    pub fn from_points(points: &[Point2]) -> Option<Self> {
        Self::from_iter(points.iter().copied())
    }

    fn from_iter(mut iter: impl Iterator<Item = Point2>) -> Option<Self> {
        let first = iter.next()?;
        let mut min = first;
        let mut max = first;
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self::new(min, max))
    }

    /// Length of the diagonal, used to scale relative tolerances.
    #[must_use]
    pub fn diagonal(self) -> f64 {
        self.min.distance_to(self.max)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Named tolerances used by the triangulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    /// Slack on barycentric coordinates when deciding whether a point lies
    /// inside a triangle. Keeps lattice nodes that sit on hull edges inside.
    pub const BARYCENTRIC: Self = Self {
        eps: 100.0 * f64::EPSILON,
    };

    /// Relative area below which a triangle is treated as degenerate.
    pub const DEGENERATE_AREA: Self = Self { eps: 1e-12 };

    /// Absolute tolerance for a quantity of magnitude `span`.
    #[must_use]
    pub fn relative_to(self, span: f64) -> f64 {
        self.eps * span.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::{BBox2, Point2, PointSample, Tolerance};

    #[test]
    fn bbox_spans_all_samples() {
        let samples = [
            PointSample::new(2.0, -1.0, 0.0),
            PointSample::new(-3.0, 4.0, 1.0),
            PointSample::new(0.5, 0.5, 2.0),
        ];
        let bbox = BBox2::from_samples(&samples).unwrap();
        assert_eq!(bbox.min, Point2::new(-3.0, -1.0));
        assert_eq!(bbox.max, Point2::new(2.0, 4.0));
        assert!((bbox.diagonal() - 50.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn bbox_of_nothing_is_none() {
        assert!(BBox2::from_samples(&[]).is_none());
    }

    #[test]
    fn lerp_hits_endpoints() {
        let a = Point2::new(1.0, 2.0);
        let b = Point2::new(3.0, -2.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Point2::new(2.0, 0.0));
    }

    #[test]
    fn sample_rejects_non_finite() {
        assert!(PointSample::new(0.0, 1.0, 2.0).is_finite());
        assert!(!PointSample::new(f64::NAN, 1.0, 2.0).is_finite());
        assert!(!PointSample::new(0.0, 1.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn tolerance_relative_scales_with_span() {
        let scaled = Tolerance::DEGENERATE_AREA.relative_to(-100.0);
        assert!((scaled - 1e-10).abs() < 1e-24);
    }
}
