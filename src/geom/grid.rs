//! Regular sampling lattice for the fitted surface.

use super::core::{BBox2, Point2};
use super::interpolate::CloughTocherInterpolator;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Lattice side length used when the caller does not specify one.
pub const DEFAULT_RESOLUTION: usize = 200;

/// Largest accepted lattice side length (about 4M nodes).
pub const MAX_RESOLUTION: usize = 2048;

/// `n` evenly spaced values from `start` to `stop` inclusive.
///
/// The last value is exactly `stop`, so the lattice always lands on the
/// bounding box edges.
#[must_use]
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = stop;
            values
        }
    }
}

/// Elevations sampled on a regular lattice.
///
/// Values are stored row-major (row = y index). Undefined nodes, outside
/// the convex hull of the survey, hold NaN internally and surface as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    xs: Vec<f64>,
    ys: Vec<f64>,
    values: Vec<f64>,
}

impl Grid {
    /// Builds a grid by evaluating `f` at every node. `None` marks the node
    /// undefined.
    #[must_use]
    pub fn from_fn(xs: Vec<f64>, ys: Vec<f64>, mut f: impl FnMut(f64, f64) -> Option<f64>) -> Self {
        let mut values = Vec::with_capacity(xs.len() * ys.len());
        for &y in &ys {
            for &x in &xs {
                values.push(f(x, y).filter(|v| v.is_finite()).unwrap_or(f64::NAN));
            }
        }
        Self { xs, ys, values }
    }

    /// Number of nodes along x.
    #[must_use]
    pub fn nx(&self) -> usize {
        self.xs.len()
    }

    /// Number of nodes along y.
    #[must_use]
    pub fn ny(&self) -> usize {
        self.ys.len()
    }

    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    #[must_use]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Elevation at column `i`, row `j`.
    #[must_use]
    pub fn value(&self, i: usize, j: usize) -> Option<f64> {
        let v = self.raw_value(i, j);
        (!v.is_nan()).then_some(v)
    }

    /// Elevation at column `i`, row `j` with NaN for undefined nodes.
    #[must_use]
    pub fn raw_value(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.xs.len() + i]
    }

    /// World position of node `(i, j)`.
    #[must_use]
    pub fn position(&self, i: usize, j: usize) -> Point2 {
        Point2::new(self.xs[i], self.ys[j])
    }

    #[must_use]
    pub fn undefined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.values.len()
    }

    /// `(min, max)` over defined nodes, or `None` when every node is undefined.
    #[must_use]
    pub fn defined_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Samples `interpolator` on a lattice over `bbox`.
#[must_use]
pub fn sample_grid(interpolator: &CloughTocherInterpolator, bbox: BBox2, resolution: usize) -> Grid {
    let xs = linspace(bbox.min.x, bbox.max.x, resolution);
    let ys = linspace(bbox.min.y, bbox.max.y, resolution);
    let nx = xs.len();
    let mut values = vec![f64::NAN; nx * ys.len()];

    if !interpolator.is_degenerate() && nx > 0 {
        // Every row restarts its walk from no hint, so serial and parallel
        // sampling produce identical bits.
        let fill_row = |(j, row): (usize, &mut [f64])| {
            let y = ys[j];
            let mut hint = None;
            for (i, slot) in row.iter_mut().enumerate() {
                if let Some(z) = interpolator.evaluate_with_hint(Point2::new(xs[i], y), &mut hint) {
                    *slot = z;
                }
            }
        };

        #[cfg(feature = "parallel")]
        values.par_chunks_mut(nx).enumerate().for_each(fill_row);

        #[cfg(not(feature = "parallel"))]
        values.chunks_mut(nx).enumerate().for_each(fill_row);
    }

    let grid = Grid { xs, ys, values };
    log::debug!(
        "sampled {}x{} grid, {} undefined nodes",
        grid.nx(),
        grid.ny(),
        grid.undefined_count()
    );
    grid
}

#[cfg(test)]
mod tests {
    use super::{Grid, linspace};
    use crate::geom::core::PointSample;
    use crate::geom::interpolate::InterpolationOptions;
    use crate::geom::tests::interpolate_grid;

    #[test]
    fn linspace_hits_both_ends() {
        let values = linspace(-1.0, 2.0, 4);
        assert_eq!(values, vec![-1.0, 0.0, 1.0, 2.0]);

        let odd = linspace(0.1, 0.7, 7);
        assert_eq!(odd.first(), Some(&0.1));
        assert_eq!(odd.last(), Some(&0.7));
        assert!(odd.windows(2).all(|w| w[0] < w[1]));

        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 5.0, 1), vec![3.0]);
    }

    #[test]
    fn defined_range_skips_undefined_nodes() {
        let grid = Grid::from_fn(vec![0.0, 1.0, 2.0], vec![0.0, 1.0], |x, y| {
            (x < 2.0).then_some(x + 10.0 * y)
        });
        assert_eq!(grid.undefined_count(), 2);
        assert_eq!(grid.defined_range(), Some((0.0, 11.0)));
        assert_eq!(grid.value(2, 0), None);
        assert_eq!(grid.value(1, 1), Some(11.0));
    }

    #[test]
    fn all_undefined_grid_has_no_range() {
        let grid = Grid::from_fn(vec![0.0, 1.0], vec![0.0, 1.0], |_, _| None);
        assert_eq!(grid.defined_range(), None);
        assert_eq!(grid.undefined_count(), 4);
    }

    #[test]
    fn square_survey_fills_the_whole_lattice() {
        let samples = [
            PointSample::new(0.0, 0.0, 0.0),
            PointSample::new(1.0, 0.0, 1.0),
            PointSample::new(0.0, 1.0, 1.0),
            PointSample::new(1.0, 1.0, 2.0),
        ];
        let (grid, _) = interpolate_grid(&samples, 21, InterpolationOptions::default());
        assert_eq!(grid.nx(), 21);
        assert_eq!(grid.ny(), 21);
        assert_eq!(grid.undefined_count(), 0);

        let (lo, hi) = grid.defined_range().unwrap();
        assert!(lo.abs() < 1e-5);
        assert!((hi - 2.0).abs() < 1e-5);
    }

    #[test]
    fn triangle_survey_leaves_corner_undefined() {
        let samples = [
            PointSample::new(0.0, 0.0, 0.0),
            PointSample::new(1.0, 0.0, 1.0),
            PointSample::new(0.0, 1.0, 1.0),
            PointSample::new(0.2, 0.2, 0.5),
        ];
        let (grid, _) = interpolate_grid(&samples, 11, InterpolationOptions::default());
        assert!(grid.value(10, 10).is_none());
        assert!(grid.value(0, 0).is_some());
        assert!(grid.undefined_count() > 0);
    }
}
