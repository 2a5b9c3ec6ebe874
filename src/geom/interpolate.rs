//! Scattered-data surface fitting.
//!
//! Fits a C1-continuous piecewise cubic (Clough–Tocher) surface over the
//! Delaunay triangulation of the survey positions. Vertex gradients are
//! estimated globally by minimising the curvature of the edge cubics, and
//! each triangle is evaluated through its Bernstein–Bézier control net.
//!
//! The surface passes exactly through every input elevation and is
//! undefined outside the convex hull of the input positions.

use std::collections::HashMap;

use super::core::{Point2, PointSample};
use super::triangulation::{Barycentric, Triangulation, TriangulationDiagnostics};

// ============================================================================
// Options
// ============================================================================

/// Options for the Clough–Tocher fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationOptions {
    /// Largest relative gradient update at which the estimation stops.
    pub gradient_tolerance: f64,

    /// Upper bound on global gradient sweeps.
    pub max_gradient_iterations: usize,
}

impl Default for InterpolationOptions {
    fn default() -> Self {
        Self {
            gradient_tolerance: 1e-6,
            max_gradient_iterations: 400,
        }
    }
}

impl InterpolationOptions {
    #[must_use]
    pub fn with_gradient_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_max_gradient_iterations(mut self, iterations: usize) -> Self {
        self.max_gradient_iterations = iterations.max(1);
        self
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Diagnostics from fitting the surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpolationDiagnostics {
    /// Number of input samples.
    pub input_point_count: usize,

    /// Number of distinct planar positions after merging coincident samples.
    pub distinct_point_count: usize,

    pub triangulation: TriangulationDiagnostics,

    /// Global gradient sweeps performed.
    pub gradient_iterations: usize,

    /// Whether the gradient estimation met its tolerance.
    pub gradient_converged: bool,

    pub warnings: Vec<String>,
}

// ============================================================================
// Interpolator
// ============================================================================

/// A fitted Clough–Tocher surface.
#[derive(Debug, Clone)]
pub struct CloughTocherInterpolator {
    triangulation: Triangulation,
    values: Vec<f64>,
    gradients: Vec<[f64; 2]>,
    diagnostics: InterpolationDiagnostics,
}

impl CloughTocherInterpolator {
    /// Fits a surface through `samples`.
    ///
    /// Samples sharing a planar position are merged into one node carrying
    /// their mean elevation. Collinear or coincident input produces an
    /// interpolator that is undefined everywhere.
    #[must_use]
    pub fn fit(samples: &[PointSample], options: InterpolationOptions) -> Self {
        let mut diagnostics = InterpolationDiagnostics {
            input_point_count: samples.len(),
            ..Default::default()
        };

        let (positions, values) = merge_coincident(samples);
        diagnostics.distinct_point_count = positions.len();
        let merged = samples.len() - positions.len();
        if merged > 0 {
            log::warn!("merged {merged} samples sharing a planar position");
            diagnostics
                .warnings
                .push(format!("{merged} coincident samples merged by mean elevation"));
        }

        let triangulation = Triangulation::new(positions);
        diagnostics.triangulation = triangulation.diagnostics().clone();
        if triangulation.is_empty() {
            log::warn!("input positions are collinear or coincident; surface is undefined");
            diagnostics
                .warnings
                .push("no triangles: input positions are collinear or coincident".to_owned());
        }

        let estimate = estimate_gradients(&triangulation, &values, options);
        diagnostics.gradient_iterations = estimate.iterations;
        diagnostics.gradient_converged = estimate.converged;
        if !estimate.converged && !triangulation.is_empty() {
            log::warn!(
                "gradient estimation stopped after {} sweeps without converging",
                estimate.iterations
            );
            diagnostics.warnings.push(format!(
                "gradient estimation hit the {}-sweep cap",
                options.max_gradient_iterations
            ));
        }

        log::debug!(
            "fitted Clough-Tocher surface: {} nodes, {} triangles, {} gradient sweeps",
            diagnostics.distinct_point_count,
            diagnostics.triangulation.triangle_count,
            diagnostics.gradient_iterations
        );

        Self {
            triangulation,
            values,
            gradients: estimate.gradients,
            diagnostics,
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> &InterpolationDiagnostics {
        &self.diagnostics
    }

    #[must_use]
    pub fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    /// Estimated gradient at each distinct node.
    #[must_use]
    pub fn gradients(&self) -> &[[f64; 2]] {
        &self.gradients
    }

    /// `true` when the surface is undefined everywhere.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.triangulation.is_empty()
    }

    /// Surface elevation at `p`, or `None` outside the convex hull.
    #[must_use]
    pub fn evaluate(&self, p: Point2) -> Option<f64> {
        let mut hint = None;
        self.evaluate_with_hint(p, &mut hint)
    }

    /// Like [`evaluate`](Self::evaluate) but starts the point location at
    /// `hint` and stores the containing triangle back into it. Scanning a
    /// lattice row with one hint keeps the walk short.
    pub fn evaluate_with_hint(&self, p: Point2, hint: &mut Option<usize>) -> Option<f64> {
        let (triangle, bary) = self.triangulation.locate(p, *hint)?;
        *hint = Some(triangle);
        let points = self.triangulation.points();
        if let Some(&v) = self.triangulation.triangles()[triangle]
            .iter()
            .find(|&&v| points[v] == p)
        {
            return Some(self.values[v]);
        }
        let value = self.evaluate_in_triangle(triangle, bary);
        value.is_finite().then_some(value)
    }

    #[allow(clippy::many_single_char_names, clippy::similar_names)]
    fn evaluate_in_triangle(&self, triangle: usize, b: Barycentric) -> f64 {
        let tri = &self.triangulation;
        let [i0, i1, i2] = tri.triangles()[triangle];
        let points = tri.points();
        let (p0, p1, p2) = (points[i0], points[i1], points[i2]);

        let f1 = self.values[i0];
        let f2 = self.values[i1];
        let f3 = self.values[i2];
        let g1 = self.gradients[i0];
        let g2 = self.gradients[i1];
        let g3 = self.gradients[i2];

        let e12 = p1 - p0;
        let e23 = p2 - p1;
        let e31 = p0 - p2;
        let dot = |g: [f64; 2], e: Point2| g[0] * e.x + g[1] * e.y;

        let df12 = dot(g1, e12);
        let df21 = -dot(g2, e12);
        let df23 = dot(g2, e23);
        let df32 = -dot(g3, e23);
        let df31 = dot(g3, e31);
        let df13 = -dot(g1, e31);

        // Edge control points from vertex values and directional derivatives.
        let c3000 = f1;
        let c2100 = (df12 + 3.0 * c3000) / 3.0;
        let c2010 = (df13 + 3.0 * c3000) / 3.0;
        let c0300 = f2;
        let c1200 = (df21 + 3.0 * c0300) / 3.0;
        let c0210 = (df23 + 3.0 * c0300) / 3.0;
        let c0030 = f3;
        let c1020 = (df31 + 3.0 * c0030) / 3.0;
        let c0120 = (df32 + 3.0 * c0030) / 3.0;

        let c2001 = (c2100 + c2010 + c3000) / 3.0;
        let c0201 = (c1200 + c0300 + c0210) / 3.0;
        let c0021 = (c1020 + c0120 + c0030) / 3.0;

        // Cross-boundary continuity weights, one per edge.
        let mut g = [-0.5; 3];
        let neighbors = tri.neighbors(triangle);
        for (k, neighbor) in neighbors.iter().enumerate() {
            let Some(neighbor) = *neighbor else {
                continue;
            };
            let Some(c) = tri.barycentric(triangle, tri.centroid(neighbor)) else {
                continue;
            };
            let weight = match k {
                0 => (2.0 * c[2] + c[1] - 1.0) / (2.0 - 3.0 * c[2] - 3.0 * c[1]),
                1 => (2.0 * c[0] + c[2] - 1.0) / (2.0 - 3.0 * c[0] - 3.0 * c[2]),
                _ => (2.0 * c[1] + c[0] - 1.0) / (2.0 - 3.0 * c[1] - 3.0 * c[0]),
            };
            if weight.is_finite() {
                g[k] = weight;
            }
        }

        let c0111 = (g[0] * (-c0300 + 3.0 * c0210 - 3.0 * c0120 + c0030)
            + (-c0300 + 2.0 * c0210 - c0120 + c0021 + c0201))
            / 2.0;
        let c1011 = (g[1] * (-c0030 + 3.0 * c1020 - 3.0 * c2010 + c3000)
            + (-c0030 + 2.0 * c1020 - c2010 + c2001 + c0021))
            / 2.0;
        let c1101 = (g[2] * (-c3000 + 3.0 * c2100 - 3.0 * c1200 + c0300)
            + (-c3000 + 2.0 * c2100 - c1200 + c2001 + c0201))
            / 2.0;

        let c1002 = (c1101 + c1011 + c2001) / 3.0;
        let c0102 = (c1101 + c0111 + c0201) / 3.0;
        let c0012 = (c1011 + c0111 + c0021) / 3.0;

        let c0003 = (c1002 + c0102 + c0012) / 3.0;

        // Barycentric coordinates within the Clough-Tocher sub-triangle.
        let minval = b[0].min(b[1]).min(b[2]);
        let b1 = b[0] - minval;
        let b2 = b[1] - minval;
        let b3 = b[2] - minval;
        let b4 = 3.0 * minval;

        if b1 == 0.0 {
            b2.powi(3) * c0300
                + 3.0 * b2 * b2 * b3 * c0210
                + 3.0 * b2 * b3 * b3 * c0120
                + b3.powi(3) * c0030
                + 3.0 * b2 * b2 * b4 * c0201
                + 6.0 * b2 * b3 * b4 * c0111
                + 3.0 * b3 * b3 * b4 * c0021
                + 3.0 * b2 * b4 * b4 * c0102
                + 3.0 * b3 * b4 * b4 * c0012
                + b4.powi(3) * c0003
        } else if b2 == 0.0 {
            b1.powi(3) * c3000
                + 3.0 * b1 * b1 * b3 * c2010
                + 3.0 * b1 * b3 * b3 * c1020
                + b3.powi(3) * c0030
                + 3.0 * b1 * b1 * b4 * c2001
                + 6.0 * b1 * b3 * b4 * c1011
                + 3.0 * b3 * b3 * b4 * c0021
                + 3.0 * b1 * b4 * b4 * c1002
                + 3.0 * b3 * b4 * b4 * c0012
                + b4.powi(3) * c0003
        } else {
            b1.powi(3) * c3000
                + 3.0 * b1 * b1 * b2 * c2100
                + 3.0 * b1 * b2 * b2 * c1200
                + b2.powi(3) * c0300
                + 3.0 * b1 * b1 * b4 * c2001
                + 6.0 * b1 * b2 * b4 * c1101
                + 3.0 * b2 * b2 * b4 * c0201
                + 3.0 * b1 * b4 * b4 * c1002
                + 3.0 * b2 * b4 * b4 * c0102
                + b4.powi(3) * c0003
        }
    }
}

/// Collapses samples with identical planar positions, keeping first-seen
/// order and averaging their elevations.
fn merge_coincident(samples: &[PointSample]) -> (Vec<Point2>, Vec<f64>) {
    let mut index_of: HashMap<(u64, u64), usize> = HashMap::with_capacity(samples.len());
    let mut positions = Vec::with_capacity(samples.len());
    let mut sums: Vec<(f64, usize)> = Vec::with_capacity(samples.len());

    for sample in samples {
        // `+ 0.0` folds -0.0 into 0.0 so both hash alike.
        let key = ((sample.x + 0.0).to_bits(), (sample.y + 0.0).to_bits());
        match index_of.get(&key) {
            Some(&idx) => {
                sums[idx].0 += sample.z;
                sums[idx].1 += 1;
            }
            None => {
                index_of.insert(key, positions.len());
                positions.push(sample.xy());
                sums.push((sample.z, 1));
            }
        }
    }

    let values = sums
        .into_iter()
        .map(|(sum, count)| sum / count as f64)
        .collect();
    (positions, values)
}

struct GradientEstimate {
    gradients: Vec<[f64; 2]>,
    iterations: usize,
    converged: bool,
}

/// Estimates vertex gradients by minimising the summed squared second
/// derivative of the cubic Hermite curves along all triangulation edges.
///
/// Each sweep solves, per vertex, the 2×2 normal equations
/// `Σ 4 e eᵀ / L³ · g = Σ (6 (f_j − f_i) − 2 g_j·e) e / L³`
/// with the neighbour gradients `g_j` held fixed (Gauss–Seidel).
fn estimate_gradients(
    triangulation: &Triangulation,
    values: &[f64],
    options: InterpolationOptions,
) -> GradientEstimate {
    let points = triangulation.points();
    let mut gradients = vec![[0.0_f64; 2]; points.len()];

    if triangulation.is_empty() {
        return GradientEstimate {
            gradients,
            iterations: 0,
            converged: true,
        };
    }

    for sweep in 0..options.max_gradient_iterations {
        let mut max_change = 0.0_f64;

        for i in 0..points.len() {
            let neighbors = triangulation.vertex_neighbors(i);
            if neighbors.is_empty() {
                continue;
            }

            let pi = points[i];
            let fi = values[i];
            let mut q = [0.0_f64; 3];
            let mut s = [0.0_f64; 2];

            for &j in neighbors {
                let e = points[j] - pi;
                let length = (e.x * e.x + e.y * e.y).sqrt();
                let l3 = length * length * length;
                if l3 <= 0.0 || !l3.is_finite() {
                    continue;
                }

                let dfj = gradients[j][0] * e.x + gradients[j][1] * e.y;
                let rhs = 6.0 * (values[j] - fi) - 2.0 * dfj;

                q[0] += 4.0 * e.x * e.x / l3;
                q[1] += 4.0 * e.x * e.y / l3;
                q[2] += 4.0 * e.y * e.y / l3;
                s[0] += rhs * e.x / l3;
                s[1] += rhs * e.y / l3;
            }

            let det = q[0] * q[2] - q[1] * q[1];
            if det == 0.0 || !det.is_finite() {
                continue;
            }

            let gx = (q[2] * s[0] - q[1] * s[1]) / det;
            let gy = (-q[1] * s[0] + q[0] * s[1]) / det;

            let change = ((gx - gradients[i][0]).abs() / (1.0 + gx.abs()))
                .max((gy - gradients[i][1]).abs() / (1.0 + gy.abs()));
            max_change = max_change.max(change);
            gradients[i] = [gx, gy];
        }

        if max_change < options.gradient_tolerance {
            return GradientEstimate {
                gradients,
                iterations: sweep + 1,
                converged: true,
            };
        }
    }

    GradientEstimate {
        gradients,
        iterations: options.max_gradient_iterations,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::{CloughTocherInterpolator, InterpolationOptions, merge_coincident};
    use crate::geom::core::{Point2, PointSample};

    fn tilted_square() -> Vec<PointSample> {
        vec![
            PointSample::new(0.0, 0.0, 0.0),
            PointSample::new(1.0, 0.0, 1.0),
            PointSample::new(0.0, 1.0, 1.0),
            PointSample::new(1.0, 1.0, 2.0),
        ]
    }

    #[test]
    fn reproduces_linear_surface() {
        let interp = CloughTocherInterpolator::fit(&tilted_square(), InterpolationOptions::default());
        assert!(interp.diagnostics().gradient_converged);

        for &(x, y) in &[(0.25, 0.25), (0.5, 0.1), (0.9, 0.7), (0.5, 0.5)] {
            let z = interp.evaluate(Point2::new(x, y)).unwrap();
            assert!((z - (x + y)).abs() < 1e-4, "z({x}, {y}) = {z}");
        }

        for g in interp.gradients() {
            assert!((g[0] - 1.0).abs() < 1e-4);
            assert!((g[1] - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn passes_through_every_sample() {
        let samples = vec![
            PointSample::new(0.0, 0.0, 3.0),
            PointSample::new(4.0, 0.5, -1.0),
            PointSample::new(3.5, 4.0, 7.5),
            PointSample::new(-0.5, 3.0, 2.0),
            PointSample::new(2.0, 2.0, 10.0),
            PointSample::new(1.0, 3.5, 4.0),
        ];
        let interp = CloughTocherInterpolator::fit(&samples, InterpolationOptions::default());
        for s in &samples {
            let z = interp.evaluate(s.xy()).unwrap();
            assert!((z - s.z).abs() < 1e-9, "sample {s:?} evaluated to {z}");
        }
    }

    #[test]
    fn undefined_outside_hull() {
        let interp = CloughTocherInterpolator::fit(&tilted_square(), InterpolationOptions::default());
        assert!(interp.evaluate(Point2::new(1.5, 0.5)).is_none());
        assert!(interp.evaluate(Point2::new(-0.01, 0.5)).is_none());
    }

    #[test]
    fn collinear_input_is_undefined_everywhere() {
        let samples = vec![
            PointSample::new(0.0, 0.0, 0.0),
            PointSample::new(1.0, 1.0, 1.0),
            PointSample::new(2.0, 2.0, 5.0),
            PointSample::new(3.0, 3.0, 2.0),
        ];
        let interp = CloughTocherInterpolator::fit(&samples, InterpolationOptions::default());
        assert!(interp.is_degenerate());
        assert!(interp.evaluate(Point2::new(1.0, 1.0)).is_none());
        assert!(!interp.diagnostics().warnings.is_empty());
    }

    #[test]
    fn coincident_samples_are_averaged() {
        let samples = vec![
            PointSample::new(0.0, 0.0, 1.0),
            PointSample::new(-0.0, 0.0, 3.0),
            PointSample::new(1.0, 0.0, 0.0),
        ];
        let (positions, values) = merge_coincident(&samples);
        assert_eq!(positions.len(), 2);
        assert_eq!(values, vec![2.0, 0.0]);
    }

    #[test]
    fn hint_does_not_change_values() {
        let samples = vec![
            PointSample::new(0.0, 0.0, 3.0),
            PointSample::new(4.0, 0.5, -1.0),
            PointSample::new(3.5, 4.0, 7.5),
            PointSample::new(-0.5, 3.0, 2.0),
            PointSample::new(2.0, 2.0, 10.0),
        ];
        let interp = CloughTocherInterpolator::fit(&samples, InterpolationOptions::default());
        let p = Point2::new(1.3, 1.1);
        let cold = interp.evaluate(p).unwrap();
        for start in 0..interp.triangulation().triangle_count() {
            let mut hint = Some(start);
            let warm = interp.evaluate_with_hint(p, &mut hint).unwrap();
            assert!((warm - cold).abs() < 1e-12);
        }
    }
}
