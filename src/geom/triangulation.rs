//! Planar Delaunay triangulation of scattered survey positions.
//!
//! Wraps [`delaunator`] and adds what the interpolator needs on top of the
//! raw half-edge arrays: per-triangle neighbours, cached barycentric
//! transforms, vertex adjacency and point location.

use super::core::{BBox2, Point2, Tolerance};

/// Barycentric coordinates of a point relative to one triangle.
pub type Barycentric = [f64; 3];

/// Precomputed affine map from world coordinates to barycentric coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BarycentricTransform {
    m: [f64; 4],
    origin: Point2,
}

impl BarycentricTransform {
    fn new(a: Point2, b: Point2, c: Point2, min_det: f64) -> Option<Self> {
        let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
        if !det.is_finite() || det.abs() <= min_det {
            return None;
        }
        Some(Self {
            m: [
                (b.y - c.y) / det,
                (c.x - b.x) / det,
                (c.y - a.y) / det,
                (a.x - c.x) / det,
            ],
            origin: c,
        })
    }

    fn apply(&self, p: Point2) -> Barycentric {
        let dx = p.x - self.origin.x;
        let dy = p.y - self.origin.y;
        let l0 = self.m[0] * dx + self.m[1] * dy;
        let l1 = self.m[2] * dx + self.m[3] * dy;
        [l0, l1, 1.0 - l0 - l1]
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TriangulationDiagnostics {
    pub input_vertex_count: usize,
    pub triangle_count: usize,
    pub hull_vertex_count: usize,
    /// Sliver triangles whose barycentric transform is numerically singular.
    /// They stay in the topology but never claim a query point.
    pub degenerate_triangle_count: usize,
}

/// Delaunay triangulation with neighbour and adjacency tables.
#[derive(Debug, Clone)]
pub struct Triangulation {
    points: Vec<Point2>,
    triangles: Vec<[usize; 3]>,
    /// `neighbors[t][k]` is the triangle across the edge opposite vertex `k`.
    neighbors: Vec<[Option<usize>; 3]>,
    transforms: Vec<Option<BarycentricTransform>>,
    vertex_neighbors: Vec<Vec<usize>>,
    diagnostics: TriangulationDiagnostics,
}

impl Triangulation {
    /// Triangulates `points`. Collinear or coincident input yields a
    /// triangulation without triangles rather than an error.
    #[must_use]
    pub fn new(points: Vec<Point2>) -> Self {
        let raw_points: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();
        let raw = delaunator::triangulate(&raw_points);

        let triangle_count = raw.triangles.len() / 3;
        let mut triangles = Vec::with_capacity(triangle_count);
        let mut neighbors = Vec::with_capacity(triangle_count);
        for t in 0..triangle_count {
            let base = 3 * t;
            triangles.push([
                raw.triangles[base],
                raw.triangles[base + 1],
                raw.triangles[base + 2],
            ]);

            // Half-edge `base + e` runs from vertex `e` to vertex `e + 1`,
            // so it lies opposite vertex `e + 2`.
            let mut across = [None; 3];
            for e in 0..3 {
                let twin = raw.halfedges[base + e];
                if twin != delaunator::EMPTY {
                    across[(e + 2) % 3] = Some(twin / 3);
                }
            }
            neighbors.push(across);
        }

        let scale = BBox2::from_points(&points)
            .map_or(1.0, |bbox| bbox.diagonal().max(f64::MIN_POSITIVE));
        let min_det = Tolerance::DEGENERATE_AREA.relative_to(scale * scale);

        let transforms: Vec<Option<BarycentricTransform>> = triangles
            .iter()
            .map(|tri| {
                BarycentricTransform::new(points[tri[0]], points[tri[1]], points[tri[2]], min_det)
            })
            .collect();

        let mut vertex_neighbors = vec![Vec::new(); points.len()];
        for tri in &triangles {
            for k in 0..3 {
                let a = tri[k];
                let b = tri[(k + 1) % 3];
                vertex_neighbors[a].push(b);
                vertex_neighbors[b].push(a);
            }
        }
        for list in &mut vertex_neighbors {
            list.sort_unstable();
            list.dedup();
        }

        let diagnostics = TriangulationDiagnostics {
            input_vertex_count: points.len(),
            triangle_count,
            hull_vertex_count: if triangle_count == 0 { 0 } else { raw.hull.len() },
            degenerate_triangle_count: transforms.iter().filter(|t| t.is_none()).count(),
        };

        Self {
            points,
            triangles,
            neighbors,
            transforms,
            vertex_neighbors,
            diagnostics,
        }
    }

    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    #[must_use]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[must_use]
    pub fn neighbors(&self, triangle: usize) -> [Option<usize>; 3] {
        self.neighbors[triangle]
    }

    /// Sorted, de-duplicated vertices sharing an edge with `vertex`.
    #[must_use]
    pub fn vertex_neighbors(&self, vertex: usize) -> &[usize] {
        &self.vertex_neighbors[vertex]
    }

    #[must_use]
    pub fn diagnostics(&self) -> &TriangulationDiagnostics {
        &self.diagnostics
    }

    #[must_use]
    pub fn centroid(&self, triangle: usize) -> Point2 {
        let [a, b, c] = self.triangles[triangle];
        let (pa, pb, pc) = (self.points[a], self.points[b], self.points[c]);
        Point2::new((pa.x + pb.x + pc.x) / 3.0, (pa.y + pb.y + pc.y) / 3.0)
    }

    /// Barycentric coordinates of `p` in `triangle`, or `None` for slivers.
    #[must_use]
    pub fn barycentric(&self, triangle: usize, p: Point2) -> Option<Barycentric> {
        self.transforms[triangle].map(|transform| transform.apply(p))
    }

    /// Finds the triangle containing `p`.
    ///
    /// Walks from `hint` towards `p` across the edge with the most negative
    /// barycentric coordinate. Leaving through a hull edge means `p` is
    /// outside the convex hull. Slivers or an overlong walk fall back to a
    /// linear scan.
    #[must_use]
    pub fn locate(&self, p: Point2, hint: Option<usize>) -> Option<(usize, Barycentric)> {
        if self.triangles.is_empty() || !p.is_finite() {
            return None;
        }

        let eps = Tolerance::BARYCENTRIC.eps;
        let mut current = hint.filter(|&t| t < self.triangles.len()).unwrap_or(0);
        let max_steps = self.triangles.len() + 3;

        for _ in 0..max_steps {
            let Some(bary) = self.barycentric(current, p) else {
                return self.locate_linear(p);
            };

            let (worst, worst_value) = bary
                .iter()
                .copied()
                .enumerate()
                .fold((0, f64::INFINITY), |acc, (k, value)| {
                    if value < acc.1 { (k, value) } else { acc }
                });

            if worst_value >= -eps {
                return Some((current, bary));
            }

            match self.neighbors[current][worst] {
                Some(next) => current = next,
                None => return None,
            }
        }

        self.locate_linear(p)
    }

    fn locate_linear(&self, p: Point2) -> Option<(usize, Barycentric)> {
        let eps = Tolerance::BARYCENTRIC.eps;
        (0..self.triangles.len()).find_map(|t| {
            let bary = self.barycentric(t, p)?;
            bary.iter().all(|&l| l >= -eps).then_some((t, bary))
        })
    }
}
