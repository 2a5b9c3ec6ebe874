//! Marching-squares isoline tracing over a sampled [`Grid`].
//!
//! Every crossing edge gets a stable id, segments inside a cell are
//! oriented so that higher ground lies on their left, and chains are
//! stitched purely through those edge ids. Each crossing edge is then the
//! exit of at most one segment and the entry of at most one segment, which
//! makes the stitching unambiguous and independent of coordinate noise.

use serde::Serialize;

use super::core::Point2;
use super::grid::Grid;
use super::levels::LevelSet;

/// One traced isoline piece.
///
/// A closed polyline does not repeat its first vertex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polyline {
    pub vertices: Vec<Point2>,
    pub closed: bool,
}

/// All polylines traced at one elevation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContourLevel {
    pub elevation: f64,
    pub polylines: Vec<Polyline>,
}

impl ContourLevel {
    #[must_use]
    pub fn closed_count(&self) -> usize {
        self.polylines.iter().filter(|p| p.closed).count()
    }
}

/// Traces every level of `levels`, in order.
#[must_use]
pub fn trace_contours(grid: &Grid, levels: &LevelSet) -> Vec<ContourLevel> {
    let mut tracer = Tracer::new(grid);
    let traced: Vec<ContourLevel> = levels.iter().map(|level| tracer.trace(level)).collect();
    log::debug!(
        "traced {} polylines over {} levels",
        traced.iter().map(|l| l.polylines.len()).sum::<usize>(),
        traced.len()
    );
    traced
}

/// Traces a single elevation.
#[must_use]
pub fn trace_level(grid: &Grid, level: f64) -> ContourLevel {
    Tracer::new(grid).trace(level)
}

// ─────────────────────────────────────────────────────────────────────────────
// Edge ids
// ─────────────────────────────────────────────────────────────────────────────

/// Numbering of lattice edges: horizontal edges first (row-major), then
/// vertical edges.
#[derive(Debug, Clone, Copy)]
struct EdgeLayout {
    nx: usize,
    horizontal_count: usize,
    count: usize,
}

impl EdgeLayout {
    fn new(nx: usize, ny: usize) -> Self {
        let horizontal_count = nx.saturating_sub(1) * ny;
        let vertical_count = nx * ny.saturating_sub(1);
        Self {
            nx,
            horizontal_count,
            count: horizontal_count + vertical_count,
        }
    }

    /// Edge from node `(i, j)` to `(i + 1, j)`.
    fn horizontal(&self, i: usize, j: usize) -> usize {
        j * (self.nx - 1) + i
    }

    /// Edge from node `(i, j)` to `(i, j + 1)`.
    fn vertical(&self, i: usize, j: usize) -> usize {
        self.horizontal_count + j * self.nx + i
    }

    /// End nodes of `edge`, lower index first.
    fn nodes(&self, edge: usize) -> ((usize, usize), (usize, usize)) {
        if edge < self.horizontal_count {
            let row = self.nx - 1;
            let (i, j) = (edge % row, edge / row);
            ((i, j), (i + 1, j))
        } else {
            let local = edge - self.horizontal_count;
            let (i, j) = (local % self.nx, local / self.nx);
            ((i, j), (i, j + 1))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracer
// ─────────────────────────────────────────────────────────────────────────────

/// Oriented piece of isoline inside one cell, from entry edge to exit edge.
#[derive(Debug, Clone, Copy)]
struct Segment {
    start: usize,
    end: usize,
}

/// Per-grid scratch state reused across levels.
struct Tracer<'a> {
    grid: &'a Grid,
    layout: EdgeLayout,
    by_start: Vec<Option<usize>>,
    by_end: Vec<Option<usize>>,
}

impl<'a> Tracer<'a> {
    fn new(grid: &'a Grid) -> Self {
        let layout = EdgeLayout::new(grid.nx(), grid.ny());
        Self {
            grid,
            layout,
            by_start: vec![None; layout.count],
            by_end: vec![None; layout.count],
        }
    }

    fn trace(&mut self, level: f64) -> ContourLevel {
        let segments = self.collect_segments(level);
        for (index, segment) in segments.iter().enumerate() {
            self.by_start[segment.start] = Some(index);
            self.by_end[segment.end] = Some(index);
        }

        let polylines = self.stitch(&segments, level);

        for segment in &segments {
            self.by_start[segment.start] = None;
            self.by_end[segment.end] = None;
        }

        ContourLevel {
            elevation: level,
            polylines,
        }
    }

    /// Oriented segments of every fully defined cell, in row-major cell
    /// order.
    fn collect_segments(&self, level: f64) -> Vec<Segment> {
        let grid = self.grid;
        let mut segments = Vec::new();
        if grid.nx() < 2 || grid.ny() < 2 {
            return segments;
        }

        for j in 0..grid.ny() - 1 {
            for i in 0..grid.nx() - 1 {
                // Counter-clockwise from bottom-left.
                let values = [
                    grid.raw_value(i, j),
                    grid.raw_value(i + 1, j),
                    grid.raw_value(i + 1, j + 1),
                    grid.raw_value(i, j + 1),
                ];
                if values.iter().any(|v| v.is_nan()) {
                    continue;
                }

                let above = values.map(|v| v >= level);
                let above_count = above.iter().filter(|&&a| a).count();
                if above_count == 0 || above_count == 4 {
                    continue;
                }

                // Edge k runs from corner k to corner k + 1.
                let edges = [
                    self.layout.horizontal(i, j),
                    self.layout.vertical(i + 1, j),
                    self.layout.horizontal(i, j + 1),
                    self.layout.vertical(i, j),
                ];

                let saddle = above_count == 2 && above[0] == above[2];
                if saddle {
                    let centre = values.iter().sum::<f64>() / 4.0;
                    let centre_above = centre >= level;
                    for k in 0..4 {
                        if above[k] && !above[(k + 1) % 4] {
                            let exit = if centre_above { (k + 1) % 4 } else { (k + 3) % 4 };
                            segments.push(Segment {
                                start: edges[k],
                                end: edges[exit],
                            });
                        }
                    }
                } else {
                    let mut start = None;
                    let mut end = None;
                    for k in 0..4 {
                        match (above[k], above[(k + 1) % 4]) {
                            (true, false) => start = Some(edges[k]),
                            (false, true) => end = Some(edges[k]),
                            _ => {}
                        }
                    }
                    if let (Some(start), Some(end)) = (start, end) {
                        segments.push(Segment { start, end });
                    }
                }
            }
        }
        segments
    }

    fn stitch(&self, segments: &[Segment], level: f64) -> Vec<Polyline> {
        let mut visited = vec![false; segments.len()];
        let mut polylines = Vec::new();

        for seed in 0..segments.len() {
            if visited[seed] {
                continue;
            }

            // Walk upstream to the head of an open chain, or detect a loop.
            let mut head = seed;
            let mut closed = false;
            for _ in 0..segments.len() {
                match self.by_end[segments[head].start] {
                    Some(prev) if prev == seed => {
                        closed = true;
                        break;
                    }
                    Some(prev) => head = prev,
                    None => break,
                }
            }
            if closed {
                head = seed;
            }

            let mut vertices = vec![self.crossing(segments[head].start, level)];
            let mut current = head;
            loop {
                visited[current] = true;
                let exit = segments[current].end;
                match self.by_start[exit] {
                    Some(next) if next == head => break,
                    Some(next) if !visited[next] => {
                        push_distinct(&mut vertices, self.crossing(exit, level));
                        current = next;
                    }
                    _ => {
                        push_distinct(&mut vertices, self.crossing(exit, level));
                        break;
                    }
                }
            }

            if closed && vertices.len() > 1 && vertices.first() == vertices.last() {
                vertices.pop();
            }

            let minimum = if closed { 3 } else { 2 };
            if vertices.len() >= minimum {
                polylines.push(Polyline { vertices, closed });
            }
        }
        polylines
    }

    /// Where `level` crosses `edge`, interpolated from the lower-index node
    /// so both adjacent cells see the same point.
    fn crossing(&self, edge: usize, level: f64) -> Point2 {
        let ((i0, j0), (i1, j1)) = self.layout.nodes(edge);
        let v0 = self.grid.raw_value(i0, j0);
        let v1 = self.grid.raw_value(i1, j1);
        let p0 = self.grid.position(i0, j0);
        let p1 = self.grid.position(i1, j1);

        let t = (level - v0) / (v1 - v0);
        if t <= 0.0 {
            p0
        } else if t >= 1.0 {
            p1
        } else {
            p0.lerp(p1, t)
        }
    }
}

fn push_distinct(vertices: &mut Vec<Point2>, p: Point2) {
    if vertices.last() != Some(&p) {
        vertices.push(p);
    }
}
