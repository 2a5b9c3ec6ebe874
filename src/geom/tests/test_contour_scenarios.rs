use super::interpolate_grid;
use crate::geom::{
    DEFAULT_MAX_LEVELS, InterpolationOptions, LevelSet, PointSample, Polyline, plan_levels,
    trace_contours,
};

fn paraboloid_samples() -> Vec<PointSample> {
    let mut samples = Vec::new();
    for j in -4..=4 {
        for i in -4..=4 {
            let (x, y) = (f64::from(i), f64::from(j));
            samples.push(PointSample::new(x, y, 10.0 - (x * x + y * y) / 4.0));
        }
    }
    samples
}

fn signed_area(line: &Polyline) -> f64 {
    let n = line.vertices.len();
    (0..n)
        .map(|k| {
            let a = line.vertices[k];
            let b = line.vertices[(k + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}

#[test]
fn peak_levels_form_nested_closed_loops() {
    let samples = paraboloid_samples();
    let (grid, _) = interpolate_grid(&samples, 41, InterpolationOptions::default());
    assert_eq!(grid.undefined_count(), 0);

    let (z_min, z_max) = grid.defined_range().unwrap();
    assert!((z_min - 2.0).abs() < 0.05);
    assert!((z_max - 10.0).abs() < 0.05);

    // Every level above the highest boundary value (6 at the edge midpoints)
    // is a single loop around the summit.
    let levels = LevelSet::from_levels(vec![7.0, 8.0, 9.0]).unwrap();
    let traced = trace_contours(&grid, &levels);
    assert_eq!(traced.len(), 3);

    let mut previous_area = f64::INFINITY;
    for level in &traced {
        assert_eq!(level.polylines.len(), 1, "level {}", level.elevation);
        let ring = &level.polylines[0];
        assert!(ring.closed);
        assert!(ring.vertices.len() >= 8);

        let area = signed_area(ring);
        assert!(area > 0.0, "summit should be on the left of the loop");
        assert!(area < previous_area, "loops must shrink towards the peak");
        previous_area = area;

        // Radius of the paraboloid contour is 2 * sqrt(10 - level).
        let radius = 2.0 * (10.0 - level.elevation).sqrt();
        for p in &ring.vertices {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!((r - radius).abs() < 0.15, "vertex {p:?} off the circle r={radius}");
        }
    }
}

#[test]
fn boundary_cuts_low_levels_open() {
    let samples = paraboloid_samples();
    let (grid, _) = interpolate_grid(&samples, 41, InterpolationOptions::default());
    let levels = plan_levels(2.0, 10.0, 1.0, DEFAULT_MAX_LEVELS).unwrap();
    let traced = trace_contours(&grid, &levels);

    // Level 4 crosses every side of the square: four open arcs near the corners.
    let level = traced.iter().find(|l| l.elevation == 4.0).unwrap();
    assert_eq!(level.polylines.len(), 4);
    assert!(level.polylines.iter().all(|p| !p.closed));
}

#[test]
fn every_polyline_has_two_vertices() {
    let samples = paraboloid_samples();
    let (grid, _) = interpolate_grid(&samples, 33, InterpolationOptions::default());
    let levels = plan_levels(2.0, 10.0, 0.25, DEFAULT_MAX_LEVELS).unwrap();
    for level in trace_contours(&grid, &levels) {
        for line in &level.polylines {
            assert!(line.vertices.len() >= 2);
            assert!(line.vertices.windows(2).all(|w| w[0] != w[1]));
            if line.closed {
                assert!(line.vertices.len() >= 3);
                assert_ne!(line.vertices.first(), line.vertices.last());
            }
        }
    }
}
