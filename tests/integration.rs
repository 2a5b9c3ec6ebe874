use std::collections::HashSet;

use contour_engine::ContourEngine;
use contour_engine::export::{read_dxf, write_dxf};
use contour_engine::geom::{Point2, PointSample, Polyline};
use contour_engine::history::PointSource;
use contour_engine::pipeline::{
    ContourError, ContourOptions, generate_contours, generate_scene,
};
use contour_engine::scene::{Scene, SceneMetadata};

fn tilted_plane() -> Vec<PointSample> {
    vec![
        PointSample::new(0.0, 0.0, 0.0),
        PointSample::new(1.0, 0.0, 1.0),
        PointSample::new(0.0, 1.0, 1.0),
        PointSample::new(1.0, 1.0, 2.0),
    ]
}

fn single_peak() -> Vec<PointSample> {
    let mut points = Vec::new();
    for j in -5..=5 {
        for i in -5..=5 {
            let (x, y) = (f64::from(i), f64::from(j));
            points.push(PointSample::new(x, y, 10.0 * (-(x * x + y * y) / 8.0).exp()));
        }
    }
    points
}

fn run(points: &[PointSample], interval: f64, resolution: usize) -> Scene {
    let options = ContourOptions::new(interval).with_resolution(resolution);
    generate_scene(points, &options, SceneMetadata::for_interval(interval))
        .expect("valid survey")
        .scene
}

fn signed_area(polyline: &Polyline) -> f64 {
    let v = &polyline.vertices;
    let mut area = 0.0;
    for k in 0..v.len() {
        let (a, b) = (v[k], v[(k + 1) % v.len()]);
        area += a.x * b.y - b.x * a.y;
    }
    area * 0.5
}

#[test]
fn tilted_plane_yields_one_diagonal_line_per_interior_level() {
    let scene = run(&tilted_plane(), 0.5, 41);

    let elevations: Vec<f64> = scene.elevations().collect();
    assert_eq!(elevations, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    let (z_min, z_max) = scene.value_range();
    assert!(z_min.abs() < 1e-12 && (z_max - 2.0).abs() < 1e-12);

    // The extreme levels only touch a corner of the square.
    assert!(scene.layers()[0].polylines.is_empty());
    assert!(scene.layers()[4].polylines.is_empty());

    for layer in &scene.layers()[1..4] {
        assert_eq!(layer.polylines.len(), 1, "layer {}", layer.name);
        let line = &layer.polylines[0];
        assert!(!line.closed);
        for p in &line.vertices {
            assert!((p.x + p.y - layer.elevation).abs() < 1e-3, "{p:?} off {}", layer.elevation);
        }
        let on_boundary = |p: &Point2| {
            p.x.abs() < 1e-9 || p.y.abs() < 1e-9 || (p.x - 1.0).abs() < 1e-9 || (p.y - 1.0).abs() < 1e-9
        };
        assert!(on_boundary(&line.vertices[0]));
        assert!(on_boundary(&line.vertices[line.vertices.len() - 1]));
    }
}

#[test]
fn uniform_elevation_is_rejected() {
    let points: Vec<PointSample> = tilted_plane()
        .into_iter()
        .map(|p| PointSample::new(p.x, p.y, 5.0))
        .collect();
    assert_eq!(generate_contours(&points, 1.0).unwrap_err(), ContourError::DegenerateElevation);
}

#[test]
fn three_points_are_not_enough() {
    let points = tilted_plane();
    assert_eq!(generate_contours(&points[..3], 0.5).unwrap_err(), ContourError::InsufficientData(3));
}

#[test]
fn negative_interval_is_rejected() {
    assert_eq!(
        generate_contours(&tilted_plane(), -1.0).unwrap_err(),
        ContourError::InvalidInterval(-1.0)
    );
}

#[test]
fn single_peak_yields_nested_closed_loops() {
    let scene = run(&single_peak(), 2.0, 81);

    let loops: Vec<(f64, f64)> = scene
        .layers()
        .iter()
        // Stay clear of the flat tail near the hull corners.
        .filter(|layer| layer.elevation > 1.0 && layer.elevation < 9.5)
        .map(|layer| {
            assert_eq!(layer.polylines.len(), 1, "layer {}", layer.name);
            let ring = &layer.polylines[0];
            assert!(ring.closed, "layer {} is not closed", layer.name);
            (layer.elevation, signed_area(ring).abs())
        })
        .collect();

    assert!(loops.len() >= 3, "only {} loops", loops.len());
    for pair in loops.windows(2) {
        assert!(pair[0].0 < pair[1].0);
        assert!(pair[1].1 < pair[0].1, "inner loop is not smaller: {pair:?}");
    }
}

#[test]
fn layer_names_are_unique_within_a_scene() {
    let scene = run(&single_peak(), 0.05, 31);
    let names: HashSet<&str> = scene.layers().iter().map(|layer| layer.name.as_str()).collect();
    assert_eq!(names.len(), scene.layer_count());
}

#[test]
fn dxf_round_trip_recovers_layers_and_polylines() {
    let scene = run(&single_peak(), 1.5, 61);
    let text = write_dxf(&scene);
    assert_eq!(text, write_dxf(&scene));

    let drawing = read_dxf(&text).expect("own output parses");
    let layers: Vec<&str> = drawing
        .layers
        .iter()
        .map(String::as_str)
        .filter(|name| *name != "0")
        .collect();
    let expected: Vec<&str> = scene.layers().iter().map(|layer| layer.name.as_str()).collect();
    assert_eq!(layers, expected);

    for layer in scene.layers() {
        let read: Vec<_> = drawing.polylines_on(&layer.name).collect();
        assert_eq!(read.len(), layer.polylines.len());
        for (got, want) in read.iter().zip(&layer.polylines) {
            assert_eq!(got.closed, want.closed);
            assert_eq!(got.vertices.len(), want.vertices.len());
            for (a, b) in got.vertices.iter().zip(&want.vertices) {
                assert!(a.distance_to(*b) < 1e-8);
            }
        }
    }
}

#[test]
fn engine_parses_text_and_keeps_history() {
    let text: String = single_peak()
        .iter()
        .map(|p| format!("{},{},{}\n", p.x, p.y, p.z))
        .chain(std::iter::once("header,row\n".to_owned()))
        .collect();

    let mut engine = ContourEngine::new();
    let options = ContourOptions::new(2.5).with_resolution(41);
    engine.run_text(&text, &options).expect("peak survey contours");
    engine
        .run(&tilted_plane(), &ContourOptions::new(0.5).with_resolution(11), PointSource::Array)
        .expect("plane contours");

    let entries: Vec<_> = engine.history_entries().collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].source, PointSource::Array);
    assert_eq!(entries[1].source, PointSource::Manual);
    assert_eq!(entries[1].point_count, 121);
    assert!(engine.dxf().unwrap().contains("Kontur_1_50"));
}
