//! End-to-end contour generation: validate, fit, sample, plan, trace, build.

use crate::geom::{
    BBox2, CloughTocherInterpolator, ContourDiagnostics, DEFAULT_MAX_LEVELS, DEFAULT_RESOLUTION,
    GeomMetrics, InterpolationOptions, LevelError, MAX_RESOLUTION, PointSample, TimingBucket,
    plan_levels, sample_grid, trace_contours,
};
use crate::scene::{DEFAULT_LABEL_PRECISION, Scene, SceneBuilder, SceneError, SceneMetadata};

/// Smallest survey that can be triangulated into a surface.
pub const MIN_POINTS: usize = 4;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContourError {
    #[error("at least 4 points are required for contour interpolation (got {0})")]
    InsufficientData(usize),
    #[error("point {index} has a non-finite coordinate")]
    NonFiniteInput { index: usize },
    #[error("all points share the same {axis} coordinate; no grid can be formed")]
    DegenerateCoordinates { axis: char },
    #[error("elevation (Z) does not vary; no contour can be formed")]
    DegenerateElevation,
    #[error("contour interval must be greater than zero (got {0})")]
    InvalidInterval(f64),
    #[error("grid resolution must be between 2 and {max} (got {resolution})")]
    InvalidResolution { resolution: usize, max: usize },
    #[error("no valid contour levels; check the elevation data or the interval")]
    EmptyLevelSet,
    #[error("interval would produce {count} contour levels (limit {limit})")]
    TooManyLevels { count: usize, limit: usize },
    #[error("surface interpolation failed: {0}")]
    InterpolationFailure(String),
    #[error("layer name `{0}` is used by two elevations")]
    LayerNameCollision(String),
}

impl From<LevelError> for ContourError {
    fn from(err: LevelError) -> Self {
        match err {
            LevelError::InvalidInterval(interval) => Self::InvalidInterval(interval),
            LevelError::EmptyLevelSet { .. } => Self::EmptyLevelSet,
            LevelError::TooManyLevels { count, limit, .. } => Self::TooManyLevels { count, limit },
            LevelError::InvalidRange { .. } => Self::InterpolationFailure(err.to_string()),
        }
    }
}

impl From<SceneError> for ContourError {
    fn from(err: SceneError) -> Self {
        match err {
            SceneError::LayerNameCollision { name, .. } => Self::LayerNameCollision(name),
        }
    }
}

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourOptions {
    /// Elevation step between contour levels.
    pub interval: f64,

    /// Lattice nodes per side.
    pub resolution: usize,

    /// Upper bound on planned levels.
    pub max_levels: usize,

    /// Decimal places of layer labels.
    pub label_precision: usize,

    pub interpolation: InterpolationOptions,
}

impl Default for ContourOptions {
    fn default() -> Self {
        Self {
            interval: 1.0,
            resolution: DEFAULT_RESOLUTION,
            max_levels: DEFAULT_MAX_LEVELS,
            label_precision: DEFAULT_LABEL_PRECISION,
            interpolation: InterpolationOptions::default(),
        }
    }
}

impl ContourOptions {
    #[must_use]
    pub fn new(interval: f64) -> Self {
        Self::default().with_interval(interval)
    }

    #[must_use]
    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    #[must_use]
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    #[must_use]
    pub fn with_label_precision(mut self, precision: usize) -> Self {
        self.label_precision = precision;
        self
    }

    #[must_use]
    pub fn with_interpolation(mut self, interpolation: InterpolationOptions) -> Self {
        self.interpolation = interpolation;
        self
    }
}

/// A built scene and what it took to build it.
#[derive(Debug, Clone)]
pub struct ContourOutput {
    pub scene: Scene,
    pub diagnostics: ContourDiagnostics,
}

// ============================================================================
// Validation
// ============================================================================

fn all_equal(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

/// Checks the request in a fixed order: interval, point count, finiteness,
/// elevation spread, planar spread, resolution.
pub fn validate_request(points: &[PointSample], options: &ContourOptions) -> Result<(), ContourError> {
    if !options.interval.is_finite() || options.interval <= 0.0 {
        return Err(ContourError::InvalidInterval(options.interval));
    }
    validate_points(points)?;
    if options.resolution < 2 || options.resolution > MAX_RESOLUTION {
        return Err(ContourError::InvalidResolution {
            resolution: options.resolution,
            max: MAX_RESOLUTION,
        });
    }
    Ok(())
}

/// Point-set invariants: enough points, all finite, varying in z, x and y.
pub fn validate_points(points: &[PointSample]) -> Result<(), ContourError> {
    if points.len() < MIN_POINTS {
        return Err(ContourError::InsufficientData(points.len()));
    }
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(ContourError::NonFiniteInput { index });
    }
    if all_equal(points.iter().map(|p| p.z)) {
        return Err(ContourError::DegenerateElevation);
    }
    if all_equal(points.iter().map(|p| p.x)) {
        return Err(ContourError::DegenerateCoordinates { axis: 'X' });
    }
    if all_equal(points.iter().map(|p| p.y)) {
        return Err(ContourError::DegenerateCoordinates { axis: 'Y' });
    }
    Ok(())
}

// ============================================================================
// Pipeline
// ============================================================================

/// Turns survey points into a layered contour scene.
///
/// Fails before any fitting for invalid requests. Input whose positions are
/// collinear passes validation but leaves the grid undefined everywhere and
/// surfaces as [`ContourError::InterpolationFailure`].
pub fn generate_scene(
    points: &[PointSample],
    options: &ContourOptions,
    metadata: SceneMetadata,
) -> Result<ContourOutput, ContourError> {
    let mut metrics = GeomMetrics::default();
    metrics.begin();

    metrics.time(TimingBucket::Validation, || validate_request(points, options))?;

    let surface = metrics.time(TimingBucket::SurfaceFit, || {
        CloughTocherInterpolator::fit(points, options.interpolation)
    });
    let bbox = BBox2::from_samples(points)
        .ok_or_else(|| ContourError::InsufficientData(points.len()))?;
    let grid = metrics.time(TimingBucket::GridSampling, || {
        sample_grid(&surface, bbox, options.resolution)
    });

    let fit = surface.diagnostics();
    let mut diagnostics = ContourDiagnostics {
        input_point_count: points.len(),
        merged_point_count: fit.distinct_point_count,
        triangle_count: fit.triangulation.triangle_count,
        degenerate_triangle_count: fit.triangulation.degenerate_triangle_count,
        gradient_iterations: fit.gradient_iterations,
        gradient_converged: fit.gradient_converged,
        resolution: options.resolution,
        undefined_node_count: grid.undefined_count(),
        warnings: fit.warnings.clone(),
        ..ContourDiagnostics::default()
    };

    let Some((z_min, z_max)) = grid.defined_range() else {
        return Err(ContourError::InterpolationFailure(
            "no grid node lies inside the triangulated hull".to_owned(),
        ));
    };

    let levels = metrics.time(TimingBucket::LevelPlanning, || {
        plan_levels(z_min, z_max, options.interval, options.max_levels)
    })?;

    let traced = metrics.time(TimingBucket::Tracing, || trace_contours(&grid, &levels));

    diagnostics.level_count = traced.len();
    diagnostics.empty_level_count = traced.iter().filter(|l| l.polylines.is_empty()).count();
    diagnostics.polyline_count = traced.iter().map(|l| l.polylines.len()).sum();
    diagnostics.closed_polyline_count = traced.iter().map(|l| l.closed_count()).sum();
    if diagnostics.polyline_count == 0 {
        diagnostics.add_warning("no contour line crosses the sampled grid");
    }

    let scene = metrics.time(TimingBucket::SceneBuild, || {
        SceneBuilder::new(metadata)
            .with_label_precision(options.label_precision)
            .build(traced, points, (z_min, z_max))
    })?;

    diagnostics.timing = metrics.end();
    log::debug!("contour run finished: {}", diagnostics.summary());

    Ok(ContourOutput { scene, diagnostics })
}

/// [`generate_scene`] with default options and captions for `interval`.
pub fn generate_contours(points: &[PointSample], interval: f64) -> Result<Scene, ContourError> {
    generate_scene(
        points,
        &ContourOptions::new(interval),
        SceneMetadata::for_interval(interval),
    )
    .map(|output| output.scene)
}

#[cfg(test)]
mod tests {
    use super::{ContourError, ContourOptions, generate_scene, validate_points, validate_request};
    use crate::geom::PointSample;
    use crate::scene::SceneMetadata;

    fn square() -> Vec<PointSample> {
        vec![
            PointSample::new(0.0, 0.0, 0.0),
            PointSample::new(1.0, 0.0, 1.0),
            PointSample::new(0.0, 1.0, 1.0),
            PointSample::new(1.0, 1.0, 2.0),
        ]
    }

    #[test]
    fn interval_is_checked_before_points() {
        let err = validate_request(&square()[..2], &ContourOptions::new(0.0)).unwrap_err();
        assert_eq!(err, ContourError::InvalidInterval(0.0));
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let mut points = square();
        points[2].y = f64::NAN;
        assert_eq!(
            validate_points(&points),
            Err(ContourError::NonFiniteInput { index: 2 })
        );
    }

    #[test]
    fn elevation_is_checked_before_coordinates() {
        let points: Vec<PointSample> = (0..5).map(|k| PointSample::new(1.0, f64::from(k), 3.0)).collect();
        assert_eq!(validate_points(&points), Err(ContourError::DegenerateElevation));
    }

    #[test]
    fn constant_axis_is_named() {
        let points: Vec<PointSample> = (0..5)
            .map(|k| PointSample::new(f64::from(k), 7.0, f64::from(k)))
            .collect();
        assert_eq!(
            validate_points(&points),
            Err(ContourError::DegenerateCoordinates { axis: 'Y' })
        );
    }

    #[test]
    fn resolution_bounds_are_enforced() {
        for resolution in [0, 1, 4096] {
            let options = ContourOptions::new(1.0).with_resolution(resolution);
            assert!(matches!(
                validate_request(&square(), &options),
                Err(ContourError::InvalidResolution { .. })
            ));
        }
    }

    #[test]
    fn collinear_positions_fail_interpolation() {
        let points: Vec<PointSample> = (0..6)
            .map(|k| PointSample::new(f64::from(k), 2.0 * f64::from(k), f64::from(k % 3)))
            .collect();
        let err = generate_scene(&points, &ContourOptions::new(0.5), SceneMetadata::default())
            .unwrap_err();
        assert!(matches!(err, ContourError::InterpolationFailure(_)));
    }

    #[test]
    fn diagnostics_describe_the_run() {
        let output = generate_scene(
            &square(),
            &ContourOptions::new(0.5).with_resolution(50),
            SceneMetadata::for_interval(0.5),
        )
        .unwrap();
        let diag = &output.diagnostics;
        assert_eq!(diag.input_point_count, 4);
        assert_eq!(diag.merged_point_count, 4);
        assert_eq!(diag.triangle_count, 2);
        assert_eq!(diag.resolution, 50);
        assert_eq!(diag.undefined_node_count, 0);
        assert_eq!(diag.level_count, output.scene.layer_count());
        assert_eq!(diag.polyline_count, output.scene.polyline_count());
    }

    #[test]
    fn too_many_levels_is_reported() {
        let options = ContourOptions::new(1e-6).with_resolution(10).with_max_levels(100);
        let err = generate_scene(&square(), &options, SceneMetadata::default()).unwrap_err();
        assert!(matches!(err, ContourError::TooManyLevels { limit: 100, .. }));
    }
}
