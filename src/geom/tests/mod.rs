mod test_contour_scenarios;

use super::{BBox2, CloughTocherInterpolator, Grid, InterpolationOptions, PointSample, sample_grid};

/// Fits `samples` and samples the surface over their bounding box.
pub(crate) fn interpolate_grid(
    samples: &[PointSample],
    resolution: usize,
    options: InterpolationOptions,
) -> (Grid, CloughTocherInterpolator) {
    let interpolator = CloughTocherInterpolator::fit(samples, options);
    let bbox = BBox2::from_samples(samples).expect("test surveys are non-empty");
    let grid = sample_grid(&interpolator, bbox, resolution);
    (grid, interpolator)
}
