mod contour;
mod core;
mod diagnostics;
mod grid;
mod interpolate;
mod levels;
mod metrics;
mod triangulation;

pub use contour::{ContourLevel, Polyline, trace_contours, trace_level};
pub use core::{BBox2, Point2, PointSample, Tolerance};
pub use diagnostics::ContourDiagnostics;
pub use grid::{
    DEFAULT_RESOLUTION, Grid, MAX_RESOLUTION, linspace, sample_grid,
};
pub use interpolate::{
    CloughTocherInterpolator, InterpolationDiagnostics, InterpolationOptions,
};
pub use levels::{DEFAULT_MAX_LEVELS, LevelError, LevelSet, plan_levels};
pub use metrics::{GeomMetrics, GeomTimingReport, TimingBucket};
pub use triangulation::{Barycentric, Triangulation, TriangulationDiagnostics};

#[cfg(test)]
mod tests;
