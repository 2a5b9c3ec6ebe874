//! Opt-in timing hooks for the contour pipeline.
//!
//! Timing is collected only with the `engine_metrics` feature on native
//! targets; `std::time::Instant` is unavailable on `wasm32`. Otherwise every
//! call compiles down to running the closure.
//!
//! ```ignore
//! let mut metrics = GeomMetrics::default();
//! metrics.begin();
//! let grid = metrics.time(TimingBucket::GridSampling, || sample_grid(&surface, bbox, 200));
//! if let Some(report) = metrics.end() {
//!     println!("sampling: {} ns", report.grid_sampling_ns);
//! }
//! ```

use serde::Serialize;

/// Pipeline stages that accumulate time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Input checks before any fitting.
    Validation,
    /// Triangulation plus gradient estimation.
    SurfaceFit,
    /// Evaluating the surface on the lattice.
    GridSampling,
    LevelPlanning,
    /// Marching squares and chain stitching.
    Tracing,
    SceneBuild,
}

/// Cumulative nanoseconds per [`TimingBucket`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct GeomTimingReport {
    pub validation_ns: u64,
    pub surface_fit_ns: u64,
    pub grid_sampling_ns: u64,
    pub level_planning_ns: u64,
    pub tracing_ns: u64,
    pub scene_build_ns: u64,
}

impl GeomTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.validation_ns
            .saturating_add(self.surface_fit_ns)
            .saturating_add(self.grid_sampling_ns)
            .saturating_add(self.level_planning_ns)
            .saturating_add(self.tracing_ns)
            .saturating_add(self.scene_build_ns)
    }

    /// Total in milliseconds, for display.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    fn slot(&mut self, bucket: TimingBucket) -> &mut u64 {
        match bucket {
            TimingBucket::Validation => &mut self.validation_ns,
            TimingBucket::SurfaceFit => &mut self.surface_fit_ns,
            TimingBucket::GridSampling => &mut self.grid_sampling_ns,
            TimingBucket::LevelPlanning => &mut self.level_planning_ns,
            TimingBucket::Tracing => &mut self.tracing_ns,
            TimingBucket::SceneBuild => &mut self.scene_build_ns,
        }
    }

    /// Adds `nanos` to `bucket`, saturating.
    pub fn record(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = self.slot(bucket);
        *slot = slot.saturating_add(nanos);
    }
}

/// Timing accumulator. [`end`](Self::end) returns `None` when metrics are
/// compiled out.
#[derive(Debug, Default)]
pub struct GeomMetrics {
    #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
    report: GeomTimingReport,
}

impl GeomMetrics {
    /// Resets all counters.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            self.report = GeomTimingReport::default();
        }
    }

    #[must_use]
    pub fn end(&self) -> Option<GeomTimingReport> {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "engine_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f`, charging its wall time to `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.report.record(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "engine_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }
}
