//! Diagnostics collected while turning a survey into contours.
//!
//! Returned next to every [`Scene`](crate::scene::Scene) the pipeline builds:
//!
//! ```ignore
//! let output = generate_scene(&points, &ContourOptions::default(), metadata)?;
//! if output.diagnostics.has_undefined_nodes() {
//!     println!("{} nodes fell outside the hull", output.diagnostics.undefined_node_count);
//! }
//! for warning in &output.diagnostics.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! ```

use std::fmt;

use serde::Serialize;

use super::metrics::GeomTimingReport;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ContourDiagnostics {
    /// Points handed to the pipeline.
    pub input_point_count: usize,

    /// Distinct planar positions after coincident samples were merged.
    pub merged_point_count: usize,

    pub triangle_count: usize,

    /// Sliver triangles that never claim a lattice node.
    pub degenerate_triangle_count: usize,

    /// Gauss–Seidel sweeps spent on vertex gradients.
    pub gradient_iterations: usize,

    /// Whether the gradient sweep reached its tolerance before the cap.
    pub gradient_converged: bool,

    /// Lattice nodes per side.
    pub resolution: usize,

    /// Lattice nodes outside the convex hull.
    pub undefined_node_count: usize,

    pub level_count: usize,

    /// Levels that produced no polyline.
    pub empty_level_count: usize,

    pub polyline_count: usize,
    pub closed_polyline_count: usize,

    /// Present only with the `engine_metrics` feature on native targets.
    pub timing: Option<GeomTimingReport>,

    pub warnings: Vec<String>,
}

impl ContourDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Number of samples folded into another sample at the same position.
    #[must_use]
    pub fn merged_duplicate_count(&self) -> usize {
        self.input_point_count.saturating_sub(self.merged_point_count)
    }

    #[must_use]
    pub fn has_undefined_nodes(&self) -> bool {
        self.undefined_node_count > 0
    }

    #[must_use]
    pub fn open_polyline_count(&self) -> usize {
        self.polyline_count.saturating_sub(self.closed_polyline_count)
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// One-line summary for logs: `"P:{points} T:{triangles} L:{levels} C:{polylines} [...]"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "P:{} T:{} L:{} C:{}",
            self.input_point_count, self.triangle_count, self.level_count, self.polyline_count
        )];

        if self.merged_duplicate_count() > 0 {
            parts.push(format!("merged:{}", self.merged_duplicate_count()));
        }
        if self.degenerate_triangle_count > 0 {
            parts.push(format!("slivers:{}", self.degenerate_triangle_count));
        }
        if self.undefined_node_count > 0 {
            parts.push(format!("undefined:{}", self.undefined_node_count));
        }
        if !self.gradient_converged && self.triangle_count > 0 {
            parts.push("gradients-unconverged".to_string());
        }

        parts.join(" ")
    }
}

impl fmt::Display for ContourDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Contour Diagnostics:")?;
        writeln!(
            f,
            "  Points: {} ({} distinct)",
            self.input_point_count, self.merged_point_count
        )?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        writeln!(
            f,
            "  Gradient sweeps: {}{}",
            self.gradient_iterations,
            if self.gradient_converged { "" } else { " (not converged)" }
        )?;
        writeln!(
            f,
            "  Grid: {0}x{0}, {1} undefined nodes",
            self.resolution, self.undefined_node_count
        )?;
        writeln!(
            f,
            "  Levels: {} ({} empty)",
            self.level_count, self.empty_level_count
        )?;
        writeln!(
            f,
            "  Polylines: {} ({} closed, {} open)",
            self.polyline_count,
            self.closed_polyline_count,
            self.open_polyline_count()
        )?;

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_warnings() {
        let diag = ContourDiagnostics::default();
        assert!(!diag.has_warnings());
        assert!(!diag.has_undefined_nodes());
        assert_eq!(diag.merged_duplicate_count(), 0);
    }

    #[test]
    fn summary_lists_only_notable_counts() {
        let diag = ContourDiagnostics {
            input_point_count: 12,
            merged_point_count: 10,
            triangle_count: 14,
            gradient_converged: true,
            level_count: 5,
            polyline_count: 7,
            ..Default::default()
        };
        let summary = diag.summary();
        assert!(summary.contains("P:12"));
        assert!(summary.contains("T:14"));
        assert!(summary.contains("L:5"));
        assert!(summary.contains("C:7"));
        assert!(summary.contains("merged:2"));
        assert!(!summary.contains("undefined"));
        assert!(!summary.contains("unconverged"));
    }

    #[test]
    fn display_includes_warnings() {
        let mut diag = ContourDiagnostics {
            polyline_count: 4,
            closed_polyline_count: 3,
            ..Default::default()
        };
        diag.add_warning("gradient estimation hit the iteration cap");

        let output = diag.to_string();
        assert!(output.contains("Polylines: 4 (3 closed, 1 open)"));
        assert!(output.contains("iteration cap"));
    }
}
