//! Layered vector scene assembled from traced contours.
//!
//! The [`Scene`] is the only value that leaves the pipeline. Renderers read
//! its layers, scatter points and value range; the DXF encoder turns the
//! layers into CAD layers one-to-one.

use std::collections::HashMap;

use serde::Serialize;

use crate::geom::{ContourLevel, PointSample, Polyline};

/// Decimal places used for contour labels unless configured otherwise.
pub const DEFAULT_LABEL_PRECISION: usize = 2;

/// Longest layer name an R12 (`AC1009`) reader accepts.
pub const MAX_LAYER_NAME_LEN: usize = 31;

const LAYER_PREFIX: &str = "Kontur_";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("elevations {first} and {second} both map to layer `{name}`")]
    LayerNameCollision { name: String, first: f64, second: f64 },
}

// ============================================================================
// Metadata
// ============================================================================

/// Caption strings a renderer places around the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneMetadata {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub colorbar_label: String,
}

impl SceneMetadata {
    /// Default captions for a map traced at `interval`.
    #[must_use]
    pub fn for_interval(interval: f64) -> Self {
        Self {
            title: format!("Contour Map (Interval {interval} m)"),
            x_label: "X Coordinate".to_owned(),
            y_label: "Y Coordinate".to_owned(),
            colorbar_label: "Elevation (m)".to_owned(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_axis_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    #[must_use]
    pub fn with_colorbar_label(mut self, label: impl Into<String>) -> Self {
        self.colorbar_label = label.into();
        self
    }
}

impl Default for SceneMetadata {
    fn default() -> Self {
        Self::for_interval(1.0)
    }
}

// ============================================================================
// Scene
// ============================================================================

/// All polylines of one contour elevation under a CAD-safe name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub name: String,
    pub elevation: f64,
    /// Elevation text for inline labels.
    pub label: String,
    pub polylines: Vec<Polyline>,
}

/// Immutable result of one contour run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    layers: Vec<Layer>,
    points: Vec<PointSample>,
    value_range: (f64, f64),
    metadata: SceneMetadata,
}

impl Scene {
    /// Layers in ascending elevation.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// Survey points as supplied, for scatter annotation.
    #[must_use]
    pub fn points(&self) -> &[PointSample] {
        &self.points
    }

    /// `(min, max)` of the defined grid values, for colour scales.
    #[must_use]
    pub fn value_range(&self) -> (f64, f64) {
        self.value_range
    }

    #[must_use]
    pub fn metadata(&self) -> &SceneMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn polyline_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.polylines.len()).sum()
    }

    pub fn elevations(&self) -> impl Iterator<Item = f64> + '_ {
        self.layers.iter().map(|layer| layer.elevation)
    }
}

// ============================================================================
// Naming
// ============================================================================

fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

/// CAD layer name for a contour elevation.
///
/// Two decimals when they represent the elevation exactly, otherwise the
/// shortest text that parses back to it. `.` becomes `_` and `-` becomes
/// `m`, so `-2.5` maps to `Kontur_m2_50`.
///
/// Levels start at the sampled grid minimum, which is rarely a round
/// number, so names such as `Kontur_1_019304541362277` are the common case
/// for real data. Text that would push the name past [`MAX_LAYER_NAME_LEN`] is
/// replaced by `x` and the 16 hex digits of the IEEE-754 bit pattern.
/// Decimal text never contains `x`, so distinct elevations always get
/// distinct names.
#[must_use]
pub fn layer_name(elevation: f64) -> String {
    let elevation = normalize_zero(elevation);
    let fixed = format!("{elevation:.2}");
    let text = if fixed.parse::<f64>().is_ok_and(|parsed| parsed == elevation) {
        fixed
    } else {
        elevation.to_string()
    };
    if LAYER_PREFIX.len() + text.len() > MAX_LAYER_NAME_LEN {
        return format!("{LAYER_PREFIX}x{:016X}", elevation.to_bits());
    }
    let mut name = String::with_capacity(LAYER_PREFIX.len() + text.len());
    name.push_str(LAYER_PREFIX);
    name.extend(text.chars().map(|c| match c {
        '.' => '_',
        '-' => 'm',
        other => other,
    }));
    name
}

/// Label text for a contour elevation at fixed `precision`.
#[must_use]
pub fn contour_label(elevation: f64, precision: usize) -> String {
    format!("{:.precision$}", normalize_zero(elevation))
}

// ============================================================================
// Builder
// ============================================================================

/// Groups traced levels into named layers.
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    metadata: SceneMetadata,
    label_precision: usize,
}

impl SceneBuilder {
    #[must_use]
    pub fn new(metadata: SceneMetadata) -> Self {
        Self {
            metadata,
            label_precision: DEFAULT_LABEL_PRECISION,
        }
    }

    #[must_use]
    pub fn with_label_precision(mut self, precision: usize) -> Self {
        self.label_precision = precision;
        self
    }

    /// One layer per level, in level order, polylines untouched.
    pub fn build(
        self,
        levels: Vec<ContourLevel>,
        points: &[PointSample],
        value_range: (f64, f64),
    ) -> Result<Scene, SceneError> {
        let mut seen: HashMap<String, f64> = HashMap::with_capacity(levels.len());
        let mut layers = Vec::with_capacity(levels.len());

        for level in levels {
            let name = layer_name(level.elevation);
            if let Some(&first) = seen.get(&name) {
                return Err(SceneError::LayerNameCollision {
                    name,
                    first,
                    second: level.elevation,
                });
            }
            seen.insert(name.clone(), level.elevation);

            layers.push(Layer {
                name,
                elevation: level.elevation,
                label: contour_label(level.elevation, self.label_precision),
                polylines: level.polylines,
            });
        }

        log::debug!(
            "built scene with {} layers and {} scatter points",
            layers.len(),
            points.len()
        );

        Ok(Scene {
            layers,
            points: points.to_vec(),
            value_range,
            metadata: self.metadata,
        })
    }
}
