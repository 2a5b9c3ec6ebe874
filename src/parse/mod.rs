//! Parsers that turn host input into survey points.

pub mod points;

pub use points::{ParsedPoints, PointParseError, parse_flat_points, parse_manual_points};
