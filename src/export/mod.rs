//! Encoders that turn a [`Scene`](crate::scene::Scene) into exchange formats.

pub mod dxf;

pub use dxf::{DxfDrawing, DxfError, DxfOptions, DxfPolyline, read_dxf, write_dxf, write_dxf_with};
