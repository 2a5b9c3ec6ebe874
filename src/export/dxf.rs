//! ASCII DXF (R12, `AC1009`) encoding of contour scenes.
//!
//! Every scene layer becomes a CAD layer and every polyline a 2-D
//! `POLYLINE`/`VERTEX`/`SEQEND` run. The output depends only on the scene,
//! so the same scene always encodes to the same bytes.
//!
//! [`read_dxf`] parses the subset written here (plus `LWPOLYLINE`) back into
//! layers and polylines.

use std::fmt::Write as _;

use crate::geom::{BBox2, Point2};
use crate::scene::Scene;

/// Colour index 7 renders white on dark and black on light backgrounds.
const DEFAULT_LAYER_COLOR: i32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DxfOptions {
    /// Decimal places for coordinates.
    pub coordinate_precision: usize,
    /// ACI colour assigned to every contour layer.
    pub layer_color: i32,
}

impl Default for DxfOptions {
    fn default() -> Self {
        Self {
            coordinate_precision: 10,
            layer_color: DEFAULT_LAYER_COLOR,
        }
    }
}

impl DxfOptions {
    #[must_use]
    pub fn with_coordinate_precision(mut self, precision: usize) -> Self {
        self.coordinate_precision = precision;
        self
    }

    #[must_use]
    pub fn with_layer_color(mut self, color: i32) -> Self {
        self.layer_color = color;
        self
    }
}

// ============================================================================
// Writer
// ============================================================================

struct DxfWriter {
    out: String,
    precision: usize,
}

impl DxfWriter {
    fn pair(&mut self, code: i32, value: &str) {
        let _ = writeln!(self.out, "{code:>3}");
        let _ = writeln!(self.out, "{value}");
    }

    fn int(&mut self, code: i32, value: i64) {
        let _ = writeln!(self.out, "{code:>3}");
        let _ = writeln!(self.out, "{value}");
    }

    fn real(&mut self, code: i32, value: f64) {
        let value = if value == 0.0 { 0.0 } else { value };
        let precision = self.precision;
        let _ = writeln!(self.out, "{code:>3}");
        let _ = writeln!(self.out, "{value:.precision$}");
    }

    fn point(&mut self, base: i32, p: Point2) {
        self.real(base, p.x);
        self.real(base + 10, p.y);
        self.real(base + 20, 0.0);
    }

    fn begin_section(&mut self, name: &str) {
        self.pair(0, "SECTION");
        self.pair(2, name);
    }

    fn end_section(&mut self) {
        self.pair(0, "ENDSEC");
    }
}

/// Encodes `scene` with default options.
#[must_use]
pub fn write_dxf(scene: &Scene) -> String {
    write_dxf_with(scene, DxfOptions::default())
}

#[must_use]
pub fn write_dxf_with(scene: &Scene, options: DxfOptions) -> String {
    let mut w = DxfWriter {
        out: String::new(),
        precision: options.coordinate_precision,
    };

    let extents = drawing_extents(scene);

    w.begin_section("HEADER");
    w.pair(9, "$ACADVER");
    w.pair(1, "AC1009");
    if let Some(bbox) = extents {
        w.pair(9, "$EXTMIN");
        w.point(10, bbox.min);
        w.pair(9, "$EXTMAX");
        w.point(10, bbox.max);
    }
    w.end_section();

    w.begin_section("TABLES");
    w.pair(0, "TABLE");
    w.pair(2, "LTYPE");
    w.int(70, 1);
    w.pair(0, "LTYPE");
    w.pair(2, "CONTINUOUS");
    w.int(70, 0);
    w.pair(3, "Solid line");
    w.int(72, 65);
    w.int(73, 0);
    w.real(40, 0.0);
    w.pair(0, "ENDTAB");

    w.pair(0, "TABLE");
    w.pair(2, "LAYER");
    w.int(70, (scene.layer_count() + 1) as i64);
    let layer_names = std::iter::once("0").chain(scene.layers().iter().map(|l| l.name.as_str()));
    for name in layer_names {
        w.pair(0, "LAYER");
        w.pair(2, name);
        w.int(70, 0);
        w.int(62, i64::from(options.layer_color));
        w.pair(6, "CONTINUOUS");
    }
    w.pair(0, "ENDTAB");
    w.end_section();

    w.begin_section("ENTITIES");
    for layer in scene.layers() {
        for polyline in &layer.polylines {
            w.pair(0, "POLYLINE");
            w.pair(8, &layer.name);
            w.int(66, 1);
            w.point(10, Point2::ORIGIN);
            w.int(70, i64::from(polyline.closed));
            for &vertex in &polyline.vertices {
                w.pair(0, "VERTEX");
                w.pair(8, &layer.name);
                w.point(10, vertex);
            }
            w.pair(0, "SEQEND");
            w.pair(8, &layer.name);
        }
    }
    w.end_section();
    w.pair(0, "EOF");

    w.out
}

fn drawing_extents(scene: &Scene) -> Option<BBox2> {
    let vertices: Vec<Point2> = scene
        .layers()
        .iter()
        .flat_map(|layer| layer.polylines.iter())
        .flat_map(|polyline| polyline.vertices.iter().copied())
        .chain(scene.points().iter().map(|p| p.xy()))
        .collect();
    BBox2::from_points(&vertices)
}

// ============================================================================
// Reader
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DxfError {
    #[error("line {line}: expected an integer group code, found `{text}`")]
    InvalidGroupCode { line: usize, text: String },
    #[error("line {line}: group code {code} has no value")]
    MissingValue { line: usize, code: i32 },
    #[error("line {line}: group code {code} expects a number, found `{text}`")]
    InvalidNumber { line: usize, code: i32, text: String },
    #[error("POLYLINE on layer `{0}` is not terminated by SEQEND")]
    UnterminatedPolyline(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DxfPolyline {
    pub layer: String,
    pub vertices: Vec<Point2>,
    pub closed: bool,
}

/// Layers and polylines recovered from a DXF document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DxfDrawing {
    /// Layer table entries in file order.
    pub layers: Vec<String>,
    pub polylines: Vec<DxfPolyline>,
}

impl DxfDrawing {
    pub fn polylines_on<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a DxfPolyline> + 'a {
        self.polylines.iter().filter(move |p| p.layer == layer)
    }
}

struct Group<'a> {
    line: usize,
    code: i32,
    value: &'a str,
}

impl Group<'_> {
    fn number(&self) -> Result<f64, DxfError> {
        self.value.trim().parse().map_err(|_| DxfError::InvalidNumber {
            line: self.line + 1,
            code: self.code,
            text: self.value.to_owned(),
        })
    }

    fn is(&self, code: i32, value: &str) -> bool {
        self.code == code && self.value.trim() == value
    }
}

fn groups(input: &str) -> Result<Vec<Group<'_>>, DxfError> {
    let lines: Vec<&str> = input.lines().map(|l| l.trim_end_matches('\r')).collect();
    let mut out = Vec::with_capacity(lines.len() / 2);
    let mut index = 0;
    while index < lines.len() {
        let text = lines[index].trim();
        if text.is_empty() && index + 1 == lines.len() {
            break;
        }
        let code: i32 = text.parse().map_err(|_| DxfError::InvalidGroupCode {
            line: index + 1,
            text: text.to_owned(),
        })?;
        let value = *lines
            .get(index + 1)
            .ok_or(DxfError::MissingValue { line: index + 1, code })?;
        out.push(Group {
            line: index + 1,
            code,
            value,
        });
        index += 2;
    }
    Ok(out)
}

#[derive(Debug)]
enum Entity {
    None,
    /// Inside a `POLYLINE` header or one of its vertices.
    Polyline { polyline: DxfPolyline, vertex: Option<Point2> },
    Lightweight { polyline: DxfPolyline, pending_x: Option<f64> },
}

/// Parses layer names and polylines out of an ASCII DXF document.
pub fn read_dxf(input: &str) -> Result<DxfDrawing, DxfError> {
    let mut drawing = DxfDrawing::default();
    let mut section = String::new();
    let mut expecting_section_name = false;
    let mut in_layer_entry = false;
    let mut entity = Entity::None;

    for group in groups(input)? {
        if expecting_section_name {
            if group.code == 2 {
                section = group.value.trim().to_owned();
            }
            expecting_section_name = false;
            continue;
        }

        if group.code == 0 {
            in_layer_entry = false;
            let keyword = group.value.trim();

            entity = match (std::mem::replace(&mut entity, Entity::None), keyword) {
                (Entity::Polyline { mut polyline, vertex }, "VERTEX") => {
                    polyline.vertices.extend(vertex);
                    Entity::Polyline {
                        polyline,
                        vertex: Some(Point2::ORIGIN),
                    }
                }
                (Entity::Polyline { mut polyline, vertex }, "SEQEND") => {
                    polyline.vertices.extend(vertex);
                    drawing.polylines.push(polyline);
                    Entity::None
                }
                (Entity::Polyline { polyline, .. }, _) => {
                    return Err(DxfError::UnterminatedPolyline(polyline.layer));
                }
                (Entity::Lightweight { polyline, .. }, _) => {
                    drawing.polylines.push(polyline);
                    Entity::None
                }
                (Entity::None, _) => Entity::None,
            };

            match keyword {
                "SECTION" => expecting_section_name = true,
                "ENDSEC" => section.clear(),
                "LAYER" if section == "TABLES" => in_layer_entry = true,
                "POLYLINE" if section == "ENTITIES" => {
                    entity = Entity::Polyline {
                        polyline: empty_polyline(),
                        vertex: None,
                    };
                }
                "LWPOLYLINE" if section == "ENTITIES" => {
                    entity = Entity::Lightweight {
                        polyline: empty_polyline(),
                        pending_x: None,
                    };
                }
                _ => {}
            }
            continue;
        }

        if in_layer_entry && group.code == 2 {
            drawing.layers.push(group.value.trim().to_owned());
            in_layer_entry = false;
            continue;
        }

        match &mut entity {
            Entity::None => {}
            Entity::Polyline { polyline, vertex } => match (group.code, vertex.as_mut()) {
                (8, None) => polyline.layer = group.value.trim().to_owned(),
                (70, None) => polyline.closed = (group.number()? as i64) & 1 == 1,
                (10, Some(p)) => p.x = group.number()?,
                (20, Some(p)) => p.y = group.number()?,
                _ => {}
            },
            Entity::Lightweight { polyline, pending_x } => match group.code {
                8 => polyline.layer = group.value.trim().to_owned(),
                70 => polyline.closed = (group.number()? as i64) & 1 == 1,
                10 => *pending_x = Some(group.number()?),
                20 => {
                    if let Some(x) = pending_x.take() {
                        polyline.vertices.push(Point2::new(x, group.number()?));
                    }
                }
                _ => {}
            },
        }
    }

    match entity {
        Entity::Polyline { polyline, .. } => Err(DxfError::UnterminatedPolyline(polyline.layer)),
        Entity::Lightweight { polyline, .. } => {
            drawing.polylines.push(polyline);
            Ok(drawing)
        }
        Entity::None => Ok(drawing),
    }
}

fn empty_polyline() -> DxfPolyline {
    DxfPolyline {
        layer: String::new(),
        vertices: Vec::new(),
        closed: false,
    }
}
