//! Survey point input: pasted `X,Y,Z` text or flat coordinate arrays.

use thiserror::Error;

use crate::geom::PointSample;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointParseError {
    /// No text at all.
    #[error("manual point data must not be empty")]
    Empty,
    /// Text present but no line held three numbers.
    #[error("no valid `X,Y,Z` rows found ({skipped} lines skipped); use one X,Y,Z triple per line")]
    NoValidRows { skipped: usize },
    /// Flat coordinate array whose length is not a multiple of three.
    #[error("coordinate array length {0} is not a multiple of 3")]
    RaggedArray(usize),
}

/// Points read from text plus the number of rejected lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPoints {
    pub points: Vec<PointSample>,
    /// Non-blank lines that were not a valid `X,Y,Z` triple.
    pub skipped: usize,
}

/// Parses one `X,Y,Z` triple per line.
///
/// Blank lines are ignored. Lines that do not split into exactly three
/// comma-separated numbers are skipped and counted rather than failing the
/// whole input.
pub fn parse_manual_points(text: &str) -> Result<ParsedPoints, PointParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PointParseError::Empty);
    }

    let mut points = Vec::new();
    let mut skipped = 0;
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match parse_row(line) {
            Some(point) => points.push(point),
            None => {
                log::debug!("skipping malformed point row `{line}`");
                skipped += 1;
            }
        }
    }

    if points.is_empty() {
        return Err(PointParseError::NoValidRows { skipped });
    }
    Ok(ParsedPoints { points, skipped })
}

fn parse_row(line: &str) -> Option<PointSample> {
    let mut fields = line.split(',').map(|field| field.trim().parse::<f64>());
    let x = fields.next()?.ok()?;
    let y = fields.next()?.ok()?;
    let z = fields.next()?.ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(PointSample::new(x, y, z))
}

/// Reads `[x0, y0, z0, x1, y1, z1, ...]`.
pub fn parse_flat_points(coords: &[f64]) -> Result<Vec<PointSample>, PointParseError> {
    if coords.len() % 3 != 0 {
        return Err(PointParseError::RaggedArray(coords.len()));
    }
    Ok(coords
        .chunks_exact(3)
        .map(|c| PointSample::new(c[0], c[1], c[2]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{PointParseError, parse_flat_points, parse_manual_points};
    use crate::geom::PointSample;

    #[test]
    fn parses_triples_and_skips_bad_rows() {
        let text = "0,0,10\n 1.5 , 2 , 11.25 \n\nnot,a,row\n1,2\n1,2,3,4\n3,4,1e2\r\n";
        let parsed = parse_manual_points(text).unwrap();
        assert_eq!(
            parsed.points,
            vec![
                PointSample::new(0.0, 0.0, 10.0),
                PointSample::new(1.5, 2.0, 11.25),
                PointSample::new(3.0, 4.0, 100.0),
            ]
        );
        assert_eq!(parsed.skipped, 3);
    }

    #[test]
    fn empty_text_is_rejected() {
        assert_eq!(parse_manual_points("  \n \n"), Err(PointParseError::Empty));
    }

    #[test]
    fn text_without_valid_rows_is_rejected() {
        assert_eq!(
            parse_manual_points("x,y,z\nfoo"),
            Err(PointParseError::NoValidRows { skipped: 2 })
        );
    }

    #[test]
    fn flat_arrays_must_hold_whole_triples() {
        let points = parse_flat_points(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], PointSample::new(3.0, 4.0, 5.0));
        assert_eq!(parse_flat_points(&[1.0, 2.0]), Err(PointParseError::RaggedArray(2)));
    }
}
