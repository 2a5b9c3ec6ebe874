//! Contour elevation planning.

use serde::Serialize;

/// Cap on the number of planned levels when the caller does not set one.
pub const DEFAULT_MAX_LEVELS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LevelError {
    #[error("contour interval must be a finite value greater than zero (got {0})")]
    InvalidInterval(f64),
    #[error("elevation range [{min}, {max}] is not finite or inverted")]
    InvalidRange { min: f64, max: f64 },
    #[error("interval {interval} produces no increasing contour levels from {start}")]
    EmptyLevelSet { start: f64, interval: f64 },
    #[error("interval {interval} would produce {count} contour levels (limit {limit})")]
    TooManyLevels { interval: f64, count: usize, limit: usize },
}

/// Strictly increasing, non-empty sequence of contour elevations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LevelSet(Vec<f64>);

impl LevelSet {
    /// Wraps caller-supplied levels, checking they are finite and strictly
    /// increasing.
    pub fn from_levels(levels: Vec<f64>) -> Result<Self, LevelError> {
        let increasing = levels.windows(2).all(|w| w[0] < w[1]);
        if levels.is_empty() || !increasing || levels.iter().any(|l| !l.is_finite()) {
            return Err(LevelError::EmptyLevelSet {
                start: levels.first().copied().unwrap_or(f64::NAN),
                interval: f64::NAN,
            });
        }
        Ok(Self(levels))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> f64 {
        self.0[0]
    }

    #[must_use]
    pub fn last(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }
}

/// Plans contour levels `z_min, z_min + interval, ...` covering `z_max`.
///
/// Follows half-open `arange` semantics over `[z_min, z_max + interval)`,
/// so the last level is at or above `z_max`. A flat range gives one level.
pub fn plan_levels(
    z_min: f64,
    z_max: f64,
    interval: f64,
    max_levels: usize,
) -> Result<LevelSet, LevelError> {
    if !interval.is_finite() || interval <= 0.0 {
        return Err(LevelError::InvalidInterval(interval));
    }
    if !z_min.is_finite() || !z_max.is_finite() || z_max < z_min {
        return Err(LevelError::InvalidRange {
            min: z_min,
            max: z_max,
        });
    }

    let empty = || LevelError::EmptyLevelSet {
        start: z_min,
        interval,
    };

    let span = (z_max + interval - z_min) / interval;
    if !span.is_finite() {
        return Err(empty());
    }
    let count = span.ceil();
    if count < 1.0 {
        return Err(empty());
    }
    if count > max_levels as f64 {
        return Err(LevelError::TooManyLevels {
            interval,
            count: if count >= usize::MAX as f64 {
                usize::MAX
            } else {
                count as usize
            },
            limit: max_levels,
        });
    }

    let mut count = count as usize;
    let mut levels: Vec<f64> = (0..count).map(|k| z_min + k as f64 * interval).collect();
    if !levels.windows(2).all(|w| w[0] < w[1]) {
        return Err(empty());
    }

    // The span quotient can round to an integer one step short of `z_max`.
    while let Some(&last) = levels.last().filter(|&&last| last < z_max) {
        if count >= max_levels {
            return Err(LevelError::TooManyLevels {
                interval,
                count: count + 1,
                limit: max_levels,
            });
        }
        let next = z_min + count as f64 * interval;
        if next <= last {
            return Err(empty());
        }
        levels.push(next);
        count += 1;
    }

    log::debug!("planned {count} contour levels from {z_min} step {interval}");
    Ok(LevelSet(levels))
}
