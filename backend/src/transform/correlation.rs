//! Pearson correlation over merged series and threshold selection.
//!
//! # Missing values
//!
//! Two policies are available and callers pick one explicitly:
//!
//! | Policy     | Rows used for the pair (a, b)                        |
//! |------------|------------------------------------------------------|
//! | `Pairwise` | periods where both `a` and `b` have a value          |
//! | `Listwise` | periods where *every* column of the frame has a value |
//!
//! They agree on complete frames and differ when columns have
//! non-overlapping gaps.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ReshapeError, ReshapeResult};
use crate::models::{CorrelationMatrix, MergedFrame};

/// Threshold used to pick "related" import categories for a sector.
pub const DEFAULT_RELATED_THRESHOLD: f64 = 0.71;

/// How rows with missing values are excluded before correlating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationPolicy {
    /// Per pair of columns, use the periods where both are present.
    #[default]
    Pairwise,
    /// Drop every period with any missing value, then correlate.
    Listwise,
}

impl FromStr for CorrelationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pairwise" => Ok(Self::Pairwise),
            "listwise" => Ok(Self::Listwise),
            other => Err(format!("unknown correlation policy '{}'", other)),
        }
    }
}

/// Pearson coefficient for every pair of value columns of `frame`.
pub fn pearson_correlation(frame: &MergedFrame, policy: CorrelationPolicy) -> CorrelationMatrix {
    let frame = match policy {
        CorrelationPolicy::Pairwise => frame.clone(),
        CorrelationPolicy::Listwise => frame.complete_rows(),
    };

    let columns: Vec<Vec<Option<f64>>> = frame
        .columns()
        .iter()
        .map(|label| {
            frame
                .column(label)
                .unwrap_or_default()
                .into_iter()
                .map(|v| v.map(|v| v as f64))
                .collect()
        })
        .collect();

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = pearson(&columns[i], &columns[i]).map(|_| 1.0);
        for j in i + 1..n {
            let r = pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix::from_values(frame.columns().to_vec(), values)
}

/// Coefficient over the positions where both columns are present.
fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Labels whose coefficient with `base_column` is strictly above `threshold`.
///
/// Keeps matrix order and leaves out `base_column` itself.
pub fn threshold_filter(
    matrix: &CorrelationMatrix,
    base_column: &str,
    threshold: f64,
) -> ReshapeResult<Vec<String>> {
    let base = matrix
        .index_of(base_column)
        .ok_or_else(|| ReshapeError::not_found("column", base_column))?;

    Ok(matrix
        .labels()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != base)
        .filter(|(i, _)| matrix.get(base, *i).is_some_and(|r| r > threshold))
        .map(|(_, label)| label.clone())
        .collect())
}

static CODE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?[A-Z0-9]\.).+$").expect("static regex"));

/// Shorten a coded label to its code: `"C. Industri Pengolahan"` → `"C."`.
pub fn abbreviate_label(label: &str) -> String {
    CODE_PREFIX.replace(label, "$1").into_owned()
}
