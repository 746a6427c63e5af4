//! Period-indexed frames of joined series and their correlation matrix.

use serde::Serialize;

use super::Period;

// =============================================================================
// Merged Frame
// =============================================================================

/// One period of a [`MergedFrame`]; `None` marks a missing value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub period: Period,
    pub values: Vec<Option<i64>>,
}

/// Series joined on period, one value column per label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedFrame {
    columns: Vec<String>,
    rows: Vec<MergedRow>,
}

/// Long-form chart row: one `(period, variable, value)` triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeltedPoint {
    pub period: Period,
    pub variable: String,
    pub value: i64,
}

impl MergedFrame {
    /// Rows must be sorted by period and as wide as `columns`.
    pub(crate) fn from_rows(columns: Vec<String>, rows: Vec<MergedRow>) -> Self {
        debug_assert!(rows.iter().all(|r| r.values.len() == columns.len()));
        debug_assert!(rows.windows(2).all(|w| w[0].period < w[1].period));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.rows.iter().map(|r| r.period)
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Values of one column in period order.
    pub fn column(&self, label: &str) -> Option<Vec<Option<i64>>> {
        let idx = self.column_index(label)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    pub fn value(&self, period: Period, label: &str) -> Option<i64> {
        let idx = self.column_index(label)?;
        self.rows
            .iter()
            .find(|r| r.period == period)
            .and_then(|r| r.values[idx])
    }

    /// Number of missing markers in the frame.
    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.values.iter().filter(|v| v.is_none()).count())
            .sum()
    }

    /// Drop every period that has a missing value in any column.
    pub fn complete_rows(&self) -> MergedFrame {
        let rows = self
            .rows
            .iter()
            .filter(|r| r.values.iter().all(Option::is_some))
            .cloned()
            .collect();
        Self::from_rows(self.columns.clone(), rows)
    }

    /// Reshape into `(period, variable, value)` rows, period-major.
    /// Missing cells produce no row.
    pub fn melt(&self) -> Vec<MeltedPoint> {
        self.rows
            .iter()
            .flat_map(|row| {
                row.values
                    .iter()
                    .zip(&self.columns)
                    .filter_map(move |(value, column)| {
                        value.map(|value| MeltedPoint {
                            period: row.period,
                            variable: column.clone(),
                            value,
                        })
                    })
            })
            .collect()
    }
}

// =============================================================================
// Correlation Matrix
// =============================================================================

/// Square, symmetric matrix of Pearson coefficients.
///
/// `None` marks a coefficient that is undefined (constant column or fewer
/// than two paired observations).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    labels: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub(crate) fn from_values(labels: Vec<String>, values: Vec<Vec<Option<f64>>>) -> Self {
        debug_assert!(values.len() == labels.len());
        debug_assert!(values.iter().all(|row| row.len() == labels.len()));
        Self { labels, values }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Vec<Option<f64>>] {
        &self.values
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row)?.get(col).copied().flatten()
    }

    /// Coefficient between two labelled columns.
    pub fn coefficient(&self, a: &str, b: &str) -> Option<f64> {
        self.get(self.index_of(a)?, self.index_of(b)?)
    }

    /// Smallest defined coefficient (heatmap scale floor).
    pub fn min(&self) -> Option<f64> {
        self.values
            .iter()
            .flatten()
            .flatten()
            .copied()
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
    }

    /// Same coefficients under new labels (e.g. abbreviated axis labels).
    pub fn relabel(self, labels: Vec<String>) -> Self {
        debug_assert!(labels.len() == self.labels.len());
        Self {
            labels,
            values: self.values,
        }
    }
}
