//! Domain models for the reshape and metrics engine.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Period`] - A year, compared as an integer even when read from text
//! - [`WideTable`] - One row per entity, one column per period
//! - [`LongSeries`] - Ordered `(period, value)` pairs for one entity
//! - [`DetailImport`] - One commodity row of the detail import table
//! - [`MergedFrame`] / [`CorrelationMatrix`] - Joined series and their correlation
//!
//! Every table here is derived in memory and never persisted.

mod frame;

pub use frame::{CorrelationMatrix, MeltedPoint, MergedFrame, MergedRow};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{ReshapeError, ReshapeResult};

// =============================================================================
// Period
// =============================================================================

/// A reporting period (calendar year).
///
/// Source headers carry years as text (`"2021"`); they are normalized to an
/// integer before any comparison so that ordering never depends on spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(i32);

impl Period {
    pub const fn new(year: i32) -> Self {
        Self(year)
    }

    pub const fn year(self) -> i32 {
        self.0
    }

    /// The period immediately before this one.
    pub const fn previous(self) -> Self {
        Self(self.0 - 1)
    }

    /// Normalize header or cell text into a period.
    ///
    /// Accepts `"2021"`, `" 2021 "`, `"\"2021\""` and `"2021.0"`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().trim_matches('"').trim();
        if text.is_empty() {
            return None;
        }
        if let Ok(year) = text.parse::<i32>() {
            return Some(Self(year));
        }
        let float = text.parse::<f64>().ok()?;
        if float.is_finite()
            && float.fract() == 0.0
            && float >= i32::MIN as f64
            && float <= i32::MAX as f64
        {
            Some(Self(float as i32))
        } else {
            None
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("'{}' is not a year", s))
    }
}

impl From<i32> for Period {
    fn from(year: i32) -> Self {
        Self(year)
    }
}

/// Parse a numeric cell into a 64-bit value.
///
/// Empty and placeholder cells (`NA`, `NaN`, `..`, `-`) are missing.
/// Decimal text is truncated toward zero, like an `int64` cast.
pub fn parse_cell(text: &str) -> Result<Option<i64>, String> {
    let text = text.trim().trim_matches('"').trim();
    if text.is_empty() || matches!(text, "NA" | "NaN" | "nan" | ".." | "-") {
        return Ok(None);
    }
    if let Ok(v) = text.parse::<i64>() {
        return Ok(Some(v));
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v.trunc() as i64)),
        _ => Err("not a number".to_string()),
    }
}

// =============================================================================
// Wide Table
// =============================================================================

/// One row of a [`WideTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WideRow {
    /// Identifying value (country name, sector or category label).
    pub key: String,
    /// Extra text columns, aligned with [`WideTable::attribute_columns`].
    pub attributes: Vec<String>,
    /// One cell per period, aligned with [`WideTable::periods`].
    pub values: Vec<Option<i64>>,
}

impl WideRow {
    pub fn new(key: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Self {
            key: key.into(),
            attributes: Vec::new(),
            values,
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Rows keyed by one identifying column with one numeric column per period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WideTable {
    id_column: String,
    attribute_columns: Vec<String>,
    periods: Vec<Period>,
    rows: Vec<WideRow>,
}

impl WideTable {
    /// Build a table, checking that keys are unique, periods strictly
    /// increase and every row has one cell per column.
    pub fn new(
        id_column: impl Into<String>,
        attribute_columns: Vec<String>,
        periods: Vec<Period>,
        rows: Vec<WideRow>,
    ) -> ReshapeResult<Self> {
        if let Some(pair) = periods.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ReshapeError::InvalidTable(format!(
                "period columns must increase, found {} before {}",
                pair[0], pair[1]
            )));
        }

        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert(row.key.as_str()) {
                return Err(ReshapeError::InvalidTable(format!(
                    "duplicate key '{}'",
                    row.key
                )));
            }
            if row.values.len() != periods.len() {
                return Err(ReshapeError::InvalidTable(format!(
                    "row '{}' has {} values for {} periods",
                    row.key,
                    row.values.len(),
                    periods.len()
                )));
            }
            if row.attributes.len() != attribute_columns.len() {
                return Err(ReshapeError::InvalidTable(format!(
                    "row '{}' has {} attributes for {} columns",
                    row.key,
                    row.attributes.len(),
                    attribute_columns.len()
                )));
            }
        }

        Ok(Self {
            id_column: id_column.into(),
            attribute_columns,
            periods,
            rows,
        })
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn attribute_columns(&self) -> &[String] {
        &self.attribute_columns
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_period(&self) -> Option<Period> {
        self.periods.first().copied()
    }

    pub fn last_period(&self) -> Option<Period> {
        self.periods.last().copied()
    }

    /// Position of a period column.
    pub fn period_index(&self, period: Period) -> Option<usize> {
        self.periods.binary_search(&period).ok()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.key.as_str())
    }

    pub fn row(&self, key: &str) -> Option<&WideRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.row(key).is_some()
    }

    /// Cell lookup. Outer `None`: no such row or period. Inner `None`: missing cell.
    pub fn cell(&self, key: &str, period: Period) -> Option<Option<i64>> {
        let idx = self.period_index(period)?;
        self.row(key).map(|r| r.values[idx])
    }

    /// Keep only rows whose attribute `column` is in `allowed`.
    ///
    /// Codes are compared trimmed and case-insensitively.
    pub fn retain_attribute(&mut self, column: &str, allowed: &HashSet<String>) -> ReshapeResult<()> {
        let idx = self
            .attribute_columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| ReshapeError::not_found("column", column))?;

        let allowed: HashSet<String> = allowed.iter().map(|c| normalize_code(c)).collect();
        self.rows
            .retain(|r| allowed.contains(&normalize_code(&r.attributes[idx])));
        Ok(())
    }

    /// A table with the same columns and a subset (or reordering) of rows.
    pub(crate) fn with_rows(&self, rows: Vec<WideRow>) -> Self {
        Self {
            id_column: self.id_column.clone(),
            attribute_columns: self.attribute_columns.clone(),
            periods: self.periods.clone(),
            rows,
        }
    }

    /// A table restricted to the period columns `[from, to)` by index.
    pub(crate) fn with_period_slice(&self, rows: &[&WideRow], from: usize, to: usize) -> Self {
        Self {
            id_column: self.id_column.clone(),
            attribute_columns: self.attribute_columns.clone(),
            periods: self.periods[from..to].to_vec(),
            rows: rows
                .iter()
                .map(|r| WideRow {
                    key: r.key.clone(),
                    attributes: r.attributes.clone(),
                    values: r.values[from..to].to_vec(),
                })
                .collect(),
        }
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

// =============================================================================
// Long Series
// =============================================================================

/// One `(period, value)` pair of a [`LongSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub period: Period,
    pub value: Option<i64>,
}

/// Ordered values of one entity over time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongSeries {
    label: String,
    points: Vec<SeriesPoint>,
}

impl LongSeries {
    /// Build a series, checking that periods strictly increase.
    pub fn new(label: impl Into<String>, points: Vec<SeriesPoint>) -> ReshapeResult<Self> {
        let label = label.into();
        if let Some(pair) = points.windows(2).find(|w| w[0].period >= w[1].period) {
            return Err(ReshapeError::InvalidTable(format!(
                "series '{}' periods must increase, found {} before {}",
                label, pair[0].period, pair[1].period
            )));
        }
        Ok(Self { label, points })
    }

    /// Convenience constructor from `(year, value)` pairs.
    pub fn from_pairs(
        label: impl Into<String>,
        pairs: impl IntoIterator<Item = (i32, Option<i64>)>,
    ) -> ReshapeResult<Self> {
        let points = pairs
            .into_iter()
            .map(|(year, value)| SeriesPoint {
                period: Period::new(year),
                value,
            })
            .collect();
        Self::new(label, points)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.points.iter().map(|p| p.period)
    }

    /// Value at a period; `None` when the period is absent or the cell is missing.
    pub fn value_at(&self, period: Period) -> Option<i64> {
        self.points
            .binary_search_by(|p| p.period.cmp(&period))
            .ok()
            .and_then(|i| self.points[i].value)
    }
}

// =============================================================================
// Detail Import
// =============================================================================

/// One commodity row of the detail import table (`tahun`, `nama_data`, `value`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailImport {
    pub year: Period,
    pub commodity: String,
    pub value: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> WideTable {
        WideTable::new(
            "Country Name",
            vec!["Country Code".to_string()],
            vec![Period::new(2020), Period::new(2021)],
            vec![
                WideRow::new("Indonesia", vec![Some(1058), Some(1186)])
                    .with_attributes(vec!["IDN".to_string()]),
                WideRow::new("World", vec![Some(84000), None])
                    .with_attributes(vec!["WLD".to_string()]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_period_normalization() {
        assert_eq!(Period::parse("2021"), Some(Period::new(2021)));
        assert_eq!(Period::parse(" 2021 "), Some(Period::new(2021)));
        assert_eq!(Period::parse("\"2021\""), Some(Period::new(2021)));
        assert_eq!(Period::parse("2021.0"), Some(Period::new(2021)));
        assert_eq!(Period::parse("2021.5"), None);
        assert_eq!(Period::parse("Country Code"), None);
        assert!("1999".parse::<Period>().is_ok());
    }

    #[test]
    fn test_period_ordering_is_numeric() {
        assert!(Period::parse("999").unwrap() < Period::parse("2021").unwrap());
        assert_eq!(Period::new(2010).previous(), Period::new(2009));
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("1186").unwrap(), Some(1186));
        assert_eq!(parse_cell("1186092991320.04").unwrap(), Some(1186092991320));
        assert_eq!(parse_cell("-3.9").unwrap(), Some(-3));
        assert_eq!(parse_cell("").unwrap(), None);
        assert_eq!(parse_cell("..").unwrap(), None);
        assert!(parse_cell("abc").is_err());
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let err = WideTable::new(
            "k",
            vec![],
            vec![Period::new(2020)],
            vec![WideRow::new("a", vec![Some(1)]), WideRow::new("a", vec![Some(2)])],
        )
        .unwrap_err();
        assert!(matches!(err, ReshapeError::InvalidTable(_)));
    }

    #[test]
    fn test_rejects_unordered_periods() {
        let err = WideTable::new(
            "k",
            vec![],
            vec![Period::new(2021), Period::new(2020)],
            vec![],
        )
        .unwrap_err();
        assert!(err.to_string().contains("must increase"));
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = WideTable::new(
            "k",
            vec![],
            vec![Period::new(2020), Period::new(2021)],
            vec![WideRow::new("a", vec![Some(1)])],
        )
        .unwrap_err();
        assert!(matches!(err, ReshapeError::InvalidTable(_)));
    }

    #[test]
    fn test_cell_lookup() {
        let t = table();
        assert_eq!(t.cell("Indonesia", Period::new(2021)), Some(Some(1186)));
        assert_eq!(t.cell("World", Period::new(2021)), Some(None));
        assert_eq!(t.cell("Indonesia", Period::new(2019)), None);
        assert_eq!(t.cell("Atlantis", Period::new(2021)), None);
    }

    #[test]
    fn test_retain_attribute() {
        let mut t = table();
        let allowed: HashSet<String> = ["IDN".to_string()].into_iter().collect();
        t.retain_attribute("Country Code", &allowed).unwrap();
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["Indonesia"]);

        let err = t.retain_attribute("Region", &allowed).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_retain_attribute_ignores_case() {
        let mut t = WideTable::new(
            "Country Name",
            vec!["Country Code".to_string()],
            vec![Period::new(2021)],
            vec![
                WideRow::new("Indonesia", vec![Some(1186)]).with_attributes(vec!["idn".to_string()]),
                WideRow::new("Turkiye", vec![Some(819)]).with_attributes(vec![" TUR ".to_string()]),
                WideRow::new("World", vec![Some(96_000)]).with_attributes(vec!["WLD".to_string()]),
            ],
        )
        .unwrap();
        let allowed: HashSet<String> = ["IDN".to_string(), "tur".to_string()].into_iter().collect();
        t.retain_attribute("Country Code", &allowed).unwrap();
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["Indonesia", "Turkiye"]);
    }

    #[test]
    fn test_series_requires_increasing_periods() {
        assert!(LongSeries::from_pairs("x", [(2020, Some(1)), (2020, Some(2))]).is_err());
        let s = LongSeries::from_pairs("x", [(2019, Some(1)), (2021, None)]).unwrap();
        assert_eq!(s.value_at(Period::new(2019)), Some(1));
        assert_eq!(s.value_at(Period::new(2021)), None);
        assert_eq!(s.value_at(Period::new(2020)), None);
    }
}
