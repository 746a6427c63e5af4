//! Period-aligned joins of several series.
//!
//! Two distinct modes:
//!
//! - [`join_for_chart`] keeps every period seen in any series and marks the
//!   gaps as missing, so each line can still be drawn.
//! - [`join_for_correlation`] keeps only periods where every series has a
//!   value, which is what a listwise correlation needs.

use std::collections::{BTreeMap, HashSet};

use crate::error::{ReshapeError, ReshapeResult};
use crate::models::{LongSeries, MergedFrame, MergedRow, Period};

/// Outer join on period. Absent periods and missing cells become `None`.
pub fn join_for_chart(series: &[LongSeries], labels: &[String]) -> ReshapeResult<MergedFrame> {
    check_labels(series, labels)?;

    let mut by_period: BTreeMap<Period, Vec<Option<i64>>> = BTreeMap::new();
    for (col, s) in series.iter().enumerate() {
        for point in s.points() {
            let row = by_period
                .entry(point.period)
                .or_insert_with(|| vec![None; series.len()]);
            row[col] = point.value;
        }
    }

    let rows = by_period
        .into_iter()
        .map(|(period, values)| MergedRow { period, values })
        .collect();

    Ok(MergedFrame::from_rows(labels.to_vec(), rows))
}

/// Inner join on period, dropping any period where a series has no value.
pub fn join_for_correlation(series: &[LongSeries], labels: &[String]) -> ReshapeResult<MergedFrame> {
    Ok(join_for_chart(series, labels)?.complete_rows())
}

/// One label per series, no duplicates.
fn check_labels(series: &[LongSeries], labels: &[String]) -> ReshapeResult<()> {
    if series.len() != labels.len() {
        return Err(ReshapeError::shape(
            format!("{} labels (one per series)", series.len()),
            labels.len(),
        ));
    }

    let mut seen = HashSet::with_capacity(labels.len());
    if let Some(dup) = labels.iter().find(|l| !seen.insert(l.as_str())) {
        return Err(ReshapeError::shape(
            format!("unique labels, '{}' repeats", dup),
            labels.len(),
        ));
    }

    Ok(())
}

/// Labels taken from the series themselves.
pub fn own_labels(series: &[LongSeries]) -> Vec<String> {
    series.iter().map(|s| s.label().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn pair() -> Vec<LongSeries> {
        vec![
            LongSeries::from_pairs("agri", [(2019, Some(10)), (2020, Some(11)), (2021, Some(13))]).unwrap(),
            LongSeries::from_pairs("impor", [(2020, Some(5)), (2021, Some(7))]).unwrap(),
        ]
    }

    #[test]
    fn test_chart_join_keeps_all_periods() {
        let frame = join_for_chart(&pair(), &labels(&["agri", "impor"])).unwrap();

        assert_eq!(frame.len(), 3);
        assert_eq!(frame.missing_count(), 1);
        assert_eq!(frame.value(Period::new(2019), "impor"), None);
        assert_eq!(frame.value(Period::new(2019), "agri"), Some(10));
    }

    #[test]
    fn test_correlation_join_keeps_shared_periods() {
        let frame = join_for_correlation(&pair(), &labels(&["agri", "impor"])).unwrap();

        assert_eq!(frame.len(), 2);
        assert_eq!(
            frame.periods().collect::<Vec<_>>(),
            vec![Period::new(2020), Period::new(2021)]
        );
        assert_eq!(frame.missing_count(), 0);
    }

    #[test]
    fn test_correlation_join_drops_missing_cells() {
        let series = vec![
            LongSeries::from_pairs("a", [(2020, Some(1)), (2021, None)]).unwrap(),
            LongSeries::from_pairs("b", [(2020, Some(2)), (2021, Some(3))]).unwrap(),
        ];
        let frame = join_for_correlation(&series, &labels(&["a", "b"])).unwrap();
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_label_count_must_match() {
        let err = join_for_chart(&pair(), &labels(&["only"])).unwrap_err();
        assert!(matches!(err, ReshapeError::Shape { actual: 1, .. }));
    }

    #[test]
    fn test_labels_must_be_unique() {
        let err = join_for_correlation(&pair(), &labels(&["x", "x"])).unwrap_err();
        assert!(err.to_string().contains("'x' repeats"));
    }

    #[test]
    fn test_labels_rename_columns() {
        let frame = join_for_chart(&pair(), &labels(&["agri_value", "import_value"])).unwrap();
        assert_eq!(frame.columns(), &labels(&["agri_value", "import_value"])[..]);
        assert_eq!(own_labels(&pair()), labels(&["agri", "impor"]));
    }
}
