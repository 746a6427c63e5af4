//! Row selection and wide-to-long reshaping.
//!
//! ```text
//! WideTable                         LongSeries "gdp_value"
//! ┌───────────┬──────┬──────┐       ┌──────┬───────┐
//! │ Country   │ 2020 │ 2021 │  →    │ 2020 │ 1058  │
//! │ Indonesia │ 1058 │ 1186 │       │ 2021 │ 1186  │
//! └───────────┴──────┴──────┘       └──────┴───────┘
//! ```

use crate::error::{ReshapeError, ReshapeResult};
use crate::models::{LongSeries, Period, SeriesPoint, WideTable};

/// Typed column accessor: the values of one period column in row order,
/// or `None` when the table has no such period.
pub fn get_column(table: &WideTable, period: Period) -> Option<Vec<Option<i64>>> {
    let idx = table.period_index(period)?;
    Some(table.rows().iter().map(|r| r.values[idx]).collect())
}

/// Filter to the row(s) matching `entity_key`, restricted to the period
/// window `[start, end]`.
///
/// Fails with `NotFound` when no row matches and with `Range` when the window
/// is inverted, reaches past the first or last period column, or holds no
/// period column at all.
pub fn select_entity_rows(
    table: &WideTable,
    entity_key: &str,
    start: Period,
    end: Period,
) -> ReshapeResult<WideTable> {
    let (first, last) = match (table.first_period(), table.last_period()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(ReshapeError::InvalidTable(
                "table has no period columns".to_string(),
            ))
        }
    };

    if start > end || start < first || end > last {
        return Err(ReshapeError::Range {
            start,
            end,
            first,
            last,
        });
    }

    let rows: Vec<_> = table.rows().iter().filter(|r| r.key == entity_key).collect();
    if rows.is_empty() {
        return Err(ReshapeError::not_found(entity_kind(table), entity_key));
    }

    // Periods are sorted, so the window is a contiguous slice.
    let periods = table.periods();
    let from = periods.partition_point(|p| *p < start);
    let to = periods.partition_point(|p| *p <= end);
    if from == to {
        // Window falls between two period columns of a table with a gap.
        return Err(ReshapeError::Range {
            start,
            end,
            first,
            last,
        });
    }

    Ok(table.with_period_slice(&rows, from, to))
}

/// Pivot a single-row table into a series labelled `value_column_name`,
/// one point per period column, left to right.
pub fn pivot_to_long(table: &WideTable, value_column_name: &str) -> ReshapeResult<LongSeries> {
    let row = match table.rows() {
        [row] => row,
        rows => return Err(ReshapeError::shape("exactly one row", rows.len())),
    };

    let points = table
        .periods()
        .iter()
        .zip(&row.values)
        .map(|(&period, &value)| SeriesPoint { period, value })
        .collect();

    LongSeries::new(value_column_name, points)
}

/// Series of one entity over every period, labelled with the entity key.
pub fn series_of(table: &WideTable, entity_key: &str) -> ReshapeResult<LongSeries> {
    let row = table
        .row(entity_key)
        .ok_or_else(|| ReshapeError::not_found(entity_kind(table), entity_key))?;

    let points = table
        .periods()
        .iter()
        .zip(&row.values)
        .map(|(&period, &value)| SeriesPoint { period, value })
        .collect();

    LongSeries::new(entity_key, points)
}

/// Series for each key, in the order given.
pub fn series_for_keys(table: &WideTable, keys: &[String]) -> ReshapeResult<Vec<LongSeries>> {
    keys.iter().map(|k| series_of(table, k)).collect()
}

/// Name used in `NotFound` errors: the identifying column of the table.
fn entity_kind(table: &WideTable) -> &'static str {
    match table.id_column() {
        "Country Name" => "country",
        "lapangan_usaha" => "sector",
        "golongan_sitc" => "import category",
        _ => "entity",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WideRow;

    fn gdp() -> WideTable {
        WideTable::new(
            "Country Name",
            vec![],
            vec![Period::new(2019), Period::new(2020), Period::new(2021)],
            vec![
                WideRow::new("Indonesia", vec![Some(1119), Some(1058), Some(1186)]),
                WideRow::new("United States", vec![Some(21381), Some(20893), Some(23315)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_get_column() {
        let t = gdp();
        assert_eq!(get_column(&t, Period::new(2020)), Some(vec![Some(1058), Some(20893)]));
        assert_eq!(get_column(&t, Period::new(1999)), None);
    }

    #[test]
    fn test_select_window() {
        let t = gdp();
        let selected = select_entity_rows(&t, "Indonesia", Period::new(2020), Period::new(2021)).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.periods(), &[Period::new(2020), Period::new(2021)]);
        assert_eq!(selected.rows()[0].values, vec![Some(1058), Some(1186)]);
    }

    #[test]
    fn test_select_missing_entity_is_not_found() {
        let t = gdp();
        let err = select_entity_rows(&t, "Atlantis", Period::new(2019), Period::new(2021)).unwrap_err();
        assert_eq!(err, ReshapeError::not_found("country", "Atlantis"));
    }

    #[test]
    fn test_select_window_out_of_range() {
        let t = gdp();
        let err = select_entity_rows(&t, "Indonesia", Period::new(2018), Period::new(2021)).unwrap_err();
        assert!(matches!(err, ReshapeError::Range { .. }));

        let err = select_entity_rows(&t, "Indonesia", Period::new(2021), Period::new(2019)).unwrap_err();
        assert!(matches!(err, ReshapeError::Range { .. }));

        let err = select_entity_rows(&t, "Indonesia", Period::new(2020), Period::new(2022)).unwrap_err();
        assert!(matches!(err, ReshapeError::Range { .. }));
    }

    #[test]
    fn test_select_window_inside_gap() {
        let t = WideTable::new(
            "Country Name",
            vec![],
            vec![Period::new(2019), Period::new(2021)],
            vec![WideRow::new("Indonesia", vec![Some(1119), Some(1186)])],
        )
        .unwrap();

        let err = select_entity_rows(&t, "Indonesia", Period::new(2020), Period::new(2020)).unwrap_err();
        assert!(matches!(err, ReshapeError::Range { .. }));

        let both = select_entity_rows(&t, "Indonesia", Period::new(2019), Period::new(2021)).unwrap();
        assert_eq!(both.periods().len(), 2);
    }

    #[test]
    fn test_pivot_keeps_column_order_and_length() {
        let t = gdp();
        let one = select_entity_rows(&t, "Indonesia", Period::new(2019), Period::new(2021)).unwrap();
        let series = pivot_to_long(&one, "gdp_value").unwrap();

        assert_eq!(series.label(), "gdp_value");
        assert_eq!(series.len(), one.periods().len());
        assert_eq!(series.periods().collect::<Vec<_>>(), one.periods().to_vec());
        assert_eq!(series.value_at(Period::new(2021)), Some(1186));
    }

    #[test]
    fn test_pivot_requires_one_row() {
        let err = pivot_to_long(&gdp(), "gdp_value").unwrap_err();
        assert_eq!(err, ReshapeError::shape("exactly one row", 2));

        let empty = gdp().with_rows(vec![]);
        assert!(matches!(pivot_to_long(&empty, "x"), Err(ReshapeError::Shape { actual: 0, .. })));
    }

    #[test]
    fn test_series_of() {
        let s = series_of(&gdp(), "United States").unwrap();
        assert_eq!(s.label(), "United States");
        assert_eq!(s.len(), 3);
        assert!(series_of(&gdp(), "Mars").unwrap_err().is_not_found());
    }
}
