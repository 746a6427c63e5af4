//! Ranking and year-over-year metrics.

use std::cmp::Ordering;

use crate::error::{ReshapeError, ReshapeResult};
use crate::models::{Period, WideRow, WideTable};

/// Sort rows by the `period` column, largest first, and keep the top `top_n`.
///
/// The sort is stable, so ties keep their source row order. Missing cells
/// sort after every present value.
pub fn rank_descending(table: &WideTable, period: Period, top_n: usize) -> ReshapeResult<WideTable> {
    let idx = table
        .period_index(period)
        .ok_or(ReshapeError::UnknownPeriod(period))?;

    let mut rows: Vec<&WideRow> = table.rows().iter().collect();
    rows.sort_by(|a, b| descending(a.values[idx], b.values[idx]));

    Ok(table.with_rows(rows.into_iter().take(top_n).cloned().collect()))
}

/// 0-based position of `entity_key` once the table is ranked by `period`.
pub fn find_rank(table: &WideTable, entity_key: &str, period: Period) -> ReshapeResult<usize> {
    let ranked = rank_descending(table, period, table.len())?;
    let position = ranked.keys().position(|k| k == entity_key);
    position.ok_or_else(|| ReshapeError::not_found("entity", entity_key))
}

/// Change between two consecutive values, saturating at the `i64` bounds.
pub fn year_over_year_delta(current: i64, previous: i64) -> i64 {
    current.saturating_sub(previous)
}

/// Delta of one entity between `period` and the period before it.
///
/// Fails with `MissingPeriod` for the first available year or when either
/// cell is empty.
pub fn period_delta(table: &WideTable, entity_key: &str, period: Period) -> ReshapeResult<i64> {
    let row = table
        .row(entity_key)
        .ok_or_else(|| ReshapeError::not_found("entity", entity_key))?;
    let idx = table
        .period_index(period)
        .ok_or(ReshapeError::UnknownPeriod(period))?;

    let previous = period.previous();
    let prev_idx = table
        .period_index(previous)
        .ok_or(ReshapeError::MissingPeriod { period: previous })?;

    match (row.values[idx], row.values[prev_idx]) {
        (Some(current), Some(before)) => Ok(year_over_year_delta(current, before)),
        (None, _) => Err(ReshapeError::MissingPeriod { period }),
        (_, None) => Err(ReshapeError::MissingPeriod { period: previous }),
    }
}

/// How many places the entity moved since the previous period.
/// Positive means it climbed.
pub fn rank_change(table: &WideTable, entity_key: &str, period: Period) -> ReshapeResult<i64> {
    let previous = period.previous();
    if table.period_index(previous).is_none() {
        return Err(ReshapeError::MissingPeriod { period: previous });
    }
    let now = find_rank(table, entity_key, period)? as i64;
    let before = find_rank(table, entity_key, previous)? as i64;
    Ok(before - now)
}

/// Row holding the largest value for `period` (first one on ties).
pub fn max_entry(table: &WideTable, period: Period) -> ReshapeResult<Option<(&str, i64)>> {
    let idx = table
        .period_index(period)
        .ok_or(ReshapeError::UnknownPeriod(period))?;

    Ok(table
        .rows()
        .iter()
        .filter_map(|r| r.values[idx].map(|v| (r.key.as_str(), v)))
        .fold(None, |best, (k, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((k, v)),
        }))
}

fn descending(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
