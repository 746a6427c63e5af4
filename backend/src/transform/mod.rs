//! Transformation module.
//!
//! This module turns loaded tables into report data:
//! - Reshape: column access, entity selection, wide-to-long pivot
//! - Join: period-aligned merging of series
//! - Rank: descending ranking, positions and year-over-year deltas
//! - Correlation: Pearson matrices, threshold selection, label codes
//! - Pipeline: dataset loading and one function per report section

pub mod correlation;
pub mod join;
pub mod pipeline;
pub mod rank;
pub mod reshape;

pub use correlation::{
    abbreviate_label, pearson_correlation, threshold_filter, CorrelationPolicy,
    DEFAULT_RELATED_THRESHOLD,
};
pub use join::{join_for_chart, join_for_correlation};
pub use pipeline::*;
pub use rank::{find_rank, period_delta, rank_change, rank_descending, year_over_year_delta};
pub use reshape::{get_column, pivot_to_long, select_entity_rows, series_of};
