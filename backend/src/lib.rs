//! # Indodash - Indonesian GDP and import analytics
//!
//! Indodash loads World Bank GDP tables and BPS (Statistics Indonesia) sector
//! and import tables, then derives the data behind a GDP & import report:
//! rankings, year-over-year deltas, merged series and correlation matrices.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV Files  │────▶│   Parser    │────▶│  Transform  │────▶│ Report JSON │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (rank/corr) │     │  (CLI/HTTP) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use indodash::{DashboardConfig, Dataset, related_imports, CorrelationPolicy};
//!
//! let config = DashboardConfig::from_env()?;
//! let dataset = Dataset::load(&config)?;
//! let related = related_imports(&dataset, "C. Industri Pengolahan", 0.71, CorrelationPolicy::Pairwise)?;
//! for category in related.related {
//!     println!("{} ({:.2})", category.label, category.coefficient);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (WideTable, LongSeries, MergedFrame)
//! - [`parser`] - CSV parsing with auto-detection, typed loaders
//! - [`transform`] - Reshape, join, rank, correlation and report pipeline
//! - [`config`] - Environment configuration
//! - [`format`] - Number formatting for captions
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Formatting
pub mod format;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, CsvError, CsvResult, DashboardError, DashboardResult, ReshapeError,
    ReshapeResult, ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CorrelationMatrix, DetailImport, LongSeries, MeltedPoint, MergedFrame, MergedRow, Period,
    SeriesPoint, WideRow, WideTable,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, load_detail_imports, load_wide_table,
    parse_bytes_auto, parse_csv_file_auto, ParseResult,
};

// =============================================================================
// Re-exports - Engine
// =============================================================================

pub use transform::{
    abbreviate_label, find_rank, get_column, join_for_chart, join_for_correlation,
    pearson_correlation, period_delta, pivot_to_long, rank_change, rank_descending,
    select_entity_rows, series_of, threshold_filter, year_over_year_delta, CorrelationPolicy,
    DEFAULT_RELATED_THRESHOLD,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    category_breakdown, correlation_heatmap, detail_imports_for_year, gdp_leaderboard,
    indicator_comparison, related_imports, CategoryBreakdown, CorrelationHeatmap, Dataset,
    GdpLeaderboard, IndicatorComparison, RelatedImports,
};

// =============================================================================
// Re-exports - Config & Formatting
// =============================================================================

pub use config::DashboardConfig;
pub use format::numerize;

// Server
pub mod server {
    pub use crate::api::server::{start_server, AppState};
}
