//! Report-level pipeline: one function per section of the GDP & import report.
//!
//! Loading reads the source CSVs once into a [`Dataset`]. Every report
//! function then takes the dataset (read-only) plus the user's selection as
//! plain arguments and recomputes its output from scratch.
//!
//! ```text
//! CSV ──▶ Dataset ──▶ select / pivot ──▶ join ──▶ rank / correlate ──▶ report structs
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use indodash::{DashboardConfig, Dataset, gdp_leaderboard, Period};
//!
//! let config = DashboardConfig::from_env()?;
//! let dataset = Dataset::load(&config)?;
//! let board = gdp_leaderboard(&dataset.gdp, Period::new(2021), "Indonesia", 20)?;
//! println!("Indonesia is #{}", board.focus.position);
//! ```

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::correlation::{abbreviate_label, pearson_correlation, threshold_filter, CorrelationPolicy};
use super::join::{join_for_chart, join_for_correlation, own_labels};
use super::rank::{find_rank, max_entry, period_delta, rank_change, rank_descending};
use super::reshape::{get_column, pivot_to_long, select_entity_rows, series_for_keys, series_of};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::config::{DashboardConfig, COUNTRY_CODE_COLUMN, COUNTRY_COLUMN, IMPORT_COLUMN, SECTOR_COLUMN};
use crate::error::{DashboardError, DashboardResult, ReshapeError, ReshapeResult};
use crate::format::numerize;
use crate::models::{
    CorrelationMatrix, DetailImport, LongSeries, MeltedPoint, MergedFrame, Period, WideTable,
};
use crate::parser::{load_detail_imports, load_wide_table};

/// Sectors shown in the heatmap when nothing is selected.
pub const DEFAULT_HEATMAP_SECTORS: [&str; 3] = [
    "A. Pertanian, Kehutanan, dan Perikanan",
    "C. Industri Pengolahan",
    "F. Perdagangan Besar dan Eceran",
];

/// Import categories shown in the heatmap when nothing is selected.
pub const DEFAULT_HEATMAP_CATEGORY_COUNT: usize = 9;

// =============================================================================
// Dataset
// =============================================================================

/// The source tables, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// GDP by country (`Country Name`, `Country Code`, years…)
    pub gdp: WideTable,
    /// GDP by sector (`lapangan_usaha`, years…)
    pub sectors: WideTable,
    /// Import volume by SITC category (`golongan_sitc`, years…)
    pub imports: WideTable,
    /// Commodity-level imports (`tahun`, `nama_data`, `value`)
    pub detail_imports: Vec<DetailImport>,
}

impl Dataset {
    pub fn new(
        gdp: WideTable,
        sectors: WideTable,
        imports: WideTable,
        detail_imports: Vec<DetailImport>,
    ) -> Self {
        Self {
            gdp,
            sectors,
            imports,
            detail_imports,
        }
    }

    /// Read every source CSV named by `config`.
    pub fn load(config: &DashboardConfig) -> DashboardResult<Self> {
        log_info("📖 Loading source tables...");

        let path = config.gdp_path();
        let mut gdp = load_wide_table(&path, COUNTRY_COLUMN)
            .map_err(|e| DashboardError::csv(path.display().to_string(), e))?;
        log_success(format!("GDP by country: {} rows, {} years", gdp.len(), gdp.periods().len()));

        if let Some(codes) = config.load_country_codes()? {
            let before = gdp.len();
            gdp.retain_attribute(COUNTRY_CODE_COLUMN, &codes)?;
            log_info_indent(format!("Kept {} of {} rows with a listed country code", gdp.len(), before), 1);
        }

        let path = config.sector_path();
        let sectors = load_wide_table(&path, SECTOR_COLUMN)
            .map_err(|e| DashboardError::csv(path.display().to_string(), e))?;
        log_success(format!("GDP by sector: {} sectors", sectors.len()));

        let path = config.import_path();
        let imports = load_wide_table(&path, IMPORT_COLUMN)
            .map_err(|e| DashboardError::csv(path.display().to_string(), e))?;
        log_success(format!("Imports by category: {} categories", imports.len()));

        let path = config.detail_import_path();
        let detail_imports = if path.exists() {
            let rows = load_detail_imports(&path)
                .map_err(|e| DashboardError::csv(path.display().to_string(), e))?;
            log_success(format!("Detail imports: {} rows", rows.len()));
            rows
        } else {
            log_warning(format!("No detail import file at {}", path.display()));
            Vec::new()
        };

        Ok(Self::new(gdp, sectors, imports, detail_imports))
    }
}

// =============================================================================
// Report Types
// =============================================================================

/// One row of a ranked list (1-based `rank`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub rank: usize,
    pub label: String,
    pub value: Option<i64>,
    pub display: Option<String>,
}

/// Value, change and position of the highlighted entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusMetrics {
    pub entity: String,
    pub value: Option<i64>,
    pub value_display: Option<String>,
    /// Change since the previous year; `None` for the first year.
    pub delta: Option<i64>,
    pub delta_display: Option<String>,
    /// 1-based position among all rows.
    pub position: usize,
    /// Places gained since the previous year; `None` for the first year.
    pub position_change: Option<i64>,
    pub in_top: bool,
}

/// Top countries by GDP for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GdpLeaderboard {
    pub year: Period,
    pub entries: Vec<RankedEntry>,
    pub focus: FocusMetrics,
}

/// One bar of a category chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBar {
    pub label: String,
    pub value: Option<i64>,
    pub is_max: bool,
}

/// Every category's value for a year, plus the leaders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub year: Period,
    pub bars: Vec<CategoryBar>,
    pub top: Vec<RankedEntry>,
}

/// An import category correlated with a sector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedCategory {
    pub label: String,
    pub coefficient: f64,
}

/// A sector's GDP series and the import categories that move with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedImports {
    pub sector: String,
    pub threshold: f64,
    pub policy: CorrelationPolicy,
    pub sector_series: LongSeries,
    pub related: Vec<RelatedCategory>,
    /// Long-form lines of the related categories.
    pub chart: Vec<MeltedPoint>,
}

/// Heatmap legend row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub code: String,
    pub label: String,
}

/// Correlation between chosen sectors and import categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationHeatmap {
    pub policy: CorrelationPolicy,
    /// Matrix with abbreviated labels.
    pub matrix: CorrelationMatrix,
    pub legend: Vec<LegendEntry>,
    /// Lower bound of the color scale.
    pub scale_min: Option<f64>,
}

/// Several indicators of one entity over a period window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorComparison {
    pub entity: String,
    pub start: Period,
    pub end: Period,
    /// Outer join, for drawing.
    pub chart: MergedFrame,
    pub melted: Vec<MeltedPoint>,
    /// Computed on the inner-joined frame.
    pub correlation: CorrelationMatrix,
}

// =============================================================================
// Report Functions
// =============================================================================

/// Top `top_n` rows of a GDP table for `year`, with metrics for `focus`.
pub fn gdp_leaderboard(
    table: &WideTable,
    year: Period,
    focus: &str,
    top_n: usize,
) -> ReshapeResult<GdpLeaderboard> {
    let ranked = rank_descending(table, year, top_n)?;
    let entries = ranked_entries(&ranked, year);

    let position = find_rank(table, focus, year)? + 1;
    let value = table.cell(focus, year).flatten();
    // Entity and year exist at this point, so the only remaining failure is
    // MissingPeriod: no previous year, or an empty cell on either side.
    let delta = period_delta(table, focus, year).ok();
    let position_change = rank_change(table, focus, year).ok();

    Ok(GdpLeaderboard {
        year,
        focus: FocusMetrics {
            entity: focus.to_string(),
            value,
            value_display: value.map(numerize),
            delta,
            delta_display: delta.map(numerize),
            position,
            position_change,
            in_top: position <= entries.len(),
        },
        entries,
    })
}

/// Bar values for every category of `table` in `year`, and the top `top_n`.
pub fn category_breakdown(table: &WideTable, year: Period, top_n: usize) -> ReshapeResult<CategoryBreakdown> {
    let values = get_column(table, year).ok_or(ReshapeError::UnknownPeriod(year))?;
    let max_key = max_entry(table, year)?.map(|(k, _)| k);

    let bars = table
        .keys()
        .zip(values)
        .map(|(label, value)| CategoryBar {
            label: label.to_string(),
            value,
            is_max: Some(label) == max_key,
        })
        .collect();

    let ranked = rank_descending(table, year, top_n)?;

    Ok(CategoryBreakdown {
        year,
        bars,
        top: ranked_entries(&ranked, year),
    })
}

/// Import categories whose correlation with `sector` exceeds `threshold`.
///
/// The correlation runs over the sector series and every import category.
pub fn related_imports(
    dataset: &Dataset,
    sector: &str,
    threshold: f64,
    policy: CorrelationPolicy,
) -> ReshapeResult<RelatedImports> {
    let sector_series = series_of(&dataset.sectors, sector)?;

    let categories: Vec<String> = dataset.imports.keys().map(str::to_string).collect();
    let mut all = vec![sector_series.clone()];
    all.extend(series_for_keys(&dataset.imports, &categories)?);

    let frame = join_for_chart(&all, &own_labels(&all))?;
    let matrix = pearson_correlation(&frame, policy);

    let related: Vec<RelatedCategory> = threshold_filter(&matrix, sector, threshold)?
        .into_iter()
        .filter_map(|label| {
            let coefficient = matrix.coefficient(sector, &label)?;
            Some(RelatedCategory { label, coefficient })
        })
        .collect();

    let keys: Vec<String> = related.iter().map(|r| r.label.clone()).collect();
    let related_series = series_for_keys(&dataset.imports, &keys)?;
    let chart = join_for_chart(&related_series, &keys)?.melt();

    Ok(RelatedImports {
        sector: sector.to_string(),
        threshold,
        policy,
        sector_series,
        related,
        chart,
    })
}

/// Correlation heatmap over chosen sectors and import categories.
///
/// With both selections empty the default selection is used.
pub fn correlation_heatmap(
    dataset: &Dataset,
    sectors: &[String],
    categories: &[String],
    policy: CorrelationPolicy,
) -> ReshapeResult<CorrelationHeatmap> {
    let (sectors, categories) = if sectors.is_empty() && categories.is_empty() {
        default_heatmap_selection(dataset)
    } else {
        (sectors.to_vec(), categories.to_vec())
    };

    let mut series = series_for_keys(&dataset.sectors, &sectors)?;
    series.extend(series_for_keys(&dataset.imports, &categories)?);

    let labels = own_labels(&series);
    let frame = join_for_chart(&series, &labels)?;
    let codes = abbreviated_labels(&labels);
    let matrix = pearson_correlation(&frame, policy).relabel(codes.clone());

    let legend = codes
        .into_iter()
        .zip(labels)
        .map(|(code, label)| LegendEntry { code, label })
        .collect();

    Ok(CorrelationHeatmap {
        policy,
        scale_min: matrix.min(),
        matrix,
        legend,
    })
}

/// Chart and correlation of several labelled indicator tables for one
/// entity over `[start, end]`.
pub fn indicator_comparison(
    indicators: &[(String, WideTable)],
    entity: &str,
    start: Period,
    end: Period,
) -> ReshapeResult<IndicatorComparison> {
    let series = indicators
        .iter()
        .map(|(label, table)| pivot_to_long(&select_entity_rows(table, entity, start, end)?, label))
        .collect::<ReshapeResult<Vec<_>>>()?;
    let labels = own_labels(&series);

    let chart = join_for_chart(&series, &labels)?;
    let aligned = join_for_correlation(&series, &labels)?;

    Ok(IndicatorComparison {
        entity: entity.to_string(),
        start,
        end,
        melted: chart.melt(),
        chart,
        correlation: pearson_correlation(&aligned, CorrelationPolicy::Listwise),
    })
}

/// Commodity rows of one year, largest value first.
pub fn detail_imports_for_year(rows: &[DetailImport], year: Period) -> Vec<DetailImport> {
    let mut selected: Vec<DetailImport> = rows.iter().filter(|r| r.year == year).cloned().collect();
    selected.sort_by(|a, b| b.value.cmp(&a.value));
    selected
}

// =============================================================================
// Helpers
// =============================================================================

fn ranked_entries(ranked: &WideTable, year: Period) -> Vec<RankedEntry> {
    ranked
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let value = ranked.cell(&row.key, year).flatten();
            RankedEntry {
                rank: i + 1,
                label: row.key.clone(),
                value,
                display: value.map(numerize),
            }
        })
        .collect()
}

fn default_heatmap_selection(dataset: &Dataset) -> (Vec<String>, Vec<String>) {
    let sectors = DEFAULT_HEATMAP_SECTORS
        .iter()
        .filter(|s| dataset.sectors.contains(s))
        .map(|s| s.to_string())
        .collect();
    let categories = dataset
        .imports
        .keys()
        .take(DEFAULT_HEATMAP_CATEGORY_COUNT)
        .map(str::to_string)
        .collect();
    (sectors, categories)
}

/// Abbreviate each label; labels whose abbreviation collides keep their full text.
fn abbreviated_labels(labels: &[String]) -> Vec<String> {
    let codes: Vec<String> = labels.iter().map(|l| abbreviate_label(l)).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for code in &codes {
        *counts.entry(code.as_str()).or_default() += 1;
    }
    let clashing: HashSet<&str> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(c, _)| c)
        .collect();

    codes
        .iter()
        .zip(labels)
        .map(|(code, label)| {
            if clashing.contains(code.as_str()) {
                label.clone()
            } else {
                code.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WideRow;

    fn years() -> Vec<Period> {
        (2017..=2021).map(Period::new).collect()
    }

    fn table(id: &str, rows: &[(&str, [i64; 5])]) -> WideTable {
        WideTable::new(
            id,
            vec![],
            years(),
            rows.iter()
                .map(|(k, v)| WideRow::new(*k, v.iter().map(|x| Some(*x)).collect()))
                .collect(),
        )
        .unwrap()
    }

    fn dataset() -> Dataset {
        let gdp = table(
            COUNTRY_COLUMN,
            &[
                ("Indonesia", [1015, 1042, 1119, 1058, 1186]),
                ("United States", [19477, 20533, 21381, 20893, 23315]),
                ("Turkiye", [858, 778, 759, 720, 819]),
                ("Netherlands", [833, 914, 910, 913, 1018]),
            ],
        );
        let sectors = table(
            SECTOR_COLUMN,
            &[
                ("A. Pertanian, Kehutanan, dan Perikanan", [1258, 1307, 1354, 1378, 1404]),
                ("C. Industri Pengolahan", [2103, 2193, 2276, 2209, 2284]),
                ("F. Perdagangan Besar dan Eceran", [1311, 1376, 1440, 1385, 1450]),
            ],
        );
        let imports = table(
            IMPORT_COLUMN,
            &[
                ("0. Bahan makanan dan binatang hidup", [22, 24, 25, 24, 26]),
                ("2. Bahan baku, tidak untuk dimakan", [30, 28, 31, 27, 25]),
                ("7. Mesin dan alat pengangkutan", [5, 6, 7, 5, 7]),
            ],
        );
        let detail = vec![
            DetailImport { year: Period::new(2021), commodity: "Besi".into(), value: 40 },
            DetailImport { year: Period::new(2020), commodity: "Mesin".into(), value: 99 },
            DetailImport { year: Period::new(2021), commodity: "Mesin".into(), value: 120 },
            DetailImport { year: Period::new(2021), commodity: "Gandum".into(), value: 40 },
        ];
        Dataset::new(gdp, sectors, imports, detail)
    }

    #[test]
    fn test_leaderboard() {
        let ds = dataset();
        let board = gdp_leaderboard(&ds.gdp, Period::new(2021), "Indonesia", 2).unwrap();

        assert_eq!(board.entries.len(), 2);
        assert_eq!(board.entries[0].label, "United States");
        assert_eq!(board.entries[1].label, "Indonesia");
        assert_eq!(board.entries[1].display.as_deref(), Some("1.19K"));

        assert_eq!(board.focus.position, 2);
        assert_eq!(board.focus.value, Some(1186));
        assert_eq!(board.focus.delta, Some(128));
        // 2020: US, Indonesia, Netherlands, Turkiye → unchanged
        assert_eq!(board.focus.position_change, Some(0));
        assert!(board.focus.in_top);
    }

    #[test]
    fn test_leaderboard_first_year_has_no_delta() {
        let ds = dataset();
        let board = gdp_leaderboard(&ds.gdp, Period::new(2017), "Indonesia", 20).unwrap();
        assert_eq!(board.focus.delta, None);
        assert_eq!(board.focus.position_change, None);
        assert_eq!(board.entries.len(), 4);
    }

    #[test]
    fn test_leaderboard_focus_outside_top() {
        let ds = dataset();
        let board = gdp_leaderboard(&ds.gdp, Period::new(2018), "Turkiye", 2).unwrap();
        assert_eq!(board.focus.position, 4);
        assert!(!board.focus.in_top);
        // 2017: Turkiye 3rd, 2018: 4th
        assert_eq!(board.focus.position_change, Some(-1));
    }

    #[test]
    fn test_leaderboard_unknown_focus() {
        let ds = dataset();
        let err = gdp_leaderboard(&ds.gdp, Period::new(2021), "Atlantis", 20).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_category_breakdown() {
        let ds = dataset();
        let breakdown = category_breakdown(&ds.sectors, Period::new(2021), 3).unwrap();

        assert_eq!(breakdown.bars.len(), 3);
        let max: Vec<_> = breakdown.bars.iter().filter(|b| b.is_max).collect();
        assert_eq!(max.len(), 1);
        assert_eq!(max[0].label, "C. Industri Pengolahan");
        assert_eq!(breakdown.top[0].label, "C. Industri Pengolahan");
        assert_eq!(breakdown.top[2].label, "A. Pertanian, Kehutanan, dan Perikanan");

        assert!(matches!(
            category_breakdown(&ds.sectors, Period::new(2030), 3),
            Err(ReshapeError::UnknownPeriod(_))
        ));
    }

    #[test]
    fn test_related_imports() {
        let ds = dataset();
        let related = related_imports(
            &ds,
            "A. Pertanian, Kehutanan, dan Perikanan",
            0.71,
            CorrelationPolicy::Pairwise,
        )
        .unwrap();

        // food imports rise with agriculture, raw materials fall
        let labels: Vec<_> = related.related.iter().map(|r| r.label.as_str()).collect();
        assert!(labels.contains(&"0. Bahan makanan dan binatang hidup"));
        assert!(!labels.contains(&"2. Bahan baku, tidak untuk dimakan"));
        assert!(related.related.iter().all(|r| r.coefficient > 0.71));
        assert_eq!(related.sector_series.len(), 5);
        assert_eq!(related.chart.len(), related.related.len() * 5);
    }

    #[test]
    fn test_related_imports_unknown_sector() {
        let err = related_imports(&dataset(), "Z. Nothing", 0.71, CorrelationPolicy::Pairwise).unwrap_err();
        assert_eq!(err, ReshapeError::not_found("sector", "Z. Nothing"));
    }

    #[test]
    fn test_heatmap_defaults_and_legend() {
        let ds = dataset();
        let heatmap = correlation_heatmap(&ds, &[], &[], CorrelationPolicy::Listwise).unwrap();

        assert_eq!(heatmap.matrix.size(), 6);
        assert_eq!(heatmap.matrix.labels()[0], "A.");
        assert_eq!(heatmap.matrix.labels()[3], "0.");
        assert_eq!(heatmap.legend[1].label, "C. Industri Pengolahan");
        assert!(heatmap.scale_min.is_some_and(|m| m < 0.0));
    }

    #[test]
    fn test_heatmap_unknown_label() {
        let ds = dataset();
        let err = correlation_heatmap(&ds, &[], &["9. Lainnya".to_string()], CorrelationPolicy::Pairwise)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_abbreviation_collisions_keep_full_labels() {
        let labels = vec!["A. One".to_string(), "A. Two".to_string(), "B. Three".to_string()];
        assert_eq!(abbreviated_labels(&labels), vec!["A. One", "A. Two", "B."]);
    }

    #[test]
    fn test_indicator_comparison() {
        let ds = dataset();
        let indicators = vec![
            ("gdp_value".to_string(), ds.gdp.clone()),
            ("gdp_again".to_string(), ds.gdp.clone()),
        ];
        let cmp = indicator_comparison(&indicators, "Indonesia", Period::new(2019), Period::new(2021)).unwrap();

        assert_eq!(cmp.chart.len(), 3);
        assert_eq!(cmp.melted.len(), 6);
        assert!(cmp
            .correlation
            .coefficient("gdp_value", "gdp_again")
            .is_some_and(|r| (r - 1.0).abs() < 1e-9));

        let err = indicator_comparison(&indicators, "Indonesia", Period::new(2010), Period::new(2021)).unwrap_err();
        assert!(matches!(err, ReshapeError::Range { .. }));
    }

    #[test]
    fn test_detail_imports_for_year() {
        let ds = dataset();
        let rows = detail_imports_for_year(&ds.detail_imports, Period::new(2021));
        let names: Vec<_> = rows.iter().map(|r| r.commodity.as_str()).collect();
        assert_eq!(names, vec!["Mesin", "Besi", "Gandum"]);
        assert!(detail_imports_for_year(&ds.detail_imports, Period::new(1990)).is_empty());
    }
}
