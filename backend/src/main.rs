//! Indodash CLI - GDP and import report data from CSV sources
//!
//! # Report Commands
//!
//! ```bash
//! indodash leaderboard --year 2021          # Top countries by GDP
//! indodash sectors --year 2021              # GDP by sector
//! indodash imports --year 2021              # Imports by SITC category
//! indodash related --sector "C. Industri Pengolahan"
//! indodash heatmap --category "0. Bahan makanan dan binatang hidup"
//! indodash detail --year 2021               # Commodity-level imports
//! indodash serve                            # Start HTTP server (port 3000)
//! ```
//!
//! # Other Commands
//!
//! ```bash
//! indodash parse data_source/impor_ton.csv  # Just parse CSV to JSON
//! indodash compare --entity Indonesia --from 2010 --to 2021 \
//!     --indicator gdp=gdp.csv --indicator inflation=inflation.csv
//! ```
//!
//! Data files and defaults come from `INDODASH_*` environment variables.

use clap::{Parser, Subcommand};
use indodash::config::COUNTRY_COLUMN;
use indodash::server::{start_server, AppState};
use indodash::{
    category_breakdown, correlation_heatmap, detail_imports_for_year, gdp_leaderboard,
    indicator_comparison, load_wide_table, parse_csv_file_auto, related_imports,
    CorrelationPolicy, DashboardConfig, Dataset, Period, WideTable,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "indodash")]
#[command(about = "GDP and import report data for Indonesia", long_about = None)]
struct Cli {
    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output JSON records
    Parse {
        /// Input CSV file
        input: PathBuf,
    },

    /// Top countries by GDP, with metrics for the focus country
    Leaderboard {
        /// Year (default: latest)
        #[arg(short, long)]
        year: Option<i32>,

        /// Country to highlight (default: INDODASH_FOCUS_ENTITY)
        #[arg(short, long)]
        focus: Option<String>,

        /// Number of rows (default: INDODASH_TOP_N)
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// GDP by sector for one year
    Sectors {
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Imports by category for one year
    Imports {
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Import categories correlated with a sector
    Related {
        /// Sector label, e.g. "C. Industri Pengolahan"
        #[arg(short, long)]
        sector: String,

        /// Minimum coefficient, exclusive (default: INDODASH_CORRELATION_THRESHOLD)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Drop every year with any missing value before correlating
        #[arg(long)]
        listwise: bool,
    },

    /// Correlation heatmap of sectors and import categories
    Heatmap {
        /// Sector label (repeatable)
        #[arg(long = "sector")]
        sectors: Vec<String>,

        /// Import category label (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,

        #[arg(long)]
        listwise: bool,
    },

    /// Commodity-level imports of one year, largest first
    Detail {
        /// Year (default: latest)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Compare indicator tables for one entity over a year window
    Compare {
        /// Row to select in every table
        #[arg(short, long)]
        entity: String,

        #[arg(long)]
        from: i32,

        #[arg(long)]
        to: i32,

        /// `label=path` of a wide CSV (repeatable)
        #[arg(short, long = "indicator", required = true)]
        indicators: Vec<String>,

        /// Identifying column of the indicator tables
        #[arg(long, default_value = COUNTRY_COLUMN)]
        id_column: String,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: INDODASH_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult {
    let config = DashboardConfig::from_env()?;
    let output = cli.output.as_deref();

    match cli.command {
        Commands::Parse { input } => cmd_parse(&input, output),

        Commands::Compare {
            entity,
            from,
            to,
            indicators,
            id_column,
        } => cmd_compare(&entity, from, to, &indicators, &id_column, output),

        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            let dataset = Dataset::load(&config)?;
            start_server(AppState::new(dataset, config), port).await?;
            Ok(())
        }

        command => {
            let dataset = Dataset::load(&config)?;
            cmd_report(command, &dataset, &config, output)
        }
    }
}

/// Commands that read the configured dataset.
fn cmd_report(command: Commands, dataset: &Dataset, config: &DashboardConfig, output: Option<&Path>) -> CliResult {
    let policy = |listwise: bool| {
        if listwise {
            CorrelationPolicy::Listwise
        } else {
            config.correlation_policy
        }
    };

    match command {
        Commands::Leaderboard { year, focus, top } => {
            let year = year_or_latest(year, &dataset.gdp)?;
            let focus = focus.as_deref().unwrap_or(&config.focus_entity);
            let board = gdp_leaderboard(&dataset.gdp, year, focus, top.unwrap_or(config.top_n))?;

            eprintln!(
                "🏆 {} is #{} in {} ({})",
                board.focus.entity,
                board.focus.position,
                year,
                board.focus.value_display.as_deref().unwrap_or("no value")
            );
            write_json(&board, output)
        }

        Commands::Sectors { year } => {
            let year = year_or_latest(year, &dataset.sectors)?;
            write_json(&category_breakdown(&dataset.sectors, year, config.top_n)?, output)
        }

        Commands::Imports { year } => {
            let year = year_or_latest(year, &dataset.imports)?;
            write_json(&category_breakdown(&dataset.imports, year, config.top_n)?, output)
        }

        Commands::Related {
            sector,
            threshold,
            listwise,
        } => {
            let threshold = threshold.unwrap_or(config.correlation_threshold);
            let related = related_imports(dataset, &sector, threshold, policy(listwise))?;

            eprintln!("🔗 {} categories above {}", related.related.len(), threshold);
            write_json(&related, output)
        }

        Commands::Heatmap {
            sectors,
            categories,
            listwise,
        } => {
            let heatmap = correlation_heatmap(dataset, &sectors, &categories, policy(listwise))?;
            write_json(&heatmap, output)
        }

        Commands::Detail { year } => {
            let year = match year {
                Some(year) => Period::new(year),
                None => dataset
                    .detail_imports
                    .iter()
                    .map(|r| r.year)
                    .max()
                    .ok_or("no detail import rows loaded")?,
            };
            write_json(&detail_imports_for_year(&dataset.detail_imports, year), output)
        }

        Commands::Parse { .. } | Commands::Compare { .. } | Commands::Serve { .. } => {
            Err("command does not read the dataset".into())
        }
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> CliResult {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_csv_file_auto(input)?;
    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.rows.len());

    let records: Vec<Value> = result
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = result
                .headers
                .iter()
                .zip(row)
                .map(|(h, v)| (h.clone(), Value::String(v.clone())))
                .collect();
            Value::Object(object)
        })
        .collect();

    write_json(&records, output)
}

fn cmd_compare(
    entity: &str,
    from: i32,
    to: i32,
    indicators: &[String],
    id_column: &str,
    output: Option<&Path>,
) -> CliResult {
    let mut tables: Vec<(String, WideTable)> = Vec::with_capacity(indicators.len());
    for spec in indicators {
        let (label, path) = spec
            .split_once('=')
            .ok_or_else(|| format!("indicator '{}' is not label=path", spec))?;
        eprintln!("📄 Loading {}: {}", label, path);
        tables.push((label.trim().to_string(), load_wide_table(path.trim(), id_column)?));
    }

    let comparison = indicator_comparison(&tables, entity, Period::new(from), Period::new(to))?;
    eprintln!("📊 {} years compared", comparison.chart.len());
    write_json(&comparison, output)
}

fn year_or_latest(year: Option<i32>, table: &WideTable) -> Result<Period, Box<dyn std::error::Error>> {
    match year {
        Some(year) => Ok(Period::new(year)),
        None => Ok(table.last_period().ok_or("table has no year columns")?),
    }
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> CliResult {
    let content = serde_json::to_string_pretty(value)?;
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
