//! Application configuration.
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present). Every variable has a default matching the original data layout.
//!
//! | Variable                          | Default                    |
//! |-----------------------------------|----------------------------|
//! | `INDODASH_DATA_DIR`               | `data_source`              |
//! | `INDODASH_GDP_FILE`               | `gdp_dollar.csv`           |
//! | `INDODASH_SECTOR_FILE`            | `pdb_lapangan_usaha.csv`   |
//! | `INDODASH_IMPORT_FILE`            | `impor_ton.csv`            |
//! | `INDODASH_DETAIL_IMPORT_FILE`     | `DETAIL_IMPORT_LATEST.csv` |
//! | `INDODASH_COUNTRY_CODES`          | unset (no filtering)       |
//! | `INDODASH_FOCUS_ENTITY`           | `Indonesia`                |
//! | `INDODASH_TOP_N`                  | `20`                       |
//! | `INDODASH_CORRELATION_THRESHOLD`  | `0.71`                     |
//! | `INDODASH_CORRELATION_POLICY`     | `pairwise`                 |
//! | `INDODASH_PORT`                   | `3000`                     |

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::transform::correlation::{CorrelationPolicy, DEFAULT_RELATED_THRESHOLD};

/// Identifying column of the GDP-by-country table.
pub const COUNTRY_COLUMN: &str = "Country Name";
/// Country code attribute of the GDP-by-country table.
pub const COUNTRY_CODE_COLUMN: &str = "Country Code";
/// Identifying column of the GDP-by-sector table.
pub const SECTOR_COLUMN: &str = "lapangan_usaha";
/// Identifying column of the import-by-category table.
pub const IMPORT_COLUMN: &str = "golongan_sitc";

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub gdp_file: String,
    pub sector_file: String,
    pub import_file: String,
    pub detail_import_file: String,
    /// File with one allowed country code per line.
    pub country_codes: Option<PathBuf>,
    pub focus_entity: String,
    pub top_n: usize,
    pub correlation_threshold: f64,
    pub correlation_policy: CorrelationPolicy,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data_source"),
            gdp_file: "gdp_dollar.csv".to_string(),
            sector_file: "pdb_lapangan_usaha.csv".to_string(),
            import_file: "impor_ton.csv".to_string(),
            detail_import_file: "DETAIL_IMPORT_LATEST.csv".to_string(),
            country_codes: None,
            focus_entity: "Indonesia".to_string(),
            top_n: 20,
            correlation_threshold: DEFAULT_RELATED_THRESHOLD,
            correlation_policy: CorrelationPolicy::Pairwise,
            port: 3000,
        }
    }
}

impl DashboardConfig {
    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (the environment, or a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);

        Ok(Self {
            data_dir: lookup("INDODASH_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            gdp_file: text("INDODASH_GDP_FILE", defaults.gdp_file),
            sector_file: text("INDODASH_SECTOR_FILE", defaults.sector_file),
            import_file: text("INDODASH_IMPORT_FILE", defaults.import_file),
            detail_import_file: text("INDODASH_DETAIL_IMPORT_FILE", defaults.detail_import_file),
            country_codes: lookup("INDODASH_COUNTRY_CODES")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            focus_entity: text("INDODASH_FOCUS_ENTITY", defaults.focus_entity),
            top_n: parsed(&lookup, "INDODASH_TOP_N", defaults.top_n)?,
            correlation_threshold: parsed(
                &lookup,
                "INDODASH_CORRELATION_THRESHOLD",
                defaults.correlation_threshold,
            )?,
            correlation_policy: parsed(
                &lookup,
                "INDODASH_CORRELATION_POLICY",
                defaults.correlation_policy,
            )?,
            port: parsed(&lookup, "INDODASH_PORT", defaults.port)?,
        })
    }

    pub fn gdp_path(&self) -> PathBuf {
        self.data_dir.join(&self.gdp_file)
    }

    pub fn sector_path(&self) -> PathBuf {
        self.data_dir.join(&self.sector_file)
    }

    pub fn import_path(&self) -> PathBuf {
        self.data_dir.join(&self.import_file)
    }

    pub fn detail_import_path(&self) -> PathBuf {
        self.data_dir.join(&self.detail_import_file)
    }

    /// Read the country code allow-list, if one is configured.
    pub fn load_country_codes(&self) -> Result<Option<HashSet<String>>, ConfigError> {
        match &self.country_codes {
            Some(path) => read_codes(path).map(Some),
            None => Ok(None),
        }
    }
}

/// One code per line; blank lines and `#` comments ignored.
fn read_codes(path: &Path) -> Result<HashSet<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::CountryCodes {
        path: path.display().to_string(),
        source,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.to_uppercase())
        .collect())
}

fn parsed<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.gdp_path(), PathBuf::from("data_source/gdp_dollar.csv"));
        assert_eq!(config.correlation_threshold, 0.71);
        assert_eq!(config.top_n, 20);
    }

    #[test]
    fn test_overrides() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("INDODASH_DATA_DIR", "/srv/data"),
            ("INDODASH_TOP_N", "10"),
            ("INDODASH_CORRELATION_POLICY", "listwise"),
            ("INDODASH_PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.sector_path(), PathBuf::from("/srv/data/pdb_lapangan_usaha.csv"));
        assert_eq!(config.top_n, 10);
        assert_eq!(config.correlation_policy, CorrelationPolicy::Listwise);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_value() {
        let err = DashboardConfig::from_lookup(lookup(&[("INDODASH_TOP_N", "twenty")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for INDODASH_TOP_N: 'twenty'");
    }

    #[test]
    fn test_country_codes_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# ISO 3166 alpha-3\nidn\nUSA\n\n").unwrap();

        let config = DashboardConfig {
            country_codes: Some(file.path().to_path_buf()),
            ..DashboardConfig::default()
        };
        let codes = config.load_country_codes().unwrap().unwrap();
        assert_eq!(codes.len(), 2);
        assert!(codes.contains("IDN"));

        assert!(DashboardConfig::default().load_country_codes().unwrap().is_none());
    }
}
