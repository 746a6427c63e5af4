//! Typed loaders: parsed CSV rows into wide tables and detail import rows.
//!
//! Column roles in a wide table are inferred from the header:
//!
//! | Header                         | Role                |
//! |--------------------------------|---------------------|
//! | the identifying column         | row key             |
//! | text that normalizes to a year | period value column |
//! | any other non-empty text       | attribute column    |

use std::path::Path;

use super::{parse_csv_file_auto, ParseResult};
use crate::error::{CsvError, CsvResult};
use crate::models::{parse_cell, DetailImport, Period, WideRow, WideTable};

/// Header of the year column in the detail import table.
pub const DETAIL_YEAR_COLUMN: &str = "tahun";
/// Header of the commodity label column in the detail import table.
pub const DETAIL_LABEL_COLUMN: &str = "nama_data";
/// Header of the value column in the detail import table.
pub const DETAIL_VALUE_COLUMN: &str = "value";

/// Build a [`WideTable`] keyed by `id_column` from parsed rows.
///
/// Rows with an empty key are skipped. Cells that are neither numeric nor a
/// recognized missing marker fail with [`CsvError::InvalidCell`].
pub fn wide_table_from(parsed: &ParseResult, id_column: &str) -> CsvResult<WideTable> {
    let id_idx = parsed
        .column_index(id_column)
        .ok_or_else(|| CsvError::MissingColumn(id_column.to_string()))?;

    let mut period_cols: Vec<(usize, Period)> = Vec::new();
    let mut attribute_cols: Vec<usize> = Vec::new();
    for (i, header) in parsed.headers.iter().enumerate() {
        if i == id_idx || header.is_empty() {
            continue;
        }
        match Period::parse(header) {
            Some(period) => period_cols.push((i, period)),
            None => attribute_cols.push(i),
        }
    }

    let mut rows = Vec::with_capacity(parsed.rows.len());
    for (row_idx, record) in parsed.rows.iter().enumerate() {
        let key = record[id_idx].trim();
        if key.is_empty() {
            continue;
        }

        let mut values = Vec::with_capacity(period_cols.len());
        for &(col, _) in &period_cols {
            let value = parse_cell(&record[col]).map_err(|message| CsvError::InvalidCell {
                line: row_idx + 2, // +1 for 0-index, +1 for header
                column: parsed.headers[col].clone(),
                value: record[col].clone(),
                message,
            })?;
            values.push(value);
        }

        let attributes = attribute_cols.iter().map(|&c| record[c].clone()).collect();
        rows.push(WideRow::new(key, values).with_attributes(attributes));
    }

    let table = WideTable::new(
        id_column,
        attribute_cols.iter().map(|&c| parsed.headers[c].clone()).collect(),
        period_cols.iter().map(|&(_, p)| p).collect(),
        rows,
    )?;
    Ok(table)
}

/// Read a wide CSV file and key it by `id_column`.
pub fn load_wide_table<P: AsRef<Path>>(path: P, id_column: &str) -> CsvResult<WideTable> {
    let parsed = parse_csv_file_auto(path)?;
    wide_table_from(&parsed, id_column)
}

/// Build detail import rows from parsed `tahun`, `nama_data`, `value` columns.
///
/// Rows with an empty value are skipped.
pub fn detail_imports_from(parsed: &ParseResult) -> CsvResult<Vec<DetailImport>> {
    let column = |name: &str| {
        parsed
            .column_index(name)
            .ok_or_else(|| CsvError::MissingColumn(name.to_string()))
    };
    let year_idx = column(DETAIL_YEAR_COLUMN)?;
    let label_idx = column(DETAIL_LABEL_COLUMN)?;
    let value_idx = column(DETAIL_VALUE_COLUMN)?;

    let invalid = |row_idx: usize, col: usize, value: &str, message: &str| CsvError::InvalidCell {
        line: row_idx + 2,
        column: parsed.headers[col].clone(),
        value: value.to_string(),
        message: message.to_string(),
    };

    let mut imports = Vec::with_capacity(parsed.rows.len());
    for (row_idx, record) in parsed.rows.iter().enumerate() {
        let year = Period::parse(&record[year_idx])
            .ok_or_else(|| invalid(row_idx, year_idx, &record[year_idx], "not a year"))?;
        let value = parse_cell(&record[value_idx])
            .map_err(|message| invalid(row_idx, value_idx, &record[value_idx], &message))?;

        if let Some(value) = value {
            imports.push(DetailImport {
                year,
                commodity: record[label_idx].clone(),
                value,
            });
        }
    }

    Ok(imports)
}

/// Read the detail import CSV file.
pub fn load_detail_imports<P: AsRef<Path>>(path: P) -> CsvResult<Vec<DetailImport>> {
    let parsed = parse_csv_file_auto(path)?;
    detail_imports_from(&parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    fn parse(csv: &str) -> ParseResult {
        parse_str(csv, ',', "utf-8".to_string()).unwrap()
    }

    #[test]
    fn test_world_bank_layout() {
        let parsed = parse(
            "Country Name,Country Code,Indicator Name,2020,2021,\n\
             Indonesia,IDN,GDP (current US$),1058423838345.0,1186092991320.04,\n\
             World,WLD,GDP (current US$),84906818922776,,\n",
        );
        let table = wide_table_from(&parsed, "Country Name").unwrap();

        assert_eq!(table.periods(), &[Period::new(2020), Period::new(2021)]);
        assert_eq!(table.attribute_columns(), &["Country Code".to_string(), "Indicator Name".to_string()]);
        assert_eq!(table.cell("Indonesia", Period::new(2021)), Some(Some(1186092991320)));
        assert_eq!(table.cell("World", Period::new(2021)), Some(None));
        assert_eq!(table.rows()[1].attributes[0], "WLD");
    }

    #[test]
    fn test_missing_id_column() {
        let parsed = parse("golongan_sitc,2021\nA,1");
        let err = wide_table_from(&parsed, "lapangan_usaha").unwrap_err();
        assert!(matches!(err, CsvError::MissingColumn(ref c) if c == "lapangan_usaha"));
    }

    #[test]
    fn test_invalid_cell_reports_position() {
        let parsed = parse("golongan_sitc,2020,2021\nA,1,2\nB,3,abc");
        let err = wide_table_from(&parsed, "golongan_sitc").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Line 3"));
        assert!(msg.contains("column '2021'"));
        assert!(msg.contains("value 'abc'"));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let parsed = parse("golongan_sitc,2021\nA,1\nA,2");
        let err = wide_table_from(&parsed, "golongan_sitc").unwrap_err();
        assert!(matches!(err, CsvError::Table(_)));
    }

    #[test]
    fn test_detail_imports() {
        let parsed = parse("tahun,nama_data,value\n2021,Mesin,120\n2021,Besi,\n2020,Mesin,99.9");
        let rows = detail_imports_from(&parsed).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].commodity, "Mesin");
        assert_eq!(rows[1].year, Period::new(2020));
        assert_eq!(rows[1].value, 99);
    }

    #[test]
    fn test_detail_imports_bad_year() {
        let parsed = parse("tahun,nama_data,value\nsoon,Mesin,120");
        assert!(matches!(
            detail_imports_from(&parsed),
            Err(CsvError::InvalidCell { line: 2, .. })
        ));
    }
}
