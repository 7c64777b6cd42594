//! CSV ingestion: turns a delimited file into a typed, sampled [`Table`].
//!
//! Header names are cleaned into SQL-friendly snake case, every column's type
//! is inferred from the sampled values and each cell is parsed into the
//! inferred type. Empty cells and placeholder tokens such as `N/A` become
//! nulls, i.e. they are absent from the row.

use std::{collections::HashSet, path::Path, sync::OnceLock};

use anyhow::{Context, Result, ensure};
use heck::ToSnakeCase;
use log::debug;
use regex::Regex;

use crate::{
    config::DEFAULT_MAX_SAMPLE_ROWS,
    data::{Value, parse_boolean, parse_naive_date, parse_naive_datetime, parse_typed_value},
    io_utils,
    model::{Column, DataType, Table},
    rows::Row,
};

const MAX_SAMPLE_VALUES: usize = 5;
const TEXT_LENGTH_THRESHOLD: usize = 500;
const MIN_VARCHAR_LENGTH: usize = 50;
const MAX_VARCHAR_LENGTH: usize = 255;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub delimiter: Option<u8>,
    pub encoding: Option<String>,
    pub max_rows: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: None,
            max_rows: DEFAULT_MAX_SAMPLE_ROWS,
        }
    }
}

pub fn load_table(path: &Path, options: &IngestOptions) -> Result<Table> {
    let encoding = io_utils::resolve_encoding(options.encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;
    ensure!(
        headers.iter().any(|h| !h.trim().is_empty()),
        "Input file {path:?} has no header row"
    );

    let mut records = Vec::new();
    let mut record = csv::ByteRecord::new();
    while records.len() < options.max_rows {
        let more = reader
            .read_byte_record(&mut record)
            .with_context(|| format!("Reading row {} of {path:?}", records.len() + 1))?;
        if !more {
            break;
        }
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {} of {path:?}", records.len() + 1))?;
        records.push(decoded);
    }

    let name = if io_utils::is_dash(path) {
        "stdin".to_string()
    } else {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .map(clean_name)
            .unwrap_or_else(|| "unnamed".to_string())
    };
    let table = table_from_records(&name, &headers, &records);
    debug!(
        "Loaded '{}' from {path:?}: {} column(s), {} sampled row(s)",
        table.name,
        table.columns.len(),
        table.row_count()
    );
    Ok(table)
}

/// Builds a typed table from raw header and record strings.
pub fn table_from_records(name: &str, headers: &[String], records: &[Vec<String>]) -> Table {
    let names = unique_column_names(headers);
    let mut columns = Vec::with_capacity(names.len());
    for (idx, column_name) in names.iter().enumerate() {
        let cells: Vec<Option<&str>> = records
            .iter()
            .map(|record| record.get(idx).map(String::as_str).and_then(non_null))
            .collect();
        columns.push(infer_column(column_name, &cells));
    }

    let data = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .enumerate()
                .filter_map(|(idx, column)| {
                    let raw = record.get(idx).map(String::as_str).and_then(non_null)?;
                    Some((column.name.clone(), parse_typed_value(raw, &column.data_type)))
                })
                .collect::<Row>()
        })
        .collect();

    Table {
        data,
        ..Table::new(name, columns)
    }
}

/// SQL-friendly identifier: punctuation removed, snake case, never starting
/// with a digit and never empty.
pub fn clean_name(raw: &str) -> String {
    static PUNCTUATION: OnceLock<Regex> = OnceLock::new();
    let punctuation = PUNCTUATION
        .get_or_init(|| Regex::new(r"[^\w\s]").expect("static name pattern is valid"));
    let stripped = punctuation.replace_all(raw.trim(), "");
    let cleaned = stripped.to_snake_case();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else if cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        format!("col_{cleaned}")
    } else {
        cleaned.to_string()
    }
}

fn unique_column_names(headers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .map(|header| {
            let base = clean_name(header);
            let mut candidate = base.clone();
            let mut counter = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{base}_{counter}");
                counter += 1;
            }
            candidate
        })
        .collect()
}

fn non_null(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_placeholder_token(&trimmed.to_ascii_lowercase()) {
        None
    } else {
        Some(trimmed)
    }
}

fn is_placeholder_token(lowered: &str) -> bool {
    let stripped = lowered.trim_start_matches('#');
    matches!(
        stripped,
        "na" | "n/a" | "n.a." | "nan" | "null" | "none" | "unknown" | "missing"
    ) || stripped.chars().all(|c| c == '-')
}

fn infer_column(name: &str, cells: &[Option<&str>]) -> Column {
    let mut candidate = TypeCandidate::default();
    for value in cells.iter().flatten() {
        candidate.update(value);
    }
    let data_type = candidate.decide();

    let present: Vec<&str> = cells.iter().flatten().copied().collect();
    let distinct: HashSet<&str> = present.iter().copied().collect();
    Column {
        name: name.to_string(),
        data_type,
        nullable: present.len() < cells.len(),
        unique: distinct.len() == present.len(),
        sample_values: present
            .iter()
            .take(MAX_SAMPLE_VALUES)
            .map(|raw| parse_typed_value(raw, &data_type))
            .collect::<Vec<Value>>(),
    }
}

#[derive(Debug, Clone, Default)]
struct TypeCandidate {
    non_empty: usize,
    boolean_matches: usize,
    integer_matches: usize,
    integer_exceeds_int: bool,
    decimal_matches: usize,
    date_matches: usize,
    datetime_matches: usize,
    max_length: usize,
}

impl TypeCandidate {
    fn update(&mut self, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }
        self.non_empty += 1;
        self.max_length = self.max_length.max(trimmed.chars().count());

        if parse_boolean(trimmed).is_some() {
            self.boolean_matches += 1;
        }
        if let Ok(parsed) = trimmed.parse::<i64>() {
            self.integer_matches += 1;
            if i32::try_from(parsed).is_err() {
                self.integer_exceeds_int = true;
            }
        } else if trimmed.parse::<f64>().is_ok_and(f64::is_finite) {
            self.decimal_matches += 1;
        } else if parse_naive_date(trimmed).is_ok() {
            self.date_matches += 1;
        } else if parse_naive_datetime(trimmed).is_ok() {
            self.datetime_matches += 1;
        }
    }

    fn all(&self, count: usize) -> bool {
        count > 0 && count == self.non_empty
    }

    fn decide(&self) -> DataType {
        if self.non_empty == 0 {
            DataType::Varchar {
                max_length: MIN_VARCHAR_LENGTH,
            }
        } else if self.all(self.boolean_matches) {
            DataType::Boolean
        } else if self.all(self.integer_matches) {
            if self.integer_exceeds_int {
                DataType::BigInteger
            } else {
                DataType::Integer
            }
        } else if self.all(self.integer_matches + self.decimal_matches) {
            DataType::Decimal
        } else if self.all(self.date_matches) {
            DataType::Date
        } else if self.datetime_matches > 0
            && self.all(self.date_matches + self.datetime_matches)
        {
            DataType::DateTime
        } else if self.max_length > TEXT_LENGTH_THRESHOLD {
            DataType::Text
        } else {
            DataType::Varchar {
                max_length: self.max_length.clamp(MIN_VARCHAR_LENGTH, MAX_VARCHAR_LENGTH),
            }
        }
    }
}
