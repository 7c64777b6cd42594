//! Writes analysis output to disk: reports and one CSV per final table.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::info;

use crate::{
    io_utils::{self, DEFAULT_CSV_DELIMITER},
    model::Table,
};

/// Writes every table's sample rows to `<dir>/<table>.csv`, creating `dir`
/// when needed. Returns the written paths in table order.
pub fn export_tables(tables: &[Table], dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Creating export directory {dir:?}"))?;
    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(format!("{}.csv", table.name));
        write_table_csv(table, &path)?;
        written.push(path);
    }
    info!("Exported {} table(s) to {dir:?}", written.len());
    Ok(written)
}

pub fn write_table_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(Some(path), DEFAULT_CSV_DELIMITER)?;
    writer
        .write_record(table.columns.iter().map(|c| c.name.as_str()))
        .with_context(|| format!("Writing header of {path:?}"))?;
    for row in &table.data {
        let cells = table.columns.iter().map(|column| {
            row.get(&column.name)
                .map(|value| value.as_display())
                .unwrap_or_default()
        });
        writer
            .write_record(cells)
            .with_context(|| format!("Writing row of '{}' to {path:?}", table.name))?;
    }
    writer
        .flush()
        .with_context(|| format!("Flushing {path:?}"))?;
    Ok(())
}

/// Writes `contents` to `path`, or to stdout when no path (or `-`) is given.
pub fn write_report(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(p) if !io_utils::is_dash(p) => {
            fs::write(p, contents).with_context(|| format!("Writing report to {p:?}"))
        }
        _ => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(contents.as_bytes())
                .context("Writing report to stdout")?;
            stdout.flush().context("Flushing stdout")
        }
    }
}
