#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_normalize::{
    data::Value,
    model::{Column, DataType, Table},
    rows::Row,
};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Builds a table of string columns. Empty cells become nulls.
pub fn table(name: &str, columns: &[&str], rows: &[&[&str]]) -> Table {
    let mut table = Table::new(
        name,
        columns
            .iter()
            .map(|column| Column::new(*column, DataType::Varchar { max_length: 50 }))
            .collect(),
    );
    table.data = rows
        .iter()
        .map(|cells| {
            columns
                .iter()
                .zip(cells.iter())
                .filter(|(_, cell)| !cell.is_empty())
                .map(|(column, cell)| (column.to_string(), Value::from(*cell)))
                .collect::<Row>()
        })
        .collect();
    table
}

/// Orders with a customer e-mail that depends on the customer name rather
/// than on the order.
pub fn orders_table() -> Table {
    table(
        "orders",
        &["order_id", "product", "qty", "customer_name", "customer_email"],
        &[
            &["1", "Widget", "2", "Alice", "alice@example.com"],
            &["2", "Gadget", "1", "Bob", "bob@example.com"],
            &["3", "Widget", "5", "Carol", "carol@example.com"],
            &["4", "Gizmo", "2", "Alice", "alice@example.com"],
            &["5", "Gadget", "5", "Bob", "bob@example.com"],
            &["6", "Widget", "1", "Alice", "alice@example.com"],
            &["7", "Gizmo", "5", "Carol", "carol@example.com"],
            &["8", "Gadget", "2", "Carol", "carol@example.com"],
            &["9", "Widget", "1", "Bob", "bob@example.com"],
            &["10", "Gizmo", "2", "Bob", "bob@example.com"],
        ],
    )
}

pub fn names(tables: &[Table]) -> Vec<&str> {
    tables.iter().map(|t| t.name.as_str()).collect()
}
