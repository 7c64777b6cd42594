//! Row representation and composite-key helpers shared by the detectors.
//!
//! A [`Row`] maps column names to [`Value`]s; a missing entry is a null.
//! Composite keys are built by joining the display form of each participating
//! cell with an ASCII unit separator so that `("a_b", "c")` and `("a", "b_c")`
//! never collide.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::data::Value;

pub type Row = BTreeMap<String, Value>;

const KEY_SEPARATOR: &str = "\u{1f}";
const NULL_TOKEN: &str = "\u{0}";

/// Composite key over `columns`, or `None` when any participating cell is null.
pub fn composite_key<S: AsRef<str>>(row: &Row, columns: &[S]) -> Option<String> {
    let mut parts = Vec::with_capacity(columns.len());
    for column in columns {
        parts.push(row.get(column.as_ref())?.as_display());
    }
    Some(parts.join(KEY_SEPARATOR))
}

/// Composite key over `columns` where nulls participate as a dedicated token.
pub fn composite_key_lossy<S: AsRef<str>>(row: &Row, columns: &[S]) -> String {
    columns
        .iter()
        .map(|column| match row.get(column.as_ref()) {
            Some(value) => value.as_display(),
            None => NULL_TOKEN.to_string(),
        })
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

pub fn has_nulls<S: AsRef<str>>(rows: &[Row], columns: &[S]) -> bool {
    rows.iter()
        .any(|row| columns.iter().any(|column| !row.contains_key(column.as_ref())))
}

/// Number of distinct composite values over `columns`, nulls included.
pub fn distinct_count<S: AsRef<str>>(rows: &[Row], columns: &[S]) -> usize {
    rows.iter()
        .map(|row| composite_key_lossy(row, columns))
        .collect::<HashSet<_>>()
        .len()
}

/// True when every row carries a non-null, distinct value combination.
pub fn is_row_unique<S: AsRef<str>>(rows: &[Row], columns: &[S]) -> bool {
    if rows.is_empty() || has_nulls(rows, columns) {
        return false;
    }
    distinct_count(rows, columns) == rows.len()
}

/// Groups row indices by the composite value of `columns`, preserving first
/// appearance order of each group.
pub fn partition_rows<S: AsRef<str>>(rows: &[Row], columns: &[S]) -> Vec<Vec<usize>> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let key = composite_key_lossy(row, columns);
        match positions.get(&key) {
            Some(&slot) => groups[slot].push(idx),
            None => {
                positions.insert(key, groups.len());
                groups.push(vec![idx]);
            }
        }
    }
    groups
}

/// Projects rows onto `columns`, dropping duplicates while keeping the first
/// occurrence. Rows with a null in any of `required` columns are skipped.
pub fn project_distinct<S: AsRef<str>>(rows: &[Row], columns: &[S], required: &[S]) -> Vec<Row> {
    let mut seen = HashSet::new();
    let mut projected = Vec::new();
    for row in rows {
        if required.iter().any(|column| !row.contains_key(column.as_ref())) {
            continue;
        }
        if !seen.insert(composite_key_lossy(row, columns)) {
            continue;
        }
        let cells = columns
            .iter()
            .filter_map(|column| {
                row.get(column.as_ref())
                    .map(|value| (column.as_ref().to_string(), value.clone()))
            })
            .collect::<Row>();
        projected.push(cells);
    }
    projected
}
