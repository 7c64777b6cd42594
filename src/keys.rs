//! Candidate key discovery.
//!
//! Keys are searched in three stages, stopping at the first stage that finds
//! anything: row-unique single columns, row-unique column combinations of
//! increasing size, and finally column sets whose closure under the accepted
//! functional dependencies covers the whole table. The result is always
//! reduced to minimal keys.

use std::slice;

use itertools::Itertools;
use log::debug;

use crate::{
    config::AnalysisConfig,
    dependency::fd_confidence,
    model::{ColumnSet, FunctionalDependency, Table, column_set},
    rows::{self, Row},
};

#[derive(Debug, Clone)]
pub struct KeyFinder {
    config: AnalysisConfig,
}

impl KeyFinder {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn find_keys(&self, table: &Table, fds: &[FunctionalDependency]) -> Vec<ColumnSet> {
        let rows = &table.data;
        let names = table.column_names();
        if rows.is_empty() || names.is_empty() {
            return Vec::new();
        }

        let mut keys = self.single_column_keys(rows, &names);
        if keys.is_empty() {
            keys = self.composite_keys(rows, &names);
        }
        if keys.is_empty() && !fds.is_empty() {
            keys = self.closure_keys(rows, &names, fds);
        }

        let keys = minimize_keys(keys);
        debug!(
            "Candidate keys for '{}': {}",
            table.name,
            keys.iter()
                .map(crate::model::format_set)
                .collect::<Vec<_>>()
                .join(", ")
        );
        keys
    }

    fn single_column_keys(&self, rows: &[Row], names: &[String]) -> Vec<ColumnSet> {
        names
            .iter()
            .filter(|name| rows::is_row_unique(rows, slice::from_ref(*name)))
            .filter(|name| self.determines_all(rows, slice::from_ref(*name), names))
            .map(|name| column_set([name.as_str()]))
            .collect()
    }

    fn composite_keys(&self, rows: &[Row], names: &[String]) -> Vec<ColumnSet> {
        let max_size = names.len().min(self.config.max_composite_key_size);
        let mut keys = Vec::new();
        for size in 2..=max_size {
            for combo in names.iter().cloned().combinations(size) {
                if !rows::is_row_unique(rows, &combo) {
                    continue;
                }
                if self.determines_all(rows, &combo, names) {
                    keys.push(column_set(combo));
                }
            }
            if !keys.is_empty() {
                break;
            }
        }
        keys
    }

    fn closure_keys(
        &self,
        rows: &[Row],
        names: &[String],
        fds: &[FunctionalDependency],
    ) -> Vec<ColumnSet> {
        let all_columns = column_set(names.iter().cloned());
        let max_size = names.len().min(self.config.max_closure_key_size);
        let mut keys = Vec::new();
        for size in 1..=max_size {
            for combo in names.iter().cloned().combinations(size) {
                let start = column_set(combo.iter().cloned());
                if closure(&start, fds, self.config.closure_max_iterations) != all_columns {
                    continue;
                }
                if rows::distinct_count(rows, &combo) == rows.len() {
                    keys.push(start);
                }
            }
            if !keys.is_empty() {
                break;
            }
        }
        keys
    }

    fn determines_all(&self, rows: &[Row], determinant: &[String], names: &[String]) -> bool {
        names
            .iter()
            .filter(|name| !determinant.contains(*name))
            .all(|name| {
                fd_confidence(rows, determinant, slice::from_ref(name))
                    >= self.config.confidence_threshold
            })
    }
}

/// Attribute closure of `start` under `fds`, bounded to `max_iterations`
/// passes so that cyclic dependency sets always terminate.
pub fn closure(
    start: &ColumnSet,
    fds: &[FunctionalDependency],
    max_iterations: usize,
) -> ColumnSet {
    let mut determined = start.clone();
    for _ in 0..max_iterations {
        let mut changed = false;
        for fd in fds {
            if fd.determinant.is_subset(&determined) && !fd.dependent.is_subset(&determined) {
                determined.extend(fd.dependent.iter().cloned());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    determined
}

/// Removes duplicate keys and keys that strictly contain another key.
pub fn minimize_keys(keys: Vec<ColumnSet>) -> Vec<ColumnSet> {
    let mut unique: Vec<ColumnSet> = Vec::new();
    for key in keys {
        if !unique.contains(&key) {
            unique.push(key);
        }
    }
    let minimal: Vec<ColumnSet> = unique
        .iter()
        .filter(|key| {
            !unique
                .iter()
                .any(|other| other != *key && other.is_subset(key))
        })
        .cloned()
        .collect();
    if minimal.is_empty() { unique } else { minimal }
}
