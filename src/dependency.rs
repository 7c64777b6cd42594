//! Statistical functional-dependency detection.
//!
//! Every candidate `X -> Y` is scored from the sampled rows by blending three
//! signals:
//!
//! - **violation score**: share of distinct `X` values that map to a single `Y`;
//! - **determination coefficient**: distinct `X` values over distinct `(X, Y)`
//!   combinations;
//! - **consistency**: mean share of the most frequent `Y` within each `X` group.
//!
//! The blend is a confidence in `[0, 1]`; candidates at or above the configured
//! threshold are accepted. Only determinants of one or two columns are
//! searched, and two-column determinants are only tried when single columns
//! explain little of the table.

use std::{
    collections::{BTreeMap, HashMap},
    slice,
};

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::AnalysisConfig,
    keys::KeyFinder,
    model::{ColumnSet, FunctionalDependency, MultiValuedDependency, Table, column_set},
    mvd::MvdDetector,
    rows::{self, Row, composite_key},
};

const VIOLATION_WEIGHT: f64 = 0.4;
const DETERMINATION_WEIGHT: f64 = 0.3;
const CONSISTENCY_WEIGHT: f64 = 0.3;

/// Everything detection infers about a single table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DependencySet {
    pub functional: Vec<FunctionalDependency>,
    pub multi_valued: Vec<MultiValuedDependency>,
    pub candidate_keys: Vec<ColumnSet>,
    #[serde(default)]
    pub primary_key: ColumnSet,
}

impl DependencySet {
    pub fn of(table: &Table) -> Self {
        Self {
            functional: table.functional_dependencies.clone(),
            multi_valued: table.multi_valued_dependencies.clone(),
            candidate_keys: table.candidate_keys.clone(),
            primary_key: table.primary_key.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.functional.is_empty() && self.multi_valued.is_empty() && self.candidate_keys.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DependencyDetector {
    config: AnalysisConfig,
}

impl DependencyDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Infers functional dependencies, candidate keys and multi-valued
    /// dependencies. Tables with fewer rows than the configured minimum yield
    /// an empty set.
    pub fn detect(&self, table: &Table) -> DependencySet {
        if table.row_count() < self.config.min_rows {
            debug!(
                "Skipping dependency detection for '{}': {} row(s) below minimum of {}",
                table.name,
                table.row_count(),
                self.config.min_rows
            );
            return DependencySet::default();
        }

        let functional = self.functional_dependencies(table);
        let candidate_keys = KeyFinder::new(&self.config).find_keys(table, &functional);
        let multi_valued = MvdDetector::new(&self.config).detect_mvds(table, &candidate_keys);
        debug!(
            "Detected {} functional dependency(ies), {} candidate key(s), {} multi-valued dependency(ies) in '{}'",
            functional.len(),
            candidate_keys.len(),
            multi_valued.len(),
            table.name
        );

        let primary_key = candidate_keys.first().cloned().unwrap_or_default();
        DependencySet {
            functional,
            multi_valued,
            candidate_keys,
            primary_key,
        }
    }

    pub fn functional_dependencies(&self, table: &Table) -> Vec<FunctionalDependency> {
        let rows = &table.data;
        let names = table.column_names();
        let threshold = self.config.confidence_threshold;
        let mut found = Vec::new();

        for determinant in &names {
            // Row-unique columns determine everything; the key finder owns them.
            if rows::is_row_unique(rows, slice::from_ref(determinant)) {
                continue;
            }
            for dependent in names.iter().filter(|name| *name != determinant) {
                let confidence = fd_confidence(
                    rows,
                    slice::from_ref(determinant),
                    slice::from_ref(dependent),
                );
                if confidence >= threshold {
                    found.push(FunctionalDependency::new(
                        column_set([determinant.as_str()]),
                        column_set([dependent.as_str()]),
                        round_confidence(confidence),
                    ));
                }
            }
        }

        if (found.len() as f64) < names.len() as f64 / 2.0 {
            let cutoff = rows.len() as f64 * self.config.composite_uniqueness_ratio;
            for pair in names.iter().combinations(2) {
                let determinant = [pair[0].to_string(), pair[1].to_string()];
                if rows::distinct_count(rows, &determinant) as f64 > cutoff {
                    continue;
                }
                for dependent in names.iter().filter(|name| !determinant.contains(*name)) {
                    let confidence =
                        fd_confidence(rows, &determinant, slice::from_ref(dependent));
                    if confidence >= threshold {
                        found.push(FunctionalDependency::new(
                            column_set(determinant.iter().cloned()),
                            column_set([dependent.as_str()]),
                            round_confidence(confidence),
                        ));
                    }
                }
            }
        }

        finalize_dependencies(found)
    }
}

/// Scores how strongly `determinant` functionally determines `dependent`.
///
/// Rows with a null on either side are ignored. Returns `0.0` whenever no row
/// survives or any component is not a finite number.
pub fn fd_confidence<S: AsRef<str>>(rows: &[Row], determinant: &[S], dependent: &[S]) -> f64 {
    let mut groups: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for row in rows {
        let (Some(det_key), Some(dep_key)) =
            (composite_key(row, determinant), composite_key(row, dependent))
        else {
            continue;
        };
        *groups.entry(det_key).or_default().entry(dep_key).or_insert(0) += 1;
    }
    if groups.is_empty() {
        return 0.0;
    }

    let distinct_determinants = groups.len();
    let combinations: usize = groups.values().map(BTreeMap::len).sum();
    let violating = groups.values().filter(|group| group.len() > 1).count();

    let violation_score = 1.0 - ratio(violating, distinct_determinants);
    let determination = ratio(distinct_determinants, combinations);
    let consistency = groups
        .values()
        .map(|group| {
            let total: usize = group.values().sum();
            let top = group.values().copied().max().unwrap_or(0);
            ratio(top, total)
        })
        .sum::<f64>()
        / distinct_determinants as f64;

    let confidence = violation_score * VIOLATION_WEIGHT
        + determination * DETERMINATION_WEIGHT
        + consistency * CONSISTENCY_WEIGHT;
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Drops trivial dependencies, keeps the most confident record for each
/// `(determinant, dependent)` pair and orders by descending confidence.
pub fn finalize_dependencies(fds: Vec<FunctionalDependency>) -> Vec<FunctionalDependency> {
    let mut positions: HashMap<(ColumnSet, ColumnSet), usize> = HashMap::new();
    let mut unique: Vec<FunctionalDependency> = Vec::new();
    for fd in fds.into_iter().filter(|fd| !fd.is_trivial()) {
        let key = (fd.determinant.clone(), fd.dependent.clone());
        match positions.get(&key) {
            Some(&idx) => {
                if fd.confidence > unique[idx].confidence {
                    unique[idx] = fd;
                }
            }
            None => {
                positions.insert(key, unique.len());
                unique.push(fd);
            }
        }
    }
    unique.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    unique
}

pub(crate) fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub(crate) fn round_confidence(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    fn rows(data: &[(&str, &str)]) -> Vec<Row> {
        data.iter()
            .map(|(a, b)| {
                let mut row = Row::new();
                row.insert("a".to_string(), Value::from(*a));
                row.insert("b".to_string(), Value::from(*b));
                row
            })
            .collect()
    }

    #[test]
    fn perfect_mapping_scores_one() {
        let data = rows(&[("x", "1"), ("x", "1"), ("y", "2"), ("y", "2")]);
        assert_eq!(fd_confidence(&data, &["a"], &["b"]), 1.0);
    }

    #[test]
    fn conflicting_mapping_blends_all_three_signals() {
        // x -> {1, 2}, y -> {3}: violation 0.5, determination 2/3, consistency 0.75
        let data = rows(&[("x", "1"), ("x", "2"), ("y", "3"), ("y", "3")]);
        let expected = 0.5 * 0.4 + (2.0 / 3.0) * 0.3 + 0.75 * 0.3;
        let score = fd_confidence(&data, &["a"], &["b"]);
        assert!((score - expected).abs() < 1e-9, "score {score}");
    }

    #[test]
    fn all_null_rows_score_zero() {
        let data = vec![Row::new(), Row::new()];
        assert_eq!(fd_confidence(&data, &["a"], &["b"]), 0.0);
        assert_eq!(fd_confidence::<&str>(&[], &["a"], &["b"]), 0.0);
    }

    #[test]
    fn finalize_filters_trivial_and_keeps_strongest_duplicate() {
        let weak = FunctionalDependency::new(column_set(["a"]), column_set(["b"]), 0.86);
        let strong = FunctionalDependency::new(column_set(["a"]), column_set(["b"]), 0.97);
        let trivial =
            FunctionalDependency::new(column_set(["a", "b"]), column_set(["a"]), 1.0);
        let other = FunctionalDependency::new(column_set(["c"]), column_set(["d"]), 0.9);

        let result = finalize_dependencies(vec![weak, trivial, other, strong]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].confidence, 0.97);
        assert_eq!(result[1].determinant, column_set(["c"]));
    }
}
