//! Multi-valued dependency detection.
//!
//! Under a fixed key value two attributes that vary independently of each
//! other indicate `key ->> A`. Independence is estimated per key partition with
//! the mutual information of the two attributes normalised by the smaller of
//! their entropies.

use std::collections::BTreeMap;

use itertools::Itertools;
use log::debug;

use crate::{
    config::AnalysisConfig,
    dependency::round_confidence,
    model::{ColumnSet, MultiValuedDependency, Table, column_set},
    rows::{self, Row, composite_key_lossy},
};

#[derive(Debug, Clone)]
pub struct MvdDetector {
    config: AnalysisConfig,
}

impl MvdDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn detect_mvds(&self, table: &Table, keys: &[ColumnSet]) -> Vec<MultiValuedDependency> {
        let mut found = Vec::new();
        if keys.is_empty() || table.data.is_empty() {
            return found;
        }

        for key in keys {
            let key_columns: Vec<&String> = key.iter().collect();
            let non_key: Vec<&String> = table
                .columns
                .iter()
                .map(|c| &c.name)
                .filter(|name| !key.contains(*name))
                .collect();
            if non_key.len() < 2 {
                continue;
            }

            let partitions = rows::partition_rows(&table.data, &key_columns);
            for pair in non_key.iter().combinations(2) {
                let (a, b) = (pair[0].as_str(), pair[1].as_str());
                let score = independence_score(&table.data, &partitions, a, b);
                if score >= self.config.confidence_threshold {
                    found.push(MultiValuedDependency::new(
                        key.clone(),
                        column_set([a]),
                        round_confidence(score),
                    ));
                }
            }
        }

        let mut unique: Vec<MultiValuedDependency> = Vec::new();
        for mvd in found {
            match unique
                .iter_mut()
                .find(|seen| seen.determinant == mvd.determinant && seen.dependent == mvd.dependent)
            {
                Some(seen) if mvd.confidence > seen.confidence => *seen = mvd,
                Some(_) => {}
                None => unique.push(mvd),
            }
        }
        debug!(
            "Detected {} multi-valued dependency(ies) in '{}'",
            unique.len(),
            table.name
        );
        unique
    }
}

/// Mean of `1 - MI(a; b) / min(H(a), H(b))` over the partitions where both
/// attributes take more than one value. Returns `0.0` when no partition
/// qualifies.
pub fn independence_score(rows: &[Row], partitions: &[Vec<usize>], a: &str, b: &str) -> f64 {
    let mut scores = Vec::new();
    for partition in partitions.iter().filter(|p| p.len() >= 2) {
        let pairs: Vec<(String, String)> = partition
            .iter()
            .map(|&idx| {
                let row = &rows[idx];
                (
                    composite_key_lossy(row, &[a]),
                    composite_key_lossy(row, &[b]),
                )
            })
            .collect();

        let a_counts = counts(pairs.iter().map(|(x, _)| x.as_str()));
        let b_counts = counts(pairs.iter().map(|(_, y)| y.as_str()));
        if a_counts.len() < 2 || b_counts.len() < 2 {
            continue;
        }
        let joint_counts = counts(pairs.iter().map(|(x, y)| (x.as_str(), y.as_str())));

        let total = pairs.len() as f64;
        let h_a = entropy(&a_counts, total);
        let h_b = entropy(&b_counts, total);
        let min_entropy = h_a.min(h_b);
        if min_entropy <= 0.0 {
            continue;
        }

        let mutual_information: f64 = joint_counts
            .iter()
            .map(|((x, y), &joint)| {
                let p_xy = joint as f64 / total;
                let p_x = a_counts[x] as f64 / total;
                let p_y = b_counts[y] as f64 / total;
                p_xy * (p_xy / (p_x * p_y)).ln()
            })
            .sum();

        let normalized = (mutual_information / min_entropy).clamp(0.0, 1.0);
        if normalized.is_finite() {
            scores.push(1.0 - normalized);
        }
    }

    if scores.is_empty() {
        return 0.0;
    }
    (scores.iter().sum::<f64>() / scores.len() as f64).clamp(0.0, 1.0)
}

fn counts<K: Ord>(items: impl Iterator<Item = K>) -> BTreeMap<K, usize> {
    let mut map = BTreeMap::new();
    for item in items {
        *map.entry(item).or_insert(0) += 1;
    }
    map
}

fn entropy<K>(counts: &BTreeMap<K, usize>, total: f64) -> f64 {
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.ln()
        })
        .sum()
}
