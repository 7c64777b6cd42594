//! Normal-form classification.
//!
//! Each predicate checks one level in isolation; [`classify`] walks the levels
//! in order and returns the highest one whose predicate holds together with
//! every lower predicate. The violation finders are shared with the
//! decomposition engine so both always agree on what a violation is.

use std::collections::BTreeMap;

use crate::{
    data::Value,
    model::{FunctionalDependency, MultiValuedDependency, Table},
    normal_form::NormalForm,
};

/// Number of leading rows inspected for non-atomic values.
pub const ATOMICITY_SAMPLE_ROWS: usize = 20;

/// Strips a trailing run of digits and underscores: `phone_2` -> `phone`.
pub fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches(|c: char| c.is_ascii_digit() || c == '_');
    if trimmed.is_empty() { name } else { trimmed }
}

/// Clusters of columns that share a base name, in column order.
pub fn repeating_groups(table: &Table) -> Vec<Vec<String>> {
    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut order: Vec<&str> = Vec::new();
    for column in &table.columns {
        let base = base_name(&column.name);
        let entry = groups.entry(base).or_default();
        if entry.is_empty() {
            order.push(base);
        }
        entry.push(column.name.clone());
    }
    order
        .into_iter()
        .filter_map(|base| groups.remove(base))
        .filter(|members| members.len() > 1)
        .collect()
}

pub fn is_non_atomic(value: &Value) -> bool {
    value.is_collection() || value.as_str().is_some_and(|text| text.split(',').count() > 2)
}

/// Columns holding at least one non-atomic value among the first sampled rows.
pub fn non_atomic_columns(table: &Table) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|column| {
            table
                .data
                .iter()
                .take(ATOMICITY_SAMPLE_ROWS)
                .filter_map(|row| row.get(&column.name))
                .any(is_non_atomic)
        })
        .map(|column| column.name.clone())
        .collect()
}

/// FDs whose determinant is a strict part of a composite primary key.
pub fn partial_dependencies(table: &Table) -> Vec<&FunctionalDependency> {
    if table.primary_key.len() <= 1 {
        return Vec::new();
    }
    table
        .functional_dependencies
        .iter()
        .filter(|fd| {
            !fd.determinant.is_empty()
                && fd.determinant.is_subset(&table.primary_key)
                && fd.determinant != table.primary_key
                && !table.is_superkey(&fd.determinant)
                && !dependent_within_key(table, fd)
        })
        .collect()
}

/// FDs from a non-superkey into attributes that belong to no candidate key.
pub fn transitive_dependencies(table: &Table) -> Vec<&FunctionalDependency> {
    table
        .functional_dependencies
        .iter()
        .filter(|fd| {
            !table.is_superkey(&fd.determinant)
                && fd
                    .dependent
                    .iter()
                    .all(|column| !table.is_key_attribute(column))
        })
        .collect()
}

pub fn non_superkey_dependencies(table: &Table) -> Vec<&FunctionalDependency> {
    table
        .functional_dependencies
        .iter()
        .filter(|fd| !table.is_superkey(&fd.determinant))
        .collect()
}

pub fn non_trivial_mvds(table: &Table) -> Vec<&MultiValuedDependency> {
    let all_columns = table.column_name_set();
    table
        .multi_valued_dependencies
        .iter()
        .filter(|mvd| !mvd.is_trivial(&all_columns))
        .collect()
}

fn dependent_within_key(table: &Table, fd: &FunctionalDependency) -> bool {
    table
        .candidate_keys
        .iter()
        .any(|key| fd.dependent.is_subset(key))
}

pub fn is_1nf(table: &Table) -> bool {
    repeating_groups(table).is_empty() && non_atomic_columns(table).is_empty()
}

pub fn is_2nf(table: &Table) -> bool {
    is_1nf(table) && partial_dependencies(table).is_empty()
}

pub fn is_3nf(table: &Table) -> bool {
    is_2nf(table) && transitive_dependencies(table).is_empty()
}

pub fn is_bcnf(table: &Table) -> bool {
    is_3nf(table) && non_superkey_dependencies(table).is_empty()
}

pub fn is_4nf(table: &Table) -> bool {
    is_bcnf(table) && non_trivial_mvds(table).is_empty()
}

/// Approximated as "no multi-valued dependency remains"; join dependencies
/// are not detected.
pub fn is_5nf(table: &Table) -> bool {
    is_4nf(table) && table.multi_valued_dependencies.is_empty()
}

pub fn satisfies(table: &Table, form: NormalForm) -> bool {
    match form {
        NormalForm::Unnormalized => true,
        NormalForm::First => is_1nf(table),
        NormalForm::Second => is_2nf(table),
        NormalForm::Third => is_3nf(table),
        NormalForm::BoyceCodd => is_bcnf(table),
        NormalForm::Fourth => is_4nf(table),
        NormalForm::Fifth => is_5nf(table),
    }
}

/// Highest normal form the table satisfies.
pub fn classify(table: &Table) -> NormalForm {
    let mut reached = NormalForm::Unnormalized;
    for form in NormalForm::ALL.into_iter().skip(1) {
        if !satisfies(table, form) {
            break;
        }
        reached = form;
    }
    reached
}
