//! Stepwise decomposition of a table towards a target normal form.
//!
//! The engine keeps an untouched snapshot of the source table and a private
//! working set of tables. Each normal-form level above the classified one is
//! handled by exactly one transition, which records the violations it found,
//! rewrites the working set where that level calls for it and appends a
//! [`NormalizationStep`].

use std::collections::BTreeSet;

use log::{debug, info};

use crate::{
    analysis::{AnalysisResult, NormalizationStep, Violation},
    classify::{
        self, non_atomic_columns, non_superkey_dependencies, non_trivial_mvds,
        partial_dependencies, repeating_groups, transitive_dependencies,
    },
    config::AnalysisConfig,
    dependency::{DependencyDetector, DependencySet},
    keys::{KeyFinder, closure, minimize_keys},
    model::{
        ColumnSet, ForeignKey, FunctionalDependency, MultiValuedDependency, Table, TableError,
        format_set,
    },
    normal_form::NormalForm,
    rows::{self, Row},
};

/// Runs a full analysis of `table` with `config`.
pub fn analyze_table(table: Table, config: &AnalysisConfig) -> Result<AnalysisResult, TableError> {
    Ok(NormalizationEngine::new(table, config)?.analyze())
}

#[derive(Debug, Clone)]
pub struct NormalizationEngine {
    original: Table,
    tables: Vec<Table>,
    dependencies: DependencySet,
    config: AnalysisConfig,
}

impl NormalizationEngine {
    /// Validates `table` and, when it carries no dependencies or keys of its
    /// own, populates them through detection.
    pub fn new(table: Table, config: &AnalysisConfig) -> Result<Self, TableError> {
        table.validate()?;
        let original = table.clone();
        let mut working = table;

        let carries_nothing = working.functional_dependencies.is_empty()
            && working.multi_valued_dependencies.is_empty()
            && working.candidate_keys.is_empty();
        if carries_nothing {
            let detected = DependencyDetector::new(config).detect(&working);
            working.functional_dependencies = detected.functional;
            working.multi_valued_dependencies = detected.multi_valued;
            working.candidate_keys = detected.candidate_keys;
        } else if working.candidate_keys.is_empty() && !working.functional_dependencies.is_empty() {
            working.candidate_keys =
                KeyFinder::new(config).find_keys(&working, &working.functional_dependencies);
        }
        if working.primary_key.is_empty() {
            if let Some(first) = working.candidate_keys.first() {
                working.primary_key = first.clone();
            }
        }

        Ok(Self {
            original,
            dependencies: DependencySet::of(&working),
            tables: vec![working],
            config: config.clone(),
        })
    }

    pub fn dependencies(&self) -> &DependencySet {
        &self.dependencies
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn analyze(mut self) -> AnalysisResult {
        let target = self.config.target;
        let start = classify::classify(&self.tables[0]);
        info!(
            "Analyzing '{}' ({} column(s), {} row(s)): currently {start}, target {target}",
            self.original.name,
            self.original.columns.len(),
            self.original.row_count()
        );

        let mut steps = Vec::new();
        let mut current = start;
        for level in start.levels_until(target) {
            let violations = match level {
                NormalForm::Unnormalized => Vec::new(),
                NormalForm::First => self.record_atomicity(),
                NormalForm::Second | NormalForm::Third => self.extract_dependencies(level),
                NormalForm::BoyceCodd => self.report_non_key_determinants(),
                NormalForm::Fourth => self.split_multi_valued(),
                NormalForm::Fifth => self.review_join_dependencies(),
            };
            debug!(
                "{current} -> {level}: {} violation(s), {} table(s)",
                violations.len(),
                self.tables.len()
            );
            steps.push(NormalizationStep {
                from_nf: current,
                to_nf: level,
                explanation: explain(level, &violations),
                violations,
                tables: self.tables.clone(),
            });
            current = level;
        }

        let result = AnalysisResult {
            original_table: self.original,
            dependencies: self.dependencies,
            current_normal_form: start,
            target_normal_form: target,
            steps,
            final_tables: self.tables,
        };
        info!(
            "Finished '{}': {} -> {} in {} step(s), {} table(s), {} violation(s)",
            result.original_table.name,
            start,
            result.final_normal_form(),
            result.steps.len(),
            result.final_tables.len(),
            result.violation_count()
        );
        result
    }

    fn record_atomicity(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        for table in &self.tables {
            for group in repeating_groups(table) {
                let base = classify::base_name(&group[0]).to_string();
                violations.push(Violation {
                    normal_form: NormalForm::First,
                    description: format!(
                        "Repeating group in '{}': {}",
                        table.name,
                        group.join(", ")
                    ),
                    affected_columns: group.iter().cloned().collect(),
                    explanation: format!(
                        "Columns sharing the base name '{base}' store the same attribute several times in one row."
                    ),
                    resolution: format!(
                        "Move '{base}' into a separate table with one row per value, referencing '{}'.",
                        table.name
                    ),
                });
            }
            for column in non_atomic_columns(table) {
                violations.push(Violation {
                    normal_form: NormalForm::First,
                    description: format!("Non-atomic values in '{}.{column}'", table.name),
                    affected_columns: ColumnSet::from([column.clone()]),
                    explanation: format!(
                        "Column '{column}' holds lists of values instead of a single value per cell."
                    ),
                    resolution: format!(
                        "Split '{column}' into one row per value in a separate table."
                    ),
                });
            }
        }
        violations
    }

    fn extract_dependencies(&mut self, level: NormalForm) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut taken: BTreeSet<String> = self.tables.iter().map(|t| t.name.clone()).collect();
        let mut next = Vec::with_capacity(self.tables.len());

        for table in std::mem::take(&mut self.tables) {
            next.extend(extract_until_clean(table, level, &mut taken, &mut violations));
        }

        self.tables = next;
        violations
    }

    fn report_non_key_determinants(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        for table in &self.tables {
            for fd in non_superkey_dependencies(table) {
                violations.push(Violation {
                    normal_form: NormalForm::BoyceCodd,
                    description: format!("Non-key determinant in '{}': {fd}", table.name),
                    affected_columns: fd.columns(),
                    explanation: format!(
                        "{} determines {} but is not a superkey of '{}'.",
                        format_set(&fd.determinant),
                        format_set(&fd.dependent),
                        table.name
                    ),
                    resolution: format!(
                        "Review manually: decompose '{}' on {} so that every determinant is a key.",
                        table.name,
                        format_set(&fd.determinant)
                    ),
                });
            }
        }
        violations
    }

    fn split_multi_valued(&mut self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut taken: BTreeSet<String> = self.tables.iter().map(|t| t.name.clone()).collect();
        let mut next = Vec::with_capacity(self.tables.len());

        for mut table in std::mem::take(&mut self.tables) {
            let pending: Vec<_> = non_trivial_mvds(&table).into_iter().cloned().collect();
            let mut projections = Vec::new();
            for mvd in pending {
                let current_columns = table.column_name_set();
                if !mvd.columns().is_subset(&current_columns) || mvd.is_trivial(&current_columns) {
                    violations.push(resolved_multi_valued(&table, &mvd, &projections));
                    continue;
                }
                let name = unique_name(
                    format!("{}_{}", table.name, join_columns(&mvd.dependent)),
                    &mut taken,
                );
                violations.push(Violation {
                    normal_form: NormalForm::Fourth,
                    description: format!("Multi-valued dependency in '{}': {mvd}", table.name),
                    affected_columns: mvd.columns(),
                    explanation: format!(
                        "Values of {} vary independently of the other attributes for each {}.",
                        format_set(&mvd.dependent),
                        format_set(&mvd.determinant)
                    ),
                    resolution: format!(
                        "Moved {} into '{name}' keyed by {}.",
                        format_set(&mvd.dependent),
                        format_set(&mvd.columns())
                    ),
                });
                let projection = project_multi_valued(&mut table, &mvd.determinant, &mvd.dependent, name);
                debug!(
                    "Split '{}' into '{}' on {}",
                    table.name,
                    projection.name,
                    format_set(&mvd.determinant)
                );
                projections.push(projection);
            }

            let all_columns = table.column_name_set();
            table
                .multi_valued_dependencies
                .retain(|mvd| !mvd.is_trivial(&all_columns));
            next.push(table);
            next.extend(projections);
        }

        self.tables = next;
        violations
    }

    fn review_join_dependencies(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        for table in &self.tables {
            for mvd in &table.multi_valued_dependencies {
                violations.push(Violation {
                    normal_form: NormalForm::Fifth,
                    description: format!("Possible join dependency in '{}': {mvd}", table.name),
                    affected_columns: mvd.columns(),
                    explanation: format!(
                        "'{}' still carries a multi-valued dependency, so it may be the join of smaller projections.",
                        table.name
                    ),
                    resolution: "Review manually whether the table can be losslessly decomposed further."
                        .to_string(),
                });
            }
        }
        violations
    }
}

/// Violation for an MVD that an earlier projection of the same table already
/// split off or made trivial.
fn resolved_multi_valued(
    table: &Table,
    mvd: &MultiValuedDependency,
    projections: &[Table],
) -> Violation {
    let current_columns = table.column_name_set();
    let resolved_by = projections
        .iter()
        .rev()
        .find(|projection| {
            mvd.columns()
                .iter()
                .any(|c| projection.has_column(c) && !current_columns.contains(c))
        })
        .or(projections.last());
    let resolution = match resolved_by {
        Some(projection) => format!("Resolved by the projection into '{}'.", projection.name),
        None => format!("Resolved by the other projections of '{}'.", table.name),
    };
    Violation {
        normal_form: NormalForm::Fourth,
        description: format!("Multi-valued dependency in '{}': {mvd}", table.name),
        affected_columns: mvd.columns(),
        explanation: format!(
            "Values of {} vary independently of the other attributes for each {}.",
            format_set(&mvd.dependent),
            format_set(&mvd.determinant)
        ),
        resolution,
    }
}

/// Extracts the dependencies of `table` that violate `level`, then keeps
/// extracting from every table that produced until none of them violates it.
///
/// A produced table is revisited only when it is narrower than its parent, or
/// when its parent had no candidate key and it now has one. An extraction from
/// a keyed table never spans all of its columns, so this always terminates.
fn extract_until_clean(
    table: Table,
    level: NormalForm,
    taken: &mut BTreeSet<String>,
    violations: &mut Vec<Violation>,
) -> Vec<Table> {
    let pending: Vec<FunctionalDependency> = match level {
        NormalForm::Second => partial_dependencies(&table),
        _ => transitive_dependencies(&table),
    }
    .into_iter()
    .cloned()
    .collect();
    if pending.is_empty() {
        return vec![table];
    }

    let plan = plan_extractions(&table, pending.clone(), level, taken);
    for fd in &pending {
        violations.push(extraction_violation(&table, fd, level, &plan));
    }
    if plan.is_empty() {
        return vec![table];
    }

    let width = table.columns.len();
    let keyless = table.candidate_keys.is_empty();
    let (source, extracted) = apply_extractions(table, &plan);
    let mut resolved = Vec::with_capacity(plan.len() + 1);
    for produced in std::iter::once(source).chain(extracted) {
        let progressed =
            produced.columns.len() < width || (keyless && !produced.candidate_keys.is_empty());
        if progressed {
            resolved.extend(extract_until_clean(produced, level, taken, violations));
        } else {
            resolved.push(produced);
        }
    }
    resolved
}

/// One planned extraction: `dependents` leave the source table for a new
/// table keyed by `determinant`.
#[derive(Debug, Clone)]
struct Extraction {
    name: String,
    determinant: ColumnSet,
    dependents: ColumnSet,
}

/// Chooses which dependencies to extract from `table`. Dependencies are taken
/// smallest determinant first; a dependency whose dependents determine another
/// pending dependency waits so that chains are extracted from the tail.
fn plan_extractions(
    table: &Table,
    mut pending: Vec<FunctionalDependency>,
    level: NormalForm,
    taken: &mut BTreeSet<String>,
) -> Vec<Extraction> {
    pending.sort_by(|a, b| {
        a.determinant
            .len()
            .cmp(&b.determinant.len())
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });

    let mut remaining = table.column_name_set();
    let mut plan: Vec<Extraction> = Vec::new();
    loop {
        pending.retain(|fd| fd.columns().is_subset(&remaining));
        if pending.is_empty() {
            break;
        }
        let chosen = pending
            .iter()
            .position(|fd| {
                !pending.iter().any(|other| {
                    !std::ptr::eq(fd, other)
                        && fd.dependent.iter().any(|c| other.determinant.contains(c))
                })
            })
            .unwrap_or(0);
        let fd = pending.remove(chosen);

        let moved: ColumnSet = fd
            .dependent
            .iter()
            .filter(|column| !table.is_key_attribute(column))
            .cloned()
            .collect();
        if moved.is_empty() {
            continue;
        }
        for column in &moved {
            remaining.remove(column);
        }

        match plan.iter_mut().find(|e| e.determinant == fd.determinant) {
            Some(existing) => existing.dependents.extend(moved),
            None => {
                let suffix = match level {
                    NormalForm::Second => join_columns(&moved),
                    _ => join_columns(&fd.determinant),
                };
                let name = unique_name(format!("{}_{suffix}", table.name), taken);
                plan.push(Extraction {
                    name,
                    determinant: fd.determinant,
                    dependents: moved,
                });
            }
        }
    }
    plan
}

fn extraction_violation(
    table: &Table,
    fd: &FunctionalDependency,
    level: NormalForm,
    plan: &[Extraction],
) -> Violation {
    let (kind, explanation) = match level {
        NormalForm::Second => (
            "Partial dependency",
            format!(
                "{} depends on {}, which is only part of the primary key {}.",
                format_set(&fd.dependent),
                format_set(&fd.determinant),
                format_set(&table.primary_key)
            ),
        ),
        _ => (
            "Transitive dependency",
            format!(
                "{} depends on the non-key attribute(s) {} rather than on a key of '{}'.",
                format_set(&fd.dependent),
                format_set(&fd.determinant),
                table.name
            ),
        ),
    };
    let resolution = match plan.iter().find(|e| fd.dependent.is_subset(&e.dependents)) {
        Some(extraction) => format!(
            "Moved {} into '{}' keyed by {}.",
            format_set(&extraction.dependents),
            extraction.name,
            format_set(&extraction.determinant)
        ),
        None => format!(
            "Resolved by the other extractions from '{}'.",
            table.name
        ),
    };
    Violation {
        normal_form: level,
        description: format!("{kind} in '{}': {fd}", table.name),
        affected_columns: fd.columns(),
        explanation,
        resolution,
    }
}

/// Splits `table` according to `plan`. Returns the reduced source followed by
/// the extracted tables in plan order.
fn apply_extractions(mut source: Table, plan: &[Extraction]) -> (Table, Vec<Table>) {
    let moved: ColumnSet = plan
        .iter()
        .flat_map(|e| e.dependents.iter().cloned())
        .collect();
    let mut extracted: Vec<Table> = plan
        .iter()
        .map(|extraction| build_extracted(&source, extraction))
        .collect();

    // Foreign keys on moved columns travel with them.
    let moved_fks: Vec<(String, ForeignKey)> = source
        .foreign_keys
        .iter()
        .filter(|(column, _)| moved.contains(*column))
        .map(|(column, fk)| (column.clone(), fk.clone()))
        .collect();
    for (column, fk) in moved_fks {
        if let Some(holder) = extracted.iter_mut().find(|t| t.has_column(&column)) {
            holder.foreign_keys.insert(column, fk);
        }
    }

    retain_columns(&mut source, &moved);
    for row in &mut source.data {
        row.retain(|column, _| !moved.contains(column));
    }

    for extraction in plan {
        for column in &extraction.determinant {
            let fk = ForeignKey {
                table: extraction.name.clone(),
                column: column.clone(),
            };
            if source.has_column(column) {
                source.foreign_keys.entry(column.clone()).or_insert(fk);
            } else if let Some(holder) = extracted
                .iter_mut()
                .find(|t| t.name != extraction.name && t.has_column(column))
            {
                holder.foreign_keys.entry(column.clone()).or_insert(fk);
            }
        }
        debug!(
            "Extracted '{}' from '{}' keyed by {}",
            extraction.name,
            source.name,
            format_set(&extraction.determinant)
        );
    }

    (source, extracted)
}

fn build_extracted(source: &Table, extraction: &Extraction) -> Table {
    let wanted: ColumnSet = extraction
        .determinant
        .union(&extraction.dependents)
        .cloned()
        .collect();
    let columns: Vec<_> = source
        .columns
        .iter()
        .filter(|c| wanted.contains(&c.name))
        .cloned()
        .collect();
    let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
    let required: Vec<String> = extraction.determinant.iter().cloned().collect();

    let mut table = Table::new(extraction.name.clone(), columns);
    table.data = rows::project_distinct(&source.data, &names, &required);
    table.functional_dependencies = source
        .functional_dependencies
        .iter()
        .filter(|fd| fd.columns().is_subset(&wanted))
        .cloned()
        .collect();
    table.multi_valued_dependencies = source
        .multi_valued_dependencies
        .iter()
        .filter(|mvd| mvd.columns().is_subset(&wanted) && !mvd.is_trivial(&wanted))
        .cloned()
        .collect();
    table.candidate_keys = extracted_keys(&table, &extraction.determinant);
    table.primary_key = extraction.determinant.clone();
    table
}

/// Keys of a freshly extracted table: its determinant plus any carried
/// determinant whose closure spans the table and whose values are unique.
fn extracted_keys(table: &Table, determinant: &ColumnSet) -> Vec<ColumnSet> {
    let all_columns = table.column_name_set();
    let mut keys = vec![determinant.clone()];
    for fd in &table.functional_dependencies {
        if keys.contains(&fd.determinant) {
            continue;
        }
        let spans = closure(&fd.determinant, &table.functional_dependencies, usize::MAX)
            == all_columns;
        let columns: Vec<&String> = fd.determinant.iter().collect();
        if spans && rows::is_row_unique(&table.data, &columns) {
            keys.push(fd.determinant.clone());
        }
    }
    let mut keys = minimize_keys(keys);
    // The determinant stays first so it remains the primary key.
    if let Some(pos) = keys.iter().position(|k| k == determinant) {
        let key = keys.remove(pos);
        keys.insert(0, key);
    }
    keys
}

/// Moves `dependent` out of `table` into a projection `determinant ∪ dependent`
/// whose key is all of its columns, and removes the duplicates left behind.
fn project_multi_valued(
    table: &mut Table,
    determinant: &ColumnSet,
    dependent: &ColumnSet,
    name: String,
) -> Table {
    let wanted: ColumnSet = determinant.union(dependent).cloned().collect();
    let columns: Vec<_> = table
        .columns
        .iter()
        .filter(|c| wanted.contains(&c.name))
        .cloned()
        .collect();
    let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
    let required: Vec<String> = determinant.iter().cloned().collect();

    let mut projection = Table::new(name, columns);
    projection.data = rows::project_distinct(&table.data, &names, &required);
    projection.primary_key = wanted.clone();
    projection.candidate_keys = vec![wanted.clone()];
    projection.functional_dependencies = table
        .functional_dependencies
        .iter()
        .filter(|fd| fd.columns().is_subset(&wanted))
        .cloned()
        .collect();
    for column in determinant {
        projection.foreign_keys.insert(
            column.clone(),
            ForeignKey {
                table: table.name.clone(),
                column: column.clone(),
            },
        );
    }
    for column in dependent {
        if let Some(fk) = table.foreign_keys.remove(column) {
            projection.foreign_keys.insert(column.clone(), fk);
        }
    }

    retain_columns(table, dependent);
    let remaining: Vec<String> = table.column_names();
    let no_required: &[String] = &[];
    let stripped: Vec<Row> = table
        .data
        .iter()
        .map(|row| {
            row.iter()
                .filter(|(column, _)| !dependent.contains(*column))
                .map(|(column, value)| (column.clone(), value.clone()))
                .collect()
        })
        .collect();
    table.data = rows::project_distinct(&stripped, &remaining, no_required);

    let all_columns = table.column_name_set();
    table.candidate_keys.retain(|key| key.is_subset(&all_columns));
    if table.candidate_keys.is_empty() {
        table.candidate_keys.push(all_columns.clone());
    }
    if !table.primary_key.is_subset(&all_columns) {
        table.primary_key = table.candidate_keys[0].clone();
    }
    projection
}

/// Drops `removed` columns from `table` together with every dependency, key
/// and foreign key that mentions them.
fn retain_columns(table: &mut Table, removed: &ColumnSet) {
    table.columns.retain(|c| !removed.contains(&c.name));
    let remaining = table.column_name_set();
    table
        .functional_dependencies
        .retain(|fd| fd.columns().is_subset(&remaining));
    table
        .multi_valued_dependencies
        .retain(|mvd| mvd.columns().is_subset(&remaining));
    table
        .candidate_keys
        .retain(|key| key.is_subset(&remaining));
    table
        .foreign_keys
        .retain(|column, _| remaining.contains(column));
}

fn join_columns(columns: &ColumnSet) -> String {
    columns.iter().map(String::as_str).collect::<Vec<_>>().join("_")
}

fn unique_name(base: String, taken: &mut BTreeSet<String>) -> String {
    let mut candidate = base.clone();
    let mut counter = 2;
    while taken.contains(&candidate) {
        candidate = format!("{base}_{counter}");
        counter += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

fn explain(level: NormalForm, violations: &[Violation]) -> String {
    let requirement = match level {
        NormalForm::Unnormalized => "",
        NormalForm::First => {
            "1NF requires atomic values in every cell and no repeating groups of columns."
        }
        NormalForm::Second => {
            "2NF requires every non-key attribute to depend on the whole primary key, not on part of it."
        }
        NormalForm::Third => {
            "3NF requires non-key attributes to depend only on keys, never on other non-key attributes."
        }
        NormalForm::BoyceCodd => "BCNF requires the determinant of every functional dependency to be a superkey.",
        NormalForm::Fourth => {
            "4NF requires that no table holds independent multi-valued facts about the same key."
        }
        NormalForm::Fifth => {
            "5NF requires that a table cannot be reconstructed from smaller projections without loss."
        }
    };
    if violations.is_empty() {
        return format!("{requirement} Already compliant with {level}; no changes were needed.");
    }
    let action = match level {
        NormalForm::First => {
            "These issues are recorded; splitting rows requires manual restructuring."
        }
        NormalForm::Second | NormalForm::Third => {
            "Each offending dependency was moved into its own table keyed by its determinant, linked back with a foreign key."
        }
        NormalForm::BoyceCodd => {
            "These dependencies are reported for manual review; no tables were changed."
        }
        NormalForm::Fourth => {
            "Each table was split into the key with the independent attribute and the key with the remaining attributes."
        }
        NormalForm::Fifth => {
            "Remaining multi-valued dependencies need manual review for join dependencies."
        }
        NormalForm::Unnormalized => "",
    };
    format!(
        "{requirement} Found {} violation(s). {action}",
        violations.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::Value,
        model::{Column, DataType, column_set},
    };

    fn varchar(name: &str) -> Column {
        Column::new(name, DataType::Varchar { max_length: 50 })
    }

    fn row(cells: &[(&str, &str)]) -> Row {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn unique_name_appends_counter() {
        let mut taken = BTreeSet::from(["orders_customer".to_string()]);
        assert_eq!(
            unique_name("orders_customer".to_string(), &mut taken),
            "orders_customer_2"
        );
        assert_eq!(
            unique_name("orders_customer".to_string(), &mut taken),
            "orders_customer_3"
        );
    }

    #[test]
    fn chains_are_extracted_from_the_tail() {
        let mut table = Table::new("t", vec![varchar("k"), varchar("a"), varchar("b"), varchar("c")]);
        table.candidate_keys = vec![column_set(["k"])];
        table.primary_key = column_set(["k"]);
        let a_b = FunctionalDependency::new(column_set(["a"]), column_set(["b"]), 1.0);
        let b_c = FunctionalDependency::new(column_set(["b"]), column_set(["c"]), 1.0);
        let mut taken = BTreeSet::from(["t".to_string()]);

        let plan = plan_extractions(&table, vec![a_b, b_c], NormalForm::Third, &mut taken);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].name, "t_b");
        assert_eq!(plan[0].dependents, column_set(["c"]));
        assert_eq!(plan[1].name, "t_a");
        assert_eq!(plan[1].dependents, column_set(["b"]));
    }

    #[test]
    fn foreign_key_follows_a_moved_determinant() {
        let mut table = Table::new("t", vec![varchar("k"), varchar("a"), varchar("b"), varchar("c")]);
        table.candidate_keys = vec![column_set(["k"])];
        table.primary_key = column_set(["k"]);
        table.data = vec![
            row(&[("k", "1"), ("a", "x"), ("b", "p"), ("c", "u")]),
            row(&[("k", "2"), ("a", "y"), ("b", "q"), ("c", "v")]),
            row(&[("k", "3"), ("a", "x"), ("b", "p"), ("c", "u")]),
        ];
        let plan = vec![
            Extraction {
                name: "t_b".to_string(),
                determinant: column_set(["b"]),
                dependents: column_set(["c"]),
            },
            Extraction {
                name: "t_a".to_string(),
                determinant: column_set(["a"]),
                dependents: column_set(["b"]),
            },
        ];

        let (source, extracted) = apply_extractions(table, &plan);
        assert_eq!(source.column_names(), vec!["k", "a"]);
        assert_eq!(source.foreign_keys["a"].table, "t_a");
        assert_eq!(extracted[0].row_count(), 2);
        assert_eq!(extracted[1].foreign_keys["b"].table, "t_b");
        assert!(source.data.iter().all(|r| !r.contains_key("b")));
    }

    #[test]
    fn fourth_normal_form_projects_independent_attribute() {
        let mut table = Table::new(
            "assignments",
            vec![varchar("employee"), varchar("skill"), varchar("language")],
        );
        table.data = vec![
            row(&[("employee", "ann"), ("skill", "sql"), ("language", "en")]),
            row(&[("employee", "ann"), ("skill", "sql"), ("language", "fr")]),
            row(&[("employee", "ann"), ("skill", "rust"), ("language", "en")]),
            row(&[("employee", "ann"), ("skill", "rust"), ("language", "fr")]),
        ];
        table.candidate_keys = vec![column_set(["employee", "skill", "language"])];
        table.multi_valued_dependencies = vec![MultiValuedDependency::new(
            column_set(["employee"]),
            column_set(["skill"]),
            1.0,
        )];

        let result = analyze_table(table, &AnalysisConfig::default()).expect("valid table");
        assert_eq!(result.current_normal_form, NormalForm::BoyceCodd);
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].violations.len(), 1);
        assert!(result.steps[1].is_compliant());

        let names: Vec<_> = result.final_tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["assignments", "assignments_skill"]);
        let source = &result.final_tables[0];
        assert_eq!(source.column_names(), vec!["employee", "language"]);
        assert_eq!(source.row_count(), 2);
        assert_eq!(source.primary_key, column_set(["employee", "language"]));
        let projection = &result.final_tables[1];
        assert_eq!(projection.row_count(), 2);
        assert_eq!(projection.foreign_keys["employee"].table, "assignments");
    }

    #[test]
    fn multi_valued_dependency_made_trivial_is_still_reported() {
        let mut table = Table::new(
            "assignments",
            vec![varchar("employee"), varchar("skill"), varchar("language")],
        );
        table.data = vec![
            row(&[("employee", "ann"), ("skill", "sql"), ("language", "en")]),
            row(&[("employee", "ann"), ("skill", "sql"), ("language", "fr")]),
            row(&[("employee", "ann"), ("skill", "rust"), ("language", "en")]),
            row(&[("employee", "ann"), ("skill", "rust"), ("language", "fr")]),
        ];
        table.candidate_keys = vec![column_set(["employee", "skill", "language"])];
        table.multi_valued_dependencies = vec![
            MultiValuedDependency::new(column_set(["employee"]), column_set(["skill"]), 1.0),
            MultiValuedDependency::new(column_set(["employee"]), column_set(["language"]), 1.0),
        ];

        let result = analyze_table(table, &AnalysisConfig::default()).expect("valid table");
        let fourth = &result.steps[0];
        assert_eq!(fourth.to_nf, NormalForm::Fourth);
        assert_eq!(fourth.violations.len(), 2);
        assert_eq!(
            fourth.violations[1].affected_columns,
            column_set(["employee", "language"])
        );
        assert_eq!(
            fourth.violations[1].resolution,
            "Resolved by the projection into 'assignments_skill'."
        );
        assert_eq!(result.final_tables.len(), 2);
        assert!(result.steps[1].is_compliant());
    }

    #[test]
    fn invalid_tables_are_rejected() {
        let table = Table::new("t", vec![varchar("a"), varchar("a")]);
        assert!(matches!(
            NormalizationEngine::new(table, &AnalysisConfig::default()),
            Err(TableError::DuplicateColumn { .. })
        ));
    }
}
