//! Plain-text reports for the command line.
//!
//! Everything funnels through [`render_table`], an aligned column renderer
//! that pads cells to the widest value and flattens embedded line breaks.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{
    analysis::{AnalysisResult, AnalysisSummary},
    dependency::DependencySet,
    model::{Table, format_set},
};

const SAMPLE_PREVIEW_VALUES: usize = 3;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator_cells, &separator_widths));

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }

    output
}

/// Inferred column definitions of a table.
pub fn columns_report(table: &Table) -> String {
    let headers = headers(&["column", "type", "nullable", "unique", "sample"]);
    let rows = table
        .columns
        .iter()
        .map(|column| {
            vec![
                column.name.clone(),
                column.data_type.to_string(),
                yes_no(column.nullable),
                yes_no(column.unique),
                column
                    .sample_values
                    .iter()
                    .take(SAMPLE_PREVIEW_VALUES)
                    .map(|v| v.as_display())
                    .collect::<Vec<_>>()
                    .join(", "),
            ]
        })
        .collect::<Vec<_>>();
    let mut output = format!(
        "Table '{}': {} column(s), {} sampled row(s)\n",
        table.name,
        table.columns.len(),
        table.row_count()
    );
    output.push_str(&render_table(&headers, &rows));
    output
}

pub fn dependencies_report(dependencies: &DependencySet) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Functional dependencies ({}):",
        dependencies.functional.len()
    );
    if dependencies.functional.is_empty() {
        output.push_str("  none\n");
    }
    for fd in &dependencies.functional {
        let _ = writeln!(output, "  {fd}");
    }

    let _ = writeln!(
        output,
        "Multi-valued dependencies ({}):",
        dependencies.multi_valued.len()
    );
    if dependencies.multi_valued.is_empty() {
        output.push_str("  none\n");
    }
    for mvd in &dependencies.multi_valued {
        let _ = writeln!(output, "  {mvd}");
    }

    let _ = writeln!(
        output,
        "Candidate keys ({}):",
        dependencies.candidate_keys.len()
    );
    if dependencies.candidate_keys.is_empty() {
        output.push_str("  none\n");
    }
    for key in &dependencies.candidate_keys {
        let _ = writeln!(output, "  {}", format_set(key));
    }
    if !dependencies.primary_key.is_empty() {
        let _ = writeln!(output, "Primary key: {}", format_set(&dependencies.primary_key));
    }
    output
}

pub fn summary_report(summary: &AnalysisSummary) -> String {
    let mut output = String::new();
    if let Some(id) = &summary.analysis_id {
        let _ = writeln!(output, "Analysis {id}");
    }
    let _ = writeln!(
        output,
        "Table '{}': {} -> {} (target {})",
        summary.original_table, summary.original_nf, summary.final_nf, summary.target_nf
    );
    let _ = writeln!(
        output,
        "{} step(s), {} violation(s), {} final table(s)",
        summary.steps_count, summary.violations_count, summary.tables_count
    );
    if summary.steps.is_empty() {
        return output;
    }

    output.push('\n');
    let headers = headers(&["step", "from", "to", "violations"]);
    let rows = summary
        .steps
        .iter()
        .enumerate()
        .map(|(idx, step)| {
            vec![
                (idx + 1).to_string(),
                step.from_nf.to_string(),
                step.to_nf.to_string(),
                step.violations.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    output.push_str(&render_table(&headers, &rows));
    output.push('\n');
    for (idx, step) in summary.steps.iter().enumerate() {
        let _ = writeln!(output, "{}. {}", idx + 1, step.explanation);
    }
    output
}

pub fn violations_report(result: &AnalysisResult) -> String {
    let headers = headers(&["form", "violation", "resolution"]);
    let rows = result
        .all_violations()
        .map(|violation| {
            vec![
                violation.normal_form.to_string(),
                violation.description.clone(),
                violation.resolution.clone(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

/// Schema view of the final tables: one block per table listing its
/// columns, key membership and references.
pub fn tables_report(tables: &[Table]) -> String {
    let mut output = String::new();
    for (idx, table) in tables.iter().enumerate() {
        if idx > 0 {
            output.push('\n');
        }
        let _ = writeln!(
            output,
            "{} (primary key {}, {} row(s))",
            table.name,
            format_set(&table.primary_key),
            table.row_count()
        );
        let headers = headers(&["column", "type", "key", "references"]);
        let rows = table
            .columns
            .iter()
            .map(|column| {
                vec![
                    column.name.clone(),
                    column.data_type.to_string(),
                    if table.primary_key.contains(&column.name) {
                        "PK".to_string()
                    } else {
                        String::new()
                    },
                    table
                        .foreign_keys
                        .get(&column.name)
                        .map(|fk| format!("{}.{}", fk.table, fk.column))
                        .unwrap_or_default(),
                ]
            })
            .collect::<Vec<_>>();
        output.push_str(&render_table(&headers, &rows));
    }
    output
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        if idx >= widths.len() {
            break;
        }
        let sanitized = sanitize_cell(value);
        let display = display_width(sanitized.as_ref());
        let mut cell = sanitized.into_owned();
        let padding = widths
            .get(idx)
            .copied()
            .unwrap_or_default()
            .saturating_sub(display);
        if padding > 0 {
            cell.push_str(&" ".repeat(padding));
        }
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_padded_to_widest_cell() {
        let rendered = render_table(
            &headers(&["a", "bb"]),
            &[
                vec!["long value".to_string(), "x".to_string()],
                vec!["s".to_string(), "y".to_string()],
            ],
        );
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "a           bb");
        assert_eq!(lines[1], "----------  ---");
        assert_eq!(lines[2], "long value  x");
        assert_eq!(lines[3], "s           y");
    }

    #[test]
    fn embedded_newlines_are_flattened() {
        let rendered = render_table(&headers(&["note"]), &[vec!["one\ntwo".to_string()]]);
        assert!(rendered.contains("one two"));
    }

    #[test]
    fn empty_dependency_set_reports_none() {
        let report = dependencies_report(&DependencySet::default());
        assert!(report.contains("Functional dependencies (0):\n  none"));
        assert!(!report.contains("Primary key"));
    }
}
