//! Audit trail produced by the decomposition engine.

use serde::{Deserialize, Serialize};

use crate::{
    dependency::DependencySet,
    model::{ColumnSet, Table},
    normal_form::NormalForm,
    store::AnalysisId,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Violation {
    pub normal_form: NormalForm,
    pub description: String,
    pub affected_columns: ColumnSet,
    pub explanation: String,
    pub resolution: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizationStep {
    pub from_nf: NormalForm,
    pub to_nf: NormalForm,
    pub violations: Vec<Violation>,
    /// Working set of tables as it stood once the step completed.
    pub tables: Vec<Table>,
    pub explanation: String,
}

impl NormalizationStep {
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Complete outcome of one analysis. Owns the untouched source table, every
/// step and the final decomposition by value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub original_table: Table,
    pub dependencies: DependencySet,
    pub current_normal_form: NormalForm,
    pub target_normal_form: NormalForm,
    pub steps: Vec<NormalizationStep>,
    pub final_tables: Vec<Table>,
}

impl AnalysisResult {
    pub fn all_violations(&self) -> impl Iterator<Item = &Violation> {
        self.steps.iter().flat_map(|step| step.violations.iter())
    }

    pub fn violation_count(&self) -> usize {
        self.steps.iter().map(|step| step.violations.len()).sum()
    }

    pub fn final_normal_form(&self) -> NormalForm {
        self.steps
            .last()
            .map(|step| step.to_nf)
            .unwrap_or(self.current_normal_form)
    }

    pub fn is_fully_normalized(&self) -> bool {
        self.final_normal_form() >= self.target_normal_form
    }

    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            analysis_id: None,
            original_table: self.original_table.name.clone(),
            original_nf: self.current_normal_form,
            target_nf: self.target_normal_form,
            final_nf: self.final_normal_form(),
            steps_count: self.steps.len(),
            tables_count: self.final_tables.len(),
            violations_count: self.violation_count(),
            steps: self
                .steps
                .iter()
                .map(|step| StepSummary {
                    from_nf: step.from_nf,
                    to_nf: step.to_nf,
                    violations: step.violations.len(),
                    explanation: step.explanation.clone(),
                })
                .collect(),
        }
    }
}

/// Flat, lossless view of an [`AnalysisResult`] for report renderers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<AnalysisId>,
    pub original_table: String,
    pub original_nf: NormalForm,
    pub target_nf: NormalForm,
    pub final_nf: NormalForm,
    pub steps_count: usize,
    pub tables_count: usize,
    pub violations_count: usize,
    pub steps: Vec<StepSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepSummary {
    pub from_nf: NormalForm,
    pub to_nf: NormalForm,
    pub violations: usize,
    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(from: NormalForm, to: NormalForm, violations: usize) -> NormalizationStep {
        NormalizationStep {
            from_nf: from,
            to_nf: to,
            violations: (0..violations)
                .map(|idx| Violation {
                    normal_form: to,
                    description: format!("violation {idx}"),
                    affected_columns: ColumnSet::new(),
                    explanation: String::new(),
                    resolution: String::new(),
                })
                .collect(),
            tables: Vec::new(),
            explanation: format!("{from} to {to}"),
        }
    }

    fn result(steps: Vec<NormalizationStep>) -> AnalysisResult {
        AnalysisResult {
            original_table: Table::new("orders", Vec::new()),
            dependencies: DependencySet::default(),
            current_normal_form: NormalForm::Second,
            target_normal_form: NormalForm::Fifth,
            steps,
            final_tables: vec![Table::new("orders", Vec::new())],
        }
    }

    #[test]
    fn final_form_falls_back_to_starting_form() {
        let r = result(Vec::new());
        assert_eq!(r.final_normal_form(), NormalForm::Second);
        assert!(!r.is_fully_normalized());
    }

    #[test]
    fn summary_counts_every_violation() {
        let r = result(vec![
            step(NormalForm::Second, NormalForm::Third, 2),
            step(NormalForm::Third, NormalForm::BoyceCodd, 1),
            step(NormalForm::BoyceCodd, NormalForm::Fourth, 0),
            step(NormalForm::Fourth, NormalForm::Fifth, 0),
        ]);
        let summary = r.summary();
        assert_eq!(summary.violations_count, 3);
        assert_eq!(summary.steps_count, 4);
        assert_eq!(summary.final_nf, NormalForm::Fifth);
        assert_eq!(summary.steps[0].explanation, "2NF to 3NF");
        assert!(r.is_fully_normalized());
        assert_eq!(r.all_violations().count(), 3);
    }
}
