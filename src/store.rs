//! Host-owned registry of completed analyses.

use std::{collections::HashMap, fmt, str::FromStr};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{AnalysisResult, AnalysisSummary};

/// Opaque identifier handed out by [`AnalysisStore::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(Uuid);

impl AnalysisId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AnalysisId {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(value.trim())
            .with_context(|| format!("Invalid analysis id '{value}'"))?;
        Ok(Self(uuid))
    }
}

#[derive(Debug, Default)]
pub struct AnalysisStore {
    results: HashMap<AnalysisId, AnalysisResult>,
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, result: AnalysisResult) -> AnalysisId {
        let id = AnalysisId::new();
        self.results.insert(id, result);
        id
    }

    pub fn get(&self, id: &AnalysisId) -> Option<&AnalysisResult> {
        self.results.get(id)
    }

    pub fn summary(&self, id: &AnalysisId) -> Option<AnalysisSummary> {
        self.get(id).map(|result| AnalysisSummary {
            analysis_id: Some(*id),
            ..result.summary()
        })
    }

    pub fn remove(&mut self, id: &AnalysisId) -> Option<AnalysisResult> {
        self.results.remove(id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
