//! Relational model shared by every stage of the analysis.
//!
//! A [`Table`] is the unit of normalization: it owns its [`Column`]s, its
//! sampled rows, the dependencies inferred over them and the keys derived from
//! those dependencies. Decomposition moves columns and rows between tables; it
//! never shares them.

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    fmt,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{data::Value, rows::Row};

pub type ColumnSet = BTreeSet<String>;

pub fn column_set<I, S>(columns: I) -> ColumnSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    columns.into_iter().map(Into::into).collect()
}

pub(crate) fn format_set(set: &ColumnSet) -> String {
    let joined = set.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
    format!("{{{joined}}}")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    BigInteger,
    Decimal,
    Varchar { max_length: usize },
    Text,
    Date,
    DateTime,
    Boolean,
}

impl DataType {
    pub fn sql_name(&self) -> String {
        match self {
            DataType::Integer => "INT".to_string(),
            DataType::BigInteger => "BIGINT".to_string(),
            DataType::Decimal => "DECIMAL".to_string(),
            DataType::Varchar { max_length } => format!("VARCHAR({max_length})"),
            DataType::Text => "TEXT".to_string(),
            DataType::Date => "DATE".to_string(),
            DataType::DateTime => "DATETIME".to_string(),
            DataType::Boolean => "BOOLEAN".to_string(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            unique: false,
            sample_values: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

/// `determinant -> dependent` with a confidence in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionalDependency {
    pub determinant: ColumnSet,
    pub dependent: ColumnSet,
    pub confidence: f64,
}

impl FunctionalDependency {
    pub fn new(determinant: ColumnSet, dependent: ColumnSet, confidence: f64) -> Self {
        Self {
            determinant,
            dependent,
            confidence,
        }
    }

    pub fn is_trivial(&self) -> bool {
        self.dependent.is_subset(&self.determinant)
    }

    pub fn columns(&self) -> ColumnSet {
        self.determinant.union(&self.dependent).cloned().collect()
    }
}

impl fmt::Display for FunctionalDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} (confidence: {:.2})",
            format_set(&self.determinant),
            format_set(&self.dependent),
            self.confidence
        )
    }
}

/// `determinant ->> dependent`: the determinant fixes the set of values the
/// dependent may take, independently of the remaining attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiValuedDependency {
    pub determinant: ColumnSet,
    pub dependent: ColumnSet,
    pub confidence: f64,
}

impl MultiValuedDependency {
    pub fn new(determinant: ColumnSet, dependent: ColumnSet, confidence: f64) -> Self {
        Self {
            determinant,
            dependent,
            confidence,
        }
    }

    /// Trivial when the dependent lies inside the determinant or the two
    /// together span every column of the table.
    pub fn is_trivial(&self, all_columns: &ColumnSet) -> bool {
        if self.dependent.is_subset(&self.determinant) {
            return true;
        }
        let union: ColumnSet = self.determinant.union(&self.dependent).cloned().collect();
        &union == all_columns
    }

    pub fn columns(&self) -> ColumnSet {
        self.determinant.union(&self.dependent).cloned().collect()
    }
}

impl fmt::Display for MultiValuedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ->> {} (confidence: {:.2})",
            format_set(&self.determinant),
            format_set(&self.dependent),
            self.confidence
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Table '{table}' declares column '{column}' more than once")]
    DuplicateColumn { table: String, column: String },
    #[error("Table '{table}' has {kind} column '{column}' that is not a table column")]
    UnknownKeyColumn {
        table: String,
        kind: &'static str,
        column: String,
    },
    #[error("Table '{table}' has a foreign key on unknown column '{column}'")]
    UnknownForeignKeyColumn { table: String, column: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_key: ColumnSet,
    #[serde(default)]
    pub candidate_keys: Vec<ColumnSet>,
    #[serde(default)]
    pub foreign_keys: BTreeMap<String, ForeignKey>,
    #[serde(default)]
    pub functional_dependencies: Vec<FunctionalDependency>,
    #[serde(default)]
    pub multi_valued_dependencies: Vec<MultiValuedDependency>,
    #[serde(default)]
    pub data: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            ..Self::default()
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_name_set(&self) -> ColumnSet {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn is_superkey(&self, columns: &ColumnSet) -> bool {
        self.candidate_keys
            .iter()
            .any(|key| key.is_subset(columns))
    }

    pub fn is_key_attribute(&self, column: &str) -> bool {
        self.candidate_keys.iter().any(|key| key.contains(column))
    }

    /// Checks the structural invariants every stage relies on.
    pub fn validate(&self) -> Result<(), TableError> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        let keyed = std::iter::once(("primary key", &self.primary_key))
            .chain(self.candidate_keys.iter().map(|key| ("candidate key", key)));
        for (kind, key) in keyed {
            if let Some(missing) = key.iter().find(|c| !seen.contains(c.as_str())) {
                return Err(TableError::UnknownKeyColumn {
                    table: self.name.clone(),
                    kind,
                    column: missing.clone(),
                });
            }
        }
        if let Some(missing) = self
            .foreign_keys
            .keys()
            .find(|c| !seen.contains(c.as_str()))
        {
            return Err(TableError::UnknownForeignKeyColumn {
                table: self.name.clone(),
                column: missing.clone(),
            });
        }
        Ok(())
    }
}
