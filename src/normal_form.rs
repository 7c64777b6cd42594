use std::{fmt, str::FromStr};

use anyhow::anyhow;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Normal forms in strictly increasing order of schema quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum NormalForm {
    Unnormalized,
    First,
    Second,
    Third,
    BoyceCodd,
    Fourth,
    #[default]
    Fifth,
}

impl NormalForm {
    pub const ALL: [NormalForm; 7] = [
        NormalForm::Unnormalized,
        NormalForm::First,
        NormalForm::Second,
        NormalForm::Third,
        NormalForm::BoyceCodd,
        NormalForm::Fourth,
        NormalForm::Fifth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NormalForm::Unnormalized => "Unnormalized",
            NormalForm::First => "1NF",
            NormalForm::Second => "2NF",
            NormalForm::Third => "3NF",
            NormalForm::BoyceCodd => "BCNF",
            NormalForm::Fourth => "4NF",
            NormalForm::Fifth => "5NF",
        }
    }

    /// Levels strictly above `self` up to and including `target`.
    pub fn levels_until(&self, target: NormalForm) -> Vec<NormalForm> {
        Self::ALL
            .iter()
            .copied()
            .filter(|nf| nf > self && *nf <= target)
            .collect()
    }
}

impl fmt::Display for NormalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NormalForm {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match normalized.as_str() {
            "unnormalized" | "0nf" | "unf" => Ok(NormalForm::Unnormalized),
            "1nf" | "first" => Ok(NormalForm::First),
            "2nf" | "second" => Ok(NormalForm::Second),
            "3nf" | "third" => Ok(NormalForm::Third),
            "bcnf" | "3.5nf" | "boycecodd" => Ok(NormalForm::BoyceCodd),
            "4nf" | "fourth" => Ok(NormalForm::Fourth),
            "5nf" | "fifth" | "pjnf" => Ok(NormalForm::Fifth),
            _ => Err(anyhow!(
                "Unknown normal form '{value}'. Supported forms: {}",
                Self::ALL
                    .iter()
                    .map(NormalForm::label)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

impl Serialize for NormalForm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for NormalForm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        NormalForm::from_str(&token).map_err(serde::de::Error::custom)
    }
}
