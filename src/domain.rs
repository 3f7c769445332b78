use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::PhytoError;

/// A trimmed, non-empty plant name as typed by the user (e.g. `Ocimum sanctum`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlantName(String);

impl PlantName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlantName {
    type Err = PhytoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = collapse_whitespace(value);
        if normalized.is_empty() {
            return Err(PhytoError::InvalidPlantName(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Where 3D structure files come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Resolve the compound name to a PubChem CID, then download its 3D SDF.
    Pubchem,
    /// Download the 3D SDF for the row's IMPPAT identifier.
    Imppat,
}

impl Provider {
    pub fn file_extension(self) -> &'static str {
        "sdf"
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Pubchem => write!(f, "pubchem"),
            Provider::Imppat => write!(f, "imppat"),
        }
    }
}

impl FromStr for Provider {
    type Err = PhytoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pubchem" => Ok(Provider::Pubchem),
            "imppat" => Ok(Provider::Imppat),
            _ => Err(PhytoError::InvalidProvider(value.to_string())),
        }
    }
}

/// One row of the phytochemical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompoundRecord {
    pub name: String,
    pub identifier: Option<String>,
    /// Every source column in table order, including name and identifier.
    pub fields: Vec<(String, String)>,
}

impl CompoundRecord {
    pub fn field(&self, column: &str) -> Option<&str> {
        let wanted = column_key(column);
        self.fields
            .iter()
            .find(|(key, _)| column_key(key) == wanted)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompoundTable {
    pub columns: Vec<String>,
    pub records: Vec<CompoundRecord>,
}

impl CompoundTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        let wanted = column_key(column);
        self.columns.iter().position(|c| column_key(c) == wanted)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Succeeded,
    /// The structure file was already in the workspace.
    #[serde(rename = "skipped-already-present")]
    Skipped,
    Failed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Succeeded => write!(f, "succeeded"),
            OutcomeStatus::Skipped => write!(f, "skipped-already-present"),
            OutcomeStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadOutcome {
    pub key: String,
    pub status: OutcomeStatus,
    pub reason: Option<String>,
    pub path: Option<String>,
}

impl DownloadOutcome {
    pub fn succeeded(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: OutcomeStatus::Succeeded,
            reason: None,
            path: Some(path.into()),
        }
    }

    pub fn skipped(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: OutcomeStatus::Skipped,
            reason: Some("already present".to_string()),
            path: Some(path.into()),
        }
    }

    pub fn failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: OutcomeStatus::Failed,
            reason: Some(reason.into()),
            path: None,
        }
    }
}

/// Canonical column name: trimmed with inner whitespace runs collapsed.
pub fn normalize_column(name: &str) -> String {
    collapse_whitespace(name)
}

fn column_key(name: &str) -> String {
    collapse_whitespace(name).to_lowercase()
}

pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
