//! Subject domain model.
//!
//! # Responsibility
//! - Define the subject record (one grid row) and its ordered samples.
//! - Provide sample lookups used by the reconciliation engine.
//!
//! # Invariants
//! - `id` is stable for the subject lifetime and unique in a collection.
//! - `samples` holds at most one sample per name.
//! - Every sample's path component equals `absolute_path`.

use crate::model::sample::{Sample, SampleName};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// Opaque stable subject token assigned upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SubjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One grid row: a monitored subject with its current samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    /// External addressing key; sample names are prefixed with it.
    #[serde(rename = "absolutePath")]
    pub absolute_path: String,
    /// Missing or `null` on the wire decodes to an empty list.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub samples: Vec<Sample>,
    /// Pass-through fields (name, tags, childCount, parentId, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Subject {
    /// Creates a subject with no samples and no pass-through fields.
    pub fn new(id: impl Into<SubjectId>, absolute_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            absolute_path: absolute_path.into(),
            samples: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_samples(mut self, samples: Vec<Sample>) -> Self {
        self.samples = samples;
        self
    }

    /// Positional index of the first sample named `name`.
    pub fn sample_position(&self, name: &SampleName) -> Option<usize> {
        self.samples.iter().position(|sample| &sample.name == name)
    }

    pub fn sample(&self, name: &SampleName) -> Option<&Sample> {
        self.samples.iter().find(|sample| &sample.name == name)
    }

    /// Re-homes samples named under `previous_path` to the current
    /// `absolute_path`.
    ///
    /// Returns how many sample names were rewritten.
    pub fn rebase_samples(&mut self, previous_path: &str) -> usize {
        if previous_path == self.absolute_path {
            return 0;
        }
        let mut rewritten = 0;
        for sample in &mut self.samples {
            if sample.name.subject_path() == previous_path {
                sample.name = sample.name.with_subject_path(&self.absolute_path);
                rewritten += 1;
            }
        }
        rewritten
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Sample>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Sample>>::deserialize(deserializer)?.unwrap_or_default())
}
