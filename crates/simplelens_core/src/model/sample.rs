//! Sample domain model.
//!
//! # Responsibility
//! - Define the sample record attached to one subject.
//! - Decode the owning subject path and aspect from the composite name.
//!
//! # Invariants
//! - `name` has the shape `<absolutePath>|<aspectName>`.
//! - The path component must equal the owning subject's `absolute_path`.
//! - Unknown fields round-trip untouched through `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// Separator between subject path and aspect name inside a sample name.
pub const NAME_SEPARATOR: char = '|';

/// Composite sample key, `<absolutePath>|<aspectName>`.
///
/// The upstream event stream carries no separate subject reference on a
/// sample, so ownership is always decoded from this string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleName(String);

impl SampleName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds a name from its two components.
    pub fn compose(subject_path: &str, aspect_name: &str) -> Self {
        Self(format!("{subject_path}{NAME_SEPARATOR}{aspect_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substring before the first separator, or the whole name when the
    /// separator is absent.
    pub fn subject_path(&self) -> &str {
        match self.0.split_once(NAME_SEPARATOR) {
            Some((path, _)) => path,
            None => &self.0,
        }
    }

    /// Substring after the first separator.
    ///
    /// Returns `None` when the name carries no separator at all.
    pub fn aspect_name(&self) -> Option<&str> {
        self.0.split_once(NAME_SEPARATOR).map(|(_, aspect)| aspect)
    }

    /// Returns this name re-homed under another subject path.
    ///
    /// The aspect component is kept; a name without aspect becomes the bare
    /// new path.
    pub fn with_subject_path(&self, subject_path: &str) -> Self {
        match self.aspect_name() {
            Some(aspect) => Self::compose(subject_path, aspect),
            None => Self::new(subject_path),
        }
    }
}

impl Display for SampleName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SampleName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SampleName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One measurement cell of the grid.
///
/// `status` is an opaque, enum-like string (`OK`, `Critical`, ...). Remove
/// events may carry only the name, so it is optional on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub name: SampleName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Pass-through fields (value, updatedAt, messageBody, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Sample {
    /// Creates a sample with no status and no pass-through fields.
    pub fn new(name: impl Into<SampleName>) -> Self {
        Self {
            name: name.into(),
            status: None,
            extra: Map::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Path of the subject this sample belongs to.
    pub fn subject_path(&self) -> &str {
        self.name.subject_path()
    }

    /// Aspect (grid column) this sample measures.
    pub fn aspect_name(&self) -> Option<&str> {
        self.name.aspect_name()
    }
}
