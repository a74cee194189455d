//! Realtime change records.
//!
//! # Responsibility
//! - Decode one host change record into a typed event.
//! - Name the event keys of the realtime stream.
//!
//! # Invariants
//! - A record is a single-key object; the key selects the event kind.
//! - Update records must carry `new`; `old` is accepted and ignored.

use crate::model::sample::Sample;
use crate::model::subject::Subject;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const SAMPLE_ADD: &str = "sample.add";
pub const SAMPLE_REMOVE: &str = "sample.remove";
pub const SAMPLE_UPDATE: &str = "sample.update";
pub const SUBJECT_ADD: &str = "subject.add";
pub const SUBJECT_REMOVE: &str = "subject.remove";
pub const SUBJECT_UPDATE: &str = "subject.update";

/// Entity kinds the stream talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Subject,
    Sample,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subject => f.write_str("subject"),
            Self::Sample => f.write_str("sample"),
        }
    }
}

/// `{ old, new }` payload of an update record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<T>,
    pub new: T,
}

impl<T> Change<T> {
    /// Update payload carrying only the replacement snapshot.
    pub fn to(new: T) -> Self {
        Self { old: None, new }
    }
}

/// One entry of a realtime change batch.
///
/// Uses serde's externally tagged shape, which is exactly the
/// `{ "<entity>.<event>": payload }` object the host delivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChangeRecord {
    #[serde(rename = "sample.add")]
    SampleAdd(Sample),
    #[serde(rename = "sample.remove")]
    SampleRemove(Sample),
    #[serde(rename = "sample.update")]
    SampleUpdate(Change<Sample>),
    #[serde(rename = "subject.add")]
    SubjectAdd(Subject),
    #[serde(rename = "subject.remove")]
    SubjectRemove(Subject),
    #[serde(rename = "subject.update")]
    SubjectUpdate(Change<Subject>),
}

impl ChangeRecord {
    /// Wire key of this record, e.g. `sample.add`.
    pub fn event_key(&self) -> &'static str {
        match self {
            Self::SampleAdd(_) => SAMPLE_ADD,
            Self::SampleRemove(_) => SAMPLE_REMOVE,
            Self::SampleUpdate(_) => SAMPLE_UPDATE,
            Self::SubjectAdd(_) => SUBJECT_ADD,
            Self::SubjectRemove(_) => SUBJECT_REMOVE,
            Self::SubjectUpdate(_) => SUBJECT_UPDATE,
        }
    }

    pub fn entity(&self) -> EntityKind {
        match self {
            Self::SampleAdd(_) | Self::SampleRemove(_) | Self::SampleUpdate(_) => {
                EntityKind::Sample
            }
            Self::SubjectAdd(_) | Self::SubjectRemove(_) | Self::SubjectUpdate(_) => {
                EntityKind::Subject
            }
        }
    }

    /// Key used in diagnostics: sample name or subject id.
    pub fn target_key(&self) -> &str {
        match self {
            Self::SampleAdd(sample) | Self::SampleRemove(sample) => sample.name.as_str(),
            Self::SampleUpdate(change) => change.new.name.as_str(),
            Self::SubjectAdd(subject) | Self::SubjectRemove(subject) => subject.id.as_str(),
            Self::SubjectUpdate(change) => change.new.id.as_str(),
        }
    }
}
