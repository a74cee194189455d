//! Reconciliation error taxonomy.

use crate::model::change::EntityKind;
use crate::model::sample::SampleName;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors raised while applying realtime changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Target entity is absent. Only raised with strict lookups.
    NotFound { entity: EntityKind, key: String },
    /// Add of an already present key under `DuplicatePolicy::Reject`.
    DuplicateKey { entity: EntityKind, key: String },
    /// Change record violates the host stream contract.
    InvalidEvent { reason: String },
    /// Sample update addressed a known subject lacking that sample.
    InvariantViolation {
        subject_path: String,
        sample_name: SampleName,
    },
}

impl ReconcileError {
    /// Stable machine-readable code for logs and host envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::DuplicateKey { .. } => "duplicate_key",
            Self::InvalidEvent { .. } => "invalid_event",
            Self::InvariantViolation { .. } => "invariant_violation",
        }
    }
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::DuplicateKey { entity, key } => {
                write!(f, "{entity} already present: {key}")
            }
            Self::InvalidEvent { reason } => write!(f, "invalid change record: {reason}"),
            Self::InvariantViolation {
                subject_path,
                sample_name,
            } => write!(
                f,
                "sample `{sample_name}` cannot be updated: subject `{subject_path}` has no such sample"
            ),
        }
    }
}

impl Error for ReconcileError {}
