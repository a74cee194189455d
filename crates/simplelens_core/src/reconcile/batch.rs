//! Batch decoding and in-order batch application.
//!
//! # Invariants
//! - Records apply in delivery order on the live collection.
//! - A refused record never stops the records after it; it is reported in
//!   `BatchApplied::failures` with its index.
//! - Decoding fails loudly on the first malformed record, before anything is
//!   applied.

use crate::collection::SubjectCollection;
use crate::model::change::ChangeRecord;
use crate::reconcile::error::ReconcileError;
use crate::reconcile::handler::{ApplyOutcome, Reconciler};
use log::{debug, error};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure of one batch, with the offending record position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    /// 0-based record index; `None` when the batch itself is malformed.
    pub index: Option<usize>,
    pub error: ReconcileError,
}

impl BatchError {
    fn at(index: usize, error: ReconcileError) -> Self {
        Self {
            index: Some(index),
            error,
        }
    }

    fn malformed(reason: impl Into<String>) -> Self {
        Self {
            index: None,
            error: ReconcileError::InvalidEvent {
                reason: reason.into(),
            },
        }
    }
}

impl Display for BatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(index) => write!(f, "change #{index}: {}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl Error for BatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

impl Serialize for BatchError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BatchError", 3)?;
        state.serialize_field("index", &self.index)?;
        state.serialize_field("errorCode", self.error.code())?;
        state.serialize_field("message", &self.error.to_string())?;
        state.end()
    }
}

/// What a decoded batch did to the collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BatchApplied {
    /// One entry per record, in delivery order.
    pub outcomes: Vec<ApplyOutcome>,
    /// Records the engine refused, in delivery order.
    pub failures: Vec<BatchError>,
}

impl BatchApplied {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Decodes a JSON batch (`[{"sample.add": {...}}, ...]`).
pub fn parse_batch(json: &str) -> Result<Vec<ChangeRecord>, BatchError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|err| BatchError::malformed(format!("batch is not valid JSON: {err}")))?;
    parse_batch_value(value)
}

/// Decodes an already parsed batch value.
pub fn parse_batch_value(value: Value) -> Result<Vec<ChangeRecord>, BatchError> {
    let Value::Array(items) = value else {
        return Err(BatchError::malformed("batch must be a JSON array"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<ChangeRecord>(item).map_err(|err| {
                BatchError::at(
                    index,
                    ReconcileError::InvalidEvent {
                        reason: err.to_string(),
                    },
                )
            })
        })
        .collect()
}

impl Reconciler {
    /// Applies `records` in order on the live collection.
    ///
    /// A record that fails (`InvariantViolation`, or `NotFound` /
    /// `DuplicateKey` under the strict settings) leaves the collection as that
    /// record found it and is recorded as `ApplyOutcome::Failed`; the records
    /// after it still apply.
    pub fn apply_batch(
        &self,
        records: Vec<ChangeRecord>,
        subjects: &mut SubjectCollection,
    ) -> BatchApplied {
        let mut applied = BatchApplied {
            outcomes: Vec::with_capacity(records.len()),
            failures: Vec::new(),
        };

        for (index, record) in records.into_iter().enumerate() {
            let event_key = record.event_key();
            match self.apply(record, subjects) {
                Ok(outcome) => {
                    debug!(
                        "event=change_applied module=reconcile status=ok index={} kind={}",
                        index, event_key
                    );
                    applied.outcomes.push(outcome);
                }
                Err(err) => {
                    error!(
                        "event=change_applied module=reconcile status=error index={} kind={} error_code={} error={}",
                        index,
                        event_key,
                        err.code(),
                        err
                    );
                    applied.outcomes.push(ApplyOutcome::Failed {
                        error_code: err.code(),
                    });
                    applied.failures.push(BatchError::at(index, err));
                }
            }
        }

        applied
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_batch, BatchError};
    use crate::reconcile::error::ReconcileError;

    #[test]
    fn parse_reports_index_of_bad_record() {
        let err = parse_batch(
            r#"[{"subject.add": {"id": "x", "absolutePath": "Fellowship"}}, {"sample.explode": {}}]"#,
        )
        .unwrap_err();
        assert_eq!(err.index, Some(1));
        assert!(matches!(err.error, ReconcileError::InvalidEvent { .. }));
    }

    #[test]
    fn parse_rejects_non_array_batch() {
        let err: BatchError = parse_batch(r#"{"sample.add": {"name": "a|b"}}"#).unwrap_err();
        assert_eq!(err.index, None);
        assert!(err.to_string().contains("JSON array"));
    }

    #[test]
    fn record_failure_serializes_code_and_message() {
        let err = parse_batch(r#"[{"sample.add": {}}]"#).unwrap_err();
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["index"], 0);
        assert_eq!(value["errorCode"], "invalid_event");
        assert!(value["message"].as_str().unwrap().contains("invalid"));
    }

    #[test]
    fn parse_accepts_empty_batch() {
        assert!(parse_batch("[]").unwrap().is_empty());
    }
}
