//! Per-event reconciliation handlers.
//!
//! # Responsibility
//! - Implement the six `<entity>.<event>` handlers over `SubjectCollection`.
//! - Report what each handler did through `ApplyOutcome`.
//!
//! # Invariants
//! - Subject identity is the `SubjectId` key, never object identity.
//! - Sample ownership is decoded from the sample name path component.
//! - Duplicate adds are always observable; `DuplicatePolicy` decides the
//!   effect.

use crate::collection::SubjectCollection;
use crate::model::change::{Change, ChangeRecord, EntityKind};
use crate::model::sample::Sample;
use crate::model::subject::Subject;
use crate::reconcile::error::{ReconcileError, ReconcileResult};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

/// What to do when an add targets a key that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Replace the present entry in place (idempotent re-send).
    #[default]
    Upsert,
    /// Keep the present entry and drop the add.
    Ignore,
    /// Fail with `ReconcileError::DuplicateKey`.
    Reject,
}

/// Why a handler left the collection untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    SubjectNotFound,
    SampleNotFound,
}

/// Result of applying one change record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// New subject appended, or new sample appended to its subject.
    Inserted,
    /// Duplicate add replaced the present entry in place.
    Upserted,
    /// Duplicate add dropped by `DuplicatePolicy::Ignore`.
    DuplicateIgnored,
    /// Present entry replaced by an update record.
    Updated,
    /// Entries removed; sample removal drops every sample with the name.
    Removed { count: usize },
    Skipped { reason: SkipReason },
    /// Record refused by the engine; the error is reported with the batch.
    Failed { error_code: &'static str },
}

impl ApplyOutcome {
    /// Whether the collection changed.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::DuplicateIgnored | Self::Skipped { .. } | Self::Failed { .. }
        )
    }
}

/// Applies realtime change records to a subject collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciler {
    duplicate_policy: DuplicatePolicy,
    strict_lookups: bool,
}

impl Reconciler {
    pub fn new(duplicate_policy: DuplicatePolicy, strict_lookups: bool) -> Self {
        Self {
            duplicate_policy,
            strict_lookups,
        }
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    pub fn strict_lookups(&self) -> bool {
        self.strict_lookups
    }

    /// Dispatches one record to its handler.
    pub fn apply(
        &self,
        record: ChangeRecord,
        subjects: &mut SubjectCollection,
    ) -> ReconcileResult<ApplyOutcome> {
        match record {
            ChangeRecord::SampleAdd(sample) => self.add_sample(sample, subjects),
            ChangeRecord::SampleRemove(sample) => self.remove_sample(&sample, subjects),
            ChangeRecord::SampleUpdate(change) => self.update_sample(change, subjects),
            ChangeRecord::SubjectAdd(subject) => self.add_subject(subject, subjects),
            ChangeRecord::SubjectRemove(subject) => self.remove_subject(&subject, subjects),
            ChangeRecord::SubjectUpdate(change) => self.update_subject(change, subjects),
        }
    }

    /// Inserts a subject.
    ///
    /// A fresh subject keeps the samples its snapshot carries. A present id
    /// is handled by the duplicate policy; `Upsert` takes the new attributes
    /// and keeps the present samples and position.
    pub fn add_subject(
        &self,
        subject: Subject,
        subjects: &mut SubjectCollection,
    ) -> ReconcileResult<ApplyOutcome> {
        if !subjects.contains(&subject.id) {
            debug!(
                "event=subject_add module=reconcile status=ok subject_id={}",
                subject.id
            );
            subjects.insert(subject);
            return Ok(ApplyOutcome::Inserted);
        }

        warn!(
            "event=subject_add module=reconcile status=duplicate subject_id={} policy={:?}",
            subject.id, self.duplicate_policy
        );
        match self.duplicate_policy {
            DuplicatePolicy::Upsert => {
                replace_keeping_samples(subject, subjects);
                Ok(ApplyOutcome::Upserted)
            }
            DuplicatePolicy::Ignore => Ok(ApplyOutcome::DuplicateIgnored),
            DuplicatePolicy::Reject => Err(ReconcileError::DuplicateKey {
                entity: EntityKind::Subject,
                key: subject.id.to_string(),
            }),
        }
    }

    /// Removes the subject sharing `subject.id`.
    pub fn remove_subject(
        &self,
        subject: &Subject,
        subjects: &mut SubjectCollection,
    ) -> ReconcileResult<ApplyOutcome> {
        match subjects.remove(&subject.id) {
            Some(_) => {
                debug!(
                    "event=subject_remove module=reconcile status=ok subject_id={}",
                    subject.id
                );
                Ok(ApplyOutcome::Removed { count: 1 })
            }
            None => self.skip(
                EntityKind::Subject,
                subject.id.as_str(),
                SkipReason::SubjectNotFound,
            ),
        }
    }

    /// Replaces a subject snapshot, keeping its present samples.
    ///
    /// The samples carried by `change.new` are discarded. A snapshot whose id
    /// is unknown is appended with an empty sample list.
    pub fn update_subject(
        &self,
        change: Change<Subject>,
        subjects: &mut SubjectCollection,
    ) -> ReconcileResult<ApplyOutcome> {
        let mut snapshot = change.new;
        if subjects.contains(&snapshot.id) {
            debug!(
                "event=subject_update module=reconcile status=ok subject_id={}",
                snapshot.id
            );
            replace_keeping_samples(snapshot, subjects);
            return Ok(ApplyOutcome::Updated);
        }

        warn!(
            "event=subject_update module=reconcile status=inserted subject_id={} reason=unknown_id",
            snapshot.id
        );
        snapshot.samples.clear();
        subjects.insert(snapshot);
        Ok(ApplyOutcome::Inserted)
    }

    /// Appends a sample to the subject its name points at.
    pub fn add_sample(
        &self,
        sample: Sample,
        subjects: &mut SubjectCollection,
    ) -> ReconcileResult<ApplyOutcome> {
        let Some(subject) = subjects.find_by_path_mut(sample.subject_path()) else {
            return self.skip(
                EntityKind::Sample,
                sample.name.as_str(),
                SkipReason::SubjectNotFound,
            );
        };

        let Some(position) = subject.sample_position(&sample.name) else {
            debug!(
                "event=sample_add module=reconcile status=ok sample={}",
                sample.name
            );
            subject.samples.push(sample);
            return Ok(ApplyOutcome::Inserted);
        };

        warn!(
            "event=sample_add module=reconcile status=duplicate sample={} policy={:?}",
            sample.name, self.duplicate_policy
        );
        match self.duplicate_policy {
            DuplicatePolicy::Upsert => {
                subject.samples[position] = sample;
                Ok(ApplyOutcome::Upserted)
            }
            DuplicatePolicy::Ignore => Ok(ApplyOutcome::DuplicateIgnored),
            DuplicatePolicy::Reject => Err(ReconcileError::DuplicateKey {
                entity: EntityKind::Sample,
                key: sample.name.to_string(),
            }),
        }
    }

    /// Removes every sample named like `sample` from its subject.
    pub fn remove_sample(
        &self,
        sample: &Sample,
        subjects: &mut SubjectCollection,
    ) -> ReconcileResult<ApplyOutcome> {
        let Some(subject) = subjects.find_by_path_mut(sample.subject_path()) else {
            return self.skip(
                EntityKind::Sample,
                sample.name.as_str(),
                SkipReason::SubjectNotFound,
            );
        };

        let before = subject.samples.len();
        subject.samples.retain(|present| present.name != sample.name);
        let count = before - subject.samples.len();
        if count == 0 {
            return self.skip(
                EntityKind::Sample,
                sample.name.as_str(),
                SkipReason::SampleNotFound,
            );
        }

        debug!(
            "event=sample_remove module=reconcile status=ok sample={} count={}",
            sample.name, count
        );
        Ok(ApplyOutcome::Removed { count })
    }

    /// Overwrites the slot of the sample named like `change.new`.
    ///
    /// # Errors
    /// - `InvariantViolation` when the subject exists but holds no sample
    ///   with that name.
    pub fn update_sample(
        &self,
        change: Change<Sample>,
        subjects: &mut SubjectCollection,
    ) -> ReconcileResult<ApplyOutcome> {
        let sample = change.new;
        let Some(subject) = subjects.find_by_path_mut(sample.subject_path()) else {
            return self.skip(
                EntityKind::Sample,
                sample.name.as_str(),
                SkipReason::SubjectNotFound,
            );
        };

        let Some(position) = subject.sample_position(&sample.name) else {
            error!(
                "event=sample_update module=reconcile status=error error_code=invariant_violation subject={} sample={}",
                subject.absolute_path, sample.name
            );
            return Err(ReconcileError::InvariantViolation {
                subject_path: subject.absolute_path.clone(),
                sample_name: sample.name,
            });
        };

        debug!(
            "event=sample_update module=reconcile status=ok sample={} position={}",
            sample.name, position
        );
        subject.samples[position] = sample;
        Ok(ApplyOutcome::Updated)
    }

    fn skip(
        &self,
        entity: EntityKind,
        key: &str,
        reason: SkipReason,
    ) -> ReconcileResult<ApplyOutcome> {
        if self.strict_lookups {
            return Err(ReconcileError::NotFound {
                entity,
                key: key.to_string(),
            });
        }
        debug!(
            "event=change_skipped module=reconcile status=skip entity={} key={} reason={:?}",
            entity, key, reason
        );
        Ok(ApplyOutcome::Skipped { reason })
    }
}

/// Swaps in `snapshot` at its id's slot, carrying the present samples over.
///
/// Samples are re-homed when the snapshot moved to another path. Caller
/// guarantees the id is present.
fn replace_keeping_samples(mut snapshot: Subject, subjects: &mut SubjectCollection) {
    let Some(present) = subjects.get_mut(&snapshot.id) else {
        return;
    };
    snapshot.samples = std::mem::take(&mut present.samples);
    let previous_path = std::mem::take(&mut present.absolute_path);
    let rebased = snapshot.rebase_samples(&previous_path);
    if rebased > 0 {
        debug!(
            "event=samples_rebased module=reconcile status=ok subject_id={} from={} to={} count={}",
            snapshot.id, previous_path, snapshot.absolute_path, rebased
        );
    }
    *present = snapshot;
}
