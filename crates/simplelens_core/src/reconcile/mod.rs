//! Realtime reconciliation engine.
//!
//! # Responsibility
//! - Apply subject/sample add, remove and update events to a
//!   `SubjectCollection` as pure in-memory mutations.
//! - Apply whole batches in delivery order, reporting refused records
//!   without dropping the rest of the batch.
//!
//! # Invariants
//! - No I/O and no rendering happen here.
//! - Lookups that find nothing are benign skips unless strict lookups are
//!   configured; an update of a missing sample on a known subject is always
//!   an error.
//! - Updates never change a subject's position in the collection.

pub mod batch;
pub mod error;
pub mod handler;

pub use batch::{parse_batch, parse_batch_value, BatchApplied, BatchError};
pub use error::{ReconcileError, ReconcileResult};
pub use handler::{ApplyOutcome, DuplicatePolicy, Reconciler, SkipReason};
