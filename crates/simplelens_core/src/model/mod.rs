//! Domain model for the lens grid.
//!
//! # Responsibility
//! - Define the subject and sample records streamed in by the host.
//! - Define the change records a realtime batch is made of.
//!
//! # Invariants
//! - Every subject is identified by a stable `SubjectId`.
//! - A sample name encodes its owning subject path and its aspect.
//! - Fields the lens does not interpret are carried through untouched.

pub mod change;
pub mod sample;
pub mod subject;
