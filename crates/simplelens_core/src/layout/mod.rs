//! Static grid layout and entity-to-cell lookup.
//!
//! # Responsibility
//! - Hold the two reference datasets loaded at lens startup.
//! - Translate subjects and samples into grid coordinates.
//!
//! # Invariants
//! - Reference datasets are read-only after load.
//! - "Not found" is a sentinel position, never an error.

pub mod grid;

pub use grid::{CellRef, GridIndex, GridLayout, LayoutError, Placement, SubjectDescriptor};
