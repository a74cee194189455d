//! Core logic of the SimpleLens realtime grid.
//! This crate owns the subject/sample reconciliation invariants; rendering
//! stays with the host.

pub mod collection;
pub mod config;
pub mod highlight;
pub mod layout;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod service;

pub use collection::SubjectCollection;
pub use config::{ConfigError, LensConfig};
pub use highlight::HighlightBoard;
pub use layout::{CellRef, GridIndex, GridLayout, LayoutError, Placement, SubjectDescriptor};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::change::{Change, ChangeRecord, EntityKind};
pub use model::sample::{Sample, SampleName};
pub use model::subject::{Subject, SubjectId};
pub use reconcile::{
    parse_batch, parse_batch_value, ApplyOutcome, BatchApplied, BatchError, DuplicatePolicy,
    ReconcileError, ReconcileResult, Reconciler, SkipReason,
};
pub use service::{BatchReport, LensService, NullPresenter, Presenter, RedrawFrame};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
