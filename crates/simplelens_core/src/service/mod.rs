//! Lens session services.
//!
//! # Responsibility
//! - Orchestrate batch reconciliation, placement and redraw for one lens.
//! - Keep host/FFI layers decoupled from the reconciliation internals.

pub mod lens_service;

pub use lens_service::{BatchReport, LensService, NullPresenter, Presenter, RedrawFrame};
