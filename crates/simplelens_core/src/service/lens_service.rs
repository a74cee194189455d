//! Lens session service.
//!
//! # Responsibility
//! - Own the subject collection, layout, highlight board and presenter of
//!   one lens session.
//! - Apply realtime batches and drive exactly one redraw per batch.
//!
//! # Invariants
//! - Records of a batch apply in delivery order.
//! - Every non-empty decoded batch redraws exactly once, also when some of
//!   its records were refused; an empty or undecodable batch never redraws.
//! - The presenter only ever sees a fully reconciled collection.
//! - Time comes from the caller; the service never reads a clock.

use crate::collection::SubjectCollection;
use crate::config::LensConfig;
use crate::highlight::HighlightBoard;
use crate::layout::{CellRef, GridLayout};
use crate::model::change::ChangeRecord;
use crate::model::sample::SampleName;
use crate::reconcile::{parse_batch, ApplyOutcome, BatchError, Reconciler};
use log::{info, warn};
use serde::Serialize;

/// Redraw input handed to the presenter once per batch.
#[derive(Debug, Clone, Copy)]
pub struct RedrawFrame<'a> {
    pub subjects: &'a SubjectCollection,
    pub layout: &'a GridLayout,
    /// Cells of every placed sample; all are highlighted.
    pub highlighted: &'a [CellRef],
    /// Samples with no row or column in the layout.
    pub unplaced: &'a [SampleName],
    pub highlight_ms: u64,
}

/// Rendering surface implemented by the host.
pub trait Presenter {
    fn redraw(&mut self, frame: &RedrawFrame<'_>);
}

/// Presenter that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn redraw(&mut self, _frame: &RedrawFrame<'_>) {}
}

/// Summary of one applied batch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BatchReport {
    pub applied: usize,
    pub outcomes: Vec<ApplyOutcome>,
    /// Records refused by the engine; the rest of the batch still applied.
    pub failures: Vec<BatchError>,
    pub redrawn: bool,
    pub highlighted: Vec<CellRef>,
    pub unplaced: Vec<SampleName>,
}

/// One lens session.
pub struct LensService<P: Presenter> {
    subjects: SubjectCollection,
    layout: GridLayout,
    reconciler: Reconciler,
    highlights: HighlightBoard,
    presenter: P,
}

impl<P: Presenter> LensService<P> {
    /// Starts a session with an empty collection.
    pub fn new(layout: GridLayout, config: &LensConfig, presenter: P) -> Self {
        info!(
            "event=lens_load module=service status=ok rows={} columns={} duplicate_policy={:?} strict_lookups={}",
            layout.rows(),
            layout.columns(),
            config.duplicate_policy,
            config.strict_lookups
        );
        Self {
            subjects: SubjectCollection::new(),
            layout,
            reconciler: config.reconciler(),
            highlights: HighlightBoard::new(config.highlight_ms),
            presenter,
        }
    }

    /// Applies a realtime batch and redraws once.
    ///
    /// Refused records are listed in `BatchReport::failures`.
    pub fn apply_batch(&mut self, records: Vec<ChangeRecord>, now_ms: u64) -> BatchReport {
        if records.is_empty() {
            return BatchReport::default();
        }

        let count = records.len();
        let applied = self.reconciler.apply_batch(records, &mut self.subjects);

        let placement = self.layout.place(&self.subjects);
        self.highlights
            .highlight(placement.placed.iter().copied(), now_ms);
        self.presenter.redraw(&RedrawFrame {
            subjects: &self.subjects,
            layout: &self.layout,
            highlighted: &placement.placed,
            unplaced: &placement.unplaced,
            highlight_ms: self.highlights.duration_ms(),
        });

        if applied.is_clean() {
            info!(
                "event=batch_apply module=service status=ok changes={} subjects={} samples={} highlighted={} unplaced={}",
                count,
                self.subjects.len(),
                self.subjects.sample_count(),
                placement.placed.len(),
                placement.unplaced.len()
            );
        } else {
            warn!(
                "event=batch_apply module=service status=partial changes={} failed={} subjects={} samples={}",
                count,
                applied.failures.len(),
                self.subjects.len(),
                self.subjects.sample_count()
            );
        }

        BatchReport {
            applied: count,
            outcomes: applied.outcomes,
            failures: applied.failures,
            redrawn: true,
            highlighted: placement.placed,
            unplaced: placement.unplaced,
        }
    }

    /// Decodes a JSON batch, then applies it.
    ///
    /// # Errors
    /// - `InvalidEvent` when the batch does not decode; nothing is applied or
    ///   redrawn then.
    pub fn apply_batch_json(&mut self, json: &str, now_ms: u64) -> Result<BatchReport, BatchError> {
        let records = parse_batch(json)?;
        Ok(self.apply_batch(records, now_ms))
    }

    /// Scores a click on `cell`.
    pub fn click(&mut self, cell: CellRef, now_ms: u64) -> bool {
        self.highlights.click(cell, now_ms)
    }

    /// Reverts highlights whose deadline passed.
    pub fn expire_highlights(&mut self, now_ms: u64) -> Vec<CellRef> {
        self.highlights.expire(now_ms)
    }

    pub fn subjects(&self) -> &SubjectCollection {
        &self.subjects
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn highlights(&self) -> &HighlightBoard {
        &self.highlights
    }

    pub fn score(&self) -> u32 {
        self.highlights.score()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}
