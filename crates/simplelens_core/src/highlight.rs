//! Transient cell highlights and the click score.
//!
//! # Responsibility
//! - Track which grid cells are highlighted after a redraw and until when.
//! - Count clicks that land on a highlighted cell.
//!
//! # Invariants
//! - A cell reverts only once its latest deadline has passed; highlighting
//!   an already lit cell extends it.
//! - Time is supplied by the caller in epoch milliseconds.

use crate::layout::CellRef;
use log::debug;
use std::collections::BTreeMap;

pub const DEFAULT_HIGHLIGHT_MS: u64 = 1_000;

/// Deadline-tracked highlight state of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightBoard {
    duration_ms: u64,
    active: BTreeMap<CellRef, u64>,
    score: u32,
}

impl Default for HighlightBoard {
    fn default() -> Self {
        Self::new(DEFAULT_HIGHLIGHT_MS)
    }
}

impl HighlightBoard {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            active: BTreeMap::new(),
            score: 0,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Lights `cells` until `now_ms + duration_ms`.
    ///
    /// Returns how many cells were newly lit.
    pub fn highlight(&mut self, cells: impl IntoIterator<Item = CellRef>, now_ms: u64) -> usize {
        let expires_at = now_ms.saturating_add(self.duration_ms);
        let mut newly_lit = 0;
        for cell in cells {
            if self.active.insert(cell, expires_at).is_none() {
                newly_lit += 1;
            }
        }
        newly_lit
    }

    /// Reverts every cell whose deadline is at or before `now_ms`.
    pub fn expire(&mut self, now_ms: u64) -> Vec<CellRef> {
        let expired: Vec<CellRef> = self
            .active
            .iter()
            .filter(|(_, expires_at)| **expires_at <= now_ms)
            .map(|(cell, _)| *cell)
            .collect();
        for cell in &expired {
            self.active.remove(cell);
        }
        expired
    }

    /// Scores a click on a lit cell and clears it.
    ///
    /// Clicks on dark or already expired cells score nothing.
    pub fn click(&mut self, cell: CellRef, now_ms: u64) -> bool {
        match self.active.get(&cell).copied() {
            Some(expires_at) if expires_at > now_ms => {
                self.active.remove(&cell);
                self.score = self.score.saturating_add(1);
                debug!(
                    "event=cell_click module=highlight status=hit row={} column={} score={}",
                    cell.row, cell.column, self.score
                );
                true
            }
            _ => false,
        }
    }

    pub fn is_highlighted(&self, cell: CellRef) -> bool {
        self.active.contains_key(&cell)
    }

    pub fn score(&self) -> u32 {
        self.score
    }
}
