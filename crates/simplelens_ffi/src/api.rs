//! Use-case API for the dashboard host.
//!
//! # Responsibility
//! - Expose lens load, realtime change and click calls with simple,
//!   serializable envelopes.
//! - Hold the lens session of the calling thread between calls.
//!
//! # Invariants
//! - Exported functions never panic across the host boundary.
//! - Failures are reported in envelopes, never by unwinding.
//! - Grid positions that are not found are reported as `-1`.
//! - Envelopes serialize with camelCase keys, matching the core's wire forms.

use log::warn;
use serde::Serialize;
use simplelens_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CellRef, GridLayout, LensConfig, LensService, NullPresenter,
};
use std::cell::RefCell;

thread_local! {
    static LENS: RefCell<Option<LensService<NullPresenter>>> = const { RefCell::new(None) };
}

/// Health-check call.
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// An empty `log_dir` logs to stderr.
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Grid cell in host coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LensCell {
    pub row: u32,
    pub column: u32,
}

impl From<CellRef> for LensCell {
    fn from(cell: CellRef) -> Self {
        Self {
            row: u32::try_from(cell.row).unwrap_or(u32::MAX),
            column: u32::try_from(cell.column).unwrap_or(u32::MAX),
        }
    }
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LensActionResponse {
    pub ok: bool,
    pub message: String,
}

impl LensActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Grid position of one subject after a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LensSubjectPosition {
    pub absolute_path: String,
    /// `-1` when the subject has no row.
    pub subject_index: i64,
    /// One entry per sample, last sample first; `-1` when the aspect has
    /// no column.
    pub sample_indexes: Vec<i64>,
    /// Sample names in the same order as `sample_indexes`.
    pub sample_names: Vec<String>,
}

/// One change record the engine refused; the rest of its batch applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LensChangeFailure {
    pub index: u32,
    pub error_code: String,
    pub message: String,
}

/// Envelope of one realtime change batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LensBatchResponse {
    pub ok: bool,
    pub message: String,
    /// Error code (`invalid_event`, `no_lens`) when the batch was not applied.
    pub error_code: Option<String>,
    /// Index of the undecodable change record, when one is to blame.
    pub failed_index: Option<u32>,
    /// Records refused while the batch applied.
    pub failures: Vec<LensChangeFailure>,
    pub redrawn: bool,
    pub highlighted: Vec<LensCell>,
    pub highlight_ms: u64,
    pub positions: Vec<LensSubjectPosition>,
}

impl LensBatchResponse {
    fn failure(message: impl Into<String>, error_code: &str, failed_index: Option<u32>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            error_code: Some(error_code.to_string()),
            failed_index,
            failures: Vec::new(),
            redrawn: false,
            highlighted: Vec::new(),
            highlight_ms: 0,
            positions: Vec::new(),
        }
    }
}

/// Envelope of a grid click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LensClickResponse {
    pub hit: bool,
    pub score: u32,
}

/// Loads the reference datasets and starts a fresh lens session.
///
/// `config_toml` may be empty for defaults. A running session is replaced.
pub fn lens_load(
    subjects_json: String,
    aspects_json: String,
    config_toml: String,
) -> LensActionResponse {
    let loaded = LensConfig::from_toml_str(&config_toml)
        .map_err(|err| err.to_string())
        .and_then(|config| {
            GridLayout::from_json(&subjects_json, &aspects_json)
                .map(|layout| (config, layout))
                .map_err(|err| err.to_string())
        });
    let (config, layout) = match loaded {
        Ok(loaded) => loaded,
        Err(err) => {
            warn!("event=lens_load module=ffi status=error error={err}");
            return LensActionResponse::failure(format!("lens_load failed: {err}"));
        }
    };

    let message = format!(
        "Lens loaded with {} row(s) and {} column(s).",
        layout.rows(),
        layout.columns()
    );
    let service = LensService::new(layout, &config, NullPresenter);
    match with_lens_slot(|slot| *slot = Some(service)) {
        Ok(()) => LensActionResponse::success(message),
        Err(err) => LensActionResponse::failure(format!("lens_load failed: {err}")),
    }
}

/// Applies one realtime change batch (`evt.detail`) to the session.
pub fn lens_apply_changes(batch_json: String, now_ms: u64) -> LensBatchResponse {
    let result = with_lens(|lens| {
        let report = match lens.apply_batch_json(&batch_json, now_ms) {
            Ok(report) => report,
            Err(err) => {
                warn!(
                    "event=lens_apply_changes module=ffi status=error error_code={} index={:?}",
                    err.error.code(),
                    err.index
                );
                return LensBatchResponse::failure(
                    format!("lens_apply_changes failed: {err}"),
                    err.error.code(),
                    err.index.and_then(|index| u32::try_from(index).ok()),
                );
            }
        };

        let positions = lens
            .subjects()
            .iter()
            .map(|subject| {
                let index = lens.layout().locate(subject);
                LensSubjectPosition {
                    absolute_path: subject.absolute_path.clone(),
                    subject_index: index.subject_sentinel(),
                    sample_indexes: index.sample_sentinels(),
                    sample_names: subject
                        .samples
                        .iter()
                        .rev()
                        .map(|sample| sample.name.to_string())
                        .collect(),
                }
            })
            .collect();

        let failures: Vec<LensChangeFailure> = report
            .failures
            .iter()
            .map(|failure| LensChangeFailure {
                index: failure
                    .index
                    .and_then(|index| u32::try_from(index).ok())
                    .unwrap_or(u32::MAX),
                error_code: failure.error.code().to_string(),
                message: failure.error.to_string(),
            })
            .collect();
        if !failures.is_empty() {
            warn!(
                "event=lens_apply_changes module=ffi status=partial failed={}",
                failures.len()
            );
        }

        LensBatchResponse {
            ok: true,
            message: format!(
                "Applied {} change(s), {} refused.",
                report.applied,
                failures.len()
            ),
            error_code: None,
            failed_index: None,
            failures,
            redrawn: report.redrawn,
            highlighted: report.highlighted.into_iter().map(LensCell::from).collect(),
            highlight_ms: lens.highlights().duration_ms(),
            positions,
        }
    });

    result.unwrap_or_else(|err| {
        LensBatchResponse::failure(format!("lens_apply_changes failed: {err}"), "no_lens", None)
    })
}

/// Registers a click on a grid cell.
pub fn lens_click(row: u32, column: u32, now_ms: u64) -> LensClickResponse {
    with_lens(|lens| LensClickResponse {
        hit: lens.click(CellRef::new(row as usize, column as usize), now_ms),
        score: lens.score(),
    })
    .unwrap_or(LensClickResponse {
        hit: false,
        score: 0,
    })
}

/// Reverts highlights whose deadline passed; returns the cells to clear.
pub fn lens_expire(now_ms: u64) -> Vec<LensCell> {
    with_lens(|lens| {
        lens.expire_highlights(now_ms)
            .into_iter()
            .map(LensCell::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Discards the session of the calling thread.
pub fn lens_unload() -> bool {
    with_lens_slot(|slot| slot.take().is_some()).unwrap_or(false)
}

fn with_lens_slot<T>(
    f: impl FnOnce(&mut Option<LensService<NullPresenter>>) -> T,
) -> Result<T, String> {
    LENS.with(|cell| {
        let mut slot = cell
            .try_borrow_mut()
            .map_err(|_| "lens session is busy".to_string())?;
        Ok(f(&mut slot))
    })
}

fn with_lens<T>(f: impl FnOnce(&mut LensService<NullPresenter>) -> T) -> Result<T, String> {
    with_lens_slot(|slot| slot.as_mut().map(f))?
        .ok_or_else(|| "lens is not loaded; call lens_load first".to_string())
}
