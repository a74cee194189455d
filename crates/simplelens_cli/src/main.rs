//! SimpleLens command-line entry point.
//!
//! # Responsibility
//! - Verify `simplelens_core` linkage (`ping`).
//! - Replay recorded realtime batches against reference datasets and print
//!   the resulting reports and grid placement as JSON.

use clap::{Parser, Subcommand};
use log::{info, warn};
use serde_json::json;
use simplelens_core::{
    init_logging, parse_batch, parse_batch_value, ChangeRecord, GridLayout, LensConfig,
    LensService, NullPresenter,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

const EXIT_SUCCESS: u8 = 0;
const EXIT_ARGS_ERROR: u8 = 2;
const EXIT_IO_ERROR: u8 = 3;
const EXIT_BATCH_ERROR: u8 = 4;

#[derive(Parser)]
#[command(name = "simplelens")]
#[command(about = "Replay realtime subject/sample changes against a lens grid")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print ping and core version.
    Ping,
    /// Apply recorded change batches and print reports and final placement.
    ///
    /// Records the engine refuses are listed under `failures` in the batch
    /// report; replay continues with the rest.
    Replay {
        /// Subjects reference dataset (`{"children": [...]}` or an array).
        #[arg(long)]
        subjects: PathBuf,
        /// Aspects reference dataset (array of names).
        #[arg(long)]
        aspects: PathBuf,
        /// Change batch file.
        #[arg(long)]
        changes: PathBuf,
        /// Treat every non-empty line of the changes file as one batch.
        #[arg(long)]
        lines: bool,
        /// Lens config (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overrides the config log level.
        #[arg(long)]
        log_level: Option<String>,
    },
}

#[derive(Debug)]
struct CliError {
    code: u8,
    message: String,
}

impl CliError {
    fn args(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_ARGS_ERROR,
            message: message.into(),
        }
    }

    fn io(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_IO_ERROR,
            message: message.into(),
        }
    }

    fn batch(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_BATCH_ERROR,
            message: message.into(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ping => {
            println!("simplelens_core ping={}", simplelens_core::ping());
            println!("simplelens_core version={}", simplelens_core::core_version());
            Ok(())
        }
        Commands::Replay {
            subjects,
            aspects,
            changes,
            lines,
            config,
            log_level,
        } => cmd_replay(&subjects, &aspects, &changes, lines, config, log_level),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message }) => {
            eprintln!("error: {message}");
            ExitCode::from(code)
        }
    }
}

fn cmd_replay(
    subjects_path: &Path,
    aspects_path: &Path,
    changes_path: &Path,
    lines: bool,
    config_path: Option<PathBuf>,
    log_level: Option<String>,
) -> Result<(), CliError> {
    let config = match config_path {
        Some(path) => LensConfig::load(path).map_err(|err| CliError::args(err.to_string()))?,
        None => LensConfig::default(),
    };
    let level = log_level.unwrap_or_else(|| config.log_level.clone());
    init_logging(&level, "").map_err(CliError::args)?;

    let layout = GridLayout::from_json(&read(subjects_path)?, &read(aspects_path)?)
        .map_err(|err| CliError::args(err.to_string()))?;
    let batches = read_batches(&read(changes_path)?, lines)?;
    info!(
        "event=replay_start module=cli status=ok batches={} rows={} columns={}",
        batches.len(),
        layout.rows(),
        layout.columns()
    );

    let mut lens = LensService::new(layout, &config, NullPresenter);
    for (number, batch) in batches.into_iter().enumerate() {
        let report = lens.apply_batch(batch, now_ms());
        for failure in &report.failures {
            warn!("event=replay_batch module=cli status=partial batch={number} error={failure}");
        }
        print_json(&json!({ "batch": number, "report": report }))?;
    }

    let positions: Vec<_> = lens
        .subjects()
        .iter()
        .map(|subject| {
            json!({
                "absolutePath": subject.absolute_path,
                "position": lens.layout().locate(subject),
            })
        })
        .collect();
    print_json(&json!({
        "subjects": lens.subjects(),
        "positions": positions,
        "score": lens.score(),
    }))
}

fn read_batches(source: &str, lines: bool) -> Result<Vec<Vec<ChangeRecord>>, CliError> {
    if !lines {
        let batch = parse_batch(source).map_err(|err| CliError::batch(err.to_string()))?;
        return Ok(vec![batch]);
    }

    source
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_number, line)| {
            serde_json::from_str(line)
                .map_err(|err| err.to_string())
                .and_then(|value| parse_batch_value(value).map_err(|err| err.to_string()))
                .map_err(|err| CliError::batch(format!("line {}: {err}", line_number + 1)))
        })
        .collect()
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|err| CliError::io(format!("failed to read `{}`: {err}", path.display())))
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::io(format!("failed to encode output: {err}")))?;
    println!("{text}");
    Ok(())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
