use crate::error::SentinelError;
use crate::reps::SquatPhase;
use crate::summary::{self, SessionId, SummaryReport};
use crate::telemetry::SessionLog;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Serialize)]
struct TimeseriesRow {
    elapsed_seconds: f64,
    knee_angle_deg: Option<f64>,
    fsm_state: SquatPhase,
    cumulative_reps: u32,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub fn write_timeseries(path: &Path, log: &SessionLog) -> Result<(), SentinelError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in log.records() {
        writer.serialize(TimeseriesRow {
            elapsed_seconds: round3(record.elapsed_seconds),
            knee_angle_deg: record.knee_angle_deg.map(summary::round2),
            fsm_state: record.fsm_state,
            cumulative_reps: record.cumulative_reps,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary(path: &Path, report: &SummaryReport) -> Result<(), SentinelError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    report.serialize(&mut serializer)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct FinalizeOutcome {
    pub timeseries: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub report: Option<SummaryReport>,
    pub failures: Vec<(PathBuf, SentinelError)>,
}

impl FinalizeOutcome {
    pub fn skipped(&self) -> bool {
        self.report.is_none() && self.failures.is_empty()
    }
}

/// Persists both session artifacts. Each write is attempted independently; an
/// empty log writes nothing.
pub fn finalize_session(log: &SessionLog, session_id: &SessionId, output_dir: &Path) -> FinalizeOutcome {
    let mut outcome = FinalizeOutcome::default();

    let stats = match summary::summarize(log) {
        Ok(stats) => stats,
        Err(SentinelError::NoTelemetry) => {
            warn!(session = %session_id, "no telemetry collected, skipping artifacts");
            return outcome;
        }
        Err(e) => {
            error!(session = %session_id, error = %e, "summary failed");
            return outcome;
        }
    };
    info!(session = %session_id, frames = log.len(), "finalizing session");

    if let Err(e) = fs::create_dir_all(output_dir) {
        warn!(dir = %output_dir.display(), error = %e, "cannot create output directory");
    }

    let stem = session_id.file_stem();
    let csv_path = output_dir.join(format!("{stem}.csv"));
    let json_path = output_dir.join(format!("{stem}.json"));

    match write_timeseries(&csv_path, log) {
        Ok(()) => {
            info!(path = %csv_path.display(), "time series saved");
            outcome.timeseries = Some(csv_path);
        }
        Err(e) => {
            error!(path = %csv_path.display(), error = %e, "failed to write time series");
            outcome.failures.push((csv_path, e));
        }
    }

    let report = SummaryReport::new(session_id.clone(), Utc::now(), &stats);
    match write_summary(&json_path, &report) {
        Ok(()) => {
            info!(path = %json_path.display(), "summary saved");
            outcome.summary = Some(json_path);
        }
        Err(e) => {
            error!(path = %json_path.display(), error = %e, "failed to write summary");
            outcome.failures.push((json_path, e));
        }
    }
    outcome.report = Some(report);

    outcome
}
