use crate::error::SentinelError;
use crate::telemetry::SessionLog;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fmt;

/// Wall-clock start of a session, used as the artifact filename stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn now() -> Self {
        Self::from_start(Local::now())
    }

    pub fn from_start(start: DateTime<Local>) -> Self {
        Self(start.format("%Y-%m-%d_%H-%M-%S").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_stem(&self) -> String {
        format!("session_log_{}", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionStats {
    pub total_duration_sec: f64,
    pub total_reps: u32,
    pub frames_recorded: usize,
    pub frames_with_angle: usize,
    /// `None` when no frame carried a knee angle.
    pub angles: Option<AngleStats>,
}

pub fn summarize(log: &SessionLog) -> Result<SessionStats, SentinelError> {
    let last = log.last().ok_or(SentinelError::NoTelemetry)?;

    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for angle in log.records().iter().filter_map(|r| r.knee_angle_deg) {
        count += 1;
        sum += angle;
        min = min.min(angle);
        max = max.max(angle);
    }

    let angles = (count > 0).then(|| AngleStats {
        mean: sum / count as f64,
        min,
        max,
    });

    Ok(SessionStats {
        total_duration_sec: last.elapsed_seconds,
        total_reps: last.cumulative_reps,
        frames_recorded: log.len(),
        frames_with_angle: count,
        angles,
    })
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Biometrics {
    pub avg_knee_angle: Option<f64>,
    pub min_depth_angle: Option<f64>,
    pub max_extension_angle: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_duration_sec: f64,
    pub total_valid_reps: u32,
    pub frames_recorded: usize,
    pub frames_with_angle: usize,
    pub biometrics: Biometrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub session_id: SessionId,
    pub generated_at_utc: String,
    pub metrics: SummaryMetrics,
}

impl SummaryReport {
    pub fn new(session_id: SessionId, generated_at: DateTime<Utc>, stats: &SessionStats) -> Self {
        Self {
            session_id,
            generated_at_utc: generated_at.to_rfc3339(),
            metrics: SummaryMetrics {
                total_duration_sec: round2(stats.total_duration_sec),
                total_valid_reps: stats.total_reps,
                frames_recorded: stats.frames_recorded,
                frames_with_angle: stats.frames_with_angle,
                biometrics: Biometrics {
                    avg_knee_angle: stats.angles.map(|a| round2(a.mean)),
                    min_depth_angle: stats.angles.map(|a| round2(a.min)),
                    max_extension_angle: stats.angles.map(|a| round2(a.max)),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reps::{RepCounter, RepThresholds};
    use crate::telemetry::TelemetryRecorder;
    use chrono::TimeZone;

    fn log_from(angles: &[Option<f64>]) -> SessionLog {
        let mut counter = RepCounter::new(RepThresholds::default());
        let mut recorder = TelemetryRecorder::new();
        for (i, angle) in angles.iter().enumerate() {
            counter.observe(*angle);
            recorder.record(i as f64 * 0.5, *angle, counter.phase(), counter.reps());
        }
        recorder.finish()
    }

    #[test]
    fn aggregates_present_angles_only() {
        let log = log_from(&[Some(170.0), Some(80.0), Some(95.0), None, Some(170.0)]);
        let stats = summarize(&log).expect("stats");

        assert_eq!(stats.total_reps, 1);
        assert_eq!(stats.total_duration_sec, 2.0);
        assert_eq!(stats.frames_recorded, 5);
        assert_eq!(stats.frames_with_angle, 4);
        let angles = stats.angles.expect("angles");
        assert_eq!(angles.mean, 128.75);
        assert_eq!(angles.min, 80.0);
        assert_eq!(angles.max, 170.0);
    }

    #[test]
    fn empty_log_signals_no_data() {
        let err = summarize(&SessionLog::default()).expect_err("no data");
        assert!(matches!(err, SentinelError::NoTelemetry));
    }

    #[test]
    fn log_without_angles_reports_absent_statistics() {
        let log = log_from(&[None, None, None]);
        let stats = summarize(&log).expect("stats");
        assert_eq!(stats.angles, None);
        assert_eq!(stats.frames_with_angle, 0);
        assert_eq!(stats.total_reps, 0);
        assert_eq!(stats.total_duration_sec, 1.0);
    }

    #[test]
    fn summarizing_twice_is_identical_and_leaves_the_log_alone() {
        let log = log_from(&[Some(175.0), Some(60.0), Some(170.0), Some(85.0), Some(171.0)]);
        let snapshot = log.clone();
        let first = summarize(&log).expect("stats");
        let second = summarize(&log).expect("stats");
        assert_eq!(first, second);
        assert_eq!(log, snapshot);
        assert_eq!(first.total_reps, 2);
    }

    #[test]
    fn report_rounds_to_two_decimals() {
        let stats = SessionStats {
            total_duration_sec: 12.3456,
            total_reps: 3,
            frames_recorded: 10,
            frames_with_angle: 7,
            angles: Some(AngleStats {
                mean: 133.33333,
                min: 78.005,
                max: 179.999,
            }),
        };
        let generated = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("time");
        let report = SummaryReport::new(SessionId("2026-03-01_13-00-00".into()), generated, &stats);

        assert_eq!(report.metrics.total_duration_sec, 12.35);
        assert_eq!(report.metrics.biometrics.avg_knee_angle, Some(133.33));
        assert_eq!(report.metrics.biometrics.max_extension_angle, Some(180.0));
        assert_eq!(report.generated_at_utc, "2026-03-01T12:00:00+00:00");

        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["session_id"], "2026-03-01_13-00-00");
        assert_eq!(json["metrics"]["total_valid_reps"], 3);
    }

    #[test]
    fn report_keeps_absent_statistics_as_null() {
        let stats = summarize(&log_from(&[None])).expect("stats");
        let report = SummaryReport::new(SessionId("s".into()), Utc::now(), &stats);
        let json = serde_json::to_value(&report).expect("json");
        assert!(json["metrics"]["biometrics"]["avg_knee_angle"].is_null());
    }

    #[test]
    fn session_id_formats_start_time() {
        let start = Local.with_ymd_and_hms(2026, 10, 14, 9, 5, 7).single().expect("time");
        let id = SessionId::from_start(start);
        assert_eq!(id.as_str(), "2026-10-14_09-05-07");
        assert_eq!(id.file_stem(), "session_log_2026-10-14_09-05-07");
    }
}
