use crate::source::PoseSource;
use crate::squat::SquatAnalyzer;
use crate::telemetry::{SessionLog, TelemetryRecorder};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Exit status used when a second stop signal arrives before the loop exits.
pub const FORCED_EXIT_STATUS: i32 = 1;

/// Set by SIGINT/SIGTERM; the loop checks it once per frame. A second signal
/// while the flag is already set exits the process, for a source stuck in a
/// blocking read.
pub fn install_stop_flag() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        // Must be registered before `register`, so the first signal only sees
        // the flag unset.
        signal_hook::flag::register_conditional_shutdown(
            signal,
            FORCED_EXIT_STATUS,
            Arc::clone(&stop),
        )
        .with_context(|| format!("failed to register shutdown for signal {signal}"))?;
        signal_hook::flag::register(signal, Arc::clone(&stop))
            .with_context(|| format!("failed to register handler for signal {signal}"))?;
    }
    Ok(stop)
}

/// Drives `source` until it ends, fails, or `stop` is raised. The collected
/// log is returned in every case.
pub fn run_session<S>(source: &mut S, analyzer: &mut SquatAnalyzer, stop: &AtomicBool) -> SessionLog
where
    S: PoseSource + ?Sized,
{
    let mut recorder = TelemetryRecorder::new();

    loop {
        if stop.load(Ordering::Relaxed) {
            info!(frames = recorder.len(), "stop requested");
            break;
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!(frames = recorder.len(), "end of stream");
                break;
            }
            Err(error) => {
                warn!(error = %format!("{error:#}"), "frame acquisition failed, ending session");
                break;
            }
        };

        let analysis = analyzer.analyze(&frame.landmarks);
        if let Some(rep) = analysis.completed {
            info!(total = rep.total, "rep completed");
        }
        debug!(
            elapsed = frame.elapsed_seconds,
            angle = ?analysis.knee_angle_deg,
            state = %analysis.phase,
            "frame"
        );

        recorder.record(
            frame.elapsed_seconds,
            analysis.knee_angle_deg,
            analysis.phase,
            analysis.cumulative_reps,
        );
    }

    recorder.finish()
}
