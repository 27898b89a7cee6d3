use crate::reps::SquatPhase;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    pub elapsed_seconds: f64,
    pub knee_angle_deg: Option<f64>,
    pub fsm_state: SquatPhase,
    pub cumulative_reps: u32,
}

/// Finalized, capture-ordered telemetry for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionLog {
    records: Vec<TelemetryRecord>,
}

impl SessionLog {
    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&TelemetryRecord> {
        self.records.last()
    }
}

#[derive(Debug, Default)]
pub struct TelemetryRecorder {
    records: Vec<TelemetryRecord>,
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one frame. Elapsed time that is non-finite or runs backwards is
    /// pinned to the previous record's value.
    pub fn record(
        &mut self,
        elapsed_seconds: f64,
        knee_angle_deg: Option<f64>,
        fsm_state: SquatPhase,
        cumulative_reps: u32,
    ) {
        let floor = self.records.last().map_or(0.0, |r| r.elapsed_seconds);
        let elapsed_seconds = if elapsed_seconds.is_finite() {
            elapsed_seconds.max(floor)
        } else {
            floor
        };
        self.records.push(TelemetryRecord {
            elapsed_seconds,
            knee_angle_deg,
            fsm_state,
            cumulative_reps,
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn finish(self) -> SessionLog {
        SessionLog {
            records: self.records,
        }
    }
}

impl FromIterator<TelemetryRecord> for SessionLog {
    fn from_iter<I: IntoIterator<Item = TelemetryRecord>>(iter: I) -> Self {
        let mut recorder = TelemetryRecorder::new();
        for r in iter {
            recorder.record(r.elapsed_seconds, r.knee_angle_deg, r.fsm_state, r.cumulative_reps);
        }
        recorder.finish()
    }
}
