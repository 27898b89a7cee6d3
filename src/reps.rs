use crate::error::SentinelError;
use serde::Serialize;
use std::fmt;

pub const DEFAULT_UP_THRESHOLD_DEG: f64 = 165.0;
pub const DEFAULT_DOWN_THRESHOLD_DEG: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SquatPhase {
    #[default]
    Up,
    Down,
}

impl SquatPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

impl fmt::Display for SquatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knee angles bounding the hysteresis band. `down < up` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepThresholds {
    up_deg: f64,
    down_deg: f64,
}

impl RepThresholds {
    pub fn new(up_deg: f64, down_deg: f64) -> Result<Self, SentinelError> {
        if !up_deg.is_finite() || !down_deg.is_finite() {
            return Err(SentinelError::InvalidConfig(format!(
                "rep thresholds must be finite (up={up_deg}, down={down_deg})"
            )));
        }
        if down_deg >= up_deg {
            return Err(SentinelError::InvalidConfig(format!(
                "down threshold {down_deg} must be below up threshold {up_deg}"
            )));
        }
        Ok(Self { up_deg, down_deg })
    }

    pub fn up_deg(&self) -> f64 {
        self.up_deg
    }

    pub fn down_deg(&self) -> f64 {
        self.down_deg
    }
}

impl Default for RepThresholds {
    fn default() -> Self {
        Self {
            up_deg: DEFAULT_UP_THRESHOLD_DEG,
            down_deg: DEFAULT_DOWN_THRESHOLD_DEG,
        }
    }
}

/// Returns the next phase and how many reps the reading completed (0 or 1).
pub fn transition(phase: SquatPhase, angle_deg: f64, thresholds: &RepThresholds) -> (SquatPhase, u32) {
    if angle_deg > thresholds.up_deg {
        let delta = u32::from(phase == SquatPhase::Down);
        (SquatPhase::Up, delta)
    } else if angle_deg < thresholds.down_deg {
        (SquatPhase::Down, 0)
    } else {
        (phase, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepCompleted {
    pub total: u32,
}

#[derive(Debug, Clone)]
pub struct RepCounter {
    thresholds: RepThresholds,
    phase: SquatPhase,
    reps: u32,
}

impl RepCounter {
    pub fn new(thresholds: RepThresholds) -> Self {
        Self {
            thresholds,
            phase: SquatPhase::Up,
            reps: 0,
        }
    }

    /// Feeds one frame's reading. Absent readings leave the phase untouched.
    pub fn observe(&mut self, angle_deg: Option<f64>) -> Option<RepCompleted> {
        let angle_deg = angle_deg?;
        let (next, delta) = transition(self.phase, angle_deg, &self.thresholds);
        self.phase = next;
        if delta == 0 {
            return None;
        }
        self.reps = self.reps.saturating_add(delta);
        Some(RepCompleted { total: self.reps })
    }

    pub fn phase(&self) -> SquatPhase {
        self.phase
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }
}
