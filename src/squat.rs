use crate::geometry::{self, Point2D};
use crate::reps::{RepCompleted, RepCounter, RepThresholds, SquatPhase};
use crate::source::Landmark;
use tracing::trace;

pub const DEFAULT_MIN_VISIBILITY: f32 = 0.6;

/// Landmark indices of the hip, knee and ankle on the tracked side.
/// Landmarks seen with less than `min_visibility` count as missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KneeJoint {
    pub hip: usize,
    pub knee: usize,
    pub ankle: usize,
    pub min_visibility: f32,
}

impl Default for KneeJoint {
    fn default() -> Self {
        // MediaPipe right hip, knee, ankle
        Self {
            hip: 24,
            knee: 26,
            ankle: 28,
            min_visibility: DEFAULT_MIN_VISIBILITY,
        }
    }
}

impl KneeJoint {
    /// Knee angle for this frame, or `None` unless all three landmarks are present.
    pub fn angle(&self, landmarks: &[Landmark]) -> Option<f64> {
        let hip = self.find(landmarks, self.hip)?;
        let knee = self.find(landmarks, self.knee)?;
        let ankle = self.find(landmarks, self.ankle)?;
        match geometry::angle(hip, knee, ankle) {
            Ok(angle) => Some(angle),
            Err(error) => {
                trace!(%error, "discarding knee angle");
                None
            }
        }
    }

    fn find(&self, landmarks: &[Landmark], index: usize) -> Option<Point2D> {
        landmarks
            .iter()
            .find(|lm| lm.index == index)
            .filter(|lm| lm.visibility >= self.min_visibility)
            .map(|lm| lm.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAnalysis {
    pub knee_angle_deg: Option<f64>,
    pub phase: SquatPhase,
    pub cumulative_reps: u32,
    pub completed: Option<RepCompleted>,
}

pub struct SquatAnalyzer {
    joint: KneeJoint,
    counter: RepCounter,
}

impl SquatAnalyzer {
    pub fn new(joint: KneeJoint, thresholds: RepThresholds) -> Self {
        Self {
            joint,
            counter: RepCounter::new(thresholds),
        }
    }

    pub fn analyze(&mut self, landmarks: &[Landmark]) -> FrameAnalysis {
        let knee_angle_deg = self.joint.angle(landmarks);
        let completed = self.counter.observe(knee_angle_deg);
        FrameAnalysis {
            knee_angle_deg,
            phase: self.counter.phase(),
            cumulative_reps: self.counter.reps(),
            completed,
        }
    }

    pub fn reps(&self) -> u32 {
        self.counter.reps()
    }
}
