//! Squat repetition counting from pose landmarks.
//!
//! Each frame's hip, knee and ankle landmarks give a knee angle
//! ([`geometry::angle`]), which drives a two-state rep counter
//! ([`reps::RepCounter`]). Every frame is recorded as telemetry and the
//! finished log is summarized and exported at session end.

pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod logging;
pub mod reps;
pub mod session;
pub mod source;
pub mod squat;
pub mod summary;
pub mod telemetry;

#[cfg(feature = "vision")]
pub mod camera;
#[cfg(feature = "vision")]
pub mod inference;

pub use config::Config;
pub use error::SentinelError;
pub use reps::{RepCounter, RepThresholds, SquatPhase};
pub use source::{Landmark, PoseFrame, PoseSource, ReplaySource};
pub use squat::{KneeJoint, SquatAnalyzer};
pub use summary::{summarize, SessionId, SessionStats, SummaryReport};
pub use telemetry::{SessionLog, TelemetryRecord, TelemetryRecorder};
