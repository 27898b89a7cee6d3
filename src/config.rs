use crate::error::SentinelError;
use crate::reps::{RepThresholds, DEFAULT_DOWN_THRESHOLD_DEG, DEFAULT_UP_THRESHOLD_DEG};
use crate::squat::{KneeJoint, DEFAULT_MIN_VISIBILITY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera_id: i32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub model_path: PathBuf,
    pub squat_up_threshold: f64,
    pub squat_down_threshold: f64,
    pub landmark_hip: usize,
    pub landmark_knee: usize,
    pub landmark_ankle: usize,
    pub min_landmark_visibility: f32,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let joint = KneeJoint::default();
        Self {
            camera_id: 0,
            frame_width: 1280,
            frame_height: 720,
            model_path: PathBuf::from("models/pose_landmarker.onnx"),
            squat_up_threshold: DEFAULT_UP_THRESHOLD_DEG,
            squat_down_threshold: DEFAULT_DOWN_THRESHOLD_DEG,
            landmark_hip: joint.hip,
            landmark_knee: joint.knee,
            landmark_ankle: joint.ankle,
            min_landmark_visibility: DEFAULT_MIN_VISIBILITY,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SentinelError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SentinelError::Io(format!("{}: {e}", path.display())))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| SentinelError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SentinelError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SentinelError::ConfigParse(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SentinelError> {
        self.thresholds()?;
        let joint = self.knee_joint();
        if joint.hip == joint.knee || joint.knee == joint.ankle || joint.hip == joint.ankle {
            return Err(SentinelError::InvalidConfig(format!(
                "hip/knee/ankle landmarks must be distinct, got {}/{}/{}",
                joint.hip, joint.knee, joint.ankle
            )));
        }
        if !(0.0..=1.0).contains(&self.min_landmark_visibility) {
            return Err(SentinelError::InvalidConfig(format!(
                "min_landmark_visibility must be within [0, 1], got {}",
                self.min_landmark_visibility
            )));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Result<RepThresholds, SentinelError> {
        RepThresholds::new(self.squat_up_threshold, self.squat_down_threshold)
    }

    pub fn knee_joint(&self) -> KneeJoint {
        KneeJoint {
            hip: self.landmark_hip,
            knee: self.landmark_knee,
            ankle: self.landmark_ankle,
            min_visibility: self.min_landmark_visibility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_track_the_right_leg_with_standard_thresholds() {
        let config = Config::default();
        config.validate().expect("defaults valid");
        let thresholds = config.thresholds().expect("thresholds");
        assert_eq!(thresholds.up_deg(), 165.0);
        assert_eq!(thresholds.down_deg(), 90.0);
        assert_eq!(
            config.knee_joint(),
            KneeJoint {
                hip: 24,
                knee: 26,
                ankle: 28,
                min_visibility: 0.6,
            }
        );
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sentinel.toml");
        fs::write(&path, "squat_down_threshold = 100.0\nlandmark_hip = 23\n").expect("write");

        let config = Config::load(&path).expect("load");
        assert_eq!(config.squat_down_threshold, 100.0);
        assert_eq!(config.landmark_hip, 23);
        assert_eq!(config.squat_up_threshold, 165.0);
        assert_eq!(config.camera_id, 0);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sentinel.toml");
        let config = Config {
            camera_id: 2,
            output_dir: PathBuf::from("sessions"),
            ..Config::default()
        };
        config.save(&path).expect("save");
        assert_eq!(Config::load(&path).expect("load"), config);
    }

    #[test]
    fn inverted_thresholds_are_rejected_on_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sentinel.toml");
        fs::write(&path, "squat_up_threshold = 80.0\n").expect("write");

        let err = Config::load(&path).expect_err("must reject");
        assert!(matches!(err, SentinelError::InvalidConfig(_)));
    }

    #[test]
    fn visibility_floor_flows_into_the_joint_and_is_range_checked() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sentinel.toml");
        fs::write(&path, "min_landmark_visibility = 0.8\n").expect("write");
        let config = Config::load(&path).expect("load");
        assert_eq!(config.knee_joint().min_visibility, 0.8);

        for bad in [-0.1, 1.5, f32::NAN] {
            let config = Config {
                min_landmark_visibility: bad,
                ..Config::default()
            };
            assert!(matches!(config.validate(), Err(SentinelError::InvalidConfig(_))));
        }
    }

    #[test]
    fn duplicate_landmarks_are_rejected() {
        let config = Config {
            landmark_ankle: 26,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(SentinelError::InvalidConfig(_))));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sentinel.toml");
        fs::write(&path, "camera_id = \"front\"\n").expect("write");
        assert!(matches!(Config::load(&path), Err(SentinelError::ConfigParse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            Config::load(dir.path().join("nope.toml")),
            Err(SentinelError::Io(_))
        ));
    }
}
