use crate::config::Config;
use crate::inference::PoseDetector;
use crate::source::{PoseFrame, PoseSource};
use anyhow::{Context, Result};
use opencv::{
    core::{Mat, MatTraitConst},
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
};
use std::time::Instant;
use tracing::{info, warn};

pub struct Camera {
    capture: VideoCapture,
}

impl Camera {
    pub fn new(device_id: i32, width: u32, height: u32) -> Result<Self> {
        let mut capture = VideoCapture::new(device_id, videoio::CAP_ANY)
            .with_context(|| format!("cannot access camera {device_id}"))?;

        if !capture.is_opened()? {
            anyhow::bail!("cannot access camera {device_id}");
        }

        capture.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(width))?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(height))?;

        Ok(Self { capture })
    }

    /// `Ok(None)` when the device stops delivering frames.
    pub fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        let ok = self.capture.read(&mut frame)?;

        if !ok || frame.empty() {
            return Ok(None);
        }

        Ok(Some(frame))
    }
}

/// Live webcam feed run through the landmark model.
pub struct CameraPoseSource {
    camera: Camera,
    detector: PoseDetector,
    started: Instant,
}

impl CameraPoseSource {
    pub fn open(config: &Config) -> Result<Self> {
        let camera = Camera::new(config.camera_id, config.frame_width, config.frame_height)?;
        let detector = PoseDetector::new(&config.model_path, config.min_landmark_visibility)?;
        info!(camera = config.camera_id, model = %config.model_path.display(), "camera source ready");
        Ok(Self {
            camera,
            detector,
            started: Instant::now(),
        })
    }
}

impl PoseSource for CameraPoseSource {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>> {
        let frame = match self.camera.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                warn!("failed to retrieve frame");
                return Ok(None);
            }
            Err(error) => {
                warn!(%error, "failed to retrieve frame");
                return Ok(None);
            }
        };
        let elapsed_seconds = self.started.elapsed().as_secs_f64();

        let landmarks = match self.detector.detect(&frame) {
            Ok(landmarks) => landmarks,
            Err(error) => {
                warn!(error = %format!("{error:#}"), "pose detection failed for frame");
                Vec::new()
            }
        };

        Ok(Some(PoseFrame {
            elapsed_seconds,
            landmarks,
        }))
    }
}
