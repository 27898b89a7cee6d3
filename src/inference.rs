use crate::geometry::Point2D;
use crate::source::Landmark;
use anyhow::{Context, Result};
use opencv::core::{Mat, MatTraitConst, Size};
use opencv::imgproc;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use tracing::info;

const DEFAULT_INPUT_SIZE: usize = 256;

pub struct PoseDetector {
    session: Session,
    input_width: usize,
    input_height: usize,
    min_visibility: f32,
}

impl PoseDetector {
    pub fn new(model_path: &Path, min_visibility: f32) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!("model file not found at {}", model_path.display());
        }

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load pose model {}", model_path.display()))?;

        let (input_width, input_height) = Self::input_dimensions(&session);
        info!(input_width, input_height, "pose model loaded");

        Ok(Self {
            session,
            input_width,
            input_height,
            min_visibility,
        })
    }

    // NCHW; dynamic or missing dims fall back to the BlazePose default.
    fn input_dimensions(session: &Session) -> (usize, usize) {
        session
            .inputs
            .first()
            .and_then(|input| input.input_type.tensor_dimensions())
            .filter(|dims| dims.len() >= 4 && dims[2] > 0 && dims[3] > 0)
            .map(|dims| (dims[3] as usize, dims[2] as usize))
            .unwrap_or((DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE))
    }

    /// Landmarks in frame pixel coordinates; empty when the model finds nobody
    /// above `min_visibility`.
    pub fn detect(&self, frame: &Mat) -> Result<Vec<Landmark>> {
        let input = self.preprocess(frame)?;
        let outputs = self.session.run(ort::inputs![input]?)?;
        let output = outputs
            .values()
            .next()
            .ok_or_else(|| anyhow::anyhow!("pose model produced no outputs"))?;
        let (shape, data) = output.try_extract_raw_tensor::<f32>()?;

        Ok(Self::postprocess(
            &shape,
            data,
            frame.cols() as f64,
            frame.rows() as f64,
            self.min_visibility,
        ))
    }

    fn preprocess(&self, frame: &Mat) -> Result<Tensor<f32>> {
        let mut rgb = Mat::default();
        imgproc::cvt_color(frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let mut resized = Mat::default();
        imgproc::resize(
            &rgb,
            &mut resized,
            Size::new(self.input_width as i32, self.input_height as i32),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        let pixels = resized.data_bytes()?;
        let (h, w) = (self.input_height, self.input_width);
        let plane = h * w;
        let mut data = vec![0.0f32; 3 * plane];
        for (idx, rgb) in pixels.chunks_exact(3).take(plane).enumerate() {
            data[idx] = f32::from(rgb[0]) / 255.0;
            data[plane + idx] = f32::from(rgb[1]) / 255.0;
            data[2 * plane + idx] = f32::from(rgb[2]) / 255.0;
        }

        Ok(Tensor::from_array(([1usize, 3, h, w], data.into_boxed_slice()))?)
    }

    // Output is [1, landmarks, values] with normalized x, y and optional
    // z and visibility.
    fn postprocess(
        shape: &[i64],
        data: &[f32],
        frame_width: f64,
        frame_height: f64,
        min_visibility: f32,
    ) -> Vec<Landmark> {
        if shape.len() < 3 || shape[2] < 2 {
            return Vec::new();
        }
        let count = shape[1].max(0) as usize;
        let stride = shape[2] as usize;

        data.chunks_exact(stride)
            .take(count)
            .enumerate()
            .map(|(index, values)| Landmark {
                index,
                position: Point2D::new(
                    f64::from(values[0]) * frame_width,
                    f64::from(values[1]) * frame_height,
                ),
                visibility: values.get(3).copied().unwrap_or(1.0),
            })
            .filter(|lm| lm.visibility >= min_visibility)
            .collect()
    }
}
