use crate::geometry::Point2D;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    pub index: usize,
    pub position: Point2D,
    pub visibility: f32,
}

/// Landmarks detected in one frame. An empty set means no person was found.
#[derive(Debug, Clone, Default)]
pub struct PoseFrame {
    pub elapsed_seconds: f64,
    pub landmarks: Vec<Landmark>,
}

pub trait PoseSource {
    /// `Ok(None)` marks end of stream.
    fn next_frame(&mut self) -> Result<Option<PoseFrame>>;
}

impl<S: PoseSource + ?Sized> PoseSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>> {
        (**self).next_frame()
    }
}

#[derive(Deserialize)]
struct ReplayLandmark {
    index: usize,
    x: f64,
    y: f64,
    #[serde(default = "full_visibility")]
    visibility: f32,
}

fn full_visibility() -> f32 {
    1.0
}

#[derive(Deserialize)]
struct ReplayLine {
    elapsed_seconds: f64,
    #[serde(default)]
    landmarks: Vec<ReplayLandmark>,
}

impl From<ReplayLine> for PoseFrame {
    fn from(line: ReplayLine) -> Self {
        Self {
            elapsed_seconds: line.elapsed_seconds,
            landmarks: line
                .landmarks
                .into_iter()
                .map(|lm| Landmark {
                    index: lm.index,
                    position: Point2D::new(lm.x, lm.y),
                    visibility: lm.visibility,
                })
                .collect(),
        }
    }
}

/// Plays back landmark frames recorded as JSON Lines.
pub struct ReplaySource<R: BufRead = BufReader<File>> {
    lines: Lines<R>,
    line_no: usize,
    finished: bool,
}

impl ReplaySource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("cannot open replay file {}", path.display()))?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            finished: false,
        }
    }
}

impl<R: BufRead> PoseSource for ReplaySource<R> {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>> {
        if self.finished {
            return Ok(None);
        }
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(error) => {
                    warn!(line = self.line_no, %error, "replay read failed, ending stream");
                    self.finished = true;
                    return Ok(None);
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            return match serde_json::from_str::<ReplayLine>(&line) {
                Ok(parsed) => Ok(Some(parsed.into())),
                Err(error) => {
                    warn!(line = self.line_no, %error, "malformed replay frame, ending stream");
                    self.finished = true;
                    Ok(None)
                }
            };
        }
        debug!(lines = self.line_no, "replay exhausted");
        self.finished = true;
        Ok(None)
    }
}
