// src/pipeline.rs
//
// Per-frame lane pipeline: edges -> ROI -> Hough -> averaging -> overlay.
// `process` takes `&self` and holds no per-frame state, so frames can be
// processed in any order with identical results.

use crate::compositor;
use crate::lane_averaging;
use crate::line_extraction;
use crate::preprocessing;
use crate::roi;
use crate::types::{AveragedLines, Config};
use anyhow::{Context, Result};
use opencv::{core::Mat, prelude::*};
use tracing::debug;

pub struct FrameResult {
    pub frame: Mat,
    pub raw_segments: usize,
    pub lines: AveragedLines,
}

#[derive(Debug, Clone)]
pub struct LanePipeline {
    config: Config,
}

impl LanePipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Raw segment count and averaged lines for a BGR frame.
    pub fn detect(&self, frame: &Mat) -> Result<(usize, AveragedLines)> {
        let edges = preprocessing::edge_map(frame, &self.config.preprocess)
            .context("edge detection")?;
        let cropped = roi::apply(&edges, &self.config.roi).context("roi mask")?;
        let segments = line_extraction::detect_segments(&cropped, &self.config.hough)
            .context("hough transform")?;
        let lines = lane_averaging::average_slope_intercept(
            &segments,
            frame.rows(),
            &self.config.averaging,
        );
        Ok((segments.len(), lines))
    }

    /// Detect lane lines and return the annotated copy. `frame` is not modified.
    pub fn process(&self, frame: &Mat) -> Result<FrameResult> {
        let (raw_segments, lines) = self.detect(frame)?;

        if lines.is_empty() {
            debug!("Frame: {} segments, no lane lines", raw_segments);
        } else {
            debug!(
                "Frame: {} segments -> {} lane line(s) (left={}, right={})",
                raw_segments,
                lines.len(),
                lines.left.is_some(),
                lines.right.is_some()
            );
        }

        let combo = compositor::compose(frame, &lines, &self.config.overlay).context("overlay")?;

        Ok(FrameResult {
            frame: combo,
            raw_segments,
            lines,
        })
    }
}
