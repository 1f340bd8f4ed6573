// src/metrics.rs
//
// Per-run counters, logged when a video finishes.

use crate::pipeline::FrameResult;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct RunMetrics {
    pub total_frames: u64,
    pub frames_with_left: u64,
    pub frames_with_right: u64,
    pub raw_segments: u64,
    pub started_at: Instant,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: 0,
            frames_with_left: 0,
            frames_with_right: 0,
            raw_segments: 0,
            started_at: Instant::now(),
        }
    }

    pub fn record(&mut self, result: &FrameResult) {
        self.total_frames += 1;
        self.raw_segments += result.raw_segments as u64;
        if result.lines.left.is_some() {
            self.frames_with_left += 1;
        }
        if result.lines.right.is_some() {
            self.frames_with_right += 1;
        }
    }

    pub fn fps(&self) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            self.total_frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self, cancelled: bool) -> RunStats {
        RunStats {
            total_frames: self.total_frames,
            frames_with_left: self.frames_with_left,
            frames_with_right: self.frames_with_right,
            raw_segments: self.raw_segments,
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
            avg_fps: self.fps(),
            cancelled,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RunStats {
    pub total_frames: u64,
    pub frames_with_left: u64,
    pub frames_with_right: u64,
    pub raw_segments: u64,
    pub elapsed_secs: f64,
    pub avg_fps: f64,
    pub cancelled: bool,
}

impl RunStats {
    pub fn left_ratio(&self) -> f64 {
        100.0 * self.frames_with_left as f64 / self.total_frames.max(1) as f64
    }

    pub fn right_ratio(&self) -> f64 {
        100.0 * self.frames_with_right as f64 / self.total_frames.max(1) as f64
    }
}
