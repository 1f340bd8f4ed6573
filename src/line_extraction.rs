// src/line_extraction.rs

use crate::types::{HoughConfig, LineSegment};
use anyhow::Result;
use opencv::{
    core::{Mat, Vec4i, Vector},
    imgproc,
};
use tracing::debug;

/// Probabilistic Hough transform over a binary edge map.
/// Returns an empty vec when nothing reaches the accumulator threshold.
pub fn detect_segments(edges: &Mat, config: &HoughConfig) -> Result<Vec<LineSegment>> {
    let mut lines = Vector::<Vec4i>::new();
    imgproc::hough_lines_p(
        edges,
        &mut lines,
        config.rho,
        config.theta,
        config.threshold,
        config.min_line_length,
        config.max_line_gap,
    )?;

    let segments: Vec<LineSegment> = lines
        .iter()
        .map(|l| LineSegment::new(l[0], l[1], l[2], l[3]))
        .collect();

    debug!("Hough: {} raw segments", segments.len());
    Ok(segments)
}
