// src/compositor.rs

use crate::types::{AveragedLines, OverlayConfig};
use anyhow::Result;
use opencv::{
    core::{self, Mat, Point, Scalar},
    imgproc,
    prelude::*,
};

/// Blank canvas the size and type of `frame` with every lane line drawn on it.
pub fn draw_lines(frame: &Mat, lines: &AveragedLines, config: &OverlayConfig) -> Result<Mat> {
    let mut canvas =
        Mat::new_rows_cols_with_default(frame.rows(), frame.cols(), frame.typ(), Scalar::all(0.0))?;

    let [b, g, r] = config.color_bgr;
    let color = Scalar::new(b, g, r, 0.0);

    for line in lines.iter() {
        let s = line.segment;
        imgproc::line(
            &mut canvas,
            Point::new(s.x1, s.y1),
            Point::new(s.x2, s.y2),
            color,
            config.thickness,
            imgproc::LINE_8,
            0,
        )?;
    }

    Ok(canvas)
}

/// `frame_weight * frame + overlay_weight * canvas + gamma`, saturated to u8.
pub fn blend(frame: &Mat, canvas: &Mat, config: &OverlayConfig) -> Result<Mat> {
    let mut combo = Mat::default();
    core::add_weighted(
        frame,
        config.frame_weight,
        canvas,
        config.overlay_weight,
        config.gamma,
        &mut combo,
        -1,
    )?;
    Ok(combo)
}

pub fn compose(frame: &Mat, lines: &AveragedLines, config: &OverlayConfig) -> Result<Mat> {
    let canvas = draw_lines(frame, lines, config)?;
    blend(frame, &canvas, config)
}
