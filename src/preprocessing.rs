// src/preprocessing.rs

use crate::types::PreprocessConfig;
use anyhow::{bail, Result};
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};

/// BGR frame -> single-channel luma
pub fn grayscale(frame: &Mat) -> Result<Mat> {
    if frame.channels() != 3 {
        bail!("expected a 3-channel BGR frame, got {} channels", frame.channels());
    }
    let mut gray = Mat::default();
    imgproc::cvt_color_def(frame, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}

/// Square odd kernel, sigma derived from the kernel size
pub fn gaussian_blur(img: &Mat, kernel_size: i32) -> Result<Mat> {
    let mut blurred = Mat::default();
    imgproc::gaussian_blur_def(
        img,
        &mut blurred,
        core::Size::new(kernel_size, kernel_size),
        0.0,
    )?;
    Ok(blurred)
}

/// Binary (0/255) edge map
pub fn canny(img: &Mat, low_threshold: f64, high_threshold: f64) -> Result<Mat> {
    let mut edges = Mat::default();
    imgproc::canny_def(img, &mut edges, low_threshold, high_threshold)?;
    Ok(edges)
}

/// Grayscale, blur and edge-detect a color frame. The input is left untouched.
pub fn edge_map(frame: &Mat, config: &PreprocessConfig) -> Result<Mat> {
    let gray = grayscale(frame)?;
    let blurred = gaussian_blur(&gray, config.blur_kernel)?;
    canny(&blurred, config.canny_low, config.canny_high)
}
