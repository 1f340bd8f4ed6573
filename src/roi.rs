// src/roi.rs
//
// Trapezoidal region-of-interest mask. Assumes a centrally mounted camera
// with lanes converging near the horizontal midline.

use crate::types::RoiConfig;
use anyhow::Result;
use opencv::{
    core::{self, Mat, Point, Scalar, Vector},
    imgproc,
    prelude::*,
};

/// Pixel vertices (bottom-left, top-left, top-right, bottom-right),
/// truncated toward zero.
pub fn polygon(width: i32, height: i32, roi: &RoiConfig) -> [Point; 4] {
    roi.vertices()
        .map(|[fx, fy]| Point::new((fx * width as f64) as i32, (fy * height as f64) as i32))
}

/// Zero every pixel of `img` outside the configured quadrilateral.
pub fn apply(img: &Mat, roi: &RoiConfig) -> Result<Mat> {
    let pts = polygon(img.cols(), img.rows(), roi);

    let mut mask =
        Mat::new_rows_cols_with_default(img.rows(), img.cols(), img.typ(), Scalar::all(0.0))?;
    let mut polys = Vector::<Vector<Point>>::new();
    polys.push(Vector::from_iter(pts));
    imgproc::fill_poly(
        &mut mask,
        &polys,
        Scalar::all(roi.fill_value),
        imgproc::LINE_8,
        0,
        Point::new(0, 0),
    )?;

    let mut masked = Mat::default();
    core::bitwise_and(img, &mask, &mut masked, &Mat::default())?;
    Ok(masked)
}
