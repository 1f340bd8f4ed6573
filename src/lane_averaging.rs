// src/lane_averaging.rs
//
// Collapses raw Hough segments into at most one line per lane side.
//
// Policy for degenerate fits:
//   - vertical segments (x1 == x2) have no slope/intercept form and are dropped
//   - a side whose mean slope is flatter than `min_abs_slope` (or not finite)
//     is omitted
//   - a side whose reconstructed x does not fit in i32 is omitted

use crate::types::{AveragedLines, AveragingConfig, LaneLine, LaneSide, LineParams, LineSegment};
use tracing::{debug, warn};

/// First-degree least-squares fit, centered form.
/// `None` when the x values have no spread.
pub fn fit_points(points: &[(f64, f64)]) -> Option<LineParams> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(LineParams {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

pub fn fit_segment(segment: &LineSegment) -> Option<LineParams> {
    fit_points(&[
        (segment.x1 as f64, segment.y1 as f64),
        (segment.x2 as f64, segment.y2 as f64),
    ])
}

/// Arithmetic mean of slope and intercept, independently.
pub fn mean_params(params: &[LineParams]) -> Option<LineParams> {
    if params.is_empty() {
        return None;
    }
    let n = params.len() as f64;
    Some(LineParams {
        slope: params.iter().map(|p| p.slope).sum::<f64>() / n,
        intercept: params.iter().map(|p| p.intercept).sum::<f64>() / n,
    })
}

/// Endpoints spanning from the bottom of the frame up to `horizon * height`.
pub fn make_coordinates(
    params: &LineParams,
    frame_height: i32,
    config: &AveragingConfig,
) -> Option<LineSegment> {
    if !params.slope.is_finite()
        || !params.intercept.is_finite()
        || params.slope == 0.0
        || params.slope.abs() < config.min_abs_slope
    {
        return None;
    }

    let y1 = frame_height;
    let y2 = (frame_height as f64 * config.horizon) as i32;
    let x1 = x_at(params, y1)?;
    let x2 = x_at(params, y2)?;
    Some(LineSegment::new(x1, y1, x2, y2))
}

fn x_at(params: &LineParams, y: i32) -> Option<i32> {
    let x = (y as f64 - params.intercept) / params.slope;
    if x.is_finite() && x >= i32::MIN as f64 && x <= i32::MAX as f64 {
        Some(x as i32)
    } else {
        None
    }
}

/// Split fitted segments by slope sign and reduce each side to one line.
pub fn average_slope_intercept(
    segments: &[LineSegment],
    frame_height: i32,
    config: &AveragingConfig,
) -> AveragedLines {
    let mut left_fit = Vec::new();
    let mut right_fit = Vec::new();

    for segment in segments {
        let Some(params) = fit_segment(segment) else {
            debug!("Skipping vertical segment {:?}", segment);
            continue;
        };
        match LaneSide::from_slope(params.slope) {
            LaneSide::Left => left_fit.push(params),
            LaneSide::Right => right_fit.push(params),
        }
    }

    AveragedLines {
        left: reduce_side(LaneSide::Left, &left_fit, frame_height, config),
        right: reduce_side(LaneSide::Right, &right_fit, frame_height, config),
    }
}

fn reduce_side(
    side: LaneSide,
    fits: &[LineParams],
    frame_height: i32,
    config: &AveragingConfig,
) -> Option<LaneLine> {
    let params = mean_params(fits)?;
    match make_coordinates(&params, frame_height, config) {
        Some(segment) => Some(LaneLine {
            side,
            params,
            segment,
        }),
        None => {
            warn!(
                "Omitting {} line: degenerate fit (slope={:.6}, intercept={:.2}, n={})",
                side.as_str(),
                params.slope,
                params.intercept,
                fits.len()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn cfg() -> AveragingConfig {
        AveragingConfig::default()
    }

    #[test]
    fn test_fit_two_points() {
        let p = fit_segment(&LineSegment::new(0, 10, 100, -40)).unwrap();
        assert!((p.slope + 0.5).abs() < EPS);
        assert!((p.intercept - 10.0).abs() < EPS);
    }

    #[test]
    fn test_fit_vertical_segment_is_none() {
        assert!(fit_segment(&LineSegment::new(50, 0, 50, 100)).is_none());
    }

    #[test]
    fn test_fit_many_points_least_squares() {
        // slope = Sxy / Sxx = 9 / 5
        let pts = [(0.0, 1.5), (1.0, 2.5), (2.0, 5.5), (3.0, 6.5)];
        let p = fit_points(&pts).unwrap();
        assert!((p.slope - 1.8).abs() < EPS);
        assert!((p.intercept - 1.3).abs() < EPS);
    }

    #[test]
    fn test_mean_of_two_left_lines() {
        let segments = [
            LineSegment::new(10, -10, 110, -110), // slope -1.0, intercept 0
            LineSegment::new(0, 10, 100, -40),    // slope -0.5, intercept 10
        ];
        let lines = average_slope_intercept(&segments, 480, &cfg());
        let left = lines.left.unwrap();
        assert!((left.params.slope + 0.75).abs() < EPS);
        assert!((left.params.intercept - 5.0).abs() < EPS);
        assert!(lines.right.is_none());
    }

    #[test]
    fn test_single_segment_reconstructs_same_slope() {
        let seg = LineSegment::new(400, 300, 500, 400); // slope 1.0
        let lines = average_slope_intercept(&[seg], 480, &cfg());
        assert!(lines.left.is_none());
        let right = lines.right.unwrap().segment;

        assert_eq!(right.y1, 480);
        assert_eq!(right.y2, 288);
        let slope = (right.y2 - right.y1) as f64 / (right.x2 - right.x1) as f64;
        assert!((slope - 1.0).abs() < 1e-6);
        assert_eq!(right.x1, 580);
        assert_eq!(right.x2, 388);
    }

    #[test]
    fn test_coordinates_truncate_toward_zero() {
        let params = LineParams {
            slope: -1.5,
            intercept: 700.0,
        };
        let seg = make_coordinates(&params, 480, &cfg()).unwrap();
        // (480 - 700) / -1.5 = 146.67, (288 - 700) / -1.5 = 274.67
        assert_eq!(seg, LineSegment::new(146, 480, 274, 288));
    }

    #[test]
    fn test_zero_slope_side_is_omitted() {
        let segments = [
            LineSegment::new(0, 300, 200, 300), // horizontal, classified right
            LineSegment::new(100, 400, 200, 300),
        ];
        let lines = average_slope_intercept(&segments, 480, &cfg());
        assert!(lines.right.is_none());
        assert!(lines.left.is_some());
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_nearly_flat_side_is_omitted() {
        let params = LineParams {
            slope: 1e-5,
            intercept: 10.0,
        };
        assert!(make_coordinates(&params, 480, &cfg()).is_none());
    }

    #[test]
    fn test_no_segments_no_lines() {
        let lines = average_slope_intercept(&[], 480, &cfg());
        assert!(lines.is_empty());
        assert_eq!(lines.iter().count(), 0);
    }

    #[test]
    fn test_sides_never_mix() {
        // Deterministic LCG so the check covers many arbitrary segment sets
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move |m: i32| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) % m as u64) as i32
        };

        for _ in 0..200 {
            let count = 1 + next(12) as usize;
            let segments: Vec<LineSegment> = (0..count)
                .map(|_| LineSegment::new(next(640), next(480), next(640), next(480)))
                .collect();

            let fits: Vec<LineParams> = segments.iter().filter_map(fit_segment).collect();
            let left: Vec<LineParams> =
                fits.iter().copied().filter(|p| p.slope < 0.0).collect();
            let right: Vec<LineParams> =
                fits.iter().copied().filter(|p| p.slope >= 0.0).collect();

            let lines = average_slope_intercept(&segments, 480, &cfg());
            if let Some(l) = lines.left {
                assert_eq!(l.side, LaneSide::Left);
                assert!(l.params.slope < 0.0);
                assert_eq!(Some(l.params), mean_params(&left));
            }
            if let Some(r) = lines.right {
                assert_eq!(r.side, LaneSide::Right);
                assert!(r.params.slope >= 0.0);
                assert_eq!(Some(r.params), mean_params(&right));
            }
        }
    }
}
