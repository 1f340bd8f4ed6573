// src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub video: VideoConfig,
    pub preprocess: PreprocessConfig,
    pub roi: RoiConfig,
    pub hough: HoughConfig,
    pub averaging: AveragingConfig,
    pub overlay: OverlayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Video file, or a directory walked for video files
    pub input: String,
    /// Output file, or output directory when `input` is a directory
    pub output: String,
    pub fps: f64,
    pub fourcc: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            input: "solidWhiteRight.mp4".to_string(),
            output: "lane_detected_output.mp4".to_string(),
            fps: 20.0,
            fourcc: "mp4v".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub blur_kernel: i32,
    pub canny_low: f64,
    pub canny_high: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            canny_low: 50.0,
            canny_high: 150.0,
        }
    }
}

/// Region of interest as four vertices normalized to frame width/height.
/// Each vertex is `[x_fraction, y_fraction]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    pub bottom_left: [f64; 2],
    pub top_left: [f64; 2],
    pub top_right: [f64; 2],
    pub bottom_right: [f64; 2],
    pub fill_value: f64,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            bottom_left: [0.1, 1.0],
            top_left: [0.45, 0.6],
            top_right: [0.55, 0.6],
            bottom_right: [0.9, 1.0],
            fill_value: 255.0,
        }
    }
}

impl RoiConfig {
    pub fn vertices(&self) -> [[f64; 2]; 4] {
        [
            self.bottom_left,
            self.top_left,
            self.top_right,
            self.bottom_right,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    pub rho: f64,
    pub theta: f64,
    pub threshold: i32,
    pub min_line_length: f64,
    pub max_line_gap: f64,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            rho: 2.0,
            theta: std::f64::consts::PI / 180.0,
            threshold: 100,
            min_line_length: 40.0,
            max_line_gap: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AveragingConfig {
    /// Upper end of the drawn lines as a fraction of frame height
    pub horizon: f64,
    /// Averaged slopes flatter than this are treated as "no reliable fit"
    pub min_abs_slope: f64,
}

impl Default for AveragingConfig {
    fn default() -> Self {
        Self {
            horizon: 0.6,
            min_abs_slope: 1e-3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Line color in OpenCV channel order (B, G, R)
    pub color_bgr: [f64; 3],
    pub thickness: i32,
    pub frame_weight: f64,
    pub overlay_weight: f64,
    pub gamma: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            color_bgr: [255.0, 0.0, 0.0],
            thickness: 10,
            frame_weight: 0.8,
            overlay_weight: 1.0,
            gamma: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Raw Hough segment in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl LineSegment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

/// `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineParams {
    pub slope: f64,
    pub intercept: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LaneSide {
    Left,
    Right,
}

impl LaneSide {
    /// Image y grows downward, so the left boundary leans with negative slope.
    pub fn from_slope(slope: f64) -> Self {
        if slope < 0.0 {
            LaneSide::Left
        } else {
            LaneSide::Right
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LaneSide::Left => "left",
            LaneSide::Right => "right",
        }
    }
}

/// One averaged lane boundary, ready to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneLine {
    pub side: LaneSide,
    pub params: LineParams,
    pub segment: LineSegment,
}

/// At most one line per side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AveragedLines {
    pub left: Option<LaneLine>,
    pub right: Option<LaneLine>,
}

impl AveragedLines {
    /// Left first, then right.
    pub fn iter(&self) -> impl Iterator<Item = &LaneLine> {
        self.left.iter().chain(self.right.iter())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}
