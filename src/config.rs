// src/config.rs

use crate::types::Config;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const CONFIG_ENV_VAR: &str = "LANE_LINES_CONFIG";

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path (argument or env var) must exist; the default path
    /// falls back to built-in defaults when absent.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        Self::resolve_with_default(explicit, Path::new(DEFAULT_CONFIG_PATH))
    }

    fn resolve_with_default(explicit: Option<PathBuf>, default_path: &Path) -> Result<Self> {
        let explicit = explicit.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        match explicit {
            Some(path) => Self::load(&path),
            None if default_path.exists() => Self::load(default_path),
            None => {
                info!("No {} found, using built-in defaults", default_path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.preprocess;
        if p.blur_kernel < 1 || p.blur_kernel % 2 == 0 {
            bail!("preprocess.blur_kernel must be odd and >= 1, got {}", p.blur_kernel);
        }
        if p.canny_low < 0.0 || p.canny_high < p.canny_low {
            bail!(
                "canny thresholds must satisfy 0 <= low <= high, got {}/{}",
                p.canny_low,
                p.canny_high
            );
        }

        for [x, y] in self.roi.vertices() {
            if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
                bail!("roi vertex ({}, {}) is outside the unit square", x, y);
            }
        }

        if !(0.0..=255.0).contains(&self.roi.fill_value) {
            bail!("roi.fill_value must be within [0, 255], got {}", self.roi.fill_value);
        }

        let h = &self.hough;
        if h.rho <= 0.0 || h.theta <= 0.0 {
            bail!("hough.rho and hough.theta must be positive");
        }
        if h.threshold < 1 {
            bail!("hough.threshold must be >= 1, got {}", h.threshold);
        }
        if h.min_line_length < 0.0 || h.max_line_gap < 0.0 {
            bail!(
                "hough.min_line_length and hough.max_line_gap must be non-negative, got {}/{}",
                h.min_line_length,
                h.max_line_gap
            );
        }

        let a = &self.averaging;
        if !(0.0..=1.0).contains(&a.horizon) {
            bail!("averaging.horizon must be within [0, 1], got {}", a.horizon);
        }
        if a.min_abs_slope < 0.0 {
            bail!("averaging.min_abs_slope must be non-negative");
        }

        if self.overlay.thickness < 1 {
            bail!("overlay.thickness must be >= 1, got {}", self.overlay.thickness);
        }

        let v = &self.video;
        if v.fps <= 0.0 {
            bail!("video.fps must be positive, got {}", v.fps);
        }
        if v.fourcc.chars().count() != 4 {
            bail!("video.fourcc must be exactly four characters, got {:?}", v.fourcc);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_reference_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.preprocess.blur_kernel, 5);
        assert_eq!(config.preprocess.canny_low, 50.0);
        assert_eq!(config.preprocess.canny_high, 150.0);
        assert_eq!(config.hough.threshold, 100);
        assert_eq!(config.hough.rho, 2.0);
        assert_eq!(config.video.fps, 20.0);
        assert_eq!(config.video.fourcc, "mp4v");
        assert_eq!(config.roi.top_left, [0.45, 0.6]);
        assert_eq!(config.overlay.thickness, 10);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let yaml = "preprocess:\n  canny_low: 30\nvideo:\n  input: clips/\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.preprocess.canny_low, 30.0);
        assert_eq!(config.preprocess.canny_high, 150.0);
        assert_eq!(config.video.input, "clips/");
        assert_eq!(config.video.output, "lane_detected_output.mp4");
    }

    #[test]
    fn test_rejects_even_kernel() {
        let err = Config::from_yaml("preprocess:\n  blur_kernel: 4\n").unwrap_err();
        assert!(err.to_string().contains("blur_kernel"));
    }

    #[test]
    fn test_rejects_inverted_canny() {
        assert!(Config::from_yaml("preprocess:\n  canny_low: 200\n  canny_high: 100\n").is_err());
    }

    #[test]
    fn test_rejects_roi_outside_frame() {
        assert!(Config::from_yaml("roi:\n  top_left: [1.2, 0.6]\n").is_err());
    }

    #[test]
    fn test_rejects_bad_fourcc() {
        assert!(Config::from_yaml("video:\n  fourcc: mp4\n").is_err());
    }

    #[test]
    fn test_rejects_negative_hough_lengths() {
        assert!(Config::from_yaml("hough:\n  min_line_length: -1\n").is_err());
        assert!(Config::from_yaml("hough:\n  max_line_gap: -5\n").is_err());
        assert!(Config::from_yaml("hough:\n  max_line_gap: 0\n").is_ok());
    }

    #[test]
    fn test_rejects_fill_value_outside_u8() {
        assert!(Config::from_yaml("roi:\n  fill_value: 300\n").is_err());
        assert!(Config::from_yaml("roi:\n  fill_value: -1\n").is_err());
        assert!(Config::from_yaml("roi:\n  fill_value: 128\n").is_ok());
    }

    #[test]
    fn test_env_var_then_default_fallback() {
        let dir = PathBuf::from("target/test-out/config");
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("from_env.yaml");
        fs::write(&file, "preprocess:\n  canny_low: 42\n").unwrap();
        let no_default = dir.join("absent.yaml");

        std::env::set_var(CONFIG_ENV_VAR, &file);
        let from_env = Config::resolve_with_default(None, &no_default);
        std::env::set_var(CONFIG_ENV_VAR, dir.join("missing.yaml"));
        let missing = Config::resolve_with_default(None, &no_default);
        std::env::remove_var(CONFIG_ENV_VAR);
        let fallback = Config::resolve_with_default(None, &no_default);

        assert_eq!(from_env.unwrap().preprocess.canny_low, 42.0);
        assert!(missing.is_err());
        let fallback = fallback.unwrap();
        assert_eq!(fallback.preprocess.canny_low, 50.0);
        assert_eq!(fallback.video.input, "solidWhiteRight.mp4");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let missing = PathBuf::from("definitely/not/here.yaml");
        assert!(Config::resolve(Some(missing)).is_err());
    }
}
