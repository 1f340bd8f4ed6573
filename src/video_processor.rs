// src/video_processor.rs

use anyhow::{bail, Context, Result};
use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTraitConst, VideoWriter},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

/// Sequential frame producer. `Ok(None)` marks end of stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Mat>>;
    fn frame_size(&self) -> core::Size;
    fn fps(&self) -> f64;
    /// Container-reported frame count, when known
    fn total_frames(&self) -> Option<u64> {
        None
    }
}

/// Sequential frame consumer.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &Mat) -> Result<()>;
    /// Flush and release the underlying handle. Idempotent.
    fn finish(&mut self) -> Result<()>;
}

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively collect video files under `dir`, sorted by path.
pub fn find_video_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let mut videos: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_video_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    videos.sort();

    info!("Found {} video files in {}", videos.len(), dir.display());
    Ok(videos)
}

/// `<output_dir>/<stem>_lanes.mp4`
pub fn batch_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    output_dir.join(format!("{}_lanes.mp4", stem))
}

pub struct VideoReader {
    cap: VideoCapture,
    fps: f64,
    total_frames: i32,
    width: i32,
    height: i32,
}

impl VideoReader {
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening video: {}", path.display());

        let path_str = path
            .to_str()
            .with_context(|| format!("non UTF-8 path {}", path.display()))?;
        let cap = VideoCapture::from_file(path_str, videoio::CAP_ANY)
            .with_context(|| format!("opening {}", path.display()))?;

        if !cap.is_opened()? {
            bail!("Failed to open video file {}", path.display());
        }

        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)?;
        let total_frames = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_COUNT)? as i32;
        let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)? as i32;

        info!(
            "Video properties: {}x{} @ {:.1} FPS, {} frames",
            width, height, fps, total_frames
        );

        Ok(Self {
            cap,
            fps,
            total_frames,
            width,
            height,
        })
    }
}

impl FrameSource for VideoReader {
    fn next_frame(&mut self) -> Result<Option<Mat>> {
        use opencv::videoio::VideoCaptureTrait;

        let mut mat = Mat::default();

        // a failed grab is end of stream, not an error
        let grabbed = match VideoCaptureTrait::read(&mut self.cap, &mut mat) {
            Ok(grabbed) => grabbed,
            Err(e) => {
                warn!("Frame read failed, treating as end of stream: {}", e);
                false
            }
        };
        if !grabbed || mat.empty() {
            return Ok(None);
        }

        Ok(Some(mat))
    }

    fn frame_size(&self) -> core::Size {
        core::Size::new(self.width, self.height)
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn total_frames(&self) -> Option<u64> {
        u64::try_from(self.total_frames).ok().filter(|&n| n > 0)
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        use opencv::videoio::VideoCaptureTrait;

        if let Err(e) = VideoCaptureTrait::release(&mut self.cap) {
            warn!("Failed to release video source: {}", e);
        }
    }
}

pub struct AnnotatedWriter {
    writer: VideoWriter,
    path: PathBuf,
    size: core::Size,
    frames_written: u64,
    finished: bool,
}

impl AnnotatedWriter {
    pub fn create(path: &Path, fourcc: &str, fps: f64, size: core::Size) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let code: Vec<char> = fourcc.chars().collect();
        let &[a, b, c, d] = code.as_slice() else {
            bail!("fourcc must be four characters, got {:?}", fourcc);
        };
        let fourcc = VideoWriter::fourcc(a, b, c, d)?;

        let path_str = path
            .to_str()
            .with_context(|| format!("non UTF-8 path {}", path.display()))?;
        let writer = VideoWriter::new(path_str, fourcc, fps, size, true)
            .with_context(|| format!("creating writer {}", path.display()))?;

        if !writer.is_opened()? {
            bail!("Failed to open video writer {}", path.display());
        }

        info!(
            "Output video: {} ({}x{} @ {:.1} FPS)",
            path.display(),
            size.width,
            size.height,
            fps
        );

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            size,
            frames_written: 0,
            finished: false,
        })
    }
}

impl FrameSink for AnnotatedWriter {
    fn write_frame(&mut self, frame: &Mat) -> Result<()> {
        if self.finished {
            bail!("write to closed writer {}", self.path.display());
        }
        let size = frame.size()?;
        if size != self.size {
            bail!(
                "frame size {}x{} does not match writer {}x{}",
                size.width,
                size.height,
                self.size.width,
                self.size.height
            );
        }
        self.writer
            .write(frame)
            .with_context(|| format!("writing frame to {}", self.path.display()))?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.writer.release()?;
        debug!(
            "Closed {} after {} frames",
            self.path.display(),
            self.frames_written
        );
        Ok(())
    }
}

impl Drop for AnnotatedWriter {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            warn!("Failed to release video sink: {}", e);
        }
    }
}
