// src/driver.rs
//
// Frame loop: read -> process -> write until the source is exhausted or
// the run is cancelled. One frame is fully written before the next read.

use crate::metrics::{RunMetrics, RunStats};
use crate::pipeline::LanePipeline;
use crate::video_processor::{
    batch_output_path, find_video_files, AnnotatedWriter, FrameSink, FrameSource, VideoReader,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

const PROGRESS_EVERY: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Stopped,
}

/// Drive `source` through `pipeline` into `sink`. The sink is finished on
/// every exit path; a read returning `None` is normal termination.
pub fn run_stream<S, K>(
    source: &mut S,
    sink: &mut K,
    pipeline: &LanePipeline,
    cancel: &AtomicBool,
) -> Result<RunStats>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    let mut metrics = RunMetrics::new();
    let mut cancelled = false;

    let outcome = (|| -> Result<()> {
        let mut state = DriverState::Running;
        let total = source.total_frames();

        while state == DriverState::Running {
            if cancel.load(Ordering::Relaxed) {
                info!(
                    "Cancellation requested, stopping after {} frames",
                    metrics.total_frames
                );
                cancelled = true;
                state = DriverState::Stopped;
                continue;
            }

            let Some(frame) = source.next_frame()? else {
                debug!("End of stream after {} frames", metrics.total_frames);
                state = DriverState::Stopped;
                continue;
            };

            let index = metrics.total_frames;
            let result = pipeline
                .process(&frame)
                .with_context(|| format!("processing frame {}", index))?;
            sink.write_frame(&result.frame)
                .with_context(|| format!("writing frame {}", index))?;
            metrics.record(&result);

            if metrics.total_frames % PROGRESS_EVERY == 0 {
                match total {
                    Some(n) => info!(
                        "Progress: {}/{} frames ({:.1}%), {:.1} FPS",
                        metrics.total_frames,
                        n,
                        100.0 * metrics.total_frames as f64 / n as f64,
                        metrics.fps()
                    ),
                    None => info!(
                        "Progress: {} frames, {:.1} FPS",
                        metrics.total_frames,
                        metrics.fps()
                    ),
                }
            }
        }
        Ok(())
    })();

    let finished = sink.finish();
    outcome?;
    finished.context("closing output")?;

    Ok(metrics.summary(cancelled))
}

/// Single video file in, single annotated video out.
pub fn run_video(
    input: &Path,
    output: &Path,
    pipeline: &LanePipeline,
    cancel: &AtomicBool,
) -> Result<RunStats> {
    let video = &pipeline.config().video;

    let mut reader = VideoReader::open(input)?;
    debug!(
        "Source reports {:.1} FPS, writing at {:.1} FPS",
        reader.fps(),
        video.fps
    );
    let mut writer =
        AnnotatedWriter::create(output, &video.fourcc, video.fps, reader.frame_size())?;

    let stats = run_stream(&mut reader, &mut writer, pipeline, cancel)?;

    info!("✓ {} processed", input.display());
    info!("  Total frames: {}", stats.total_frames);
    info!(
        "  Left line: {} frames ({:.1}%), right line: {} frames ({:.1}%)",
        stats.frames_with_left,
        stats.left_ratio(),
        stats.frames_with_right,
        stats.right_ratio()
    );
    info!("  Raw Hough segments: {}", stats.raw_segments);
    info!(
        "  Processing Speed: {:.1} FPS ({:.1}s)",
        stats.avg_fps, stats.elapsed_secs
    );

    Ok(stats)
}

pub struct BatchOutcome {
    pub outputs: Vec<PathBuf>,
    pub failed: usize,
    pub cancelled: bool,
}

/// Process `video.input`: a single file, or every video under a directory.
pub fn run(pipeline: &LanePipeline, cancel: &AtomicBool) -> Result<BatchOutcome> {
    let video = &pipeline.config().video;
    let input = Path::new(&video.input);
    let output = Path::new(&video.output);

    if !input.is_dir() {
        let stats = run_video(input, output, pipeline, cancel)?;
        return Ok(BatchOutcome {
            outputs: vec![output.to_path_buf()],
            failed: 0,
            cancelled: stats.cancelled,
        });
    }

    let videos = find_video_files(input)?;
    let mut outcome = BatchOutcome {
        outputs: Vec::new(),
        failed: 0,
        cancelled: false,
    };

    for (idx, path) in videos.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            outcome.cancelled = true;
            break;
        }

        info!("Processing video {}/{}: {}", idx + 1, videos.len(), path.display());
        let target = batch_output_path(path, output);
        match run_video(path, &target, pipeline, cancel) {
            Ok(stats) => {
                outcome.outputs.push(target);
                if stats.cancelled {
                    outcome.cancelled = true;
                    break;
                }
            }
            Err(e) => {
                error!("Failed to process {}: {:#}", path.display(), e);
                outcome.failed += 1;
            }
        }
    }

    Ok(outcome)
}
