// src/main.rs

mod compositor;
mod config;
mod driver;
mod lane_averaging;
mod line_extraction;
mod metrics;
mod pipeline;
mod preprocessing;
mod roi;
mod types;
mod video_processor;

use anyhow::{bail, Context, Result};
use pipeline::LanePipeline;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = types::Config::resolve(config_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lane_lines={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🛣️  Lane Line Detection Starting");
    info!(
        "Canny {}/{}, blur {}x{}, Hough rho={} threshold={} min_len={} max_gap={}",
        config.preprocess.canny_low,
        config.preprocess.canny_high,
        config.preprocess.blur_kernel,
        config.preprocess.blur_kernel,
        config.hough.rho,
        config.hough.threshold,
        config.hough.min_line_length,
        config.hough.max_line_gap
    );

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received, finishing current frame");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let pipeline = LanePipeline::new(config);
    let worker_cancel = Arc::clone(&cancel);
    let outcome = tokio::task::spawn_blocking(move || driver::run(&pipeline, &worker_cancel))
        .await
        .context("processing task panicked")?;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Processing failed: {:#}", e);
            return Err(e);
        }
    };

    let outputs = outcome
        .outputs
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");

    if outcome.cancelled {
        println!("⏹️  Processing cancelled. Partial output saved as {}", outputs);
    } else {
        println!("✅ Processing complete. Output video saved as {}", outputs);
    }

    if outcome.failed > 0 {
        bail!("{} video(s) failed to process", outcome.failed);
    }

    Ok(())
}
