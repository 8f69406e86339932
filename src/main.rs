//! # DS4 Motion
//!
//! Replays recorded DualShock 4 input reports through the motion pipeline.
//!
//! The replay tool loads a calibration feature report and a capture of input
//! reports, decodes every report into a calibrated motion sample and logs the
//! samples as JSONL telemetry.

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use ds4_motion::capture::{load_calibration, ReportCapture};
use ds4_motion::config::Config;
use ds4_motion::motion::session::MotionSession;
use ds4_motion::motion::subscriber::ChannelSubscriber;
use ds4_motion::telemetry::{drain_blocking, TelemetryLogger};

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of reports between status log messages
const LOG_INTERVAL_REPORTS: u64 = 1000;

/// Replay period for a given report rate
fn replay_period(rate_hz: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(rate_hz.max(1)))
}

/// Main entry point for the DS4 Motion replay tool
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (first argument, or `config/default.toml`)
///    - Parse the calibration report and load the report capture
///    - Start the telemetry logger on a blocking thread
///
/// 2. **Main Loop**
///    - Process one report per tick at `replay_rate_hz`
///    - Skip malformed reports with a warning
///    - Stop at the end of the capture or on Ctrl+C
///
/// 3. **Shutdown**
///    - Close the telemetry channel and wait for the logger to flush
///
/// # Errors
///
/// Returns error if the configuration, calibration or capture cannot be
/// loaded, or if the telemetry logger fails.
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("DS4 Motion v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let mut session = MotionSession::new(config.capture.device_id.clone(), &config.motion)
        .context("Invalid motion configuration")?;

    match load_calibration(&config.capture.calibration_path)? {
        Some(bytes) => session
            .set_calibration(Some(&bytes))
            .context("Invalid calibration report")?,
        None => info!("No calibration configured, decoding raw motion values"),
    }

    let capture = ReportCapture::load(&config.capture.report_path, config.capture.report_size)?;

    let telemetry_task = if config.telemetry.enabled {
        let logger = TelemetryLogger::new(&config.telemetry)?;
        let (subscriber, rx) = ChannelSubscriber::new();
        session.subscribe(Box::new(subscriber));
        info!("Logging motion telemetry to {}", config.telemetry.log_dir);
        Some(tokio::task::spawn_blocking(move || drain_blocking(rx, logger)))
    } else {
        None
    };

    let mut report_interval = interval(replay_period(config.capture.replay_rate_hz));
    let mut reports = capture.reports();
    let mut processed: u64 = 0;
    let mut skipped: u64 = 0;

    info!(
        "Replaying {} reports at {}Hz",
        capture.len(),
        config.capture.replay_rate_hz
    );
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = report_interval.tick() => {
                let Some(report) = reports.next() else {
                    info!("End of capture reached");
                    break;
                };

                match session.process_report(report, Utc::now()) {
                    Ok(sample) => {
                        processed += 1;
                        debug!(
                            "t={}us gyro={:?} accel={:?}",
                            sample.timestamp_us(),
                            sample.gyro(),
                            sample.accel()
                        );

                        if processed % LOG_INTERVAL_REPORTS == 0 {
                            info!(
                                "Processed {} reports (controller time {:.3}s)",
                                processed,
                                sample.timestamp_us() as f64 / 1_000_000.0
                            );
                        }
                    }
                    Err(e) => {
                        skipped += 1;
                        warn!("Skipping report {}: {}", processed + skipped, e);
                    }
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    info!("Processed {} reports, skipped {}", processed, skipped);

    // Dropping the session drops the channel subscriber, ending the logger
    drop(session);
    if let Some(task) = telemetry_task {
        let written = task.await.context("Telemetry logger panicked")??;
        info!("Telemetry complete: {} events written", written);
    }

    Ok(())
}
