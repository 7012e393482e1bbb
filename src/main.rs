// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Proctorwatch - Real-Time Proctoring Monitor
//!
//! Runs a headless monitoring session against the simulated camera and
//! detection model, then writes the integrity report.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::FmtSubscriber;

use proctorwatch::capture::SimulatedCamera;
use proctorwatch::core::follow;
use proctorwatch::detection::SimulatedDetector;
use proctorwatch::report::{ExportFormat, ReportExporter};
use proctorwatch::{Config, Monitor, ProctorError, VERSION};

/// Proctorwatch - Real-Time Proctoring Monitor
#[derive(Parser, Debug)]
#[command(name = "proctorwatch")]
#[command(version = VERSION)]
#[command(about = "Real-time proctoring monitor with integrity scoring")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Candidate name for the report
    #[arg(long)]
    candidate: Option<String>,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    duration: Option<u64>,

    /// Report output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Seed for the simulated detector
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);

    // Config IO logs at the flag level until the configured level is known
    let bootstrap = subscriber(
        flag_level(args.trace, args.debug).unwrap_or(Level::INFO),
        args.debug,
        std::io::stdout,
    );
    let mut config =
        tracing::subscriber::with_default(bootstrap, || Config::load_or_create(&config_path))?;

    // Initialize logging
    let log_level = flag_level(args.trace, args.debug)
        .unwrap_or_else(|| config.log_level.parse().unwrap_or(Level::INFO));
    tracing::subscriber::set_global_default(subscriber(log_level, args.debug, std::io::stdout))?;

    info!("Proctorwatch v{}", VERSION);
    info!("Configuration loaded from {:?}", config_path);

    // Override with command line args
    if let Some(name) = args.candidate {
        config.candidate_name = name;
    }
    if let Some(dir) = args.output {
        config.report.output_dir = dir;
    }
    if let Some(format) = args.format {
        config.report.format = format.into();
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_headless(config, args.duration))
}

/// Level forced by `--trace` / `--debug`, if any
fn flag_level(trace: bool, debug: bool) -> Option<Level> {
    if trace {
        Some(Level::TRACE)
    } else if debug {
        Some(Level::DEBUG)
    } else {
        None
    }
}

fn subscriber<W>(level: Level, debug: bool, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug)
        .with_ansi(true)
        .with_writer(writer)
        .finish()
}

/// Monitor until the deadline or Ctrl+C, then export the report
async fn run_headless(config: Config, duration: Option<u64>) -> Result<()> {
    let camera = Arc::new(
        SimulatedCamera::new(&config.camera.device, config.camera.width, config.camera.height)
            .with_warmup(Duration::from_millis(config.camera.warmup_ms))
            .with_denied_access(config.camera.deny_access),
    );
    let detector = Arc::new(SimulatedDetector::new(config.simulation.clone()));

    let report_config = config.report.clone();
    let mut monitor = Monitor::new(config, camera, detector);

    match monitor.start().await {
        Ok(()) => {}
        Err(ProctorError::CaptureDenied) => {
            warn!("Camera access was denied; monitoring did not start");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    // Live event feed, standing in for the UI log panel
    if let Some(events) = monitor.subscribe() {
        tokio::spawn(follow(events, |event| {
            info!("[{}] {}", event.timestamp.format("%H:%M:%S"), event.message());
        }));
    }

    match duration {
        Some(secs) => {
            info!("Monitoring for {} seconds", secs);
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                _ = tokio::signal::ctrl_c() => info!("Interrupted"),
            }
        }
        None => {
            info!("Monitoring, press Ctrl+C to finish");
            tokio::signal::ctrl_c().await?;
        }
    }

    monitor.stop().await;

    let state = monitor.state();
    info!(
        "Sampler: {} ticks, {} cycles, {} skipped busy, {} skipped not ready",
        state.sampler.ticks,
        state.sampler.completed,
        state.sampler.skipped_busy,
        state.sampler.skipped_video + state.sampler.skipped_model,
    );

    if let Some(report) = monitor.report() {
        let exporter = ReportExporter::new(report_config.format);
        let path = exporter.export_to_dir(&report, &report_config.output_dir, &report_config.file_name)?;
        info!(
            "Final integrity score for {}: {} ({} events) -> {:?}",
            report.candidate_name,
            report.score,
            report.counts.total(),
            path
        );
    }

    Ok(())
}
