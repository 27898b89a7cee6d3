use anyhow::Result;
use clap::Parser;
use squat_sentinel::{
    export, logging, session, Config, PoseSource, ReplaySource, SessionId, SquatAnalyzer,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "squat-sentinel", version)]
#[command(about = "Counts squat reps from pose landmarks and logs knee-angle telemetry")]
struct Args {
    /// TOML config file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Replay recorded landmark frames (JSON Lines) instead of the camera
    #[arg(long, value_name = "PATH")]
    replay: Option<PathBuf>,

    /// Directory for the session CSV and JSON files
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Capture device index
    #[arg(long, value_name = "ID")]
    camera: Option<i32>,

    /// Write the effective config to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    if let Err(error) = run(args) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(id) = args.camera {
        config.camera_id = id;
    }
    config.validate()?;

    if let Some(path) = &args.write_config {
        config.save(path)?;
        println!("config written to {}", path.display());
        return Ok(());
    }

    let thresholds = config.thresholds()?;
    let mut source = open_source(&config, args.replay.as_deref())?;
    let stop = session::install_stop_flag()?;

    let session_id = SessionId::now();
    info!(
        session = %session_id,
        up = thresholds.up_deg(),
        down = thresholds.down_deg(),
        "session started"
    );

    let mut analyzer = SquatAnalyzer::new(config.knee_joint(), thresholds);
    let log = session::run_session(source.as_mut(), &mut analyzer, &stop);
    drop(source);

    let outcome = export::finalize_session(&log, &session_id, &config.output_dir);
    for path in outcome.timeseries.iter().chain(outcome.summary.iter()) {
        println!("saved {}", path.display());
    }
    for (path, error) in &outcome.failures {
        eprintln!("failed to save {}: {error}", path.display());
    }
    match &outcome.report {
        Some(report) => println!(
            "session {} complete: {} reps in {:.2}s",
            session_id, report.metrics.total_valid_reps, report.metrics.total_duration_sec
        ),
        None => println!("session {session_id} ended with no telemetry"),
    }

    Ok(())
}

fn open_source(config: &Config, replay: Option<&Path>) -> Result<Box<dyn PoseSource>> {
    match replay {
        Some(path) => Ok(Box::new(ReplaySource::open(path)?)),
        None => open_camera(config),
    }
}

#[cfg(feature = "vision")]
fn open_camera(config: &Config) -> Result<Box<dyn PoseSource>> {
    Ok(Box::new(squat_sentinel::camera::CameraPoseSource::open(config)?))
}

#[cfg(not(feature = "vision"))]
fn open_camera(_config: &Config) -> Result<Box<dyn PoseSource>> {
    anyhow::bail!("camera capture needs a build with the `vision` feature; pass --replay to analyze recorded landmarks")
}
