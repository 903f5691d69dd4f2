//! roofscan CLI - replay recorded sensor captures through the engine.
//!
//! A capture is a JSON file holding the probe answer and the ordered
//! sensor events of one session:
//!
//! ```json
//! { "supported": true, "events": [ { "kind": "tracking", "state": "limited" } ] }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use roofscan::{DetectionConfig, SensorEvent, Session, StaticProbe, Viewport};
use serde::Deserialize;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "roofscan")]
#[command(about = "Roof plane detection engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a capture and print the final session state
    Replay {
        /// Capture file (.json)
        capture: PathBuf,
        /// Detection configuration (.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Merge every pair of planes that look like one surface
        #[arg(long)]
        auto_merge: bool,
    },
    /// Replay a capture, then hit-test a screen tap against the planes
    Hit {
        /// Capture file (.json)
        capture: PathBuf,
        /// Tap x coordinate
        #[arg(short, long)]
        x: f64,
        /// Tap y coordinate
        #[arg(short, long)]
        y: f64,
        /// Screen width
        #[arg(long, default_value_t = 390.0)]
        width: f64,
        /// Screen height
        #[arg(long, default_value_t = 844.0)]
        height: f64,
        /// Detection configuration (.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the default configuration as TOML
    Config,
}

#[derive(Deserialize)]
struct Capture {
    #[serde(default = "default_supported")]
    supported: bool,
    events: Vec<SensorEvent>,
}

fn default_supported() -> bool {
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            capture,
            config,
            auto_merge,
        } => {
            let session = replay(&capture, config.as_deref()).await?;
            if auto_merge {
                merge_all(&session)?;
            }
            println!("{}", session.state().to_json()?);
            println!("{}", serde_json::to_string_pretty(&session.summary())?);
        }
        Commands::Hit {
            capture,
            x,
            y,
            width,
            height,
            config,
        } => {
            let session = replay(&capture, config.as_deref()).await?;
            session.set_viewport(Viewport::new(width, height));
            let hits = session.hit_test_detailed(x, y);
            if hits.is_empty() {
                let fallback = session.perform_hit_test(x, y);
                println!("{}", serde_json::to_string_pretty(&fallback)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            }
        }
        Commands::Config => {
            print!("{}", DetectionConfig::default().to_toml_string()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<DetectionConfig> {
    match path {
        Some(path) => DetectionConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(DetectionConfig::default()),
    }
}

async fn replay(path: &Path, config: Option<&Path>) -> Result<Session<StaticProbe>> {
    let config = load_config(config)?;
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading capture {}", path.display()))?;
    let capture: Capture = serde_json::from_str(&json)
        .with_context(|| format!("parsing capture {}", path.display()))?;

    let session = Session::new(StaticProbe::new(capture.supported));
    session.start_detection(config).await;
    if let Some(error) = session.state().error {
        anyhow::bail!("detection did not start: {}", error);
    }

    let (tx, rx) = mpsc::channel(64);
    let runner = session.clone();
    let stream = tokio::spawn(async move { runner.run_sensor_stream(rx).await });
    let total = capture.events.len();
    for event in capture.events {
        tx.send(event).await?;
    }
    drop(tx);
    let applied = stream.await?;
    info!("Applied {} of {} events", applied, total);

    Ok(session)
}

/// Repeatedly merge the first candidate pair until none remain.
fn merge_all(session: &Session<StaticProbe>) -> Result<()> {
    while let Some((a, b)) = session.merge_candidates().into_iter().next() {
        let id = session.merge_planes(&[a, b])?;
        info!("Merged into {}", id);
    }
    Ok(())
}
