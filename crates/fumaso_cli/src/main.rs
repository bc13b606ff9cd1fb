//! Fumaso CLI - headless keyframe timeline player
//!
//! Loads a timeline document (TOML), validates every path and plays the
//! timeline at a fixed frame rate, printing each value the path handlers
//! receive.

mod config;
mod player;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use config::TimelineDocument;
use player::{PlaybackSettings, Sample};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Validate and play keyframe timelines
#[derive(Parser, Debug)]
#[command(name = "fumaso")]
#[command(about = "Validate and play keyframe timelines headless")]
#[command(version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a timeline to its end and print every sample
    Play {
        /// Timeline document
        file: PathBuf,

        /// Frames per second of the simulated frame loop
        #[arg(long, default_value = "60")]
        fps: f64,

        /// Stop after this many frames
        #[arg(long, default_value = "100000")]
        max_frames: usize,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Validate a timeline document
    Check {
        /// Timeline document
        file: PathBuf,
    },
    /// Print a timeline document in normalized form
    Fmt {
        /// Timeline document
        file: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Play {
            file,
            fps,
            max_frames,
            format,
        } => {
            let document = TimelineDocument::load(&file)?;
            let report = player::play(&document, PlaybackSettings { fps, max_frames })?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            for sample in &report.samples {
                write_sample(&mut out, sample, format)?;
            }

            tracing::info!(
                frames = report.frames,
                end_time = report.end_time,
                samples = report.samples.len(),
                finished = report.finished,
                "playback complete"
            );
        }
        Commands::Check { file } => {
            let document = TimelineDocument::load(&file)?;
            let summary = player::inspect(&document)?;
            println!(
                "{}: {} paths, end time {} ms, timescale {}",
                file.display(),
                summary.paths,
                summary.end_time,
                summary.timescale
            );
        }
        Commands::Fmt { file } => {
            let document = TimelineDocument::load(&file)?;
            print!("{}", document.to_toml()?);
        }
    }

    Ok(())
}

fn write_sample(out: &mut impl Write, sample: &Sample, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(
            out,
            "frame {:>5}  {:>10.1} ms  {} = {}",
            sample.frame, sample.clock_ms, sample.path, sample.value
        )?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(sample)?)?,
    }
    Ok(())
}
