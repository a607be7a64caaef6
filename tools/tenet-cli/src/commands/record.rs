//! Record a clip and export it forward and reversed.

use std::time::Duration;

use anyhow::Context;
use tenet_capture_engine::pipeline::validate_output_format;
use tenet_capture_engine::{get_backend, RecorderConfig, RunOutcome, TenetRecorder};
use tenet_common::config::AppConfig;

use crate::RecordArgs;

pub fn run(mut config: AppConfig, args: RecordArgs) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args);
    check_settings(&config)?;

    println!("Tenet-Style Temporal Inversion Recorder");
    println!("{}", "=".repeat(40));
    println!("  Output:   {}", config.output_dir.display());
    println!("  Duration: {:.1}s", config.recording.duration().as_secs_f64());
    println!(
        "  Format:   {} @ {} fps (.{})",
        config.recording.fourcc, config.recording.fps, config.recording.container_extension
    );
    println!("Press 'Q' to stop recording early");

    let countdown = config.recording.countdown_secs;
    if countdown > 0 {
        println!("Starting in {countdown} seconds...");
        std::thread::sleep(Duration::from_secs(countdown));
    }

    let backend = get_backend(&config, args.synthetic);
    let mut recorder = TenetRecorder::initialize(RecorderConfig::from_app_config(&config), backend)
        .context("Failed to open the video device")?;

    println!("Recording...");
    let outcome = recorder.run();

    println!();
    match outcome {
        RunOutcome::Exported { summary, pair } => {
            println!(
                "Captured {} frames in {:.1}s{}",
                summary.frames_captured,
                summary.elapsed.as_secs_f64(),
                if summary.cancelled { " (stopped early)" } else { "" }
            );
            if summary.frames_skipped > 0 {
                println!("  Dropped reads: {}", summary.frames_skipped);
            }
            if pair.write_failures > 0 {
                println!("  Failed writes: {}", pair.write_failures);
            }
            println!("Original: {}", pair.original.display());
            println!("Inverted: {}", pair.inverted.display());
        }
        RunOutcome::EmptySession { .. } => {
            println!("No frames were captured; nothing was saved.");
        }
        RunOutcome::Failed(message) => {
            println!("Recording failed: {message}");
        }
    }

    Ok(())
}

/// Reject settings that would only fail once the capture is over.
fn check_settings(config: &AppConfig) -> anyhow::Result<()> {
    config.validate().context("Invalid recording settings")?;
    let recording = &config.recording;
    validate_output_format(&recording.fourcc, &recording.container_extension)
        .context("Unsupported output format")?;
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &RecordArgs) {
    let recording = &mut config.recording;
    if let Some(duration) = args.duration {
        recording.duration_secs = duration;
    }
    if let Some(device) = args.device {
        recording.device_index = device;
    }
    if let Some(fps) = args.fps {
        recording.fps = fps;
    }
    if let Some(countdown) = args.countdown {
        recording.countdown_secs = countdown;
    }
    if args.no_preview {
        recording.preview = false;
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
}
