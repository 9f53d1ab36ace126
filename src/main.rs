//! srt-slicer - split long recordings into utterance clips
//!
//! Entry point for the command-line tool: reads configuration, applies
//! command-line overrides and dispatches to the workflow.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use srt_slicer::cli::{Args, Commands};
use srt_slicer::config::Config;
use srt_slicer::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Split { subtitle, audio, output_dir, audio_args } => {
            audio_args.apply(&mut config.split);
            let output_dir = output_dir.unwrap_or_else(|| config.batch.output_dir.clone());

            let workflow = Workflow::new(config)?;
            let report = workflow.split_single(&subtitle, &audio, &output_dir).await?;
            println!(
                "{}: {} cues -> {} clips in {}",
                report.recording,
                report.cues,
                report.segments,
                report.output_dir.display()
            );
        }
        Commands::Batch { input_dir, output_dir, audio_args, no_clean, continue_on_error } => {
            audio_args.apply(&mut config.split);
            if let Some(input_dir) = input_dir {
                config.batch.input_dir = input_dir;
            }
            if let Some(output_dir) = output_dir {
                config.batch.output_dir = output_dir;
            }
            if no_clean {
                config.batch.clean_output = false;
            }
            if continue_on_error {
                config.batch.continue_on_error = true;
            }

            let workflow = Workflow::new(config)?;
            let report = workflow.run_batch().await?;
            println!(
                "Processed {} recordings into {} clips ({} failed)",
                report.processed.len(),
                report.segments(),
                report.failed.len()
            );
            for (path, reason) in &report.failed {
                println!("  failed: {} ({})", path.display(), reason);
            }
        }
        Commands::Filter { target_dir, ban_file, full_match, filter_latin } => {
            if ban_file.is_some() {
                config.manifest.ban_file = ban_file;
            }
            if let Some(full_match) = full_match {
                config.manifest.full_match = full_match;
            }
            if filter_latin {
                config.manifest.filter_latin = true;
            }

            let workflow = Workflow::new(config)?;
            let report = workflow.filter_manifests(&target_dir).await?;
            println!(
                "Kept {} entries, dropped {} banned and {} by script",
                report.kept, report.dropped_banned, report.dropped_script
            );
        }
        Commands::Sync { target_dir, manifest } => {
            let manifest = manifest.unwrap_or_else(|| config.manifest.filename.clone());
            let workflow = Workflow::new(config)?;
            let removed = workflow.sync_manifests(&target_dir, &manifest).await?;
            println!("Removed {} stale manifest entries", removed);
        }
        Commands::InitConfig { output } => {
            config.save_to_file(&output)?;
            println!("Wrote configuration to {}", output.display());
        }
    }

    info!("srt-slicer completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".srt-slicer").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation; the guard must live for the whole program
    let file_appender = rolling::daily(&log_dir, "srt-slicer.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
