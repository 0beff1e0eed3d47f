use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use scheduler::{
    config::EncodeConfig,
    dispatch,
    profile::{CustomTemplate, Profile},
};
use std::path::PathBuf;

/// Batch encoder for DVD rips: fans input files out to a fixed pool of
/// external encoder processes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output profile
    #[arg(short = 'P', long, value_enum)]
    profile: ProfileArg,

    /// Encode command for the custom profile; %i expands to the input file
    /// and %o to the output file, e.g. "ffmpeg -i %i %o.webm"
    #[arg(short = 'c', long = "custom-cmd")]
    custom_cmd: Option<String>,

    /// Audio track to take from the source (mkv profile only)
    #[arg(short = 'a', long)]
    audio_track: Option<String>,

    /// How many files to process at a time; defaults to CPU count - 1
    #[arg(short = 't', long)]
    tasks: Option<usize>,

    /// Nice value for the encoder processes
    #[arg(short = 'n', long, value_parser = clap::value_parser!(i32).range(0..=19))]
    nice: Option<i32>,

    /// Executable invoked with the path of each finished file
    #[arg(short = 'e', long = "post-cmd")]
    post_cmd: Option<PathBuf>,

    /// Path to configuration file (JSON or TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Input files
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ProfileArg {
    Webm,
    Mkv,
    Custom,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp_secs()
    .init();

    // Load configuration, then let the command line override it
    let mut cfg = EncodeConfig::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(tasks) = args.tasks {
        cfg.workers = tasks;
    }
    if let Some(nice) = args.nice {
        cfg.nice = nice;
    }
    if let Some(track) = args.audio_track {
        cfg.audio_track = track;
    }
    if let Some(post_cmd) = args.post_cmd {
        cfg.post_cmd = Some(post_cmd);
    }

    // Start-up validation: everything fatal happens before scheduling begins
    if let Some(post_cmd) = &cfg.post_cmd {
        if !post_cmd.exists() {
            bail!("Cannot stat {}", post_cmd.display());
        }
    }

    let profile = match args.profile {
        ProfileArg::Webm => Profile::Webm,
        ProfileArg::Mkv => Profile::Mkv,
        ProfileArg::Custom => {
            let raw = args
                .custom_cmd
                .as_deref()
                .context("The custom profile requires -c <encode command>")?;
            Profile::Custom(
                CustomTemplate::parse(raw).context("Invalid custom encode command")?,
            )
        }
    };

    if cfg.workers == 0 {
        cfg.workers = detect_workers();
    }

    info!("Using profile: {}", profile.name());
    if let Some(raw) = &args.custom_cmd {
        if matches!(profile, Profile::Custom(_)) {
            info!("Using custom encode cmd: {raw}");
        }
    }
    info!("Using {} workers", cfg.workers);

    let summary = dispatch::run(cfg, profile, args.files).await?;

    info!(
        "✅ All {} file(s) accounted for: {} encoded, {} skipped, {} dropped",
        summary.total, summary.launched, summary.skipped, summary.errors
    );
    Ok(())
}

/// Default worker count: one fewer than the detected CPUs, at least one.
fn detect_workers() -> usize {
    let sys = sysinfo::System::new_all();
    sys.cpus().len().saturating_sub(1).max(1)
}
