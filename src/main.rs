//! pick-captcha CLI
//!
//! Play the image-selection puzzle in the terminal, or drive rounds from
//! the command line.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pick_captcha::config::{
    PuzzleConfig, default_config_path, resolve_config, save_config, with_images_from,
};
use pick_captcha::report::{format_layout, format_uniformity, format_verification};
use pick_captcha::round::PuzzleRound;
use pick_captcha::stats::{DEFAULT_ROUNDS, tally_layouts_with_progress};
use pick_captcha::tui::{self, App, Texts};
use pick_captcha::types::OutputFormat;

#[derive(Parser)]
#[command(name = "pick-captcha")]
#[command(about = "Pick the matching images from a shuffled grid")]
#[command(version)]
struct Cli {
    /// Configuration file (default: the user config dir, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use the images in this directory as the catalog, sorted by name
    #[arg(long, global = true)]
    images: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the puzzle in the terminal (default)
    Play {
        /// Seed for a reproducible sequence of rounds
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print one shuffled layout
    Layout {
        /// Seed for a reproducible layout
        #[arg(long)]
        seed: Option<u64>,

        /// Mark the target slots
        #[arg(long)]
        reveal: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Verify a selection against the layout drawn from a seed
    Check {
        /// Seed of the round (see `layout --seed`)
        #[arg(long)]
        seed: u64,

        /// Selected slot indices, comma separated (0-based)
        #[arg(long, value_delimiter = ',')]
        select: Vec<usize>,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Test the shuffle for bias over many rounds
    Stats {
        /// Number of rounds to draw
        #[arg(long, default_value_t = DEFAULT_ROUNDS)]
        rounds: u64,

        /// Base seed
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Show the resolved configuration, or write the default one
    Config {
        /// Write the default configuration to the default location
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Play { seed: None });

    init_tracing(cli.verbose, matches!(command, Commands::Play { .. }));

    let result = match command {
        Commands::Play { seed } => {
            load(cli.config.as_deref(), cli.images.as_deref()).and_then(|c| cmd_play(c, seed))
        }
        Commands::Layout { seed, reveal, format } => {
            load(cli.config.as_deref(), cli.images.as_deref())
                .and_then(|c| cmd_layout(c, seed, reveal, format.into()))
        }
        Commands::Check { seed, select, format } => {
            load(cli.config.as_deref(), cli.images.as_deref())
                .and_then(|c| cmd_check(c, seed, &select, format.into()))
        }
        Commands::Stats { rounds, seed, format } => {
            load(cli.config.as_deref(), cli.images.as_deref())
                .and_then(|c| cmd_stats(c, rounds, seed, format.into()))
        }
        Commands::Config { init, force } => cmd_config(cli.config.as_deref(), init, force),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// LOGGING
// ============================================================================

/// Log to stderr, except while the terminal UI owns the screen: then log
/// to a file, or not at all if it cannot be opened.
fn init_tracing(verbose: u8, interactive: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if !interactive {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
        return;
    }

    match open_log_file() {
        Some((path, file)) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .init();
            tracing::debug!(path = %path.display(), "logging initialized");
        }
        None => tracing_subscriber::registry().with(env_filter).init(),
    }
}

fn open_log_file() -> Option<(PathBuf, File)> {
    let dir = dirs::data_local_dir()?.join("pick-captcha");
    fs::create_dir_all(&dir).ok()?;
    let path = dir.join("pick-captcha.log");
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;
    Some((path, file))
}

// ============================================================================
// CONFIG RESOLUTION
// ============================================================================

/// Resolve the config file, then apply the image directory override.
fn load(config: Option<&Path>, images: Option<&Path>) -> Result<PuzzleConfig, String> {
    let config = resolve_config(config).map_err(|e| e.to_string())?;
    match images {
        Some(dir) => with_images_from(config, dir).map_err(|e| e.to_string()),
        None => Ok(config),
    }
}

fn new_round(config: &PuzzleConfig, seed: Option<u64>) -> Result<PuzzleRound, String> {
    let catalog = config.catalog().map_err(|e| e.to_string())?;
    Ok(match seed {
        Some(seed) => PuzzleRound::seeded(catalog, seed),
        None => PuzzleRound::with_os_rng(catalog),
    })
}

// ============================================================================
// PROGRESS HELPERS
// ============================================================================

fn progress_bar(total: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.magenta} [{bar:40.magenta/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.set_message(msg.to_string());
    pb
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn cmd_play(config: PuzzleConfig, seed: Option<u64>) -> Result<ExitCode, String> {
    let round = new_round(&config, seed)?;
    let app = App::new(round, Texts::from(&config));
    tui::run(app).map_err(|e| e.to_string())?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_layout(
    config: PuzzleConfig,
    seed: Option<u64>,
    reveal: bool,
    format: OutputFormat,
) -> Result<ExitCode, String> {
    let round = new_round(&config, seed)?;
    print!(
        "{}",
        format_layout(round.layout(), round.catalog(), reveal, format)
    );
    if format == OutputFormat::Json {
        println!();
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_check(
    config: PuzzleConfig,
    seed: u64,
    select: &[usize],
    format: OutputFormat,
) -> Result<ExitCode, String> {
    let mut round = new_round(&config, Some(seed))?;

    for &slot in select {
        round.toggle(slot).map_err(|e| e.to_string())?;
    }
    let result = round.verify();

    print!("{}", format_verification(&result, format));
    if format == OutputFormat::Json {
        println!();
    }

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_stats(
    config: PuzzleConfig,
    rounds: u64,
    seed: u64,
    format: OutputFormat,
) -> Result<ExitCode, String> {
    let catalog = config.catalog().map_err(|e| e.to_string())?;

    let report = if format == OutputFormat::Human {
        let pb = progress_bar(rounds, "Shuffling...");
        let report = tally_layouts_with_progress(&catalog, rounds, seed, |n| pb.inc(n));
        pb.finish_with_message("Done");
        eprintln!();
        report
    } else {
        tally_layouts_with_progress(&catalog, rounds, seed, |_| {})
    };

    print!("{}", format_uniformity(&report, format));
    if format == OutputFormat::Json {
        println!();
    }

    Ok(if report.is_uniform() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_config(explicit: Option<&Path>, init: bool, force: bool) -> Result<ExitCode, String> {
    if init {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);
        if path.exists() && !force {
            return Err(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            ));
        }
        save_config(&PuzzleConfig::default(), &path).map_err(|e| e.to_string())?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let config = resolve_config(explicit).map_err(|e| e.to_string())?;
    let source = match explicit {
        Some(path) => path.display().to_string(),
        None if default_config_path().is_file() => default_config_path().display().to_string(),
        None => "built-in defaults".to_string(),
    };

    eprintln!("Configuration: {}", source);
    let json = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(ExitCode::SUCCESS)
}
