//! imgduo - two-slot image editing from the command line
//!
//! Loads a primary and an optional secondary image, runs a sequence of
//! operators on them and writes the primary image out.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use imgduo_engine::Operator;
use imgduo_io::ColorMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "imgduo")]
#[command(author, version, about = "Two-slot image editor")]
#[command(long_about = "
Holds a primary and a secondary image and applies operators to them.
Single-image operators need the primary image; swap, blend, stitch and
texture-transfer need both.

Examples:
  imgduo info photo.jpg                          # Show image info
  imgduo run photo.jpg --op sharpen -o out.png   # Sharpen
  imgduo run a.jpg b.jpg --op stitch -o pano.jpg # Panorama
  imgduo run a.jpg b.jpg --op blend --op gamma -o out.png
  imgduo ops a.jpg                               # Which operators are enabled
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Display image information
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Load images, apply operators, save the primary image
    #[command(visible_alias = "r")]
    Run(RunArgs),

    /// List operators and whether they are enabled for the given images
    Ops(OpsArgs),
}

/// How files are decoded.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ReadMode {
    /// Always 3-channel BGR
    #[default]
    Color,
    /// Always single channel
    Grayscale,
    /// Keep the file's channels
    Unchanged,
}

impl From<ReadMode> for ColorMode {
    fn from(mode: ReadMode) -> Self {
        match mode {
            ReadMode::Color => Self::Color,
            ReadMode::Grayscale => Self::Grayscale,
            ReadMode::Unchanged => Self::Unchanged,
        }
    }
}

#[derive(Args)]
struct InfoArgs {
    /// Input image(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Decode mode
    #[arg(short, long, value_enum, default_value_t = ReadMode::Unchanged)]
    mode: ReadMode,
}

#[derive(Args)]
struct RunArgs {
    /// Primary image
    primary: PathBuf,

    /// Secondary image
    secondary: Option<PathBuf>,

    /// Operator to apply; repeat for a sequence
    #[arg(long = "op", value_parser = parse_operator, required = true)]
    ops: Vec<Operator>,

    /// Output image (PNG or JPEG)
    #[arg(short, long)]
    output: PathBuf,

    /// JPEG quality (1-100)
    #[arg(short, long, default_value = "95")]
    quality: u8,

    /// Decode mode
    #[arg(short, long, value_enum, default_value_t = ReadMode::Color)]
    mode: ReadMode,

    /// Keep going after an operator is rejected or fails
    #[arg(short = 'k', long)]
    keep_going: bool,
}

#[derive(Args)]
struct OpsArgs {
    /// Primary image
    primary: Option<PathBuf>,

    /// Secondary image
    secondary: Option<PathBuf>,
}

fn parse_operator(name: &str) -> Result<Operator, String> {
    Operator::from_name(name).ok_or_else(|| {
        let names: Vec<&str> = Operator::ALL.iter().map(|op| op.name()).collect();
        format!("unknown operator '{name}' (expected one of: {})", names.join(", "))
    })
}

/// Installs the stderr log subscriber: `RUST_LOG` wins, else `-v` means debug.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Run(args) => commands::run::run(args, cli.verbose),
        Commands::Ops(args) => commands::ops::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "imgduo", "run", "a.png", "b.png", "--op", "blend", "--op", "gamma", "-o", "out.png",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.ops, vec![Operator::Blend, Operator::Gamma]);
        assert_eq!(args.secondary, Some(PathBuf::from("b.png")));
        assert_eq!(args.quality, 95);
    }

    #[test]
    fn test_unknown_operator() {
        let err = Cli::try_parse_from(["imgduo", "run", "a.png", "--op", "blur", "-o", "x.png"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
