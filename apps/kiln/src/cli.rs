//! Command line interface definition

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// kiln - declarative build pipeline for source packages
#[derive(Parser)]
#[command(name = "kiln")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch, build, install, and verify source packages from YAML recipes")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,
}

/// Color output preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: fetch, build, install, verify
    #[command(alias = "b")]
    Build {
        /// Path to recipe file (.yaml)
        recipe: PathBuf,

        /// Installation prefix for the finished artifact
        #[arg(short, long, value_name = "DIR")]
        prefix: PathBuf,

        /// Scratch directory root (default: system temp)
        #[arg(long, value_name = "DIR")]
        build_root: Option<PathBuf>,

        /// Number of parallel build jobs (0=auto)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Per-step timeout in seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,

        /// Keep the scratch directory after the run
        #[arg(long)]
        keep_scratch: bool,
    },

    /// Parse and validate a recipe without building
    Check {
        /// Path to recipe file (.yaml)
        recipe: PathBuf,
    },

    /// Render the pkg-config file a recipe would install
    #[command(name = "render-pc")]
    RenderPc {
        /// Path to recipe file (.yaml)
        recipe: PathBuf,

        /// Installation prefix to bake into the rendered file
        #[arg(short, long, value_name = "DIR")]
        prefix: PathBuf,
    },
}
