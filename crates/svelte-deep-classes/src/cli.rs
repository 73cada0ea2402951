//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueEnum};

/// Rewrite classes passed to child Svelte components into global style rules.
#[derive(Debug, Parser)]
#[command(name = "svelte-deep-classes")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Files or directories to process, relative to the workspace
    #[arg(default_value = ".")]
    pub paths: Vec<Utf8PathBuf>,

    /// Working directory
    #[arg(long, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Support `rtl:` and `ltr:` prefixed classes
    #[arg(long)]
    pub rtl: bool,

    /// Make `gl:` prefixed classes global
    #[arg(long = "global-prefix")]
    pub global_prefix: bool,

    /// Path to a JSON config file (defaults to deep-classes.json in the workspace)
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Write transformed files here instead of printing them
    #[arg(long = "out-dir")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Write a `.map` file next to every transformed file (requires --out-dir)
    #[arg(long = "source-map", requires = "out_dir")]
    pub source_map: bool,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// One JSON array describing every processed file
    Json,
}
