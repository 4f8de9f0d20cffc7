//! Command-line argument definitions for the pedigree CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, filtering, selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the pedigree layout tool
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the JSON record store
    #[arg(help = "Path to the input record store (JSON)")]
    pub input: String,

    /// Path to the output scene file
    #[arg(short, long, default_value = "pedigree.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Only keep individuals whose id, name, prefix or suffix contains this text
    #[arg(long)]
    pub filter: Option<String>,

    /// Only keep individuals of this species
    #[arg(long)]
    pub species: Option<String>,

    /// Id of the individual to select and describe in the output
    #[arg(long)]
    pub select: Option<String>,
}
