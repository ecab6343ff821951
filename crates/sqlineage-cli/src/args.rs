//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sqlineage")]
#[command(author, version, about = "Table-level lineage for SQL view definitions")]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// How warnings are reported
    #[arg(long, global = true, default_value = "human", value_enum)]
    pub diagnostics: DiagnosticsFormat,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract lineage from a directory of SQL files
    Extract {
        /// Directory containing SQL files
        input: Option<PathBuf>,

        /// Lineage file to write
        output: Option<PathBuf>,

        /// Output format (inferred from the output extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<FileFormat>,

        /// SQL dialect
        #[arg(short, long)]
        dialect: Option<String>,

        /// Only read files directly inside the input directory
        #[arg(long)]
        top_level_only: bool,

        /// File extensions to load (repeatable)
        #[arg(short, long = "extension", value_name = "EXT")]
        extensions: Vec<String>,

        /// Exit with status 1 when any warning was produced
        #[arg(long)]
        deny_warnings: bool,

        /// Configuration file (defaults to the nearest sqlineage.toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Show what an entity depends on or what depends on it
    Impact {
        /// Previously exported lineage file
        lineage: PathBuf,

        /// Entity name
        entity: String,

        /// Direction to walk
        #[arg(long, default_value = "downstream", value_enum)]
        direction: Direction,
    },

    /// Print a summary of one entity
    Describe {
        /// Previously exported lineage file
        lineage: PathBuf,

        /// Entity name
        entity: String,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl From<FileFormat> for sqlineage_core::ExportFormat {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Json => sqlineage_core::ExportFormat::Json,
            FileFormat::Yaml => sqlineage_core::ExportFormat::Yaml,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum Direction {
    Upstream,
    #[default]
    Downstream,
    Both,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum DiagnosticsFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output
    Json,
}
