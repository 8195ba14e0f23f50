use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "doviconvert")]
#[command(author, version, about = "Convert Dolby Vision profile 7 video to profile 8.1")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe a file and report whether it carries Dolby Vision metadata
    Check {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output the probed streams as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the commands a conversion would run
    Plan {
        /// Input file
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Convert a file to Dolby Vision profile 8.1
    Convert {
        /// Input file
        #[arg(required = true)]
        file: PathBuf,

        /// Destination (default: next to the input with an .mp4 extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show what would be done without executing
        #[arg(long)]
        dry_run: bool,

        /// Convert even if no Dolby Vision metadata is detected
        #[arg(long)]
        force: bool,
    },

    /// Download or locate every tool the conversion needs
    Provision,

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
