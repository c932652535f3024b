use std::path::PathBuf;

use clap::Parser;

/// Housekeeping for a fleet of HANA databases.
#[derive(Debug, Parser)]
#[command(name = "hcc", version, about)]
pub struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short = 'f', long, default_value = "config.json")]
    pub config_file: PathBuf,

    /// Also render verbose-only events.
    #[arg(short, long)]
    pub verbose: bool,

    /// Run discovery queries only; no mutating statement is issued.
    #[arg(short, long)]
    pub dry_run: bool,

    /// Print the resolved configuration and exit without connecting.
    #[arg(short, long)]
    pub print_config: bool,
}
