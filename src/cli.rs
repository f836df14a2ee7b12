use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};

/// Produces a table of recent AIX/VIOS security advisories
#[derive(Parser)]
#[command(name = "aixadv", version)]
pub struct Cli {
    /// Show advisories issued and/or updated in the past number of days
    #[arg(short, long, default_value_t = 14)]
    pub days: u32,

    /// Read advisory JSON from a local file instead of the network
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Disable TLS certificate validation for the feed fetch
    #[arg(short, long)]
    pub insecure: bool,

    /// Show only URLs to download fixes
    #[arg(short, long)]
    pub urls: bool,

    /// Emit the sorted advisories as JSON instead of a table
    #[arg(long, conflicts_with = "urls")]
    pub json: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}
