use std::path::PathBuf;

use clap::Parser;

/// A flat flag surface — no subcommands, matching the single-binary,
/// single-mode-at-a-time shape the original tool's flags described.
#[derive(Debug, Parser)]
#[command(name = "vigil", about = "Self-contained network monitoring daemon", version)]
pub struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "vigil.yaml")]
    pub config: PathBuf,

    /// Load and validate the configuration and host/check graph, then exit.
    #[arg(long)]
    pub validate: bool,

    /// Run one maintenance pass (history retention + compaction) and exit.
    #[arg(long)]
    pub maintenance: bool,

    /// Purge orphaned hosts/checks' status and history, then exit.
    #[arg(long)]
    pub purge_alerts: bool,

    /// Apply the store's schema migrations and exit.
    #[arg(long)]
    pub migrate: bool,

    /// Bearer token the HTTP API requires. Generated and persisted next to
    /// the database on first run if not given.
    #[arg(long, env = "VIGIL_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Generate a fresh API bearer token even if one is already persisted.
    #[arg(long)]
    pub rotate_token: bool,
}
