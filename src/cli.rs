//! Command-line interface definitions.
//!
//! Settings that carry credentials can come from the environment; everything
//! else lives in the YAML settings file (see [`crate::config`]).

use clap::{Parser, ValueEnum};

/// How the process is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Scan and deliver once, then exit.
    Once,
    /// Scan immediately, then every day at the scheduled time.
    Local,
    /// Serve the HTTP control endpoints and run the daily schedule in the background.
    Cloud,
}

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # One run, digest written to disk instead of mailed
/// launch_digest --mode once --output-dir ./digests
///
/// # Long-running service with manual trigger endpoint
/// SENDER_EMAIL=me@example.com SENDER_PASSWORD=... RECIPIENTS=a@x.com,b@y.com \
///     launch_digest --mode cloud --port 8080
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a settings.yaml file
    #[arg(short, long, env = "LAUNCH_DIGEST_CONFIG")]
    pub config: Option<String>,

    /// Run mode
    #[arg(long, value_enum, default_value_t = Mode::Local)]
    pub mode: Mode,

    /// Port for the control endpoints (cloud mode)
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Path of the sent-articles database (overrides the settings file)
    #[arg(long, env = "DATABASE_PATH")]
    pub database: Option<String>,

    /// Write digests as JSON and HTML under this directory instead of mailing them
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Directory for the daily-rotated log file served at `/logs`
    #[arg(long, env = "LOG_DIR", default_value = "logs")]
    pub log_dir: String,

    /// SMTP sender address
    #[arg(long, env = "SENDER_EMAIL")]
    pub sender_email: Option<String>,

    /// SMTP password for the sender account
    #[arg(long, env = "SENDER_PASSWORD", hide_env_values = true)]
    pub sender_password: Option<String>,

    /// Comma-separated digest recipients
    #[arg(long, env = "RECIPIENTS", value_delimiter = ',')]
    pub recipients: Vec<String>,
}
