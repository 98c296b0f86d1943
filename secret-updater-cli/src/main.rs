//! mtls-secret-updater — keeps a Secret in sync with certificate files
//! rotated on disk by an issuing sidecar.
//!
//! # Usage
//!
//! ```text
//! SECRET_NAME=<name> SECRET_NAMESPACE=<ns> mtls-secret-updater \
//!     [--cert-dir /certs] [--log-format text|json]
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;

use secret_updater_daemon::settings::DEFAULT_CERT_DIR;
use secret_updater_daemon::{init_tracing, start_blocking, LogFormat, SyncSettings, UpdaterConfig};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "mtls-secret-updater",
    version,
    about = "Push rotated mTLS certificate files into a Kubernetes Secret",
    long_about = None,
)]
struct Cli {
    /// Name of the Secret to patch.
    #[arg(long, env = "SECRET_NAME")]
    secret_name: String,

    /// Namespace of the Secret to patch.
    #[arg(long, env = "SECRET_NAMESPACE")]
    secret_namespace: String,

    /// Directory holding ca.crt, tls.crt and tls.key.
    #[arg(long, env = "CERT_DIR", default_value = DEFAULT_CERT_DIR)]
    cert_dir: PathBuf,

    /// Log output format: text or json.
    #[arg(long, env = "LOG_FORMAT", default_value_t = LogFormatArg::default())]
    log_format: LogFormatArg,
}

// ---------------------------------------------------------------------------
// LogFormat argument — parsed from CLI strings, converts to daemon type
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `LogFormat` from CLI args.
#[derive(Debug, Clone, Copy, Default)]
struct LogFormatArg(LogFormat);

impl FromStr for LogFormatArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self(LogFormat::Text)),
            "json" => Ok(Self(LogFormat::Json)),
            other => Err(format!("unknown log format '{other}'; expected: text, json")),
        }
    }
}

impl fmt::Display for LogFormatArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format.0);

    let config = UpdaterConfig {
        secret_name: cli.secret_name,
        secret_namespace: cli.secret_namespace,
        cert_dir: cli.cert_dir,
        settings: SyncSettings::default(),
    };
    start_blocking(config).context("secret updater exited with error")
}
