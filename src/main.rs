// src/main.rs

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::error;

mod app;
mod config;
mod core;
mod logging;
mod notify;

use crate::app::App;
use crate::config::Config;
use crate::core::hosts::load_hostnames;
use crate::core::scanner::ssl_scanner::CertProber;
use crate::notify::{LogNotifier, Notifier, SmtpNotifier};

/// Checks TLS certificate expiry for a list of hosts and mails an alert when
/// any of them needs attention.
#[derive(Debug, Parser)]
#[command(name = "certwarden", version, about)]
struct Cli {
    /// Newline-delimited host list; `#` starts a comment
    #[arg(short, long, default_value = "domains.txt")]
    domains: PathBuf,

    /// TOML configuration file
    #[arg(short, long, default_value = "certwarden.toml")]
    config: PathBuf,

    /// Alert when fewer than this many days remain
    #[arg(long)]
    buffer_days: Option<i64>,

    /// Per-host deadline in seconds for connect and handshake
    #[arg(long)]
    timeout: Option<f64>,

    /// Maximum probes in flight (0 = unbounded)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Log the alert email instead of sending it
    #[arg(long)]
    dry_run: bool,

    /// Print the run summary and report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(days) = self.buffer_days {
            config.alert.buffer_days = days;
        }
        if let Some(timeout) = self.timeout {
            config.alert.timeout_seconds = timeout;
        }
        if let Some(ceiling) = self.concurrency {
            config.alert.max_concurrency = ceiling;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    logging::initialize_logging(cli.verbose)?;

    if let Err(e) = run(cli).await {
        error!(error = %e, "Run failed.");
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    // Both the prober and the mail transport use rustls; pin the provider once.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut config = Config::load(&cli.config).wrap_err("loading configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().wrap_err("validating configuration")?;

    let hostnames = load_hostnames(&cli.domains).wrap_err("loading host list")?;

    let prober = CertProber::new(&config.alert).wrap_err("building certificate prober")?;
    let notifier: Box<dyn Notifier> = match (&config.email, cli.dry_run) {
        (Some(email), false) => Box::new(SmtpNotifier::new(email).wrap_err("configuring mail relay")?),
        _ => Box::new(LogNotifier),
    };

    let app = App::new(config.alert.clone(), Arc::new(prober), notifier);
    let summary = app.run(&hostnames).await.wrap_err("certificate run")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
