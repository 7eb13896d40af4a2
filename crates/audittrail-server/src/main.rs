//! # audittrail entry point
//!
//! Loads configuration, initializes logging, and either serves the HTTP front
//! end or prints the installation address.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use audittrail::store::KeyCustodian;
use audittrail::{AuditProxy, ProxyConfig, DEFAULT_CONFIG_PATH};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Signing and forwarding proxy for audit records.
#[derive(Parser, Debug)]
#[command(name = "audittrail", version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, global = true, env = "AUDITTRAIL_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the listen port.
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Serve the HTTP front end (default).
    Serve,
    /// Print the installation address and exit.
    Address,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&cli).await,
        Command::Address => print_address(&cli),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(cli: &Cli) -> Result<()> {
    let mut config = ProxyConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(port) = cli.port {
        config.listen_port = port;
    }

    ensure_data_dir(&config.data_dir)?;

    let proxy = AuditProxy::from_config(&config).context("building proxy")?;
    let address = proxy.address().context("loading signing key")?;
    tracing::info!(%address, "installation address");

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!(%addr, send_url = %config.send_url(), "audit trail proxy listening");

    axum::serve(listener, audittrail_server::app(Arc::new(proxy)))
        .await
        .context("serving HTTP")?;
    Ok(())
}

/// Print the address. Needs only the data directory, so a configuration
/// file without `serverUrl` (or none at all) is tolerated.
fn print_address(cli: &Cli) -> Result<()> {
    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => ProxyConfig::load(&cli.config)
            .map(|c| c.data_dir)
            .unwrap_or_else(|_| PathBuf::from("data")),
    };
    ensure_data_dir(&data_dir)?;

    let address = KeyCustodian::new(&data_dir)
        .address()
        .context("loading signing key")?;
    println!("{}", address);
    Ok(())
}

fn ensure_data_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating data directory {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["audittrail"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(!cli.log_json);
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::try_parse_from([
            "audittrail",
            "address",
            "--data-dir",
            "/tmp/audit",
            "--port",
            "9001",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Command::Address));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/audit")));
        assert_eq!(cli.port, Some(9001));
    }

    #[test]
    fn test_address_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "audittrail",
            "--config",
            "does-not-exist.json",
            "--data-dir",
            dir.path().to_str().unwrap(),
            "address",
        ])
        .unwrap();

        print_address(&cli).unwrap();
        assert!(dir.path().join(audittrail::store::KEY_FILE_NAME).exists());
    }
}
