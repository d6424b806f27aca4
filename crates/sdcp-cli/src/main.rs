//! SDCP CLI - discover and monitor resin printers from the command line

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use sdcp_client::{CancellationToken, Registry, Session};
use sdcp_core::{Attributes, Status};
use sdcp_discovery::Discovery;
use std::future::Future;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::FileConfig;

/// SDCP - fleet tool for resin printers
#[derive(Parser)]
#[command(name = "sdcp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "SDCP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Broadcast a discovery probe and list the printers that answer
    Discover {
        /// Listening window in milliseconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Broadcast address
        #[arg(short, long)]
        broadcast: Option<Ipv4Addr>,

        /// Print the raw replies as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a fresh status snapshot
    Status {
        /// Mainboard id
        id: String,
        /// Printer address
        address: String,
    },

    /// Show a fresh attributes snapshot
    Attributes {
        /// Mainboard id
        id: String,
        /// Printer address
        address: String,
    },

    /// Enable or disable the camera stream
    Video {
        /// Mainboard id
        id: String,
        /// Printer address
        address: String,
        /// Disable instead of enable
        #[arg(long)]
        disable: bool,
    },

    /// Follow status pushes from one or more printers until Ctrl+C
    Watch {
        /// Printers as ID@ADDRESS
        targets: Vec<String>,

        /// Also watch every printer found by discovery
        #[arg(short, long)]
        discover: bool,
    },

    /// Show configuration and defaults
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli.log_level, cli.json_logs)?;

    let config = FileConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Discover {
            timeout,
            broadcast,
            json,
        } => {
            let mut discovery = config.discovery_config();
            if let Some(ms) = timeout {
                discovery.timeout = Duration::from_millis(ms);
            }
            if let Some(addr) = broadcast {
                discovery.broadcast_addr = addr;
            }
            run_discover(Discovery::with_config(discovery), json).await?;
        }

        Commands::Status { id, address } => {
            let session_config = config.session_config();
            let limit = session_config.handshake_timeout;
            let registry = Registry::new(session_config);
            let session = open(&registry, &id, &address).await?;
            let status = within(
                limit,
                "Status refresh",
                session.refresh_status_and_wait(&CancellationToken::new()),
            )
            .await;
            registry.close_all().await;
            print_status(&id, &status?);
        }

        Commands::Attributes { id, address } => {
            let registry = Registry::new(config.session_config());
            let session = open(&registry, &id, &address).await?;
            print_attributes(&session.current_attributes());
            registry.close_all().await;
        }

        Commands::Video {
            id,
            address,
            disable,
        } => {
            let session_config = config.session_config();
            let limit = session_config.handshake_timeout;
            let registry = Registry::new(session_config);
            let session = open(&registry, &id, &address).await?;
            let response = within(
                limit,
                "Video stream request",
                session.set_video_stream(!disable, &CancellationToken::new()),
            )
            .await;
            registry.close_all().await;
            let response = response?;
            println!("{} {:?}", "Ack:".cyan().bold(), response.ack);
            if !response.video_url.is_empty() {
                println!("{} {}", "URL:".cyan().bold(), response.video_url);
            }
        }

        Commands::Watch { targets, discover } => {
            let registry = Arc::new(Registry::new(config.session_config()));
            let mut printers = targets
                .iter()
                .map(|target| parse_target(target))
                .collect::<Result<Vec<_>>>()?;

            if discover {
                let found = Discovery::with_config(config.discovery_config())
                    .discover()
                    .await
                    .context("Discovery failed")?;
                printers.extend(
                    found
                        .into_iter()
                        .map(|reply| (reply.data.mainboard_id, reply.data.mainboard_ip)),
                );
            }

            if printers.is_empty() {
                bail!("No printers to watch");
            }

            run_watch(registry, printers).await?;
        }

        Commands::Info => {
            print_info(&config);
        }
    }

    Ok(())
}

fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to parse log level")?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).compact())
            .init();
    }

    Ok(())
}

/// Split `ID@ADDRESS`
fn parse_target(target: &str) -> Result<(String, String)> {
    match target.split_once('@') {
        Some((id, address)) if !id.is_empty() && !address.is_empty() => {
            Ok((id.to_string(), address.to_string()))
        }
        _ => bail!("Invalid printer '{}', expected ID@ADDRESS", target),
    }
}

async fn open(registry: &Registry, id: &str, address: &str) -> Result<Arc<Session>> {
    registry
        .register(id, address)
        .await
        .with_context(|| format!("Failed to connect to {} at {}", id, address))
}

/// Wait at most `limit` for a request to the printer
async fn within<T>(
    limit: Duration,
    what: &str,
    request: impl Future<Output = sdcp_client::Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, request).await {
        Ok(result) => result.with_context(|| format!("{} failed", what)),
        Err(_) => bail!("{} timed out after {:?}", what, limit),
    }
}

async fn run_discover(discovery: Discovery, json: bool) -> Result<()> {
    println!(
        "{} Discovering printers on {} for {:?}",
        "SDCP".cyan().bold(),
        discovery.config().target(),
        discovery.config().timeout
    );

    let found = discovery.discover().await.context("Discovery failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    if found.is_empty() {
        println!("{}", "No printers answered".yellow());
        return Ok(());
    }

    for reply in &found {
        let data = &reply.data;
        println!(
            "{} {} {} ({} {}) firmware {} protocol {}",
            "FOUND".green().bold(),
            data.mainboard_id.yellow(),
            data.mainboard_ip,
            data.brand_name,
            data.model,
            data.firmware_version,
            data.protocol_version
        );
    }

    Ok(())
}

async fn run_watch(registry: Arc<Registry>, printers: Vec<(String, String)>) -> Result<()> {
    let mut watchers = Vec::new();

    for (id, address) in printers {
        match registry.register(&id, &address).await {
            Ok(session) => {
                println!("{} Watching {} at {}", "OK".green().bold(), id.yellow(), address);
                print_status(&id, &session.current_status());
                watchers.push(tokio::spawn(watch_session(session)));
            }
            Err(e) => println!("{} {}: {}", "ERROR".red(), id, e),
        }
    }

    if watchers.is_empty() {
        bail!("Could not connect to any printer");
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl+c")?;
    info!("Received shutdown signal");

    registry.close_all().await;
    futures::future::join_all(watchers).await;

    Ok(())
}

async fn watch_session(session: Arc<Session>) {
    let mut updates = session.subscribe_status();
    loop {
        tokio::select! {
            _ = session.closed() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = updates.borrow_and_update().clone();
                print_status(session.id(), &status);
            }
        }
    }
    println!("{} {} closed", "STOP".yellow().bold(), session.id());
}

fn print_status(id: &str, status: &Status) {
    let info = &status.print_info;
    println!(
        "{} {:?} UV LED {:.1}°C box {:.1}°C",
        id.yellow(),
        status.current_status,
        status.temp_of_uvled,
        status.temp_of_box
    );
    if status.is_printing() {
        println!(
            "     {} layer {}/{} {:?}",
            info.filename,
            info.current_layer,
            info.total_layer,
            info.status
        );
    }
}

fn print_attributes(attributes: &Attributes) {
    println!("{} {}", "Name:".cyan().bold(), attributes.name);
    println!(
        "{} {} {}",
        "Model:".cyan().bold(),
        attributes.brand_name,
        attributes.model
    );
    println!("{} {}", "Firmware:".cyan().bold(), attributes.firmware_version);
    println!("{} {}", "Protocol:".cyan().bold(), attributes.protocol_version);
    println!("{} {}", "Resolution:".cyan().bold(), attributes.resolution);
    println!("{} {}", "Build volume:".cyan().bold(), attributes.xyz_size);
    println!(
        "{} {:?}",
        "Capabilities:".cyan().bold(),
        attributes.capabilities
    );
    println!(
        "{} {}/{}",
        "Video streams:".cyan().bold(),
        attributes.number_of_video_stream_connected,
        attributes.maximum_video_stream_allowed
    );
}

fn print_info(config: &FileConfig) {
    println!("{}", "SDCP".cyan().bold());
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    match config::default_path() {
        Some(path) => println!("Default config: {}", path.display()),
        None => println!("Default config: (no config directory)"),
    }
    println!();
    println!("{}", "Effective settings:".green());
    match toml::to_string_pretty(config) {
        Ok(text) => println!("{}", text),
        Err(e) => println!("{} {}", "ERROR".red(), e),
    }
    println!("{}", "Examples:".green());
    println!("  sdcp discover");
    println!("  sdcp status A1B2 10.0.0.5");
    println!("  sdcp watch A1B2@10.0.0.5 C3D4@10.0.0.6");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!(
            parse_target("A1B2@10.0.0.5").unwrap(),
            ("A1B2".to_string(), "10.0.0.5".to_string())
        );
        assert!(parse_target("A1B2").is_err());
        assert!(parse_target("@10.0.0.5").is_err());
    }

    #[tokio::test]
    async fn test_silent_printer_request_times_out() {
        let silent = std::future::pending::<sdcp_client::Result<Status>>();
        let err = within(Duration::from_millis(20), "Status refresh", silent)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_request_error_keeps_cause() {
        let failed = async { Err::<Status, _>(sdcp_client::ClientError::SessionClosed) };
        let err = within(Duration::from_secs(1), "Status refresh", failed)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Status refresh failed");
        assert!(err.root_cause().to_string().contains("closed"));
    }
}
