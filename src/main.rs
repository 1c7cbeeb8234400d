// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use chainlog::batch::{self, BatchParseError};
use chainlog::blockchain::signing::SigningError;
use chainlog::blockchain::{ChainClientError, KeyWallet, NetworkConfig};
use chainlog::config::{Config, ConfigError, LogFormat};
use chainlog::error::SubmitError;
use chainlog::pipeline::{SubmissionMode, SubmissionPipeline, SubmissionState, SubmissionStatus};
use chainlog::records::{parse_time_input, LogRecord};
use chainlog::status::{describe, format_address, remediation, server_name, SERVER_OPTIONS};
use chainlog::wallet::{
    serve_announcements, AnnouncementBus, ConnectError, ProviderDiscovery, ProviderHandle,
};
use chainlog::writer::LogWriter;

/// How long to wait for wallets to answer the discovery request.
const DISCOVERY_WINDOW: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(author, version, about = "Write log records to the LogEmitter contract")]
struct Cli {
    /// Wallet to use, by name or uuid (defaults to the first one discovered)
    #[arg(long, global = true)]
    wallet: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered wallet providers
    Providers,
    /// List known log servers
    Servers,
    /// Write a single log record
    Write {
        /// Epoch seconds or a date-time such as 2024-01-01T00:00:00Z
        #[arg(long)]
        time: String,
        /// Server id (see `servers`)
        #[arg(long)]
        server: u64,
        #[arg(long)]
        message: String,
    },
    /// Write every record of a JSON batch file in one transaction
    Batch {
        file: PathBuf,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Client(#[from] ChainClientError),

    #[error("No wallet providers detected. Set WALLET_PRIVATE_KEY or WALLET_KEY_PEM.")]
    NoWallet,

    #[error("No wallet provider named {0:?}")]
    UnknownWallet(String),

    #[error("Unrecognised time {0:?}; use epoch seconds or a date-time")]
    InvalidTime(String),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Batch(#[from] BatchParseError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    let shutdown = CancellationToken::new();
    let result = run(cli, &config, &shutdown).await;
    shutdown.cancel();

    match result {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn run(cli: Cli, config: &Config, shutdown: &CancellationToken) -> Result<ExitCode, CliError> {
    match cli.command {
        Commands::Servers => {
            for (id, name) in SERVER_OPTIONS {
                println!("{id}\t{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Providers => {
            let discovery = discover(config, shutdown).await?;
            let providers = discovery.list();
            if providers.is_empty() {
                println!("No wallet providers detected.");
            }
            for handle in providers {
                println!(
                    "{}\t{}\t{}",
                    handle.info.name,
                    format_address(&handle.provider.address()),
                    handle.info.uuid
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Write {
            time,
            server,
            message,
        } => {
            let timestamp =
                parse_time_input(&time).ok_or_else(|| CliError::InvalidTime(time.clone()))?;
            info!(server, server_name = server_name(server), "Writing single log record");
            let record = LogRecord::with_seed(timestamp, server, message, time.trim());

            let handle = select_wallet(config, shutdown, cli.wallet.as_deref()).await?;
            submit(config, &handle, SubmissionMode::Single, &[record]).await
        }
        Commands::Batch { file } => {
            let records = batch::load_file(&file)?;
            println!(
                "{} log entries loaded from {}.",
                records.len(),
                file.display()
            );

            let handle = select_wallet(config, shutdown, cli.wallet.as_deref()).await?;
            submit(config, &handle, SubmissionMode::Batch, &records).await
        }
    }
}

/// Announce the configured key wallet (if any) and collect what answers.
async fn discover(
    config: &Config,
    shutdown: &CancellationToken,
) -> Result<ProviderDiscovery<KeyWallet>, CliError> {
    let bus = AnnouncementBus::new();
    if let Some(key) = &config.key {
        let wallet = KeyWallet::new(
            config.network.clone(),
            key.signer()?,
            config.receipt_poll_interval,
        )?;
        info!(network = %config.network.name, account = %wallet.address(), "Key wallet ready");
        serve_announcements(bus.clone(), wallet.provider_info(), wallet, shutdown.clone());
    }

    let mut discovery = ProviderDiscovery::new(bus);
    let mut providers = discovery.subscribe();
    discovery.start();

    // An empty registry after the window is a valid outcome.
    let _ = tokio::time::timeout(DISCOVERY_WINDOW, providers.wait_for(|list| !list.is_empty())).await;
    Ok(discovery)
}

async fn select_wallet(
    config: &Config,
    shutdown: &CancellationToken,
    wanted: Option<&str>,
) -> Result<ProviderHandle<KeyWallet>, CliError> {
    let discovery = discover(config, shutdown).await?;
    match wanted {
        Some(key) => discovery
            .find(key)
            .ok_or_else(|| CliError::UnknownWallet(key.to_string())),
        None => discovery.list().into_iter().next().ok_or(CliError::NoWallet),
    }
}

async fn submit(
    config: &Config,
    handle: &ProviderHandle<KeyWallet>,
    mode: SubmissionMode,
    records: &[LogRecord],
) -> Result<ExitCode, CliError> {
    let mut writer = LogWriter::new(SubmissionPipeline::new(config.receipt_timeout));
    let account = writer.connect(handle).await?;
    println!("Connected {} via {}", format_address(&account), handle.info.name);

    let printer = print_status(writer.subscribe(), config.network.clone());
    let outcome = tokio::select! {
        outcome = writer.submit(mode, records) => outcome,
        _ = tokio::signal::ctrl_c() => {
            printer.abort();
            warn!(status = writer.status().state.name(), "Interrupted during submission");
            println!("Interrupted. A transaction that was already sent may still be mined.");
            return Ok(ExitCode::from(130));
        }
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            printer.abort();
            return Err(e.into());
        }
    };
    let _ = printer.await;

    Ok(match outcome {
        SubmissionState::Confirmed { .. } => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

/// Print each status line until the attempt reaches a terminal state.
fn print_status(
    mut updates: broadcast::Receiver<SubmissionStatus>,
    network: NetworkConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let status = match updates.recv().await {
                Ok(status) => status,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return,
            };

            let line = describe(&status);
            if !line.is_empty() {
                println!("{line}");
            }

            match &status.state {
                SubmissionState::Confirmed { events, .. } => {
                    if let Some(url) = status.tx_hash.and_then(|hash| network.tx_url(&hash)) {
                        println!("Explorer: {url}");
                    }
                    for event in events {
                        println!("  {} {}", event.name, event.args);
                    }
                    return;
                }
                SubmissionState::Failed { .. } => {
                    if let Some(hint) = remediation(&status) {
                        println!("{hint}");
                    }
                    return;
                }
                _ => {}
            }
        }
    })
}
