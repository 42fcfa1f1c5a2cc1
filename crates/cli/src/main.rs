//! Operator commands for a Lightspeed Retail installation.
//!
//! Run with: `lightspeed <command>`
//!
//! Credentials come from `LIGHTSPEED_*` environment variables (a `.env` file
//! is honored) or `lightspeed.{json,toml}`. Token storage is auto-discovered
//! the same way the library does it.
//!
//! This is an operator tool, so `println!` and `eprintln!` are used for
//! command output; diagnostics go through `tracing`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use lightspeed_core::TokenStorage;
use lightspeed_domain::{TokenInfo, TokenRecord};
use lightspeed_infra::storage::discovery::DEFAULT_TOKEN_PATHS;
use lightspeed_infra::{
    auto_discover_storage, config, EncryptionService, FileTokenStorage, LightspeedClient,
    PingStatus,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    let command = std::env::args().nth(1);

    let result = match command.as_deref() {
        Some("generate-key") => {
            generate_key();
            Ok(())
        }
        Some("status") => run_status().await,
        Some("reset") => run_reset().await,
        Some("refresh") => run_refresh().await,
        Some("ping") => run_ping().await,
        Some("whoami") => run_whoami().await,
        Some("help" | "--help" | "-h") | None => {
            print_help();
            Ok(())
        }
        Some(unknown) => {
            eprintln!("Unknown command: {unknown}");
            eprintln!();
            print_help();
            Err(anyhow::anyhow!("Unknown command"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Command failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn print_help() {
    println!("Lightspeed Retail operator commands");
    println!();
    println!("USAGE:");
    println!("    lightspeed <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    generate-key  Print a new 256-bit token encryption key (hex)");
    println!("    status        Show the stored token state without contacting the API");
    println!("    reset         Clear stored tokens");
    println!("    refresh       Force a token refresh");
    println!("    ping          Check API connectivity");
    println!("    whoami        Fetch the configured account");
    println!("    help          Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    LIGHTSPEED_CLIENT_ID, LIGHTSPEED_CLIENT_SECRET, LIGHTSPEED_ACCOUNT_ID");
    println!("    LIGHTSPEED_REFRESH_TOKEN, LIGHTSPEED_TOKEN_FILE, LIGHTSPEED_ENCRYPTION_KEY");
}

fn generate_key() {
    println!("{}", EncryptionService::generate_key_hex());
    eprintln!("Store this value as LIGHTSPEED_ENCRYPTION_KEY; lost keys cannot be recovered.");
}

/// Discovered storage, or a plain file at the first default location.
async fn open_storage() -> Arc<dyn TokenStorage> {
    if let Some(found) = auto_discover_storage().await {
        tracing::info!(source = ?found.source, "Using discovered token storage");
        return found.storage;
    }

    let path = DEFAULT_TOKEN_PATHS[0];
    tracing::info!(path, "No token storage found, using default file");
    Arc::new(FileTokenStorage::new(path))
}

async fn build_client() -> anyhow::Result<LightspeedClient> {
    let settings = config::load().context("Failed to load Lightspeed configuration")?;
    let storage = open_storage().await;
    LightspeedClient::from_settings(settings, storage).context("Failed to build client")
}

async fn run_status() -> anyhow::Result<()> {
    let storage = open_storage().await;
    let record = storage.get_tokens().await.context("Failed to read stored tokens")?;
    let info = TokenInfo::from_record(&record, Utc::now());

    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

async fn run_reset() -> anyhow::Result<()> {
    let storage = open_storage().await;
    storage.set_tokens(&TokenRecord::empty()).await.context("Failed to clear stored tokens")?;
    println!("Stored tokens cleared");
    Ok(())
}

async fn run_refresh() -> anyhow::Result<()> {
    let client = build_client().await?;
    let outcome = client.refresh_tokens().await;
    println!("{}", outcome.message);

    if !outcome.success {
        bail!("token refresh failed");
    }
    Ok(())
}

async fn run_ping() -> anyhow::Result<()> {
    let client = build_client().await?;
    let report = client.ping().await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.status == PingStatus::Error {
        bail!("API unreachable");
    }
    Ok(())
}

async fn run_whoami() -> anyhow::Result<()> {
    let client = build_client().await?;
    let account = client.get_account().await.context("Failed to fetch account")?;
    println!("{}", serde_json::to_string_pretty(&account)?);
    Ok(())
}
