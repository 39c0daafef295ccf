//! # Gallery Passkey CLI
//!
//! Inspect and manage the passkeys of a gallery account from a terminal.
//! Runs on a headless platform, so it can list and delete passkeys but not
//! perform ceremonies.
//!
//! Configuration comes from the environment (see `config`); management calls
//! need `GALLERY_SESSION_COOKIE` set to a signed-in session.

use clap::{Parser, Subcommand};
use gallery_passkey::platform::Headless;
use gallery_passkey::{ClientConfig, PasskeyService};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "gallery-passkey", about = "Manage gallery passkeys")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show client capabilities and whether the gallery offers passkey login
    Status,
    /// List registered passkeys
    List,
    /// Delete a passkey by id
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gallery_passkey=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::from_env()?;
    tracing::debug!(origin = %config.base_url, "configuration loaded");

    let service = PasskeyService::new(config, Arc::new(Headless))?;

    match cli.command {
        Command::Status => {
            let capabilities = service.capabilities();
            println!("webauthn supported:     {}", capabilities.supported);
            println!("conditional ui:         {}", capabilities.conditional_ui_supported);
            println!(
                "platform authenticator: {}",
                service.is_platform_authenticator_available().await
            );
            match service.server_availability().await {
                Ok(available) => println!("gallery passkey login:  {available}"),
                Err(e) => println!("gallery passkey login:  unknown ({e})"),
            }
        }
        Command::List => {
            let passkeys = service.list_passkeys().await?;
            if passkeys.is_empty() {
                println!("No passkeys registered");
            }
            for passkey in passkeys {
                let created = passkey
                    .created_at_utc()
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let last_used = passkey
                    .last_used_at_utc()
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{}\t{}\tcreated {}\tlast used {}",
                    passkey.id, passkey.name, created, last_used
                );
            }
        }
        Command::Delete { id } => {
            let outcome = service.delete_passkey(&id).await?;
            println!("deleted: {} ({})", outcome.success, outcome.deleted);
        }
    }

    Ok(())
}
