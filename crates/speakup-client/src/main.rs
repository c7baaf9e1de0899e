//! # speakup-sos
//!
//! Terminal front end for the SOS controller.
//!
//! ```text
//! speakup-sos contacts list
//! speakup-sos contacts add "Alex" alex@example.com
//! speakup-sos contacts remove 1
//! speakup-sos trigger
//! speakup-sos hotlines
//! ```
//!
//! `trigger` runs the full countdown; Ctrl+C during the countdown cancels
//! it without sending anything. Crisis hotlines and safety steps are
//! printed whenever an attempt fails.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use speakup_client::dispatch::HttpDispatcher;
use speakup_client::location::{CommandLocation, LocationProvider, NoLocation, StaticLocation};
use speakup_client::support::support_resources;
use speakup_client::{
    ActivateOutcome, ClientConfig, FailureCause, SosController, SosOutcome, SosState,
};
use speakup_store::{ContactBook, ContactRepository, SqliteContactStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "Send an SOS alert to your emergency contacts")]
struct Args {
    /// Dispatch service URL (overrides SPEAKUP_SERVER_URL).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Contact database (overrides SPEAKUP_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage emergency contacts.
    Contacts {
        #[command(subcommand)]
        action: ContactsAction,
    },
    /// Start the SOS countdown and send the alert.
    Trigger,
    /// Crisis hotlines and safety steps.
    Hotlines,
}

#[derive(Subcommand, Debug)]
enum ContactsAction {
    List,
    Add { name: String, email: String },
    /// Remove by the number shown in `contacts list`.
    Remove { number: usize },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,speakup_client=info,speakup_store=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = ClientConfig::from_env();
    if let Some(server) = args.server {
        config.server_url = server;
    }
    if let Some(db) = args.db {
        config.db_path = Some(db);
    }

    let store = match &config.db_path {
        Some(path) => SqliteContactStore::open_at(path),
        None => SqliteContactStore::open_default(),
    }
    .context("opening contact database")?;
    let repo: Arc<dyn ContactRepository> = Arc::new(store);

    let controller = SosController::new(
        ContactBook::new(repo),
        location_provider(&config),
        Arc::new(HttpDispatcher::new(&config.server_url)),
        config.controller_settings(),
    );

    match args.command {
        Command::Contacts { action } => {
            manage_contacts(&controller, action)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Trigger => {
            info!(server = %config.server_url, "SOS triggered from terminal");
            let sent = trigger(&controller, config.countdown_secs).await?;
            Ok(if sent { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Command::Hotlines => {
            print!("{}", support_resources());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// A location command wins over a fixed position.
fn location_provider(config: &ClientConfig) -> Arc<dyn LocationProvider> {
    if let Some(cmd) = config
        .location_command
        .as_deref()
        .and_then(CommandLocation::from_command_line)
    {
        return Arc::new(cmd);
    }
    match config.static_location {
        Some(fix) => Arc::new(StaticLocation(fix)),
        None => Arc::new(NoLocation),
    }
}

fn manage_contacts(controller: &SosController, action: ContactsAction) -> anyhow::Result<()> {
    match action {
        ContactsAction::List => {
            let contacts = controller.contacts()?;
            if contacts.is_empty() {
                println!("No emergency contacts yet. Add one with `speakup-sos contacts add`.");
            }
            for (i, contact) in contacts.iter().enumerate() {
                println!("{:>3}. {} <{}>", i + 1, contact.name, contact.email);
            }
        }
        ContactsAction::Add { name, email } => {
            let contact = controller.add_contact(&name, &email)?;
            println!("Added {} <{}>", contact.name, contact.email);
        }
        ContactsAction::Remove { number } => {
            let index = number
                .checked_sub(1)
                .ok_or_else(|| anyhow!("contact numbers start at 1"))?;
            let contact = controller.remove_contact(index)?;
            println!("Removed {} <{}>", contact.name, contact.email);
        }
    }
    Ok(())
}

/// Drive one attempt to its end. Returns whether anyone was notified.
async fn trigger(controller: &SosController, countdown_secs: u32) -> anyhow::Result<bool> {
    match controller.activate() {
        ActivateOutcome::CountdownStarted { contacts } => {
            println!(
                "Sending SOS to {contacts} contact(s) in {countdown_secs} seconds. Press Ctrl+C to cancel."
            );
            println!("  {countdown_secs}...");
        }
        ActivateOutcome::AwaitingContacts => {
            println!("{}", FailureCause::MissingContacts.remediation());
            controller.dismiss();
            return Ok(false);
        }
        ActivateOutcome::Failed(failure) => {
            println!("{}", failure.message);
            println!("  ({})", failure.detail);
            println!();
            print!("{}", support_resources());
            return Ok(false);
        }
        ActivateOutcome::Ignored => return Err(anyhow!("an SOS attempt is already in progress")),
    }

    let mut states = controller.subscribe();
    loop {
        tokio::select! {
            changed = states.changed() => {
                changed.context("SOS controller stopped")?;
                let state = states.borrow_and_update().clone();
                match state {
                    SosState::CountingDown { remaining, .. } => println!("  {remaining}..."),
                    SosState::Dispatching { contacts } => println!("Alerting {contacts} contact(s)..."),
                    SosState::Completed(outcome) => {
                        report(&outcome);
                        controller.dismiss();
                        return Ok(outcome.is_success());
                    }
                    SosState::Idle | SosState::AwaitingContacts => return Ok(false),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if controller.cancel() {
                    println!("SOS cancelled. No alerts were sent.");
                    return Ok(false);
                }
                println!("The alert is already being sent and can no longer be cancelled.");
            }
        }
    }
}

fn report(outcome: &SosOutcome) {
    match outcome {
        SosOutcome::Sent {
            result,
            location,
            location_warning,
        } => {
            println!("SOS alert sent: {}", outcome.headline());
            if !result.all_delivered() {
                println!("  {} contact(s) could not be reached", result.failed);
            }
            if let Some(location) = location {
                println!(
                    "  Location shared: {} ({})",
                    location.display_coordinates(),
                    location.maps_url()
                );
            }
            if let Some(warning) = location_warning {
                println!("  Sent without location: {warning}");
            }
        }
        SosOutcome::Failed(failure) => {
            println!("{}", failure.message);
            println!("  ({})", failure.detail);
            println!();
            print!("{}", support_resources());
        }
    }
}
