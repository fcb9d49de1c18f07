//! Delivery CLI - Cart and checkout from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Interactive session: build a cart and walk the four checkout steps
//! delivery shell
//!
//! # One-shot quick checkout
//! delivery checkout --item "Pizza=32.90" --item "Suco=8.50" --address "Rua A, 10"
//!
//! # Inspect or remove the saved profile address
//! delivery address show
//! delivery address forget
//! ```
//!
//! # Environment Variables
//!
//! - `DELIVERY_API_BASE_URL` - Delivery REST API base URL (optional)
//! - `DELIVERY_API_TOKEN` - Bearer token for the API
//! - `DELIVERY_USER_ID` - Signed-in user id
//! - `DELIVERY_FEE` - Flat delivery fee (default `5.00`)
//! - `DELIVERY_CURRENCY` - `BRL`, `USD` or `EUR` (default `BRL`)
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Error tracking
//! - `RUST_LOG` - Log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use delivery_checkout::CheckoutConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "delivery")]
#[command(author, version, about = "Delivery cart and checkout")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive cart and checkout session
    Shell,
    /// Place an order in one go with the quick checkout
    Checkout(commands::checkout::CheckoutArgs),
    /// Manage the saved profile address
    Address {
        #[command(subcommand)]
        action: AddressAction,
    },
}

#[derive(Subcommand)]
enum AddressAction {
    /// Print the saved address
    Show,
    /// Remove the saved address
    Forget,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CheckoutConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Logs go to stderr so they never mix with command output.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "delivery_checkout=info,delivery_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CheckoutConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CheckoutConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Shell => commands::shell::run(config).await?,
        Commands::Checkout(args) => commands::checkout::run(config, args).await?,
        Commands::Address { action } => match action {
            AddressAction::Show => commands::address::show(config).await?,
            AddressAction::Forget => commands::address::forget(config).await?,
        },
    }
    Ok(())
}
