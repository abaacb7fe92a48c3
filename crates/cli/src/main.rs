//! SwiftCart CLI - drive the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Load the catalog and write the rendered storefront page
//! swiftcart render --output storefront.html
//!
//! # Work with the persisted cart
//! swiftcart add 3
//! swiftcart set-quantity 3 5
//! swiftcart cart
//!
//! # Place the order without prompting
//! swiftcart checkout --yes
//!
//! # Replay shopper commands against a fresh page load
//! swiftcart exec select-category:jewelery add-to-cart:5 show-details:5
//! ```
//!
//! # Commands
//!
//! - `render` - Initial page load, optionally filtered to a category
//! - `cart` - Show the persisted cart
//! - `add`, `buy`, `remove`, `set-quantity` - Cart changes
//! - `details` - Product detail markup
//! - `checkout` - Place the order
//! - `exec` - Run a sequence of shopper commands

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use swiftcart_core::{CategoryFilter, ProductId};
use swiftcart_storefront::config::StorefrontConfig;
use swiftcart_storefront::orchestrator::Command;
use swiftcart_storefront::render::CheckoutPolicy;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "swiftcart")]
#[command(author, version, about = "SwiftCart storefront CLI")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the storefront and write the rendered page
    Render {
        /// Category to select after the initial load
        #[arg(short, long)]
        category: Option<CategoryFilter>,

        /// Write the page to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the persisted cart
    Cart,
    /// Add one unit of a product to the cart
    Add {
        /// Product id
        id: ProductId,
    },
    /// Add a product to the cart and show the cart
    Buy {
        /// Product id
        id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product id
        id: ProductId,
    },
    /// Set a cart line's quantity (0 or less removes the line)
    SetQuantity {
        /// Product id
        id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Show a product's details
    Details {
        /// Product id
        id: ProductId,
    },
    /// Place an order for everything in the cart
    Checkout {
        /// Confirm the order without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Load the storefront, run shopper commands in order, and write the page
    Exec {
        /// Commands such as `add-to-cart:3` or `select-category:electronics`
        #[arg(required = true)]
        commands: Vec<Command>,

        /// Write the page to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
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

/// Initialize tracing with `EnvFilter` and Sentry integration.
///
/// Logs go to stderr; stdout carries command output.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "swiftcart_storefront=info,swiftcart_cli=info".into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration first; Sentry must be initialized before tracing
    let config = StorefrontConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing(cli.json_logs);

    let result: Result<(), Box<dyn std::error::Error>> = match config {
        Ok(config) => run(cli.command, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let policy = match &command {
        Commands::Checkout { yes: true } => CheckoutPolicy::AutoConfirm,
        _ => CheckoutPolicy::Decline,
    };
    let shop = commands::open(config, policy)?;
    let mut out = std::io::stdout().lock();

    match command {
        Commands::Render { category, output } => {
            commands::render(&shop, category, output.as_deref(), &mut out).await?;
        }
        Commands::Cart => commands::show_cart(&shop, &mut out)?,
        Commands::Add { id } => commands::add(&shop, id, &mut out).await?,
        Commands::Buy { id } => commands::buy(&shop, id, &mut out).await?,
        Commands::Remove { id } => commands::remove(&shop, id, &mut out)?,
        Commands::SetQuantity { id, quantity } => {
            commands::set_quantity(&shop, id, quantity, &mut out)?;
        }
        Commands::Details { id } => commands::details(&shop, id, &mut out).await?,
        Commands::Checkout { .. } => commands::checkout(&shop, &mut out)?,
        Commands::Exec { commands, output } => {
            commands::exec(&shop, commands, output.as_deref(), &mut out).await?;
        }
    }
    Ok(())
}
