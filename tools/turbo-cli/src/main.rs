//! Turbo CLI - drive TurboCommerce session state from a terminal.
//!
//! Commands:
//! - `turbo cart` - Add, remove and update cart lines
//! - `turbo wishlist` - Save products and move them to the cart
//! - `turbo currency` - Select the display currency and format prices
//! - `turbo session` - Sign in or out of the local session
//! - `turbo config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use turbo_commerce::CommerceError;

use commands::{CartArgs, ConfigArgs, CurrencyArgs, SessionArgs, WishlistArgs};

/// Turbo CLI - Cart, wishlist and currency for TurboCommerce storefronts
#[derive(Parser)]
#[command(name = "turbo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the cart
    Cart(CartArgs),

    /// Manage the wishlist
    Wishlist(WishlistArgs),

    /// Select and format the display currency
    Currency(CurrencyArgs),

    /// Manage the local session
    Session(SessionArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = context::Context::load(cli.config.as_deref(), output)?;

    let result = match cli.command {
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Wishlist(args) => commands::wishlist::run(args, &ctx).await,
        Commands::Currency(args) => commands::currency::run(args, &ctx).await,
        Commands::Session(args) => commands::session::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        // Commerce rejections have already been shown by the notifier.
        if e.downcast_ref::<CommerceError>().is_none() {
            ctx.output.error(&format!("{:#}", e));
        }
        std::process::exit(1);
    }

    Ok(())
}
