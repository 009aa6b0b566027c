//! CLI command implementations.

pub mod cart;
pub mod config;
pub mod currency;
pub mod session;
pub mod wishlist;

use clap::{Args, Subcommand};

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: CartCommand,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Add a product to the cart.
    Add {
        /// Product JSON file, or a product id to fetch from the API.
        product: String,

        /// Quantity to add.
        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },
    /// Remove a product's line.
    Remove {
        /// Product id.
        id: String,
    },
    /// Set a line's quantity exactly.
    Set {
        /// Product id.
        id: String,
        /// New quantity (values below 1 are ignored).
        quantity: u32,
    },
    /// Empty the cart.
    Clear,
    /// Show cart lines and totals.
    Show,
}

/// Arguments for the wishlist command.
#[derive(Args)]
pub struct WishlistArgs {
    #[command(subcommand)]
    pub command: WishlistCommand,
}

#[derive(Subcommand)]
pub enum WishlistCommand {
    /// Save a product, or unsave it if already saved.
    Toggle {
        /// Product JSON file, or a product id to fetch from the API.
        product: String,
    },
    /// Remove a saved product.
    Remove {
        /// Product id.
        id: String,
    },
    /// Move a saved product into the cart.
    Move {
        /// Product id.
        id: String,

        /// Quantity to add to the cart.
        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },
    /// Show saved products.
    Show,
}

/// Arguments for the currency command.
#[derive(Args)]
pub struct CurrencyArgs {
    #[command(subcommand)]
    pub command: CurrencyCommand,
}

#[derive(Subcommand)]
pub enum CurrencyCommand {
    /// Select the display currency (USD or NGN).
    Set {
        /// Currency code.
        code: String,
    },
    /// Show the selected currency and rate.
    Show,
    /// Format a USD amount in the selected currency.
    Format {
        /// Amount in USD.
        #[arg(allow_hyphen_values = true)]
        amount: f64,
    },
}

/// Arguments for the session command.
#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Start a session.
    SignIn {
        /// Remote user id. Omit for a guest session.
        user_id: Option<String>,

        /// Keep the session in the session-only tier regardless of config.
        #[arg(long)]
        session_only: bool,
    },
    /// End the session.
    SignOut,
    /// Show the active session.
    Show,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}
