//! Session-scoped commerce state for TurboCommerce storefronts.
//!
//! This crate holds what a shopper accumulates while browsing:
//!
//! - **Cart**: line items bounded by product inventory
//! - **Wishlist**: saved product snapshots with toggle semantics
//! - **Currency**: USD/NGN display with a live or fallback exchange rate
//!
//! [`CommerceState`] composes the three over a
//! [`SessionStorage`](turbo_cache::SessionStorage), persisting every change to
//! the active session record and pushing it to the remote user record.
//!
//! # Example
//!
//! ```rust,ignore
//! use turbo_commerce::prelude::*;
//!
//! let session = SessionStorage::new(durable, session_tier);
//! let mut state = CommerceState::init(session, &HttpRateSource::new(client.clone(), rates_url))
//!     .await
//!     .with_remote(Arc::new(HttpUserApi::new(client)));
//!
//! state.add_to_cart(&product, 1)?;
//! state.set_currency(Currency::NGN)?;
//! println!("Total: {}", state.format_price(Some(state.cart_total())));
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod currency;
pub mod notify;
pub mod session;
pub mod state;
pub mod sync;
pub mod wishlist;

pub use error::CommerceError;
pub use ids::{ProductId, UserId};
pub use money::{Currency, Money};
pub use state::CommerceState;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::{ProductId, UserId};
    pub use crate::money::{Currency, Money};

    pub use crate::cart::{Cart, CartLineItem};
    pub use crate::catalog::{Inventory, Product, VariantStock};
    pub use crate::currency::{CurrencyFormatter, HttpRateSource, RateSource, RateStatus};
    pub use crate::notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
    pub use crate::session::SessionRecord;
    pub use crate::state::CommerceState;
    pub use crate::sync::{
        BackoffStrategy, HttpUserApi, RemoteSync, RetryPolicy, SyncPolicy, SyncResult, SyncTicket,
    };
    pub use crate::wishlist::Wishlist;

    pub use turbo_cache::{Cache, SessionStorage, Tier};
}
