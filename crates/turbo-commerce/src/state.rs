//! Cart, wishlist and currency composed over one session.

use std::sync::Arc;

use turbo_cache::{SessionStorage, StorageEvent, StorageWatcher, Tier, SESSION_KEY};

use crate::cart::{Cart, CartLineItem};
use crate::catalog::Product;
use crate::currency::{CurrencyFormatter, RateSource, RateStatus, CURRENCY_KEY, DEFAULT_NGN_RATE};
use crate::error::CommerceError;
use crate::ids::{ProductId, UserId};
use crate::money::{Currency, Money};
use crate::notify::{Notice, Notifier, TracingNotifier};
use crate::session::SessionRecord;
use crate::sync::{
    spawn_push, NoopRemote, RemoteSync, SyncPolicy, SyncResult, SyncTicket, UserPatch,
};
use crate::wishlist::Wishlist;

/// The state a storefront UI drives.
///
/// Mutations are synchronous: the store changes in memory, the new array is
/// merged into the active session record, and a remote push is spawned. The
/// returned [`SyncTicket`] can be awaited or dropped.
///
/// Every rejection is returned as a [`CommerceError`] *and* reported through
/// the notifier. A rejected operation changes nothing.
///
/// # Example
///
/// ```rust,ignore
/// let session = SessionStorage::new(durable, session_tier);
/// let mut state = CommerceState::new(session)
///     .with_remote(Arc::new(HttpUserApi::new(client)))
///     .with_sync_policy(SyncPolicy::Retry(RetryPolicy::new(3)));
///
/// state.add_to_cart(&product, 2)?;
/// println!("{}", state.format_price(Some(state.cart_total())));
/// ```
pub struct CommerceState {
    cart: Cart,
    wishlist: Wishlist,
    currency: CurrencyFormatter,
    session: SessionStorage<SessionRecord>,
    remote: Arc<dyn RemoteSync>,
    notifier: Arc<dyn Notifier>,
    policy: SyncPolicy,
}

impl CommerceState {
    /// Hydrate from storage and fetch the live exchange rate once.
    ///
    /// This is the usual entry point; a failed fetch leaves
    /// [`DEFAULT_NGN_RATE`] in place.
    pub async fn init(session: SessionStorage<SessionRecord>, rates: &dyn RateSource) -> Self {
        let currency =
            CurrencyFormatter::init(session.tier(Tier::Durable).clone(), DEFAULT_NGN_RATE, rates).await;
        Self::new(session).with_currency(currency)
    }

    /// Hydrate from the active session record, if any, without fetching a
    /// rate.
    ///
    /// The currency selection is read from the durable tier. Remote pushes go
    /// nowhere until [`with_remote`](Self::with_remote) is called.
    pub fn new(session: SessionStorage<SessionRecord>) -> Self {
        let currency = CurrencyFormatter::load(session.tier(Tier::Durable).clone());
        let mut state = Self {
            cart: Cart::new(),
            wishlist: Wishlist::new(),
            currency,
            session,
            remote: Arc::new(NoopRemote),
            notifier: Arc::new(TracingNotifier),
            policy: SyncPolicy::default(),
        };
        state.reload_stores();
        state
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteSync>) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_currency(mut self, currency: CurrencyFormatter) -> Self {
        self.currency = currency;
        self
    }

    /// Parse an untyped product, reporting malformed input like any other
    /// rejection.
    pub fn parse_product(&self, value: serde_json::Value) -> Result<Product, CommerceError> {
        serde_json::from_value(value).map_err(|e| self.report(e.into()))
    }

    // Cart

    /// Add `quantity` of `product` to the cart.
    pub fn add_to_cart(&mut self, product: &Product, quantity: u32) -> Result<SyncTicket, CommerceError> {
        let new_quantity = self.cart.add(product, quantity).map_err(|e| self.report(e))?;
        tracing::debug!(product_id = %product.id, quantity = new_quantity, "added to cart");
        self.notify(Notice::success(format!("{} added to cart", product.name)));
        Ok(self.persist_cart())
    }

    /// Remove a product's line from the cart.
    pub fn remove_from_cart(&mut self, product_id: &ProductId) -> SyncTicket {
        if self.cart.remove(product_id) {
            tracing::debug!(product_id = %product_id, "removed from cart");
            self.notify(Notice::info("Item removed from cart"));
        }
        self.persist_cart()
    }

    /// Set a line's quantity.
    ///
    /// A quantity below one or a product not in the cart is ignored and
    /// yields a `Skipped` ticket.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<SyncTicket, CommerceError> {
        let changed = self
            .cart
            .update_quantity(product_id, quantity)
            .map_err(|e| self.report(e))?;
        if !changed {
            return Ok(SyncTicket::ready(SyncResult::Skipped));
        }
        tracing::debug!(product_id = %product_id, quantity, "cart quantity updated");
        Ok(self.persist_cart())
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) -> SyncTicket {
        self.cart.clear();
        tracing::debug!("cart cleared");
        self.persist_cart()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_lines(&self) -> &[CartLineItem] {
        self.cart.lines()
    }

    /// Sum of quantities.
    pub fn cart_count(&self) -> u64 {
        self.cart.count()
    }

    /// Sum of price × quantity in the base currency.
    pub fn cart_total(&self) -> Money {
        self.cart.total()
    }

    // Wishlist

    /// Save or unsave a product. Returns whether it is saved afterwards.
    pub fn toggle_wishlist(&mut self, product: &Product) -> Result<(bool, SyncTicket), CommerceError> {
        let saved = self.wishlist.toggle(product).map_err(|e| self.report(e))?;
        if saved {
            self.notify(Notice::success(format!("{} added to wishlist", product.name)));
        } else {
            self.notify(Notice::info(format!("{} removed from wishlist", product.name)));
        }
        Ok((saved, self.persist_wishlist()))
    }

    pub fn remove_from_wishlist(&mut self, product_id: &ProductId) -> SyncTicket {
        if self.wishlist.remove(product_id) {
            tracing::debug!(product_id = %product_id, "removed from wishlist");
        }
        self.persist_wishlist()
    }

    /// Move a saved product into the cart.
    ///
    /// The product leaves the wishlist only if the cart accepted it.
    pub fn move_to_cart(&mut self, product_id: &ProductId, quantity: u32) -> Result<SyncTicket, CommerceError> {
        let product = match self.wishlist.get(product_id) {
            Some(product) => product.clone(),
            None => {
                return Err(self.report(CommerceError::ItemNotInWishlist(product_id.to_string())))
            }
        };
        let cart_ticket = self.add_to_cart(&product, quantity)?;
        self.wishlist.remove(product_id);
        Ok(cart_ticket.merge(self.persist_wishlist()))
    }

    pub fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    pub fn wishlist_count(&self) -> usize {
        self.wishlist.count()
    }

    pub fn is_in_wishlist(&self, product_id: &ProductId) -> bool {
        self.wishlist.contains(product_id)
    }

    // Currency

    pub fn currency(&self) -> &CurrencyFormatter {
        &self.currency
    }

    pub fn selected_currency(&self) -> Currency {
        self.currency.selected()
    }

    /// Select and persist the display currency.
    pub fn set_currency(&mut self, currency: Currency) -> Result<(), CommerceError> {
        self.currency.set_currency(currency).map_err(|e| self.report(e))?;
        self.notify(Notice::info(format!("Prices shown in {currency}")));
        Ok(())
    }

    /// Select the display currency by code, rejecting unknown codes.
    pub fn set_currency_code(&mut self, code: &str) -> Result<(), CommerceError> {
        let currency: Currency = code.parse().map_err(|e| self.report(e))?;
        self.set_currency(currency)
    }

    /// Fetch the live exchange rate again. Failures keep the current rate.
    pub async fn refresh_rate(&mut self, source: &dyn RateSource) -> RateStatus {
        self.currency.refresh_rate(source).await
    }

    pub fn format_price(&self, amount: Option<Money>) -> String {
        self.currency.format_price(amount)
    }

    // Session

    pub fn session(&self) -> &SessionStorage<SessionRecord> {
        &self.session
    }

    /// Id of the signed-in user, if the active record has one.
    pub fn user_id(&self) -> Option<UserId> {
        self.load_record().and_then(|record| record.id)
    }

    /// Make `record` the active session and hydrate from it.
    pub fn sign_in(&mut self, record: &SessionRecord, remember_me: bool) -> Result<Tier, CommerceError> {
        let tier = self.session.sign_in(record, remember_me).map_err(|e| self.report(e.into()))?;
        tracing::info!(tier = tier.as_str(), "session started");
        self.reload_stores();
        Ok(tier)
    }

    /// End the session and empty both stores.
    pub fn sign_out(&mut self) -> Result<(), CommerceError> {
        self.session.sign_out().map_err(|e| self.report(e.into()))?;
        tracing::info!("session ended");
        self.reload_stores();
        Ok(())
    }

    /// Watch for writes made by other handles on the durable backend.
    pub fn watch(&self) -> StorageWatcher {
        self.session.watch()
    }

    /// Re-read the cart, wishlist and currency selection from storage,
    /// discarding in-memory state.
    pub fn reload(&mut self) {
        self.reload_stores();
        let status = self.currency.rate_status();
        self.currency = CurrencyFormatter::load(self.session.tier(Tier::Durable).clone()).with_status(status);
    }

    /// React to a storage event from another handle.
    ///
    /// Returns whether the state was reloaded.
    pub fn apply_storage_event(&mut self, event: &StorageEvent) -> bool {
        let relevant = match event.key.as_deref() {
            Some(key) => key == SESSION_KEY || key == CURRENCY_KEY,
            None => true,
        };
        if relevant {
            tracing::debug!(key = ?event.key, origin = ?event.origin, "reloading after storage change");
            self.reload();
        }
        relevant
    }

    fn load_record(&self) -> Option<SessionRecord> {
        match self.session.get() {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, "failed to read session record");
                None
            }
        }
    }

    fn reload_stores(&mut self) {
        match self.load_record() {
            Some(record) => {
                self.cart = Cart::from_lines(record.cart);
                self.wishlist = Wishlist::from_products(record.wishlist);
            }
            None => {
                self.cart = Cart::new();
                self.wishlist = Wishlist::new();
            }
        }
    }

    fn persist_cart(&self) -> SyncTicket {
        self.persist(UserPatch::Cart(self.cart.lines().to_vec()))
    }

    fn persist_wishlist(&self) -> SyncTicket {
        self.persist(UserPatch::Wishlist(self.wishlist.items().to_vec()))
    }

    /// Merge `patch` into the active record, then push it remotely.
    fn persist(&self, patch: UserPatch) -> SyncTicket {
        let user_id = match self.session.update(|record| patch.apply_to(record)) {
            Ok(Some(record)) => record.id,
            Ok(None) => {
                tracing::trace!(field = patch.field(), "no active session, keeping change in memory");
                None
            }
            Err(e) => {
                tracing::error!(field = patch.field(), error = %e, "failed to write session record");
                return SyncTicket::ready(SyncResult::Failed(format!("local write failed: {e}")));
            }
        };
        spawn_push(self.remote.clone(), user_id, patch, self.policy.clone())
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    /// Report a rejection through the notifier and hand the error back.
    ///
    /// Callers validating input outside the state use this so every
    /// rejection reaches the user the same way.
    pub fn report(&self, err: CommerceError) -> CommerceError {
        tracing::debug!(error = %err, "operation rejected");
        self.notifier.notify(Notice::from(&err));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Inventory;
    use crate::notify::{NoticeLevel, NoticeLog};
    use turbo_cache::Cache;

    fn product(id: &str, price: f64, stock: u32) -> Product {
        Product::new(
            ProductId::parse(id).unwrap(),
            format!("Product {id}"),
            Money::from_major(price, Currency::USD),
        )
        .unwrap()
        .with_inventory(Inventory::new(stock))
    }

    fn pid(id: &str) -> ProductId {
        ProductId::parse(id).unwrap()
    }

    fn signed_in() -> (CommerceState, Arc<NoticeLog>) {
        let session = SessionStorage::new(Cache::in_memory(), Cache::in_memory());
        session.sign_in(&SessionRecord::guest(), true).unwrap();
        let log = Arc::new(NoticeLog::new());
        let state = CommerceState::new(session).with_notifier(log.clone());
        (state, log)
    }

    #[test]
    fn test_add_persists_to_active_tier() {
        let (mut state, log) = signed_in();
        let _ = state.add_to_cart(&product("p1", 10.0, 5), 2).unwrap();

        let record = state.session().get().unwrap().unwrap();
        assert_eq!(record.cart.len(), 1);
        assert_eq!(record.cart[0].quantity, 2);
        assert_eq!(log.last().map(|n| n.level), Some(NoticeLevel::Success));
    }

    #[test]
    fn test_rejection_is_notified_and_changes_nothing() {
        let (mut state, log) = signed_in();
        let p = product("p1", 10.0, 5);
        let _ = state.add_to_cart(&p, 4).unwrap();
        log.drain();
        let before = state.session().get().unwrap();

        let err = state.add_to_cart(&p, 2).unwrap_err();
        assert_eq!(err.to_string(), "Only 5 items available");
        assert_eq!(state.cart_count(), 4);
        assert_eq!(state.session().get().unwrap(), before);
        assert_eq!(log.drain(), vec![Notice::error("Only 5 items available")]);
    }

    #[test]
    fn test_guest_changes_stay_in_memory() {
        let session = SessionStorage::new(Cache::in_memory(), Cache::in_memory());
        let mut state = CommerceState::new(session);
        let _ = state.add_to_cart(&product("p1", 10.0, 5), 1).unwrap();

        assert_eq!(state.cart_count(), 1);
        assert!(state.session().get().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_user_id_record_stays_writable() {
        let durable = Cache::in_memory();
        durable
            .set(SESSION_KEY, &serde_json::json!({"id": "", "cart": [], "wishlist": [], "name": "Ada"}))
            .unwrap();
        let mut state = CommerceState::new(SessionStorage::new(durable, Cache::in_memory()));
        assert!(state.user_id().is_none());

        let ticket = state.add_to_cart(&product("p1", 10.0, 5), 1).unwrap();
        assert_eq!(ticket.outcome().await, SyncResult::Skipped);

        let record = state.session().get().unwrap().unwrap();
        assert_eq!(record.cart.len(), 1);
        assert_eq!(record.extra["name"], "Ada");
    }

    #[test]
    fn test_malformed_entry_does_not_empty_stores() {
        let durable = Cache::in_memory();
        durable
            .set(
                SESSION_KEY,
                &serde_json::json!({
                    "id": "u1",
                    "cart": [{"id": "p1", "name": "Kaftan", "price": 30, "quantity": 2}, {"id": ""}],
                    "wishlist": [{"id": "w1", "name": "Gele", "price": 12}]
                }),
            )
            .unwrap();
        let state = CommerceState::new(SessionStorage::new(durable, Cache::in_memory()));

        assert_eq!(state.cart_count(), 2);
        assert_eq!(state.wishlist_count(), 1);
        assert_eq!(state.user_id().map(|id| id.into_inner()).as_deref(), Some("u1"));
    }

    #[test]
    fn test_update_quantity_noop_returns_skipped_ticket() {
        let (mut state, _) = signed_in();
        let ticket = state.update_quantity(&pid("ghost"), 2).unwrap();
        assert!(ticket.is_finished());
        assert!(state.cart().is_empty());
    }

    #[test]
    fn test_move_to_cart_keeps_wishlist_on_rejection() {
        let (mut state, _) = signed_in();
        let p = product("p1", 10.0, 1);
        let _ = state.toggle_wishlist(&p).unwrap();

        assert!(state.move_to_cart(&p.id, 2).is_err());
        assert!(state.is_in_wishlist(&p.id));

        let _ = state.move_to_cart(&p.id, 1).unwrap();
        assert!(!state.is_in_wishlist(&p.id));
        assert_eq!(state.cart_count(), 1);

        let record = state.session().get().unwrap().unwrap();
        assert!(record.wishlist.is_empty());
        assert_eq!(record.cart.len(), 1);
    }

    #[test]
    fn test_unknown_currency_code_is_reported() {
        let (mut state, log) = signed_in();
        assert!(state.set_currency_code("JPY").is_err());
        assert_eq!(state.selected_currency(), Currency::USD);
        assert_eq!(log.last().map(|n| n.level), Some(NoticeLevel::Error));
    }

    #[test]
    fn test_sign_out_empties_stores() {
        let (mut state, _) = signed_in();
        let _ = state.add_to_cart(&product("p1", 10.0, 5), 1).unwrap();
        state.sign_out().unwrap();
        assert!(state.cart().is_empty());
        assert!(state.session().get().unwrap().is_none());
    }

    #[test]
    fn test_malformed_product_is_reported() {
        let (state, log) = signed_in();
        let err = state
            .parse_product(serde_json::json!({"name": "No id", "price": 5}))
            .unwrap_err();
        assert!(matches!(err, CommerceError::SerializationError(_)));
        assert_eq!(log.last().map(|n| n.level), Some(NoticeLevel::Error));

        let err = state
            .parse_product(serde_json::json!({"id": "  ", "name": "Blank", "price": 5}))
            .unwrap_err();
        assert!(matches!(err, CommerceError::SerializationError(_)));
    }

    #[test]
    fn test_storage_event_filter() {
        let (mut state, _) = signed_in();
        let unrelated = StorageEvent {
            key: Some("theme".to_string()),
            origin: None,
        };
        assert!(!state.apply_storage_event(&unrelated));
        let lagged = StorageEvent { key: None, origin: None };
        assert!(state.apply_storage_event(&lagged));
    }
}
