//! Display currency selection, exchange rate and price formatting.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use turbo_cache::Cache;
use turbo_data::FetchClient;

use crate::error::CommerceError;
use crate::money::{Currency, Money};

/// Cache key the selected currency code is persisted under.
pub const CURRENCY_KEY: &str = "currency";

/// NGN per USD used until a live rate arrives.
pub const DEFAULT_NGN_RATE: f64 = 1500.0;

/// Public USD-based rates endpoint.
pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// A source of exchange rates from the base currency.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Units of `target` per one unit of [`Currency::BASE`].
    async fn fetch_rate(&self, target: Currency) -> Result<f64, CommerceError>;
}

/// Rates from an HTTP endpoint returning `{ "rates": { "NGN": 1530.2, ... } }`.
#[derive(Clone)]
pub struct HttpRateSource {
    client: FetchClient,
    url: String,
}

#[derive(Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

impl HttpRateSource {
    pub fn new(client: FetchClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn fetch_rate(&self, target: Currency) -> Result<f64, CommerceError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let body: RatesResponse = response.error_for_status()?.json()?;
        body.rates
            .get(target.code())
            .copied()
            .ok_or_else(|| CommerceError::RateUnavailable(format!("no {target} rate in response")))
    }
}

/// Which rate a formatter is using.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateStatus {
    /// Freshly fetched.
    Live(f64),
    /// Configured or previous rate; no live fetch has succeeded.
    Fallback(f64),
}

impl RateStatus {
    pub fn rate(&self) -> f64 {
        match self {
            RateStatus::Live(rate) | RateStatus::Fallback(rate) => *rate,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, RateStatus::Live(_))
    }
}

/// Selected display currency plus the NGN exchange rate.
///
/// The code is persisted on every change. The rate is volatile: a formatter
/// built with [`init`](Self::init) fetches it once on creation and keeps the
/// fallback if that fails.
#[derive(Clone)]
pub struct CurrencyFormatter {
    cache: Cache,
    selected: Currency,
    status: RateStatus,
}

impl CurrencyFormatter {
    /// Load the persisted selection, then fetch the live rate once.
    ///
    /// `fallback_rate` is used when the fetch fails or returns an unusable
    /// value.
    pub async fn init(cache: Cache, fallback_rate: f64, source: &dyn RateSource) -> Self {
        let mut formatter = Self::load(cache).with_rate(fallback_rate);
        formatter.refresh_rate(source).await;
        formatter
    }

    /// Load the persisted code from `cache`, defaulting to the base currency,
    /// without touching the network.
    ///
    /// An unreadable or unknown persisted value is logged and ignored.
    pub fn load(cache: Cache) -> Self {
        let selected = match cache.get::<String>(CURRENCY_KEY) {
            Ok(Some(code)) => Currency::from_code(&code).unwrap_or_else(|| {
                tracing::warn!(%code, "ignoring unsupported persisted currency");
                Currency::BASE
            }),
            Ok(None) => Currency::BASE,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted currency");
                Currency::BASE
            }
        };

        Self {
            cache,
            selected,
            status: RateStatus::Fallback(DEFAULT_NGN_RATE),
        }
    }

    /// Start from a specific fallback rate instead of [`DEFAULT_NGN_RATE`].
    ///
    /// Non-finite or non-positive rates are ignored.
    pub fn with_rate(mut self, rate: f64) -> Self {
        if usable(rate) {
            self.status = RateStatus::Fallback(rate);
        }
        self
    }

    /// Carry over a rate obtained by another formatter.
    pub fn with_status(mut self, status: RateStatus) -> Self {
        if usable(status.rate()) {
            self.status = status;
        }
        self
    }

    pub fn selected(&self) -> Currency {
        self.selected
    }

    pub fn rate(&self) -> f64 {
        self.status.rate()
    }

    /// The rate in use and whether it came from a live fetch.
    pub fn rate_status(&self) -> RateStatus {
        self.status
    }

    /// Select and persist a currency.
    pub fn set_currency(&mut self, currency: Currency) -> Result<(), CommerceError> {
        self.cache.set(CURRENCY_KEY, currency.code())?;
        self.selected = currency;
        tracing::debug!(currency = %currency, "currency selected");
        Ok(())
    }

    /// Select a currency by code.
    pub fn set_currency_code(&mut self, code: &str) -> Result<(), CommerceError> {
        let currency: Currency = code.parse()?;
        self.set_currency(currency)
    }

    /// Fetch the live NGN rate once.
    ///
    /// Failure is logged and leaves the current rate in place; it is never
    /// retried.
    pub async fn refresh_rate(&mut self, source: &dyn RateSource) -> RateStatus {
        match source.fetch_rate(Currency::NGN).await {
            Ok(rate) if usable(rate) => {
                self.status = RateStatus::Live(rate);
                tracing::debug!(rate, "exchange rate refreshed");
            }
            Ok(rate) => {
                tracing::warn!(rate, "ignoring unusable exchange rate");
                self.status = RateStatus::Fallback(self.rate());
            }
            Err(e) => {
                tracing::warn!(error = %e, rate = self.rate(), "exchange rate fetch failed, using fallback");
                self.status = RateStatus::Fallback(self.rate());
            }
        }
        self.status
    }

    /// Convert `amount` into the selected currency.
    ///
    /// Amounts already in the selected currency are returned as-is.
    pub fn convert(&self, amount: Money) -> Money {
        if amount.currency == self.selected {
            return amount;
        }
        match (amount.currency, self.selected) {
            (Currency::USD, Currency::NGN) => amount.convert(self.rate(), Currency::NGN),
            (Currency::NGN, Currency::USD) => amount.convert(1.0 / self.rate(), Currency::USD),
            _ => amount,
        }
    }

    /// Format a price for display in the selected currency.
    ///
    /// `None` formats as an empty string.
    pub fn format_price(&self, amount: Option<Money>) -> String {
        match amount {
            Some(amount) => self.convert(amount).display_whole(),
            None => String::new(),
        }
    }
}

fn usable(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedRate(Result<f64, ()>, AtomicU32);

    impl FixedRate {
        fn ok(rate: f64) -> Self {
            Self(Ok(rate), AtomicU32::new(0))
        }

        fn failing() -> Self {
            Self(Err(()), AtomicU32::new(0))
        }
    }

    #[async_trait]
    impl RateSource for FixedRate {
        async fn fetch_rate(&self, _target: Currency) -> Result<f64, CommerceError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            self.0
                .map_err(|_| CommerceError::RateUnavailable("offline".to_string()))
        }
    }

    fn usd(amount: f64) -> Option<Money> {
        Some(Money::from_major(amount, Currency::USD))
    }

    #[test]
    fn test_defaults_to_base_currency() {
        let fmt = CurrencyFormatter::load(Cache::in_memory());
        assert_eq!(fmt.selected(), Currency::USD);
        assert_eq!(fmt.rate(), DEFAULT_NGN_RATE);
    }

    #[test]
    fn test_format_usd() {
        let fmt = CurrencyFormatter::load(Cache::in_memory());
        assert_eq!(fmt.format_price(usd(1234.5)), "$1,235");
        assert_eq!(fmt.format_price(usd(0.0)), "$0");
        assert_eq!(fmt.format_price(usd(-2.5)), "-$3");
        assert_eq!(fmt.format_price(None), "");
    }

    #[test]
    fn test_format_ngn_uses_rate() {
        let mut fmt = CurrencyFormatter::load(Cache::in_memory());
        fmt.set_currency(Currency::NGN).unwrap();
        assert_eq!(fmt.format_price(usd(100.0)), "\u{20a6}150,000");

        let fmt = fmt.with_rate(1600.0);
        assert_eq!(fmt.format_price(usd(1.0)), "\u{20a6}1,600");
    }

    #[test]
    fn test_amount_already_in_selected_currency_not_reconverted() {
        let mut fmt = CurrencyFormatter::load(Cache::in_memory());
        fmt.set_currency(Currency::NGN).unwrap();
        let naira = Money::from_major(5000.0, Currency::NGN);
        assert_eq!(fmt.format_price(Some(naira)), "\u{20a6}5,000");
    }

    #[test]
    fn test_selection_persists() {
        let cache = Cache::in_memory();
        let mut fmt = CurrencyFormatter::load(cache.clone());
        fmt.set_currency_code("NGN").unwrap();

        assert_eq!(cache.get::<String>(CURRENCY_KEY).unwrap().as_deref(), Some("NGN"));
        assert_eq!(CurrencyFormatter::load(cache).selected(), Currency::NGN);
    }

    #[test]
    fn test_unknown_code_rejected() {
        let cache = Cache::in_memory();
        let mut fmt = CurrencyFormatter::load(cache.clone());
        let err = fmt.set_currency_code("EUR").unwrap_err();
        assert!(matches!(err, CommerceError::UnsupportedCurrency(c) if c == "EUR"));
        assert_eq!(fmt.selected(), Currency::USD);
        assert!(!cache.exists(CURRENCY_KEY).unwrap());
    }

    #[test]
    fn test_unknown_persisted_code_falls_back() {
        let cache = Cache::in_memory();
        cache.set(CURRENCY_KEY, "GBP").unwrap();
        assert_eq!(CurrencyFormatter::load(cache).selected(), Currency::USD);
    }

    #[tokio::test]
    async fn test_refresh_rate_live() {
        let mut fmt = CurrencyFormatter::load(Cache::in_memory());
        let status = fmt.refresh_rate(&FixedRate::ok(1550.0)).await;
        assert_eq!(status, RateStatus::Live(1550.0));
        assert_eq!(fmt.rate(), 1550.0);
    }

    #[tokio::test]
    async fn test_init_fetches_live_rate_once() {
        let cache = Cache::in_memory();
        cache.set(CURRENCY_KEY, "NGN").unwrap();
        let source = FixedRate::ok(1600.0);

        let fmt = CurrencyFormatter::init(cache, DEFAULT_NGN_RATE, &source).await;
        assert_eq!(source.1.load(Ordering::SeqCst), 1);
        assert_eq!(fmt.rate_status(), RateStatus::Live(1600.0));
        assert_eq!(fmt.format_price(usd(100.0)), "\u{20a6}160,000");
    }

    #[tokio::test]
    async fn test_init_offline_uses_configured_fallback() {
        let fmt = CurrencyFormatter::init(Cache::in_memory(), 1450.0, &FixedRate::failing()).await;
        assert_eq!(fmt.rate_status(), RateStatus::Fallback(1450.0));
    }

    #[tokio::test]
    async fn test_refresh_rate_failure_keeps_fallback_without_retry() {
        let mut fmt = CurrencyFormatter::load(Cache::in_memory());
        let source = FixedRate::failing();
        let status = fmt.refresh_rate(&source).await;

        assert_eq!(status, RateStatus::Fallback(DEFAULT_NGN_RATE));
        assert!(!status.is_live());
        assert_eq!(source.1.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_rate_rejects_nonpositive() {
        let mut fmt = CurrencyFormatter::load(Cache::in_memory());
        let status = fmt.refresh_rate(&FixedRate::ok(0.0)).await;
        assert_eq!(status, RateStatus::Fallback(DEFAULT_NGN_RATE));
    }

    #[tokio::test]
    async fn test_http_rate_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "base": "USD",
                "rates": {"USD": 1, "NGN": 1532.75}
            })))
            .mount(&server)
            .await;

        let source = HttpRateSource::new(
            FetchClient::new(),
            format!("{}/v4/latest/USD", server.uri()),
        );
        assert_eq!(source.fetch_rate(Currency::NGN).await.unwrap(), 1532.75);
    }

    #[tokio::test]
    async fn test_http_rate_source_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpRateSource::new(FetchClient::new(), server.uri());
        let mut fmt = CurrencyFormatter::load(Cache::in_memory());
        assert_eq!(
            fmt.refresh_rate(&source).await,
            RateStatus::Fallback(DEFAULT_NGN_RATE)
        );
    }
}
