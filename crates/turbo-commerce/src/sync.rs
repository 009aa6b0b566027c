//! Pushing cart and wishlist changes to the remote user record.
//!
//! Pushes are spawned onto the tokio runtime and never block the mutation
//! that caused them. Each push yields a [`SyncTicket`] the caller may await
//! for the outcome or simply drop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use turbo_data::FetchClient;

use crate::cart::CartLineItem;
use crate::catalog::Product;
use crate::error::CommerceError;
use crate::ids::UserId;
use crate::session::SessionRecord;

/// A partial update of the remote user record.
///
/// Serializes as `{"cart": [...]}` or `{"wishlist": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserPatch {
    Cart(Vec<CartLineItem>),
    Wishlist(Vec<Product>),
}

impl UserPatch {
    /// Name of the record field this patch replaces.
    pub fn field(&self) -> &'static str {
        match self {
            UserPatch::Cart(_) => "cart",
            UserPatch::Wishlist(_) => "wishlist",
        }
    }

    /// Replace the matching array of a local record.
    pub fn apply_to(&self, record: &mut SessionRecord) {
        match self {
            UserPatch::Cart(lines) => record.cart = lines.clone(),
            UserPatch::Wishlist(products) => record.wishlist = products.clone(),
        }
    }
}

/// Remote store for user records.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    async fn patch_user(&self, id: &UserId, patch: &UserPatch) -> Result<(), CommerceError>;
}

/// `PATCH {base_url}/users/{id}` over HTTP.
#[derive(Clone)]
pub struct HttpUserApi {
    client: FetchClient,
}

impl HttpUserApi {
    /// `client` should carry the API base URL.
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteSync for HttpUserApi {
    #[tracing::instrument(skip(self, patch), fields(user_id = %id, field = patch.field()))]
    async fn patch_user(&self, id: &UserId, patch: &UserPatch) -> Result<(), CommerceError> {
        self.client
            .patch(format!("users/{id}"))
            .json(patch)?
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// A remote that accepts and discards every patch.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRemote;

#[async_trait]
impl RemoteSync for NoopRemote {
    async fn patch_user(&self, _id: &UserId, _patch: &UserPatch) -> Result<(), CommerceError> {
        Ok(())
    }
}

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    None,
    Fixed(Duration),
    /// Doubles from `base` on each attempt, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl BackoffStrategy {
    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(d) => *d,
            Self::Exponential { base, max } => {
                let multiplier = 2u32.saturating_pow(attempt);
                base.saturating_mul(multiplier).min(*max)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(200),
            max: Duration::from_secs(5),
        }
    }
}

/// Bounded retry of transient failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::default(),
        }
    }

    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    /// Whether to retry after failed attempt number `attempt` (0-indexed).
    pub fn should_retry(&self, error: &CommerceError, attempt: u32) -> bool {
        attempt < self.max_attempts && error.is_transient()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// What to do when a push fails.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SyncPolicy {
    /// Log the failure and move on.
    #[default]
    LogOnly,
    /// Retry transient failures, then log.
    Retry(RetryPolicy),
}

/// Outcome of one remote push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncResult {
    Synced,
    /// No remote identity, nothing was sent.
    Skipped,
    Failed(String),
}

impl SyncResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncResult::Failed(_))
    }
}

enum Part {
    Ready(SyncResult),
    Spawned(JoinHandle<SyncResult>),
}

/// Handle to zero or more spawned pushes.
///
/// Dropping it does not cancel anything.
#[must_use = "await `outcome()` or drop the ticket explicitly"]
pub struct SyncTicket {
    parts: Vec<Part>,
}

impl SyncTicket {
    /// A ticket that already has its outcome.
    pub fn ready(result: SyncResult) -> Self {
        Self {
            parts: vec![Part::Ready(result)],
        }
    }

    /// A ticket for no pushes at all; resolves to `Skipped`.
    pub fn none() -> Self {
        Self { parts: Vec::new() }
    }

    fn spawned(handle: JoinHandle<SyncResult>) -> Self {
        Self {
            parts: vec![Part::Spawned(handle)],
        }
    }

    /// Combine two tickets into one.
    pub fn merge(mut self, other: SyncTicket) -> Self {
        self.parts.extend(other.parts);
        self
    }

    /// Whether every push has completed.
    pub fn is_finished(&self) -> bool {
        self.parts.iter().all(|part| match part {
            Part::Ready(_) => true,
            Part::Spawned(handle) => handle.is_finished(),
        })
    }

    /// Wait for every push.
    ///
    /// The first failure wins; otherwise `Synced` if anything was sent and
    /// `Skipped` if nothing was.
    pub async fn outcome(self) -> SyncResult {
        let mut combined = SyncResult::Skipped;
        for part in self.parts {
            let result = match part {
                Part::Ready(result) => result,
                Part::Spawned(handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => SyncResult::Failed(format!("sync task aborted: {e}")),
                },
            };
            combined = match (combined, result) {
                (failed @ SyncResult::Failed(_), _) => failed,
                (_, failed @ SyncResult::Failed(_)) => failed,
                (SyncResult::Synced, _) | (_, SyncResult::Synced) => SyncResult::Synced,
                _ => SyncResult::Skipped,
            };
        }
        combined
    }
}

impl std::fmt::Debug for SyncTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncTicket")
            .field("parts", &self.parts.len())
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Spawn a push of `patch` for `user_id`.
///
/// Returns a ready `Skipped` ticket for guests and a ready `Failed` ticket
/// when called outside a tokio runtime.
pub fn spawn_push(
    remote: Arc<dyn RemoteSync>,
    user_id: Option<UserId>,
    patch: UserPatch,
    policy: SyncPolicy,
) -> SyncTicket {
    let Some(user_id) = user_id else {
        tracing::trace!(field = patch.field(), "no user id, skipping remote sync");
        return SyncTicket::ready(SyncResult::Skipped);
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => SyncTicket::spawned(
            handle.spawn(async move { push(remote.as_ref(), &user_id, &patch, &policy).await }),
        ),
        Err(_) => {
            tracing::error!(user_id = %user_id, field = patch.field(), "no async runtime for remote sync");
            SyncTicket::ready(SyncResult::Failed("no async runtime".to_string()))
        }
    }
}

/// Send `patch` and apply `policy` to failures.
pub async fn push(
    remote: &dyn RemoteSync,
    user_id: &UserId,
    patch: &UserPatch,
    policy: &SyncPolicy,
) -> SyncResult {
    let mut attempt = 0;
    loop {
        match remote.patch_user(user_id, patch).await {
            Ok(()) => {
                tracing::debug!(user_id = %user_id, field = patch.field(), attempt, "remote sync complete");
                return SyncResult::Synced;
            }
            Err(e) => match policy {
                SyncPolicy::Retry(retry) if retry.should_retry(&e, attempt) => {
                    let delay = retry.backoff.delay_for_attempt(attempt);
                    tracing::warn!(
                        user_id = %user_id,
                        field = patch.field(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "remote sync failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                _ => {
                    tracing::error!(user_id = %user_id, field = patch.field(), error = %e, "remote sync failed");
                    return SyncResult::Failed(e.to_string());
                }
            },
        }
    }
}
