//! Caching, retrying consumer of [`StatsAggregator`].
//!
//! A host (the HTTP layer, or anything rendering the stats) drives a
//! [`StatsView`] with an optional identity and observes that identity's
//! [`ViewState`] through a watch channel. Successful summaries are cached per
//! identity for the configured freshness window, and transient failures are
//! retried a bounded number of times before an error state is published.
//!
//! Each identity owns a slot whose cache lock is held for the whole fetch, so
//! concurrent loads of the same identity wait for the one in flight and then
//! read its result from the cache.

use crate::aggregator::StatsAggregator;
use crate::config::CacheConfig;
use crate::error::StatsError;
use crate::stats::StatsSummary;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What a host should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing requested yet.
    Idle,
    Loading,
    /// Rendered with a manual retry control.
    Error { message: String },
    Success(Arc<StatsSummary>),
}

/// Per-identity cache entry and state channel.
struct Slot {
    cached: Mutex<Option<(Arc<StatsSummary>, Instant)>>,
    state: watch::Sender<ViewState>,
}

impl Slot {
    fn new() -> Self {
        let (state, _) = watch::channel(ViewState::Idle);
        Self {
            cached: Mutex::new(None),
            state,
        }
    }
}

pub struct StatsView {
    aggregator: StatsAggregator,
    slots: StdMutex<LruCache<String, Arc<Slot>>>,
    ttl: Duration,
    max_retries: u32,
}

impl StatsView {
    pub fn new(aggregator: StatsAggregator, config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            aggregator,
            slots: StdMutex::new(LruCache::new(capacity)),
            ttl: config.ttl(),
            max_retries: config.max_retries,
        }
    }

    fn slot(&self, login: &str) -> Arc<Slot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.get_or_insert(login.to_string(), || Arc::new(Slot::new())))
    }

    /// State changes for `identity`.
    pub fn subscribe(&self, identity: &str) -> watch::Receiver<ViewState> {
        self.slot(identity.trim()).state.subscribe()
    }

    /// Current state of `identity`; `Idle` if it was never requested.
    pub fn state(&self, identity: &str) -> ViewState {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .peek(identity.trim())
            .map_or(ViewState::Idle, |slot| slot.state.borrow().clone())
    }

    /// Loads stats for `identity`, serving a fresh cached summary when there is one.
    ///
    /// Returns `None` without touching the network or any state when no
    /// identity is given.
    pub async fn load(
        &self,
        identity: Option<&str>,
    ) -> Option<Result<Arc<StatsSummary>, StatsError>> {
        let login = identity.map(str::trim).filter(|s| !s.is_empty())?;
        Some(self.fetch(login, true).await)
    }

    /// Re-fetches `identity` regardless of what is cached.
    pub async fn retry(&self, identity: &str) -> Result<Arc<StatsSummary>, StatsError> {
        self.fetch(identity.trim(), false).await
    }

    /// Like [`StatsView::load`], but gives up as soon as `cancel` fires.
    ///
    /// Dropping the in-flight pipeline aborts its HTTP requests; any response
    /// that still arrives is discarded. A cancelled load leaves the identity
    /// `Idle` rather than stuck in `Loading`.
    pub async fn load_cancellable(
        &self,
        identity: Option<&str>,
        cancel: CancellationToken,
    ) -> Option<Result<Arc<StatsSummary>, StatsError>> {
        let login = identity.map(str::trim).filter(|s| !s.is_empty())?;
        tokio::select! {
            result = self.fetch(login, true) => Some(result),
            () = cancel.cancelled() => {
                debug!("Stats load for {login} cancelled");
                self.slot(login).state.send_if_modified(|state| {
                    if *state == ViewState::Loading {
                        *state = ViewState::Idle;
                        true
                    } else {
                        false
                    }
                });
                None
            }
        }
    }

    async fn fetch(&self, login: &str, use_cache: bool) -> Result<Arc<StatsSummary>, StatsError> {
        let slot = self.slot(login);

        // Held until the fetch settles; later callers for this identity queue here.
        let mut cached = slot.cached.lock().await;

        if use_cache {
            if let Some((summary, fetched_at)) = cached.as_ref() {
                if fetched_at.elapsed() < self.ttl {
                    debug!("Serving cached stats for {login}");
                    let summary = Arc::clone(summary);
                    slot.state.send_replace(ViewState::Success(Arc::clone(&summary)));
                    return Ok(summary);
                }
            }
        }

        slot.state.send_replace(ViewState::Loading);

        let mut attempt = 0u32;
        let result = loop {
            match self.aggregator.get_stats(login).await {
                Ok(summary) => break Ok(Arc::new(summary)),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = Duration::from_millis(250u64.saturating_mul(1 << (attempt - 1).min(16)));
                    warn!("Stats for {login} unavailable ({e}), retry {attempt} in {backoff:?}");
                    sleep(backoff).await;
                }
                Err(e) => break Err(e),
            }
        };

        match &result {
            Ok(summary) => {
                *cached = Some((Arc::clone(summary), Instant::now()));
                slot.state.send_replace(ViewState::Success(Arc::clone(summary)));
            }
            Err(e) => {
                slot.state.send_replace(ViewState::Error {
                    message: e.to_string(),
                });
            }
        }

        result
    }
}
