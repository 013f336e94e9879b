//! Per-subscriber stream orchestration.
//!
//! Ties the refresh policy, the provider client, the state store and the
//! display sink together. Fetch errors never reach the host runtime: they
//! are funneled into the retry decision, and terminal failure degrades to a
//! placeholder (subscribe) or to keeping the previous display value
//! (scheduled refresh).

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use wxstream_core::{Config, DefaultSettings};
use wxstream_provider::{
    resolve_defaults, FetchError, PartialSettings, Settings, WeatherClient, WeatherReading,
};

use crate::policy::{RefreshPolicy, RetryDecision};
use crate::render::render;
use crate::store::{CachedState, StateStore, StoreError};

/// Text returned to a new subscriber when upstream never answered.
pub const SUBSCRIBE_PLACEHOLDER: &str = "Updating...";

/// Outbound seam to the host runtime's display surface.
pub trait DisplaySink: Send + Sync {
    fn push_display(&self, subscriber_id: &str, text: &str);
}

impl<T: DisplaySink + ?Sized> DisplaySink for Arc<T> {
    fn push_display(&self, subscriber_id: &str, text: &str) {
        (**self).push_display(subscriber_id, text)
    }
}

/// One subscriber entry of a scheduled tick.
#[derive(Debug, Clone)]
pub struct SubscriberRecord {
    pub subscriber_id: String,
    pub settings: PartialSettings,
}

/// Orchestrates refresh decisions, upstream fetches and rendering for
/// subscribers. One engine serves many subscribers; the host serializes
/// triggers per subscriber.
pub struct StreamEngine<S, D> {
    client: WeatherClient,
    policy: RefreshPolicy,
    store: S,
    display: D,
    defaults: DefaultSettings,
    max_concurrent: usize,
}

impl<S: StateStore, D: DisplaySink> StreamEngine<S, D> {
    pub fn new(config: &Config, store: S, display: D) -> Result<Self, FetchError> {
        Ok(Self {
            client: WeatherClient::new(&config.provider)?,
            policy: RefreshPolicy::new(&config.refresh),
            store,
            display,
            defaults: config.defaults.clone(),
            max_concurrent: config.refresh.max_concurrent.max(1),
        })
    }

    /// Handle a subscription-created trigger.
    ///
    /// Always fetches (first use bypasses the freshness check) with a fresh
    /// retry budget, and never fails the host: terminal exhaustion yields a
    /// placeholder that the next successful refresh will replace.
    pub async fn on_subscribe(
        &self,
        subscriber_id: &str,
        snapshot: PartialSettings,
    ) -> Result<String, StoreError> {
        let settings = resolve_defaults(&snapshot, &self.defaults);
        tracing::info!(subscriber_id, city = %settings.city, provider = %settings.provider, "subscription created");

        let mut state = self.store.get(subscriber_id)?.unwrap_or_default();
        state.retry_count = 0;

        match self
            .fetch_with_retry(subscriber_id, &settings, &mut state)
            .await?
        {
            Some(reading) => Ok(render(&settings, &reading)),
            None => Ok(SUBSCRIBE_PLACEHOLDER.to_string()),
        }
    }

    /// Handle an unsubscribed trigger. Nothing to tear down; the
    /// subscriber's state is left behind and reset on a future subscribe.
    pub fn on_unsubscribe(&self, subscriber_id: &str) {
        tracing::info!(subscriber_id, "subscription removed");
    }

    /// Handle one subscriber of a scheduled tick.
    ///
    /// A still-fresh reading is re-rendered and pushed without calling
    /// upstream. Terminal failure pushes nothing, leaving the previous
    /// display value in place.
    pub async fn on_scheduled_refresh(
        &self,
        subscriber_id: &str,
        snapshot: PartialSettings,
    ) -> Result<(), StoreError> {
        self.refresh(subscriber_id, snapshot, "scheduled").await
    }

    /// Out-of-band refresh for a single subscriber, e.g. one whose
    /// subscribe-time fetch failed before anything could be persisted.
    pub async fn on_recovery(
        &self,
        subscriber_id: &str,
        snapshot: PartialSettings,
    ) -> Result<(), StoreError> {
        self.refresh(subscriber_id, snapshot, "recovery").await
    }

    async fn refresh(
        &self,
        subscriber_id: &str,
        snapshot: PartialSettings,
        trigger: &str,
    ) -> Result<(), StoreError> {
        let settings = resolve_defaults(&snapshot, &self.defaults);
        let mut state = self.store.get(subscriber_id)?.unwrap_or_default();
        let now = Utc::now();

        if !self.policy.should_refresh(&state, now) {
            match &state.last_reading {
                Some(reading) => {
                    tracing::debug!(subscriber_id, trigger, "cache hit, re-rendering stored reading");
                    self.display
                        .push_display(subscriber_id, &render(&settings, reading));
                }
                None => {
                    tracing::debug!(subscriber_id, trigger, "no stored reading, nothing to push");
                }
            }
            return Ok(());
        }

        match self
            .fetch_with_retry(subscriber_id, &settings, &mut state)
            .await?
        {
            Some(reading) => {
                self.display
                    .push_display(subscriber_id, &render(&settings, &reading));
            }
            None => {
                tracing::warn!(
                    subscriber_id,
                    trigger,
                    "refresh exhausted, keeping previous display value"
                );
            }
        }
        Ok(())
    }

    /// Bounded immediate-retry fetch loop. State is persisted after every
    /// attempt so the retry budget survives the process.
    async fn fetch_with_retry(
        &self,
        subscriber_id: &str,
        settings: &Settings,
        state: &mut CachedState,
    ) -> Result<Option<WeatherReading>, StoreError> {
        if self.policy.is_exhausted(state.retry_count) {
            tracing::warn!(
                subscriber_id,
                retry_count = state.retry_count,
                "retry budget already exhausted, skipping upstream call"
            );
            return Ok(None);
        }

        loop {
            match self.client.fetch(settings).await {
                Ok(reading) => {
                    state.last_fetch_at = Some(Utc::now());
                    state.last_reading = Some(reading.clone());
                    state.retry_count = 0;
                    self.store.put(subscriber_id, state)?;
                    return Ok(Some(reading));
                }
                Err(e) => match self.policy.on_fetch_failure(state.retry_count) {
                    RetryDecision::Retry { next } => {
                        tracing::warn!(subscriber_id, attempt = next, error = %e, "fetch failed, retrying");
                        state.retry_count = next;
                        self.store.put(subscriber_id, state)?;
                    }
                    RetryDecision::Exhausted { count } => {
                        state.retry_count = count;
                        self.store.put(subscriber_id, state)?;
                        tracing::error!(subscriber_id, retry_count = count, error = %e, "fetch failed, retry bound reached");
                        return Ok(None);
                    }
                },
            }
        }
    }
}

impl<S, D> StreamEngine<S, D>
where
    S: StateStore + 'static,
    D: DisplaySink + 'static,
{
    /// Fan a scheduled tick out across subscribers, bounded by the
    /// configured concurrency cap. Per-subscriber failures are logged and do
    /// not stop the tick.
    pub async fn on_scheduled_tick(self: Arc<Self>, records: Vec<SubscriberRecord>) {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for record in records {
            let engine = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire().await;
                if let Err(e) = engine
                    .on_scheduled_refresh(&record.subscriber_id, record.settings)
                    .await
                {
                    tracing::error!(subscriber_id = %record.subscriber_id, error = %e, "scheduled refresh failed");
                }
            });
        }

        while tasks.join_next().await.is_some() {}
    }
}
