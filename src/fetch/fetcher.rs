//! Page fetcher with retry
//!
//! Wraps a `Transport` with response classification, linear backoff and
//! cooperative cancellation. Cancellation is checked before each attempt,
//! raced against the request and the backoff sleep, and checked again right
//! after the response arrives.

use super::request::PageRequest;
use super::retry::{RetryPolicy, RetryState};
use crate::decode::PageDecoder;
use crate::error::{Error, Result};
use crate::http::{RateLimiter, RawResponse, Transport};
use crate::observe::{Event, NoopObserver, Observer};
use crate::record::{Page, Record};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Where the pagination driver gets its pages from
#[async_trait]
pub trait PageSource<R>: Send + Sync {
    /// Fetch the page at `cursor` (empty for the first page).
    ///
    /// Returns `Error::Cancelled` if `cancel` fires first. On any error the
    /// caller's cursor is still valid and the fetch can be repeated.
    async fn fetch(&self, cursor: &str, cancel: &CancellationToken) -> Result<Page<R>>;
}

/// Classify a raw response into a page or an attempt error
pub fn classify<R: Record>(response: &RawResponse, decoder: &PageDecoder) -> Result<Page<R>> {
    if !response.is_success() {
        return Err(Error::UpstreamStatus {
            status: response.status,
        });
    }
    if response.is_html() {
        return Err(Error::UpstreamContent);
    }
    decoder.decode(&response.body)
}

/// Fetches pages over a transport, retrying transient failures
pub struct PageFetcher<T> {
    transport: T,
    request: PageRequest,
    decoder: PageDecoder,
    policy: RetryPolicy,
    rate_limiter: Option<RateLimiter>,
    observer: Arc<dyn Observer>,
}

impl<T: Transport> PageFetcher<T> {
    /// Create a fetcher with the default decoder and retry policy
    pub fn new(transport: T, request: PageRequest) -> Self {
        Self {
            transport,
            request,
            decoder: PageDecoder::default(),
            policy: RetryPolicy::default(),
            rate_limiter: None,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Set the response decoder
    #[must_use]
    pub fn with_decoder(mut self, decoder: PageDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Wait on a rate limiter before every attempt
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Set the observer for attempt events
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// The retry policy in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// URL requested for a given cursor
    pub fn page_url(&self, cursor: &str) -> Url {
        self.request.url_for(cursor)
    }

    /// One attempt: rate limit, request, classify
    async fn attempt<R: Record>(&self, url: &Url) -> Result<Page<R>> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }
        let response = self.transport.get(url).await?;
        classify(&response, &self.decoder)
    }
}

#[async_trait]
impl<T: Transport, R: Record> PageSource<R> for PageFetcher<T> {
    async fn fetch(&self, cursor: &str, cancel: &CancellationToken) -> Result<Page<R>> {
        let url = self.page_url(cursor);
        let mut state = RetryState::new();

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let attempt = state.begin_attempt();
            self.observer.observe(&Event::FetchAttempt {
                cursor,
                attempt,
                url: url.as_str(),
            });

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                outcome = self.attempt::<R>(&url) => outcome,
            };
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let error = match outcome {
                Ok(page) => {
                    self.observer.observe(&Event::PageFetched {
                        cursor,
                        records: page.len(),
                        next_cursor: page.cursor.as_deref(),
                    });
                    return Ok(page);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            let decision = self.policy.decide(&state);
            self.observer.observe(&Event::AttemptFailed {
                cursor,
                attempt,
                error: &error,
                backoff: decision.delay(),
            });
            state.record_failure(error);

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(decision.delay()) => {}
            }

            if !decision.should_retry() {
                return Err(state.into_exhausted(cursor));
            }
        }
    }
}

impl<T> std::fmt::Debug for PageFetcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("request", &self.request)
            .field("decoder", &self.decoder)
            .field("policy", &self.policy)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}
