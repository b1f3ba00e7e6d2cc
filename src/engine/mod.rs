//! Execution engine module
//!
//! The pagination driver: fetch a page, commit it, advance the cursor, until
//! the upstream reports no further page, the run is cancelled, or something
//! fails.
//!
//! # Overview
//!
//! - `Pipeline` - sequential driver over a `PageSource` and a `RecordSink`
//! - `PipelineState` / `RunStatus` - progress and lifecycle
//! - `RunReport` - final state plus the error of a failed run
//!
//! Cancellation is checked before every fetch and again before every
//! persist; a page fetched after cancellation is discarded. The reported
//! cursor always names the first page that was not committed.

mod types;

pub use types::{PipelineConfig, PipelineState, RunReport, RunStatus};

use crate::database::RecordSink;
use crate::error::Error;
use crate::fetch::PageSource;
use crate::observe::{Event, NoopObserver, Observer};
use crate::record::Record;
use crate::state::{Checkpoint, StateManager};
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Sequential pagination driver
pub struct Pipeline<R, S, K> {
    /// Page source (usually a `PageFetcher`)
    source: S,
    /// Batch destination (usually a `RecordStore`)
    sink: K,
    /// Event observer
    observer: Arc<dyn Observer>,
    /// Checkpoint store
    state: Option<StateManager>,
    /// Limits
    config: PipelineConfig,
    _record: PhantomData<fn() -> R>,
}

impl<R, S, K> Pipeline<R, S, K>
where
    R: Record,
    S: PageSource<R>,
    K: RecordSink<R>,
{
    /// Create a driver with no observer, no checkpointing and no page cap
    pub fn new(source: S, sink: K) -> Self {
        Self {
            source,
            sink,
            observer: Arc::new(NoopObserver),
            state: None,
            config: PipelineConfig::default(),
            _record: PhantomData,
        }
    }

    /// Set the event observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Save a checkpoint after every committed page
    #[must_use]
    pub fn with_state(mut self, state: StateManager) -> Self {
        self.state = Some(state);
        self
    }

    /// Set driver limits
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// The sink, for inspection after a run
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Give back the sink
    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Run from `start_cursor` until a terminal status is reached
    pub async fn run(&mut self, start_cursor: &str, cancel: &CancellationToken) -> RunReport {
        let started = Instant::now();
        let mut state = PipelineState::new(start_cursor);
        let mut seen: HashSet<String> = HashSet::new();
        if !start_cursor.is_empty() {
            seen.insert(start_cursor.to_string());
        }

        let error = self.drive(&mut state, &mut seen, cancel).await;

        match &error {
            None if state.status == RunStatus::Done => {
                self.observer.observe(&Event::Completed {
                    records_written: state.records_written,
                    pages: state.pages_committed,
                });
            }
            None => {
                state.finish(RunStatus::Cancelled);
                self.observer.observe(&Event::Cancelled {
                    resume_cursor: &state.cursor,
                });
            }
            Some(error) => {
                state.finish(RunStatus::Failed);
                self.observer.observe(&Event::Failed {
                    resume_cursor: &state.cursor,
                    error,
                });
            }
        }

        RunReport {
            state,
            error,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// The loop proper. Returns the fatal error, or `None` for `Done` and
    /// cancellation (told apart by `state.status`).
    async fn drive(
        &mut self,
        state: &mut PipelineState,
        seen: &mut HashSet<String>,
        cancel: &CancellationToken,
    ) -> Option<Error> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }
            if let Some(max_pages) = self.config.max_pages {
                if state.pages_committed >= max_pages {
                    return Some(Error::PageLimit { max_pages });
                }
            }

            let page = match self.source.fetch(&state.cursor, cancel).await {
                Ok(page) => page,
                Err(e) if e.is_cancelled() => return None,
                Err(e) => return Some(e),
            };

            if cancel.is_cancelled() {
                return None;
            }

            // Synchronous DuckDB write on the driver task. Only one batch is
            // ever in flight, so nothing else waits on this worker.
            let written = match self.sink.persist(&page.records) {
                Ok(written) => written,
                Err(e) => return Some(e),
            };
            state.record_commit(written);
            self.observer.observe(&Event::BatchCommitted {
                cursor: &state.cursor,
                records: written,
                total: state.records_written,
            });

            let Some(next) = page.cursor else {
                if let Some(manager) = &self.state {
                    if let Err(e) = manager.clear().await {
                        return Some(e);
                    }
                }
                state.finish(RunStatus::Done);
                return None;
            };

            if !seen.insert(next.clone()) {
                return Some(Error::CursorLoop { cursor: next });
            }

            if let Some(manager) = &self.state {
                let checkpoint = Checkpoint::new(
                    next.as_str(),
                    state.records_written,
                    state.pages_committed,
                );
                if let Err(e) = manager.save(checkpoint).await {
                    return Some(e);
                }
            }

            state.advance(next);
            self.observer.observe(&Event::CursorAdvanced {
                cursor: &state.cursor,
            });
        }
    }
}

impl<R, S, K> std::fmt::Debug for Pipeline<R, S, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
