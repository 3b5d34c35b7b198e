//! One live connection to one bridge.
//!
//! A session owns its own state store, coalescer and control registry.
//! Nothing is shared between sessions.

use std::time::Duration;

use futures::StreamExt;
use tokio::time::{Instant, sleep, sleep_until};

use hue::event::parse_batch;
use hue::store::{StateStore, StoreSummary};

use crate::bridge::{BridgeClient, EventStream, SseDecoder};
use crate::coalesce::Coalescer;
use crate::controls::{ControlId, ControlSink, ControlView, Controls};
use crate::error::{ApiError, ApiResult};

/// Consecutive event stream failures tolerated before giving up
pub const EVENT_STREAM_RETRIES: u32 = 10;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Count of consecutive event stream failures, bounded by a limit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryBudget {
    limit: u32,
    failures: u32,
}

impl RetryBudget {
    #[must_use]
    pub const fn new(limit: u32) -> Self {
        Self { limit, failures: 0 }
    }

    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    pub const fn reset(&mut self) {
        self.failures = 0;
    }

    /// Record one failed attempt. Returns false once the limit is reached.
    pub const fn fail(&mut self) -> bool {
        self.failures += 1;
        self.failures < self.limit
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::new(EVENT_STREAM_RETRIES)
    }
}

/// Sleep until `deadline`, or forever if there is none.
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

pub struct BridgeSession<S> {
    name: String,
    client: BridgeClient,
    store: StateStore,
    coalescer: Coalescer,
    controls: Controls,
    sink: S,
    auto_bind: bool,
    reconnect_delay: Duration,
}

impl<S: ControlSink> BridgeSession<S> {
    pub fn new(client: BridgeClient, sink: S) -> Self {
        Self {
            name: client.name().to_string(),
            client,
            store: StateStore::new(),
            coalescer: Coalescer::new(),
            controls: Controls::new(),
            sink,
            auto_bind: false,
            reconnect_delay: RECONNECT_DELAY,
        }
    }

    /// Rebind one control per group and light after every snapshot.
    #[must_use]
    pub fn with_auto_bind(self, auto_bind: bool) -> Self {
        Self { auto_bind, ..self }
    }

    #[must_use]
    pub fn with_reconnect_delay(self, reconnect_delay: Duration) -> Self {
        Self {
            reconnect_delay,
            ..self
        }
    }

    #[must_use]
    pub const fn store(&self) -> &StateStore {
        &self.store
    }

    pub const fn controls_mut(&mut self) -> &mut Controls {
        &mut self.controls
    }

    #[must_use]
    pub const fn coalescer(&self) -> &Coalescer {
        &self.coalescer
    }

    /// Rebuild the state store from a fresh snapshot, and refresh all controls.
    pub async fn refresh_snapshot(&mut self) -> ApiResult<StoreSummary> {
        let snapshot = self.client.get_resources().await?;
        Ok(self.load_snapshot(&snapshot))
    }

    pub fn load_snapshot(&mut self, snapshot: &serde_json::Value) -> StoreSummary {
        let summary = self.store.load_snapshot(snapshot);
        log::info!(
            "[{}] Snapshot loaded: {} groups, {} lights, {} scenes",
            self.name,
            summary.groups,
            summary.lights,
            summary.scenes
        );

        if self.auto_bind {
            self.controls.clear();
            self.controls.bind_store(&self.store);
        }
        self.controls.refresh_all(&self.store, &mut self.sink);

        summary
    }

    /// Merge one event-stream payload into the store and queue the
    /// patched ids for the next flush.
    pub fn handle_payload(&mut self, payload: &str, now: Instant) {
        log::trace!("[{}] Event: {payload}", self.name);

        match parse_batch(payload) {
            Ok(batch) => {
                let ids = self.store.apply_events(&batch);
                self.coalescer.push(ids, now);
            }
            Err(err) => {
                log::trace!("[{}] Ignoring malformed event payload: {err}", self.name);
            }
        }
    }

    /// Refresh the controls affected by everything collected so far.
    pub fn flush(&mut self) -> usize {
        let pending = self.coalescer.flush();
        log::debug!("[{}] Flushing updates for {:?}", self.name, pending);
        self.controls.flush(&pending, &self.store, &mut self.sink)
    }

    /// Follow `stream` until it ends or fails, flushing the coalescer
    /// whenever its window closes. Every received chunk resets `budget`.
    pub async fn follow(
        &mut self,
        mut stream: EventStream,
        budget: &mut RetryBudget,
    ) -> ApiResult<()> {
        let mut decoder = SseDecoder::new();

        loop {
            let deadline = self.coalescer.deadline();

            tokio::select! {
                chunk = stream.next() => {
                    let Some(chunk) = chunk else {
                        return Ok(());
                    };
                    let chunk = chunk?;
                    budget.reset();

                    for payload in decoder.feed(&chunk) {
                        self.handle_payload(&payload, Instant::now());
                    }
                }
                () = wait_for(deadline) => {
                    self.flush();
                }
            }
        }
    }

    /// Fetch a snapshot, then follow the event stream.
    async fn stream_events(&mut self, budget: &mut RetryBudget) -> ApiResult<()> {
        self.refresh_snapshot().await?;
        let stream = self.client.event_stream().await?;
        self.follow(stream, budget).await
    }

    /// Run until the event stream has failed too many times in a row.
    pub async fn run(&mut self) -> ApiResult<()> {
        log::info!("[{}] Starting bridge session", self.name);

        let mut budget = RetryBudget::default();
        loop {
            match self.stream_events(&mut budget).await {
                Ok(()) => log::warn!("[{}] Event stream closed by bridge", self.name),
                Err(err) => log::warn!(
                    "[{}] Event stream failed (attempt {}/{}): {err}",
                    self.name,
                    budget.failures() + 1,
                    EVENT_STREAM_RETRIES
                ),
            }

            if !budget.fail() {
                return Err(ApiError::EventStreamExhausted {
                    bridge: self.name.clone(),
                    attempts: budget.failures(),
                });
            }

            sleep(self.reconnect_delay).await;
        }
    }

    /// Like [`Self::run`], but log the final error instead of returning it.
    pub async fn run_logged(&mut self) {
        if let Err(err) = self.run().await {
            log::error!("{err}");
        }
    }
}

/// Sink that logs every refreshed control
#[derive(Debug, Default)]
pub struct LogSink {
    bridge: String,
}

impl LogSink {
    pub fn new(bridge: impl Into<String>) -> Self {
        Self {
            bridge: bridge.into(),
        }
    }
}

impl ControlSink for LogSink {
    fn refresh(&mut self, control: ControlId, view: &ControlView) {
        log::info!(
            "[{}] {:?} {:<24} {}",
            self.bridge,
            control,
            view.label,
            view.summary()
        );
    }
}
