// Copyright 2024 diskbar
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A recurring fetch with exponential backoff on failure.
//!
//! The poller walks `Idle -> Pending -> Resolved | Rejected -> Pending ...`
//! and hands every transition to a single [TickSubscriber]. Fetching,
//! waiting and notifying all happen on one task, so only one request is
//! ever in flight and the subscriber never runs concurrently with itself.

use std::{sync::Arc, time::Duration};

use diskbar_common::{DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_INTERVAL_MS, DEFAULT_REFRESH_RATE_MS};
use tokio::{
    select,
    sync::{watch, Notify},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::{
    err::Error,
    fetcher::{MetricsSource, RawMetrics},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending,
    Resolved,
    Rejected,
}

/// One state transition of the poller.
#[derive(Debug)]
pub enum Tick {
    Pending,
    /// The request went through; `None` when the body had no disk figures.
    Resolved(Option<RawMetrics>),
    Rejected(Error),
}

impl Tick {
    pub fn phase(&self) -> Phase {
        match self {
            Tick::Pending => Phase::Pending,
            Tick::Resolved(_) => Phase::Resolved,
            Tick::Rejected(_) => Phase::Rejected,
        }
    }
}

/// Receives every [Tick] of a poller, in order.
pub trait TickSubscriber: Send + 'static {
    fn ticked(&mut self, tick: &Tick);
}

impl<F> TickSubscriber for F
where
    F: FnMut(&Tick) + Send + 'static,
{
    fn ticked(&mut self, tick: &Tick) { self(tick) }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollerConfig {
    /// Delay after a successful tick.
    pub interval:       Duration,
    /// Grow the delay after failures instead of retrying at `interval`.
    pub backoff:        bool,
    pub backoff_factor: f64,
    /// Cap for the grown delay.
    pub max_interval:   Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval:       Duration::from_millis(DEFAULT_REFRESH_RATE_MS),
            backoff:        true,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_interval:   Duration::from_millis(DEFAULT_MAX_INTERVAL_MS),
        }
    }
}

impl PollerConfig {
    /// The wait before the next tick, given the last wait and how the tick
    /// that just finished ended.
    pub fn next_delay(&self, current: Duration, phase: Phase) -> Duration {
        match phase {
            Phase::Rejected if self.backoff => {
                let cap = self.max_interval.max(self.interval);
                // overflowing or non-finite products saturate at the cap.
                Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_factor)
                    .map_or(cap, |d| d.min(cap))
            }
            _ => self.interval,
        }
    }
}

/// Handle to a running poll loop.
///
/// Dropping the handle cancels the loop; [Poller::stop] additionally waits
/// for it to wind down.
pub struct Poller {
    cancel_token: CancellationToken,
    refresh:      Arc<Notify>,
    phase:        watch::Receiver<Phase>,
    handle:       Option<JoinHandle<()>>,
}

impl Poller {
    /// Start polling `source` right away. Must be called within a tokio
    /// runtime.
    pub fn spawn<T>(source: Arc<dyn MetricsSource>, config: PollerConfig, subscriber: T) -> Poller
    where
        T: TickSubscriber,
    {
        let cancel_token = CancellationToken::new();
        let refresh = Arc::new(Notify::new());
        let (phase_tx, phase_rx) = watch::channel(Phase::Idle);

        let task = PollTask {
            source,
            config,
            subscriber,
            cancel_token: cancel_token.clone(),
            refresh: refresh.clone(),
            phase: phase_tx,
        };
        let handle = tokio::spawn(task.run());

        Poller {
            cancel_token,
            refresh,
            phase: phase_rx,
            handle: Some(handle),
        }
    }

    pub fn phase(&self) -> Phase { *self.phase.borrow() }

    /// Skip the current wait and poll now. A refresh requested while a
    /// request is in flight starts the next one as soon as it settles.
    pub fn refresh(&self) { self.refresh.notify_one(); }

    /// Cancel the loop and wait for it to exit. An in-flight request is
    /// dropped and its outcome never reaches the subscriber.
    pub async fn stop(mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("poll task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) { self.cancel_token.cancel(); }
}

struct PollTask<T> {
    source:       Arc<dyn MetricsSource>,
    config:       PollerConfig,
    subscriber:   T,
    cancel_token: CancellationToken,
    refresh:      Arc<Notify>,
    phase:        watch::Sender<Phase>,
}

impl<T: TickSubscriber> PollTask<T> {
    #[instrument(skip(self), fields(interval = ?self.config.interval))]
    async fn run(mut self) {
        debug!("poller is started");
        let mut delay = self.config.interval;
        loop {
            self.transition(Tick::Pending);
            let outcome = select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    debug!("poller is cancelled while a request is in flight");
                    return;
                }
                outcome = self.source.fetch() => outcome,
            };
            if self.cancel_token.is_cancelled() {
                return;
            }

            let tick = match outcome {
                Ok(metrics) => Tick::Resolved(metrics),
                Err(e) => {
                    warn!(kind = ?e.kind(), "failed to poll metrics: {e}");
                    Tick::Rejected(e)
                }
            };
            delay = self.config.next_delay(delay, tick.phase());
            self.transition(tick);

            debug!(?delay, "next poll scheduled");
            select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    debug!("poller is cancelled");
                    return;
                }
                _ = self.refresh.notified() => {
                    debug!("poll refresh requested");
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn transition(&mut self, tick: Tick) {
        self.phase.send_replace(tick.phase());
        self.subscriber.ticked(&tick);
    }
}
