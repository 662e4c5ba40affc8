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

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::{
    config::UsageConfig,
    err::Result,
    fetcher::{HttpMetricsSource, MetricsSource},
    model::{UsageModel, UsageSnapshot, WarnPolicy},
    poller::{Phase, Poller, PollerConfig},
};

/// A running poller feeding a [UsageModel].
///
/// The model lives on the poll task; callers observe it through
/// [UsageMonitor::subscribe]. Once [UsageMonitor::dispose] returns no
/// subscriber is woken again.
pub struct UsageMonitor {
    poller:   Poller,
    snapshot: watch::Receiver<UsageSnapshot>,
}

impl UsageMonitor {
    /// Validate `config` and start polling its endpoint over http.
    pub fn start(config: &UsageConfig) -> Result<Self> {
        config.validate()?;
        let source = HttpMetricsSource::new(config)?;
        info!(endpoint = %source.endpoint(), interval = ?config.refresh_interval(), "start polling disk usage");
        Ok(Self::with_source(
            Arc::new(source),
            config.poller_config(),
            config.warn_policy(),
        ))
    }

    pub fn with_source(
        source: Arc<dyn MetricsSource>,
        poller_config: PollerConfig,
        warn_policy: Option<WarnPolicy>,
    ) -> Self {
        let model = UsageModel::new(warn_policy);
        let snapshot = model.subscribe();
        let poller = Poller::spawn(source, poller_config, model);
        Self { poller, snapshot }
    }

    pub fn snapshot(&self) -> UsageSnapshot { *self.snapshot.borrow() }

    pub fn subscribe(&self) -> watch::Receiver<UsageSnapshot> { self.snapshot.clone() }

    pub fn phase(&self) -> Phase { self.poller.phase() }

    pub fn refresh(&self) { self.poller.refresh() }

    /// Stop polling and tear the model down.
    pub async fn dispose(self) {
        self.poller.stop().await;
        info!("disk usage monitor disposed");
    }
}
