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

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::{
    fetcher::RawMetrics,
    poller::{Tick, TickSubscriber},
    unit::{convert_to_largest_unit, Unit},
};

/// Flags a disk as nearly full once used/total reaches `ratio`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarnPolicy {
    pub ratio: f64,
}

impl WarnPolicy {
    pub fn new(ratio: f64) -> Self { Self { ratio } }

    pub fn is_exceeded(&self, used: f64, total: Option<f64>) -> bool {
        match total {
            Some(total) if total > 0.0 => used / total >= self.ratio,
            _ => false,
        }
    }
}

/// What the status line shows.
///
/// `used` and `total` are both expressed in `unit`. An unavailable snapshot
/// is always `0 B` without a total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageSnapshot {
    used:      f64,
    total:     Option<f64>,
    unit:      Unit,
    available: bool,
    warn:      bool,
}

impl UsageSnapshot {
    pub const fn unavailable() -> Self {
        Self {
            used:      0.0,
            total:     None,
            unit:      Unit::smallest(),
            available: false,
            warn:      false,
        }
    }

    pub fn from_metrics(metrics: &RawMetrics, policy: Option<&WarnPolicy>) -> Self {
        let (used, unit) = convert_to_largest_unit(metrics.disk_used);
        let total = metrics
            .disk_total
            .filter(|t| *t != 0.0)
            .map(|t| unit.scale(t));
        let warn = policy.map_or(false, |p| p.is_exceeded(used, total));
        Self {
            used,
            total,
            unit,
            available: true,
            warn,
        }
    }

    pub fn used(&self) -> f64 { self.used }

    pub fn total(&self) -> Option<f64> { self.total }

    pub fn unit(&self) -> Unit { self.unit }

    pub fn available(&self) -> bool { self.available }

    pub fn warn(&self) -> bool { self.warn }
}

impl Default for UsageSnapshot {
    fn default() -> Self { Self::unavailable() }
}

/// Turns poller ticks into [UsageSnapshot]s and publishes a snapshot only
/// when one of its fields changed.
#[derive(Debug)]
pub struct UsageModel {
    snapshot:    watch::Sender<UsageSnapshot>,
    warn_policy: Option<WarnPolicy>,
}

impl UsageModel {
    pub fn new(warn_policy: Option<WarnPolicy>) -> Self {
        let (snapshot, _) = watch::channel(UsageSnapshot::unavailable());
        Self {
            snapshot,
            warn_policy,
        }
    }

    pub fn snapshot(&self) -> UsageSnapshot { *self.snapshot.borrow() }

    /// Every change after this call wakes the receiver once.
    pub fn subscribe(&self) -> watch::Receiver<UsageSnapshot> { self.snapshot.subscribe() }

    /// The snapshot a tick leads to; pending ticks lead nowhere.
    pub fn derive(&self, tick: &Tick) -> Option<UsageSnapshot> {
        match tick {
            Tick::Pending => None,
            Tick::Resolved(Some(metrics)) => {
                Some(UsageSnapshot::from_metrics(metrics, self.warn_policy.as_ref()))
            }
            Tick::Resolved(None) | Tick::Rejected(_) => Some(UsageSnapshot::unavailable()),
        }
    }

    /// Fold a tick in. Returns whether subscribers were notified.
    pub fn apply(&mut self, tick: &Tick) -> bool {
        let Some(candidate) = self.derive(tick) else {
            return false;
        };
        let changed = self.snapshot.send_if_modified(|held| {
            if *held == candidate {
                return false;
            }
            *held = candidate;
            true
        });
        if changed {
            debug!(?candidate, "usage changed");
        }
        changed
    }
}

impl TickSubscriber for UsageModel {
    fn ticked(&mut self, tick: &Tick) { self.apply(tick); }
}
