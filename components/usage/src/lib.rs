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

//! Disk usage for a status bar: poll a notebook server's metrics endpoint,
//! scale the byte counts, and publish a snapshot whenever it changes.

pub mod config;
pub mod err;
pub mod fetcher;
pub mod model;
pub mod monitor;
pub mod poller;
pub mod render;
pub mod unit;

pub use config::UsageConfig;
pub use err::{Error, ErrorKind, Result};
pub use fetcher::{HttpMetricsSource, MetricsSource, RawMetrics};
pub use model::{UsageModel, UsageSnapshot, WarnPolicy};
pub use monitor::UsageMonitor;
pub use poller::{Phase, Poller, PollerConfig, Tick, TickSubscriber};
pub use render::RenderProps;
pub use unit::{convert_to_largest_unit, Unit};
