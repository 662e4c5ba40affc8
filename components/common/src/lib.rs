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

pub const DISKBAR: &str = "diskbar";

/// Where a notebook server listens when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8888/";
/// Path of the resource metrics handler, relative to the base url.
pub const DEFAULT_METRICS_PATH: &str = "api/metrics/v1";

// All durations below are in milliseconds.
pub const DEFAULT_REFRESH_RATE_MS: u64 = 5_000;
pub const DEFAULT_MAX_INTERVAL_MS: u64 = 300_000; // 5 min
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// The delay is multiplied by this after every failed tick.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

pub const ENV_BASE_URL: &str = "DISKBAR_BASE_URL";
pub const ENV_REFRESH_RATE: &str = "DISKBAR_REFRESH_RATE";
pub const ENV_TOKEN: &str = "DISKBAR_TOKEN";

pub const DEFAULT_LOG_DIR: &str = "/tmp/diskbar.log";
