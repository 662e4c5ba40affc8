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

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::{ensure, ResultExt};
use tracing::debug;
use url::Url;

use crate::{
    config::UsageConfig,
    err::{BadStatusSnafu, BuildClientSnafu, MalformedBodySnafu, RequestSnafu, Result},
};

/// Byte counts reported by one successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawMetrics {
    pub disk_used:  f64,
    pub disk_total: Option<f64>,
}

impl RawMetrics {
    pub fn new(disk_used: f64, disk_total: Option<f64>) -> Self {
        Self {
            disk_used,
            disk_total,
        }
    }

    /// Pick the disk fields out of a metrics document.
    ///
    /// Returns `None` for `null`, non-objects and objects without a numeric
    /// `disk_used`; such bodies mean "no data", not a failed request. A
    /// missing, non-numeric or zero `disk_total` is dropped.
    pub fn from_json(value: &Value) -> Option<RawMetrics> {
        let disk_used = value.get("disk_used")?.as_f64()?;
        let disk_total = value
            .get("disk_total")
            .and_then(Value::as_f64)
            .filter(|t| t.is_finite() && *t > 0.0);
        Some(RawMetrics::new(disk_used, disk_total))
    }
}

/// Where the poller gets its numbers from.
///
/// `Ok(None)` is a successful request whose body carries no disk figures.
#[async_trait]
pub trait MetricsSource: Send + Sync + 'static {
    async fn fetch(&self) -> Result<Option<RawMetrics>>;
}

/// Reads `{"disk_used": .., "disk_total": ..}` from a notebook server.
#[derive(Debug, Clone)]
pub struct HttpMetricsSource {
    client:   reqwest::Client,
    endpoint: Url,
    token:    Option<String>,
}

impl HttpMetricsSource {
    pub fn new(config: &UsageConfig) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("diskbar/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .context(BuildClientSnafu)?;
        Ok(Self {
            client,
            endpoint,
            token: config.token.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url { &self.endpoint }
}

#[async_trait]
impl MetricsSource for HttpMetricsSource {
    async fn fetch(&self) -> Result<Option<RawMetrics>> {
        let url = self.endpoint.as_str();
        let mut request = self
            .client
            .get(self.endpoint.clone())
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }

        let response = request.send().await.context(RequestSnafu { url })?;
        let status = response.status();
        ensure!(
            status.is_success(),
            BadStatusSnafu {
                url,
                status: status.as_u16(),
            }
        );

        let body = response.bytes().await.context(RequestSnafu { url })?;
        let document: Value = serde_json::from_slice(&body).context(MalformedBodySnafu { url })?;
        let metrics = RawMetrics::from_json(&document);
        debug!(%url, ?metrics, "fetched metrics");
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn full_document() {
        let doc = json!({"rss": 1024, "disk_used": 512, "disk_total": 2048});
        assert_eq!(
            RawMetrics::from_json(&doc),
            Some(RawMetrics::new(512.0, Some(2048.0)))
        );
    }

    #[test]
    fn no_usable_disk_figures() {
        assert_eq!(RawMetrics::from_json(&Value::Null), None);
        assert_eq!(RawMetrics::from_json(&json!([1, 2])), None);
        assert_eq!(RawMetrics::from_json(&json!({"rss": 1})), None);
        assert_eq!(RawMetrics::from_json(&json!({"disk_used": "lots"})), None);
    }

    #[test]
    fn total_is_optional() {
        for doc in [
            json!({"disk_used": 10}),
            json!({"disk_used": 10, "disk_total": 0}),
            json!({"disk_used": 10, "disk_total": null}),
        ] {
            assert_eq!(
                RawMetrics::from_json(&doc),
                Some(RawMetrics::new(10.0, None))
            );
        }
    }

    #[test]
    fn endpoint_is_joined_onto_base_url() {
        let config = UsageConfig::default()
            .with_base_url("http://example.com/user/alice")
            .clone();
        let source = HttpMetricsSource::new(&config).unwrap();
        assert_eq!(
            source.endpoint().as_str(),
            "http://example.com/user/alice/api/metrics/v1"
        );
    }
}
