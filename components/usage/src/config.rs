use std::{path::Path, time::Duration};

use diskbar_common::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_BASE_URL, DEFAULT_MAX_INTERVAL_MS, DEFAULT_METRICS_PATH,
    DEFAULT_REFRESH_RATE_MS, DEFAULT_REQUEST_TIMEOUT_MS, ENV_BASE_URL, ENV_REFRESH_RATE, ENV_TOKEN,
};
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};
use url::Url;

use crate::{
    err::{InvalidConfigSnafu, InvalidUrlSnafu, ParseConfigSnafu, ReadConfigSnafu, Result},
    model::WarnPolicy,
    poller::PollerConfig,
};

/// Everything the monitor needs to know, with durations in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    /// Root of the notebook server, e.g. `http://localhost:8888/user/alice/`.
    pub base_url:        String,
    /// Metrics handler path relative to [UsageConfig::base_url].
    pub metrics_path:    String,
    /// Delay between two successful polls.
    pub refresh_rate:    u64,
    /// Grow the delay after failed polls.
    pub backoff:         bool,
    pub backoff_factor:  f64,
    /// Upper bound of the backed-off delay.
    pub max_interval:    u64,
    pub request_timeout: u64,
    /// Server token, sent as `Authorization: token <token>`.
    pub token:           Option<String>,
    /// Raise the warning flag once used/total reaches this ratio.
    pub warn_ratio:      Option<f64>,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            base_url:        DEFAULT_BASE_URL.to_string(),
            metrics_path:    DEFAULT_METRICS_PATH.to_string(),
            refresh_rate:    DEFAULT_REFRESH_RATE_MS,
            backoff:         true,
            backoff_factor:  DEFAULT_BACKOFF_FACTOR,
            max_interval:    DEFAULT_MAX_INTERVAL_MS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_MS,
            token:           None,
            warn_ratio:      None,
        }
    }
}

impl UsageConfig {
    /// Load a TOML file; keys it leaves out keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).context(ReadConfigSnafu { path: &display })?;
        toml::from_str(&content).context(ParseConfigSnafu { path: display })
    }

    /// Override fields from `DISKBAR_*` variables (and `.env`).
    pub fn merge_env(&mut self) -> Result<&mut Self> {
        let env_err = |e: snafu::Whatever| InvalidConfigSnafu { reason: e.to_string() }.build();
        if let Some(base_url) = diskbar_utils::env::var(ENV_BASE_URL).map_err(env_err)? {
            self.base_url = base_url;
        }
        if let Some(refresh_rate) =
            diskbar_utils::env::var_parsed::<u64>(ENV_REFRESH_RATE).map_err(env_err)?
        {
            self.refresh_rate = refresh_rate;
        }
        if let Some(token) = diskbar_utils::env::var(ENV_TOKEN).map_err(env_err)? {
            self.token = Some(token);
        }
        Ok(self)
    }

    pub fn with_base_url(&mut self, base_url: &str) -> &mut Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_backoff(&mut self, backoff: bool) -> &mut Self {
        self.backoff = backoff;
        self
    }

    pub fn with_token(&mut self, token: &str) -> &mut Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_warn_ratio(&mut self, ratio: f64) -> &mut Self {
        self.warn_ratio = Some(ratio);
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.refresh_rate > 0,
            InvalidConfigSnafu {
                reason: "refresh_rate must be positive",
            }
        );
        ensure!(
            self.backoff_factor.is_finite() && self.backoff_factor > 1.0,
            InvalidConfigSnafu {
                reason: format!("backoff_factor must be finite and exceed 1, got {}", self.backoff_factor),
            }
        );
        ensure!(
            self.max_interval >= self.refresh_rate,
            InvalidConfigSnafu {
                reason: format!(
                    "max_interval {}ms is below refresh_rate {}ms",
                    self.max_interval, self.refresh_rate
                ),
            }
        );
        ensure!(
            self.request_timeout > 0,
            InvalidConfigSnafu {
                reason: "request_timeout must be positive",
            }
        );
        if let Some(ratio) = self.warn_ratio {
            ensure!(
                ratio > 0.0 && ratio <= 1.0,
                InvalidConfigSnafu {
                    reason: format!("warn_ratio must be within (0, 1], got {ratio}"),
                }
            );
        }
        self.endpoint()?;
        Ok(())
    }

    /// The absolute metrics url. The base is treated as a directory, so a
    /// path prefix such as `/user/alice` is kept.
    pub fn endpoint(&self) -> Result<Url> {
        let mut base = self.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).context(InvalidUrlSnafu { url: &self.base_url })?;
        base.join(self.metrics_path.trim_start_matches('/'))
            .context(InvalidUrlSnafu {
                url: &self.metrics_path,
            })
    }

    pub fn refresh_interval(&self) -> Duration { Duration::from_millis(self.refresh_rate) }

    pub fn request_timeout(&self) -> Duration { Duration::from_millis(self.request_timeout) }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval:       self.refresh_interval(),
            backoff:        self.backoff,
            backoff_factor: self.backoff_factor,
            max_interval:   Duration::from_millis(self.max_interval),
        }
    }

    pub fn warn_policy(&self) -> Option<WarnPolicy> { self.warn_ratio.map(WarnPolicy::new) }
}
