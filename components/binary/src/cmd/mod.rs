pub mod once;
pub mod watch;

use std::path::PathBuf;

use clap::Args;
use diskbar_common::DEFAULT_LOG_DIR;
use diskbar_usage::{RenderProps, UsageConfig, UsageSnapshot};
use diskbar_utils::logger::LoggingOptions;
use snafu::{ResultExt, Whatever};
use tracing::info;

use crate::build_info;

const CONNECTION_OPTIONS_HEADER: &str = "Connection options";
const POLLING_OPTIONS_HEADER: &str = "Polling options";
const LOGGING_OPTIONS_HEADER: &str = "Logging options";

/// Where to poll and how often; layered over the config file and the
/// `DISKBAR_*` environment.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    #[arg(
    long,
    help = "Read settings from a TOML file",
    value_name = "FILE",
    help_heading = CONNECTION_OPTIONS_HEADER,
    )]
    pub config: Option<PathBuf>,

    #[arg(
    long,
    help = "Base url of the notebook server",
    value_name = "URL",
    help_heading = CONNECTION_OPTIONS_HEADER,
    )]
    pub base_url: Option<String>,

    #[arg(
    long,
    help = "Metrics path relative to the base url",
    value_name = "PATH",
    help_heading = CONNECTION_OPTIONS_HEADER,
    )]
    pub metrics_path: Option<String>,

    #[arg(long, help = "Server token", help_heading = CONNECTION_OPTIONS_HEADER)]
    pub token: Option<String>,

    #[arg(
    long,
    help = "Milliseconds between two polls",
    value_name = "MS",
    help_heading = POLLING_OPTIONS_HEADER,
    )]
    pub refresh_rate: Option<u64>,

    #[arg(
    long,
    help = "Retry failed polls at the refresh rate instead of backing off",
    help_heading = POLLING_OPTIONS_HEADER,
    )]
    pub no_backoff: bool,

    #[arg(
    long,
    help = "Flag the disk once used/total reaches this ratio",
    value_name = "RATIO",
    help_heading = POLLING_OPTIONS_HEADER,
    )]
    pub warn_ratio: Option<f64>,

    #[arg(long, help = "Print render props as JSON lines")]
    pub json: bool,
}

impl ConnectionArgs {
    pub fn usage_config(&self) -> Result<UsageConfig, Whatever> {
        let mut config = match &self.config {
            Some(path) => UsageConfig::from_file(path)
                .with_whatever_context(|e| format!("failed to load config; {e}"))?,
            None => UsageConfig::default(),
        };
        config
            .merge_env()
            .with_whatever_context(|e| format!("failed to read environment; {e}"))?;

        if let Some(base_url) = &self.base_url {
            config.with_base_url(base_url);
        }
        if let Some(path) = &self.metrics_path {
            config.metrics_path = path.clone();
        }
        if let Some(token) = &self.token {
            config.with_token(token);
        }
        if let Some(refresh_rate) = self.refresh_rate {
            config.refresh_rate = refresh_rate;
        }
        if self.no_backoff {
            config.with_backoff(false);
        }
        if let Some(ratio) = self.warn_ratio {
            config.with_warn_ratio(ratio);
        }

        config
            .validate()
            .with_whatever_context(|e| format!("invalid settings; {e}"))?;
        Ok(config)
    }

    pub fn print(&self, snapshot: &UsageSnapshot) -> Result<(), Whatever> {
        let props = RenderProps::from(snapshot);
        if self.json {
            let line = serde_json::to_string(&props)
                .with_whatever_context(|e| format!("failed to encode {props:?}; {e}"))?;
            println!("{line}");
        } else {
            println!("{props}");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
pub struct LoggingArgs {
    #[clap(
    long,
    help = "Write log files to a directory [default: stderr only]",
    help_heading = LOGGING_OPTIONS_HEADER,
    value_name = "DIRECTORY",
    num_args = 0..=1,
    default_missing_value = DEFAULT_LOG_DIR,
    )]
    pub log_directory: Option<String>,

    #[clap(
    short,
    long,
    help = "Log level",
    help_heading = LOGGING_OPTIONS_HEADER,
    value_name = "LEVEL",
    default_value = "warn"
    )]
    pub level: Option<String>,

    #[clap(
    long,
    help = "Disable all logging. You will still see stdout messages.",
    help_heading = LOGGING_OPTIONS_HEADER,
    conflicts_with_all(["log_directory", "level"])
    )]
    pub no_log: bool,
}

impl LoggingArgs {
    pub fn logging_opts(&self) -> Option<LoggingOptions> {
        if self.no_log {
            return None;
        }
        Some(LoggingOptions {
            dir:           self.log_directory.clone(),
            level:         self.level.clone(),
            append_stdout: self.log_directory.is_none(),
        })
    }
}

pub fn log_versions() {
    info!(
        "FULL_VERSION: {}, TARGET: {}, PROFILE: {}",
        build_info::FULL_VERSION,
        build_info::TARGET,
        build_info::PROFILE,
    );
}
