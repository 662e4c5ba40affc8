use clap::Args;
use diskbar_common::DISKBAR;
use diskbar_usage::{HttpMetricsSource, MetricsSource, Tick, UsageModel};
use snafu::{whatever, ResultExt, Whatever};
use tokio::runtime;

use super::{ConnectionArgs, LoggingArgs};

#[derive(Debug, Clone, Args)]
#[command(flatten_help = true)]
#[command(long_about = r"

Fetch the metrics endpoint once and print the disk usage line. Exits with
an error when the request fails.
")]
pub struct OnceArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

impl OnceArgs {
    pub fn run(self) -> Result<(), Whatever> {
        let _guards = match self.logging.logging_opts() {
            Some(opts) => diskbar_utils::logger::init_logging(DISKBAR, &opts),
            None => vec![],
        };
        let config = self.connection.usage_config()?;
        let source = HttpMetricsSource::new(&config)
            .with_whatever_context(|e| format!("failed to create http client; {e}"))?;

        let rt = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .with_whatever_context(|e| format!("failed to build tokio runtime; {e}"))?;
        let tick = match rt.block_on(source.fetch()) {
            Ok(metrics) => Tick::Resolved(metrics),
            Err(e) => Tick::Rejected(e),
        };

        let mut model = UsageModel::new(config.warn_policy());
        model.apply(&tick);
        self.connection.print(&model.snapshot())?;

        if let Tick::Rejected(e) = tick {
            whatever!("failed to fetch {}; {e}", source.endpoint());
        }
        Ok(())
    }
}
