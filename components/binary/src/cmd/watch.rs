use std::future::Future;

use clap::Args;
use diskbar_common::DISKBAR;
use diskbar_usage::{UsageMonitor, UsageSnapshot};
use snafu::{whatever, ResultExt, Whatever};
use tokio::{runtime, select, sync::watch};
use tracing::info;

use super::{log_versions, ConnectionArgs, LoggingArgs};

#[derive(Debug, Clone, Args)]
#[command(flatten_help = true)]
#[command(long_about = r"

Poll the metrics endpoint until interrupted and print a line whenever the
disk usage changes.
Examples:

# Poll a local server every two seconds
diskbar watch --base-url http://localhost:8888/ --refresh-rate 2000
")]
pub struct WatchArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

impl WatchArgs {
    pub fn run(self) -> Result<(), Whatever> {
        let _guards = match self.logging.logging_opts() {
            Some(opts) => diskbar_utils::logger::init_logging(DISKBAR, &opts),
            None => vec![],
        };
        log_versions();
        let config = self.connection.usage_config()?;

        // One event loop drives timer, request and model.
        let rt = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .with_whatever_context(|e| format!("failed to build tokio runtime; {e}"))?;

        rt.block_on(async move {
            let monitor = UsageMonitor::start(&config)
                .with_whatever_context(|e| format!("failed to start monitor; {e}"))?;
            let mut changes = monitor.subscribe();
            self.connection.print(&changes.borrow_and_update())?;

            let followed = follow(&mut changes, tokio::signal::ctrl_c(), |snapshot| {
                self.connection.print(snapshot)
            })
            .await;

            monitor.dispose().await;
            followed
        })
    }
}

/// Print every change until `shutdown` resolves. A closed channel means the
/// poll task died, which is an error rather than a shutdown.
async fn follow<F, P>(
    changes: &mut watch::Receiver<UsageSnapshot>,
    shutdown: F,
    mut print: P,
) -> Result<(), Whatever>
where
    F: Future,
    P: FnMut(&UsageSnapshot) -> Result<(), Whatever>,
{
    tokio::pin!(shutdown);
    loop {
        select! {
            _ = &mut shutdown => {
                info!("interrupted, shutting down");
                return Ok(());
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    whatever!("disk usage monitor stopped unexpectedly");
                }
                let snapshot = *changes.borrow_and_update();
                print(&snapshot)?;
            }
        }
    }
}
