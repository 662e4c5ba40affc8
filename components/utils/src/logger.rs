use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// How the process should log.
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Directory for daily rotated log files; `None` keeps everything on
    /// stderr.
    pub dir:           Option<String>,
    /// Default level when `RUST_LOG` is not set.
    pub level:         Option<String>,
    /// Keep writing to stderr even when a log directory is set.
    pub append_stdout: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            dir:           None,
            level:         Some("info".to_string()),
            append_stdout: true,
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over [LoggingOptions::level]. The returned guards flush
/// the file writer on drop, so keep them alive for the life of the process.
pub fn init_logging(service_name: &str, opts: &LoggingOptions) -> Vec<WorkerGuard> {
    let mut guards = vec![];

    let level = opts.level.as_deref().unwrap_or("info");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = if opts.append_stdout || opts.dir.is_none() {
        Some(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .boxed(),
        )
    } else {
        None
    };

    let file_layer = opts.dir.as_ref().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, service_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);
        fmt::layer().with_ansi(false).with_writer(writer).boxed()
    });

    // A second init (tests, embedding) keeps the first subscriber.
    if tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        std::panic::set_hook(Box::new(tracing_panic_hook));
        tracing::info!(service = service_name, "logging started");
    }

    guards
}

/// Routes panics through tracing so they land in the log files as well.
fn tracing_panic_hook(info: &std::panic::PanicInfo) {
    let msg = match info.payload().downcast_ref::<&'static str>() {
        Some(s) => *s,
        None => match info.payload().downcast_ref::<String>() {
            Some(s) => &s[..],
            None => "Box<dyn Any>",
        },
    };
    let thread = std::thread::current();
    let thread = thread.name().unwrap_or("<unnamed>");
    match info.location() {
        Some(location) => {
            let location = format!("{}:{}:{}", location.file(), location.line(), location.column());
            tracing::error!(%thread, %location, "panic: {msg}");
        }
        None => tracing::error!(%thread, "panic: {msg}"),
    }
}
