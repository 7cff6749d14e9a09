//! Tracing setup shared by the CLI and the server.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber. `verbose` counts `-v` occurrences:
/// 0=WARN, 1=INFO, 2=DEBUG, 3+=TRACE. `RUST_LOG` overrides the default.
/// Logs go to stderr so piped stdout stays clean.
pub fn init(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
