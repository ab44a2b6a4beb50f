//! Logging setup
//!
//! Logs always go to stderr so `--json` output on stdout stays parseable.
//! `RUST_LOG` overrides the configured level. Debug builds print compact
//! human-readable lines; release builds emit JSON with the current span.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// HTTP transport internals kept at `warn` below `trace`
const QUIET_TARGETS: &[&str] = &["hyper", "h2", "rustls"];

/// Filter directives for a configured level
pub fn filter_directives(level: &str) -> String {
    let mut directives = vec![level.to_string()];
    if level != "trace" {
        directives.extend(QUIET_TARGETS.iter().map(|target| format!("{}=warn", target)));
    }
    directives.join(",")
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_telemetry(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));
    let registry = tracing_subscriber::registry().with(filter);

    #[cfg(debug_assertions)]
    let installed = registry
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .try_init();

    #[cfg(not(debug_assertions))]
    let installed = registry
        .with(fmt::layer().json().with_current_span(true).with_writer(std::io::stderr))
        .try_init();

    installed.ok();
}
