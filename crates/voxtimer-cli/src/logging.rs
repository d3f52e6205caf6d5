//! Logging setup for the CLI.
//!
//! Everything goes to stderr so command output on stdout stays parseable.
//! `VOXTIMER_LOG` takes a full `EnvFilter` directive and wins over
//! `DEBUG_LOGGING=1`, which turns on debug output for the voxtimer crates.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub fn init() {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let filter_directive = match std::env::var("VOXTIMER_LOG") {
        Ok(directive) if !directive.trim().is_empty() => directive,
        _ if debug_logging => "info,voxtimer=debug,voxtimer_core=debug".to_string(),
        _ => "info".to_string(),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let filter = EnvFilter::try_new(&filter_directive).unwrap_or_else(|e| {
        eprintln!("invalid VOXTIMER_LOG directive {filter_directive:?}: {e}, using info");
        EnvFilter::new("info")
    });

    // A second init (e.g. in tests) is not an error worth reporting.
    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .try_init();

    tracing::debug!(debug_logging, "voxtimer logging initialized");
}
