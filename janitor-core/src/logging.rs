//! Structured logging using **tracing**.
//!
//! Library code emits `tracing` events (entity discovered, file skipped,
//! entity failed); the binary decides where they go. Events are written as
//! JSON to stderr so stdout stays clean for reports.

/// Initializes the global tracing subscriber.
///
/// Call once at process start. Filtering follows `RUST_LOG`
/// (e.g. `RUST_LOG=janitor_core=debug`) and defaults to `warn`.
pub fn init_structured_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let result = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}
