//! Tracing setup for the harness binary.

use tracing_subscriber::filter::EnvFilter;

pub const LOG_ENV: &str = "SEMCON_HARNESS_LOG";

/// Installs a stderr fmt subscriber.
///
/// The filter comes from `SEMCON_HARNESS_LOG`, then `RUST_LOG`, then defaults to
/// `warn` so that report output on stdout stays clean. Calling this twice is
/// harmless; the second install is ignored.
pub fn init() {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!("invalid {LOG_ENV} directive ({err}); defaulting to warn");
            EnvFilter::new("warn")
        }),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
