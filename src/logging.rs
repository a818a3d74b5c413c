//! Global `tracing` subscriber setup, called once per process (manager and
//! each worker get their own instance, matching the process-isolation model
//! of spec §5).

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a `tracing_subscriber::fmt` subscriber filtered by `RUST_LOG`,
/// defaulting to `info`. Safe to call more than once per process; only the
/// first call takes effect.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    });
}
