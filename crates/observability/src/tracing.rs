//! Subscriber construction.
//!
//! JSON lines with timestamps. Audit persistence failures arrive on the
//! `audit` target, so `RUST_LOG=info,audit=debug` isolates that channel.

use tracing_subscriber::EnvFilter;

pub(crate) fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init();
}
