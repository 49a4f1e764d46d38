mod eval;
mod memory;

pub use eval::{compare_records, matches};
pub use memory::{MemoryModel, Op, Record};

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber that writes through the test harness.
///
/// Respects `RUST_LOG`, falling back to `debug`. Safe to call from every test:
/// only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
