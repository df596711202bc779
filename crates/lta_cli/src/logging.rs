//! Log subscriber for the binary. Library crates only emit `tracing` events.

use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` wins when set; otherwise `info`, or `warn` under `--quiet`.
/// Events go to stderr so stdout stays reserved for the review table.
pub fn init(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
