//! Tracing subscriber setup for console diagnostics.
//!
//! Engine modules emit events through [`tracing`]; this module wires a
//! console formatter so the `--verbose` flag controls what the user sees.
//! Diagnostics go to stderr, keeping stdout reserved for operation output.

use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// Verbose mode shows `DEBUG` and above; otherwise only `WARN` and above.
/// An `INI_LOG` environment filter, when set, overrides both.
///
/// Safe to call once per process; a second call is a no-op because the
/// global default is already set.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("INI_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
