//! Logging initialization for embedding applications (ambient stack,
//! SPEC_FULL.md §7). This is a library crate and never calls this
//! itself outside of tests — a caller's own binary decides when and how
//! to install a subscriber — but the helper mirrors the teacher's
//! `main.rs` `EnvFilter`/`fmt` setup so that wiring it up is a one-line
//! call rather than reinventing the filter precedence.

use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber writing to stderr. `verbose`
/// forces `debug` level; otherwise `RUST_LOG` is honored, falling back
/// to `info`. Safe to call more than once; later calls are no-ops.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Install a subscriber suited to `cargo test` output capture. Intended
/// to be called at the top of any test that wants to see `tracing`
/// output on failure.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_for_tests();
        init_for_tests();
    }
}
