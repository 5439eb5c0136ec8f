//! Integration test crate for the Nest rental marketplace.
//!
//! This crate exists solely to run scenarios that span the market, ledger,
//! and core crates. It has no public API beyond a logging helper for test
//! debugging.

#![forbid(unsafe_code)]

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a `tracing` subscriber honoring `RUST_LOG`, once per process.
///
/// Call from a test to see the marketplace's structured logs while it runs.
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}
