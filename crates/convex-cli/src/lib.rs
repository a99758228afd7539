//! Convex CLI library
//!
//! Exposes the command handlers so integration tests and the `convex` binary share them.

pub mod commands;
pub mod common;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the `tracing` subscriber for the library crates' diagnostics.
///
/// `RUST_LOG` selects the filter; without it only warnings from the convex crates show.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "convex=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}
