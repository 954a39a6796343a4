//! The llox compiler driver.
//!
//! Command handlers live in [`commands`]; `main.rs` only parses the command
//! line and dispatches. Code generation needs the `llvm` feature, without
//! it the driver can still lex and parse.

pub mod commands;

use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Install a hierarchical tracing subscriber on stderr.
///
/// The filter comes from `LOX_LOG`, falling back to `RUST_LOG`. Does nothing
/// when neither is set. Safe to call more than once.
pub fn init_logging() {
    LOGGING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};
        use tracing_tree::HierarchicalLayer;

        let Some(directives) = std::env::var("LOX_LOG")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
        else {
            return;
        };

        tracing_subscriber::registry()
            .with(EnvFilter::new(directives))
            .with(
                HierarchicalLayer::new(2)
                    .with_targets(true)
                    .with_indent_lines(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    });
}
