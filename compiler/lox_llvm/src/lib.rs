//! LLVM backend for llox.
//!
//! Lowers one expression to a module whose `main` prints the value. Values
//! are tagged unions (`lox.value = { i8 tag, ptr payload }`); operations on
//! constants are folded at generation time, everything else is dispatched on
//! the runtime tag with fatal diagnostics for type errors.
//!
//! # Debug Environment Variables
//!
//! - `LOX_DEBUG_LLVM`: Print the generated IR to stderr after generation.
//!   Example: `LOX_DEBUG_LLVM=1 llox run demo.lox`
//!
//! - `RUST_LOG=lox_llvm=trace`: Follow expression lowering step by step,
//!   including every fold decision.
//!
//! # Clippy Configuration
//!
//! Codegen code allows a few pedantic lints:
//! - Cast warnings: LLVM APIs take specific integer widths
//! - Missing panic docs: builder panics are invariant violations
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
)]
//!
//! # Architecture
//!
//! - **Context** (`context.rs`): `SimpleCx` → `CodegenCx`
//! - **Builder** (`builder.rs`): instruction generation and the expression walk
//! - **Declare** (`declare.rs`): libc declarations
//! - **Module** (`module.rs`): `main`, probes, verification
//! - **AOT** (`aot/`): target machines, object emission, passes, linking
//!
//! # Example
//!
//! ```ignore
//! use inkwell::context::Context;
//! use lox_llvm::ModuleCompiler;
//!
//! let program = lox_parse::parse_source("1 + 2")?;
//! let context = Context::create();
//! let compiler = ModuleCompiler::new(&context, "demo");
//! compiler.generate(&program.arena, program.root)?;
//! println!("{}", compiler.print_to_string());
//! ```

pub mod aot;
pub mod builder;
pub mod context;
pub mod declare;
pub mod module;
pub mod report;
pub mod value;

pub use builder::Builder;
pub use context::{CodegenCx, SimpleCx};
pub use module::{CodegenError, CodegenOptions, ModuleCompiler, ProbeKind};
pub use value::LoxValue;

// Lets the driver create contexts without its own inkwell dependency.
pub use inkwell;

mod fold;
mod operators;
mod print;

#[cfg(test)]
mod tests;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
