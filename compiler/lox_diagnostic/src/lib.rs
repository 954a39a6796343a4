//! Diagnostic system for the llox front end.
//!
//! A diagnostic carries:
//! - an error code for searchability
//! - a message (what went wrong)
//! - a primary label (where it went wrong)
//! - notes and suggestions (why, and how to fix it)
//!
//! Lexer and parser errors convert into [`Diagnostic`]s; the driver hands
//! them to a [`emitter::DiagnosticEmitter`].

mod diagnostic;
pub mod emitter;
mod error_code;
pub mod span_utils;

pub use diagnostic::{count_by_severity, Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
