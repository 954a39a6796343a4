//! Shared data types for the llox compiler.
//!
//! - [`Span`]: byte ranges into the source text
//! - [`Token`] / [`TokenKind`]: scanner output
//! - [`ExprArena`] / [`ExprId`] / [`Expr`]: flat expression tree
//! - [`TypeTag`] / [`Value`]: the dynamic type model shared by the
//!   constant folder and the LLVM backend
//! - [`ops`]: the operator table both evaluation strategies consult
//!
//! Nothing in this crate depends on LLVM, so front-end tooling (`llox lex`,
//! `llox parse`) builds without it.

pub mod ast;
pub mod ops;
pub mod printer;
mod span;
pub mod stack;
mod token;
mod value;

pub use ast::{BinaryOp, Expr, ExprArena, ExprId, ExprKind, UnaryOp};
pub use span::{Span, SpanError};
pub use token::{Token, TokenKind};
pub use value::{format_number, TypeTag, Value};
