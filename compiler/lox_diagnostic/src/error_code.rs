//! Error codes for all compiler diagnostics.
//!
//! Each error code is a unique identifier (e.g., `E1001`) with the first digit
//! indicating the compiler phase.

use std::fmt;

/// Error codes for all compiler diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E0xxx: Lexer errors
/// - E1xxx: Parser errors
/// - E5xxx: Codegen / LLVM / linking errors
/// - E9xxx: Internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexer Errors (E0xxx)
    /// Unterminated string literal
    E0001,
    /// Unexpected character in source
    E0002,
    /// Unterminated block comment
    E0003,
    /// NUL byte inside a string literal
    E0004,

    // Parser Errors (E1xxx)
    /// Missing `)` after a parenthesised expression
    E1001,
    /// Expected expression
    E1002,
    /// Tokens left over after a complete expression
    E1003,

    // Codegen Errors (E5xxx)
    /// Expression could not be lowered
    E5001,
    /// Generated module failed verification
    E5002,
    /// Target machine or object emission failure
    E5003,
    /// Optimization pipeline failure
    E5004,
    /// Linker failure
    E5005,

    // Internal Errors (E9xxx)
    /// Internal compiler error
    E9001,
}

impl ErrorCode {
    /// Every code, in numeric order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E0001,
        ErrorCode::E0002,
        ErrorCode::E0003,
        ErrorCode::E0004,
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E5001,
        ErrorCode::E5002,
        ErrorCode::E5003,
        ErrorCode::E5004,
        ErrorCode::E5005,
        ErrorCode::E9001,
    ];

    /// Get the string representation of this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E0002 => "E0002",
            ErrorCode::E0003 => "E0003",
            ErrorCode::E0004 => "E0004",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E5001 => "E5001",
            ErrorCode::E5002 => "E5002",
            ErrorCode::E5003 => "E5003",
            ErrorCode::E5004 => "E5004",
            ErrorCode::E5005 => "E5005",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// One-line description, shown by `llox help` style listings.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "unterminated string literal",
            ErrorCode::E0002 => "unexpected character",
            ErrorCode::E0003 => "unterminated block comment",
            ErrorCode::E0004 => "NUL byte in string literal",
            ErrorCode::E1001 => "missing closing parenthesis",
            ErrorCode::E1002 => "expected expression",
            ErrorCode::E1003 => "unexpected token after expression",
            ErrorCode::E5001 => "expression could not be compiled",
            ErrorCode::E5002 => "generated module is invalid",
            ErrorCode::E5003 => "code emission failed",
            ErrorCode::E5004 => "optimization failed",
            ErrorCode::E5005 => "linking failed",
            ErrorCode::E9001 => "internal compiler error",
        }
    }

    /// Check if this is a lexer error (E0xxx range).
    pub fn is_lexer_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E0001 | ErrorCode::E0002 | ErrorCode::E0003 | ErrorCode::E0004
        )
    }

    /// Check if this is a parser error (E1xxx range).
    pub fn is_parser_error(&self) -> bool {
        matches!(self, ErrorCode::E1001 | ErrorCode::E1002 | ErrorCode::E1003)
    }

    /// Check if this is a codegen error (E5xxx range).
    pub fn is_codegen_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E5001
                | ErrorCode::E5002
                | ErrorCode::E5003
                | ErrorCode::E5004
                | ErrorCode::E5005
        )
    }

    /// Check if this is an internal compiler error (E9xxx range).
    pub fn is_internal_error(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E1002"`. Case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}
