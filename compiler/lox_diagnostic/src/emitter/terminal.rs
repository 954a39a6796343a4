//! Terminal Emitter
//!
//! Human-readable diagnostic output with optional ANSI color support.
//! When the source text is attached, spans render as `file:line:col`
//! followed by the offending line and a caret marker.

use std::io::{self, Write};

use lox_ir::Span;

use crate::span_utils::LineOffsetTable;
use crate::{Diagnostic, Severity};

use super::DiagnosticEmitter;

/// ANSI color codes for terminal output.
mod colors {
    pub const ERROR: &str = "\x1b[1;31m"; // Bold red
    pub const WARNING: &str = "\x1b[1;33m"; // Bold yellow
    pub const NOTE: &str = "\x1b[1;36m"; // Bold cyan
    pub const HELP: &str = "\x1b[1;32m"; // Bold green
    pub const BOLD: &str = "\x1b[1m";
    pub const SECONDARY: &str = "\x1b[1;34m"; // Bold blue
    pub const RESET: &str = "\x1b[0m";
}

#[inline]
fn plural_s(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Color output mode for terminal emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Automatically detect based on terminal capabilities.
    #[default]
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

impl ColorMode {
    /// Resolve to a boolean. `is_tty` only matters for `Auto`.
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }

    /// Parse the value of a `--color=` flag.
    pub fn from_flag(value: &str) -> Option<ColorMode> {
        match value {
            "auto" => Some(ColorMode::Auto),
            "always" => Some(ColorMode::Always),
            "never" => Some(ColorMode::Never),
            _ => None,
        }
    }
}

struct SourceContext {
    name: String,
    text: String,
    lines: LineOffsetTable,
}

/// Terminal emitter with optional color support.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colors: bool,
    source: Option<SourceContext>,
}

impl<W: Write> TerminalEmitter<W> {
    /// Create a new terminal emitter with explicit color mode.
    ///
    /// `is_tty` is only consulted for [`ColorMode::Auto`].
    pub fn with_color_mode(writer: W, mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter {
            writer,
            colors: mode.should_use_colors(is_tty),
            source: None,
        }
    }

    /// Create a terminal emitter for stderr with explicit color mode.
    pub fn stderr(mode: ColorMode, is_tty: bool) -> TerminalEmitter<io::Stderr> {
        TerminalEmitter::with_color_mode(io::stderr(), mode, is_tty)
    }

    /// Attach the file the diagnostics refer to.
    #[must_use]
    pub fn with_source(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        self.source = Some(SourceContext {
            name: name.into(),
            lines: LineOffsetTable::build(&text),
            text,
        });
        self
    }

    fn write_colored(&mut self, text: &str, color: &str) {
        if self.colors {
            let _ = write!(self.writer, "{color}{text}{}", colors::RESET);
        } else {
            let _ = write!(self.writer, "{text}");
        }
    }

    fn write_severity(&mut self, severity: Severity) {
        let color = match severity {
            Severity::Error => colors::ERROR,
            Severity::Warning => colors::WARNING,
            Severity::Note => colors::NOTE,
            Severity::Help => colors::HELP,
        };
        self.write_colored(&severity.to_string(), color);
    }

    fn write_code(&mut self, code: &str) {
        if self.colors {
            let _ = write!(self.writer, "{}[{code}]{}", colors::BOLD, colors::RESET);
        } else {
            let _ = write!(self.writer, "[{code}]");
        }
    }

    fn write_location(&mut self, span: Span) {
        match &self.source {
            Some(src) => {
                let (line, col) = src.lines.offset_to_line_col(&src.text, span.start);
                let _ = write!(self.writer, "{}:{line}:{col}", src.name);
            }
            None => {
                let _ = write!(self.writer, "{span:?}");
            }
        }
    }

    /// `  3 | 1 + "a"` and a caret line under the span.
    fn write_snippet(&mut self, span: Span, primary: bool) {
        let Some(src) = &self.source else {
            return;
        };
        let (line, col) = src.lines.offset_to_line_col(&src.text, span.start);
        let Some(text) = src.lines.line_text(&src.text, line) else {
            return;
        };
        let text = text.to_string();
        let gutter = " ".repeat(line.to_string().len());
        let width = src
            .text
            .get(span.to_range())
            .map_or(1, |s| s.lines().next().map_or(1, |l| l.chars().count().max(1)));
        let pad = " ".repeat((col - 1) as usize);
        let marker = if primary { "^" } else { "-" }.repeat(width);

        let _ = writeln!(self.writer, "{gutter} |");
        let _ = writeln!(self.writer, "{line} | {text}");
        let _ = write!(self.writer, "{gutter} | {pad}");
        let color = if primary {
            colors::ERROR
        } else {
            colors::SECONDARY
        };
        self.write_colored(&marker, color);
        let _ = writeln!(self.writer);
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        // Header: severity[CODE]: message
        self.write_severity(diagnostic.severity);
        self.write_code(diagnostic.code.as_str());
        let _ = writeln!(self.writer, ": {}", diagnostic.message);

        for label in &diagnostic.labels {
            let marker = if label.is_primary { "-->" } else { "   " };
            let _ = write!(self.writer, "  {marker} ");
            self.write_location(label.span);
            let _ = write!(self.writer, ": ");
            if label.is_primary {
                self.write_colored(&label.message, colors::ERROR);
            } else {
                self.write_colored(&label.message, colors::SECONDARY);
            }
            let _ = writeln!(self.writer);
            self.write_snippet(label.span, label.is_primary);
        }

        for note in &diagnostic.notes {
            let _ = write!(self.writer, "  = ");
            self.write_colored("note", colors::BOLD);
            let _ = writeln!(self.writer, ": {note}");
        }

        for suggestion in &diagnostic.suggestions {
            let _ = write!(self.writer, "  = ");
            self.write_colored("help", colors::HELP);
            let _ = writeln!(self.writer, ": {suggestion}");
        }

        let _ = writeln!(self.writer);
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        if error_count == 0 && warning_count == 0 {
            return;
        }

        if error_count > 0 {
            self.write_colored("error", colors::ERROR);

            let error_part = if error_count == 1 {
                "previous error".to_string()
            } else {
                format!("{error_count} previous errors")
            };

            if warning_count > 0 {
                let _ = writeln!(
                    self.writer,
                    ": aborting due to {error_part}; {} warning{} emitted",
                    warning_count,
                    plural_s(warning_count)
                );
            } else {
                let _ = writeln!(self.writer, ": aborting due to {error_part}");
            }
        } else {
            self.write_colored("warning", colors::WARNING);
            let _ = writeln!(
                self.writer,
                ": {} warning{} emitted",
                warning_count,
                plural_s(warning_count)
            );
        }
    }
}
