//! Linking objects into an executable.
//!
//! The system C compiler driver does the work: it knows where the C runtime
//! start files and libc live on every host we support.
//!
//! ```text
//! cc main.o -o main -lc
//! ```
//!
//! The driver program is `cc` unless `LOX_LINKER` or an explicit override
//! names another one (`clang`, `gcc`, ...).

use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

/// Environment variable naming the linker program.
pub const LINKER_ENV: &str = "LOX_LINKER";

/// Default linker program.
pub const DEFAULT_LINKER: &str = "cc";

/// Error type for linker operations.
#[derive(Debug, Clone)]
pub enum LinkerError {
    /// Linker executable not found.
    LinkerNotFound { linker: String, message: String },
    /// Linker ran and reported failure.
    LinkFailed {
        linker: String,
        exit_code: Option<i32>,
        stderr: String,
        command: String,
    },
    /// Invalid linker configuration.
    InvalidConfig { message: String },
    /// I/O error while starting the linker.
    IoError { message: String },
}

impl fmt::Display for LinkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkerNotFound { linker, message } => {
                write!(f, "linker '{linker}' not found: {message}")
            }
            Self::LinkFailed {
                linker,
                exit_code,
                stderr,
                command,
            } => {
                write!(f, "linking with '{linker}' failed")?;
                if let Some(code) = exit_code {
                    write!(f, " (exit code {code})")?;
                }
                if !stderr.is_empty() {
                    write!(f, "\n\nLinker stderr:\n{stderr}")?;
                }
                write!(f, "\n\nCommand: {command}")
            }
            Self::InvalidConfig { message } => {
                write!(f, "invalid linker configuration: {message}")
            }
            Self::IoError { message } => write!(f, "I/O error during linking: {message}"),
        }
    }
}

impl std::error::Error for LinkerError {}

/// What to link.
#[derive(Debug, Clone)]
pub struct LinkInput {
    pub objects: Vec<PathBuf>,
    pub output: PathBuf,
    /// Passed as `-l<name>`.
    pub libraries: Vec<String>,
    /// Appended to the command line unchanged.
    pub extra_args: Vec<String>,
}

impl LinkInput {
    /// An executable from `objects`, linked against libc.
    pub fn executable(objects: Vec<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            objects,
            output: output.into(),
            libraries: vec!["c".to_string()],
            extra_args: Vec::new(),
        }
    }
}

/// Runs the C compiler driver as a linker.
#[derive(Debug, Clone)]
pub struct LinkerDriver {
    program: String,
}

impl Default for LinkerDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkerDriver {
    /// Use `$LOX_LINKER`, falling back to `cc`.
    pub fn new() -> Self {
        let program = std::env::var(LINKER_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_LINKER.to_string());
        Self { program }
    }

    pub fn with_linker(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// The command [`link`](Self::link) would run.
    pub fn command(&self, input: &LinkInput) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&input.objects);
        cmd.arg("-o").arg(&input.output);
        for lib in &input.libraries {
            cmd.arg(format!("-l{lib}"));
        }
        cmd.args(&input.extra_args);
        cmd
    }

    /// # Errors
    ///
    /// Returns an error if there is nothing to link, the linker cannot be
    /// started, or it exits unsuccessfully.
    pub fn link(&self, input: &LinkInput) -> Result<(), LinkerError> {
        if input.objects.is_empty() {
            return Err(LinkerError::InvalidConfig {
                message: "no object files to link".to_string(),
            });
        }

        let mut cmd = self.command(input);
        debug!(command = ?cmd, "linking");
        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LinkerError::LinkerNotFound {
                    linker: self.program.clone(),
                    message: e.to_string(),
                }
            } else {
                LinkerError::IoError {
                    message: e.to_string(),
                }
            }
        })?;

        if output.status.success() {
            return Ok(());
        }
        Err(LinkerError::LinkFailed {
            linker: self.program.clone(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            command: format!("{cmd:?}"),
        })
    }
}
