//! Writing a finished module to disk.
//!
//! ```text
//! Module ──configure_module──▶ Module + triple/layout ──emit(format)──▶ .o / .s / .bc / .ll
//! ```
//!
//! Object and assembly output go through the target machine. Bitcode and IR
//! text are written by LLVM directly and need no machine code generation.

use std::fmt;
use std::path::Path;

use inkwell::module::Module;
use inkwell::targets::{FileType, TargetMachine};
use tracing::debug;

use super::target::{TargetConfig, TargetError};

/// Error type for object file emission operations.
#[derive(Debug, Clone)]
pub enum EmitError {
    /// Failed to create target machine.
    TargetMachine(TargetError),
    /// Failed to set the module's triple and data layout.
    ModuleConfiguration(TargetError),
    ObjectEmission { path: String, message: String },
    AssemblyEmission { path: String, message: String },
    BitcodeEmission { path: String, message: String },
    LlvmIrEmission { path: String, message: String },
    /// Output path is not valid.
    InvalidPath { path: String, reason: String },
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetMachine(err) => write!(f, "failed to create target machine: {err}"),
            Self::ModuleConfiguration(err) => write!(f, "failed to configure module: {err}"),
            Self::ObjectEmission { path, message } => {
                write!(f, "failed to emit object file '{path}': {message}")
            }
            Self::AssemblyEmission { path, message } => {
                write!(f, "failed to emit assembly file '{path}': {message}")
            }
            Self::BitcodeEmission { path, message } => {
                write!(f, "failed to emit bitcode file '{path}': {message}")
            }
            Self::LlvmIrEmission { path, message } => {
                write!(f, "failed to emit LLVM IR file '{path}': {message}")
            }
            Self::InvalidPath { path, reason } => {
                write!(f, "invalid output path '{path}': {reason}")
            }
        }
    }
}

impl std::error::Error for EmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TargetMachine(err) | Self::ModuleConfiguration(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TargetError> for EmitError {
    fn from(err: TargetError) -> Self {
        Self::TargetMachine(err)
    }
}

fn validate_parent_exists(path: &Path) -> Result<(), EmitError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(EmitError::InvalidPath {
                path: path.to_string_lossy().into_owned(),
                reason: "parent directory does not exist".to_string(),
            });
        }
    }
    Ok(())
}

/// Output format for code emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Native object file, linked into an executable afterwards.
    Object,
    /// Assembly text (.s).
    Assembly,
    /// LLVM bitcode (.bc).
    Bitcode,
    /// LLVM IR text (.ll).
    LlvmIr,
}

impl OutputFormat {
    /// Parse the value of `--emit=`.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "obj" | "object" => Some(Self::Object),
            "asm" => Some(Self::Assembly),
            "llvm-bc" => Some(Self::Bitcode),
            "llvm-ir" => Some(Self::LlvmIr),
            _ => None,
        }
    }

    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Object => "o",
            Self::Assembly => "s",
            Self::Bitcode => "bc",
            Self::LlvmIr => "ll",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Object => "native object file",
            Self::Assembly => "assembly text",
            Self::Bitcode => "LLVM bitcode",
            Self::LlvmIr => "LLVM IR text",
        }
    }
}

/// Emitter bound to one target machine.
pub struct ObjectEmitter {
    machine: TargetMachine,
    config: TargetConfig,
}

impl ObjectEmitter {
    /// # Errors
    ///
    /// Returns an error if the target machine cannot be created.
    pub fn new(config: &TargetConfig) -> Result<Self, EmitError> {
        let machine = config.create_target_machine()?;
        Ok(Self {
            machine,
            config: config.clone(),
        })
    }

    /// Emitter for the host.
    ///
    /// # Errors
    ///
    /// Returns an error if native target detection or machine creation fails.
    pub fn native() -> Result<Self, EmitError> {
        Self::new(&TargetConfig::native()?)
    }

    #[must_use]
    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    /// The machine, for the pass manager.
    #[must_use]
    pub fn machine(&self) -> &TargetMachine {
        &self.machine
    }

    /// Set triple and data layout. Call before optimizing or emitting.
    ///
    /// # Errors
    ///
    /// Returns an error if module configuration fails.
    pub fn configure_module(&self, module: &Module<'_>) -> Result<(), EmitError> {
        self.config
            .configure_module(module)
            .map_err(EmitError::ModuleConfiguration)
    }

    /// # Errors
    ///
    /// Returns an error if the path is invalid or LLVM fails to write it.
    pub fn emit_object(&self, module: &Module<'_>, path: &Path) -> Result<(), EmitError> {
        self.write_with_machine(module, path, FileType::Object)
    }

    /// # Errors
    ///
    /// Returns an error if the path is invalid or LLVM fails to write it.
    pub fn emit_assembly(&self, module: &Module<'_>, path: &Path) -> Result<(), EmitError> {
        self.write_with_machine(module, path, FileType::Assembly)
    }

    /// # Errors
    ///
    /// Returns an error if the bitcode cannot be written.
    pub fn emit_bitcode(&self, module: &Module<'_>, path: &Path) -> Result<(), EmitError> {
        validate_parent_exists(path)?;
        if module.write_bitcode_to_path(path) {
            Ok(())
        } else {
            Err(EmitError::BitcodeEmission {
                path: path.to_string_lossy().into_owned(),
                message: "LLVM failed to write bitcode".to_string(),
            })
        }
    }

    /// # Errors
    ///
    /// Returns an error if the IR cannot be written.
    pub fn emit_llvm_ir(&self, module: &Module<'_>, path: &Path) -> Result<(), EmitError> {
        validate_parent_exists(path)?;
        module
            .print_to_file(path)
            .map_err(|e| EmitError::LlvmIrEmission {
                path: path.to_string_lossy().into_owned(),
                message: e.to_string(),
            })
    }

    /// Emit `module` to `path` as `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if emission fails.
    pub fn emit(
        &self,
        module: &Module<'_>,
        path: &Path,
        format: OutputFormat,
    ) -> Result<(), EmitError> {
        debug!(path = %path.display(), format = format.description(), "emit");
        match format {
            OutputFormat::Object => self.emit_object(module, path),
            OutputFormat::Assembly => self.emit_assembly(module, path),
            OutputFormat::Bitcode => self.emit_bitcode(module, path),
            OutputFormat::LlvmIr => self.emit_llvm_ir(module, path),
        }
    }

    fn write_with_machine(
        &self,
        module: &Module<'_>,
        path: &Path,
        file_type: FileType,
    ) -> Result<(), EmitError> {
        validate_parent_exists(path)?;
        self.machine
            .write_to_file(module, file_type, path)
            .map_err(|e| {
                let path = path.to_string_lossy().into_owned();
                let message = e.to_string();
                match file_type {
                    FileType::Assembly => EmitError::AssemblyEmission { path, message },
                    FileType::Object => EmitError::ObjectEmission { path, message },
                }
            })
    }
}

impl fmt::Debug for ObjectEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectEmitter")
            .field("target", &self.config.triple())
            .field("cpu", &self.config.cpu())
            .finish_non_exhaustive()
    }
}
