//! Target configuration for AOT compilation.
//!
//! llox only compiles for the host, so a configuration is the host triple
//! plus CPU, feature string and codegen optimization level.
//!
//! ```ignore
//! use lox_llvm::aot::TargetConfig;
//!
//! let config = TargetConfig::native()?.with_cpu("x86-64-v2");
//! config.configure_module(compiler.module())?;
//! ```

use std::fmt;
use std::sync::OnceLock;

use inkwell::module::Module;
use inkwell::targets::{
    CodeModel, InitializationConfig, RelocMode, Target, TargetMachine, TargetTriple,
};
use inkwell::OptimizationLevel;

/// Error type for target configuration operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// Failed to initialize the LLVM native target.
    InitializationFailed(String),
    /// Failed to create target machine.
    TargetMachineCreationFailed(String),
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed(msg) => {
                write!(f, "failed to initialize LLVM target: {msg}")
            }
            Self::TargetMachineCreationFailed(msg) => {
                write!(f, "failed to create target machine: {msg}")
            }
        }
    }
}

impl std::error::Error for TargetError {}

/// Host target configuration.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    triple: String,
    /// `generic` unless overridden.
    cpu: String,
    /// `+feat,-feat` list passed to LLVM unchanged.
    features: String,
    opt_level: OptimizationLevel,
}

impl TargetConfig {
    /// Configuration for the host, with the portable `generic` CPU.
    ///
    /// # Errors
    ///
    /// Returns an error if LLVM target initialization fails.
    pub fn native() -> Result<Self, TargetError> {
        initialize_native_target()?;

        let triple = TargetMachine::get_default_triple();
        Ok(Self {
            triple: triple.as_str().to_string_lossy().into_owned(),
            cpu: "generic".to_string(),
            features: String::new(),
            opt_level: OptimizationLevel::None,
        })
    }

    #[must_use]
    pub fn with_cpu(mut self, cpu: &str) -> Self {
        self.cpu = cpu.to_string();
        self
    }

    #[must_use]
    pub fn with_features(mut self, features: &str) -> Self {
        self.features = features.to_string();
        self
    }

    /// Backend (instruction selection) optimization level. IR passes are
    /// configured separately in [`passes`](super::passes).
    #[must_use]
    pub fn with_opt_level(mut self, level: OptimizationLevel) -> Self {
        self.opt_level = level;
        self
    }

    #[must_use]
    pub fn triple(&self) -> &str {
        &self.triple
    }

    #[must_use]
    pub fn cpu(&self) -> &str {
        &self.cpu
    }

    #[must_use]
    pub fn features(&self) -> &str {
        &self.features
    }

    #[must_use]
    pub fn opt_level(&self) -> OptimizationLevel {
        self.opt_level
    }

    /// Create an LLVM `TargetMachine` for this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if LLVM rejects the triple/cpu/features combination.
    pub fn create_target_machine(&self) -> Result<TargetMachine, TargetError> {
        let target_triple = TargetTriple::create(&self.triple);

        let target = Target::from_triple(&target_triple).map_err(|e| {
            TargetError::TargetMachineCreationFailed(format!("failed to get target: {e}"))
        })?;

        target
            .create_target_machine(
                &target_triple,
                &self.cpu,
                &self.features,
                self.opt_level,
                RelocMode::Default,
                CodeModel::Default,
            )
            .ok_or_else(|| {
                TargetError::TargetMachineCreationFailed(format!(
                    "LLVM returned None for target '{}' with CPU '{}' and features '{}'",
                    self.triple, self.cpu, self.features
                ))
            })
    }

    /// Data layout string of the target machine.
    ///
    /// # Errors
    ///
    /// Returns an error if a target machine cannot be created.
    pub fn data_layout(&self) -> Result<String, TargetError> {
        let machine = self.create_target_machine()?;
        Ok(machine
            .get_target_data()
            .get_data_layout()
            .as_str()
            .to_string_lossy()
            .into_owned())
    }

    /// Set the module's target triple and data layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the target machine cannot be created.
    pub fn configure_module(&self, module: &Module<'_>) -> Result<(), TargetError> {
        let machine = self.create_target_machine()?;
        module.set_triple(&TargetTriple::create(&self.triple));
        module.set_data_layout(&machine.get_target_data().get_data_layout());
        Ok(())
    }
}

static NATIVE_TARGET_INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Initialize the native LLVM target. Later calls return the first outcome.
fn initialize_native_target() -> Result<(), TargetError> {
    NATIVE_TARGET_INIT
        .get_or_init(|| Target::initialize_native(&InitializationConfig::default()))
        .clone()
        .map_err(TargetError::InitializationFailed)
}
