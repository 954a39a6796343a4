//! Ahead-of-time compilation.
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────┐    ┌──────────┐
//! │ LLVM IR  │───▶│  Passes   │───▶│  Object  │───▶│   Link   │
//! │ (module) │    │ default<O>│    │   .o     │    │ cc -lc   │
//! └──────────┘    └───────────┘    └──────────┘    └──────────┘
//! ```
//!
//! - [`TargetConfig`]: host triple, CPU and features
//! - [`ObjectEmitter`]: writes objects, assembly, bitcode or IR text
//! - [`run_optimization_passes`]: new pass manager pipelines
//! - [`LinkerDriver`]: the system C compiler driver as linker
//!
//! ```ignore
//! let emitter = ObjectEmitter::native()?;
//! emitter.configure_module(compiler.module())?;
//! run_optimization_passes(compiler.module(), emitter.machine(), OptimizationLevel::O2)?;
//! emitter.emit_object(compiler.module(), Path::new("main.o"))?;
//! LinkerDriver::new().link(&LinkInput::executable(vec!["main.o".into()], "main"))?;
//! ```

pub mod linker;
pub mod object;
pub mod passes;
pub mod target;

pub use linker::{LinkInput, LinkerDriver, LinkerError};
pub use object::{EmitError, ObjectEmitter, OutputFormat};
pub use passes::{run_optimization_passes, run_pipeline, OptimizationError, OptimizationLevel};
pub use target::{TargetConfig, TargetError};
