//! The `build` command: AOT compilation to a native executable.
//!
//! Also owns [`BuildOptions`], which `run`, `ir` and `repl` share.

use std::path::{Path, PathBuf};

use lox_diagnostic::emitter::ColorMode;

/// Build options parsed from command line arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Output file path (-o, --output=)
    pub output: Option<PathBuf>,
    /// Emit type: obj, llvm-ir, llvm-bc, asm (--emit=). `None` links an executable.
    pub emit: Option<EmitType>,
    /// Optimization level: 0, 1, 2, 3, s, z (--opt=)
    pub opt_level: OptLevel,
    /// Fold operations on constants (cleared by --no-fold)
    pub fold_constants: bool,
    /// C compiler driver used to link (--linker=)
    pub linker: Option<String>,
    /// Verbose output (-v, --verbose)
    pub verbose: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            output: None,
            emit: None,
            opt_level: OptLevel::O0,
            fold_constants: true,
            linker: None,
            verbose: false,
        }
    }
}

impl BuildOptions {
    /// Overlay the options set in `other`.
    pub fn merge(&mut self, other: &Self) {
        // Option fields: take new value if present
        if other.output.is_some() {
            self.output.clone_from(&other.output);
        }
        if other.emit.is_some() {
            self.emit = other.emit;
        }
        if other.linker.is_some() {
            self.linker.clone_from(&other.linker);
        }
        if other.opt_level != OptLevel::default() {
            self.opt_level = other.opt_level;
        }

        // Folding is on unless some argument turned it off
        self.fold_constants &= other.fold_constants;
        self.verbose |= other.verbose;
    }
}

/// Optimization level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    /// No optimization
    #[default]
    O0,
    O1,
    O2,
    O3,
    /// Optimize for size
    Os,
    /// Minimize size aggressively
    Oz,
}

impl OptLevel {
    /// Parse from command line string.
    pub fn from_flag(s: &str) -> Option<Self> {
        match s {
            "0" => Some(Self::O0),
            "1" => Some(Self::O1),
            "2" => Some(Self::O2),
            "3" => Some(Self::O3),
            "s" => Some(Self::Os),
            "z" => Some(Self::Oz),
            _ => None,
        }
    }
}

/// What `build --emit=` writes instead of an executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitType {
    /// Native object file (.o)
    Object,
    /// LLVM IR text (.ll)
    LlvmIr,
    /// LLVM bitcode (.bc)
    LlvmBc,
    /// Assembly (.s)
    Assembly,
}

impl EmitType {
    /// Parse from command line string.
    pub fn from_flag(s: &str) -> Option<Self> {
        match s {
            "obj" | "object" => Some(Self::Object),
            "llvm-ir" | "ir" => Some(Self::LlvmIr),
            "llvm-bc" | "bc" | "bitcode" => Some(Self::LlvmBc),
            "asm" | "assembly" => Some(Self::Assembly),
            _ => None,
        }
    }

    /// File extension for this emit type.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Object => "o",
            Self::LlvmIr => "ll",
            Self::LlvmBc => "bc",
            Self::Assembly => "s",
        }
    }
}

/// Parse build flags. `-o <path>` needs lookahead and is handled by the caller.
pub fn parse_build_options(args: &[String]) -> BuildOptions {
    let mut options = BuildOptions::default();

    for arg in args {
        if let Some(level) = arg.strip_prefix("--opt=") {
            if let Some(opt) = OptLevel::from_flag(level) {
                options.opt_level = opt;
            } else {
                eprintln!("warning: unknown optimization level '{level}', using O0");
            }
        } else if let Some(output) = arg.strip_prefix("-o=") {
            options.output = Some(PathBuf::from(output));
        } else if let Some(output) = arg.strip_prefix("--output=") {
            options.output = Some(PathBuf::from(output));
        } else if let Some(emit) = arg.strip_prefix("--emit=") {
            if let Some(e) = EmitType::from_flag(emit) {
                options.emit = Some(e);
            } else {
                eprintln!(
                    "warning: unknown emit type '{emit}', options: obj, llvm-ir, llvm-bc, asm"
                );
            }
        } else if let Some(linker) = arg.strip_prefix("--linker=") {
            options.linker = Some(linker.to_string());
        } else if arg == "--no-fold" {
            options.fold_constants = false;
        } else if arg == "-v" || arg == "--verbose" {
            options.verbose = true;
        } else {
            eprintln!("warning: ignoring unknown option '{arg}'");
        }
    }

    options
}

/// Where `build` writes its result for `source_path`.
///
/// An explicit `-o` wins; otherwise the file stem in the current directory,
/// with the emit type's extension when not linking.
pub fn determine_output_path(source_path: &str, options: &BuildOptions) -> PathBuf {
    if let Some(ref output) = options.output {
        return output.clone();
    }
    let stem = Path::new(source_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("a");
    let path = PathBuf::from(stem);
    match options.emit {
        Some(emit) => path.with_extension(emit.extension()),
        None => path,
    }
}

/// Build a llox source file.
///
/// 1. Lex and parse
/// 2. Generate LLVM IR
/// 3. Run optimization passes
/// 4. Emit the requested format, or an object file that is then linked
#[cfg(feature = "llvm")]
pub fn build_file(path: &str, options: &BuildOptions, color: ColorMode) {
    use std::time::Instant;

    use super::compile_common::{compile_to_file, exit_on_compile_error};
    use super::load_program;

    let start = Instant::now();
    if options.verbose {
        eprintln!("  Compiling {path}...");
    }

    let program = load_program(path, color);
    let output_path = determine_output_path(path, options);

    if let Err(e) = compile_to_file(path, &program, options, &output_path) {
        exit_on_compile_error(&e, color);
    }

    if options.verbose {
        eprintln!(
            "  Finished {} in {:.2}s",
            output_path.display(),
            start.elapsed().as_secs_f64()
        );
    }
}

#[cfg(not(feature = "llvm"))]
pub fn build_file(_path: &str, _options: &BuildOptions, _color: ColorMode) {
    super::llvm_unavailable("build");
}
