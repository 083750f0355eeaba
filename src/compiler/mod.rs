//! Style-sheet compiler boundary.
//!
//! The pipeline never parses CSS itself; it talks to a [`StyleCompiler`]:
//! source path in, compiled CSS plus metadata out, or a structured
//! diagnostic. The shipped backend is [`LightningCompiler`].

pub mod lightning;
pub use lightning::LightningCompiler;

use std::fmt;
use std::path::{Path, PathBuf};

/// Successful compile result reported by a compiler backend.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub css: String,
    /// Source map JSON, when the backend produced one.
    pub source_map: Option<String>,
    /// Absolute paths of every file the compiler read, entry included.
    /// This is the basis of the watch set.
    pub included_files: Vec<PathBuf>,
    /// Entry label for log lines.
    pub entry: String,
    pub duration_ms: u64,
}

/// A compile failure with a formatted, multi-line diagnostic.
///
/// Carried as a value, never as a panic: during the initial render the
/// orchestrator treats it as fatal, during a watch re-render it is logged
/// and the previous outcome stays live.
#[derive(Debug, Clone)]
pub struct CompileDiagnostic {
    pub message: String,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone)]
pub struct SourceLocation {
    pub file: String,
    /// 1-based line number.
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for CompileDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(loc) = &self.location {
            write!(f, "\n  --> {}:{}:{}", loc.file, loc.line, loc.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileDiagnostic {}

/// A style-sheet compiler backend.
pub trait StyleCompiler: Send + Sync {
    fn compile(&self, entry: &Path) -> Result<CompileOutput, CompileDiagnostic>;
}
