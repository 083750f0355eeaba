//! lightningcss-backed compiler.
//!
//! Compilation goes through the bundler, which inlines `@import` targets
//! and records every source file it reads — that list feeds dependency
//! watching. Printing produces a source map alongside the CSS.

use std::path::{Path, PathBuf};
use std::time::Instant;

use lightningcss::bundler::{Bundler, FileProvider};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions};
use parcel_sourcemap::SourceMap;

use super::{CompileDiagnostic, CompileOutput, SourceLocation, StyleCompiler};

#[derive(Debug, Clone, Copy, Default)]
pub struct LightningCompiler {
    minify: bool,
}

impl LightningCompiler {
    pub const fn new(minify: bool) -> Self {
        Self { minify }
    }
}

impl StyleCompiler for LightningCompiler {
    fn compile(&self, entry: &Path) -> Result<CompileOutput, CompileDiagnostic> {
        let started = Instant::now();

        let fs = FileProvider::new();
        let mut bundler = Bundler::new(&fs, None, ParserOptions::default());
        let mut stylesheet = bundler.bundle(entry).map_err(to_diagnostic)?;

        // Collected before minification: the source list is fixed at parse
        // time, and minification may error out.
        let included_files: Vec<PathBuf> = stylesheet
            .sources
            .iter()
            .map(|source| absolute(Path::new(source)))
            .collect();

        if self.minify {
            stylesheet
                .minify(MinifyOptions::default())
                .map_err(to_diagnostic)?;
        }

        let mut map = SourceMap::new("/");
        let printed = stylesheet
            .to_css(PrinterOptions {
                minify: self.minify,
                source_map: Some(&mut map),
                ..PrinterOptions::default()
            })
            .map_err(to_diagnostic)?;

        let source_map = map.to_json(None).ok();

        Ok(CompileOutput {
            css: printed.code,
            source_map,
            included_files,
            entry: entry.display().to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Convert a lightningcss error (borrowing from the file provider) into an
/// owned diagnostic. Line numbers are reported 0-based and shifted here.
fn to_diagnostic<T: std::fmt::Display>(err: lightningcss::error::Error<T>) -> CompileDiagnostic {
    CompileDiagnostic {
        message: err.kind.to_string(),
        location: err.loc.map(|loc| SourceLocation {
            file: loc.filename,
            line: loc.line + 1,
            column: loc.column,
        }),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_compile_minified() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("style.css");
        fs::write(&entry, "body { color: red; }").unwrap();

        let output = LightningCompiler::new(true).compile(&entry).unwrap();
        assert_eq!(output.css, "body{color:red}");
        assert_eq!(output.included_files.len(), 1);
        assert!(output.source_map.is_some());
    }

    #[test]
    fn test_compile_reports_imported_files() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("main.css");
        let partial = dir.path().join("colors.css");
        fs::write(&partial, ":root { --accent: teal; }").unwrap();
        fs::write(&entry, "@import \"colors.css\";\nbody { color: var(--accent); }").unwrap();

        let output = LightningCompiler::new(false).compile(&entry).unwrap();
        assert_eq!(output.included_files.len(), 2);
        let partial_abs = fs::canonicalize(&partial).unwrap();
        assert!(output.included_files.contains(&partial_abs));
        assert!(output.css.contains("--accent"));
    }

    #[test]
    fn test_compile_failure_is_diagnostic() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("broken.css");
        fs::write(&entry, "body { color: }").unwrap();

        let err = LightningCompiler::new(true).compile(&entry).unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_missing_entry_is_diagnostic() {
        let dir = TempDir::new().unwrap();
        let err = LightningCompiler::new(true)
            .compile(&dir.path().join("absent.css"))
            .unwrap_err();
        assert!(!err.message.is_empty());
    }
}
