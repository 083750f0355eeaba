//! Render outcomes.

use std::path::{Path, PathBuf};

/// The result of rendering one job. Replaced wholesale after each
/// successful render — never merged field by field.
#[derive(Debug, Clone, Default)]
pub struct RenderOutcome {
    pub css: String,
    pub source_map: Option<String>,
    /// Output path relative to the output directory, fingerprint resolved.
    /// `None` for jobs without `out_file` (inline-injection jobs).
    pub out_file: Option<PathBuf>,
    /// Absolute paths of every file the compiler read.
    pub included_files: Vec<PathBuf>,
    pub duration_ms: u64,
    /// Entry label reported by the compiler.
    pub entry: String,
}

impl RenderOutcome {
    /// Placeholder registered at setup so registry lookups never miss.
    pub fn placeholder(entry: &str) -> Self {
        Self {
            entry: entry.to_string(),
            ..Self::default()
        }
    }

    /// A placeholder has never been produced by a successful render.
    pub fn is_placeholder(&self) -> bool {
        self.css.is_empty() && self.included_files.is_empty()
    }

    /// Site-absolute URL of the written output file.
    pub fn href(&self) -> Option<String> {
        self.out_file.as_ref().map(|path| format!("/{}", to_url(path)))
    }
}

/// Join path components with `/` regardless of platform separators.
fn to_url(path: &Path) -> String {
    path.iter()
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_roundtrip() {
        let outcome = RenderOutcome::placeholder("styles/main.css");
        assert!(outcome.is_placeholder());
        assert_eq!(outcome.entry, "styles/main.css");
        assert!(outcome.href().is_none());
    }

    #[test]
    fn test_href_is_site_absolute() {
        let outcome = RenderOutcome {
            out_file: Some(PathBuf::from("css").join("main.a1b2c3d4.css")),
            css: "body{}".into(),
            ..RenderOutcome::default()
        };
        assert_eq!(outcome.href().as_deref(), Some("/css/main.a1b2c3d4.css"));
    }
}
