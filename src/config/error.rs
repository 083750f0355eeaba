//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
///
/// Validation errors surface before any compilation is attempted and always
/// fail the run with a non-zero exit.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error(
        "nothing to render: no [[styles]] entries configured \
         (see the `[[styles]]` reference in README.md)"
    )]
    NothingToRender,

    #[error(
        "[[styles]] entry #{index} is missing the required `file` path \
         (see the `[[styles]]` reference in README.md)"
    )]
    MissingFile { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_display() {
        let err = ConfigError::MissingFile { index: 2 };
        let display = format!("{err}");
        assert!(display.contains("#2"));
        assert!(display.contains("`file`"));
        assert!(display.contains("README.md"));
    }

    #[test]
    fn test_nothing_to_render_display() {
        let display = format!("{}", ConfigError::NothingToRender);
        assert!(display.contains("nothing to render"));
    }
}
