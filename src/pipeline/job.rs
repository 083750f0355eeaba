//! Render job definition and output-path resolution.

use std::path::PathBuf;

use crate::config::{ConfigError, SourceMapSetting, StyleConfig};

/// Placeholder substituted with the content fingerprint in output names.
const HASH_TOKEN: &str = "[hash]";

/// One configured source-to-output compilation unit. Immutable for the
/// lifetime of a build/serve session.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Registry key: the source path as written in the config.
    pub id: String,
    /// Source path, relative to the project root.
    pub source: PathBuf,
    /// Output path template, may contain `[hash]`.
    pub out_file: Option<String>,
    /// Source-map path template, normalized from the config setting.
    pub source_map: Option<String>,
}

impl RenderJob {
    /// Build a job from a config entry.
    ///
    /// `index` is 1-based for error reporting. Fails when the entry omits
    /// the required `file` path — before any compilation is attempted.
    pub fn from_config(index: usize, style: &StyleConfig) -> Result<Self, ConfigError> {
        let source = match &style.file {
            Some(path) if !path.as_os_str().is_empty() => path.clone(),
            _ => return Err(ConfigError::MissingFile { index }),
        };

        let out_file = style.out_file.clone();
        let source_map = match &style.source_map {
            SourceMapSetting::Toggle(false) => None,
            SourceMapSetting::Toggle(true) => out_file.as_ref().map(|f| format!("{f}.map")),
            SourceMapSetting::Path(path) => Some(path.clone()),
        };

        Ok(Self {
            id: source.to_string_lossy().into_owned(),
            source,
            out_file,
            source_map,
        })
    }

    /// Output path with the content fingerprint substituted. Templates
    /// without `[hash]` resolve to the same path on every rebuild.
    pub fn resolved_out_file(&self, fingerprint: &str) -> Option<PathBuf> {
        self.out_file
            .as_ref()
            .map(|template| PathBuf::from(template.replace(HASH_TOKEN, fingerprint)))
    }

    /// Source-map path with the content fingerprint substituted.
    pub fn resolved_map_file(&self, fingerprint: &str) -> Option<PathBuf> {
        self.source_map
            .as_ref()
            .map(|template| PathBuf::from(template.replace(HASH_TOKEN, fingerprint)))
    }
}
