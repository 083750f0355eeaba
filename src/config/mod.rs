//! Pipeline configuration management for `stilo.toml`.
//!
//! # Sections
//!
//! | Section       | Purpose                                            |
//! |---------------|----------------------------------------------------|
//! | top level     | `verbose`                                          |
//! | `[build]`     | site/output directories, minification, clean       |
//! | `[serve]`     | development server (port, reload port)             |
//! | `[[styles]]`  | stylesheet jobs (file, out_file, source_map)       |
//! | `[[plugins]]` | post-processing commands applied to rendered CSS   |

mod error;
pub use error::ConfigError;

use crate::cli::BuildArgs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing stilo.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Project root directory - parent of the config file (internal).
    #[serde(skip)]
    pub root: PathBuf,

    /// Enable informational logging.
    #[serde(default)]
    pub verbose: bool,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings.
    #[serde(default)]
    pub serve: ServeConfig,

    /// Stylesheet jobs, rendered in configured order.
    #[serde(default)]
    pub styles: Vec<StyleConfig>,

    /// Post-processing plugins, applied in order to every job's CSS.
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,
}

/// `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory holding the HTML page tree to emit.
    pub site: PathBuf,
    /// Output directory.
    pub output: PathBuf,
    /// Minify rendered CSS.
    pub minify: bool,
    /// Remove the output directory before building.
    pub clean: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            site: PathBuf::from("site"),
            output: PathBuf::from("_site"),
            minify: true,
            clean: false,
        }
    }
}

/// `[serve]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// HTTP port for the dev server.
    pub port: u16,
    /// WebSocket port for live-reload notifications.
    pub ws_port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            ws_port: 35729,
        }
    }
}

/// One `[[styles]]` entry.
///
/// `file` is required; entries without it are rejected during validation,
/// before any compilation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Source path, relative to the project root.
    pub file: Option<PathBuf>,
    /// Output path template, relative to the output directory. Every
    /// `[hash]` occurrence is replaced with the content fingerprint.
    pub out_file: Option<String>,
    /// Source map output: `true` for `<out_file>.map`, or an explicit path.
    #[serde(default)]
    pub source_map: SourceMapSetting,
}

/// `source_map` accepts a boolean toggle or an explicit path template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceMapSetting {
    Toggle(bool),
    Path(String),
}

impl Default for SourceMapSetting {
    fn default() -> Self {
        Self::Toggle(false)
    }
}

/// One `[[plugins]]` entry: an external command that receives CSS on stdin
/// and writes transformed CSS to stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Display name; defaults to the command program.
    pub name: Option<String>,
    #[serde(default)]
    pub command: Vec<String>,
}

// ============================================================================
// loading & validation
// ============================================================================

impl PipelineConfig {
    /// Load configuration from a file path.
    ///
    /// Returns the parsed config plus the list of unknown fields found in
    /// the file, for the caller to warn about.
    pub fn load(path: &Path) -> Result<(Self, Vec<String>), ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        config.root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok((config, ignored))
    }

    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Validate the job list. Runs at setup, before any compilation; a
    /// failure here aborts the run with a non-zero exit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.styles.is_empty() {
            return Err(ConfigError::NothingToRender);
        }
        for (index, style) in self.styles.iter().enumerate() {
            match &style.file {
                Some(path) if !path.as_os_str().is_empty() => {}
                _ => return Err(ConfigError::MissingFile { index: index + 1 }),
            }
        }
        Ok(())
    }

    /// Merge CLI build arguments on top of the file configuration.
    pub fn apply_build_args(&mut self, args: &BuildArgs) {
        self.verbose |= args.verbose;
        self.build.clean |= args.clean;
        if let Some(minify) = args.minify {
            self.build.minify = minify;
        }
    }

    /// Absolute-ish path of the site page tree.
    pub fn site_dir(&self) -> PathBuf {
        self.root.join(&self.build.site)
    }

    /// Absolute-ish path of the output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.build.output)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            verbose: false,
            build: BuildConfig::default(),
            serve: ServeConfig::default(),
            styles: Vec::new(),
            plugins: Vec::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
