//! Post-processing CSS transforms.
//!
//! Plugins run in configured order after compilation, each one isolated:
//! a failing plugin forfeits only its own effect — the CSS from before it
//! carries into the next plugin, and the render still succeeds.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::PluginConfig;
use crate::utils::exec::Cmd;

/// A CSS-to-CSS transform applied after compilation.
pub trait PostPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, css: &str) -> Result<String>;
}

/// Plugin backed by an external command: CSS on stdin, CSS on stdout.
pub struct CommandPlugin {
    name: String,
    command: Vec<String>,
}

impl CommandPlugin {
    pub fn from_config(config: &PluginConfig) -> Self {
        let name = config
            .name
            .clone()
            .or_else(|| config.command.first().cloned())
            .unwrap_or_else(|| "plugin".into());
        Self {
            name,
            command: config.command.clone(),
        }
    }

    /// Resolve the plugin's program in PATH, for a setup-time sanity check.
    pub fn resolve(&self) -> Option<PathBuf> {
        self.command.first().and_then(|p| which::which(p).ok())
    }
}

impl PostPlugin for CommandPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, css: &str) -> Result<String> {
        let output = Cmd::from_slice(&self.command).stdin(css).run()?;
        String::from_utf8(output.stdout).context("plugin produced non-UTF-8 output")
    }
}
