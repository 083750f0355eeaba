//! Build command: render all stylesheets and emit the site once.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::compiler::LightningCompiler;
use crate::config::PipelineConfig;
use crate::host::{Lifecycle, SiteEmitter};
use crate::logger::Logger;
use crate::pipeline::Pipeline;

/// Shared setup for build and serve: pipeline construction (validation
/// happens here, before any compile), lifecycle binding, emitter.
pub fn setup(
    config: &PipelineConfig,
    serve_mode: bool,
) -> Result<(Arc<Pipeline>, Lifecycle, SiteEmitter)> {
    let logger = Logger::new(config.verbose);
    let compiler = Arc::new(LightningCompiler::new(config.build.minify));
    let pipeline = Arc::new(Pipeline::from_config(config, compiler, logger)?);

    if config.build.clean {
        let output_dir = config.output_dir();
        if output_dir.is_dir() {
            std::fs::remove_dir_all(&output_dir)
                .with_context(|| format!("failed to clean {}", output_dir.display()))?;
        }
    }

    let mut lifecycle = Lifecycle::new();
    pipeline.register(&mut lifecycle, serve_mode);

    let emitter = SiteEmitter::new(config.site_dir(), config.output_dir(), logger);
    Ok((pipeline, lifecycle, emitter))
}

/// One-off build. A configuration or first-render failure propagates out
/// and the process exits non-zero.
pub fn run(config: &PipelineConfig) -> Result<()> {
    let (_pipeline, lifecycle, emitter) = setup(config, false)?;
    emitter.emit(&lifecycle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_from(root: &Path, toml: &str) -> PipelineConfig {
        let mut config = PipelineConfig::parse_with_ignored(toml).unwrap().0;
        config.root = root.to_path_buf();
        config
    }

    #[test]
    fn test_build_writes_css_and_rewrites_pages() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("site")).unwrap();
        fs::write(dir.path().join("style.css"), "body { color: red; }").unwrap();
        fs::write(
            dir.path().join("site/index.html"),
            r#"<html><head><link rel="stylesheet" href="style.css"></head><body></body></html>"#,
        )
        .unwrap();

        let config = config_from(
            dir.path(),
            r#"
            [[styles]]
            file = "style.css"
            out_file = "style.[hash].css"
            "#,
        );
        run(&config).unwrap();

        let output_dir = dir.path().join("_site");
        let page = fs::read_to_string(output_dir.join("index.html")).unwrap();
        assert!(!page.contains(r#"href="style.css""#));

        // The page points at the fingerprinted file that was written.
        let css_name = fs::read_dir(&output_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .find(|name| name.starts_with("style.") && name.ends_with(".css"))
            .unwrap();
        assert!(page.contains(&format!("href=\"/{css_name}\"")));
        assert_eq!(
            fs::read_to_string(output_dir.join(css_name)).unwrap(),
            "body{color:red}"
        );
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("style.css"), "body { color: red; }").unwrap();

        let config = config_from(
            dir.path(),
            r#"
            [[styles]]
            file = "style.css"
            out_file = "style.[hash].css"
            "#,
        );
        run(&config).unwrap();
        let first: Vec<_> = list_files(&dir.path().join("_site"));
        run(&config).unwrap();
        let second: Vec<_> = list_files(&dir.path().join("_site"));

        // Same file set, same bytes.
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_file_fails_before_output() {
        let dir = TempDir::new().unwrap();
        let config = config_from(
            dir.path(),
            r#"
            [[styles]]
            out_file = "style.css"
            "#,
        );
        let err = run(&config).unwrap_err();
        assert!(err.to_string().contains("missing the required `file`"));
        assert!(!dir.path().join("_site").exists());
    }

    #[test]
    fn test_plugin_failure_does_not_fail_the_build() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("style.css"), "body { color: red; }").unwrap();

        let config = config_from(
            dir.path(),
            r#"
            [[styles]]
            file = "style.css"
            out_file = "style.css"

            [[plugins]]
            name = "broken"
            command = ["sh", "-c", "exit 1"]
            "#,
        );
        run(&config).unwrap();

        // Output equals the compiler's un-transformed result.
        assert_eq!(
            fs::read_to_string(dir.path().join("_site/style.css")).unwrap(),
            "body{color:red}"
        );
    }

    #[test]
    fn test_clean_removes_stale_output() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("style.css"), "body { color: red; }").unwrap();
        fs::create_dir_all(dir.path().join("_site")).unwrap();
        fs::write(dir.path().join("_site/stale.txt"), "old").unwrap();

        let mut config = config_from(
            dir.path(),
            r#"
            [[styles]]
            file = "style.css"
            out_file = "style.css"
            "#,
        );
        config.build.clean = true;
        run(&config).unwrap();

        assert!(!dir.path().join("_site/stale.txt").exists());
        assert!(dir.path().join("_site/style.css").is_file());
    }

    fn list_files(dir: &Path) -> Vec<(String, Vec<u8>)> {
        let mut files: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| {
                (
                    e.file_name().to_string_lossy().into_owned(),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect();
        files.sort();
        files
    }
}
