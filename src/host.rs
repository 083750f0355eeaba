//! Host-side lifecycle hooks and page emission.
//!
//! The pipeline never patches the site generator's internals. It registers
//! typed callbacks for named lifecycle phases on a [`Lifecycle`] registry,
//! and the emitter fires them while writing the output tree:
//!
//! 1. before-write hooks (output directory resolved, nothing emitted yet)
//! 2. page hooks, once per emitted HTML document
//! 3. finish hooks
//!
//! In serve mode the serve hooks fire once after the initial emission,
//! receiving the reload function.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use jwalk::WalkDir;

use crate::logger::Logger;

/// Fire-and-forget reload signal handed to serve-phase hooks.
pub type ReloadFn = Arc<dyn Fn() + Send + Sync>;

type BeforeWriteHook = Box<dyn Fn(&Path) -> Result<()> + Send + Sync>;
type PageHook = Box<dyn Fn(&str, &Path) -> Result<String> + Send + Sync>;
type ServeHook = Box<dyn Fn(&Path, ReloadFn) -> Result<()> + Send + Sync>;
type FinishHook = Box<dyn Fn(&Path) -> Result<()> + Send + Sync>;

/// Typed lifecycle hook registry.
#[derive(Default)]
pub struct Lifecycle {
    before_write: Vec<BeforeWriteHook>,
    page: Vec<PageHook>,
    serve: Vec<ServeHook>,
    finish: Vec<FinishHook>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_before_write(&mut self, hook: impl Fn(&Path) -> Result<()> + Send + Sync + 'static) {
        self.before_write.push(Box::new(hook));
    }

    /// Register an HTML transform, run once per emitted page. The second
    /// argument is the page path relative to the site directory.
    pub fn on_page(
        &mut self,
        hook: impl Fn(&str, &Path) -> Result<String> + Send + Sync + 'static,
    ) {
        self.page.push(Box::new(hook));
    }

    pub fn on_serve(
        &mut self,
        hook: impl Fn(&Path, ReloadFn) -> Result<()> + Send + Sync + 'static,
    ) {
        self.serve.push(Box::new(hook));
    }

    pub fn on_finish(&mut self, hook: impl Fn(&Path) -> Result<()> + Send + Sync + 'static) {
        self.finish.push(Box::new(hook));
    }

    pub fn fire_before_write(&self, output_dir: &Path) -> Result<()> {
        self.before_write.iter().try_for_each(|hook| hook(output_dir))
    }

    /// Run a page through every registered transform, in order.
    pub fn apply_page_hooks(&self, html: String, page: &Path) -> Result<String> {
        let mut html = html;
        for hook in &self.page {
            html = hook(&html, page)?;
        }
        Ok(html)
    }

    pub fn fire_serve(&self, output_dir: &Path, reload: &ReloadFn) -> Result<()> {
        self.serve
            .iter()
            .try_for_each(|hook| hook(output_dir, Arc::clone(reload)))
    }

    pub fn fire_finish(&self, output_dir: &Path) -> Result<()> {
        self.finish.iter().try_for_each(|hook| hook(output_dir))
    }
}

// ============================================================================
// Site emission
// ============================================================================

/// Copies the site tree into the output directory, passing HTML pages
/// through the registered transforms. Stands in for the host generator's
/// write phase; everything interesting happens in the hooks.
pub struct SiteEmitter {
    site_dir: PathBuf,
    output_dir: PathBuf,
    logger: Logger,
}

impl SiteEmitter {
    pub fn new(site_dir: PathBuf, output_dir: PathBuf, logger: Logger) -> Self {
        Self {
            site_dir,
            output_dir,
            logger,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Emit the whole site: before-write hooks, page emission, finish hooks.
    pub fn emit(&self, lifecycle: &Lifecycle) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("failed to create {}", self.output_dir.display()))?;
        lifecycle.fire_before_write(&self.output_dir)?;
        self.emit_pages(lifecycle)?;
        lifecycle.fire_finish(&self.output_dir)?;
        Ok(())
    }

    /// Copy every file under the site directory, transforming HTML pages.
    /// Re-run on reload so pages pick up fresh stylesheet references.
    pub fn emit_pages(&self, lifecycle: &Lifecycle) -> Result<()> {
        if !self.site_dir.is_dir() {
            self.logger.info(
                "emit",
                &format!("no site directory at {}", self.site_dir.display()),
            );
            return Ok(());
        }

        let mut pages = 0usize;
        for entry in WalkDir::new(&self.site_dir) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let rel = path.strip_prefix(&self.site_dir)?.to_path_buf();
            let target = self.output_dir.join(&rel);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }

            if path.extension().is_some_and(|ext| ext == "html") {
                let html = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let html = lifecycle.apply_page_hooks(html, &rel)?;
                std::fs::write(&target, html)
                    .with_context(|| format!("failed to write {}", target.display()))?;
                pages += 1;
            } else {
                std::fs::copy(&path, &target)
                    .with_context(|| format!("failed to copy {}", path.display()))?;
            }
        }

        self.logger.info("emit", &format!("emitted {pages} pages"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[test]
    fn test_hooks_fire_in_phase_order() {
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join("index.html"), "<html><body></body></html>").unwrap();

        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut lifecycle = Lifecycle::new();

        let log = Arc::clone(&order);
        lifecycle.on_before_write(move |_| {
            log.lock().push("before_write");
            Ok(())
        });
        let log = Arc::clone(&order);
        lifecycle.on_page(move |html, _| {
            log.lock().push("page");
            Ok(html.to_string())
        });
        let log = Arc::clone(&order);
        lifecycle.on_finish(move |_| {
            log.lock().push("finish");
            Ok(())
        });

        let emitter = SiteEmitter::new(site, dir.path().join("_site"), Logger::new(false));
        emitter.emit(&lifecycle).unwrap();

        assert_eq!(*order.lock(), vec!["before_write", "page", "finish"]);
    }

    #[test]
    fn test_emit_transforms_html_and_copies_assets() {
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        fs::create_dir_all(site.join("about")).unwrap();
        fs::write(site.join("index.html"), "MARKER").unwrap();
        fs::write(site.join("about/index.html"), "MARKER").unwrap();
        fs::write(site.join("logo.svg"), "<svg/>").unwrap();

        let mut lifecycle = Lifecycle::new();
        lifecycle.on_page(|html, _| Ok(html.replace("MARKER", "done")));

        let output = dir.path().join("_site");
        let emitter = SiteEmitter::new(site, output.clone(), Logger::new(false));
        emitter.emit(&lifecycle).unwrap();

        assert_eq!(fs::read_to_string(output.join("index.html")).unwrap(), "done");
        assert_eq!(
            fs::read_to_string(output.join("about/index.html")).unwrap(),
            "done"
        );
        assert_eq!(fs::read_to_string(output.join("logo.svg")).unwrap(), "<svg/>");
    }

    #[test]
    fn test_page_hooks_chain_in_order() {
        let lifecycle = {
            let mut lifecycle = Lifecycle::new();
            lifecycle.on_page(|html, _| Ok(format!("{html}a")));
            lifecycle.on_page(|html, _| Ok(format!("{html}b")));
            lifecycle
        };
        let html = lifecycle
            .apply_page_hooks("x".into(), Path::new("index.html"))
            .unwrap();
        assert_eq!(html, "xab");
    }

    #[test]
    fn test_serve_hook_receives_reload() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut lifecycle = Lifecycle::new();
        lifecycle.on_serve(|_, reload| {
            reload();
            Ok(())
        });

        let count = Arc::clone(&fired);
        let reload: ReloadFn = Arc::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
        lifecycle.fire_serve(Path::new("_site"), &reload).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_site_dir_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let emitter = SiteEmitter::new(
            dir.path().join("nope"),
            dir.path().join("_site"),
            Logger::new(false),
        );
        emitter.emit(&Lifecycle::new()).unwrap();
    }
}
