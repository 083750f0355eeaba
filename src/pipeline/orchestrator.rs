//! Pipeline orchestration.
//!
//! Phases of a build/serve session:
//!
//! - **setup** — validate the job list (fails fast, before any compile),
//!   seed registry placeholders, resolve plugin commands;
//! - **initial render** — every job once, sequentially, in configured
//!   order; the first failure is fatal;
//! - **serving** — one dependency watcher per successfully rendered job;
//!   a settled change re-renders that job only, replaces its registry
//!   entry and fires the host's reload function. A failed re-render is
//!   logged and leaves the previous outcome live.
//!
//! Teardown is implicit: watchers hold no cross-process resources.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::compiler::StyleCompiler;
use crate::config::{ConfigError, PipelineConfig};
use crate::host::{Lifecycle, ReloadFn};
use crate::inject::Injector;
use crate::logger::Logger;
use crate::plugin::{CommandPlugin, PostPlugin};
use crate::watch::{self, WatchHandle};

use super::{RenderError, RenderJob, ResultRegistry, render};

pub struct Pipeline {
    jobs: Vec<RenderJob>,
    registry: ResultRegistry,
    compiler: Arc<dyn StyleCompiler>,
    plugins: Arc<Vec<Box<dyn PostPlugin>>>,
    root: PathBuf,
    logger: Logger,
}

impl Pipeline {
    /// Validate the configuration and set up jobs and registry
    /// placeholders. Fails before any compilation is attempted.
    pub fn from_config(
        config: &PipelineConfig,
        compiler: Arc<dyn StyleCompiler>,
        logger: Logger,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut jobs = Vec::with_capacity(config.styles.len());
        for (index, style) in config.styles.iter().enumerate() {
            jobs.push(RenderJob::from_config(index + 1, style)?);
        }

        let registry = ResultRegistry::new();
        for job in &jobs {
            registry.seed(&job.id);
        }

        let plugins: Vec<Box<dyn PostPlugin>> = config
            .plugins
            .iter()
            .map(|entry| {
                let plugin = CommandPlugin::from_config(entry);
                if plugin.resolve().is_none() {
                    logger.warn(
                        "plugin",
                        &format!("command for `{}` not found in PATH", plugin.name()),
                    );
                }
                Box::new(plugin) as Box<dyn PostPlugin>
            })
            .collect();

        Ok(Self {
            jobs,
            registry,
            compiler,
            plugins: Arc::new(plugins),
            root: config.root.clone(),
            logger,
        })
    }

    pub fn registry(&self) -> &ResultRegistry {
        &self.registry
    }

    pub fn jobs(&self) -> &[RenderJob] {
        &self.jobs
    }

    /// Render every job once, sequentially, in configured order. Later
    /// jobs may rely on earlier jobs' written files, so there is no
    /// parallelism here. The first failure aborts the phase.
    pub fn initial_render(&self, output_dir: &Path) -> Result<()> {
        for job in &self.jobs {
            match render(
                job,
                &self.root,
                output_dir,
                self.compiler.as_ref(),
                &self.plugins,
                &self.logger,
            ) {
                Ok(outcome) => self.registry.set(&job.id, outcome),
                Err(err) => {
                    log_render_error(&self.logger, &err);
                    anyhow::bail!("initial render of `{}` failed", job.id);
                }
            }
        }
        Ok(())
    }

    /// Injector over the current registry state.
    pub fn injector(&self) -> Injector {
        Injector::new(&self.jobs, &self.registry.snapshot())
    }

    /// Spawn one watcher per successfully rendered job. Jobs whose first
    /// render never succeeded have no dependency graph and stay unwatched.
    pub fn start_watching(&self, output_dir: &Path, reload: &ReloadFn) -> Result<Vec<WatchHandle>> {
        let mut handles = Vec::with_capacity(self.jobs.len());

        for job in &self.jobs {
            let Some(outcome) = self.registry.get(&job.id) else {
                continue;
            };
            if outcome.is_placeholder() {
                continue;
            }

            let mut watched = watch_set(&self.root, job, &outcome.included_files);
            self.logger.info(
                "watch",
                &format!("watching {} files for {}", watched.len(), job.id),
            );

            let job = job.clone();
            let registry = self.registry.clone();
            let compiler = Arc::clone(&self.compiler);
            let plugins = Arc::clone(&self.plugins);
            let logger = self.logger;
            let root = self.root.clone();
            let output_dir = output_dir.to_path_buf();
            let reload = Arc::clone(reload);

            let handle = watch::spawn(watched.clone(), logger, move || {
                match render(&job, &root, &output_dir, compiler.as_ref(), &plugins, &logger) {
                    Ok(outcome) => {
                        let next = watch_set(&root, &job, &outcome.included_files);
                        registry.set(&job.id, outcome);
                        reload();
                        if next != watched {
                            watched = next.clone();
                            Some(next)
                        } else {
                            None
                        }
                    }
                    Err(err) => {
                        // Previous outcome stays live; watch set unchanged.
                        log_render_error(&logger, &err);
                        None
                    }
                }
            })?;
            handles.push(handle);
        }

        Ok(handles)
    }

    /// Bind the pipeline to the host lifecycle.
    pub fn register(self: &Arc<Self>, lifecycle: &mut Lifecycle, serve_mode: bool) {
        let pipeline = Arc::clone(self);
        lifecycle.on_before_write(move |output_dir| pipeline.initial_render(output_dir));

        // The injector is rebuilt per page from a fresh snapshot, so
        // re-emissions during serving pick up the latest outcomes.
        let pipeline = Arc::clone(self);
        lifecycle.on_page(move |html, _page| pipeline.injector().rewrite(html));

        if serve_mode {
            let pipeline = Arc::clone(self);
            lifecycle.on_serve(move |output_dir, reload| {
                // Handles are dropped deliberately: the watcher threads own
                // their watchers and run until the process exits.
                pipeline.start_watching(output_dir, &reload).map(drop)
            });
        }

        let pipeline = Arc::clone(self);
        lifecycle.on_finish(move |_output_dir| {
            pipeline.logger.info(
                "build",
                &format!("{} stylesheets rendered", pipeline.jobs.len()),
            );
            Ok(())
        });
    }
}

/// Watch set: entry path plus the compiler-reported includes, deduped and
/// in stable order.
fn watch_set(root: &Path, job: &RenderJob, includes: &[PathBuf]) -> Vec<PathBuf> {
    let entry = root.join(&job.source);
    let entry = std::fs::canonicalize(&entry).unwrap_or(entry);

    let mut paths = vec![entry];
    for path in includes {
        if !paths.contains(path) {
            paths.push(path.clone());
        }
    }
    paths
}

fn log_render_error(logger: &Logger, err: &RenderError) {
    match err {
        RenderError::Compile(diag) => logger.error("render", &diag.to_string()),
        RenderError::Write(err) => logger.error("render", &format!("{err:#}")),
    }
}
