//! The render unit: compile, post-process, fingerprint, write.

use std::path::Path;

use anyhow::Context;
use thiserror::Error;

use crate::compiler::{CompileDiagnostic, StyleCompiler};
use crate::logger::Logger;
use crate::plugin::PostPlugin;
use crate::utils::fingerprint::fingerprint;

use super::{RenderJob, RenderOutcome};

/// A failed render. Compile failures carry the compiler's formatted
/// diagnostic; `Write` covers filesystem failures, which abort the current
/// render call with path and job context attached.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0}")]
    Compile(CompileDiagnostic),
    #[error(transparent)]
    Write(#[from] anyhow::Error),
}

/// Compile one job and write its outputs under `output_dir`.
///
/// Post plugins run in order on the compiled CSS; a failing plugin is
/// logged and forfeits only its own effect. The content fingerprint is
/// computed from the final (post-plugin) CSS, so a plugin that changes the
/// output also changes a `[hash]`-templated path.
pub fn render(
    job: &RenderJob,
    root: &Path,
    output_dir: &Path,
    compiler: &dyn StyleCompiler,
    plugins: &[Box<dyn PostPlugin>],
    logger: &Logger,
) -> Result<RenderOutcome, RenderError> {
    let entry = root.join(&job.source);
    let output = compiler.compile(&entry).map_err(RenderError::Compile)?;

    let mut css = output.css;
    for plugin in plugins {
        match plugin.apply(&css) {
            Ok(next) => css = next,
            Err(err) => {
                logger.error("plugin", &format!("error in `{}`: {err:#}", plugin.name()));
            }
        }
    }

    let hash = fingerprint(&css);
    let out_file = job.resolved_out_file(&hash);
    let map_file = job.resolved_map_file(&hash);

    if let Some(rel) = &out_file {
        write_output(output_dir, rel, css.as_bytes(), &job.id)?;
        logger.info("render", &format!("wrote {}", rel.display()));
    }
    if let (Some(rel), Some(map)) = (&map_file, &output.source_map) {
        write_output(output_dir, rel, map.as_bytes(), &job.id)?;
        logger.info("render", &format!("wrote {}", rel.display()));
    }

    logger.info(
        "render",
        &format!("rendered {} [{}ms]", output.entry, output.duration_ms),
    );

    Ok(RenderOutcome {
        css,
        source_map: output.source_map,
        out_file,
        included_files: output.included_files,
        duration_ms: output.duration_ms,
        entry: output.entry,
    })
}

fn write_output(
    output_dir: &Path,
    rel: &Path,
    bytes: &[u8],
    job: &str,
) -> Result<(), RenderError> {
    let path = output_dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {} for job `{job}`", parent.display()))?;
    }
    std::fs::write(&path, bytes)
        .with_context(|| format!("failed to write {} for job `{job}`", path.display()))?;
    Ok(())
}
