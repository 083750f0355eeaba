//! HTML post-processing: rewrite stylesheet references to rendered output.
//!
//! Runs once per emitted page, after the outcomes it reads are current.
//! Two rewrites, both keyed by the identifiers a job is addressable by
//! (its configured source path or its output template):
//!
//! - `<link rel="stylesheet" href="styles/main.css">` gets its `href`
//!   pointed at the fingerprinted output file;
//! - `<style data-style-src="styles/main.css"></style>` gets the rendered
//!   CSS inlined and the marker attribute removed.
//!
//! Both passes are idempotent: once rewritten, the markers are gone (or
//! rewrite to the identical value), so running the pass twice equals
//! running it once.

use std::sync::Arc;

use anyhow::Result;
use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str};

use crate::pipeline::{RegistrySnapshot, RenderJob, RenderOutcome};

/// Marker attribute for inline style injection.
const STYLE_SRC_ATTR: &str = "data-style-src";

pub struct Injector {
    entries: Vec<Entry>,
}

struct Entry {
    /// Identifiers this job is addressable by in authored HTML.
    ids: Vec<String>,
    outcome: Arc<RenderOutcome>,
}

impl Injector {
    /// Build an injector over a registry snapshot.
    pub fn new(jobs: &[RenderJob], snapshot: &RegistrySnapshot) -> Self {
        let entries = jobs
            .iter()
            .filter_map(|job| {
                let outcome = Arc::clone(snapshot.get(&job.id)?);
                let mut ids = vec![job.id.clone()];
                if let Some(template) = &job.out_file
                    && !ids.contains(template)
                {
                    ids.push(template.clone());
                }
                Some(Entry { ids, outcome })
            })
            .collect();
        Self { entries }
    }

    fn lookup(&self, reference: &str) -> Option<&Entry> {
        let wanted = normalize(reference);
        self.entries
            .iter()
            .find(|entry| entry.ids.iter().any(|id| normalize(id) == wanted))
    }

    /// Rewrite one HTML document.
    pub fn rewrite(&self, html: &str) -> Result<String> {
        let rewritten = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!("link[rel='stylesheet']", |el| {
                        if let Some(href) = el.get_attribute("href")
                            && let Some(entry) = self.lookup(&href)
                            && let Some(target) = entry.outcome.href()
                        {
                            el.set_attribute("href", &target)?;
                        }
                        Ok(())
                    }),
                    element!(format!("style[{STYLE_SRC_ATTR}]"), |el| {
                        if let Some(id) = el.get_attribute(STYLE_SRC_ATTR)
                            && let Some(entry) = self.lookup(&id)
                        {
                            // Raw insertion: entity-escaping would corrupt
                            // CSS selectors like `a > b`.
                            el.set_inner_content(&entry.outcome.css, ContentType::Html);
                            el.remove_attribute(STYLE_SRC_ATTR);
                        }
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::default()
            },
        )?;
        Ok(rewritten)
    }
}

/// Strip leading `./` and `/` so authored references match configured
/// source paths regardless of how pages spell them.
fn normalize(reference: &str) -> &str {
    reference
        .trim_start_matches("./")
        .trim_start_matches('/')
}
