//! Serve command: dev server with watch and live reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tiny_http::{Header, Request, Response, StatusCode};

use crate::config::PipelineConfig;
use crate::host::ReloadFn;
use crate::logger::Logger;
use crate::reload::ReloadServer;
use crate::utils::mime;

/// Start the development server.
///
/// The initial build runs first and a failure there is fatal — there is
/// no valid output to serve. After that, watchers re-render on change and
/// the reload function re-emits pages and notifies connected browsers.
pub fn run(config: &PipelineConfig) -> Result<()> {
    let logger = Logger::new(config.verbose);

    let (_pipeline, lifecycle, emitter) = super::build::setup(config, true)?;
    emitter.emit(&lifecycle)?;

    let lifecycle = Arc::new(lifecycle);
    let emitter = Arc::new(emitter);
    let reload_server = ReloadServer::start(config.serve.ws_port, logger)?;

    let reload: ReloadFn = {
        let lifecycle = Arc::clone(&lifecycle);
        let emitter = Arc::clone(&emitter);
        let reload_server = reload_server.clone();
        Arc::new(move || {
            // Re-emit pages so they reference the fresh fingerprinted
            // output, then tell the browsers.
            if let Err(err) = emitter.emit_pages(&lifecycle) {
                logger.error("serve", &format!("{err:#}"));
                return;
            }
            reload_server.broadcast();
        })
    };
    lifecycle.fire_serve(emitter.output_dir(), &reload)?;

    serve_http(config, emitter.output_dir(), &reload_server, logger)
}

/// Blocking HTTP loop over the output directory.
fn serve_http(
    config: &PipelineConfig,
    output_dir: &Path,
    reload_server: &ReloadServer,
    logger: Logger,
) -> Result<()> {
    let addr = format!("127.0.0.1:{}", config.serve.port);
    let server =
        tiny_http::Server::http(&addr).map_err(|err| anyhow!("failed to bind {addr}: {err}"))?;

    logger.status("serve", &format!("serving {} at http://{addr}", output_dir.display()));

    let client_script = reload_server.client_script();
    for request in server.incoming_requests() {
        if let Err(err) = respond(request, output_dir, &client_script) {
            logger.warn("serve", &format!("{err:#}"));
        }
    }
    Ok(())
}

fn respond(request: Request, output_dir: &Path, client_script: &str) -> Result<()> {
    let mut path = output_dir.join(sanitize(request.url()));
    if path.is_dir() {
        path = path.join("index.html");
    }

    if !path.is_file() {
        let response = Response::from_string("404 Not Found")
            .with_status_code(StatusCode(404))
            .with_header(make_header("Content-Type", mime::types::PLAIN));
        request.respond(response)?;
        return Ok(());
    }

    let content_type = mime::from_path(&path);
    let mut body = std::fs::read(&path)?;
    if content_type == mime::types::HTML {
        body = inject_reload_script(body, client_script);
    }

    let response = Response::from_data(body).with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

/// Resolve a request URL to a relative path, discarding query/fragment and
/// refusing to climb out of the output directory.
fn sanitize(url: &str) -> PathBuf {
    let path = url.split(['?', '#']).next().unwrap_or_default();

    let mut clean = PathBuf::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                clean.pop();
            }
            part => clean.push(part),
        }
    }
    clean
}

/// Splice the reload client before `</body>`, or append when absent.
fn inject_reload_script(body: Vec<u8>, script: &str) -> Vec<u8> {
    let html = match String::from_utf8(body) {
        Ok(html) => html,
        Err(err) => return err.into_bytes(),
    };
    let html = if html.contains("</body>") {
        html.replace("</body>", &format!("{script}</body>"))
    } else {
        format!("{html}{script}")
    };
    html.into_bytes()
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_paths() {
        assert_eq!(sanitize("/"), PathBuf::new());
        assert_eq!(sanitize("/index.html"), PathBuf::from("index.html"));
        assert_eq!(sanitize("/css/main.css"), PathBuf::from("css/main.css"));
    }

    #[test]
    fn test_sanitize_strips_query_and_fragment() {
        assert_eq!(sanitize("/main.css?v=123"), PathBuf::from("main.css"));
        assert_eq!(sanitize("/page.html#anchor"), PathBuf::from("page.html"));
    }

    #[test]
    fn test_sanitize_refuses_traversal() {
        assert_eq!(sanitize("/../../etc/passwd"), PathBuf::from("etc/passwd"));
        assert_eq!(sanitize("/a/../../b"), PathBuf::from("b"));
    }

    #[test]
    fn test_inject_reload_script_before_body_close() {
        let html = b"<html><body><p>hi</p></body></html>".to_vec();
        let out = inject_reload_script(html, "<script>x</script>");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<html><body><p>hi</p><script>x</script></body></html>"
        );
    }

    #[test]
    fn test_inject_reload_script_appends_without_body() {
        let out = inject_reload_script(b"<p>bare</p>".to_vec(), "<script>x</script>");
        assert!(String::from_utf8(out).unwrap().ends_with("<script>x</script>"));
    }
}
