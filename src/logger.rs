//! Logging capability with colored module prefixes.
//!
//! A `Logger` is constructed once from the configuration and handed to each
//! component at construction time; there is no process-global logging state.
//! `verbose` gates informational output only — status banners, warnings and
//! errors always print.

use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy)]
pub struct Logger {
    verbose: bool,
}

impl Logger {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Informational message, shown only in verbose mode.
    pub fn info(&self, module: &str, message: &str) {
        if self.verbose {
            println!("{} {message}", prefix(module));
        }
    }

    /// Status message, always shown (serve banners, build summaries).
    pub fn status(&self, module: &str, message: &str) {
        println!("{} {message}", prefix(module));
    }

    /// Warning, always shown.
    pub fn warn(&self, module: &str, message: &str) {
        eprintln!("{} {message}", format!("[{module}]").bright_yellow().bold());
    }

    /// Error diagnostic, always shown. Multi-line diagnostics are printed
    /// verbatim, line by line, each under the module prefix.
    pub fn error(&self, module: &str, message: &str) {
        let prefix = format!("[{module}]").bright_red().bold().to_string();
        if message.is_empty() {
            eprintln!("{prefix}");
            return;
        }
        for line in message.lines() {
            eprintln!("{prefix} {line}");
        }
    }
}

/// Apply color to a module prefix based on module type.
fn prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module {
        "serve" => prefix.bright_blue().bold().to_string(),
        "watch" => prefix.bright_green().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}
