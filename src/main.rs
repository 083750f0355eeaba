//! stilo - stylesheet build pipeline for static sites.

mod cli;
mod compiler;
mod config;
mod host;
mod inject;
mod logger;
mod pipeline;
mod plugin;
mod reload;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;
use logger::Logger;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let (mut config, ignored) = PipelineConfig::load(&cli.config)?;
    if !ignored.is_empty() {
        let logger = Logger::new(false);
        logger.warn(
            "config",
            &format!("unknown fields in {}, ignoring:", cli.config.display()),
        );
        for field in &ignored {
            eprintln!("- {field}");
        }
    }

    match &cli.command {
        Commands::Build { build_args } => {
            config.apply_build_args(build_args);
            cli::build::run(&config)
        }
        Commands::Serve { build_args, port } => {
            config.apply_build_args(build_args);
            if let Some(port) = port {
                config.serve.port = *port;
            }
            cli::serve::run(&config)
        }
    }
}
