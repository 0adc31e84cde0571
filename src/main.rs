//! pagesmith - scaffold, build and serve Handlebars/SCSS/JS sites.

mod actor;
mod asset;
mod cli;
mod compiler;
mod config;
mod core;
mod embed;
mod logger;
mod reload;
mod scaffold;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SiteConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = SiteConfig::load(&cli)?;

    match &cli.command {
        Commands::Generate { args } => cli::generate::generate_page(args, &config),
        Commands::Build { args } => cli::build::build(args, &config),
    }
}
