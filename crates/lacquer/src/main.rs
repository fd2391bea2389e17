//! Lacquer CLI - extracts CSS from tagged template literals into stylesheets.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lacquer_core::PluginOptions;
use tracing_subscriber::{fmt, EnvFilter};

mod build;
mod config;
mod files;

use build::BuildOptions;
use config::{load_config, ConfigFile};

#[derive(Parser)]
#[command(name = "lacquer")]
#[command(about = "Extract CSS from css and styled tagged templates")]
#[command(version)]
pub struct Cli {
    /// Files or glob patterns to process
    #[arg(required = true)]
    patterns: Vec<String>,

    /// Generate source maps for stylesheets
    #[arg(short, long)]
    source_maps: bool,

    /// Require the stylesheet from the original source file
    #[arg(short, long)]
    require_css: bool,

    /// Output directory (defaults to config or ".")
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Path to lacquer.toml config file
    #[arg(short, long, default_value = "lacquer.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Prefix class names with the name of the styled declaration
    #[arg(long)]
    display_name: bool,

    /// Do not inline same-file constants into styles
    #[arg(long)]
    no_evaluate: bool,
}

impl Cli {
    /// Merge flags over the config file.
    fn build_options(&self, file_config: ConfigFile) -> BuildOptions {
        BuildOptions {
            out_dir: self.out_dir.clone().unwrap_or(file_config.output.dir),
            source_maps: self.source_maps || file_config.output.source_maps,
            require_css: self.require_css || file_config.output.require_css,
            plugin_options: PluginOptions {
                evaluate: !self.no_evaluate && file_config.transform.evaluate,
                display_name: self.display_name || file_config.transform.display_name,
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let options = cli.build_options(load_config(&cli.config)?);
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    let files = files::resolve_patterns(&cli.patterns, &cwd)?;
    if files.is_empty() {
        tracing::warn!("No input files");
        return Ok(());
    }

    let result = build::run(&files, &options, &cwd)?;

    tracing::info!(
        "Extracted {} stylesheets from {} files in {}ms",
        result.stylesheets.len(),
        result.files,
        result.duration_ms
    );

    Ok(())
}
