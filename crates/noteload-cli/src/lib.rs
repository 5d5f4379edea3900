//! noteload CLI library
//!
//! Argument parsing, logging setup and the composition of one run. The
//! binary in `main.rs` only maps the outcome to an exit code.

pub mod cli;
pub mod factories;

use anyhow::{Context, Result};
use cli::Cli;
use noteload_config::LoaderConfig;
use noteload_pipeline::{LoadContext, LoadSummary, NoteLoadPipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber; `RUST_LOG` wins over the flags
pub fn init_logging(cli: &Cli) {
    let filter = EnvFilter::builder()
        .with_default_directive(cli.level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Execute one note load
pub async fn run(cli: &Cli) -> Result<LoadSummary> {
    let config = LoaderConfig::load(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;
    std::fs::create_dir_all(&config.output_directory).with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            config.output_directory.display()
        )
    })?;

    let ctx = LoadContext::new(cli.run_args(), config)?;
    info!(profile = %ctx.config.profile, tail = %ctx.tail, "Run context ready");

    let password = factories::resolve_password(&ctx)?;
    let collaborators = factories::create_collaborators(&ctx, password)?;
    let pipeline = NoteLoadPipeline::new(collaborators.catalog, collaborators.loader);

    pipeline
        .run(&ctx)
        .await
        .with_context(|| format!("Failed to load '{}'", ctx.args.input_file.display()))
}
