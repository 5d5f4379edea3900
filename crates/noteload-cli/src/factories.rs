//! Composition root
//!
//! Concrete collaborators are assembled here and handed to the pipeline as
//! trait objects.

use anyhow::{Context, Result};
use noteload_config::{LoaderBackend, Password, PasswordFile};
use noteload_core::{BulkLoader, Catalog};
use noteload_pipeline::{CommandBulkLoader, CommandTarget, LoadContext};
use noteload_sqlite::{SqliteBulkLoader, SqliteCatalog, SqliteConfig, SqlitePool};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Catalog and loader of one run
pub struct Collaborators {
    /// Lookup side
    pub catalog: Arc<dyn Catalog>,
    /// Persistence side
    pub loader: Arc<dyn BulkLoader>,
}

/// Build the collaborators the configuration asks for
///
/// The catalog is always the SQLite store: `loader.path` when configured,
/// otherwise the `--database` argument. The command backend only replaces
/// the loader.
pub fn create_collaborators(ctx: &LoadContext, password: Password) -> Result<Collaborators> {
    let config = &ctx.config;
    let note_table = config.tables.note.as_str();

    let db_path = match &config.loader {
        LoaderBackend::Sqlite { path: Some(path) } => path.clone(),
        _ => PathBuf::from(&ctx.args.database),
    };
    debug!(path = %db_path.display(), "Opening catalog");
    let pool = SqlitePool::new(SqliteConfig::new(&db_path))
        .with_context(|| format!("Failed to open database '{}'", db_path.display()))?;
    let catalog = SqliteCatalog::new(pool.clone(), note_table)?;

    let loader: Arc<dyn BulkLoader> = match &config.loader {
        LoaderBackend::Sqlite { .. } => Arc::new(SqliteBulkLoader::new(
            pool,
            note_table,
            config.format.clone(),
        )?),
        LoaderBackend::Command {
            bulk_command,
            script_command,
        } => Arc::new(CommandBulkLoader::new(
            bulk_command.clone(),
            script_command.clone(),
            CommandTarget {
                server: ctx.args.server.clone(),
                database: ctx.args.database.clone(),
                user: ctx.args.user.clone(),
                password: Some(password),
                format: config.format.clone(),
                note_table: note_table.to_string(),
                work_dir: config.output_directory.clone(),
            },
        )),
    };
    debug!(loader = loader.name(), "Collaborators ready");

    Ok(Collaborators {
        catalog: Arc::new(catalog),
        loader,
    })
}

/// Password of the run, from the environment or the password file
pub fn resolve_password(ctx: &LoadContext) -> Result<Password> {
    PasswordFile::new(&ctx.args.password_file)
        .resolve()
        .context("Failed to read the password file")
}
