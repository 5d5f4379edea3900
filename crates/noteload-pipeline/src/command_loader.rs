//! External-command bulk loader
//!
//! Hands artifacts and scripts to site tools (a bulk-copy wrapper, a SQL
//! shell) configured as argument templates. Placeholders in each argument
//! are substituted before the program is spawned:
//!
//! | placeholder | value |
//! |---|---|
//! | `{server}`, `{database}`, `{user}` | run arguments |
//! | `{table}` | destination table of the artifact |
//! | `{file}`, `{dir}` | artifact file name and its directory |
//! | `{field_delimiter}`, `{line_delimiter}` | artifact delimiters |
//! | `{script}` | path of the script to execute |
//!
//! The password travels in `NOTELOAD_PASSWORD`, never on the command line.

use async_trait::async_trait;
use noteload_config::{Password, PASSWORD_ENV};
use noteload_core::{
    Artifact, ArtifactFormat, BulkLoader, DeletionScope, LoadError, LoadResult, RowsLoaded,
};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Connection values shared by every command
#[derive(Debug, Clone)]
pub struct CommandTarget {
    /// Database server
    pub server: String,
    /// Database name
    pub database: String,
    /// Login user
    pub user: String,
    /// Password exported to the child
    pub password: Option<Password>,
    /// Artifact delimiters
    pub format: ArtifactFormat,
    /// Note table, for purge statements
    pub note_table: String,
    /// Directory for generated purge scripts
    pub work_dir: PathBuf,
}

/// [`BulkLoader`] that shells out to configured programs
#[derive(Debug, Clone)]
pub struct CommandBulkLoader {
    bulk_command: Vec<String>,
    script_command: Option<Vec<String>>,
    target: CommandTarget,
}

impl CommandBulkLoader {
    /// Create a loader from argument templates
    pub fn new(
        bulk_command: Vec<String>,
        script_command: Option<Vec<String>>,
        target: CommandTarget,
    ) -> Self {
        Self {
            bulk_command,
            script_command,
            target,
        }
    }

    fn substitute(&self, template: &[String], extra: &[(&str, String)]) -> Vec<String> {
        let t = &self.target;
        let common = [
            ("{server}", t.server.clone()),
            ("{database}", t.database.clone()),
            ("{user}", t.user.clone()),
            ("{field_delimiter}", t.format.field_delimiter().to_string()),
            ("{line_delimiter}", t.format.line_delimiter().to_string()),
        ];

        template
            .iter()
            .map(|arg| {
                common
                    .iter()
                    .chain(extra)
                    .fold(arg.clone(), |acc, (key, value)| acc.replace(key, value))
            })
            .collect()
    }

    async fn run(&self, argv: Vec<String>) -> LoadResult<()> {
        let Some((program, args)) = argv.split_first() else {
            return Err(LoadError::Backend("empty command".to_string()));
        };

        debug!(program = %program, ?args, "Spawning loader command");
        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null());
        if let Some(password) = &self.target.password {
            command.env(PASSWORD_ENV, password.expose());
        }

        let output = command.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(program = %program, status = %output.status, stderr = %stderr.trim(), "Loader command failed");
            return Err(LoadError::ToolFailed {
                tool: program.clone(),
                status: output.status.to_string(),
            });
        }
        Ok(())
    }

    fn script_argv(&self, script: &Path) -> LoadResult<Vec<String>> {
        let template = self.script_command.as_ref().ok_or_else(|| {
            LoadError::Backend("loader.script_command is not configured".to_string())
        })?;
        Ok(self.substitute(template, &[("{script}", script.display().to_string())]))
    }
}

#[async_trait]
impl BulkLoader for CommandBulkLoader {
    async fn purge(&self, scope: &DeletionScope) -> LoadResult<u64> {
        let path = self.target.work_dir.join(format!(
            "purge.{}.{}.sql",
            scope.object_type_key(),
            scope.note_type_key()
        ));
        let statement = format!("{}\n", scope.to_sql(&self.target.note_table));
        tokio::fs::write(&path, statement).await?;

        let argv = self.script_argv(&path)?;
        self.run(argv)
            .await
            .map_err(|e| LoadError::Purge(e.to_string()))?;
        info!(script = %path.display(), "Purged existing notes");
        Ok(0)
    }

    async fn execute_script(&self, script: &Path) -> LoadResult<()> {
        let argv = self.script_argv(script)?;
        self.run(argv).await
    }

    async fn load(&self, artifact: &Artifact) -> LoadResult<RowsLoaded> {
        let path = artifact.path();
        let dir = path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        let argv = self.substitute(
            &self.bulk_command,
            &[
                ("{table}", artifact.table.clone()),
                ("{dir}", dir),
                ("{file}", file),
            ],
        );
        self.run(argv).await?;
        Ok(RowsLoaded(artifact.rows))
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
