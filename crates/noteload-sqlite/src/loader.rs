//! Bulk loader implementation for SQLite
//!
//! Plays the part of the external bulk-load utility: reads a delimited
//! artifact and inserts its rows into the artifact's table in one
//! transaction. Chunk text is stored as emitted, escapes included; readers
//! concatenate a note's chunks before unescaping.

use crate::connection::SqlitePool;
use crate::error::{SqliteError, SqliteResult};
use crate::schema::checked_table_name;
use async_trait::async_trait;
use noteload_core::{Artifact, ArtifactFormat, BulkLoader, DeletionScope, LoadResult, RowsLoaded};
use rusqlite::{params, params_from_iter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// SQLite implementation of [`BulkLoader`]
#[derive(Clone, Debug)]
pub struct SqliteBulkLoader {
    pool: SqlitePool,
    note_table: String,
    format: ArtifactFormat,
}

impl SqliteBulkLoader {
    /// Loader reading artifacts in `format`, purging from `note_table`
    pub fn new(pool: SqlitePool, note_table: &str, format: ArtifactFormat) -> SqliteResult<Self> {
        Ok(Self {
            pool,
            note_table: checked_table_name(note_table)?.to_string(),
            format,
        })
    }

    fn parse(&self, artifact: &Artifact, contents: &str) -> SqliteResult<Vec<Vec<String>>> {
        let width = artifact.kind.width();
        self.format
            .lines(contents)
            .enumerate()
            .map(|(i, line)| {
                self.format
                    .fields(line, width, artifact.kind.text_field())
                    .map(|fields| fields.into_iter().map(str::to_string).collect())
                    .ok_or_else(|| SqliteError::InvalidArtifact {
                        path: artifact.path.clone(),
                        row: i + 1,
                        reason: format!("expected {width} fields"),
                    })
            })
            .collect()
    }

    fn insert_rows(
        conn: &mut rusqlite::Connection,
        table: &str,
        path: &Path,
        rows: Vec<Vec<String>>,
    ) -> SqliteResult<u64> {
        let Some(width) = rows.first().map(Vec::len) else {
            return Ok(0);
        };

        let tx = conn.transaction()?;
        let mut inserted = 0u64;
        {
            let placeholders = vec!["?"; width].join(", ");
            let mut stmt = tx.prepare(&format!("INSERT INTO {table} VALUES ({placeholders})"))?;
            for (i, fields) in rows.iter().enumerate() {
                stmt.execute(params_from_iter(fields.iter()))
                    .map_err(|e| SqliteError::InvalidArtifact {
                        path: path.to_path_buf(),
                        row: i + 1,
                        reason: e.to_string(),
                    })?;
                inserted += 1;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

#[async_trait]
impl BulkLoader for SqliteBulkLoader {
    async fn purge(&self, scope: &DeletionScope) -> LoadResult<u64> {
        let scope = *scope;
        let table = self.note_table.clone();
        let deleted = self
            .pool
            .run(move |conn| {
                let base =
                    format!("DELETE FROM {table} WHERE _MGIType_key = ?1 AND _NoteType_key = ?2");
                let n = match scope.object_key() {
                    None => conn.execute(
                        &base,
                        params![scope.object_type_key(), scope.note_type_key()],
                    )?,
                    Some(object_key) => conn.execute(
                        &format!("{base} AND _Object_key = ?3"),
                        params![scope.object_type_key(), scope.note_type_key(), object_key],
                    )?,
                };
                Ok(n as u64)
            })
            .await?;
        info!(deleted, table = %self.note_table, "Purged notes");
        Ok(deleted)
    }

    async fn execute_script(&self, script: &Path) -> LoadResult<()> {
        let sql = tokio::fs::read_to_string(script).await?;
        if sql.trim().is_empty() {
            debug!(script = %script.display(), "Deletion script is empty");
            return Ok(());
        }
        self.pool
            .run(move |conn| {
                let tx = conn.transaction()?;
                tx.execute_batch(&sql)?;
                tx.commit()?;
                Ok(())
            })
            .await?;
        info!(script = %script.display(), "Executed deletion script");
        Ok(())
    }

    async fn load(&self, artifact: &Artifact) -> LoadResult<RowsLoaded> {
        let table = checked_table_name(&artifact.table)?.to_string();
        let path: PathBuf = artifact.path.clone();
        let contents = tokio::fs::read_to_string(&path).await?;
        let rows = self.parse(artifact, &contents)?;

        let inserted = self
            .pool
            .run(move |conn| Self::insert_rows(conn, &table, &path, rows))
            .await?;

        info!(table = %artifact.table, rows = inserted, "Loaded artifact");
        Ok(RowsLoaded(inserted))
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noteload_core::{ArtifactKind, EscapePolicy};
    use tempfile::TempDir;

    fn loader(pool: &SqlitePool) -> SqliteBulkLoader {
        SqliteBulkLoader::new(pool.clone(), "MGI_Note", ArtifactFormat::tab_newline()).unwrap()
    }

    fn count(pool: &SqlitePool, sql: &str) -> i64 {
        pool.with_connection(|conn| Ok(conn.query_row(sql, [], |row| row.get(0))?))
            .unwrap()
    }

    fn artifact(dir: &TempDir, table: &str, contents: &str, rows: u64) -> Artifact {
        let path = dir.path().join(format!("input.{table}.bcp"));
        std::fs::write(&path, contents).unwrap();
        Artifact {
            kind: if table.ends_with("Chunk") {
                ArtifactKind::NoteChunk
            } else {
                ArtifactKind::Note
            },
            table: table.to_string(),
            path,
            rows,
        }
    }

    #[tokio::test]
    async fn stores_chunk_text_as_emitted() {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePool::memory().unwrap();
        let loader = loader(&pool);

        let notes = artifact(&dir, "MGI_Note", "100\t42\t11\t7\t1001\t1001\td\td\n", 1);
        let chunks = artifact(
            &dir,
            "MGI_NoteChunk",
            "100\t1\tline one\\nline \\#2\t1001\t1001\td\td\n",
            1,
        );

        assert_eq!(loader.load(&notes).await.unwrap(), RowsLoaded(1));
        assert_eq!(loader.load(&chunks).await.unwrap(), RowsLoaded(1));

        let text: String = pool
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT note FROM MGI_NoteChunk", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(text, "line one\\nline \\#2");
        assert_eq!(EscapePolicy::mgi().unescape(&text), "line one\nline #2");
    }

    #[tokio::test]
    async fn wrong_column_count_names_the_row() {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePool::memory().unwrap();
        let bad = artifact(
            &dir,
            "MGI_Note",
            "1\t42\t11\t7\t1001\t1001\td\td\n2\t43\n",
            2,
        );

        let err = loader(&pool).load(&bad).await.unwrap_err();
        assert!(matches!(err, noteload_core::LoadError::InvalidArtifact { row: 2, .. }));
        // Nothing from a bad artifact is inserted
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM MGI_Note"), 0);
    }

    #[tokio::test]
    async fn purge_respects_scope() {
        let pool = SqlitePool::memory().unwrap();
        pool.with_connection(|conn| {
            conn.execute_batch(
                "INSERT INTO MGI_Note VALUES (1, 42, 11, 7, 1, 1, 'd', 'd');
                 INSERT INTO MGI_Note VALUES (2, 43, 11, 7, 1, 1, 'd', 'd');
                 INSERT INTO MGI_Note VALUES (3, 42, 11, 8, 1, 1, 'd', 'd');",
            )?;
            Ok(())
        })
        .unwrap();
        let loader = loader(&pool);

        let one = DeletionScope::Object {
            object_type_key: 11,
            note_type_key: 7,
            object_key: 42,
        };
        assert_eq!(loader.purge(&one).await.unwrap(), 1);

        let all = DeletionScope::NoteType {
            object_type_key: 11,
            note_type_key: 7,
        };
        assert_eq!(loader.purge(&all).await.unwrap(), 1);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM MGI_Note"), 1);
    }

    #[tokio::test]
    async fn executes_deletion_script() {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePool::memory().unwrap();
        pool.with_connection(|conn| {
            conn.execute_batch(
                "INSERT INTO MGI_Note VALUES (1, 42, 11, 7, 1, 1, 'd', 'd');
                 INSERT INTO MGI_NoteChunk VALUES (1, 1, 'x', 1, 1, 'd', 'd');",
            )?;
            Ok(())
        })
        .unwrap();

        let script = dir.path().join("input.sql");
        std::fs::write(
            &script,
            DeletionScope::Object {
                object_type_key: 11,
                note_type_key: 7,
                object_key: 42,
            }
            .to_sql("MGI_Note")
                + "\n",
        )
        .unwrap();

        loader(&pool).execute_script(&script).await.unwrap();
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM MGI_Note"), 0);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM MGI_NoteChunk"), 0);
    }

    #[tokio::test]
    async fn broken_script_is_reported() {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePool::memory().unwrap();
        let script = dir.path().join("bad.sql");
        std::fs::write(&script, "delete from Nowhere;").unwrap();
        assert!(loader(&pool).execute_script(&script).await.is_err());
    }
}
