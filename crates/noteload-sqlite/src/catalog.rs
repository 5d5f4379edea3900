//! Catalog implementation for SQLite

use crate::connection::SqlitePool;
use crate::error::SqliteResult;
use crate::schema::checked_table_name;
use async_trait::async_trait;
use noteload_core::{Catalog, IdentifierScope, LoadResult, NoteType, ObjectRef};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

/// SQLite implementation of [`Catalog`]
#[derive(Clone, Debug)]
pub struct SqliteCatalog {
    pool: SqlitePool,
    note_table: String,
}

impl SqliteCatalog {
    /// Catalog whose next-key lookups read `note_table`
    pub fn new(pool: SqlitePool, note_table: &str) -> SqliteResult<Self> {
        Ok(Self {
            pool,
            note_table: checked_table_name(note_table)?.to_string(),
        })
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn object_type_key(&self, name: &str) -> LoadResult<Option<i64>> {
        let name = name.to_string();
        let key = self
            .pool
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT _MGIType_key FROM MGI_Type WHERE name = ?1",
                        [&name],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;
        Ok(key)
    }

    async fn note_type(&self, name: &str, object_type_key: i64) -> LoadResult<Option<NoteType>> {
        let name = name.to_string();
        let found = self
            .pool
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT _NoteType_key, noteType, private FROM MGI_NoteType
                         WHERE noteType = ?1 AND _MGIType_key = ?2",
                        params![name, object_type_key],
                        |row| {
                            Ok(NoteType {
                                type_key: row.get(0)?,
                                name: row.get(1)?,
                                scope_object_type_key: object_type_key,
                                is_private: row.get::<_, Option<i64>>(2)?.map(|p| p != 0),
                            })
                        },
                    )
                    .optional()?)
            })
            .await?;
        Ok(found)
    }

    async fn user_key(&self, login: &str) -> LoadResult<Option<i64>> {
        let login = login.to_string();
        let key = self
            .pool
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT _User_key FROM MGI_User WHERE login = ?1",
                        [&login],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;
        Ok(key)
    }

    async fn preferred_identifiers(&self, scope: &IdentifierScope) -> LoadResult<Vec<ObjectRef>> {
        let scope = scope.clone();
        let refs = self
            .pool
            .run(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT accID, _Object_key FROM ACC_Accession
                     WHERE _MGIType_key = ?1
                       AND _LogicalDB_key = ?2
                       AND prefixPart = ?3
                       AND preferred = 1",
                )?;
                let rows = stmt.query_map(
                    params![scope.object_type_key, scope.logical_db_key, scope.prefix],
                    |row| Ok(ObjectRef::new(row.get::<_, String>(0)?, row.get(1)?)),
                )?;
                let refs = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(refs)
            })
            .await?;
        debug!(count = refs.len(), "Fetched preferred identifiers");
        Ok(refs)
    }

    async fn max_note_key(&self) -> LoadResult<Option<i64>> {
        let sql = format!("SELECT MAX(_Note_key) FROM {}", self.note_table);
        let max = self
            .pool
            .run(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
            .await?;
        Ok(max)
    }
}
