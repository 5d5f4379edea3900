//! Schema management and migrations
//!
//! Table and column names follow the MGI relational layout so that the
//! generated deletion scripts run unchanged against this store.

use crate::error::{SqliteError, SqliteResult};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations
pub fn apply_migrations(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = get_current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version < SCHEMA_VERSION {
        info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Applying schema migrations"
        );
        apply_migration_v1(conn)?;
    }

    Ok(())
}

/// Get current schema version
fn get_current_version(conn: &Connection) -> SqliteResult<i32> {
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .optional()?
        .flatten();

    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: catalog and note tables
fn apply_migration_v1(conn: &Connection) -> SqliteResult<()> {
    debug!("Applying migration v1: catalog and note tables");

    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| SqliteError::Schema(format!("Failed to apply v1 schema: {}", e)))?;

    record_migration(conn, 1)?;
    info!("Migration v1 applied successfully");
    Ok(())
}

/// Check that a configured table name is a plain identifier
///
/// Table names are interpolated into SQL, so anything beyond
/// `[A-Za-z_][A-Za-z0-9_]*` is refused.
pub fn checked_table_name(name: &str) -> SqliteResult<&str> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(SqliteError::InvalidTableName(name.to_string()))
    }
}

const SCHEMA_V1: &str = r#"
-- ============================================================================
-- Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS MGI_Type (
    _MGIType_key INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS MGI_User (
    _User_key INTEGER PRIMARY KEY,
    login TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS ACC_Accession (
    _Accession_key INTEGER PRIMARY KEY,
    accID TEXT NOT NULL,
    prefixPart TEXT NOT NULL,
    _LogicalDB_key INTEGER NOT NULL,
    _Object_key INTEGER NOT NULL,
    _MGIType_key INTEGER NOT NULL REFERENCES MGI_Type(_MGIType_key),
    preferred INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_accession_scope
    ON ACC_Accession(_MGIType_key, _LogicalDB_key, prefixPart, preferred);

CREATE TABLE IF NOT EXISTS MGI_NoteType (
    _NoteType_key INTEGER PRIMARY KEY,
    _MGIType_key INTEGER NOT NULL REFERENCES MGI_Type(_MGIType_key),
    noteType TEXT NOT NULL,
    private INTEGER,
    UNIQUE(_MGIType_key, noteType)
);

-- ============================================================================
-- Notes (MGI tables)
-- ============================================================================

CREATE TABLE IF NOT EXISTS MGI_Note (
    _Note_key INTEGER PRIMARY KEY,
    _Object_key INTEGER NOT NULL,
    _MGIType_key INTEGER NOT NULL,
    _NoteType_key INTEGER NOT NULL,
    _CreatedBy_key INTEGER NOT NULL,
    _ModifiedBy_key INTEGER NOT NULL,
    creation_date TEXT NOT NULL,
    modification_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_mgi_note_scope
    ON MGI_Note(_MGIType_key, _NoteType_key, _Object_key);

CREATE TABLE IF NOT EXISTS MGI_NoteChunk (
    _Note_key INTEGER NOT NULL REFERENCES MGI_Note(_Note_key) ON DELETE CASCADE,
    sequenceNum INTEGER NOT NULL,
    note TEXT NOT NULL,
    _CreatedBy_key INTEGER NOT NULL,
    _ModifiedBy_key INTEGER NOT NULL,
    creation_date TEXT NOT NULL,
    modification_date TEXT NOT NULL,
    PRIMARY KEY (_Note_key, sequenceNum)
);

-- ============================================================================
-- Notes (allele tables, same layout)
-- ============================================================================

CREATE TABLE IF NOT EXISTS ALL_Note (
    _Note_key INTEGER PRIMARY KEY,
    _Object_key INTEGER NOT NULL,
    _MGIType_key INTEGER NOT NULL,
    _NoteType_key INTEGER NOT NULL,
    _CreatedBy_key INTEGER NOT NULL,
    _ModifiedBy_key INTEGER NOT NULL,
    creation_date TEXT NOT NULL,
    modification_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_all_note_scope
    ON ALL_Note(_MGIType_key, _NoteType_key, _Object_key);

CREATE TABLE IF NOT EXISTS ALL_NoteChunk (
    _Note_key INTEGER NOT NULL REFERENCES ALL_Note(_Note_key) ON DELETE CASCADE,
    sequenceNum INTEGER NOT NULL,
    note TEXT NOT NULL,
    _CreatedBy_key INTEGER NOT NULL,
    _ModifiedBy_key INTEGER NOT NULL,
    creation_date TEXT NOT NULL,
    modification_date TEXT NOT NULL,
    PRIMARY KEY (_Note_key, sequenceNum)
);
"#;
