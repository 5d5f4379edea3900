//! Mock collaborators for testing
//!
//! Both mocks are:
//!
//! - **Deterministic**: answers come only from what the test configured
//! - **Observable**: every call is recorded for assertions
//! - **Configurable**: failures can be injected per operation
//!
//! # Examples
//!
//! ```rust,ignore
//! use noteload_core::test_support::mocks::{MockCatalog, MockLoader};
//! use noteload_core::traits::{BulkLoader, Catalog};
//! use noteload_core::mode::DeletionScope;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = MockCatalog::new()
//!     .with_object_type("Allele", 11)
//!     .with_identifier(11, "MGI:12345", 42);
//! assert_eq!(catalog.object_type_key("Allele").await?, Some(11));
//!
//! let loader = MockLoader::new();
//! loader
//!     .purge(&DeletionScope::NoteType { object_type_key: 11, note_type_key: 7 })
//!     .await?;
//! assert_eq!(loader.calls().len(), 1);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{LoadError, LoadResult};
use crate::mode::DeletionScope;
use crate::resolver::{IdentifierScope, NoteType, ObjectRef};
use crate::traits::{Artifact, BulkLoader, Catalog, RowsLoaded};

// ============================================================================
// Mock Catalog
// ============================================================================

/// Catalog lookup counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockCatalogStats {
    /// Number of object_type_key calls
    pub object_type_lookups: usize,
    /// Number of note_type calls
    pub note_type_lookups: usize,
    /// Number of user_key calls
    pub user_lookups: usize,
    /// Number of preferred_identifiers calls
    pub identifier_queries: usize,
    /// Number of max_note_key calls
    pub max_key_queries: usize,
}

#[derive(Debug, Default)]
struct MockCatalogState {
    object_types: HashMap<String, i64>,
    note_types: Vec<NoteType>,
    users: HashMap<String, i64>,
    identifiers: Vec<(i64, ObjectRef)>,
    max_note_key: Option<i64>,
    error_message: Option<String>,
    stats: MockCatalogStats,
}

/// In-memory [`Catalog`] configured through builder methods
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    state: Arc<Mutex<MockCatalogState>>,
}

impl MockCatalog {
    /// Empty catalog: nothing resolves, no notes stored
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object type
    pub fn with_object_type(self, name: &str, key: i64) -> Self {
        self.state.lock().object_types.insert(name.to_string(), key);
        self
    }

    /// Register a note type inside an object-type scope
    pub fn with_note_type(
        self,
        name: &str,
        object_type_key: i64,
        type_key: i64,
        is_private: Option<bool>,
    ) -> Self {
        self.state.lock().note_types.push(NoteType {
            name: name.to_string(),
            type_key,
            scope_object_type_key: object_type_key,
            is_private,
        });
        self
    }

    /// Register a login user
    pub fn with_user(self, login: &str, key: i64) -> Self {
        self.state.lock().users.insert(login.to_string(), key);
        self
    }

    /// Register a preferred identifier of an object type
    pub fn with_identifier(self, object_type_key: i64, external_id: &str, internal_key: i64) -> Self {
        self.state
            .lock()
            .identifiers
            .push((object_type_key, ObjectRef::new(external_id, internal_key)));
        self
    }

    /// Pretend notes exist up to this key
    pub fn with_max_note_key(self, key: i64) -> Self {
        self.state.lock().max_note_key = Some(key);
        self
    }

    /// Make every lookup fail with `message`
    pub fn failing(self, message: &str) -> Self {
        self.state.lock().error_message = Some(message.to_string());
        self
    }

    /// Lookup counters
    pub fn stats(&self) -> MockCatalogStats {
        self.state.lock().stats.clone()
    }

    fn check(state: &MockCatalogState) -> LoadResult<()> {
        match &state.error_message {
            Some(message) => Err(LoadError::Catalog(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn object_type_key(&self, name: &str) -> LoadResult<Option<i64>> {
        let mut state = self.state.lock();
        state.stats.object_type_lookups += 1;
        Self::check(&state)?;
        Ok(state.object_types.get(name).copied())
    }

    async fn note_type(&self, name: &str, object_type_key: i64) -> LoadResult<Option<NoteType>> {
        let mut state = self.state.lock();
        state.stats.note_type_lookups += 1;
        Self::check(&state)?;
        Ok(state
            .note_types
            .iter()
            .find(|t| t.name == name && t.scope_object_type_key == object_type_key)
            .cloned())
    }

    async fn user_key(&self, login: &str) -> LoadResult<Option<i64>> {
        let mut state = self.state.lock();
        state.stats.user_lookups += 1;
        Self::check(&state)?;
        Ok(state.users.get(login).copied())
    }

    async fn preferred_identifiers(&self, scope: &IdentifierScope) -> LoadResult<Vec<ObjectRef>> {
        let mut state = self.state.lock();
        state.stats.identifier_queries += 1;
        Self::check(&state)?;
        Ok(state
            .identifiers
            .iter()
            .filter(|(otk, r)| {
                *otk == scope.object_type_key && r.external_id.starts_with(&scope.prefix)
            })
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn max_note_key(&self) -> LoadResult<Option<i64>> {
        let mut state = self.state.lock();
        state.stats.max_key_queries += 1;
        Self::check(&state)?;
        Ok(state.max_note_key)
    }
}

// ============================================================================
// Mock Loader
// ============================================================================

/// One recorded loader call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderCall {
    /// `purge(scope)`
    Purge(DeletionScope),
    /// `execute_script(path)`, with the script contents at call time
    ExecuteScript {
        /// Script path
        path: PathBuf,
        /// Script contents, empty if unreadable
        contents: String,
    },
    /// `load(artifact)`
    Load {
        /// Destination table
        table: String,
        /// Artifact path
        path: PathBuf,
        /// Rows the artifact claimed
        rows: u64,
    },
}

/// Which operation a failure is injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    /// `purge`
    Purge,
    /// `execute_script`
    Script,
    /// `load` of the given table position (0 = first load call)
    Load(usize),
}

#[derive(Debug, Default)]
struct MockLoaderState {
    calls: Vec<LoaderCall>,
    fail_on: Option<FailOn>,
    purged_rows: u64,
}

/// Recording [`BulkLoader`] that persists nothing
#[derive(Debug, Clone, Default)]
pub struct MockLoader {
    state: Arc<Mutex<MockLoaderState>>,
}

impl MockLoader {
    /// Loader that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a failure
    pub fn failing_on(self, fail_on: FailOn) -> Self {
        self.state.lock().fail_on = Some(fail_on);
        self
    }

    /// Row count reported by `purge`
    pub fn with_purged_rows(self, rows: u64) -> Self {
        self.state.lock().purged_rows = rows;
        self
    }

    /// Calls in the order they were made
    pub fn calls(&self) -> Vec<LoaderCall> {
        self.state.lock().calls.clone()
    }

    /// Whether nothing was called at all
    pub fn untouched(&self) -> bool {
        self.state.lock().calls.is_empty()
    }

    fn load_calls(state: &MockLoaderState) -> usize {
        state
            .calls
            .iter()
            .filter(|c| matches!(c, LoaderCall::Load { .. }))
            .count()
    }
}

#[async_trait]
impl BulkLoader for MockLoader {
    async fn purge(&self, scope: &DeletionScope) -> LoadResult<u64> {
        let mut state = self.state.lock();
        state.calls.push(LoaderCall::Purge(*scope));
        if state.fail_on == Some(FailOn::Purge) {
            return Err(LoadError::Purge("injected purge failure".to_string()));
        }
        Ok(state.purged_rows)
    }

    async fn execute_script(&self, script: &Path) -> LoadResult<()> {
        let contents = std::fs::read_to_string(script).unwrap_or_default();
        let mut state = self.state.lock();
        state.calls.push(LoaderCall::ExecuteScript {
            path: script.to_path_buf(),
            contents,
        });
        if state.fail_on == Some(FailOn::Script) {
            return Err(LoadError::ToolFailed {
                tool: "mock-script".to_string(),
                status: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }

    async fn load(&self, artifact: &Artifact) -> LoadResult<RowsLoaded> {
        let mut state = self.state.lock();
        let position = Self::load_calls(&state);
        state.calls.push(LoaderCall::Load {
            table: artifact.table.clone(),
            path: artifact.path.clone(),
            rows: artifact.rows,
        });
        if state.fail_on == Some(FailOn::Load(position)) {
            return Err(LoadError::ToolFailed {
                tool: "mock-bulk".to_string(),
                status: "exit status: 1".to_string(),
            });
        }
        Ok(RowsLoaded(artifact.rows))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
