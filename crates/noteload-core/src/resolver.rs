//! Identifier and type resolution
//!
//! Both resolvers run once at startup. The identifier map is immutable
//! afterwards; a miss means "skip this line", never an error. An unknown
//! object type, note type or user aborts the run.

use crate::error::{NoteLoadError, NoteLoadResult};
use crate::traits::Catalog;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Logical database of the MGI accession authority
pub const MGI_LOGICAL_DB_KEY: i64 = 1;

/// Accession prefix of the MGI accession authority
pub const MGI_PREFIX: &str = "MGI:";

/// External identifier paired with its internal object key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Accession identifier as it appears in input files
    pub external_id: String,
    /// Internal object key
    pub internal_key: i64,
}

impl ObjectRef {
    /// Create an object reference
    pub fn new(external_id: impl Into<String>, internal_key: i64) -> Self {
        Self {
            external_id: external_id.into(),
            internal_key,
        }
    }
}

/// Which accessions count as preferred identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierScope {
    /// Object-type key the accessions belong to
    pub object_type_key: i64,
    /// Source authority (logical database) key
    pub logical_db_key: i64,
    /// Accession prefix, e.g. `MGI:`
    pub prefix: String,
}

impl IdentifierScope {
    /// MGI preferred accessions for an object type
    pub fn mgi(object_type_key: i64) -> Self {
        Self {
            object_type_key,
            logical_db_key: MGI_LOGICAL_DB_KEY,
            prefix: MGI_PREFIX.to_string(),
        }
    }
}

/// Immutable external-id -> internal-key map for one object type
#[derive(Debug, Clone, Default)]
pub struct IdentifierMap {
    object_type_key: i64,
    keys: HashMap<String, i64>,
}

impl IdentifierMap {
    /// Build from references; a later duplicate replaces an earlier one
    pub fn from_refs(object_type_key: i64, refs: impl IntoIterator<Item = ObjectRef>) -> Self {
        let mut keys = HashMap::new();
        for r in refs {
            if let Some(previous) = keys.insert(r.external_id.clone(), r.internal_key) {
                if previous != r.internal_key {
                    warn!(
                        external_id = %r.external_id,
                        previous,
                        replacement = r.internal_key,
                        "Duplicate preferred identifier"
                    );
                }
            }
        }
        Self {
            object_type_key,
            keys,
        }
    }

    /// Query the catalog for the scope and build the map
    pub async fn load(catalog: &dyn Catalog, scope: &IdentifierScope) -> NoteLoadResult<Self> {
        let refs = catalog.preferred_identifiers(scope).await?;
        let map = Self::from_refs(scope.object_type_key, refs);
        info!(
            object_type_key = scope.object_type_key,
            identifiers = map.len(),
            "Loaded preferred identifiers"
        );
        Ok(map)
    }

    /// Internal key for an external id
    pub fn resolve(&self, external_id: &str) -> Option<i64> {
        self.keys.get(external_id).copied()
    }

    /// Object type the map is scoped to
    pub fn object_type_key(&self) -> i64 {
        self.object_type_key
    }

    /// Number of identifiers
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the map holds no identifiers
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A named note category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteType {
    /// Category name, e.g. "Molecular"
    pub name: String,
    /// Note-type key
    pub type_key: i64,
    /// Object type the category belongs to
    pub scope_object_type_key: i64,
    /// Visibility flag, for catalogs that carry one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
}

/// Note-type names arrive quoted from some callers; quotes are not part of the name
pub fn normalize_note_type_name(name: &str) -> String {
    name.replace('"', "")
}

/// Resolve an object type name to its key
pub async fn resolve_object_type(catalog: &dyn Catalog, name: &str) -> NoteLoadResult<i64> {
    match catalog.object_type_key(name).await? {
        Some(key) => {
            debug!(name, key, "Resolved object type");
            Ok(key)
        }
        None => Err(NoteLoadError::UnknownObjectType(name.to_string())),
    }
}

/// Resolve a note type inside an object-type scope
pub async fn resolve_note_type(
    catalog: &dyn Catalog,
    name: &str,
    object_type_key: i64,
) -> NoteLoadResult<NoteType> {
    let name = normalize_note_type_name(name);
    match catalog.note_type(&name, object_type_key).await? {
        Some(note_type) => {
            debug!(name = %note_type.name, key = note_type.type_key, "Resolved note type");
            Ok(note_type)
        }
        None => Err(NoteLoadError::UnknownNoteType {
            name,
            object_type_key,
        }),
    }
}

/// Resolve the login user that will own created records
pub async fn resolve_user(catalog: &dyn Catalog, login: &str) -> NoteLoadResult<i64> {
    catalog
        .user_key(login)
        .await?
        .ok_or_else(|| NoteLoadError::UnknownUser(login.to_string()))
}

/// First surrogate key to hand out: one past the current maximum
pub async fn next_note_key(catalog: &dyn Catalog) -> NoteLoadResult<i64> {
    Ok(catalog.max_note_key().await?.map_or(1, |max| max + 1))
}
