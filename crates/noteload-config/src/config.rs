//! Loader configuration
//!
//! Precedence: profile defaults < config file < command-line overrides.
//!
//! ```toml
//! profile = "mgi"
//! load_date_format = "%m/%d/%Y"
//!
//! [input]
//! layout = "accession-text"
//!
//! [output]
//! directory = "/data/loads/notes"
//! field_delimiter = "\t"
//! line_delimiter = "\n"
//!
//! [chunking]
//! max_length = 255
//!
//! [tables]
//! note = "MGI_Note"
//! note_chunk = "MGI_NoteChunk"
//!
//! [identifiers]
//! logical_db_key = 1
//! prefix = "MGI:"
//! strict = false
//!
//! [loader]
//! kind = "command"
//! bulk_command = ["bcpin.csh", "{server}", "{database}", "{table}", "{dir}", "{file}"]
//! script_command = ["psql", "-h", "{server}", "-d", "{database}", "-U", "{user}", "-f", "{script}"]
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::profile::Profile;
use chrono::format::{Item, StrftimeItems};
use noteload_core::{
    ArtifactFormat, EscapePolicy, EscapeRule, InputLayout, DEFAULT_CHUNK_LENGTH, MGI_LOGICAL_DB_KEY,
    MGI_PREFIX,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default date format of the audit columns
pub const DEFAULT_LOAD_DATE_FORMAT: &str = "%m/%d/%Y";

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "NOTELOAD_CONFIG";

// ============================================================================
// File schema
// ============================================================================

/// `[input]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputSection {
    /// Column layout
    pub layout: Option<InputLayout>,
}

/// `[output]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Where artifacts and diagnostics are written
    pub directory: Option<PathBuf>,
    /// Artifact field delimiter
    pub field_delimiter: Option<String>,
    /// Artifact line delimiter
    pub line_delimiter: Option<String>,
}

/// `[chunking]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChunkingSection {
    /// Maximum characters per chunk
    pub max_length: Option<usize>,
}

/// `[escape]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EscapeSection {
    /// Replaces the profile's escape table entirely
    pub rules: Option<Vec<EscapeRule>>,
}

/// `[tables]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TablesSection {
    /// Note table
    pub note: Option<String>,
    /// Note chunk table
    pub note_chunk: Option<String>,
}

/// `[identifiers]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentifiersSection {
    /// Source authority of preferred accessions
    pub logical_db_key: Option<i64>,
    /// Accession prefix
    pub prefix: Option<String>,
    /// Fail the run when any identifier does not resolve
    pub strict: Option<bool>,
}

/// `[loader]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LoaderBackend {
    /// In-process SQLite store
    Sqlite {
        /// Database file; defaults to the `--database` argument
        #[serde(default)]
        path: Option<PathBuf>,
    },
    /// External bulk-load and script tools
    Command {
        /// Program and arguments for one artifact load
        bulk_command: Vec<String>,
        /// Program and arguments for the deletion script
        #[serde(default)]
        script_command: Option<Vec<String>>,
    },
}

impl Default for LoaderBackend {
    fn default() -> Self {
        Self::Sqlite { path: None }
    }
}

/// Config file as written on disk; every value optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Defaults bundle
    pub profile: Option<Profile>,
    /// strftime format of the audit date columns
    pub load_date_format: Option<String>,
    /// `[input]`
    pub input: InputSection,
    /// `[output]`
    pub output: OutputSection,
    /// `[chunking]`
    pub chunking: ChunkingSection,
    /// `[escape]`
    pub escape: EscapeSection,
    /// `[tables]`
    pub tables: TablesSection,
    /// `[identifiers]`
    pub identifiers: IdentifiersSection,
    /// `[loader]`
    pub loader: Option<LoaderBackend>,
}

impl ConfigFile {
    /// Parse TOML text
    pub fn from_toml(text: &str, path: &Path) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a file
    pub fn read(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }
}

/// Values given on the command line; they win over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `--profile`
    pub profile: Option<Profile>,
    /// `--output-dir`
    pub output_directory: Option<PathBuf>,
    /// `--strict`
    pub strict_identifiers: Option<bool>,
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Destination table names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    /// Note table
    pub note: String,
    /// Note chunk table
    pub note_chunk: String,
}

/// Preferred-identifier settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierSettings {
    /// Source authority key
    pub logical_db_key: i64,
    /// Accession prefix
    pub prefix: String,
    /// Unresolved identifiers fail the run
    pub strict: bool,
}

/// Fully resolved, validated configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Profile the defaults came from
    pub profile: Profile,
    /// Input column layout
    pub layout: InputLayout,
    /// Artifact and diagnostics directory
    pub output_directory: PathBuf,
    /// Artifact delimiters
    pub format: ArtifactFormat,
    /// Maximum characters per chunk
    pub max_chunk_length: NonZeroUsize,
    /// Escape table for chunk text
    pub escape: EscapePolicy,
    /// Destination tables
    pub tables: TableNames,
    /// Preferred-identifier settings
    pub identifiers: IdentifierSettings,
    /// strftime format of the audit date columns
    pub load_date_format: String,
    /// Persistence backend
    pub loader: LoaderBackend,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}

impl LoaderConfig {
    /// Defaults of a profile, nothing overridden
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            profile,
            layout: profile.layout(),
            output_directory: PathBuf::from("."),
            format: profile.format(),
            max_chunk_length: DEFAULT_CHUNK_LENGTH,
            escape: profile.escape(),
            tables: TableNames {
                note: profile.note_table().to_string(),
                note_chunk: profile.note_chunk_table().to_string(),
            },
            identifiers: IdentifierSettings {
                logical_db_key: MGI_LOGICAL_DB_KEY,
                prefix: MGI_PREFIX.to_string(),
                strict: false,
            },
            load_date_format: DEFAULT_LOAD_DATE_FORMAT.to_string(),
            loader: LoaderBackend::default(),
        }
    }

    /// Layer a parsed file and overrides over the profile defaults
    pub fn resolve(file: ConfigFile, overrides: &ConfigOverrides) -> ConfigResult<Self> {
        let profile = overrides.profile.or(file.profile).unwrap_or_default();
        let mut config = Self::for_profile(profile);

        if let Some(layout) = file.input.layout {
            config.layout = layout;
        }

        if let Some(dir) = overrides
            .output_directory
            .clone()
            .or(file.output.directory)
        {
            config.output_directory = dir;
        }

        let field = file
            .output
            .field_delimiter
            .unwrap_or_else(|| config.format.field_delimiter().to_string());
        let line = file
            .output
            .line_delimiter
            .unwrap_or_else(|| config.format.line_delimiter().to_string());
        config.format =
            ArtifactFormat::new(field, line).map_err(|e| ConfigError::invalid(e.to_string()))?;

        if let Some(max) = file.chunking.max_length {
            config.max_chunk_length = NonZeroUsize::new(max)
                .ok_or_else(|| ConfigError::invalid("chunking.max_length must be greater than 0"))?;
        }

        if let Some(rules) = file.escape.rules {
            config.escape =
                EscapePolicy::new(rules).map_err(|e| ConfigError::invalid(e.to_string()))?;
        }

        if let Some(note) = file.tables.note {
            config.tables.note = note;
        }
        if let Some(note_chunk) = file.tables.note_chunk {
            config.tables.note_chunk = note_chunk;
        }

        if let Some(key) = file.identifiers.logical_db_key {
            config.identifiers.logical_db_key = key;
        }
        if let Some(prefix) = file.identifiers.prefix {
            config.identifiers.prefix = prefix;
        }
        if let Some(strict) = overrides.strict_identifiers.or(file.identifiers.strict) {
            config.identifiers.strict = strict;
        }

        if let Some(format) = file.load_date_format {
            config.load_date_format = format;
        }

        if let Some(loader) = file.loader {
            config.loader = loader;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file, `$NOTELOAD_CONFIG`, or the user config
    /// directory, in that order; no file at all means profile defaults
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> ConfigResult<Self> {
        let file = match Self::locate(path) {
            Some(found) => {
                info!(path = %found.display(), "Loading config file");
                ConfigFile::read(&found)?
            }
            None => {
                debug!("No config file, using profile defaults");
                ConfigFile::default()
            }
        };
        Self::resolve(file, overrides)
    }

    fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path().filter(|p| p.exists())
    }

    /// `$XDG_CONFIG_HOME/noteload/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("noteload").join("config.toml"))
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> ConfigResult<()> {
        if self.tables.note.trim().is_empty() || self.tables.note_chunk.trim().is_empty() {
            return Err(ConfigError::invalid("table names must not be empty"));
        }

        if self.identifiers.prefix.is_empty() {
            return Err(ConfigError::invalid("identifiers.prefix must not be empty"));
        }

        if self.load_date_format.is_empty()
            || StrftimeItems::new(&self.load_date_format).any(|item| matches!(item, Item::Error))
        {
            return Err(ConfigError::invalid(format!(
                "load_date_format '{}' is not a valid date format",
                self.load_date_format
            )));
        }

        // Chunk text is escaped, every other field is numeric or a date,
        // so the delimiters only need escaping when they can occur in text
        let field = self.format.field_delimiter();
        if let Some(c) = single_char(field).filter(|c| *c != '\t') {
            if !self.escape.escapes(c) {
                return Err(ConfigError::invalid(format!(
                    "field delimiter {field:?} has no escape rule"
                )));
            }
        }

        // Decoded line breaks reach the escaper as real newlines
        let line = self.format.line_delimiter();
        for c in std::iter::once('\n').chain(single_char(line)) {
            if !self.escape.escapes(c) {
                return Err(ConfigError::invalid(format!(
                    "line break {c:?} has no escape rule"
                )));
            }
        }

        if let Some(rule) = self.escape.irreversible_rule() {
            return Err(ConfigError::invalid(format!(
                "escape rule {:?} -> {:?} does not start with an escaped character",
                rule.from, rule.to
            )));
        }

        if let LoaderBackend::Command { bulk_command, .. } = &self.loader {
            if bulk_command.is_empty() {
                return Err(ConfigError::invalid("loader.bulk_command must name a program"));
            }
        }

        Ok(())
    }
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
