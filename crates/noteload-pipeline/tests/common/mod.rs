//! Common test utilities for pipeline tests.

use anyhow::Result;
use noteload_config::LoaderConfig;
use noteload_core::test_support::MockCatalog;
use noteload_pipeline::{LoadContext, RunArgs};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a temporary annotation file.
///
/// Returns the temp directory (which must be kept alive) and the file path.
pub fn create_input_file(content: &str) -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let file_path = temp_dir.path().join("notes.txt");
    std::fs::write(&file_path, content)?;
    Ok((temp_dir, file_path))
}

/// Catalog with one allele type, the "Molecular" note type, user `loader`
/// and three preferred accessions.
pub fn catalog() -> MockCatalog {
    MockCatalog::new()
        .with_object_type("Allele", 11)
        .with_note_type("Molecular", 11, 7, None)
        .with_user("loader", 1001)
        .with_identifier(11, "MGI:12345", 42)
        .with_identifier(11, "MGI:12346", 43)
        .with_identifier(11, "MGI:12347", 44)
        .with_max_note_key(99)
}

/// Run arguments for `input` in `mode`
pub fn run_args(mode: &str, input: &Path) -> RunArgs {
    RunArgs {
        server: "DEV".to_string(),
        database: "mgd".to_string(),
        user: "loader".to_string(),
        password_file: PathBuf::from("/dev/null"),
        mode: mode.to_string(),
        input_file: input.to_path_buf(),
        object_type: "Allele".to_string(),
        note_type: "Molecular".to_string(),
    }
}

/// Context writing its artifacts next to the input file
pub fn context(mode: &str, dir: &TempDir, input: &Path) -> Result<LoadContext> {
    context_with(mode, dir, input, LoaderConfig::default())
}

/// Same as [`context`] with a custom configuration
pub fn context_with(
    mode: &str,
    dir: &TempDir,
    input: &Path,
    mut config: LoaderConfig,
) -> Result<LoadContext> {
    config.output_directory = dir.path().to_path_buf();
    Ok(LoadContext::new(run_args(mode, input), config)?)
}
