//! Database password resolution
//!
//! The password lives in a file whose first line is the secret; surrounding
//! whitespace is ignored. `NOTELOAD_PASSWORD`, when set, wins over the file
//! so that wrappers can pass it without touching disk.

use crate::error::{ConfigError, ConfigResult};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable that overrides the password file
pub const PASSWORD_ENV: &str = "NOTELOAD_PASSWORD";

/// A secret that never prints itself
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Wrap a secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The secret itself
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// File holding the database password
#[derive(Debug, Clone)]
pub struct PasswordFile {
    path: PathBuf,
}

impl PasswordFile {
    /// Password file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First line of the file, trimmed
    pub fn read(&self) -> ConfigResult<Password> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| ConfigError::PasswordFile {
                path: self.path.clone(),
                source,
            })?;
        let first = content.lines().next().unwrap_or_default();
        Ok(Password::new(first.trim()))
    }

    /// Environment override if set, otherwise the file
    pub fn resolve(&self) -> ConfigResult<Password> {
        match std::env::var(PASSWORD_ENV) {
            Ok(secret) if !secret.is_empty() => {
                debug!("Using password from {}", PASSWORD_ENV);
                Ok(Password::new(secret))
            }
            _ => self.read(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn password_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn first_line_is_trimmed() {
        std::env::remove_var(PASSWORD_ENV);
        let file = password_file("  s3cret \nignored\n");
        let password = PasswordFile::new(file.path()).resolve().unwrap();
        assert_eq!(password.expose(), "s3cret");
    }

    #[test]
    #[serial]
    fn environment_wins_over_file() {
        let file = password_file("from-file\n");
        std::env::set_var(PASSWORD_ENV, "from-env");
        let password = PasswordFile::new(file.path()).resolve();
        std::env::remove_var(PASSWORD_ENV);
        assert_eq!(password.unwrap().expose(), "from-env");
    }

    #[test]
    #[serial]
    fn missing_file_is_an_error() {
        std::env::remove_var(PASSWORD_ENV);
        let err = PasswordFile::new("/nonexistent/noteload/password")
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::PasswordFile { .. }));
    }

    #[test]
    fn debug_hides_the_secret() {
        let shown = format!("{:?}", Password::new("hunter2"));
        assert!(!shown.contains("hunter2"));
    }
}
