//! # Note Loader Configuration
//!
//! Profiles, the TOML config file and password resolution.
//!
//! ```rust,no_run
//! use noteload_config::{ConfigOverrides, LoaderConfig};
//!
//! let config = LoaderConfig::load(None, &ConfigOverrides::default())?;
//! assert_eq!(config.max_chunk_length.get(), 255);
//! # Ok::<(), noteload_config::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod credentials;
mod error;
mod profile;

pub use config::*;
pub use credentials::*;
pub use error::*;
pub use profile::*;
