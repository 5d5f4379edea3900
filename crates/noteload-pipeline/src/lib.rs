//! Run Orchestration Layer
//!
//! Drives one note load from arguments to persisted rows.
//!
//! ## Architecture
//!
//! - [`LoadContext`]: arguments, configuration and output paths, built once
//! - [`NoteLoadPipeline`]: resolve, purge, build, check, load
//! - [`BulkEmitter`]: note, chunk and script artifacts
//! - [`RunLog`]: the `.diagnostics` and `.error` artifacts
//! - [`CommandBulkLoader`]: [`noteload_core::BulkLoader`] over site tools
//!
//! ## Usage
//!
//! ```rust,ignore
//! use noteload_pipeline::{LoadContext, NoteLoadPipeline};
//!
//! let ctx = LoadContext::new(args, config)?;
//! let pipeline = NoteLoadPipeline::new(catalog, loader);
//! let summary = pipeline.run(&ctx).await?;
//! ```

pub mod command_loader;
pub mod context;
pub mod emitter;
pub mod error;
pub mod note_load;
pub mod run_log;

pub use command_loader::{CommandBulkLoader, CommandTarget};
pub use context::{ArtifactPaths, LoadContext, RunArgs};
pub use emitter::{BulkEmitter, EmittedArtifacts};
pub use error::{PipelineError, PipelineResult};
pub use note_load::{LoadSummary, NoteLoadPipeline};
pub use run_log::RunLog;
