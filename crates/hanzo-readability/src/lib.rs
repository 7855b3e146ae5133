//! # Hanzo Readability
//!
//! Bounded, crash-safe extraction of reader-friendly article content.
//!
//! Given an archived [`Link`], the [`ReadabilityExtractor`] downloads the
//! document, stages it in a temporary file, runs an external
//! `readability-extractor` binary on it under a hard timeout and writes the
//! result to `<output_root>/readability/`:
//!
//! - `content.html` - extracted article HTML
//! - `content.txt` - extracted article text
//! - `article.json` - every other field the extractor returned
//!
//! Each file is replaced atomically. Every run produces exactly one
//! [`ArchiveResult`], whether it succeeded or not.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hanzo_readability::{HttpDocumentSource, Link, ReadabilityConfig, ReadabilityExtractor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReadabilityConfig::default().apply_env();
//!     let source = Arc::new(HttpDocumentSource::new(&config)?);
//!     let extractor = ReadabilityExtractor::new(config, source);
//!
//!     let link = Link::new("https://example.com", "./archive/1700000000");
//!     if extractor.should_extract(&link, None) {
//!         let result = extractor.extract(&link, None, None).await;
//!         println!("{:?}", result.status);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────────┐
//! │  Document   │ ──► │   Staged     │ ──► │ Bounded Process │
//! │  Source     │     │   Temp File  │     │ Runner          │
//! └─────────────┘     └──────────────┘     └─────────────────┘
//!                                                   │
//!                                                   ▼
//!                     ┌──────────────┐     ┌─────────────────┐
//!                     │ ArchiveResult│ ◄── │ Atomic Artifact │
//!                     │              │     │ Writes          │
//!                     └──────────────┘     └─────────────────┘
//! ```

pub mod atomic;
pub mod config;
pub mod error;
pub mod link;
pub mod process;
pub mod readability;
pub mod result;
pub mod source;
pub mod timer;

pub use atomic::{atomic_write, atomic_write_json, AtomicWriter, DEFAULT_PERMISSIONS};
pub use config::{ConfigError, ReadabilityConfig};
pub use error::{ErrorKind, ExtractError, Result};
pub use link::Link;
pub use process::{BoundedProcessRunner, ProcessError, ProcessOutput};
pub use readability::ReadabilityExtractor;
pub use result::{ArchiveResult, ArchiveStatus, ErrorDetail};
pub use source::{DocumentSource, HttpDocumentSource};
pub use timer::{RunTimer, Timing};
