//! `mdfr` is a library for structure-aware find and replace in Markdown
//! documents.
//!
//! It provides the core logic for the `mdfr` command-line tool but can also be
//! used as a standalone library. The main components are:
//!
//! - `SectionSplitter`: partitions a document into typed regions (frontmatter,
//!   code block, table, plain) so patterns can selectively skip them.
//! - `PatternApplier`: applies one regex or literal pattern to a region's
//!   text, producing positional changes with accurate line numbers.
//! - `patterns`: loads ordered pattern sequences from catalogs and pattern
//!   lists (YAML or JSON).
//! - `FileProcessor`: orchestrates a run over the matched files, reassembles
//!   documents, and reports changes.
//! - `config`: run configuration from files and CLI flags.

pub mod applier;
pub mod cli;
pub mod config;
pub mod errors;
pub mod patterns;
pub mod processor;
pub mod report;
pub mod splitter;

// Re-export main types for easier access by library users.
pub use applier::{Change, PatternApplier};
pub use config::{Config, ConfigLoader, FileResolver};
pub use errors::{Error, Result};
pub use patterns::{Pattern, PatternLoader};
pub use processor::FileProcessor;
pub use report::ChangeReporter;
pub use splitter::{Section, SectionSplitter};
