//! Atomic INI configuration file manipulation engine.
//!
//! Reads, writes, validates, and transforms files in the classic INI format
//! (`[section]` headers followed by `key=value` lines, with `#`/`;`
//! comments). The file on disk is the single source of truth: every
//! operation re-reads it, and every mutation goes through a locked
//! read-modify-write transaction that replaces the file atomically.
//!
//! The public API is organised into layers, leaves first:
//!
//! - **[`guard`]** — path validation, symlink resolution, size ceiling
//! - **[`scanner`]** — line classification and section tracking
//! - **[`codec`]** — scalar and array value encoding
//! - **[`query`]** — read, enumerate, existence checks
//! - **[`mutator`]** — the locked atomic read-modify-write transaction
//! - **[`transform`]** — merge, import, validate, JSON/YAML/env export
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod codec;
pub mod commands;
pub mod document;
pub mod error;
pub mod guard;
pub mod logging;
pub mod mutator;
pub mod query;
pub mod scanner;
pub mod settings;
pub mod transform;

pub use error::IniError;
pub use settings::Settings;
