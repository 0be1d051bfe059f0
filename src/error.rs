//! Domain-specific error types for the INI engine.
//!
//! All engine modules return the typed [`IniError`]; command handlers at
//! the CLI boundary convert it to [`anyhow::Error`] via the standard `?`
//! operator.
//!
//! Validation failures are detected before any filesystem effect, and
//! mid-transaction failures unwind before surfacing, so every variant here
//! implies the target file is unchanged — except [`IniError::AtomicReplaceFailed`],
//! which documents that a `.bak` sibling was left behind as a recovery aid.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the INI engine.
#[derive(Error, Debug)]
pub enum IniError {
    /// A required argument was absent or empty.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// A section or key name contains characters forbidden by the current mode.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName {
        /// The offending section or key name.
        name: String,
        /// Which rule the name violates.
        reason: String,
    },

    /// The path is empty or contains a parent-directory traversal segment.
    #[error("Invalid path '{0}'")]
    PathInvalid(String),

    /// The target file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The target file exceeds the configured size ceiling.
    #[error("File too large: {} is {size} bytes (limit {limit})", .path.display())]
    FileTooLarge {
        /// Path of the oversized file.
        path: PathBuf,
        /// Actual size in bytes.
        size: u64,
        /// Configured ceiling in bytes.
        limit: u64,
    },

    /// The target file is not writable.
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// The containing directory could not be created.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreateFailed {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The requested section (or key within it) is absent.
    ///
    /// A merely-absent section/key on read is a normal result, not a bug;
    /// callers that treat absence as acceptable match on this variant.
    #[error("{}", .key.as_ref().map_or_else(
        || format!("Section [{}] not found", .section),
        |k| format!("Key '{k}' not found in section [{}]", .section),
    ))]
    NotFound {
        /// Section that was searched.
        section: String,
        /// Key that was searched, if the lookup went below section level.
        key: Option<String>,
    },

    /// A rename target already exists; nothing is overwritten silently.
    #[error("'{0}' already exists")]
    AlreadyExists(String),

    /// The sidecar lock could not be acquired within the retry bound.
    #[error("Timed out acquiring lock for {} after {attempts} attempts", .path.display())]
    LockTimeout {
        /// File being locked.
        path: PathBuf,
        /// Number of acquisition attempts made.
        attempts: u32,
    },

    /// The final atomic rename failed; a `.bak` copy of the original remains.
    #[error("Atomic replace failed for {}: {source}", .path.display())]
    AtomicReplaceFailed {
        /// File that was being replaced.
        path: PathBuf,
        /// Underlying I/O error from the rename.
        source: std::io::Error,
    },

    /// A line is neither blank, comment, header, nor key-value (validation only).
    #[error("Malformed line {line}: {text}")]
    MalformedLine {
        /// One-based line number.
        line: usize,
        /// The offending line text, trimmed.
        text: String,
    },

    /// The merge strategy string is not one of `overwrite`, `skip`, `merge`.
    #[error("Invalid merge strategy '{0}': must be one of overwrite, skip, merge")]
    InvalidStrategy(String),

    /// One or more batch entries did not match `key=value` syntax.
    #[error("{0} batch entries did not match key=value syntax")]
    InvalidPairSyntax(usize),

    /// An I/O error outside the specific cases above.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl IniError {
    /// Build an [`IniError::Io`] from a path and error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an [`IniError::NotFound`] for a section lookup.
    #[must_use]
    pub fn section_not_found(section: impl Into<String>) -> Self {
        Self::NotFound {
            section: section.into(),
            key: None,
        }
    }

    /// Build an [`IniError::NotFound`] for a key lookup.
    #[must_use]
    pub fn key_not_found(section: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            section: section.into(),
            key: Some(key.into()),
        }
    }
}

/// Engine-wide result alias.
pub type Result<T> = std::result::Result<T, IniError>;
