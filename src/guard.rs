//! Path and resource checks performed before any file is touched.
//!
//! Every operation funnels its target path through this module first:
//! traversal segments are rejected, symlinks are resolved to their real
//! target, the size ceiling is enforced, and (for writes) the containing
//! directory is created and writability verified. All checks are side
//! effect free on failure, except the documented directory auto-create.

use std::path::{Component, Path, PathBuf};

use crate::error::{IniError, Result};
use crate::settings::Settings;

/// Validate a path for reading and return the resolved target.
///
/// Symlinks are resolved so the engine operates on the real file; the
/// returned path is what the mutator locks and replaces.
///
/// # Errors
///
/// Returns [`IniError::PathInvalid`] for empty or traversing paths,
/// [`IniError::FileNotFound`] if the file does not exist, and
/// [`IniError::FileTooLarge`] if it exceeds the configured ceiling.
pub fn checked_read_path(settings: &Settings, path: &Path) -> Result<PathBuf> {
    let resolved = normalize(path)?;
    if !resolved.is_file() {
        return Err(IniError::FileNotFound(resolved));
    }
    check_size(settings, &resolved)?;
    Ok(resolved)
}

/// Validate a path for writing and return the resolved target.
///
/// The containing directory is created if absent. The file itself may not
/// exist yet; when it does, it must be a writable regular file within the
/// size ceiling.
///
/// # Errors
///
/// Returns [`IniError::PathInvalid`], [`IniError::FileTooLarge`],
/// [`IniError::PermissionDenied`], or [`IniError::DirectoryCreateFailed`].
pub fn checked_write_path(settings: &Settings, path: &Path) -> Result<PathBuf> {
    let resolved = normalize(path)?;

    if let Some(parent) = resolved.parent()
        && !parent.as_os_str().is_empty()
        && !parent.is_dir()
    {
        tracing::debug!("creating directory {}", parent.display());
        std::fs::create_dir_all(parent).map_err(|source| IniError::DirectoryCreateFailed {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    if resolved.exists() {
        check_size(settings, &resolved)?;
        let metadata = std::fs::metadata(&resolved).map_err(|e| IniError::io(&resolved, e))?;
        if metadata.permissions().readonly() {
            return Err(IniError::PermissionDenied(resolved));
        }
    }
    Ok(resolved)
}

/// Reject empty and traversing paths, resolve symlinks where possible.
///
/// Traversal is checked on the path as given; canonicalization (which also
/// resolves `..` lexically) only runs for existing files, so the check must
/// come first.
fn normalize(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(IniError::PathInvalid(String::new()));
    }
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(IniError::PathInvalid(path.display().to_string()));
    }

    // Resolve symlinks when the target exists; a not-yet-created file keeps
    // its literal path.
    match dunce::canonicalize(path) {
        Ok(resolved) => {
            if resolved
                .components()
                .any(|c| matches!(c, Component::ParentDir))
            {
                return Err(IniError::PathInvalid(resolved.display().to_string()));
            }
            Ok(resolved)
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}

fn check_size(settings: &Settings, path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| IniError::io(path, e))?;
    if metadata.len() > settings.max_file_size {
        return Err(IniError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit: settings.max_file_size,
        });
    }
    Ok(())
}

/// Read the full text of a validated file.
///
/// # Errors
///
/// Returns [`IniError::Io`] if the file cannot be read.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| IniError::io(path, e))
}
