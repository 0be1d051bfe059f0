//! Mutating subcommand handlers; every one is a single atomic transaction.

use std::path::Path;

use anyhow::Result;

use crate::error::IniError;
use crate::mutator;
use crate::settings::Settings;

/// Write a key=value pair.
///
/// # Errors
///
/// Engine failures.
pub fn set(settings: &Settings, file: &Path, section: &str, key: &str, value: &str) -> Result<()> {
    mutator::write(settings, file, section, key, value)?;
    Ok(())
}

/// Write an array value.
///
/// # Errors
///
/// Engine failures.
pub fn set_array(
    settings: &Settings,
    file: &Path,
    section: &str,
    key: &str,
    elements: &[String],
) -> Result<()> {
    mutator::write_array(settings, file, section, key, elements)?;
    Ok(())
}

/// Add a section header (idempotent).
///
/// # Errors
///
/// Engine failures.
pub fn add_section(settings: &Settings, file: &Path, section: &str) -> Result<()> {
    mutator::add_section(settings, file, section)?;
    Ok(())
}

/// Remove a section; absence is a quiet success.
///
/// # Errors
///
/// Engine failures.
pub fn remove_section(settings: &Settings, file: &Path, section: &str) -> Result<()> {
    mutator::remove_section(settings, file, section)?;
    Ok(())
}

/// Remove a key; absence is a quiet success.
///
/// # Errors
///
/// Engine failures.
pub fn remove_key(settings: &Settings, file: &Path, section: &str, key: &str) -> Result<()> {
    mutator::remove_key(settings, file, section, key)?;
    Ok(())
}

/// Rename a section header.
///
/// # Errors
///
/// `NotFound` when old is absent, `AlreadyExists` on collision.
pub fn rename_section(settings: &Settings, file: &Path, old: &str, new: &str) -> Result<()> {
    mutator::rename_section(settings, file, old, new)?;
    Ok(())
}

/// Rename a key within a section.
///
/// # Errors
///
/// `NotFound` when old is absent, `AlreadyExists` on collision.
pub fn rename_key(
    settings: &Settings,
    file: &Path,
    section: &str,
    old: &str,
    new: &str,
) -> Result<()> {
    mutator::rename_key(settings, file, section, old, new)?;
    Ok(())
}

/// Re-serialize the whole file.
///
/// # Errors
///
/// Engine failures.
pub fn format(settings: &Settings, file: &Path, indent: usize, sort: bool) -> Result<()> {
    mutator::format(settings, file, indent, sort)?;
    Ok(())
}

/// Apply several key=value pairs in one transaction.
///
/// Valid pairs are applied even when others are rejected; the rejection
/// count is then surfaced as the command's failure.
///
/// # Errors
///
/// Engine failures, or [`IniError::InvalidPairSyntax`] when any pair
/// lacked `key=value` syntax.
pub fn batch(settings: &Settings, file: &Path, section: &str, pairs: &[String]) -> Result<()> {
    let outcome = mutator::batch_write(settings, file, section, pairs)?;
    println!("applied {}", outcome.applied);
    for pair in &outcome.rejected {
        tracing::warn!("rejected pair: {pair}");
    }
    if !outcome.rejected.is_empty() {
        return Err(IniError::InvalidPairSyntax(outcome.rejected.len()).into());
    }
    Ok(())
}
