//! Read-side operations: lookups, enumeration, existence checks.
//!
//! All of these re-read the file per call and never take the lock; the
//! atomic rename on the write side guarantees they see either the fully
//! old or fully new content, never a half-written file.

use std::path::Path;

use crate::codec;
use crate::document::Document;
use crate::error::{IniError, Result};
use crate::guard;
use crate::scanner::{self, Line};
use crate::settings::Settings;

/// Load and parse the target file.
fn load(settings: &Settings, path: &Path) -> Result<Document> {
    let resolved = guard::checked_read_path(settings, path)?;
    Ok(Document::parse(&guard::read_text(&resolved)?))
}

/// Read the decoded value of `key` within the first run of `section`.
///
/// First match wins when a hand-edited file carries duplicate keys.
///
/// # Errors
///
/// Guard failures, or [`IniError::NotFound`] when the section or key is
/// absent.
pub fn read(settings: &Settings, path: &Path, section: &str, key: &str) -> Result<String> {
    scanner::validate_name(settings, "section", section)?;
    scanner::validate_name(settings, "key", key)?;
    let doc = load(settings, path)?;
    if doc.header_index(section).is_none() {
        return Err(IniError::section_not_found(section));
    }
    doc.raw_value(section, key)
        .map(|raw| codec::decode_scalar(&raw))
        .ok_or_else(|| IniError::key_not_found(section, key))
}

/// Read `key` as an array: the raw stored value decoded through the
/// quote-aware comma split.
///
/// # Errors
///
/// Same as [`read`].
pub fn read_array(
    settings: &Settings,
    path: &Path,
    section: &str,
    key: &str,
) -> Result<Vec<String>> {
    scanner::validate_name(settings, "section", section)?;
    scanner::validate_name(settings, "key", key)?;
    let doc = load(settings, path)?;
    if doc.header_index(section).is_none() {
        return Err(IniError::section_not_found(section));
    }
    doc.raw_value(section, key)
        .map(|raw| codec::decode_array(&raw))
        .ok_or_else(|| IniError::key_not_found(section, key))
}

/// Section names in file order, one per header occurrence.
///
/// Duplicate headers in a hand-edited file are deliberately *not*
/// deduplicated here, even though reads only ever bind to the first run.
///
/// # Errors
///
/// Guard failures.
pub fn list_sections(settings: &Settings, path: &Path) -> Result<Vec<String>> {
    let resolved = guard::checked_read_path(settings, path)?;
    let text = guard::read_text(&resolved)?;
    Ok(scanner::lines(&text)
        .filter_map(|(_, _, line)| match line {
            Line::SectionHeader(name) => Some(name),
            _ => None,
        })
        .collect())
}

/// Key names within the first run of `section`, in file order.
///
/// An absent or empty section yields an empty list, not an error.
///
/// # Errors
///
/// Guard failures.
pub fn list_keys(settings: &Settings, path: &Path, section: &str) -> Result<Vec<String>> {
    scanner::validate_name(settings, "section", section)?;
    let doc = load(settings, path)?;
    Ok(doc.keys(section))
}

/// Whether the file carries at least one header for `section`.
///
/// # Errors
///
/// Guard failures.
pub fn section_exists(settings: &Settings, path: &Path, section: &str) -> Result<bool> {
    scanner::validate_name(settings, "section", section)?;
    let doc = load(settings, path)?;
    Ok(doc.header_index(section).is_some())
}

/// Whether `key` resolves within the first run of `section`.
///
/// # Errors
///
/// Guard failures.
pub fn key_exists(settings: &Settings, path: &Path, section: &str, key: &str) -> Result<bool> {
    scanner::validate_name(settings, "section", section)?;
    scanner::validate_name(settings, "key", key)?;
    let doc = load(settings, path)?;
    Ok(doc.raw_value(section, key).is_some())
}

/// Full section → key → decoded-value map, in file order.
///
/// Only the first run of a duplicated section contributes entries; first
/// match wins for duplicated keys. Shared by the JSON/YAML/env exports.
///
/// # Errors
///
/// Guard failures.
pub fn section_map(settings: &Settings, path: &Path) -> Result<Vec<(String, Vec<(String, String)>)>> {
    let resolved = guard::checked_read_path(settings, path)?;
    let text = guard::read_text(&resolved)?;

    let mut map: Vec<(String, Vec<(String, String)>)> = Vec::new();
    // Index into `map` for the section currently being filled; None when a
    // duplicate header re-opens a section already captured.
    let mut current: Option<usize> = None;

    for (_, _, line) in scanner::lines(&text) {
        match line {
            Line::SectionHeader(name) => {
                if map.iter().any(|(n, _)| *n == name) {
                    current = None;
                } else {
                    map.push((name, Vec::new()));
                    current = Some(map.len() - 1);
                }
            }
            Line::KeyValue { key, raw_value } => {
                if let Some(idx) = current
                    && let Some((_, entries)) = map.get_mut(idx)
                    && !entries.iter().any(|(k, _)| *k == key)
                {
                    entries.push((key, codec::decode_scalar(&raw_value)));
                }
            }
            _ => {}
        }
    }
    Ok(map)
}
