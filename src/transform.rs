//! Bulk transforms composed from the scanner, codec, query, and mutator:
//! merge, import, validation, and JSON/YAML/environment exports.

use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::codec;
use crate::error::{IniError, Result};
use crate::guard;
use crate::mutator;
use crate::query;
use crate::scanner::{self, Line};
use crate::settings::Settings;

/// Conflict policy when a merged key already exists in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Replace the target's value with the source's.
    Overwrite,
    /// Keep the target's value.
    Skip,
    /// Concatenate as `target,source` on the raw stored text.
    ///
    /// The target's stored form is kept verbatim, quotes included; there is
    /// no round trip through the array codec, so already-quoted array
    /// elements may end up double-encoded. Kept deliberately.
    Merge,
}

impl FromStr for MergeStrategy {
    type Err = IniError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "overwrite" => Ok(Self::Overwrite),
            "skip" => Ok(Self::Skip),
            "merge" => Ok(Self::Merge),
            other => Err(IniError::InvalidStrategy(other.to_string())),
        }
    }
}

/// One problem found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// One-based line number.
    pub line: usize,
    /// What is wrong with the line.
    pub message: String,
    /// The offending line text, trimmed.
    pub text: String,
}

/// Aggregate outcome of [`validate`]; the file is never touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Total lines scanned.
    pub lines: usize,
    /// Problems found, in file order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Whether the file is syntactically well-formed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// Collapse the report into a typed pass/fail result.
    ///
    /// Callers that need every problem inspect
    /// [`issues`](ValidationReport::issues) instead.
    ///
    /// # Errors
    ///
    /// [`IniError::MalformedLine`] carrying the first issue's location.
    pub fn into_result(self) -> Result<()> {
        match self.issues.into_iter().next() {
            None => Ok(()),
            Some(issue) => Err(IniError::MalformedLine {
                line: issue.line,
                text: issue.text,
            }),
        }
    }
}

/// Single-pass syntactic validation.
///
/// Errors: a key-value line before any section header, a line that is
/// neither blank/comment/header/key-value, and (in strict mode) section or
/// key names with illegal characters.
///
/// # Errors
///
/// Guard failures only; syntax problems go into the report.
pub fn validate(settings: &Settings, path: &Path) -> Result<ValidationReport> {
    let resolved = guard::checked_read_path(settings, path)?;
    let text = guard::read_text(&resolved)?;

    let mut issues = Vec::new();
    let mut lines = 0usize;
    let mut inside_section = false;

    for (line_no, raw, line) in scanner::lines(&text) {
        lines = line_no;
        match line {
            Line::Blank | Line::Comment => {}
            Line::SectionHeader(name) => {
                inside_section = true;
                if settings.strict_names && !scanner::name_is_valid(settings, &name) {
                    issues.push(ValidationIssue {
                        line: line_no,
                        message: format!("invalid section name '{name}'"),
                        text: raw.trim().to_string(),
                    });
                }
            }
            Line::KeyValue { key, .. } => {
                if !inside_section {
                    issues.push(ValidationIssue {
                        line: line_no,
                        message: "key-value pair before any section header".to_string(),
                        text: raw.trim().to_string(),
                    });
                }
                if settings.strict_names && !scanner::name_is_valid(settings, &key) {
                    issues.push(ValidationIssue {
                        line: line_no,
                        message: format!("invalid key name '{key}'"),
                        text: raw.trim().to_string(),
                    });
                }
            }
            Line::Malformed => issues.push(ValidationIssue {
                line: line_no,
                message: "not a comment, section header, or key=value pair".to_string(),
                text: raw.trim().to_string(),
            }),
        }
    }

    tracing::debug!("validated {} lines, {} issue(s)", lines, issues.len());
    Ok(ValidationReport { lines, issues })
}

/// Merge every (optionally filtered) section/key of `source` into `target`.
///
/// Absent keys are always added; present keys follow the strategy. The
/// whole merge is one transaction on the target.
///
/// # Errors
///
/// Guard/lock/commit failures on either file.
pub fn merge(
    settings: &Settings,
    source: &Path,
    target: &Path,
    strategy: MergeStrategy,
    sections: Option<&[String]>,
) -> Result<()> {
    let source_map = query::section_map(settings, source)?;

    mutator::with_document(settings, target, |doc| {
        for (section, entries) in &source_map {
            if !section_selected(sections, section) {
                continue;
            }
            for (key, source_value) in entries {
                let encoded_source = codec::encode_scalar(source_value);
                match (doc.raw_value(section, key), strategy) {
                    (None, _) | (Some(_), MergeStrategy::Overwrite) => {
                        doc.set_raw(section, key, &encoded_source);
                    }
                    (Some(_), MergeStrategy::Skip) => {}
                    (Some(raw), MergeStrategy::Merge) => {
                        // Raw concatenation: the target's stored text stays
                        // verbatim, the incoming value is appended encoded.
                        doc.set_raw(section, key, &format!("{raw},{encoded_source}"));
                    }
                }
            }
        }
        Ok(())
    })
}

/// Copy every (optionally filtered) section/key of `source` into `target`,
/// creating sections as needed and always overwriting on conflict.
///
/// # Errors
///
/// Guard/lock/commit failures on either file.
pub fn import(
    settings: &Settings,
    source: &Path,
    target: &Path,
    sections: Option<&[String]>,
) -> Result<()> {
    let source_map = query::section_map(settings, source)?;

    mutator::with_document(settings, target, |doc| {
        for (section, entries) in &source_map {
            if !section_selected(sections, section) {
                continue;
            }
            doc.add_section(section);
            for (key, value) in entries {
                doc.set_raw(section, key, &codec::encode_scalar(value));
            }
        }
        Ok(())
    })
}

fn section_selected(filter: Option<&[String]>, section: &str) -> bool {
    filter.is_none_or(|names| names.iter().any(|n| n == section))
}

/// Serialize the full section → key → value map as JSON.
///
/// All values are strings; sections and keys keep file order.
///
/// # Errors
///
/// Guard failures; serialization of a string map cannot fail in practice
/// but is propagated as [`IniError::Io`] if it does.
pub fn to_json(settings: &Settings, path: &Path, pretty: bool) -> Result<String> {
    let map = query::section_map(settings, path)?;

    let mut root = serde_json::Map::new();
    for (section, entries) in map {
        let mut obj = serde_json::Map::new();
        for (key, value) in entries {
            obj.insert(key, serde_json::Value::String(value));
        }
        root.insert(section, serde_json::Value::Object(obj));
    }
    let value = serde_json::Value::Object(root);

    let rendered = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    rendered.map_err(|e| IniError::io(path, e.into()))
}

/// Serialize the full section → key → value map as YAML with a
/// configurable indent width.
///
/// # Errors
///
/// Guard failures.
pub fn to_yaml(settings: &Settings, path: &Path, indent: usize) -> Result<String> {
    let map = query::section_map(settings, path)?;
    let pad = " ".repeat(indent.max(1));

    let mut out = String::new();
    for (section, entries) in map {
        out.push_str(&yaml_scalar(&section));
        out.push_str(":\n");
        for (key, value) in entries {
            out.push_str(&pad);
            out.push_str(&yaml_scalar(&key));
            out.push_str(": ");
            out.push_str(&yaml_scalar(&value));
            out.push('\n');
        }
    }
    Ok(out)
}

/// Quote a YAML scalar when it could otherwise change meaning.
fn yaml_scalar(s: &str) -> String {
    let plain_safe = !s.is_empty()
        && !s.starts_with(|c: char| c.is_whitespace() || "!&*?|>%@`\"'#-[]{}".contains(c))
        && !s.ends_with(char::is_whitespace)
        && !s.contains(": ")
        && !s.contains(" #")
        && !s.contains(&['\n', '\t', ':'][..])
        && !matches!(s, "true" | "false" | "null" | "~" | "yes" | "no")
        && s.parse::<f64>().is_err();
    if plain_safe {
        return s.to_string();
    }
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for ch in s.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

/// Export keys as environment variables named `prefix_section_key`.
///
/// Characters outside `[A-Za-z0-9_]` become `_`; derived names that still
/// fail identifier validation (e.g. a leading digit) are skipped with a
/// warning. Returns the exported pairs in file order.
///
/// This is the one operation that deliberately mutates ambient process
/// state.
///
/// # Errors
///
/// Guard failures.
pub fn to_env(
    settings: &Settings,
    path: &Path,
    prefix: &str,
    section: Option<&str>,
) -> Result<Vec<(String, String)>> {
    let map = query::section_map(settings, path)?;

    let mut exported = Vec::new();
    for (name, entries) in map {
        if let Some(wanted) = section
            && name != wanted
        {
            continue;
        }
        for (key, value) in entries {
            let ident = if prefix.is_empty() {
                sanitize_identifier(&format!("{name}_{key}"))
            } else {
                sanitize_identifier(&format!("{prefix}_{name}_{key}"))
            };
            if !is_valid_identifier(&ident) {
                tracing::warn!("skipping invalid environment identifier '{ident}'");
                continue;
            }
            // SAFETY: the engine is synchronous and single-threaded per
            // call; no other thread is reading the environment concurrently.
            #[allow(unsafe_code)]
            unsafe {
                std::env::set_var(&ident, &value);
            }
            exported.push((ident, value));
        }
    }
    Ok(exported)
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Shell-style identifier check: `[A-Za-z_][A-Za-z0-9_]*`.
fn is_valid_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
