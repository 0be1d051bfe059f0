//! Line-oriented INI scanner.
//!
//! Splits document text into classified [`Line`]s and tracks which section
//! run the cursor is inside via a small explicit [`SectionState`] machine.
//! The scanner is restartable: every engine operation re-runs it over a
//! fresh read of the file, so there is no cross-call parse state.

use crate::error::{IniError, Result};
use crate::settings::Settings;

/// UTF-8 byte-order mark, stripped from the first physical line only.
const BOM: char = '\u{feff}';

/// A classified line of an INI document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Empty or whitespace-only.
    Blank,
    /// First non-whitespace character is `#` or `;`.
    Comment,
    /// `[name]` with the inner name trimmed.
    SectionHeader(String),
    /// `key=value`; key is text before the first `=`, value after, both trimmed.
    KeyValue {
        /// Trimmed key text.
        key: String,
        /// Trimmed raw value text, still in its stored (possibly quoted) form.
        raw_value: String,
    },
    /// Anything else.
    Malformed,
}

/// Which section run the scan cursor is currently inside.
///
/// Drives every per-section operation; kept separate from the scan loop so
/// the transition logic is testable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    /// Before the first header.
    Outside,
    /// Inside the first run of the target section.
    InTarget,
    /// Inside some other section (or a later duplicate of the target).
    InOther,
}

impl SectionState {
    /// Transition on a section header line.
    ///
    /// Only the *first* occurrence of the target section opens `InTarget`;
    /// a later duplicate header is treated as another section so reads bind
    /// to the first run only.
    #[must_use]
    pub fn on_header(self, name: &str, target: &str, seen_target: bool) -> Self {
        if name == target && !seen_target {
            Self::InTarget
        } else {
            Self::InOther
        }
    }
}

/// Strip the UTF-8 BOM from the start of the document, if present.
///
/// Applies exactly once to the first physical line; BOM-like sequences
/// anywhere else in the file are ordinary content.
#[must_use]
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BOM).unwrap_or(text)
}

/// Classify a single line.
#[must_use]
pub fn classify(line: &str) -> Line {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if trimmed.starts_with('#') || trimmed.starts_with(';') {
        return Line::Comment;
    }
    if let Some(name) = parse_header(trimmed) {
        return Line::SectionHeader(name);
    }
    if let Some((key, raw_value)) = trimmed.split_once('=') {
        return Line::KeyValue {
            key: key.trim().to_string(),
            raw_value: raw_value.trim().to_string(),
        };
    }
    Line::Malformed
}

/// Iterate over a document's classified lines, BOM stripped.
///
/// Yields `(line_number, line_text, classified)` with one-based numbering.
pub fn lines(text: &str) -> impl Iterator<Item = (usize, &str, Line)> {
    strip_bom(text)
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line, classify(line)))
}

/// Parse a `[name]` header line, trimming the inner name.
///
/// An empty (or whitespace-only) inner name does not count as a header.
fn parse_header(trimmed: &str) -> Option<String> {
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    let name = inner.trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

/// Validate a section or key name against the configured mode.
///
/// # Errors
///
/// Returns [`IniError::MissingParameter`] for an empty name and
/// [`IniError::InvalidName`] for whitespace (when disallowed) or, in strict
/// mode, for `[`, `]`, `=`.
pub fn validate_name(settings: &Settings, kind: &'static str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(IniError::MissingParameter(kind));
    }
    if !settings.allow_whitespace_in_names && name.chars().any(char::is_whitespace) {
        return Err(IniError::InvalidName {
            name: name.to_string(),
            reason: "whitespace is not allowed in names".to_string(),
        });
    }
    if settings.strict_names
        && let Some(bad) = name.chars().find(|c| matches!(c, '[' | ']' | '='))
    {
        return Err(IniError::InvalidName {
            name: name.to_string(),
            reason: format!("'{bad}' is not allowed in strict mode"),
        });
    }
    Ok(())
}

/// Check a name without reporting which rule failed (validation pass).
#[must_use]
pub fn name_is_valid(settings: &Settings, name: &str) -> bool {
    validate_name(settings, "name", name).is_ok()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn classifies_blank_lines() {
        assert_eq!(classify(""), Line::Blank);
        assert_eq!(classify("   \t"), Line::Blank);
    }

    #[test]
    fn classifies_both_comment_markers() {
        assert_eq!(classify("# hash"), Line::Comment);
        assert_eq!(classify("; semicolon"), Line::Comment);
        assert_eq!(classify("  ; indented"), Line::Comment);
    }

    #[test]
    fn classifies_section_headers() {
        assert_eq!(
            classify("[app]"),
            Line::SectionHeader("app".to_string())
        );
        assert_eq!(
            classify("  [ spaced name ]  "),
            Line::SectionHeader("spaced name".to_string())
        );
    }

    #[test]
    fn empty_header_is_malformed() {
        assert_eq!(classify("[]"), Line::Malformed);
        assert_eq!(classify("[   ]"), Line::Malformed);
    }

    #[test]
    fn classifies_key_value_on_first_equals() {
        assert_eq!(
            classify("key = a=b"),
            Line::KeyValue {
                key: "key".to_string(),
                raw_value: "a=b".to_string(),
            }
        );
    }

    #[test]
    fn bare_text_is_malformed() {
        assert_eq!(classify("just some text"), Line::Malformed);
    }

    #[test]
    fn comment_precedence_beats_key_value() {
        // A comment containing '=' is still a comment.
        assert_eq!(classify("# key=value"), Line::Comment);
    }

    #[test]
    fn strips_bom_from_first_line_only() {
        let text = "\u{feff}[app]\nkey=\u{feff}value\n";
        let collected: Vec<Line> = lines(text).map(|(_, _, l)| l).collect();
        assert_eq!(collected[0], Line::SectionHeader("app".to_string()));
        // The BOM inside the value is ordinary content.
        assert_eq!(
            collected[1],
            Line::KeyValue {
                key: "key".to_string(),
                raw_value: "\u{feff}value".to_string(),
            }
        );
    }

    #[test]
    fn no_bom_is_untouched() {
        assert_eq!(strip_bom("[app]"), "[app]");
    }

    #[test]
    fn line_numbers_are_one_based() {
        let numbered: Vec<usize> = lines("[a]\nk=v\n").map(|(n, _, _)| n).collect();
        assert_eq!(numbered, vec![1, 2]);
    }

    #[test]
    fn section_state_enters_first_target_occurrence_only() {
        let s = SectionState::Outside;
        let s = s.on_header("app", "app", false);
        assert_eq!(s, SectionState::InTarget);
        // A duplicate header later in the file does not reopen the target.
        let s = s.on_header("app", "app", true);
        assert_eq!(s, SectionState::InOther);
    }

    #[test]
    fn section_state_other_sections() {
        let s = SectionState::Outside.on_header("db", "app", false);
        assert_eq!(s, SectionState::InOther);
    }

    #[test]
    fn validate_name_rejects_empty() {
        let err = validate_name(&Settings::default(), "section", "").unwrap_err();
        assert!(matches!(err, IniError::MissingParameter("section")));
    }

    #[test]
    fn validate_name_rejects_whitespace_by_default() {
        let err = validate_name(&Settings::default(), "key", "a b").unwrap_err();
        assert!(matches!(err, IniError::InvalidName { .. }));
    }

    #[test]
    fn validate_name_allows_whitespace_when_configured() {
        let mut s = Settings::default();
        s.allow_whitespace_in_names = true;
        validate_name(&s, "key", "a b").unwrap();
    }

    #[test]
    fn strict_mode_rejects_brackets_and_equals() {
        let s = Settings::strict();
        for name in ["a[b", "a]b", "a=b"] {
            let err = validate_name(&s, "key", name).unwrap_err();
            assert!(matches!(err, IniError::InvalidName { .. }), "{name}");
        }
    }

    #[test]
    fn non_strict_mode_accepts_brackets() {
        validate_name(&Settings::default(), "key", "a[b]c").unwrap();
    }
}
