//! In-memory line transforms used to stage mutations.
//!
//! A [`Document`] is the ordered line sequence of one INI file, read fresh
//! for every operation. The transforms here are pure: they edit the line
//! vector and leave every line not subject to the edit untouched, in
//! original order. The atomic mutator renders the result into a temporary
//! file and swaps it in.

use crate::scanner::{self, Line, SectionState};

/// Ordered lines of an INI file, BOM stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    /// Parse document text into lines.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            lines: scanner::strip_bom(text).lines().map(ToString::to_string).collect(),
        }
    }

    /// Render back to file text, newline-terminated when non-empty.
    #[must_use]
    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Borrow the raw lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Index of the first header line for `section`, if any.
    #[must_use]
    pub fn header_index(&self, section: &str) -> Option<usize> {
        self.run_bounds(section).map(|(header, _)| header)
    }

    /// Bounds of the first run of `section`: `(header_index, end_exclusive)`.
    ///
    /// Scans the lines through [`SectionState`]: the run opens at the first
    /// matching header and closes at the next header line (a duplicate of
    /// the same name included) or end of file.
    #[must_use]
    pub fn run_bounds(&self, section: &str) -> Option<(usize, usize)> {
        let mut state = SectionState::Outside;
        let mut seen_target = false;
        let mut header = None;

        for (idx, line) in self.lines.iter().enumerate() {
            if let Line::SectionHeader(name) = scanner::classify(line) {
                let next = state.on_header(&name, section, seen_target);
                if next == SectionState::InTarget {
                    header = Some(idx);
                    seen_target = true;
                } else if state == SectionState::InTarget {
                    return header.map(|h| (h, idx));
                }
                state = next;
            }
        }
        header.map(|h| (h, self.lines.len()))
    }

    /// Index within the first run of `section` of the first line whose key
    /// matches `key`.
    #[must_use]
    pub fn key_index(&self, section: &str, key: &str) -> Option<usize> {
        let (header, end) = self.run_bounds(section)?;
        self.lines[header + 1..end]
            .iter()
            .position(|l| matches!(scanner::classify(l), Line::KeyValue { key: k, .. } if k == key))
            .map(|offset| header + 1 + offset)
    }

    /// Raw stored value of `key` within the first run of `section`.
    #[must_use]
    pub fn raw_value(&self, section: &str, key: &str) -> Option<String> {
        let idx = self.key_index(section, key)?;
        match scanner::classify(&self.lines[idx]) {
            Line::KeyValue { raw_value, .. } => Some(raw_value),
            _ => None,
        }
    }

    /// Append a `[section]` header unless one already exists.
    ///
    /// Idempotent: a second call (or a pre-existing header) never creates a
    /// duplicate. Returns `true` when the header was added.
    pub fn add_section(&mut self, section: &str) -> bool {
        if self.header_index(section).is_some() {
            return false;
        }
        if let Some(last) = self.lines.last()
            && !last.trim().is_empty()
        {
            self.lines.push(String::new());
        }
        self.lines.push(format!("[{section}]"));
        true
    }

    /// Set `key` to the given raw (already encoded) value within `section`.
    ///
    /// Replaces the key's line in place when present; otherwise appends the
    /// pair as the last non-blank line of the section run, creating the
    /// section first when absent. Last write wins; read order is unchanged
    /// for all other lines.
    pub fn set_raw(&mut self, section: &str, key: &str, raw_value: &str) {
        self.add_section(section);

        if let Some(idx) = self.key_index(section, key) {
            self.lines[idx] = format!("{key}={raw_value}");
            return;
        }

        // Insert after the last non-blank line of the run so blank
        // separators between sections stay where they were.
        let Some((header, end)) = self.run_bounds(section) else {
            // add_section above guarantees the run exists.
            return;
        };
        let insert_at = self.lines[header + 1..end]
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .map_or(header + 1, |offset| header + 1 + offset + 1);
        self.lines.insert(insert_at, format!("{key}={raw_value}"));
    }

    /// Remove the first run of `section`, header included.
    ///
    /// Removing an absent section is a no-op; returns whether anything was
    /// removed.
    pub fn remove_section(&mut self, section: &str) -> bool {
        let Some((header, end)) = self.run_bounds(section) else {
            return false;
        };
        self.lines.drain(header..end);
        true
    }

    /// Remove the first line matching `key` within the first run of `section`.
    ///
    /// Absence is a no-op; returns whether a line was removed.
    pub fn remove_key(&mut self, section: &str, key: &str) -> bool {
        let Some(idx) = self.key_index(section, key) else {
            return false;
        };
        self.lines.remove(idx);
        true
    }

    /// Rewrite the first header of `old` to `new`, leaving member lines alone.
    ///
    /// Preconditions (old exists, new absent) are checked by the caller.
    pub fn rename_section(&mut self, old: &str, new: &str) -> bool {
        let Some(idx) = self.header_index(old) else {
            return false;
        };
        self.lines[idx] = format!("[{new}]");
        true
    }

    /// Keys of the first run of `section`, in file order.
    #[must_use]
    pub fn keys(&self, section: &str) -> Vec<String> {
        let Some((header, end)) = self.run_bounds(section) else {
            return Vec::new();
        };
        self.lines[header + 1..end]
            .iter()
            .filter_map(|l| match scanner::classify(l) {
                Line::KeyValue { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    /// Re-serialize the whole document.
    ///
    /// Sections keep their original order. Comments immediately preceding a
    /// header stay attached above it; other comments in a run are emitted
    /// after the header, before the keys. Keys are optionally sorted,
    /// headers optionally indented by `indent` spaces, and sections are
    /// separated by exactly one blank line.
    pub fn format(&mut self, indent: usize, sort_keys: bool) {
        let mut preamble: Vec<String> = Vec::new();
        let mut sections: Vec<FormatSection> = Vec::new();
        // Contiguous comments not yet attached to a header or section body.
        let mut pending_comments: Vec<String> = Vec::new();

        for line in &self.lines {
            match scanner::classify(line) {
                Line::Blank => {
                    // Blank lines detach a comment block from the next header.
                    if let Some(section) = sections.last_mut() {
                        section.body.append(&mut pending_comments);
                    } else {
                        preamble.append(&mut pending_comments);
                    }
                }
                Line::Comment => pending_comments.push(line.trim().to_string()),
                Line::SectionHeader(name) => sections.push(FormatSection {
                    name,
                    leading: std::mem::take(&mut pending_comments),
                    body: Vec::new(),
                    keys: Vec::new(),
                }),
                Line::KeyValue { key, raw_value } => {
                    if let Some(section) = sections.last_mut() {
                        section.body.append(&mut pending_comments);
                        section.keys.push((key, raw_value));
                    } else {
                        preamble.append(&mut pending_comments);
                        preamble.push(line.trim().to_string());
                    }
                }
                // Malformed lines survive formatting verbatim.
                Line::Malformed => {
                    if let Some(section) = sections.last_mut() {
                        section.body.append(&mut pending_comments);
                        section.body.push(line.trim().to_string());
                    } else {
                        preamble.append(&mut pending_comments);
                        preamble.push(line.trim().to_string());
                    }
                }
            }
        }
        if let Some(section) = sections.last_mut() {
            section.body.append(&mut pending_comments);
        } else {
            preamble.append(&mut pending_comments);
        }

        let pad = " ".repeat(indent);
        let mut out: Vec<String> = Vec::new();
        out.extend(preamble);

        for mut section in sections {
            if !out.is_empty() {
                out.push(String::new());
            }
            out.extend(section.leading);
            out.push(format!("{pad}[{}]", section.name));
            out.extend(section.body);
            if sort_keys {
                section.keys.sort_by(|a, b| a.0.cmp(&b.0));
            }
            for (key, raw_value) in section.keys {
                out.push(format!("{key}={raw_value}"));
            }
        }

        self.lines = out;
    }
}

/// Working state for one section during [`Document::format`].
#[derive(Debug)]
struct FormatSection {
    name: String,
    leading: Vec<String>,
    body: Vec<String>,
    keys: Vec<(String, String)>,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn parse_render_round_trip() {
        let text = "[app]\nname=X\n\n[db]\nhost=localhost\n";
        assert_eq!(Document::parse(text).render(), text);
    }

    #[test]
    fn empty_document_renders_empty() {
        assert_eq!(Document::parse("").render(), "");
    }

    #[test]
    fn add_section_is_idempotent() {
        let mut doc = Document::parse("");
        assert!(doc.add_section("app"));
        assert!(!doc.add_section("app"));
        let headers = doc
            .lines()
            .iter()
            .filter(|l| l.as_str() == "[app]")
            .count();
        assert_eq!(headers, 1);
    }

    #[test]
    fn add_section_separates_with_blank_line() {
        let mut doc = Document::parse("[app]\nname=X\n");
        doc.add_section("db");
        assert_eq!(doc.render(), "[app]\nname=X\n\n[db]\n");
    }

    #[test]
    fn set_raw_creates_section_and_key() {
        let mut doc = Document::parse("");
        doc.set_raw("app", "name", "X");
        assert_eq!(doc.render(), "[app]\nname=X\n");
    }

    #[test]
    fn set_raw_replaces_in_place() {
        let mut doc = Document::parse("[app]\nname=X\nport=1\n");
        doc.set_raw("app", "name", "Y");
        assert_eq!(doc.render(), "[app]\nname=Y\nport=1\n");
    }

    #[test]
    fn set_raw_appends_before_next_section() {
        let mut doc = Document::parse("[app]\nname=X\n\n[db]\nhost=h\n");
        doc.set_raw("app", "port", "8080");
        assert_eq!(doc.render(), "[app]\nname=X\nport=8080\n\n[db]\nhost=h\n");
    }

    #[test]
    fn set_raw_binds_to_first_duplicate_run_only() {
        let mut doc = Document::parse("[app]\na=1\n[app]\nb=2\n");
        doc.set_raw("app", "c", "3");
        assert_eq!(doc.render(), "[app]\na=1\nc=3\n[app]\nb=2\n");
    }

    #[test]
    fn run_bounds_close_at_next_header_or_eof() {
        let doc = Document::parse("[app]\na=1\n[app]\nb=2\n[db]\nh=x\n");
        assert_eq!(doc.run_bounds("app"), Some((0, 2)));
        assert_eq!(doc.run_bounds("db"), Some((4, 6)));
        assert_eq!(doc.run_bounds("ghost"), None);
    }

    #[test]
    fn run_bounds_for_section_after_others() {
        let doc = Document::parse("[db]\nh=x\n[app]\na=1\n");
        assert_eq!(doc.run_bounds("app"), Some((2, 4)));
        assert_eq!(doc.header_index("app"), Some(2));
    }

    #[test]
    fn remove_section_takes_whole_run() {
        let mut doc = Document::parse("[app]\nname=X\n# note\n\n[db]\nhost=h\n");
        assert!(doc.remove_section("app"));
        assert_eq!(doc.render(), "[db]\nhost=h\n");
    }

    #[test]
    fn remove_absent_section_is_noop() {
        let mut doc = Document::parse("[app]\nname=X\n");
        assert!(!doc.remove_section("db"));
        assert_eq!(doc.render(), "[app]\nname=X\n");
    }

    #[test]
    fn remove_key_leaves_rest_of_run() {
        let mut doc = Document::parse("[app]\nname=X\nport=1\n");
        assert!(doc.remove_key("app", "name"));
        assert_eq!(doc.render(), "[app]\nport=1\n");
    }

    #[test]
    fn remove_key_only_in_target_section() {
        let mut doc = Document::parse("[app]\nname=X\n[db]\nname=Y\n");
        assert!(doc.remove_key("db", "name"));
        assert_eq!(doc.render(), "[app]\nname=X\n[db]\n");
    }

    #[test]
    fn rename_section_touches_header_only() {
        let mut doc = Document::parse("[app]\nname=X\n");
        assert!(doc.rename_section("app", "service"));
        assert_eq!(doc.render(), "[service]\nname=X\n");
    }

    #[test]
    fn keys_in_file_order() {
        let doc = Document::parse("[app]\nzeta=1\nalpha=2\n");
        assert_eq!(doc.keys("app"), vec!["zeta", "alpha"]);
    }

    #[test]
    fn raw_value_first_match_wins() {
        let doc = Document::parse("[app]\nname=first\nname=second\n");
        assert_eq!(doc.raw_value("app", "name").unwrap(), "first");
    }

    #[test]
    fn format_sorts_keys_when_asked() {
        let mut doc = Document::parse("[app]\nzeta=1\nalpha=2\n[db]\nhost=h\n");
        doc.format(0, true);
        assert_eq!(
            doc.render(),
            "[app]\nalpha=2\nzeta=1\n\n[db]\nhost=h\n"
        );
    }

    #[test]
    fn format_indents_headers() {
        let mut doc = Document::parse("[app]\nname=X\n");
        doc.format(2, false);
        assert_eq!(doc.render(), "  [app]\nname=X\n");
    }

    #[test]
    fn format_keeps_leading_comments_attached() {
        let mut doc = Document::parse("# about app\n[app]\nname=X\n\n\n[db]\nhost=h\n");
        doc.format(0, false);
        assert_eq!(
            doc.render(),
            "# about app\n[app]\nname=X\n\n[db]\nhost=h\n"
        );
    }

    #[test]
    fn format_normalises_section_separation() {
        let mut doc = Document::parse("[a]\nk=1\n\n\n\n[b]\nj=2\n");
        doc.format(0, false);
        assert_eq!(doc.render(), "[a]\nk=1\n\n[b]\nj=2\n");
    }
}
