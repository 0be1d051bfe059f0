//! Scalar and array value encoding.
//!
//! Stored values are quoted only when they have to be: a scalar containing
//! whitespace, a comma, or a quote character is wrapped in double quotes
//! with embedded `"` escaped as `\"`. Arrays are comma-joined scalar
//! encodings, split back with a quote-aware scan.

/// Encode a scalar for storage.
///
/// Values containing whitespace, a comma, or a quote are quoted with
/// embedded quotes escaped; everything else is stored verbatim.
#[must_use]
pub fn encode_scalar(value: &str) -> String {
    if !needs_quoting(value) {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '"' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Decode a stored scalar.
///
/// Trims, then strips matching surrounding double quotes. Inside the
/// quotes only the two-character sequence `\"` is an escape; every other
/// backslash is literal content, mirroring what [`encode_scalar`] emits.
/// Unquoted text is returned trimmed, verbatim.
#[must_use]
pub fn decode_scalar(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(inner) = unwrap_quotes(trimmed) else {
        return trimmed.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&'"') {
            out.push('"');
            chars.next();
        } else {
            out.push(ch);
        }
    }
    out
}

/// Encode an array of scalars as a comma-joined list.
#[must_use]
pub fn encode_array(elements: &[String]) -> String {
    elements
        .iter()
        .map(|e| encode_scalar(e))
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a stored array value with a quote-aware split.
///
/// Commas inside quoted segments do not split; an escaped quote (`\"`)
/// does not toggle quote state, while a backslash not followed by a quote
/// is ordinary content. A trailing unterminated quoted segment is still
/// emitted as the last element rather than reported as an error.
#[must_use]
pub fn decode_array(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut elements = Vec::new();
    let mut segment = String::new();
    let mut in_quotes = false;
    let mut chars = trimmed.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            // Escaped quote: keep the encoded pair in the segment for the
            // scalar decode, without toggling quote state.
            '\\' if chars.peek() == Some(&'"') => {
                segment.push('\\');
                segment.push('"');
                chars.next();
            }
            '"' => {
                in_quotes = !in_quotes;
                segment.push(ch);
            }
            ',' if !in_quotes => {
                elements.push(decode_scalar(&segment));
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }
    // Lenient tail: close an unterminated quoted segment so it still
    // decodes as the last element.
    if in_quotes {
        segment.push('"');
    }
    elements.push(decode_scalar(&segment));
    elements
}

/// Whether a scalar needs the quoted form.
fn needs_quoting(value: &str) -> bool {
    value.chars().any(|c| c.is_whitespace() || c == ',' || c == '"')
}

/// Strip one layer of matching surrounding double quotes.
fn unwrap_quotes(trimmed: &str) -> Option<&str> {
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        Some(&trimmed[1..trimmed.len() - 1])
    } else {
        None
    }
}
