use std::borrow::Cow;

const REDACTED: &str = "REDACTED";

/// Short, non-reversible description of a credential for debug logs.
pub fn token_preview(token: &str) -> String {
    let head: String = token.chars().take(4).collect();
    format!("{head}..({} chars)", token.chars().count())
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let nee = needle.as_bytes();
    if nee.is_empty() || nee.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - nee.len()).find(|&i| hay[i..i + nee.len()].eq_ignore_ascii_case(nee))
}

/// Replaces the token following every `Bearer ` marker.
fn redact_bearer_values(text: &str) -> String {
    const MARKER: &str = "bearer ";
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = find_ascii_case_insensitive(rest, MARKER) {
        let end = idx + MARKER.len();
        out.push_str(&rest[..end]);
        rest = &rest[end..];

        let consumed = rest
            .char_indices()
            .find(|(_, ch)| ch.is_whitespace() || *ch == '"' || *ch == ',' || *ch == ';')
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if consumed > 0 {
            out.push_str(REDACTED);
        }
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    out
}

/// Replaces everything after a header name up to the end of its line.
fn redact_header_line(text: &str, header: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = find_ascii_case_insensitive(rest, header) {
        let end = idx + header.len();
        out.push_str(&rest[..end]);
        rest = &rest[end..];

        if rest.starts_with(' ') {
            out.push(' ');
            rest = &rest[1..];
        }

        let consumed = rest.find(['\n', '\r']).unwrap_or(rest.len());
        out.push_str(REDACTED);
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    out
}

pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    let mut value = redact_bearer_values(input);
    // Set-Cookie contains "cookie:", so one pass covers both headers.
    value = redact_header_line(&value, "cookie:");

    if value == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(value)
    }
}
