const FENCE: &str = "```";

/// Remove a fenced-block wrapper (```` ```json ... ``` ````) from raw model output.
///
/// Either delimiter may be missing. Stripping repeats until nothing changes, so
/// applying it to its own output is a no-op.
pub fn strip_envelope(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_once(text: &str) -> String {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix(FENCE) {
        body = strip_language_tag(rest);
    }
    if let Some(rest) = body.strip_suffix(FENCE) {
        body = rest;
    }
    body.trim().to_string()
}

/// A tag counts only when it ends the opening line; `json` is also accepted glued to the payload.
fn strip_language_tag(rest: &str) -> &str {
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
        .unwrap_or(rest.len());
    if tag_len == 0 {
        return rest;
    }

    let (tag, after) = rest.split_at(tag_len);
    if after.is_empty() || after.starts_with('\n') || after.starts_with("\r\n") {
        return after;
    }
    if tag.len() >= 4 && tag[..4].eq_ignore_ascii_case("json") {
        return &rest[4..];
    }
    rest
}
