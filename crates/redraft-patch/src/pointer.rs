//! JSON Pointer (RFC 6901) path formatting.

use std::borrow::Cow;

/// Decodes one reference token (`~1` is `/`, `~0` is `~`).
pub fn unescape_component(token: &str) -> Cow<'_, str> {
    match token.contains('~') {
        // ~1 first, otherwise "~01" would turn into "/"
        true => Cow::Owned(token.replace("~1", "/").replace("~0", "~")),
        false => Cow::Borrowed(token),
    }
}

/// Encodes one reference token.
pub fn escape_component(token: &str) -> Cow<'_, str> {
    if !token.contains(['/', '~']) {
        return Cow::Borrowed(token);
    }
    let mut out = String::with_capacity(token.len() + 2);
    for ch in token.chars() {
        match ch {
            '~' => out.push_str("~0"),
            '/' => out.push_str("~1"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Parse a JSON Pointer string into path components.
///
/// The empty pointer addresses the root and parses to an empty path.
pub fn parse_json_pointer(pointer: &str) -> Vec<String> {
    match pointer.strip_prefix('/') {
        None => Vec::new(),
        Some(rest) => rest.split('/').map(|t| unescape_component(t).into_owned()).collect(),
    }
}

/// Format path components into a JSON Pointer string.
pub fn format_json_pointer(path: &[String]) -> String {
    path.iter().fold(String::new(), |mut out, token| {
        out.push('/');
        out.push_str(&escape_component(token));
        out
    })
}
