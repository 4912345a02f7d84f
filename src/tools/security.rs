//! Argument-level security checks
//!
//! Pure, total validators for the two caller-supplied token forms that reach
//! a backend: relative filesystem paths and SQL identifiers.
//!
//! Path tokens are checked segment by segment rather than by substring:
//! - `/` and `\` both split segments
//! - root markers: leading separator, drive prefix (`C:`), leading `~`
//! - parent segments: `..`, including percent-encoded forms (`%2e%2e`)
//! - a final pass over `Path::components()` catches anything platform-specific

use std::path::{Component, Path};

/// Check a caller-supplied relative path token
pub fn validate_path(token: &str) -> bool {
    if token.is_empty() || token.contains('\0') {
        return false;
    }

    if has_root_marker(token) {
        return false;
    }

    if token
        .split(|c| c == '/' || c == '\\')
        .any(is_parent_segment)
    {
        return false;
    }

    Path::new(token).components().all(|component| {
        !matches!(
            component,
            Component::RootDir | Component::Prefix(_) | Component::ParentDir
        )
    })
}

/// Check a SQL identifier token against `^[A-Za-z_][A-Za-z0-9_]*$`
pub fn validate_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn has_root_marker(token: &str) -> bool {
    if token.starts_with('/') || token.starts_with('\\') || token.starts_with('~') {
        return true;
    }

    // Drive prefix such as `C:` or `c:\`
    let bytes = token.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn is_parent_segment(segment: &str) -> bool {
    if segment == ".." {
        return true;
    }

    if !segment.contains('%') {
        return false;
    }

    percent_decode(segment).as_deref() == Some("..")
}

/// Decode `%XX` escapes; returns None on a malformed escape
fn percent_decode(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = segment.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(decoded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_accepts_plain_relative_paths() {
        for path in ["data.db", "a/b/c.txt", "./notes.md", "dir/", ".hidden", "a..b/c"] {
            assert!(validate_path(path), "should accept: {}", path);
        }
    }

    #[test]
    fn test_rejects_empty_and_absolute() {
        for path in ["", "/etc/passwd", "\\windows", "C:\\x", "c:relative", "~/secrets"] {
            assert!(!validate_path(path), "should reject: {}", path);
        }
    }

    #[test]
    fn test_rejects_parent_segments_anywhere() {
        let attempts = [
            "..",
            "../x",
            "a/..",
            "a/../../b",
            "a/b/../c",
            "a\\..\\b",
            "./../../",
            "%2e%2e/etc",
            "a/%2E%2e/b",
            "a/.%2e",
        ];

        for attempt in attempts {
            assert!(!validate_path(attempt), "should reject: {}", attempt);
        }
    }

    #[test]
    fn test_rejects_nul_byte() {
        assert!(!validate_path("a\0b"));
    }

    #[test]
    fn test_malformed_escape_is_plain_name() {
        assert!(validate_path("100%"));
        assert!(validate_path("a/%zz"));
    }

    #[test]
    fn test_identifier_accepts() {
        for name in ["users", "_tmp", "T1", "order_items_2024"] {
            assert!(validate_identifier(name), "should accept: {}", name);
        }
    }

    #[test]
    fn test_identifier_rejects() {
        for name in ["", "1users", "users; DROP TABLE x", "a-b", "na me", "tab\"le", "é"] {
            assert!(!validate_identifier(name), "should reject: {}", name);
        }
    }

    #[quickcheck]
    fn prop_parent_segment_always_rejected(prefix: Vec<String>, suffix: Vec<String>) -> bool {
        let clean = |parts: Vec<String>| -> Vec<String> {
            parts
                .into_iter()
                .map(|p| p.replace(['/', '\\', '\0'], ""))
                .filter(|p| !p.is_empty())
                .collect()
        };

        let mut segments = clean(prefix);
        segments.push("..".to_string());
        segments.extend(clean(suffix));

        !validate_path(&segments.join("/"))
    }

    #[quickcheck]
    fn prop_identifier_matches_pattern(token: String) -> bool {
        let expected = !token.is_empty()
            && token
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
            && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

        validate_identifier(&token) == expected
    }
}
