use std::path::PathBuf;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as-is by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Expands a leading `~` in a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(path),
    }
}

/// Percent-encodes a value for use inside a URL query or path segment.
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Cuts `value` to at most `max` characters, appending `...` when something was dropped.
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("data/fish.json"), PathBuf::from("data/fish.json"));
        assert_eq!(expand_tilde("~user/x"), PathBuf::from("~user/x"));
    }

    #[test]
    fn test_expand_tilde_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/.heartopia"), home.join(".heartopia"));
            assert_eq!(expand_tilde("~"), home);
        }
    }

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("T"), "T");
        assert_eq!(encode_uri_component("Ñ"), "%C3%91");
        assert_eq!(encode_uri_component("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("corto", 50), "corto");
        let long = "á".repeat(60);
        let cut = truncate_chars(&long, 50);
        assert_eq!(cut.chars().count(), 53);
        assert!(cut.ends_with("..."));
    }
}
