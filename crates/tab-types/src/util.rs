/// Truncates a string to `max_chars` characters, appending an ellipsis when
/// truncation actually occurred. Used for audit snippets and log summaries.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(max_chars).collect();
    truncated.push('\u{2026}');
    truncated
}

/// True if `s` looks like a lowercase 64-character hex digest (sha256).
pub fn is_64_char_hex(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// `serde(with = "duration_secs")` helper: (de)serializes a `Duration` as a
/// whole number of seconds, since none of the config surfaces TAB accepts
/// need sub-second resolution.
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_string_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_long_string_adds_ellipsis() {
        assert_eq!(truncate("hello world", 5), "hello\u{2026}");
    }

    #[test]
    fn hex_check() {
        assert!(is_64_char_hex(&"a".repeat(64)));
        assert!(!is_64_char_hex(&"a".repeat(63)));
        assert!(!is_64_char_hex("not-hex-at-all-but-sixty-four-chars-long-000000000000000000000"));
    }
}
