// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Turning captions into filenames

pub mod caption;
pub mod filename;

pub use caption::normalize_caption;
pub use filename::{build_filename, build_filename_on, uniqueness_token};

/// Characters rejected by at least one common filesystem
const ILLEGAL_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Sanitize text into a filename fragment.
///
/// Drops characters that are illegal on common filesystems and turns
/// spaces into underscores. Never fails; may return an empty string.
pub fn sanitize_filename(text: &str) -> String {
    text.chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_illegal_characters() {
        assert_eq!(sanitize_filename(r#"a\b/c*d?e:f"g<h>i|j"#), "abcdefghij");
    }

    #[test]
    fn test_spaces_become_underscores() {
        assert_eq!(sanitize_filename("red car at night"), "red_car_at_night");
    }

    #[test]
    fn test_empty_after_stripping() {
        assert_eq!(sanitize_filename("?*:|"), "");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "plain",
            "with spaces and / slashes",
            r#"<<"quoted">> : thing?"#,
            "  leading and trailing  ",
            "tabs\tstay\tput",
            "ünïcødé ok",
            "",
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_unicode_passes_through() {
        assert_eq!(sanitize_filename("café crème"), "café_crème");
    }
}
