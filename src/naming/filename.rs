// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Filename composition

use chrono::{Local, NaiveDate};
use rand::distr::Alphanumeric;
use rand::Rng;
use std::path::Path;

use super::sanitize_filename;

/// Build the new filename for a caption.
///
/// Segments are the sanitized caption, today's date when `append_date` is
/// set, and the uniqueness token, joined by underscores. `extension` is
/// appended as given and should include its leading dot.
pub fn build_filename(normalized: &str, append_date: bool, token: &str, extension: &str) -> String {
    let date = append_date.then(|| Local::now().date_naive());
    build_filename_on(normalized, date, token, extension)
}

/// Same as [`build_filename`] with an explicit date segment
pub fn build_filename_on(
    normalized: &str,
    date: Option<NaiveDate>,
    token: &str,
    extension: &str,
) -> String {
    let mut parts = Vec::with_capacity(3);

    let caption = sanitize_filename(normalized);
    if !caption.is_empty() {
        parts.push(caption);
    }
    if let Some(date) = date {
        parts.push(date.format("%Y-%m-%d").to_string());
    }
    parts.push(token.to_string());

    format!("{}{}", parts.join("_"), extension)
}

/// Generate a random alphanumeric token
pub fn uniqueness_token(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Extension of `path` with its leading dot, case preserved.
///
/// Returns an empty string when the file has no extension.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_caption_and_token() {
        assert_eq!(
            build_filename_on("cat_sitting", None, "Ab3xZ", ".jpg"),
            "cat_sitting_Ab3xZ.jpg"
        );
    }

    #[test]
    fn test_date_goes_between_caption_and_token() {
        assert_eq!(
            build_filename_on("cat_sitting", Some(date()), "Ab3xZ", ".png"),
            "cat_sitting_2024-03-09_Ab3xZ.png"
        );
    }

    #[test]
    fn test_caption_is_sanitized() {
        assert_eq!(
            build_filename_on("what? a/b", None, "tok01", ".gif"),
            "what_ab_tok01.gif"
        );
    }

    #[test]
    fn test_empty_caption_segment_is_dropped() {
        assert_eq!(build_filename_on("", None, "tok01", ".bmp"), "tok01.bmp");
        assert_eq!(
            build_filename_on("??", Some(date()), "tok01", ".bmp"),
            "2024-03-09_tok01.bmp"
        );
    }

    #[test]
    fn test_today_is_used_when_appending_date() {
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        let name = build_filename("dog", true, "t0k3n", ".jpg");
        assert!(name.contains(&today), "{} lacks {}", name, today);
        assert_eq!(build_filename("dog", false, "t0k3n", ".jpg"), "dog_t0k3n.jpg");
    }

    #[test]
    fn test_extension_kept_verbatim() {
        for original in ["photo.JPG", "photo.jpg", "scan.TIFF", "a.b.Jpeg", "img.png"] {
            let ext = dotted_extension(&PathBuf::from(original));
            let name = build_filename_on("thing", None, "abcde", &ext);
            let (_, original_ext) = original.rsplit_once('.').unwrap();
            assert!(name.ends_with(&format!(".{}", original_ext)), "{} -> {}", original, name);
        }
    }

    #[test]
    fn test_no_extension() {
        assert_eq!(dotted_extension(&PathBuf::from("README")), "");
    }

    #[test]
    fn test_token_shape() {
        let token = uniqueness_token(5);
        assert_eq!(token.len(), 5);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(uniqueness_token(0), "");
    }
}
