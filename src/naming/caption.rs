// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Caption cleanup before it becomes a filename

use std::collections::HashSet;

/// Lead-in phrases stripped from the start of a caption.
///
/// Checked in order; only the first match is removed.
const LEAD_IN_PHRASES: &[&str] = &[
    "a picture of ",
    "a photo of a ",
    "a photo of an ",
    "a photo of ",
    "an image of ",
    "picture of ",
    "photo of ",
    "image of ",
    "there is a ",
    "there is an ",
    "there are ",
    "this is a ",
    "this is an ",
    "this is ",
];

/// Normalize a raw caption into an underscore-joined word list.
///
/// Lower-cases, strips one lead-in phrase, removes ASCII punctuation and
/// drops repeated words while keeping first-seen order.
pub fn normalize_caption(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let body = strip_lead_in(&lower);

    let cleaned: String = body.chars().filter(|c| !c.is_ascii_punctuation()).collect();

    let mut seen = HashSet::new();
    cleaned
        .split_whitespace()
        .filter(|word| seen.insert(*word))
        .collect::<Vec<_>>()
        .join("_")
}

fn strip_lead_in(caption: &str) -> &str {
    LEAD_IN_PHRASES
        .iter()
        .find_map(|phrase| caption.strip_prefix(*phrase))
        .unwrap_or(caption)
}
