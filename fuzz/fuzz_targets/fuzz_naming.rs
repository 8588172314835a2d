// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use ainamify::naming::{build_filename_on, normalize_caption, sanitize_filename};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    caption: &'a str,
    extension: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let once = sanitize_filename(input.caption);
    assert_eq!(sanitize_filename(&once), once);

    let normalized = normalize_caption(input.caption);
    assert!(!normalized.contains(char::is_whitespace));

    let extension = format!(".{}", sanitize_filename(input.extension));
    let name = build_filename_on(&normalized, None, "AbC12", &extension);
    assert!(name.ends_with(&extension));
    assert!(!name.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|']));
});
