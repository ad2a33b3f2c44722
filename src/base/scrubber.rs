//! Removes IP addresses from error messages.
//!
//! Unclassified errors end up verbatim in measurement results, so anything
//! that looks like an endpoint (IPv4, IPv6, with or without a port) is
//! replaced with `[scrubbed]` first.

use regex::Regex;
use std::sync::LazyLock;

const SCRUBBED: &str = "[scrubbed]";

struct Pattern {
    regex: Regex,
    replacement: &'static str,
}

static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    [
        // [v6]:port and [v6]
        (r"\[[0-9A-Za-z:.%]*:[0-9A-Za-z:.%]*\](?::\d{1,5})?", SCRUBBED),
        // v4-mapped and v4-embedded, e.g. ::ffff:1.2.3.4 and 64:ff9b::1.2.3.4
        (
            r"(?:\b[0-9A-Fa-f]{1,4}|:)(?::[0-9A-Fa-f]{0,4}){1,6}:(?:\d{1,3}\.){3}\d{1,3}\b",
            SCRUBBED,
        ),
        // full eight-group form
        (
            r"\b(?:[0-9A-Fa-f]{1,4}:){7}[0-9A-Fa-f]{1,4}\b(?:%[0-9A-Za-z_.\-]+)?",
            SCRUBBED,
        ),
        // compressed forms with a leading group
        (
            r"\b(?:[0-9A-Fa-f]{1,4}:){1,7}(?::[0-9A-Fa-f]{1,4}){1,7}\b(?:%[0-9A-Za-z_.\-]+)?",
            SCRUBBED,
        ),
        // compressed forms ending in ::, e.g. fe80:: and 2001:db8::
        (
            r"\b(?:[0-9A-Fa-f]{1,4}:){1,7}:(?:%[0-9A-Za-z_.\-]+)?($|[^0-9A-Za-z:%])",
            "[scrubbed]${1}",
        ),
        // compressed forms starting with ::
        (
            r#"(^|[\s(="',])::(?:[0-9A-Fa-f]{1,4}:){0,6}[0-9A-Fa-f]{1,4}\b(?:%[0-9A-Za-z_.\-]+)?"#,
            "${1}[scrubbed]",
        ),
        // the unspecified address on its own
        (r#"(^|[\s(="',])::($|[\s)"',.;])"#, "${1}[scrubbed]${2}"),
        // v4 and v4:port
        (r"\b(?:\d{1,3}\.){3}\d{1,3}(?::\d{1,5})?\b", SCRUBBED),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| {
        Regex::new(pattern)
            .map(|regex| Pattern { regex, replacement })
            .map_err(|e| tracing::error!(pattern, error = %e, "invalid scrubber pattern"))
            .ok()
    })
    .collect()
});

/// Replaces every IP-address-shaped substring of `message` with `[scrubbed]`.
pub fn scrub(message: &str) -> String {
    let mut out = message.to_string();
    for pattern in PATTERNS.iter() {
        out = pattern
            .regex
            .replace_all(&out, pattern.replacement)
            .into_owned();
    }
    out
}
