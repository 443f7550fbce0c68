//! Path normalization for picker-reported file paths.
//!
//! File pickers report paths with platform baggage: percent-encoded
//! characters, backslash separators, drive-letter or URI-scheme prefixes,
//! and storage-container segments (`storage/emulated/0/...`) that mean
//! nothing inside a repository. Normalization reduces such a path to the
//! repository-relative layout the user intended.

use percent_encoding::percent_decode_str;

/// Leading segments pickers prepend that a repository never wants.
///
/// Matched case-insensitively. Purely numeric segments (volume ids) are
/// stripped by the same rule.
const CONTAINER_SEGMENTS: &[&str] = &[
    "tree", "document", "primary", "home", "storage", "emulated", "0", "myfiles", "documents",
    "download", "raw", "msf", "external",
];

/// Normalizes a raw picker-reported path to a repository-relative path.
///
/// Deterministic and I/O-free. The result may be empty; callers must treat
/// an empty result as an invalid selection rather than upload to the
/// repository root.
///
/// Container segments are stripped only from the front, and only while a
/// tail remains; nested structure beneath the dropped root is preserved.
/// When more than one segment survives, one extra leading segment goes:
/// the picker wraps the whole selection in a synthetic top-level folder,
/// and the user wants that folder's contents, not the folder itself.
pub fn normalize(raw: &str) -> String {
    let decoded = percent_decode_str(raw)
        .decode_utf8_lossy()
        .replace('\\', "/");

    // Drive letters and URI schemes: only the suffix after the last colon
    // names a real path.
    let decoded = match decoded.rfind(':') {
        Some(idx) => &decoded[idx + 1..],
        None => decoded.as_str(),
    };

    let mut segments: Vec<&str> = decoded
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    while segments.len() > 1 {
        let first = segments[0].to_ascii_lowercase();
        let container = CONTAINER_SEGMENTS.contains(&first.as_str())
            || first.chars().all(|c| c.is_ascii_digit());
        if !container {
            break;
        }
        segments.remove(0);
    }

    if segments.len() > 1 {
        segments.remove(0);
    }

    segments.join("/")
}

/// Joins an optional target directory onto a normalized path.
pub fn destination(normalized: &str, target_dir: Option<&str>) -> String {
    match target_dir.map(|d| d.trim_matches('/')).filter(|d| !d.is_empty()) {
        Some(dir) => format!("{dir}/{normalized}"),
        None => normalized.to_string(),
    }
}
