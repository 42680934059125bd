//! MIME type matching on the essence (`type/subtype`) of a `content-type` header.

use bridge_traits::storage::ObjectMetadata;

/// Lowercased `type/subtype` with any `; charset=...` parameters removed.
///
/// Empty when the header is absent or blank.
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Essence of the object's `content-type` header, if present and non-empty.
pub fn content_type_of(metadata: &ObjectMetadata) -> Option<String> {
    metadata
        .content_type()
        .map(mime_essence)
        .filter(|essence| !essence.is_empty())
}

pub fn is_one_of(metadata: &ObjectMetadata, supported: &[&str]) -> bool {
    content_type_of(metadata).is_some_and(|essence| supported.contains(&essence.as_str()))
}
