// ABOUTME: Shared utility functions for REVV
// ABOUTME: ID generation and small string helpers

/// Generate a prefixed unique ID, e.g. `ro-V1StGXR8_Z5jdHi6B-myT`
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!())
}

/// Trim a string and drop it entirely when nothing is left
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
