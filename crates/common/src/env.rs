//! Environment lookup helpers

/// Read an environment variable, treating unset, non-UTF-8, and blank values
/// alike as absent.
pub fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
