//! Path tokenization.
//!
//! Both route patterns and request targets are reduced to segment lists
//! before they touch the tree. Splitting is total: any string yields a
//! (possibly empty) list, and a bare `/` or empty string yields the empty
//! list, which addresses the tree root.

/// Split a path into its non-empty segments.
pub(crate) fn split(path: &str) -> Vec<&str> {
    path.trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parameter name of a `:name` segment, if it is one.
pub(crate) fn param_name(segment: &str) -> Option<&str> {
    segment.strip_prefix(':')
}
