//! Short name wildcard matching.
//!
//! Patterns may contain `*` anywhere, e.g. `party.customer*`, `*.pet` or
//! `act.*`. A pattern without wildcards must match exactly.

/// Returns true if `short_name` matches `pattern`.
pub fn matches(pattern: &str, short_name: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == short_name;
    }

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = short_name.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        return true;
    };

    for part in middle {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

/// Returns true if `short_name` matches any of `patterns`.
pub fn is_a(short_name: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| matches(p, short_name))
}
