//! Canonical cache keys.
//!
//! A cache key identifies one resource query. Two semantically equal
//! parameter sets must produce the identical key, regardless of the order
//! the parameters were supplied in and regardless of whether an empty
//! parameter was passed as `None` or as an empty string.

use std::collections::BTreeMap;
use std::fmt;

/// Opaque canonical key for one resource query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// The canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build a canonical cache key from a resource kind and parameter set.
///
/// Parameters with a `None` or empty-string value are omitted. The rest are
/// serialized with names sorted lexicographically; values are expected in
/// their canonical string form (numbers and booleans via `to_string`).
/// If the same name appears twice, the later value wins.
#[must_use]
pub fn build_key(resource: &str, params: &[(&str, Option<String>)]) -> CacheKey {
    let present: BTreeMap<&str, &str> = params
        .iter()
        .filter_map(|(name, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((*name, v)),
            _ => None,
        })
        .collect();

    if present.is_empty() {
        return CacheKey(resource.to_string());
    }

    let mut out = String::with_capacity(resource.len() + 16 * present.len());
    out.push_str(resource);
    for (i, (name, value)) in present.iter().enumerate() {
        out.push(if i == 0 { '?' } else { '&' });
        out.push_str(name);
        out.push('=');
        out.push_str(value);
    }
    CacheKey(out)
}
