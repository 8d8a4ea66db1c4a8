//! Specificity ordering for local-config patterns.
//!
//! Longer patterns sort first; equal lengths sort by ascending bytes so the
//! order is the same on every run.

use std::cmp::Ordering;

/// Compare two patterns by priority.
pub fn compare(a: &str, b: &str) -> Ordering {
    b.len().cmp(&a.len()).then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

/// Sort patterns in place, highest priority first.
pub fn sort<S: AsRef<str>>(patterns: &mut [S]) {
    patterns.sort_by(|a, b| compare(a.as_ref(), b.as_ref()));
}
