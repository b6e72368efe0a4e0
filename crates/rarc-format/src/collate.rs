//! Directory entry ordering
//!
//! Shipped archives list siblings in byte order except that `_` sorts after
//! every letter, so `econt` precedes `e_dn`. The key substitutes `_` with
//! `{`, the first code point after `z`, and the stored name stays untouched.

use std::cmp::Ordering;

/// Replacement for `_` in collation keys (`'z' + 1`)
pub const UNDERSCORE_SORT_CHAR: char = '{';

/// Build the sort key for a name
pub fn collation_key(name: &str) -> String {
    name.chars().map(sort_char).collect()
}

fn sort_char(c: char) -> char {
    if c == '_' { UNDERSCORE_SORT_CHAR } else { c }
}

/// Compare two names in archive order
pub fn collate(a: &str, b: &str) -> Ordering {
    a.chars().map(sort_char).cmp(b.chars().map(sort_char))
}
