//! Attribute names and attribute tables

use std::collections::{BTreeMap, BTreeSet};

/// Normalized attribute name -> deduplicated raw values.
///
/// Sorted containers make the representative value of a set (its first,
/// lexicographically smallest element) deterministic.
pub type AttributeTable = BTreeMap<String, BTreeSet<String>>;

/// Full normalization: case-folded, whitespace, underscores and digits removed
pub fn normalize_attribute(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| !c.is_whitespace() && *c != '_' && !c.is_ascii_digit())
        .collect()
}

/// Light normalization: like [`normalize_attribute`] but digits are kept,
/// so repeated fields (`spouse1`, `spouse2`) stay distinct
pub fn normalize_attribute_light(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect()
}
