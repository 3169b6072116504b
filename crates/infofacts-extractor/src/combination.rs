//! Combination resolver
//!
//! Expands synthetic attributes from substitution templates such as
//! `<birthyear>-<birthmonth>-<birthday>`. A rule either resolves fully or
//! is skipped; no partial values are ever inserted.

use infofacts_core::{
    normalize_attribute, normalize_attribute_light, AttributeTable, CombinationRule,
    TemplateSegment,
};

use crate::reader::AttributeTables;

/// Counts of applied and skipped rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombinationReport {
    pub applied: usize,
    pub skipped: usize,
}

impl CombinationReport {
    fn add(&mut self, other: CombinationReport) {
        self.applied += other.applied;
        self.skipped += other.skipped;
    }
}

/// Applies combination rules to attribute tables
pub struct CombinationResolver<'a> {
    rules: &'a [CombinationRule],
}

impl<'a> CombinationResolver<'a> {
    pub fn new(rules: &'a [CombinationRule]) -> Self {
        Self { rules }
    }

    /// Apply every rule once, in order, against a table keyed by
    /// `normalize`. Later rules see the values synthesized by earlier ones.
    pub fn resolve(
        &self,
        table: &AttributeTable,
        normalize: fn(&str) -> String,
    ) -> (AttributeTable, CombinationReport) {
        let mut resolved = table.clone();
        let mut report = CombinationReport::default();

        for rule in self.rules {
            match render(rule, &resolved, normalize) {
                Some(value) => {
                    resolved
                        .entry(normalize(&rule.target))
                        .or_default()
                        .insert(value);
                    report.applied += 1;
                }
                None => report.skipped += 1,
            }
        }

        (resolved, report)
    }

    /// Resolve both normalization schemes, then merge them
    pub fn resolve_all(&self, tables: &AttributeTables) -> (AttributeTable, CombinationReport) {
        let (normalized, mut report) = self.resolve(&tables.normalized, normalize_attribute);
        let (light, light_report) = self.resolve(&tables.light, normalize_attribute_light);
        report.add(light_report);

        (merge_tables(normalized, light), report)
    }
}

/// Build the synthetic value, or `None` if a referenced attribute is absent
fn render(
    rule: &CombinationRule,
    table: &AttributeTable,
    normalize: fn(&str) -> String,
) -> Option<String> {
    let mut value = String::new();
    for segment in &rule.template.segments {
        match segment {
            TemplateSegment::Text(text) => value.push_str(text),
            TemplateSegment::Attribute(name) => {
                let Some(representative) = table
                    .get(&normalize(name))
                    .and_then(|values| values.first())
                else {
                    tracing::debug!(
                        "Skipping combination for {}: attribute {} is missing",
                        rule.target,
                        name
                    );
                    return None;
                };
                value.push_str(representative);
            }
        }
    }
    Some(value)
}

/// Merge the two tables; on a key collision the lightly-normalized
/// table's value set replaces the fully-normalized one
pub fn merge_tables(normalized: AttributeTable, light: AttributeTable) -> AttributeTable {
    let mut merged = normalized;
    merged.extend(light);
    merged
}

// ============================================================================
// Tests
// ============================================================================
