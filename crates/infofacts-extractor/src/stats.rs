//! Extraction statistics
//!
//! Counters accumulated over a run: what was read, what was emitted, and
//! what was rejected or skipped along the way.

use serde::{Deserialize, Serialize};

use crate::combination::CombinationReport;
use crate::reader::Termination;

// ============================================================================
// Extraction Statistics
// ============================================================================

/// Counters for one run (or one occurrence, merged into the run)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages scanned
    pub pages: usize,
    /// Infobox occurrences processed
    pub infoboxes: usize,
    /// Attribute (name, value) pairs read
    pub attributes: usize,
    /// Attributes with at least one relation pattern
    pub mapped_attributes: usize,
    /// Facts written to the facts dataset (base facts)
    pub facts: usize,
    /// Temporal qualifier and multi-column sub-facts
    pub meta_facts: usize,
    /// Type facts derived from infobox names
    pub types: usize,
    /// Candidates failing a class syntax check
    pub syntax_rejections: usize,
    /// Literal candidates failing the datatype check
    pub type_rejections: usize,
    /// Relations without a declared value class
    pub unknown_relations: usize,
    pub combinations_applied: usize,
    pub combinations_skipped: usize,
    /// Attribute loops stopped by an over-long environment
    pub truncated_environments: usize,
    /// Multi-column values dropped for lack of a base fact
    pub dropped_columns: usize,
    /// Term extractor calls that returned an error
    pub extractor_failures: usize,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add another set of counters into this one
    pub fn merge(&mut self, other: &ExtractionStats) {
        self.pages += other.pages;
        self.infoboxes += other.infoboxes;
        self.attributes += other.attributes;
        self.mapped_attributes += other.mapped_attributes;
        self.facts += other.facts;
        self.meta_facts += other.meta_facts;
        self.types += other.types;
        self.syntax_rejections += other.syntax_rejections;
        self.type_rejections += other.type_rejections;
        self.unknown_relations += other.unknown_relations;
        self.combinations_applied += other.combinations_applied;
        self.combinations_skipped += other.combinations_skipped;
        self.truncated_environments += other.truncated_environments;
        self.dropped_columns += other.dropped_columns;
        self.extractor_failures += other.extractor_failures;
    }

    pub fn record_combinations(&mut self, report: CombinationReport) {
        self.combinations_applied += report.applied;
        self.combinations_skipped += report.skipped;
    }

    pub fn record_termination(&mut self, termination: Termination) {
        if termination == Termination::Truncated {
            self.truncated_environments += 1;
        }
    }

    /// Share of validated candidates that were accepted (facts / (facts + rejections))
    pub fn acceptance_rate(&self) -> f32 {
        let total = self.facts + self.syntax_rejections + self.type_rejections;
        if total == 0 {
            0.0
        } else {
            self.facts as f32 / total as f32
        }
    }

    /// Total records written to the facts dataset
    pub fn total_facts(&self) -> usize {
        self.facts + self.meta_facts
    }
}

// ============================================================================
// Tests
// ============================================================================
