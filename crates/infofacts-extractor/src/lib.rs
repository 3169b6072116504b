//! infofacts Extractor - Infobox-to-fact extraction pipeline
//!
//! Turns one infobox block into validated facts:
//! - [`reader`] tokenizes the block into normalized attribute tables
//! - [`combination`] synthesizes attributes from substitution templates
//! - [`resolver`] maps attributes to relation patterns
//! - [`extraction`] extracts and validates objects for a relation
//! - [`reify`] attaches temporal qualifiers and multi-column meta-facts
//! - [`emitter`] writes facts and provenance to the output datasets
//!
//! [`pipeline::InfoboxExtractor`] wires these together for one occurrence.

use infofacts_core::{Result, Term};

/// What the term extractor should look for in a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTarget<'a> {
    /// Classes, disambiguated through the preferred-meaning table
    Class,
    /// Objects of the given value class (dates, numbers, entities, ...)
    Typed(&'a str),
}

/// Turns a text span into ordered candidate identifiers
pub trait TermExtractor: Send + Sync {
    fn extract_candidates(&self, target: ExtractionTarget<'_>, text: &str) -> Result<Vec<Term>>;

    /// Date-specialized variant used for temporal qualifiers
    fn extract_dates(&self, text: &str) -> Result<Vec<Term>>;
}

pub mod combination;
pub mod emitter;
pub mod extraction;
pub mod pipeline;
pub mod reader;
pub mod reify;
pub mod resolver;
pub mod stats;
pub mod terms;
pub mod text;

pub use combination::CombinationResolver;
pub use emitter::{FactEmitter, FactRecord, FactSink, MemorySink, ProvenanceRecord, TsvSink};
pub use extraction::{Extraction, TermExtractionEngine};
pub use pipeline::InfoboxExtractor;
pub use reader::{read_infobox, InfoboxBlock, Termination};
pub use reify::ReificationEngine;
pub use resolver::RelationResolver;
pub use stats::ExtractionStats;
pub use terms::RuleBasedTermExtractor;
