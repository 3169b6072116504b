//! Per-occurrence extraction pipeline
//!
//! read -> type fact -> combinations -> relation resolution -> extraction
//! and reification -> emission, completed for one infobox before the next
//! one is touched.

use infofacts_core::vocab::RDF_TYPE;
use infofacts_core::{Dataset, Fact, RelationPattern, Result, Schema, Term};

use crate::combination::CombinationResolver;
use crate::emitter::{FactEmitter, FactSink};
use crate::extraction::TermExtractionEngine;
use crate::reader::{read_infobox, Termination};
use crate::reify::ReificationEngine;
use crate::resolver::RelationResolver;
use crate::stats::ExtractionStats;
use crate::TermExtractor;

/// Longest name or value read before the environment counts as unterminated
pub const DEFAULT_MAX_VALUE_LEN: usize = 20_000;

/// Extracts facts from infobox occurrences against one schema
pub struct InfoboxExtractor<'a, T: ?Sized> {
    schema: &'a Schema,
    terms: &'a T,
    max_value_len: usize,
}

impl<'a, T: TermExtractor + ?Sized> InfoboxExtractor<'a, T> {
    pub fn new(schema: &'a Schema, terms: &'a T) -> Self {
        Self {
            schema,
            terms,
            max_value_len: DEFAULT_MAX_VALUE_LEN,
        }
    }

    pub fn with_max_value_len(mut self, max_value_len: usize) -> Self {
        self.max_value_len = max_value_len;
        self
    }

    /// Process one infobox read from `chars`, positioned right after its
    /// opening marker. Only sink errors are returned; everything else is
    /// logged, counted and skipped.
    pub fn process<I, S>(
        &self,
        subject: &Term,
        chars: I,
        emitter: &mut FactEmitter<S>,
        stats: &mut ExtractionStats,
    ) -> Result<()>
    where
        I: Iterator<Item = char>,
        S: FactSink,
    {
        emitter.begin_occurrence();

        let block = read_infobox(chars, self.max_value_len);
        stats.infoboxes += 1;
        stats.attributes += block.attributes_read;
        stats.record_termination(block.termination);
        if block.termination != Termination::BlockEnd {
            tracing::debug!(
                "Infobox {:?} of {} ended early: {:?}",
                block.class_name,
                subject,
                block.termination
            );
        }

        self.emit_type(subject, &block.class_name, emitter, stats)?;

        let (table, report) =
            CombinationResolver::new(self.schema.combinations()).resolve_all(&block.tables);
        stats.record_combinations(report);

        let resolver = RelationResolver::new(self.schema);
        let reifier = ReificationEngine::new(TermExtractionEngine::new(self.schema, self.terms));

        for (attribute, patterns) in resolver.mapped(&table) {
            let Some(values) = table.get(attribute) else {
                continue;
            };
            stats.mapped_attributes += 1;

            for pattern in patterns {
                let functional = match pattern {
                    RelationPattern::Single(relation) => self.schema.is_functional(&relation.relation),
                    RelationPattern::MultiColumn(_) => false,
                };
                for value in values {
                    let emitted = reifier.process(subject, pattern, value, emitter, stats)?;
                    // One object per attribute for functional relations
                    if functional && emitted > 0 {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Convenience wrapper over [`InfoboxExtractor::process`]
    pub fn process_str<S: FactSink>(
        &self,
        subject: &Term,
        text: &str,
        emitter: &mut FactEmitter<S>,
        stats: &mut ExtractionStats,
    ) -> Result<()> {
        self.process(subject, text.chars(), emitter, stats)
    }

    /// `(subject, rdf:type, class)` when the infobox name has a preferred meaning
    fn emit_type<S: FactSink>(
        &self,
        subject: &Term,
        class_name: &str,
        emitter: &mut FactEmitter<S>,
        stats: &mut ExtractionStats,
    ) -> Result<()> {
        let Some(class) = self.schema.preferred_meaning(class_name) else {
            tracing::debug!("No preferred meaning for infobox type {:?}", class_name);
            return Ok(());
        };

        emitter.emit(
            Dataset::Types,
            Fact::new(subject.clone(), RDF_TYPE, Term::entity(class)),
            Dataset::Sources,
            subject,
            &format!("Preferred meaning of infobox type {}", class_name),
        )?;
        stats.types += 1;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
