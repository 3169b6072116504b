//! Reification engine
//!
//! Emits the facts for one (relation pattern, value) pair together with
//! the sub-facts that qualify them. Two modes, never combined:
//!
//! - Temporal qualification for single-relation patterns whose value spans
//!   several lines: the dates found on line `i` qualify the `i`-th
//!   accepted object (`<occursSince>`, then `<occursUntil>`).
//! - Multi-column meta-facts for `;`-joined patterns: the tab-separated
//!   column 0 yields the base fact, columns 1..n yield sub-facts of it.

use infofacts_core::vocab::{OCCURS_SINCE, OCCURS_UNTIL};
use infofacts_core::{Dataset, Fact, FactHandle, RelationPattern, RelationRef, Result, Term};

use crate::emitter::{FactEmitter, FactSink};
use crate::extraction::TermExtractionEngine;
use crate::stats::ExtractionStats;
use crate::text::break_lines;
use crate::TermExtractor;

// ============================================================================
// Columns and qualifiers
// ============================================================================

/// One tab-separated column of a multi-column value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column<'v> {
    /// Intentionally empty column (doubled tab)
    Skip,
    Value(&'v str),
}

/// Split a multi-column value on tabs. Empty columns between two tabs are
/// [`Column::Skip`]; trailing empty columns are missing.
pub fn split_columns(raw: &str) -> Vec<Column<'_>> {
    let mut pieces: Vec<&str> = raw.split('\t').collect();
    while pieces.last().is_some_and(|piece| piece.is_empty()) {
        pieces.pop();
    }
    pieces
        .into_iter()
        .map(|piece| {
            if piece.is_empty() {
                Column::Skip
            } else {
                Column::Value(piece)
            }
        })
        .collect()
}

/// An accepted object with the dates that qualify it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedObject {
    pub object: Term,
    pub dates: Vec<Term>,
}

/// Pair objects with per-line dates by position. Objects past the last
/// line get no dates.
pub fn pair_qualifiers(objects: Vec<Term>, mut lines: Vec<Vec<Term>>) -> Vec<QualifiedObject> {
    lines.resize_with(lines.len().max(objects.len()), Vec::new);
    objects
        .into_iter()
        .zip(lines)
        .map(|(object, dates)| QualifiedObject { object, dates })
        .collect()
}

fn justification(value: &str) -> String {
    format!("Infobox extraction from {}", value)
}

/// `(subject, relation, object)`, or `(object, relation, subject)` for an
/// inverse reference
fn directed(subject: &Term, relation: &RelationRef, object: Term) -> Fact {
    if relation.inverse {
        Fact::new(object, relation.relation.clone(), subject.clone())
    } else {
        Fact::new(subject.clone(), relation.relation.clone(), object)
    }
}

// ============================================================================
// Reification Engine
// ============================================================================

pub struct ReificationEngine<'a, T: ?Sized> {
    engine: TermExtractionEngine<'a, T>,
}

impl<'a, T: TermExtractor + ?Sized> ReificationEngine<'a, T> {
    pub fn new(engine: TermExtractionEngine<'a, T>) -> Self {
        Self { engine }
    }

    /// Extract and emit everything one value yields for `pattern`.
    /// Returns the number of base facts emitted.
    pub fn process<S: FactSink>(
        &self,
        subject: &Term,
        pattern: &RelationPattern,
        raw: &str,
        emitter: &mut FactEmitter<S>,
        stats: &mut ExtractionStats,
    ) -> Result<usize> {
        match pattern {
            RelationPattern::Single(relation) => {
                self.single(subject, relation, raw, emitter, stats)
            }
            RelationPattern::MultiColumn(relations) => {
                self.multi_column(subject, relations, raw, emitter, stats)
            }
        }
    }

    /// Dates per line of a multi-line value; empty for a single line
    pub fn temporal_qualifiers(&self, value: &str, stats: &mut ExtractionStats) -> Vec<Vec<Term>> {
        let broken = break_lines(value);
        let lines: Vec<&str> = broken.split('\n').collect();
        if lines.len() < 2 {
            return Vec::new();
        }
        lines
            .into_iter()
            .map(|line| self.engine.extract_dates(line, stats))
            .collect()
    }

    fn single<S: FactSink>(
        &self,
        subject: &Term,
        relation: &RelationRef,
        raw: &str,
        emitter: &mut FactEmitter<S>,
        stats: &mut ExtractionStats,
    ) -> Result<usize> {
        let Some(extraction) = self.engine.extract(relation, raw, subject, stats) else {
            return Ok(0);
        };
        let justification = justification(&extraction.value);
        let lines = self.temporal_qualifiers(&extraction.value, stats);

        let mut emitted = 0;
        for qualified in pair_qualifiers(extraction.objects, lines) {
            let fact = directed(subject, relation, qualified.object);
            let base = emit(emitter, fact, subject, &justification)?;
            stats.facts += 1;
            emitted += 1;

            let qualifiers = [OCCURS_SINCE, OCCURS_UNTIL].into_iter().zip(qualified.dates);
            for (qualifier, date) in qualifiers {
                emitter.emit_meta(base, qualifier, date, Dataset::Sources, subject, &justification)?;
                stats.meta_facts += 1;
            }
        }
        Ok(emitted)
    }

    fn multi_column<S: FactSink>(
        &self,
        subject: &Term,
        relations: &[RelationRef],
        raw: &str,
        emitter: &mut FactEmitter<S>,
        stats: &mut ExtractionStats,
    ) -> Result<usize> {
        let columns = split_columns(raw);
        let mut base: Option<FactHandle> = None;
        let mut emitted = 0;

        for (i, relation) in relations.iter().enumerate() {
            // More relations than columns: nothing left to read
            let Some(column) = columns.get(i) else {
                break;
            };
            let Column::Value(value) = column else {
                continue;
            };
            if i > 0 && base.is_none() {
                let dropped = relations.len().min(columns.len()) - i;
                tracing::debug!(
                    "No base fact for {} {}: dropping {} column(s)",
                    subject,
                    relations[0],
                    dropped
                );
                stats.dropped_columns += dropped;
                break;
            }

            let Some(extraction) = self.engine.extract(relation, value, subject, stats) else {
                continue;
            };
            let justification = justification(&extraction.value);

            if i == 0 {
                for object in extraction.objects {
                    let fact = directed(subject, relation, object);
                    let handle = emit(emitter, fact, subject, &justification)?;
                    base.get_or_insert(handle);
                    stats.facts += 1;
                    emitted += 1;
                }
            } else if let Some(handle) = base {
                for object in extraction.objects {
                    emitter.emit_meta(
                        handle,
                        relation.relation.clone(),
                        object,
                        Dataset::Sources,
                        subject,
                        &justification,
                    )?;
                    stats.meta_facts += 1;
                }
            }
        }
        Ok(emitted)
    }
}

fn emit<S: FactSink>(
    emitter: &mut FactEmitter<S>,
    fact: Fact,
    subject: &Term,
    justification: &str,
) -> Result<FactHandle> {
    emitter.emit(Dataset::Facts, fact, Dataset::Sources, subject, justification)
}

// ============================================================================
// Tests
// ============================================================================
