//! Fact emitter and output sinks
//!
//! [`FactEmitter`] is a pure sink: it assigns each fact an arena handle,
//! writes it to its dataset and writes a provenance record to the
//! companion dataset. All accept/reject decisions happen upstream.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use infofacts_core::{Dataset, Fact, FactHandle, FactId, InfofactsError, Result, Term};

// ============================================================================
// Records
// ============================================================================

/// A fact as written to a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRecord {
    pub id: FactId,
    pub identity: Uuid,
    pub fact: Fact,
}

/// Why a fact was extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Identity of the fact this record justifies
    pub fact: Uuid,
    /// Entity the fact was extracted for
    pub subject: Term,
    pub justification: String,
}

// ============================================================================
// Sinks
// ============================================================================

/// Append-only destination for fact and provenance records
pub trait FactSink: Send {
    fn write_fact(&mut self, dataset: Dataset, record: &FactRecord) -> Result<()>;

    fn write_provenance(&mut self, dataset: Dataset, record: &ProvenanceRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps every record in memory
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemorySink {
    pub facts: Vec<(Dataset, FactRecord)>,
    pub provenance: Vec<(Dataset, ProvenanceRecord)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Facts written to `dataset`, in emission order
    pub fn facts_in(&self, dataset: Dataset) -> impl Iterator<Item = &Fact> + '_ {
        self.facts
            .iter()
            .filter(move |(d, _)| *d == dataset)
            .map(|(_, record)| &record.fact)
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.provenance.is_empty()
    }
}

impl FactSink for MemorySink {
    fn write_fact(&mut self, dataset: Dataset, record: &FactRecord) -> Result<()> {
        self.facts.push((dataset, record.clone()));
        Ok(())
    }

    fn write_provenance(&mut self, dataset: Dataset, record: &ProvenanceRecord) -> Result<()> {
        self.provenance.push((dataset, record.clone()));
        Ok(())
    }
}

/// Writes each dataset as tab-separated lines to its own writer
///
/// Fact lines are `identity  subject  relation  object`; provenance lines
/// are `<fact_identity>  subject  "justification"`.
pub struct TsvSink<W: Write> {
    facts: W,
    types: W,
    sources: W,
}

impl<W: Write> TsvSink<W> {
    pub fn from_writers(facts: W, types: W, sources: W) -> Self {
        Self {
            facts,
            types,
            sources,
        }
    }

    fn writer(&mut self, dataset: Dataset) -> &mut W {
        match dataset {
            Dataset::Facts => &mut self.facts,
            Dataset::Types => &mut self.types,
            Dataset::Sources => &mut self.sources,
        }
    }

    pub fn into_writers(self) -> (W, W, W) {
        (self.facts, self.types, self.sources)
    }
}

impl TsvSink<BufWriter<File>> {
    /// Create `<dataset>.<extension>` files for all datasets in `dir`
    pub fn create(dir: impl AsRef<Path>, extension: &str) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| InfofactsError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let open = |dataset: Dataset| -> Result<BufWriter<File>> {
            let path = dir.join(format!("{}.{}", dataset.name(), extension));
            let file = File::create(&path).map_err(|e| InfofactsError::Io {
                path: path.clone(),
                source: e,
            })?;
            tracing::info!(
                "Writing {} ({}) to {}",
                dataset,
                dataset.description(),
                path.display()
            );
            Ok(BufWriter::new(file))
        };

        let [facts, types, sources] = Dataset::ALL.map(open);
        Ok(Self::from_writers(facts?, types?, sources?))
    }
}

impl<W: Write + Send> FactSink for TsvSink<W> {
    fn write_fact(&mut self, dataset: Dataset, record: &FactRecord) -> Result<()> {
        writeln!(self.writer(dataset), "<fact_{}>\t{}", record.identity.simple(), record.fact)?;
        Ok(())
    }

    fn write_provenance(&mut self, dataset: Dataset, record: &ProvenanceRecord) -> Result<()> {
        let justification = Term::plain_literal(
            record
                .justification
                .replace(|c: char| c == '\t' || c == '\n', " "),
        );
        writeln!(
            self.writer(dataset),
            "<fact_{}>\t{}\t{}",
            record.fact.simple(),
            record.subject,
            justification
        )?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.facts.flush()?;
        self.types.flush()?;
        self.sources.flush()?;
        Ok(())
    }
}

// ============================================================================
// Emitter
// ============================================================================

/// Assigns arena handles and forwards facts and provenance to a sink
pub struct FactEmitter<S> {
    sink: S,
    arena: Vec<(Dataset, FactRecord)>,
}

impl<S: FactSink> FactEmitter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            arena: Vec::new(),
        }
    }

    /// Reset the arena; handles are only meaningful within one occurrence
    pub fn begin_occurrence(&mut self) {
        self.arena.clear();
    }

    /// Write `fact` to `dataset` and its provenance to `provenance`
    pub fn emit(
        &mut self,
        dataset: Dataset,
        fact: Fact,
        provenance: Dataset,
        provenance_subject: &Term,
        justification: &str,
    ) -> Result<FactHandle> {
        let id = u32::try_from(self.arena.len())
            .map(FactId)
            .map_err(|_| InfofactsError::Extraction("fact arena overflow".to_string()))?;
        let handle = FactHandle {
            id,
            identity: fact.identity(),
        };

        let record = FactRecord {
            id,
            identity: handle.identity,
            fact,
        };
        self.sink.write_fact(dataset, &record)?;
        self.sink.write_provenance(
            provenance,
            &ProvenanceRecord {
                fact: handle.identity,
                subject: provenance_subject.clone(),
                justification: justification.to_string(),
            },
        )?;

        tracing::trace!("Emitted {} to {}", record.fact, dataset);
        self.arena.push((dataset, record));
        Ok(handle)
    }

    /// Write a sub-fact qualifying `base` to the dataset `base` went to.
    ///
    /// `base` must have been emitted in the current occurrence.
    pub fn emit_meta(
        &mut self,
        base: FactHandle,
        relation: impl Into<String>,
        object: Term,
        provenance: Dataset,
        provenance_subject: &Term,
        justification: &str,
    ) -> Result<FactHandle> {
        let dataset = match self.get(base.id) {
            Some((dataset, record)) if record.identity == base.identity => dataset,
            _ => {
                return Err(InfofactsError::Extraction(format!(
                    "stale fact handle <fact_{}>",
                    base.identity.simple()
                )))
            }
        };
        let meta = Fact::meta(base, relation, object);
        self.emit(dataset, meta, provenance, provenance_subject, justification)
    }

    /// Record emitted in the current occurrence under `id`, with its dataset
    pub fn get(&self, id: FactId) -> Option<(Dataset, &FactRecord)> {
        self.arena
            .get(id.0 as usize)
            .map(|(dataset, record)| (*dataset, record))
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn located_in() -> Fact {
        Fact::new(Term::entity("Berlin"), "<isLocatedIn>", Term::entity("Germany"))
    }

    #[test]
    fn test_emit_writes_fact_and_provenance() {
        let mut emitter = FactEmitter::new(MemorySink::new());
        let subject = Term::entity("Berlin");

        let handle = emitter
            .emit(Dataset::Facts, located_in(), Dataset::Sources, &subject, "from [[Germany]]")
            .unwrap();

        assert_eq!(handle.id, FactId(0));
        assert_eq!(handle.identity, located_in().identity());

        let sink = emitter.sink();
        assert_eq!(sink.facts_in(Dataset::Facts).count(), 1);
        assert_eq!(sink.provenance.len(), 1);
        assert_eq!(sink.provenance[0].0, Dataset::Sources);
        assert_eq!(sink.provenance[0].1.fact, handle.identity);
        assert_eq!(sink.provenance[0].1.justification, "from [[Germany]]");
    }

    #[test]
    fn test_meta_fact_follows_base_dataset() {
        let mut emitter = FactEmitter::new(MemorySink::new());
        let subject = Term::entity("Berlin");

        let base = emitter
            .emit(Dataset::Types, located_in(), Dataset::Sources, &subject, "x")
            .unwrap();
        let since = Term::typed_literal("1990-##-##", "xsd:date");
        let meta = emitter
            .emit_meta(base, "<occursSince>", since.clone(), Dataset::Sources, &subject, "x")
            .unwrap();

        assert_eq!(meta.id, FactId(1));
        let (dataset, record) = emitter.get(base.id).unwrap();
        assert_eq!(dataset, Dataset::Types);
        assert_eq!(record.fact, located_in());
        let written = &emitter.sink().facts[1];
        assert_eq!(written.0, Dataset::Types);
        assert_eq!(written.1.fact, Fact::meta(base, "<occursSince>", since));
        assert_eq!(emitter.sink().provenance.len(), 2);
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut emitter = FactEmitter::new(MemorySink::new());
        let subject = Term::entity("Berlin");

        let base = emitter
            .emit(Dataset::Facts, located_in(), Dataset::Sources, &subject, "x")
            .unwrap();
        emitter.begin_occurrence();
        assert!(emitter.get(base.id).is_none());

        let result = emitter.emit_meta(
            base,
            "<occursSince>",
            Term::typed_literal("1990-##-##", "xsd:date"),
            Dataset::Sources,
            &subject,
            "x",
        );
        assert!(matches!(result, Err(InfofactsError::Extraction(_))));

        // A different fact now occupies the same slot
        let other = Fact::new(subject.clone(), "<isLocatedIn>", Term::entity("Europe"));
        emitter
            .emit(Dataset::Facts, other, Dataset::Sources, &subject, "x")
            .unwrap();
        let result = emitter.emit_meta(
            base,
            "<occursSince>",
            Term::typed_literal("1990-##-##", "xsd:date"),
            Dataset::Sources,
            &subject,
            "x",
        );
        assert!(result.is_err());
        assert_eq!(emitter.sink().facts.len(), 2);
    }

    #[test]
    fn test_tsv_sink_routes_datasets() {
        let mut emitter = FactEmitter::new(TsvSink::from_writers(Vec::new(), Vec::new(), Vec::new()));
        let subject = Term::entity("Berlin");

        let handle = emitter
            .emit(Dataset::Facts, located_in(), Dataset::Sources, &subject, "a\tb")
            .unwrap();
        emitter
            .emit(
                Dataset::Types,
                Fact::new(subject.clone(), "rdf:type", Term::entity("wordnet_city")),
                Dataset::Sources,
                &subject,
                "type",
            )
            .unwrap();

        let (facts, types, sources) = emitter.into_sink().into_writers();
        let facts = String::from_utf8(facts).unwrap();
        let types = String::from_utf8(types).unwrap();
        let sources = String::from_utf8(sources).unwrap();

        assert_eq!(
            facts,
            format!("<fact_{}>\t<Berlin>\t<isLocatedIn>\t<Germany>\n", handle.identity.simple())
        );
        assert!(types.contains("<Berlin>\trdf:type\t<wordnet_city>"));
        assert_eq!(sources.lines().count(), 2);
        assert!(sources.contains("\t<Berlin>\t\"a b\"\n"));
    }

    #[test]
    fn test_tsv_sink_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = TsvSink::create(dir.path(), "tsv").unwrap();

        let record = FactRecord {
            id: FactId(0),
            identity: located_in().identity(),
            fact: located_in(),
        };
        sink.write_fact(Dataset::Facts, &record).unwrap();
        sink.flush().unwrap();

        let written =
            std::fs::read_to_string(dir.path().join("infoboxFactsDirty.tsv")).unwrap();
        assert!(written.ends_with("<Berlin>\t<isLocatedIn>\t<Germany>\n"));
        assert!(dir.path().join("infoboxTypes.tsv").exists());
        assert!(dir.path().join("infoboxSources.tsv").exists());
    }
}
