//! Term extraction engine
//!
//! For one relation and one raw value: normalize the text, pick the value
//! class (range, or domain for inverse patterns), delegate candidate
//! recognition to a [`TermExtractor`], then syntax- and type-check every
//! candidate. Rejections are logged and counted, never fatal.

use infofacts_core::vocab::{CLASS_CLASS, ENTITY_CLASS, STRING_CLASS};
use infofacts_core::{RelationRef, Schema, Term};

use crate::stats::ExtractionStats;
use crate::text::{decode_entities, ValueTemplate};
use crate::{ExtractionTarget, TermExtractor};

/// Validated objects extracted from one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Normalized value the objects came from
    pub value: String,
    /// Class the objects were checked against
    pub value_class: String,
    /// Accepted objects, in candidate order
    pub objects: Vec<Term>,
}

pub struct TermExtractionEngine<'a, T: ?Sized> {
    schema: &'a Schema,
    terms: &'a T,
}

impl<'a, T: TermExtractor + ?Sized> TermExtractionEngine<'a, T> {
    pub fn new(schema: &'a Schema, terms: &'a T) -> Self {
        Self { schema, terms }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Decode entity references, apply the value replacements, substitute
    /// self-references with the subject's name and trim. `None` when
    /// nothing is left.
    pub fn normalize_value(&self, raw: &str, subject: &Term) -> Option<String> {
        let decoded = decode_entities(raw);
        let replaced = self.schema.apply_replacements(&decoded);
        let rendered = ValueTemplate::parse(&replaced).render(subject.lexical_form());

        let value = rendered.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Class of the values of `relation`; the generic entity class when the
    /// schema declares none
    pub fn value_class(&self, relation: &RelationRef, stats: &mut ExtractionStats) -> &'a str {
        match self.schema.value_class(relation) {
            Some(class) => class,
            None => {
                tracing::warn!("Unknown relation to extract: {}", relation);
                stats.unknown_relations += 1;
                ENTITY_CLASS
            }
        }
    }

    /// Extract the accepted objects of `relation` from a raw value.
    /// Returns `None` when the value normalizes to nothing.
    pub fn extract(
        &self,
        relation: &RelationRef,
        raw: &str,
        subject: &Term,
        stats: &mut ExtractionStats,
    ) -> Option<Extraction> {
        let value = self.normalize_value(raw, subject)?;
        let class = self.value_class(relation, stats);
        let target = if class == CLASS_CLASS {
            ExtractionTarget::Class
        } else {
            ExtractionTarget::Typed(class)
        };

        let candidates = match self.terms.extract_candidates(target, &value) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("Term extraction failed for {} {}: {}", subject, relation, e);
                stats.extractor_failures += 1;
                Vec::new()
            }
        };

        let functional = self.schema.is_functional(&relation.relation);
        let mut objects = Vec::new();
        for candidate in candidates {
            let Some(object) = self.validate(relation, class, candidate, stats) else {
                continue;
            };
            objects.push(object);
            if functional {
                break;
            }
        }

        Some(Extraction {
            value,
            value_class: class.to_string(),
            objects,
        })
    }

    /// Dates mentioned in `text`, for temporal qualifiers
    pub fn extract_dates(&self, text: &str, stats: &mut ExtractionStats) -> Vec<Term> {
        self.terms.extract_dates(text).unwrap_or_else(|e| {
            tracing::warn!("Date extraction failed on {:?}: {}", text, e);
            stats.extractor_failures += 1;
            Vec::new()
        })
    }

    /// Syntax check against the class pattern, then datatype check for
    /// literals. Accepted literals are retyped to `class`.
    pub fn validate(
        &self,
        relation: &RelationRef,
        class: &str,
        candidate: Term,
        stats: &mut ExtractionStats,
    ) -> Option<Term> {
        if let Some(check) = self.schema.type_check(class) {
            if !check.is_match(candidate.lexical_form()) {
                tracing::debug!(
                    "Extraction {} for {} does not match syntax check {}",
                    candidate,
                    relation,
                    check
                );
                stats.syntax_rejections += 1;
                return None;
            }
        }

        if !candidate.is_literal() {
            return Some(candidate);
        }

        let compatible = match candidate.datatype() {
            Some(datatype) => self.schema.is_subclass_of(datatype, class),
            None => class == STRING_CLASS,
        };
        if !compatible {
            tracing::debug!(
                "Extraction {} for {} does not match typecheck {}",
                candidate,
                relation,
                class
            );
            stats.type_rejections += 1;
            return None;
        }
        Some(candidate.with_datatype(class))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use infofacts_core::vocab::{DATE_CLASS, DECIMAL_CLASS, INTEGER_CLASS};
    use infofacts_core::{InfofactsError, RelationMetadata, Result};

    /// Returns the same candidates for every value
    struct Fixed(Vec<Term>);

    impl TermExtractor for Fixed {
        fn extract_candidates(&self, _target: ExtractionTarget<'_>, _text: &str) -> Result<Vec<Term>> {
            Ok(self.0.clone())
        }

        fn extract_dates(&self, _text: &str) -> Result<Vec<Term>> {
            Ok(Vec::new())
        }
    }

    struct Failing;

    impl TermExtractor for Failing {
        fn extract_candidates(&self, _target: ExtractionTarget<'_>, _text: &str) -> Result<Vec<Term>> {
            Err(InfofactsError::Extraction("recognizer unavailable".to_string()))
        }

        fn extract_dates(&self, _text: &str) -> Result<Vec<Term>> {
            Err(InfofactsError::Extraction("recognizer unavailable".to_string()))
        }
    }

    fn schema() -> Schema {
        Schema::builder()
            .relation("<hasNumber>", RelationMetadata::with_range(DECIMAL_CLASS))
            .relation("<hasMotto>", RelationMetadata::with_range(STRING_CLASS))
            .relation(
                "<wasBornOnDate>",
                RelationMetadata::with_range(DATE_CLASS).functional(),
            )
            .relation(
                "<isLeaderOf>",
                RelationMetadata::with_range("<wordnet_country>").domain("<wordnet_person>"),
            )
            .type_check("<wordnet_country>", "[A-Z].*")
            .replacement(r"\{\{PAGENAME\}\}", "$$0")
            .build()
            .unwrap()
    }

    fn relation(pattern: &str) -> RelationRef {
        pattern.parse().unwrap()
    }

    #[test]
    fn test_normalize_value() {
        let schema = schema();
        let terms = Fixed(Vec::new());
        let engine = TermExtractionEngine::new(&schema, &terms);
        let queen = Term::entity("Queen_(band)");

        assert_eq!(
            engine.normalize_value("  {{PAGENAME}} &amp; friends ", &queen).as_deref(),
            Some("Queen_(band) & friends")
        );
        assert_eq!(engine.normalize_value(" &nbsp; ", &queen), None);
    }

    #[test]
    fn test_accepted_literal_is_retyped() {
        let schema = schema();
        let terms = Fixed(vec![Term::typed_literal("42", INTEGER_CLASS)]);
        let engine = TermExtractionEngine::new(&schema, &terms);
        let mut stats = ExtractionStats::new();

        let extraction = engine
            .extract(&relation("<hasNumber>"), "42", &Term::entity("X"), &mut stats)
            .unwrap();

        assert_eq!(extraction.value_class, DECIMAL_CLASS);
        assert_eq!(extraction.objects, vec![Term::typed_literal("42", DECIMAL_CLASS)]);
    }

    #[test]
    fn test_incompatible_literal_is_rejected() {
        let schema = schema();
        let terms = Fixed(vec![
            Term::typed_literal("forty", STRING_CLASS),
            Term::plain_literal("untyped"),
        ]);
        let engine = TermExtractionEngine::new(&schema, &terms);
        let mut stats = ExtractionStats::new();

        let extraction = engine
            .extract(&relation("<hasNumber>"), "forty", &Term::entity("X"), &mut stats)
            .unwrap();

        assert!(extraction.objects.is_empty());
        assert_eq!(stats.type_rejections, 2);
    }

    #[test]
    fn test_untyped_literal_only_for_strings() {
        let schema = schema();
        let terms = Fixed(vec![Term::plain_literal("Per aspera")]);
        let engine = TermExtractionEngine::new(&schema, &terms);
        let mut stats = ExtractionStats::new();

        let extraction = engine
            .extract(&relation("<hasMotto>"), "Per aspera", &Term::entity("X"), &mut stats)
            .unwrap();

        assert_eq!(
            extraction.objects,
            vec![Term::typed_literal("Per aspera", STRING_CLASS)]
        );
    }

    #[test]
    fn test_syntax_check_and_inverse_domain() {
        let schema = schema();
        let terms = Fixed(vec![Term::entity("france"), Term::entity("France")]);
        let engine = TermExtractionEngine::new(&schema, &terms);
        let mut stats = ExtractionStats::new();

        let forward = engine
            .extract(&relation("<isLeaderOf>"), "x", &Term::entity("X"), &mut stats)
            .unwrap();
        assert_eq!(forward.value_class, "<wordnet_country>");
        assert_eq!(forward.objects, vec![Term::entity("France")]);
        assert_eq!(stats.syntax_rejections, 1);

        let inverse = engine
            .extract(&relation("<isLeaderOf->"), "x", &Term::entity("X"), &mut stats)
            .unwrap();
        assert_eq!(inverse.value_class, "<wordnet_person>");
        assert_eq!(inverse.objects.len(), 2);
    }

    #[test]
    fn test_functional_keeps_first_accepted() {
        let schema = schema();
        let terms = Fixed(vec![
            Term::plain_literal("soon"),
            Term::typed_literal("1990-05-02", DATE_CLASS),
            Term::typed_literal("1991-01-01", DATE_CLASS),
        ]);
        let engine = TermExtractionEngine::new(&schema, &terms);
        let mut stats = ExtractionStats::new();

        let extraction = engine
            .extract(&relation("<wasBornOnDate>"), "x", &Term::entity("X"), &mut stats)
            .unwrap();

        assert_eq!(
            extraction.objects,
            vec![Term::typed_literal("1990-05-02", DATE_CLASS)]
        );
        assert_eq!(stats.type_rejections, 1);
    }

    #[test]
    fn test_unknown_relation_falls_back_to_entity_class() {
        let schema = schema();
        let terms = Fixed(vec![Term::entity("Somewhere")]);
        let engine = TermExtractionEngine::new(&schema, &terms);
        let mut stats = ExtractionStats::new();

        let extraction = engine
            .extract(&relation("<undeclared>"), "Somewhere", &Term::entity("X"), &mut stats)
            .unwrap();

        assert_eq!(extraction.value_class, ENTITY_CLASS);
        assert_eq!(extraction.objects, vec![Term::entity("Somewhere")]);
        assert_eq!(stats.unknown_relations, 1);
    }

    #[test]
    fn test_extractor_failure_is_isolated() {
        let schema = schema();
        let engine = TermExtractionEngine::new(&schema, &Failing);
        let mut stats = ExtractionStats::new();

        let extraction = engine
            .extract(&relation("<hasNumber>"), "42", &Term::entity("X"), &mut stats)
            .unwrap();

        assert!(extraction.objects.is_empty());
        assert!(engine.extract_dates("1990", &mut stats).is_empty());
        assert_eq!(stats.extractor_failures, 2);
    }

    #[test]
    fn test_empty_value_aborts() {
        let schema = schema();
        let terms = Fixed(vec![Term::entity("Never")]);
        let engine = TermExtractionEngine::new(&schema, &terms);
        let mut stats = ExtractionStats::new();

        assert!(engine
            .extract(&relation("<isLeaderOf>"), "   ", &Term::entity("X"), &mut stats)
            .is_none());
    }
}
