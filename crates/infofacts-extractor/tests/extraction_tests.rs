//! End-to-end extraction tests over a TOML schema

use infofacts_core::vocab::{DATE_CLASS, DECIMAL_CLASS, ENTITY_CLASS, OCCURS_SINCE, STRING_CLASS};
use infofacts_core::{AttributeTable, Dataset, Fact, RelationRef, Schema, Subject, Term};
use infofacts_extractor::{
    CombinationResolver, ExtractionStats, FactEmitter, InfoboxExtractor, MemorySink,
    RuleBasedTermExtractor, TermExtractionEngine, TsvSink,
};
use std::collections::BTreeSet;

const SCHEMA: &str = r#"
[patterns]
birthdate = ["<wasBornOnDate>"]
location = ["<locatedIn>;<inCountry>"]
spouse = ["<isMarriedTo>"]
motto = ["<hasMotto>"]
population = ["<hasPopulation>"]
elevation = ["<hasElevation>"]
mystery = ["<hasMystery>"]
leader = ["<isLeaderOf->"]
type = ["<isA>"]

[combinations]
"<birthyear>-<birthmonth>-<birthday>" = "birthdate"
"<city>\t<country>" = "location"

[[replacements]]
pattern = "\\{\\{PAGENAME\\}\\}"
replacement = "$$0"

[relations."<wasBornOnDate>"]
range = "xsd:date"
functional = true

[relations."<locatedIn>"]
range = "<wordnet_location>"

[relations."<inCountry>"]
range = "<wordnet_country>"

[relations."<isMarriedTo>"]
range = "<wordnet_person>"

[relations."<hasMotto>"]
range = "xsd:string"

[relations."<hasPopulation>"]
range = "xsd:nonNegativeInteger"
functional = true

[relations."<hasElevation>"]
range = "xsd:decimal"

[relations."<isLeaderOf>"]
domain = "<wordnet_person>"
range = "<wordnet_country>"

[relations."<isA>"]
range = "rdfs:Class"

[classes."<wordnet_country>"]
type_check = "[A-Z][^ ]*"

[preferred_meanings]
settlement = "<wordnet_settlement>"
city = "<wordnet_city>"
"#;

fn schema() -> Schema {
    Schema::from_toml_str(SCHEMA).unwrap()
}

fn run(schema: &Schema, subject: &str, infobox: &str) -> (MemorySink, ExtractionStats) {
    let terms = RuleBasedTermExtractor::new(schema);
    let extractor = InfoboxExtractor::new(schema, &terms);
    let mut emitter = FactEmitter::new(MemorySink::new());
    let mut stats = ExtractionStats::new();

    extractor
        .process_str(&Term::entity(subject), infobox, &mut emitter, &mut stats)
        .unwrap();
    (emitter.into_sink(), stats)
}

fn facts(sink: &MemorySink) -> Vec<Fact> {
    sink.facts_in(Dataset::Facts).cloned().collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_functional_birthdate_yields_one_fact() {
    let schema = schema();
    let (sink, _) = run(&schema, "Ada", " person\n| birthdate = 1990-05-02\n}}");

    assert_eq!(
        facts(&sink),
        vec![Fact::new(
            Term::entity("Ada"),
            "<wasBornOnDate>",
            Term::typed_literal("1990-05-02", DATE_CLASS)
        )]
    );
}

#[test]
fn test_multi_column_base_fact_and_sub_fact() {
    let schema = schema();
    let (sink, stats) = run(&schema, "Louvre", " museum\n| location = Paris\tFrance\n}}");

    let facts = facts(&sink);
    assert_eq!(facts.len(), 2);
    assert_eq!(
        facts[0],
        Fact::new(Term::entity("Louvre"), "<locatedIn>", Term::entity("Paris"))
    );
    assert_eq!(facts[1].relation, "<inCountry>");
    assert_eq!(facts[1].object, Term::entity("France"));
    match &facts[1].subject {
        Subject::Fact(handle) => assert_eq!(handle.identity, facts[0].identity()),
        Subject::Term(term) => panic!("sub-fact attached to term {}", term),
    }
    assert_eq!(stats.meta_facts, 1);
}

#[test]
fn test_multi_column_from_combination() {
    let schema = schema();
    let (sink, _) = run(
        &schema,
        "Louvre",
        " museum\n| city = [[Paris]]\n| country = [[France]]\n}}",
    );

    let relations: Vec<String> = facts(&sink).into_iter().map(|f| f.relation).collect();
    assert_eq!(relations, vec!["<locatedIn>", "<inCountry>"]);
}

#[test]
fn test_skip_sentinel_suppresses_sub_fact() {
    let schema = schema();
    let (sink, _) = run(&schema, "Louvre", " museum\n| location = A\t\tB\n}}");

    let facts = facts(&sink);
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].relation, "<locatedIn>");
    assert!(facts.iter().all(|fact| fact.relation != "<inCountry>"));
}

#[test]
fn test_unknown_value_class_still_extracts() {
    let schema = schema();
    let (sink, stats) = run(&schema, "Box", " thing\n| mystery = [[Enigma]]\n}}");

    assert_eq!(stats.unknown_relations, 1);
    assert_eq!(
        facts(&sink),
        vec![Fact::new(Term::entity("Box"), "<hasMystery>", Term::entity("Enigma"))]
    );

    let terms = RuleBasedTermExtractor::new(&schema);
    let engine = TermExtractionEngine::new(&schema, &terms);
    let relation: RelationRef = "<hasMystery>".parse().unwrap();
    assert_eq!(engine.value_class(&relation, &mut ExtractionStats::new()), ENTITY_CLASS);
}

#[test]
fn test_literal_retyped_to_value_class() {
    let schema = schema();
    let (sink, _) = run(&schema, "Paris", " settlement\n| elevation = 35\n}}");

    // Recognized as xsd:nonNegativeInteger, reported as the range class
    assert_eq!(facts(&sink)[0].object, Term::typed_literal("35", DECIMAL_CLASS));
}

#[test]
fn test_negative_number_fails_datatype_check() {
    let schema = schema();
    let (sink, stats) = run(&schema, "Nowhere", " settlement\n| population = -12\n}}");

    assert!(facts(&sink).is_empty());
    assert_eq!(stats.type_rejections, 1);
}

#[test]
fn test_string_relation_and_self_reference() {
    let schema = schema();
    let (sink, _) = run(
        &schema,
        "Queen",
        " band\n| motto = ''{{PAGENAME}} forever''\n}}",
    );

    assert_eq!(
        facts(&sink),
        vec![Fact::new(
            Term::entity("Queen"),
            "<hasMotto>",
            Term::typed_literal("Queen forever", STRING_CLASS)
        )]
    );
}

#[test]
fn test_inverse_pattern_uses_domain() {
    let schema = schema();
    let (sink, _) = run(&schema, "France", " country\n| leader = [[Emmanuel Macron]]\n}}");

    assert_eq!(
        facts(&sink),
        vec![Fact::new(
            Term::entity("Emmanuel_Macron"),
            "<isLeaderOf>",
            Term::entity("France")
        )]
    );
}

#[test]
fn test_class_values_and_type_fact() {
    let schema = schema();
    let (sink, stats) = run(&schema, "Springfield", " Settlement\n| type = [[City]]\n}}");

    assert_eq!(stats.types, 1);
    assert_eq!(
        sink.facts_in(Dataset::Types).cloned().collect::<Vec<_>>(),
        vec![Fact::new(
            Term::entity("Springfield"),
            "rdf:type",
            Term::entity("wordnet_settlement")
        )]
    );
    assert_eq!(
        facts(&sink),
        vec![Fact::new(
            Term::entity("Springfield"),
            "<isA>",
            Term::entity("wordnet_city")
        )]
    );
}

#[test]
fn test_temporal_qualifiers_for_multi_line_values() {
    let schema = schema();
    let (sink, _) = run(
        &schema,
        "Liz",
        " person\n| spouse = [[Richard Burton]] (1964)<br>[[John Warner]] (1976)\n}}",
    );

    let facts = facts(&sink);
    let since: Vec<(&Fact, &Term)> = facts
        .iter()
        .filter(|fact| fact.relation == OCCURS_SINCE)
        .map(|fact| match &fact.subject {
            Subject::Fact(handle) => (
                facts
                    .iter()
                    .find(|base| base.identity() == handle.identity)
                    .unwrap(),
                &fact.object,
            ),
            Subject::Term(_) => panic!("qualifier without base"),
        })
        .collect();

    assert_eq!(since.len(), 2);
    assert_eq!(since[0].0.object, Term::entity("Richard_Burton"));
    assert_eq!(since[0].1.lexical_form(), "1964-##-##");
    assert_eq!(since[1].0.object, Term::entity("John_Warner"));
    assert_eq!(since[1].1.lexical_form(), "1976-##-##");
}

const NUMBERED_SCHEMA: &str = r#"
[patterns]
birthdate = ["<wasBornOnDate>"]
birthdate1 = ["<wasBornOnDate>"]
spouse = ["<isMarriedTo>"]
spouse2 = ["<isMarriedTo>"]

[relations."<wasBornOnDate>"]
range = "xsd:date"
functional = true

[relations."<isMarriedTo>"]
range = "<wordnet_person>"
"#;

#[test]
fn test_digit_suffixed_pattern_keys_yield_one_functional_fact() {
    let schema = Schema::from_toml_str(NUMBERED_SCHEMA).unwrap();
    let (sink, _) = run(&schema, "Ada", " person\n| birth_date1 = 1990-05-02\n}}");

    assert_eq!(
        facts(&sink),
        vec![Fact::new(
            Term::entity("Ada"),
            "<wasBornOnDate>",
            Term::typed_literal("1990-05-02", DATE_CLASS)
        )]
    );
}

#[test]
fn test_numbered_attributes_do_not_duplicate_facts() {
    let schema = Schema::from_toml_str(NUMBERED_SCHEMA).unwrap();
    let (sink, _) = run(&schema, "Liz", " person\n| spouse2 = [[John Warner]]\n}}");

    assert_eq!(
        facts(&sink),
        vec![Fact::new(
            Term::entity("Liz"),
            "<isMarriedTo>",
            Term::entity("John_Warner")
        )]
    );

    let (sink, _) = run(
        &schema,
        "Liz",
        " person\n| spouse = [[Richard Burton]]\n| spouse2 = [[John Warner]]\n}}",
    );
    let married: Vec<String> = facts(&sink).iter().map(Fact::to_string).collect();
    let distinct: BTreeSet<&String> = married.iter().collect();
    assert!(!married.is_empty());
    assert_eq!(distinct.len(), married.len());
}

#[test]
fn test_numbered_pattern_matches_other_numbered_attribute() {
    let schema = Schema::from_toml_str(
        r#"
        [patterns]
        spouse1 = ["<isMarriedTo>"]

        [relations."<isMarriedTo>"]
        range = "<wordnet_person>"
        "#,
    )
    .unwrap();
    let (sink, _) = run(&schema, "Liz", " person\n| spouse2 = [[John Warner]]\n}}");

    assert_eq!(
        facts(&sink),
        vec![Fact::new(
            Term::entity("Liz"),
            "<isMarriedTo>",
            Term::entity("John_Warner")
        )]
    );
}

#[test]
fn test_combination_with_absent_reference_is_not_inserted() {
    let schema = schema();
    let mut table = AttributeTable::new();
    table.insert("birthyear".to_string(), BTreeSet::from(["1990".to_string()]));

    let resolver = CombinationResolver::new(schema.combinations());
    let (resolved, report) = resolver.resolve(&table, infofacts_core::normalize_attribute);

    assert!(!resolved.contains_key("birthdate"));
    assert_eq!(report.applied, 0);
}

#[test]
fn test_malformed_infobox_does_not_fail() {
    let schema = schema();
    let (sink, stats) = run(&schema, "Broken", " person\n| birthdate = {{birth date|1990|5");

    assert_eq!(stats.infoboxes, 1);
    assert_eq!(facts(&sink).len(), 1);
}

#[test]
fn test_tsv_output_files() {
    let schema = schema();
    let dir = tempfile::tempdir().unwrap();
    let terms = RuleBasedTermExtractor::new(&schema);
    let extractor = InfoboxExtractor::new(&schema, &terms);
    let mut emitter = FactEmitter::new(TsvSink::create(dir.path(), "tsv").unwrap());
    let mut stats = ExtractionStats::new();

    extractor
        .process_str(
            &Term::entity("Springfield"),
            " settlement\n| population = 30,720\n}}",
            &mut emitter,
            &mut stats,
        )
        .unwrap();
    emitter.flush().unwrap();

    let facts = std::fs::read_to_string(dir.path().join("infoboxFactsDirty.tsv")).unwrap();
    let types = std::fs::read_to_string(dir.path().join("infoboxTypes.tsv")).unwrap();
    let sources = std::fs::read_to_string(dir.path().join("infoboxSources.tsv")).unwrap();

    assert!(facts.contains("<Springfield>\t<hasPopulation>\t\"30720\"^^xsd:nonNegativeInteger"));
    assert!(types.contains("<Springfield>\trdf:type\t<wordnet_settlement>"));
    assert_eq!(sources.lines().count(), 2);
}

#[test]
fn test_tsv_line_breaks_stay_on_one_line() {
    let schema = schema();
    let dir = tempfile::tempdir().unwrap();
    let terms = RuleBasedTermExtractor::new(&schema);
    let extractor = InfoboxExtractor::new(&schema, &terms);
    let mut emitter = FactEmitter::new(TsvSink::create(dir.path(), "tsv").unwrap());
    let mut stats = ExtractionStats::new();

    extractor
        .process_str(
            &Term::entity("Queen_(band)"),
            " band\n| motto = Line one<br />Line two\n}}",
            &mut emitter,
            &mut stats,
        )
        .unwrap();
    emitter.flush().unwrap();

    let facts = std::fs::read_to_string(dir.path().join("infoboxFactsDirty.tsv")).unwrap();
    assert_eq!(facts.lines().count(), 1);
    assert!(facts.contains("\t<hasMotto>\t\"Line one\\nLine two\"^^xsd:string\n"));
}
