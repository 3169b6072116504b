//! Well-known class and relation identifiers

/// Generic entity class, used when a relation declares no value class
pub const ENTITY_CLASS: &str = "owl:Thing";

/// The class of classes; selects preferred-meaning disambiguation
pub const CLASS_CLASS: &str = "rdfs:Class";

pub const LITERAL_CLASS: &str = "rdfs:Literal";
pub const STRING_CLASS: &str = "xsd:string";
pub const DATE_CLASS: &str = "xsd:date";
pub const DECIMAL_CLASS: &str = "xsd:decimal";
pub const INTEGER_CLASS: &str = "xsd:integer";
pub const NON_NEGATIVE_INTEGER_CLASS: &str = "xsd:nonNegativeInteger";
pub const URL_CLASS: &str = "xsd:anyURI";

pub const RDF_TYPE: &str = "rdf:type";

/// Temporal qualifiers attached to a base fact
pub const OCCURS_SINCE: &str = "<occursSince>";
pub const OCCURS_UNTIL: &str = "<occursUntil>";

/// Datatype hierarchy every schema starts from (child, parent)
pub const BUILTIN_DATATYPES: &[(&str, &str)] = &[
    (STRING_CLASS, LITERAL_CLASS),
    (DATE_CLASS, LITERAL_CLASS),
    (DECIMAL_CLASS, LITERAL_CLASS),
    (INTEGER_CLASS, DECIMAL_CLASS),
    (NON_NEGATIVE_INTEGER_CLASS, INTEGER_CLASS),
    (URL_CLASS, LITERAL_CLASS),
];
