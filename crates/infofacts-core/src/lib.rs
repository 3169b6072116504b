//! infofacts Core - Domain models, schema tables, and shared types
//!
//! This crate defines the core abstractions used throughout infofacts:
//! - Terms (entities and typed literals) and facts
//! - Fact handles used to attach qualifier / meta sub-facts
//! - Output datasets
//! - The immutable extraction schema (patterns, combinations, ontology)
//! - Common error types
//! - Configuration management

pub mod attribute;
pub mod config;
pub mod schema;
pub mod vocab;

pub use attribute::{normalize_attribute, normalize_attribute_light, AttributeTable};
pub use config::{
    AppConfig, ConfigError, ExtractionConfig, InputConfig, LoggingConfig, OutputConfig, SchemaConfig,
};
pub use schema::{
    CombinationRule, CombinationTemplate, RelationMetadata, RelationPattern, RelationRef, Schema,
    SchemaBuilder, TemplateSegment,
};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for infofacts operations
#[derive(Error, Debug)]
pub enum InfofactsError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid regex {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Sink error: {0}")]
    Sink(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, InfofactsError>;

// ============================================================================
// Terms
// ============================================================================

/// An opaque subject/object identifier: an entity or a (typed) literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    /// Entity name without the surrounding angle brackets
    Entity(String),

    /// Literal value with an optional datatype class
    Literal {
        value: String,
        datatype: Option<String>,
    },
}

impl Term {
    /// Create an entity term; surrounding `<` `>` are stripped
    pub fn entity(name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim();
        let name = name
            .strip_prefix('<')
            .and_then(|n| n.strip_suffix('>'))
            .unwrap_or(name);
        Self::Entity(name.to_string())
    }

    /// Create a literal carrying an explicit datatype
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
        }
    }

    /// Create a literal without a datatype
    pub fn plain_literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    /// The literal value, or the entity name
    pub fn lexical_form(&self) -> &str {
        match self {
            Self::Entity(name) => name,
            Self::Literal { value, .. } => value,
        }
    }

    /// Declared datatype of a literal (always `None` for entities)
    pub fn datatype(&self) -> Option<&str> {
        match self {
            Self::Entity(_) => None,
            Self::Literal { datatype, .. } => datatype.as_deref(),
        }
    }

    /// Rewrite the datatype of a literal; entities are returned unchanged
    pub fn with_datatype(self, class: impl Into<String>) -> Self {
        match self {
            Self::Literal { value, .. } => Self::Literal {
                value,
                datatype: Some(class.into()),
            },
            entity => entity,
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity(name) => write!(f, "<{}>", name),
            Self::Literal { value, datatype } => {
                let escaped = value
                    .replace('\\', "\\\\")
                    .replace('"', "\\\"")
                    .replace('\n', "\\n")
                    .replace('\r', "\\r")
                    .replace('\t', "\\t");
                match datatype {
                    Some(dt) => write!(f, "\"{}\"^^{}", escaped, dt),
                    None => write!(f, "\"{}\"", escaped),
                }
            }
        }
    }
}

// ============================================================================
// Facts
// ============================================================================

/// Namespace for content-derived fact identities
const FACT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a8e_4d3b_5a70_9e21_c4b8_0f5d_7a13);

/// Arena index of a fact within one infobox occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactId(pub u32);

/// Stable handle to an emitted fact.
///
/// `id` indexes the per-occurrence arena; `identity` is derived from the
/// fact's content and does not depend on emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactHandle {
    pub id: FactId,
    pub identity: Uuid,
}

/// Subject of a fact: a term, or another fact for qualifier / meta sub-facts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Term(Term),
    Fact(FactHandle),
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Term(term) => write!(f, "{}", term),
            Self::Fact(handle) => write!(f, "<fact_{}>", handle.identity.simple()),
        }
    }
}

/// A subject-relation-object triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact {
    pub subject: Subject,
    pub relation: String,
    pub object: Term,
}

impl Fact {
    /// Create a fact about a term
    pub fn new(subject: Term, relation: impl Into<String>, object: Term) -> Self {
        Self {
            subject: Subject::Term(subject),
            relation: relation.into(),
            object,
        }
    }

    /// Create a sub-fact attached to an already emitted base fact
    pub fn meta(base: FactHandle, relation: impl Into<String>, object: Term) -> Self {
        Self {
            subject: Subject::Fact(base),
            relation: relation.into(),
            object,
        }
    }

    /// Whether this fact qualifies another fact
    pub fn is_meta(&self) -> bool {
        matches!(self.subject, Subject::Fact(_))
    }

    /// Content-derived identity (UUID v5 over the rendered triple)
    pub fn identity(&self) -> Uuid {
        Uuid::new_v5(&FACT_NAMESPACE, self.to_string().as_bytes())
    }
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}\t{}", self.subject, self.relation, self.object)
    }
}

// ============================================================================
// Output Datasets
// ============================================================================

/// Logical output datasets written by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// Raw extracted facts, still to be redirect- and type-checked
    Facts,
    /// Types derived from infobox names
    Types,
    /// Provenance records for facts and types
    Sources,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Facts, Dataset::Types, Dataset::Sources];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Facts => "infoboxFactsDirty",
            Self::Types => "infoboxTypes",
            Self::Sources => "infoboxSources",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Facts => {
                "Facts extracted from infoboxes - still to be redirect-checked and type-checked"
            }
            Self::Types => "Types extracted from infobox names",
            Self::Sources => "Source information for the facts extracted from infoboxes",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Tests
// ============================================================================
