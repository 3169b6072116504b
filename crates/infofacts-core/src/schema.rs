//! Extraction schema
//!
//! The read-only tables the extractor consults for every infobox:
//! attribute -> relation patterns, combination templates, value
//! replacements, relation metadata (domain, range, functionality), the
//! class hierarchy with per-class syntax checks, and the preferred-meaning
//! table used to map words to classes.
//!
//! A [`Schema`] is built once (from TOML or through [`SchemaBuilder`]) and
//! shared immutably for the whole run.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::attribute::normalize_attribute;
use crate::vocab::BUILTIN_DATATYPES;
use crate::{InfofactsError, Result};

// ============================================================================
// Relation Patterns
// ============================================================================

/// A relation named by a pattern, possibly marked inverse
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationRef {
    /// Relation identifier with the inverse marker removed
    pub relation: String,
    /// Subject and object are swapped when extracting
    pub inverse: bool,
}

impl RelationRef {
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            inverse: false,
        }
    }
}

impl FromStr for RelationRef {
    type Err = InfofactsError;

    /// Parses `<rel>` or the inverse form `<rel->`
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let bracketed = trimmed.starts_with('<');
        let name = trimmed.trim_start_matches('<').trim_end_matches('>');
        let (name, inverse) = match name.strip_suffix('-') {
            Some(stripped) => (stripped, true),
            None => (name, false),
        };

        if name.is_empty() {
            return Err(InfofactsError::InvalidSchema(format!(
                "empty relation in pattern {:?}",
                s
            )));
        }

        let relation = if bracketed {
            format!("<{}>", name)
        } else {
            name.to_string()
        };
        Ok(Self { relation, inverse })
    }
}

impl std::fmt::Display for RelationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.inverse {
            return write!(f, "{}", self.relation);
        }
        match self.relation.strip_suffix('>') {
            Some(open) => write!(f, "{}->", open),
            None => write!(f, "{}-", self.relation),
        }
    }
}

/// What an attribute maps to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationPattern {
    /// One relation, plain or inverse
    Single(RelationRef),
    /// `;`-joined relations: column 0 is the base fact, columns 1..n
    /// become sub-facts of it
    MultiColumn(Vec<RelationRef>),
}

impl FromStr for RelationPattern {
    type Err = InfofactsError;

    fn from_str(s: &str) -> Result<Self> {
        if !s.contains(';') {
            return Ok(Self::Single(s.parse()?));
        }

        let columns = s
            .split(';')
            .filter(|part| !part.trim().is_empty())
            .map(RelationRef::from_str)
            .collect::<Result<Vec<_>>>()?;

        if columns.is_empty() {
            return Err(InfofactsError::InvalidSchema(format!(
                "multi-column pattern without relations: {:?}",
                s
            )));
        }
        Ok(Self::MultiColumn(columns))
    }
}

impl std::fmt::Display for RelationPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(relation) => write!(f, "{}", relation),
            Self::MultiColumn(columns) => {
                let parts: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
                write!(f, "{}", parts.join(";"))
            }
        }
    }
}

// ============================================================================
// Combination Templates
// ============================================================================

/// Piece of a combination template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    Text(String),
    /// Back-reference to another attribute, as written in the template
    Attribute(String),
}

/// Literal text interleaved with `<attribute>` back-references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationTemplate {
    pub segments: Vec<TemplateSegment>,
}

impl CombinationTemplate {
    /// Names of all referenced attributes, in template order
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            TemplateSegment::Attribute(name) => Some(name.as_str()),
            TemplateSegment::Text(_) => None,
        })
    }
}

impl FromStr for CombinationTemplate {
    type Err = InfofactsError;

    fn from_str(s: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = s;

        while let Some(open) = rest.find('<') {
            let Some(close) = rest[open..].find('>').map(|c| open + c) else {
                break;
            };
            if open > 0 {
                segments.push(TemplateSegment::Text(rest[..open].to_string()));
            }
            segments.push(TemplateSegment::Attribute(rest[open + 1..close].to_string()));
            rest = &rest[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(TemplateSegment::Text(rest.to_string()));
        }

        Ok(Self { segments })
    }
}

/// Synthesizes `target` from the values of other attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationRule {
    pub template: CombinationTemplate,
    /// Target attribute name, as written in the schema
    pub target: String,
}

// ============================================================================
// Ontology Tables
// ============================================================================

/// Declared signature of a relation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMetadata {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
    /// Single-valued: extraction stops at the first accepted object
    #[serde(default)]
    pub functional: bool,
}

impl RelationMetadata {
    pub fn with_range(range: impl Into<String>) -> Self {
        Self {
            range: Some(range.into()),
            ..Default::default()
        }
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn functional(mut self) -> Self {
        self.functional = true;
        self
    }

    /// Class of the extracted value: the range, or the domain for an
    /// inverse pattern
    pub fn value_class(&self, inverse: bool) -> Option<&str> {
        if inverse {
            self.domain.as_deref()
        } else {
            self.range.as_deref()
        }
    }
}

/// Regex rewrite applied to raw values before term extraction
#[derive(Debug, Clone)]
pub struct ReplacementRule {
    pub pattern: Regex,
    pub replacement: String,
}

// ============================================================================
// Schema
// ============================================================================

/// Immutable extraction configuration shared by every infobox occurrence
#[derive(Debug, Clone, Default)]
pub struct Schema {
    patterns: HashMap<String, Vec<RelationPattern>>,
    combinations: Vec<CombinationRule>,
    replacements: Vec<ReplacementRule>,
    relations: HashMap<String, RelationMetadata>,
    parents: HashMap<String, Vec<String>>,
    type_checks: HashMap<String, Regex>,
    preferred_meanings: HashMap<String, String>,
}

impl Schema {
    /// Start building a schema seeded with the built-in datatype hierarchy
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Parse a TOML schema document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: SchemaFile = toml::from_str(content)
            .map_err(|e| InfofactsError::InvalidSchema(e.to_string()))?;
        file.into_builder().build()
    }

    /// Load a TOML schema file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| InfofactsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let schema = Self::from_toml_str(&content)?;

        tracing::info!(
            "Loaded schema from {}: {} attributes, {} combinations, {} relations",
            path.display(),
            schema.patterns.len(),
            schema.combinations.len(),
            schema.relations.len()
        );
        Ok(schema)
    }

    /// Relation patterns for a normalized attribute name (empty if unmapped)
    pub fn patterns_for(&self, attribute: &str) -> &[RelationPattern] {
        self.patterns
            .get(attribute)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn combinations(&self) -> &[CombinationRule] {
        &self.combinations
    }

    /// Apply every replacement rule in order
    pub fn apply_replacements(&self, text: &str) -> String {
        self.replacements
            .iter()
            .fold(text.to_string(), |acc, rule| {
                rule.pattern
                    .replace_all(&acc, rule.replacement.as_str())
                    .into_owned()
            })
    }

    pub fn relation(&self, relation: &str) -> Option<&RelationMetadata> {
        self.relations.get(relation)
    }

    /// Declared value class for a (possibly inverse) relation reference
    pub fn value_class(&self, relation: &RelationRef) -> Option<&str> {
        self.relation(&relation.relation)
            .and_then(|meta| meta.value_class(relation.inverse))
    }

    pub fn is_functional(&self, relation: &str) -> bool {
        self.relation(relation).is_some_and(|meta| meta.functional)
    }

    /// Reflexive, transitive subclass test over the class hierarchy
    pub fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        if class == ancestor {
            return true;
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([class]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            for parent in self.parents.get(current).into_iter().flatten() {
                if parent == ancestor {
                    return true;
                }
                queue.push_back(parent.as_str());
            }
        }
        false
    }

    /// Syntax check registered for a class (anchored to the whole value)
    pub fn type_check(&self, class: &str) -> Option<&Regex> {
        self.type_checks.get(class)
    }

    /// Class a word preferably denotes (case-insensitive)
    pub fn preferred_meaning(&self, word: &str) -> Option<&str> {
        self.preferred_meanings
            .get(&word.trim().to_lowercase())
            .map(String::as_str)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Collects raw schema entries; [`SchemaBuilder::build`] parses and
/// compiles them
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    patterns: Vec<(String, String)>,
    combinations: BTreeMap<String, String>,
    replacements: Vec<(String, String)>,
    relations: HashMap<String, RelationMetadata>,
    parents: Vec<(String, String)>,
    type_checks: Vec<(String, String)>,
    preferred_meanings: Vec<(String, String)>,
}

impl SchemaBuilder {
    /// Create a builder seeded with the built-in datatype hierarchy
    pub fn new() -> Self {
        let mut builder = Self::default();
        for (child, parent) in BUILTIN_DATATYPES {
            builder = builder.subclass(*child, *parent);
        }
        builder
    }

    /// Map an attribute to a relation pattern string
    pub fn pattern(mut self, attribute: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.patterns.push((attribute.into(), pattern.into()));
        self
    }

    pub fn combination(mut self, template: impl Into<String>, target: impl Into<String>) -> Self {
        self.combinations.insert(template.into(), target.into());
        self
    }

    pub fn replacement(mut self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.replacements.push((pattern.into(), replacement.into()));
        self
    }

    pub fn relation(mut self, relation: impl Into<String>, metadata: RelationMetadata) -> Self {
        self.relations.insert(relation.into(), metadata);
        self
    }

    pub fn subclass(mut self, class: impl Into<String>, parent: impl Into<String>) -> Self {
        self.parents.push((class.into(), parent.into()));
        self
    }

    pub fn type_check(mut self, class: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.type_checks.push((class.into(), pattern.into()));
        self
    }

    pub fn preferred_meaning(mut self, word: impl Into<String>, class: impl Into<String>) -> Self {
        self.preferred_meanings.push((word.into(), class.into()));
        self
    }

    /// Parse patterns and templates, compile regexes
    pub fn build(self) -> Result<Schema> {
        let mut patterns: HashMap<String, Vec<RelationPattern>> = HashMap::new();
        for (attribute, pattern) in self.patterns {
            let parsed: RelationPattern = pattern.parse()?;
            let entry = patterns
                .entry(normalize_attribute(&attribute))
                .or_default();
            if !entry.contains(&parsed) {
                entry.push(parsed);
            }
        }

        let combinations = self
            .combinations
            .into_iter()
            .map(|(template, target)| {
                Ok(CombinationRule {
                    template: template.parse()?,
                    target,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let replacements = self
            .replacements
            .into_iter()
            .map(|(pattern, replacement)| {
                Ok(ReplacementRule {
                    pattern: compile(&pattern)?,
                    replacement,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut parents: HashMap<String, Vec<String>> = HashMap::new();
        for (class, parent) in self.parents {
            let entry = parents.entry(class).or_default();
            if !entry.contains(&parent) {
                entry.push(parent);
            }
        }

        let type_checks = self
            .type_checks
            .into_iter()
            .map(|(class, pattern)| Ok((class, compile(&format!("^(?:{})$", pattern))?)))
            .collect::<Result<HashMap<_, _>>>()?;

        let preferred_meanings = self
            .preferred_meanings
            .into_iter()
            .map(|(word, class)| (word.trim().to_lowercase(), class))
            .collect();

        Ok(Schema {
            patterns,
            combinations,
            replacements,
            relations: self.relations,
            parents,
            type_checks,
            preferred_meanings,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| InfofactsError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })
}

// ============================================================================
// TOML Representation
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SchemaFile {
    patterns: BTreeMap<String, Vec<String>>,
    combinations: BTreeMap<String, String>,
    replacements: Vec<ReplacementSpec>,
    relations: BTreeMap<String, RelationMetadata>,
    classes: BTreeMap<String, ClassSpec>,
    preferred_meanings: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ReplacementSpec {
    pattern: String,
    replacement: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClassSpec {
    parents: Vec<String>,
    type_check: Option<String>,
}

impl SchemaFile {
    fn into_builder(self) -> SchemaBuilder {
        let mut builder = SchemaBuilder::new();

        for (attribute, patterns) in self.patterns {
            for pattern in patterns {
                builder = builder.pattern(attribute.clone(), pattern);
            }
        }
        for (template, target) in self.combinations {
            builder = builder.combination(template, target);
        }
        for spec in self.replacements {
            builder = builder.replacement(spec.pattern, spec.replacement);
        }
        for (relation, metadata) in self.relations {
            builder = builder.relation(relation, metadata);
        }
        for (class, spec) in self.classes {
            for parent in spec.parents {
                builder = builder.subclass(class.clone(), parent);
            }
            if let Some(check) = spec.type_check {
                builder = builder.type_check(class, check);
            }
        }
        for (word, class) in self.preferred_meanings {
            builder = builder.preferred_meaning(word, class);
        }

        builder
    }
}

// ============================================================================
// Tests
// ============================================================================
