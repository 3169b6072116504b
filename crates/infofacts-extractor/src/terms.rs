//! Rule-based term extraction
//!
//! Regex and table driven recognition of candidate objects in a value:
//! - Dates: ISO, `{{... date|Y|M|D}}` templates, `D Month Y`,
//!   `Month D, Y`, `Month Y` and bare years
//! - Numbers, URLs and cleaned strings as typed literals
//! - Entities from wiki links, or from comma/line separated segments
//! - Classes through the preferred-meaning table
//!
//! The strategy is picked from the value class via the schema's class
//! hierarchy.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use infofacts_core::vocab::{
    DATE_CLASS, DECIMAL_CLASS, INTEGER_CLASS, LITERAL_CLASS, NON_NEGATIVE_INTEGER_CLASS,
    STRING_CLASS, URL_CLASS,
};
use infofacts_core::{Result, Schema, Term};

use crate::text::strip_markup;
use crate::{ExtractionTarget, TermExtractor};

// ============================================================================
// Patterns
// ============================================================================

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|\
                      november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

static DATE_TEMPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{\{[^{}|]*date[^{}|]*((?:\|[^{}|]*)*)\}\}").unwrap());
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());
static DAY_MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})\s+({})\.?,?\s+(\d{{3,4}})\b",
        MONTHS
    ))
    .unwrap()
});
static MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b({})\.?\s+(\d{{1,2}}),?\s+(\d{{3,4}})\b",
        MONTHS
    ))
    .unwrap()
});
static MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b({})\.?,?\s+(\d{{3,4}})\b", MONTHS)).unwrap());
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{3,4})\b").unwrap());

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d{1,3}(?:,\d{3})+(?:\.\d+)?|-?\d+(?:\.\d+)?").unwrap());
static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:https?://|www\.)[^\s\[\]|<>"]+"#).unwrap());
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]|]+)(?:\|[^\[\]]*)?\]\]").unwrap());
static SEGMENT_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\n]").unwrap());

/// Link namespaces that never denote an entity
const IGNORED_NAMESPACES: &[&str] = &["file:", "image:", "category:"];

// ============================================================================
// Value kinds
// ============================================================================

/// Recognition strategy for a value class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Date,
    Number,
    Url,
    Text,
    /// Any literal: dates, numbers and URLs together
    Literal,
    Entity,
}

/// A recognized span of the input
#[derive(Debug, Clone)]
struct Span {
    start: usize,
    end: usize,
    term: Term,
}

// ============================================================================
// Rule-based extractor
// ============================================================================

/// Term extractor driven by regex patterns and the schema's tables
pub struct RuleBasedTermExtractor<'a> {
    schema: &'a Schema,
}

impl<'a> RuleBasedTermExtractor<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    fn kind_of(&self, class: &str) -> ValueKind {
        let is = |ancestor: &str| self.schema.is_subclass_of(class, ancestor);
        if is(DATE_CLASS) {
            ValueKind::Date
        } else if is(DECIMAL_CLASS) {
            ValueKind::Number
        } else if is(URL_CLASS) {
            ValueKind::Url
        } else if is(STRING_CLASS) {
            ValueKind::Text
        } else if is(LITERAL_CLASS) {
            ValueKind::Literal
        } else {
            ValueKind::Entity
        }
    }

    fn extract_date_spans(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();

        for caps in DATE_TEMPLATE.captures_iter(text) {
            let mut numbers = caps[1]
                .split('|')
                .map(str::trim)
                .filter(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
            let Some(year) = numbers.next() else {
                continue;
            };
            let month = numbers.next().and_then(|m| m.parse().ok());
            let day = numbers.next().and_then(|d| d.parse().ok());
            push_date(&mut spans, &caps, format_date(year, month, day));
        }

        for caps in ISO_DATE.captures_iter(text) {
            let month = caps[2].parse().ok();
            let day = caps[3].parse().ok();
            push_date(&mut spans, &caps, format_date(&caps[1], month, day));
        }

        for caps in DAY_MONTH_YEAR.captures_iter(text) {
            let day = caps[1].parse().ok();
            let month = month_number(&caps[2]);
            push_date(&mut spans, &caps, format_date(&caps[3], month, day));
        }

        for caps in MONTH_DAY_YEAR.captures_iter(text) {
            let month = month_number(&caps[1]);
            let day = caps[2].parse().ok();
            push_date(&mut spans, &caps, format_date(&caps[3], month, day));
        }

        for caps in MONTH_YEAR.captures_iter(text) {
            let month = month_number(&caps[1]);
            push_date(&mut spans, &caps, format_date(&caps[2], month, None));
        }

        for caps in YEAR.captures_iter(text) {
            push_date(&mut spans, &caps, format_date(&caps[1], None, None));
        }

        spans
    }

    fn extract_number_spans(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();

        for mat in NUMBER.find_iter(text) {
            let mut start = mat.start();
            let mut raw = mat.as_str();
            // A hyphen glued to a word is a range or compound, not a sign
            if raw.starts_with('-')
                && text[..start]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_alphanumeric)
            {
                start += 1;
                raw = &raw[1..];
            }

            let value = raw.replace(',', "");
            let datatype = if value.contains('.') {
                DECIMAL_CLASS
            } else if value.starts_with('-') {
                INTEGER_CLASS
            } else {
                NON_NEGATIVE_INTEGER_CLASS
            };
            spans.push(Span {
                start,
                end: mat.end(),
                term: Term::typed_literal(value, datatype),
            });
        }

        spans
    }

    fn extract_url_spans(&self, text: &str) -> Vec<Span> {
        URL.find_iter(text)
            .map(|mat| Span {
                start: mat.start(),
                end: mat.end(),
                term: Term::typed_literal(mat.as_str(), URL_CLASS),
            })
            .collect()
    }

    fn extract_string(&self, text: &str) -> Vec<Term> {
        let cleaned = strip_markup(text);
        if cleaned.is_empty() {
            Vec::new()
        } else {
            vec![Term::plain_literal(cleaned)]
        }
    }

    /// Link targets, or plain segments when the value has no links
    fn extract_names(&self, text: &str) -> Vec<String> {
        let linked: Vec<String> = LINK
            .captures_iter(text)
            .filter_map(|caps| {
                let target = caps[1].split('#').next().unwrap_or_default().trim();
                let lower = target.to_lowercase();
                if target.is_empty() || IGNORED_NAMESPACES.iter().any(|ns| lower.starts_with(ns)) {
                    None
                } else {
                    Some(target.to_string())
                }
            })
            .collect();
        if !linked.is_empty() {
            return linked;
        }

        let cleaned = strip_markup(text);
        SEGMENT_SEPARATOR
            .split(&cleaned)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn extract_entities(&self, text: &str) -> Vec<Term> {
        self.extract_names(text)
            .iter()
            .filter_map(|name| entity_name(name))
            .map(Term::Entity)
            .collect()
    }

    fn extract_classes(&self, text: &str) -> Vec<Term> {
        self.extract_names(text)
            .iter()
            .filter_map(|name| {
                let class = self.schema.preferred_meaning(name);
                if class.is_none() {
                    tracing::debug!("No preferred meaning for {:?}", name);
                }
                class
            })
            .map(Term::entity)
            .collect()
    }
}

impl TermExtractor for RuleBasedTermExtractor<'_> {
    fn extract_candidates(&self, target: ExtractionTarget<'_>, text: &str) -> Result<Vec<Term>> {
        let class = match target {
            ExtractionTarget::Class => return Ok(self.extract_classes(text)),
            ExtractionTarget::Typed(class) => class,
        };

        let terms = match self.kind_of(class) {
            ValueKind::Date => deduplicate(self.extract_date_spans(text)),
            ValueKind::Number => deduplicate(self.extract_number_spans(text)),
            ValueKind::Url => deduplicate(self.extract_url_spans(text)),
            ValueKind::Text => self.extract_string(text),
            ValueKind::Literal => {
                let mut spans = self.extract_url_spans(text);
                spans.extend(self.extract_date_spans(text));
                spans.extend(self.extract_number_spans(text));
                deduplicate(spans)
            }
            ValueKind::Entity => self.extract_entities(text),
        };
        Ok(terms)
    }

    fn extract_dates(&self, text: &str) -> Result<Vec<Term>> {
        Ok(deduplicate(self.extract_date_spans(text)))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn push_date(spans: &mut Vec<Span>, caps: &Captures, date: Option<String>) {
    let (Some(whole), Some(date)) = (caps.get(0), date) else {
        return;
    };
    spans.push(Span {
        start: whole.start(),
        end: whole.end(),
        term: Term::typed_literal(date, DATE_CLASS),
    });
}

/// `YYYY-MM-DD` with unknown components written `##`. Full dates must
/// exist in the calendar; a month alone must be in range.
fn format_date(year: &str, month: Option<u32>, day: Option<u32>) -> Option<String> {
    let year: i32 = year.parse().ok()?;
    match (month, day) {
        (Some(month), Some(day)) => {
            NaiveDate::from_ymd_opt(year, month, day)?;
            Some(format!("{:04}-{:02}-{:02}", year, month, day))
        }
        (Some(month), None) => {
            (1..=12).contains(&month).then(|| format!("{:04}-{:02}-##", year, month))
        }
        (None, _) => Some(format!("{:04}-##-##", year)),
    }
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Article name for a link target: spaces become `_`, first letter upper
fn entity_name(target: &str) -> Option<String> {
    let target = target.trim();
    let mut chars = target.chars();
    let first = chars.next()?;
    let name: String = first.to_uppercase().chain(chars).collect();
    Some(name.split_whitespace().collect::<Vec<_>>().join("_"))
}

/// Keep non-overlapping spans in position order; on a shared start the
/// longest span wins
fn deduplicate(mut spans: Vec<Span>) -> Vec<Term> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut result = Vec::new();
    let mut covered_until = 0usize;
    for span in spans {
        if span.start < covered_until {
            continue;
        }
        covered_until = span.end;
        result.push(span.term);
    }
    result
}

// ============================================================================
// Tests
// ============================================================================
