//! Text helpers for raw infobox values
//!
//! Entity-reference decoding, markup stripping, and [`ValueTemplate`],
//! the parameterized form of a value that refers to the entity it
//! describes.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ENTITY_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").unwrap());

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<ref[^>]*/>|<ref[^>]*>.*?</ref\s*>").unwrap()
});
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").unwrap());
static TEMPLATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{[^{}]*\}\}").unwrap());
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(?:[^\[\]|]*\|)?([^\[\]|]*)\]\]").unwrap());
static EXTERNAL_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[https?://[^\s\]]+\s*([^\]]*)\]").unwrap());
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"'{2,}").unwrap());
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// Decode `&amp;`-style references. Dumps are frequently escaped twice, so
/// decoding repeats until the text is stable (at most three rounds).
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    let mut decoded = Cow::Borrowed(text);
    for _ in 0..3 {
        if !decoded.contains('&') {
            break;
        }
        let next = ENTITY_REF.replace_all(&decoded, |caps: &Captures| {
            decode_reference(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        });
        if next == decoded {
            break;
        }
        decoded = Cow::Owned(next.into_owned());
    }
    decoded
}

fn decode_reference(name: &str) -> Option<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(|c| c == 'x' || c == 'X') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let decoded = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" | "ensp" | "emsp" | "thinsp" => " ",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "minus" => "\u{2212}",
        "times" => "\u{00d7}",
        "deg" => "\u{00b0}",
        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// Reduce wiki markup to its visible text: comments, references, and
/// templates are removed, links are replaced by their labels, `<br>`
/// becomes a newline.
pub fn strip_markup(text: &str) -> String {
    let text = COMMENT.replace_all(text, "");
    let text = REF.replace_all(&text, "");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");

    let mut text = text.into_owned();
    loop {
        let next = TEMPLATE.replace_all(&text, "");
        if next == text {
            break;
        }
        text = next.into_owned();
    }

    let text = LINK.replace_all(&text, "$1");
    let text = EXTERNAL_LINK.replace_all(&text, "$1");
    let text = EMPHASIS.replace_all(&text, "");
    let text = SPACES.replace_all(&text, " ");

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace `<br>` variants by newlines, leaving other markup alone
pub fn break_lines(text: &str) -> Cow<'_, str> {
    LINE_BREAK.replace_all(text, "\n")
}

// ============================================================================
// Value Templates
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum ValuePart {
    Text(String),
    Subject,
}

/// A value that may refer to the entity it describes.
///
/// In raw text the reference is written [`ValueTemplate::SUBJECT`]
/// (replacement rules typically produce it); rendering substitutes the
/// subject's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTemplate {
    parts: Vec<ValuePart>,
}

impl ValueTemplate {
    pub const SUBJECT: &'static str = "$0";

    pub fn parse(text: &str) -> Self {
        let mut parts = Vec::new();
        for (i, piece) in text.split(Self::SUBJECT).enumerate() {
            if i > 0 {
                parts.push(ValuePart::Subject);
            }
            if !piece.is_empty() {
                parts.push(ValuePart::Text(piece.to_string()));
            }
        }
        Self { parts }
    }

    pub fn render(&self, subject: &str) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                ValuePart::Text(text) => text.as_str(),
                ValuePart::Subject => subject,
            })
            .collect()
    }
}
