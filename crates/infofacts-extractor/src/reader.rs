//! Infobox reader
//!
//! Tokenizes one infobox block, read forward-only from a character
//! stream positioned right after the `{{Infobox` marker, into attribute
//! tables. Values are read as bracket/brace-aware environments: nested
//! `{{...}}` and `[[...]]` spans are consumed whole, so their inner `|`
//! and `}` do not split the value.

use infofacts_core::{normalize_attribute, normalize_attribute_light, AttributeTable};

/// Why the attribute loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Top-level `}` closed the block
    BlockEnd,
    /// Input ran out inside the block
    EndOfInput,
    /// A name or value exceeded the length limit (unterminated environment)
    Truncated,
    /// An attribute name normalized to empty
    EmptyName,
}

/// How a value environment ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvironmentEnd {
    Separator,
    Block(Termination),
}

/// Parallel attribute tables, one per normalization scheme
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTables {
    /// Keyed by [`normalize_attribute`]
    pub normalized: AttributeTable,
    /// Keyed by [`normalize_attribute_light`]
    pub light: AttributeTable,
}

impl AttributeTables {
    /// Record one value under both normalized forms of `name`
    pub fn insert(&mut self, name: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.normalized
            .entry(normalize_attribute(name))
            .or_default()
            .insert(value.to_string());
        self.light
            .entry(normalize_attribute_light(name))
            .or_default()
            .insert(value.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// Result of reading one infobox block
#[derive(Debug, Clone)]
pub struct InfoboxBlock {
    /// Infobox type name (text between the marker and the first delimiter)
    pub class_name: String,
    pub tables: AttributeTables,
    /// Number of (name, value) pairs read
    pub attributes_read: usize,
    pub termination: Termination,
}

/// Forward-only reader over the characters of one infobox
pub struct InfoboxReader<I> {
    chars: I,
    max_len: usize,
}

impl<I: Iterator<Item = char>> InfoboxReader<I> {
    pub fn new(chars: I, max_len: usize) -> Self {
        Self { chars, max_len }
    }

    /// Read the infobox type name and all attributes
    pub fn read(mut self) -> InfoboxBlock {
        let (class_name, end) = self.read_class();
        let mut block = InfoboxBlock {
            class_name,
            tables: AttributeTables::default(),
            attributes_read: 0,
            termination: Termination::BlockEnd,
        };

        if let EnvironmentEnd::Block(termination) = end {
            block.termination = termination;
            return block;
        }

        loop {
            let (name, end) = self.read_name();
            if let Some(termination) = end {
                block.termination = termination;
                return block;
            }
            if normalize_attribute(&name).is_empty() {
                block.termination = Termination::EmptyName;
                return block;
            }

            let mut value = String::new();
            let end = self.read_environment(&mut value);
            if end == EnvironmentEnd::Block(Termination::Truncated) {
                block.termination = Termination::Truncated;
                return block;
            }

            block.tables.insert(&name, &value);
            block.attributes_read += 1;

            if let EnvironmentEnd::Block(termination) = end {
                block.termination = termination;
                return block;
            }
        }
    }

    /// Infobox type name, up to the first top-level `|` or `}`
    fn read_class(&mut self) -> (String, EnvironmentEnd) {
        let mut class_name = String::new();
        let end = self.read_environment(&mut class_name);
        (class_name.trim().to_string(), end)
    }

    /// Attribute name up to `=`. A `|` before `=` starts a new name (the
    /// previous field had no value). Returns the termination when the block
    /// or the input ends first.
    fn read_name(&mut self) -> (String, Option<Termination>) {
        let mut name = String::new();
        let mut len = 0usize;

        for c in self.chars.by_ref() {
            match c {
                '=' => return (name, None),
                '}' => return (name, Some(Termination::BlockEnd)),
                '|' => {
                    name.clear();
                    len = 0;
                }
                _ => {
                    len += 1;
                    if len > self.max_len {
                        return (name, Some(Termination::Truncated));
                    }
                    name.push(c);
                }
            }
        }
        (name, Some(Termination::EndOfInput))
    }

    /// Value up to the next top-level `|` or `}`. HTML comments are
    /// dropped from the value.
    fn read_environment(&mut self, out: &mut String) -> EnvironmentEnd {
        let mut braces = 0usize;
        let mut brackets = 0usize;
        let mut len = 0usize;
        let mut in_comment = false;

        while let Some(c) = self.chars.next() {
            len += 1;
            if len > self.max_len {
                return EnvironmentEnd::Block(Termination::Truncated);
            }

            if in_comment {
                out.push(c);
                if out.ends_with("-->") {
                    in_comment = false;
                    if let Some(start) = out.rfind("<!--") {
                        out.truncate(start);
                    }
                }
                continue;
            }

            match c {
                '{' => braces += 1,
                '}' if braces == 0 => return EnvironmentEnd::Block(Termination::BlockEnd),
                '}' => braces -= 1,
                '[' => brackets += 1,
                ']' => brackets = brackets.saturating_sub(1),
                '|' if braces == 0 && brackets == 0 => return EnvironmentEnd::Separator,
                _ => {}
            }
            out.push(c);
            if c == '-' && out.ends_with("<!--") {
                in_comment = true;
            }
        }
        EnvironmentEnd::Block(Termination::EndOfInput)
    }
}

/// Read one infobox from a character stream positioned after its marker
pub fn read_infobox<I: Iterator<Item = char>>(chars: I, max_len: usize) -> InfoboxBlock {
    InfoboxReader::new(chars, max_len).read()
}

// ============================================================================
// Tests
// ============================================================================
