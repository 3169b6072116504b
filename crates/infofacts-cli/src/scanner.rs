//! Page scanner over an XML article dump
//!
//! Splits the dump into `<page>` … `</page>` blocks, takes the `<title>` as
//! the page subject and locates infobox markers in the page text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, BufRead};

static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<title>(.*?)</title>").unwrap());
static INFOBOX_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\{\{ ?infobox").unwrap());

/// One article of the dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Title with spaces replaced by `_`; empty when the page had none
    pub title: String,
    /// Unescaped page body
    pub text: String,
}

impl Page {
    /// Infobox bodies of this page, see [`infobox_bodies`]
    pub fn infoboxes(&self) -> Vec<&str> {
        infobox_bodies(&self.text)
    }
}

/// Iterator over the pages of a dump
pub struct PageScanner<R> {
    reader: R,
    line: String,
}

impl<R: BufRead> PageScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for PageScanner<R> {
    type Item = io::Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut in_page = false;
        let mut title = String::new();
        let mut text = String::new();

        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                // A page cut off by the end of the dump is still returned
                Ok(0) => {
                    return in_page.then(|| Ok(finish(title, text)));
                }
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }

            let line = self.line.trim_start();
            if !in_page {
                in_page = line.starts_with("<page>");
                continue;
            }
            if line.starts_with("</page>") {
                return Some(Ok(finish(title, text)));
            }
            if title.is_empty() {
                if let Some(caps) = TITLE.captures(line) {
                    title = page_title(&caps[1]);
                    continue;
                }
            }
            text.push_str(&self.line);
        }
    }
}

fn finish(title: String, text: String) -> Page {
    Page {
        title,
        text: unescape_xml(&text),
    }
}

/// Subject name of a page title
pub fn page_title(raw: &str) -> String {
    unescape_xml(raw.trim())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Undo the XML escaping of the dump
pub fn unescape_xml(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Text following every `{{Infobox` / `{{ Infobox` marker (any case), in
/// order of appearance. Each body runs to the end of the page; the reader
/// stops at the closing braces. Markers inside an infobox already found
/// (an embedded `| module = {{Infobox …}}`) belong to that body.
pub fn infobox_bodies(text: &str) -> Vec<&str> {
    let mut bodies = Vec::new();
    let mut consumed = 0;
    for marker in INFOBOX_MARKER.find_iter(text) {
        if marker.start() < consumed {
            continue;
        }
        consumed = template_end(text, marker.start());
        bodies.push(&text[marker.end()..]);
    }
    bodies
}

/// Offset just past the `}}` closing the template opened at `start`, or the
/// end of the text when it is never closed
fn template_end(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < bytes.len() {
        match &bytes[i..i + 2] {
            b"{{" => {
                depth += 1;
                i += 2;
            }
            b"}}" => {
                depth = depth.saturating_sub(1);
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    text.len()
}

// ============================================================================
// Tests
// ============================================================================
