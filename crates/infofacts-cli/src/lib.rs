//! infofacts CLI support
//!
//! Dump scanning and the extraction runs behind the `infofacts` binary.

pub mod run;
pub mod scanner;

pub use run::{extract_pages, inspect_text, InspectReport};
pub use scanner::{infobox_bodies, Page, PageScanner};
