//! Extraction runs over dumps and single infobox texts

use anyhow::{Context, Result};
use infofacts_core::Term;
use infofacts_extractor::{
    ExtractionStats, FactEmitter, FactSink, InfoboxExtractor, MemorySink, TermExtractor,
};
use serde::Serialize;
use std::io::BufRead;

use crate::scanner::{infobox_bodies, PageScanner};

/// Extract every infobox of every page of a dump into `emitter`
pub fn extract_pages<R, S, T>(
    extractor: &InfoboxExtractor<'_, T>,
    pages: PageScanner<R>,
    emitter: &mut FactEmitter<S>,
    progress_every: u64,
) -> Result<ExtractionStats>
where
    R: BufRead,
    S: FactSink,
    T: TermExtractor + ?Sized,
{
    let mut stats = ExtractionStats::new();

    for page in pages {
        let page = page.context("Failed to read dump")?;
        stats.pages += 1;

        if page.title.is_empty() {
            tracing::debug!("Skipping page {} without title", stats.pages);
        } else {
            let subject = Term::entity(&page.title);
            let mut page_stats = ExtractionStats::new();
            for body in page.infoboxes() {
                extractor
                    .process_str(&subject, body, emitter, &mut page_stats)
                    .with_context(|| format!("Failed to write facts of {}", page.title))?;
            }
            if page_stats.infoboxes > 0 {
                tracing::debug!(
                    "{}: {} infoboxes, {} facts",
                    page.title,
                    page_stats.infoboxes,
                    page_stats.total_facts()
                );
            }
            stats.merge(&page_stats);
        }

        if progress_every > 0 && stats.pages as u64 % progress_every == 0 {
            tracing::info!(
                "Processed {} pages: {} infoboxes, {} facts",
                stats.pages,
                stats.infoboxes,
                stats.total_facts()
            );
        }
    }

    emitter.flush().context("Failed to flush output datasets")?;
    Ok(stats)
}

/// Records and counters of one inspected text
#[derive(Debug, Serialize)]
pub struct InspectReport {
    #[serde(flatten)]
    pub records: MemorySink,
    pub stats: ExtractionStats,
}

/// Extract one text for `subject`. Every infobox marker in the text is
/// processed; text without markers is read as a single infobox body.
pub fn inspect_text<T>(
    extractor: &InfoboxExtractor<'_, T>,
    subject: &str,
    text: &str,
) -> Result<InspectReport>
where
    T: TermExtractor + ?Sized,
{
    let subject = Term::entity(subject);
    let mut emitter = FactEmitter::new(MemorySink::new());
    let mut stats = ExtractionStats::new();

    let mut bodies = infobox_bodies(text);
    if bodies.is_empty() {
        bodies.push(text);
    }
    for body in bodies {
        extractor.process_str(&subject, body, &mut emitter, &mut stats)?;
    }

    Ok(InspectReport {
        records: emitter.into_sink(),
        stats,
    })
}
