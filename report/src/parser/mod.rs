mod footnote;
mod segment;
pub mod warning;

pub use warning::{RenderWarning, WarningKind};

use tracing::debug;

use crate::RenderedReport;
use crate::link::LinkIndex;
use crate::model::FootnoteLink;

/// Report renderer entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Segment the report and resolve its footnote references against `links`.
    /// Never fails: anything ambiguous is kept as plain text.
    pub fn render(&self, links: &LinkIndex) -> RenderedReport {
        let mut warnings = Vec::new();
        for &number in links.duplicates() {
            warnings.push(RenderWarning::new(
                WarningKind::DuplicateLink(number),
                0..self.source.len(),
                self.file_id,
            ));
        }

        let blocks = segment::segment_blocks(&self.source, links, self.file_id, &mut warnings);
        debug!(
            blocks = blocks.len(),
            warnings = warnings.len(),
            "rendered report"
        );

        RenderedReport {
            blocks,
            warnings,
            source_id: self.file_id,
        }
    }
}

/// Render a report that is not registered with a codespan file database.
pub fn render(full_report: &str, links: &[FootnoteLink]) -> RenderedReport {
    Parser::new(full_report.to_string(), 0).render(&LinkIndex::new(links))
}
