pub mod block;
pub mod link;
pub mod model;
pub mod parser;

use crate::block::{Block, InlineSegment};
use crate::parser::RenderWarning;

/// A report segmented into display blocks, with footnote references resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    /// Display blocks in source order.
    pub blocks: Vec<Block>,
    /// Problems found while rendering. None of them stop rendering.
    pub warnings: Vec<RenderWarning>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl RenderedReport {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All footnote references in reading order.
    pub fn footnote_refs(&self) -> impl Iterator<Item = &InlineSegment> {
        self.blocks
            .iter()
            .flat_map(|block| block.segments())
            .filter(|segment| segment.footnote_number().is_some())
    }

    /// First reference to footnote `number`, if the report contains one.
    pub fn find_reference(&self, number: u64) -> Option<&InlineSegment> {
        self.footnote_refs()
            .find(|segment| segment.footnote_number() == Some(number))
    }

    pub fn unresolved_count(&self) -> usize {
        self.footnote_refs()
            .filter(|segment| segment.resolved_link().is_none())
            .count()
    }

    /// One line per block. See [`Block::outline`].
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            out.push_str(&block.outline());
            out.push('\n');
        }
        out
    }
}
