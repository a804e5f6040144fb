use std::ops::Range;

use crate::block::Block;
use crate::link::LinkIndex;
use crate::parser::footnote;
use crate::parser::warning::RenderWarning;

const SEGMENT_BREAK: &str = "\n\n";
const HEADING_MARKER: &str = "##";
const STRONG_MARKER: &str = "**";

/// Split the report on blank lines and classify each non-blank segment.
pub(super) fn segment_blocks(
    source: &str,
    links: &LinkIndex,
    file_id: usize,
    warnings: &mut Vec<RenderWarning>,
) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut offset = 0;

    for raw in source.split(SEGMENT_BREAK) {
        let start = offset;
        offset += raw.len() + SEGMENT_BREAK.len();

        let text = raw.trim();
        if text.is_empty() {
            continue;
        }
        let leading = raw.len() - raw.trim_start().len();
        let span = start + leading..start + leading + text.len();
        blocks.push(classify(text, span, links, file_id, warnings));
    }

    blocks
}

/// Heading, then subheading, then paragraph. First match wins.
fn classify(
    text: &str,
    span: Range<usize>,
    links: &LinkIndex,
    file_id: usize,
    warnings: &mut Vec<RenderWarning>,
) -> Block {
    if let Some(rest) = text.strip_prefix(HEADING_MARKER) {
        return Block::Heading {
            text: rest.trim().to_string(),
            span,
        };
    }

    if is_subheading(text) {
        return Block::Subheading {
            text: text.replace(STRONG_MARKER, ""),
            span,
        };
    }

    let segments = footnote::scan(text, span.start, links, file_id, warnings);
    Block::Paragraph { segments, span }
}

fn is_subheading(text: &str) -> bool {
    text.len() >= 2 * STRONG_MARKER.len()
        && text.starts_with(STRONG_MARKER)
        && text.ends_with(STRONG_MARKER)
}
