use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::block::InlineSegment;
use crate::link::LinkIndex;
use crate::parser::warning::{RenderWarning, WarningKind};

// ASCII digits only; `\d` would also accept other Unicode decimal digits.
static FOOTNOTE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([0-9]+)\]").expect("footnote pattern is valid"));

/// Split paragraph text around `[n]` markers.
///
/// The returned segments cover `text` with no gaps or overlaps. `base` is the
/// byte offset of `text` within the whole report, used for spans. A digit run
/// that overflows `u64` is not a footnote and stays in the surrounding text.
pub(super) fn scan(
    text: &str,
    base: usize,
    links: &LinkIndex,
    file_id: usize,
    warnings: &mut Vec<RenderWarning>,
) -> Vec<InlineSegment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for captures in FOOTNOTE_PATTERN.captures_iter(text) {
        let (Some(marker), Some(digits)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let span = base + marker.start()..base + marker.end();

        let Ok(number) = digits.as_str().parse::<u64>() else {
            warnings.push(RenderWarning::new(
                WarningKind::NumberOutOfRange(digits.as_str().to_string()),
                span,
                file_id,
            ));
            continue;
        };

        push_text(&mut segments, text, last..marker.start(), base);

        let link = links.get(number).cloned();
        if link.is_none() {
            warnings.push(RenderWarning::new(
                WarningKind::UnresolvedReference(number),
                span.clone(),
                file_id,
            ));
        }
        segments.push(InlineSegment::FootnoteRef {
            number,
            marker: marker.as_str().to_string(),
            link,
            span,
        });
        last = marker.end();
    }

    push_text(&mut segments, text, last..text.len(), base);
    segments
}

fn push_text(segments: &mut Vec<InlineSegment>, text: &str, range: Range<usize>, base: usize) {
    if range.is_empty() {
        return;
    }
    segments.push(InlineSegment::Text {
        text: text[range.clone()].to_string(),
        span: base + range.start..base + range.end,
    });
}
