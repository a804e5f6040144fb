use std::fmt;
use std::ops::Range;

use crate::model::FootnoteLink;

/// A top-level display unit of a report.
/// Spans are byte ranges into the original report text.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// `## Title`
    Heading { text: String, span: Range<usize> },
    /// `**Title**`
    Subheading { text: String, span: Range<usize> },
    Paragraph {
        segments: Vec<InlineSegment>,
        span: Range<usize>,
    },
}

/// A span of paragraph text.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineSegment {
    Text { text: String, span: Range<usize> },
    /// An inline `[n]` marker. `link` is `None` when no citation has that number.
    FootnoteRef {
        number: u64,
        /// The marker exactly as written, e.g. `[3]` or `[03]`.
        marker: String,
        link: Option<FootnoteLink>,
        span: Range<usize>,
    },
}

impl Block {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Block::Heading { span, .. } => span,
            Block::Subheading { span, .. } => span,
            Block::Paragraph { span, .. } => span,
        }
    }

    /// Inline segments of a paragraph; empty for headings.
    pub fn segments(&self) -> &[InlineSegment] {
        match self {
            Block::Paragraph { segments, .. } => segments,
            _ => &[],
        }
    }

    /// Stable single-line dump. Resolved references print as `[^n]`,
    /// unresolved ones as `[?n]`, and newlines as `\n`.
    pub fn outline(&self) -> String {
        match self {
            Block::Heading { text, .. } => format!("heading: {}", escape_newlines(text)),
            Block::Subheading { text, .. } => format!("subheading: {}", escape_newlines(text)),
            Block::Paragraph { segments, .. } => {
                let mut line = String::from("paragraph: ");
                for segment in segments {
                    match segment {
                        InlineSegment::Text { text, .. } => line.push_str(&escape_newlines(text)),
                        InlineSegment::FootnoteRef {
                            number, link: Some(_), ..
                        } => line.push_str(&format!("[^{}]", number)),
                        InlineSegment::FootnoteRef {
                            number, link: None, ..
                        } => line.push_str(&format!("[?{}]", number)),
                    }
                }
                line
            }
        }
    }
}

impl InlineSegment {
    pub fn span(&self) -> &Range<usize> {
        match self {
            InlineSegment::Text { span, .. } => span,
            InlineSegment::FootnoteRef { span, .. } => span,
        }
    }

    pub fn footnote_number(&self) -> Option<u64> {
        match self {
            InlineSegment::FootnoteRef { number, .. } => Some(*number),
            InlineSegment::Text { .. } => None,
        }
    }

    pub fn resolved_link(&self) -> Option<&FootnoteLink> {
        match self {
            InlineSegment::FootnoteRef { link, .. } => link.as_ref(),
            InlineSegment::Text { .. } => None,
        }
    }

    /// Whether activating this segment does anything.
    pub fn is_interactive(&self) -> bool {
        self.resolved_link().is_some()
    }
}

fn escape_newlines(text: &str) -> String {
    text.replace('\n', "\\n")
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Heading { text, .. } => write!(f, "{}", text),
            Block::Subheading { text, .. } => write!(f, "{}", text),
            Block::Paragraph { segments, .. } => {
                for segment in segments {
                    write!(f, "{}", segment)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for InlineSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InlineSegment::Text { text, .. } => write!(f, "{}", text),
            InlineSegment::FootnoteRef { marker, .. } => write!(f, "{}", marker),
        }
    }
}
