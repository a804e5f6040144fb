use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// A `[n]` marker with no link numbered `n`.
    UnresolvedReference(u64),
    /// A bracketed digit run too large for a footnote number.
    NumberOutOfRange(String),
    /// The link list defines the same number more than once.
    DuplicateLink(u64),
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::UnresolvedReference(n) => {
                write!(f, "footnote [{}] has no matching link", n)
            }
            WarningKind::NumberOutOfRange(digits) => {
                write!(f, "footnote number {} is out of range", digits)
            }
            WarningKind::DuplicateLink(n) => {
                write!(f, "link list defines footnote {} more than once", n)
            }
        }
    }
}

/// A non-fatal rendering problem with source location information.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderWarning {
    pub kind: WarningKind,
    pub span: Range<usize>,
    pub file_id: usize,
    pub notes: Vec<String>,
}

impl RenderWarning {
    pub fn new(kind: WarningKind, span: Range<usize>, file_id: usize) -> Self {
        let note = match &kind {
            WarningKind::UnresolvedReference(_) => "the reference is shown but cannot be opened",
            WarningKind::NumberOutOfRange(_) => "the marker is kept as plain text",
            WarningKind::DuplicateLink(_) => "the first definition is used",
        };
        RenderWarning {
            kind,
            span,
            file_id,
            notes: vec![note.to_string()],
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(Severity::Warning)
            .with_message(self.message())
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}
