use std::fmt;

use serde::{Deserialize, Serialize};

/// Source post metadata addressed by a footnote number.
///
/// Only `footnote_number` and `url` are required when deserializing; the
/// backend occasionally drops metadata from partial responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootnoteLink {
    pub footnote_number: u64,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub created_utc: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLength {
    Simple,
    #[default]
    Moderate,
    Detailed,
}

impl fmt::Display for ReportLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLength::Simple => write!(f, "simple"),
            ReportLength::Moderate => write!(f, "moderate"),
            ReportLength::Detailed => write!(f, "detailed"),
        }
    }
}

/// A stored analysis report as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub query_text: String,
    #[serde(default)]
    pub summary: String,
    pub full_report: String,
    pub created_at: String,
    #[serde(default)]
    pub posts_collected: u64,
    #[serde(default)]
    pub report_length: ReportLength,
}

/// The minimal input a renderer needs: report text plus its citations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportPayload {
    pub full_report: String,
    #[serde(default, alias = "report_links")]
    pub links: Vec<FootnoteLink>,
}

/// Either a bare payload or a full report record with its links.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ReportDocument {
    Detail {
        report: Report,
        #[serde(default, alias = "report_links")]
        links: Vec<FootnoteLink>,
    },
    Payload(ReportPayload),
}

impl ReportDocument {
    /// The stored report record, when the document carried one.
    pub fn report(&self) -> Option<&Report> {
        match self {
            ReportDocument::Detail { report, .. } => Some(report),
            ReportDocument::Payload(_) => None,
        }
    }

    pub fn full_report(&self) -> &str {
        match self {
            ReportDocument::Detail { report, .. } => &report.full_report,
            ReportDocument::Payload(payload) => &payload.full_report,
        }
    }

    pub fn links(&self) -> &[FootnoteLink] {
        match self {
            ReportDocument::Detail { links, .. } => links,
            ReportDocument::Payload(payload) => &payload.links,
        }
    }

    pub fn into_payload(self) -> ReportPayload {
        match self {
            ReportDocument::Detail { report, links } => ReportPayload {
                full_report: report.full_report,
                links,
            },
            ReportDocument::Payload(payload) => payload,
        }
    }
}
