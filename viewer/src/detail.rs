use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

use report::model::FootnoteLink;

const POSTED_FORMAT: &str = "%B %-d, %Y %H:%M";

/// Display-ready fields for a selected citation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationDetail {
    pub number: u64,
    /// `Reference [n]`
    pub reference: String,
    pub title: String,
    /// `r/{subreddit} • u/{author}`
    pub byline: String,
    pub posted: String,
    pub score: i64,
    pub comments: i64,
    pub url: String,
}

impl CitationDetail {
    pub fn from_link(link: &FootnoteLink) -> Self {
        CitationDetail {
            number: link.footnote_number,
            reference: format!("Reference [{}]", link.footnote_number),
            title: link.title.clone(),
            byline: format!("r/{} • u/{}", link.subreddit, link.author),
            posted: format_timestamp(&link.created_utc),
            score: link.score,
            comments: link.comments,
            url: link.url.clone(),
        }
    }
}

/// Format a backend timestamp for display. Input that does not parse is
/// returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(time) => time.format(POSTED_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// Accepts RFC 3339, naive ISO 8601 (treated as UTC) and Unix seconds.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(time) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(time.and_utc());
        }
    }
    let seconds = raw.parse::<f64>().ok().filter(|s| s.is_finite())?;
    DateTime::from_timestamp(seconds.trunc() as i64, 0)
}

impl fmt::Display for CitationDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.reference)?;
        writeln!(f)?;
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.byline)?;
        writeln!(f, "{}", self.posted)?;
        writeln!(f, "score {} · comments {}", self.score, self.comments)?;
        write!(f, "{}", self.url)
    }
}
