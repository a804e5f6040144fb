use std::io;

use tracing::warn;

use report::RenderedReport;
use report::block::InlineSegment;
use report::model::FootnoteLink;

use crate::detail::CitationDetail;

/// Opens a URL outside the application (system browser).
pub trait LinkOpener {
    fn open(&self, url: &str) -> io::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverlayState {
    #[default]
    Closed,
    Open(FootnoteLink),
}

/// Citation detail overlay driven by footnote activation.
///
/// `Closed --activate(resolved)--> Open(link)`, `Open --dismiss--> Closed`.
/// Activating another resolved reference while open swaps the link.
/// Activating an unresolved reference does nothing.
#[derive(Debug, Default)]
pub struct CitationOverlay {
    state: OverlayState,
}

impl CitationOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, OverlayState::Open(_))
    }

    pub fn selected(&self) -> Option<&FootnoteLink> {
        match &self.state {
            OverlayState::Open(link) => Some(link),
            OverlayState::Closed => None,
        }
    }

    /// Returns true if the overlay now shows the segment's citation.
    pub fn activate(&mut self, segment: &InlineSegment) -> bool {
        let InlineSegment::FootnoteRef {
            link: Some(link), ..
        } = segment
        else {
            return false;
        };
        self.state = OverlayState::Open(link.clone());
        true
    }

    /// Activate the first reference to `number` in `report`.
    pub fn activate_number(&mut self, report: &RenderedReport, number: u64) -> bool {
        report
            .find_reference(number)
            .is_some_and(|segment| self.activate(segment))
    }

    pub fn dismiss(&mut self) {
        self.state = OverlayState::Closed;
    }

    pub fn detail(&self) -> Option<CitationDetail> {
        self.selected().map(CitationDetail::from_link)
    }

    /// Hand the selected citation's URL to `opener`. Fire-and-forget: an
    /// opener failure is logged, not returned. Returns false when there is
    /// nothing to open.
    pub fn open_source(&self, opener: &dyn LinkOpener) -> bool {
        let Some(link) = self.selected() else {
            return false;
        };
        if link.url.is_empty() {
            return false;
        }
        if let Err(err) = opener.open(&link.url) {
            warn!(url = %link.url, error = %err, "failed to open citation source");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footnote(number: u64, link: Option<FootnoteLink>) -> InlineSegment {
        InlineSegment::FootnoteRef {
            number,
            marker: format!("[{}]", number),
            link,
            span: 0..3,
        }
    }

    fn link(number: u64) -> FootnoteLink {
        FootnoteLink {
            footnote_number: number,
            url: format!("https://reddit.com/{}", number),
            title: String::new(),
            score: 0,
            comments: 0,
            subreddit: String::new(),
            author: String::new(),
            created_utc: String::new(),
        }
    }

    #[test]
    fn starts_closed() {
        let overlay = CitationOverlay::new();
        assert_eq!(overlay.state(), &OverlayState::Closed);
        assert!(overlay.detail().is_none());
    }

    #[test]
    fn plain_text_is_not_activatable() {
        let mut overlay = CitationOverlay::new();
        let text = InlineSegment::Text {
            text: "hello".into(),
            span: 0..5,
        };
        assert!(!overlay.activate(&text));
        assert!(!overlay.is_open());
    }

    #[test]
    fn reactivation_swaps_content() {
        let mut overlay = CitationOverlay::new();
        assert!(overlay.activate(&footnote(1, Some(link(1)))));
        assert!(overlay.activate(&footnote(2, Some(link(2)))));
        assert_eq!(overlay.selected(), Some(&link(2)));
    }

    #[test]
    fn empty_url_is_not_opened() {
        let mut overlay = CitationOverlay::new();
        let mut no_url = link(1);
        no_url.url.clear();
        overlay.activate(&footnote(1, Some(no_url)));

        struct Panics;
        impl LinkOpener for Panics {
            fn open(&self, _url: &str) -> io::Result<()> {
                panic!("should not be called");
            }
        }
        assert!(!overlay.open_source(&Panics));
    }
}
