use std::io;

use serde_json::json;

use viewer::{CitationOverlay, LinkOpener, LogService};

/// Opens URLs with the platform's default browser.
pub struct SystemLinkOpener;

impl LinkOpener for SystemLinkOpener {
    fn open(&self, url: &str) -> io::Result<()> {
        open::that_detached(url)
    }
}

/// Hand the selected citation's URL to `opener`. The activity log only
/// records the open when a URL was actually handed off.
pub fn open_citation(
    overlay: &CitationOverlay,
    opener: &dyn LinkOpener,
    log: &mut LogService,
) -> bool {
    let url = overlay.selected().map(|link| link.url.clone());
    if !overlay.open_source(opener) {
        return false;
    }
    log.info("opened citation source", Some(json!({ "url": url })));
    true
}
