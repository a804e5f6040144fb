use report::block::{Block, InlineSegment};
use report::model::FootnoteLink;
use report::parser::{WarningKind, render};

fn link(number: u64) -> FootnoteLink {
    FootnoteLink {
        footnote_number: number,
        url: format!("https://www.reddit.com/r/stocks/comments/{}", number),
        title: format!("Thread {}", number),
        score: 120,
        comments: 45,
        subreddit: "stocks".into(),
        author: "analyst".into(),
        created_utc: "2024-03-05T14:30:00Z".into(),
    }
}

fn texts(block: &Block) -> Vec<String> {
    block.segments().iter().map(|s| s.to_string()).collect()
}

#[test]
fn heading_then_paragraph_with_mixed_references() {
    let links = vec![link(1)];
    let out = render(
        "## Intro\n\nTSLA is rising [1]. Analysts disagree [2].",
        &links,
    );

    assert_eq!(out.blocks.len(), 2);
    assert!(matches!(&out.blocks[0], Block::Heading { text, .. } if text == "Intro"));

    let segments = out.blocks[1].segments();
    assert_eq!(
        texts(&out.blocks[1]),
        vec!["TSLA is rising ", "[1]", ". Analysts disagree ", "[2]", "."]
    );
    assert_eq!(segments[1].resolved_link(), Some(&links[0]));
    assert_eq!(segments[3].footnote_number(), Some(2));
    assert_eq!(segments[3].resolved_link(), None);

    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].kind, WarningKind::UnresolvedReference(2));
}

#[test]
fn subheading_then_plain_paragraph() {
    let out = render("**Key Point**\n\nNo citations here.", &[]);
    assert_eq!(
        out.outline(),
        "subheading: Key Point\nparagraph: No citations here.\n"
    );
    assert!(out.warnings.is_empty());
}

#[test]
fn empty_report_has_no_blocks() {
    assert!(render("", &[]).is_empty());
    assert!(render(" \n\n\t\n\n ", &[link(1)]).is_empty());
}

#[test]
fn digit_run_with_letter_is_plain_text() {
    let out = render("Ticker [12a] mentioned", &[link(12)]);
    assert_eq!(
        out.blocks[0].segments(),
        &[InlineSegment::Text {
            text: "Ticker [12a] mentioned".into(),
            span: 0..22,
        }]
    );
}

#[test]
fn resolution_matches_link_numbers_exactly() {
    let links = vec![link(1), link(3), link(10)];
    let out = render("[1] [2] [3] [10] [100]", &links);
    for segment in out.footnote_refs() {
        let number = segment.footnote_number().unwrap();
        let expected = links.iter().find(|l| l.footnote_number == number);
        assert_eq!(segment.resolved_link(), expected, "footnote {}", number);
    }
    assert_eq!(out.unresolved_count(), 2);
}

#[test]
fn paragraph_segments_reconstruct_source() {
    let inputs = [
        "plain",
        "[1]",
        "a[1]b[22]c",
        "[[3]] and [ 4] and [5",
        "multi\nline [1]\nparagraph",
        "unicode 한국어 [2] text",
    ];
    for input in inputs {
        let out = render(input, &[link(1), link(2)]);
        assert_eq!(out.blocks.len(), 1, "{:?}", input);
        assert_eq!(out.blocks[0].to_string(), input);
        for segment in out.blocks[0].segments() {
            assert_eq!(&input[segment.span().clone()], segment.to_string());
        }
    }
}

#[test]
fn block_text_preserves_content_in_order() {
    let source = "## Summary\n\n**Sentiment**\n\nBullish [1] overall.\n\n\n\nBearish [2] minority.";
    let out = render(source, &[link(1)]);
    let joined: Vec<String> = out.blocks.iter().map(|b| b.to_string()).collect();
    assert_eq!(
        joined,
        vec![
            "Summary",
            "Sentiment",
            "Bullish [1] overall.",
            "Bearish [2] minority."
        ]
    );
}

#[test]
fn block_spans_point_into_source() {
    let source = "## Summary\n\nBody [1]";
    let out = render(source, &[]);
    assert_eq!(&source[out.blocks[0].span().clone()], "## Summary");
    assert_eq!(&source[out.blocks[1].span().clone()], "Body [1]");
    assert_eq!(&source[out.warnings[0].span.clone()], "[1]");
}

#[test]
fn rendering_is_idempotent() {
    let source = "## A\n\n**B**\n\nC [1] D [2] E [99999999999999999999999]";
    let links = vec![link(2), link(1), link(2)];
    let first = render(source, &links);
    for _ in 0..5 {
        assert_eq!(render(source, &links), first);
    }
}

#[test]
fn duplicate_links_warn_and_keep_first() {
    let mut second = link(1);
    second.url = "https://example.com/other".into();
    let links = vec![link(1), second];
    let out = render("See [1].", &links);

    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].kind, WarningKind::DuplicateLink(1));
    assert_eq!(out.find_reference(1).and_then(|s| s.resolved_link()), Some(&links[0]));
}

#[test]
fn warnings_convert_to_diagnostics() {
    let out = render("x [4]", &[]);
    let diagnostic = out.warnings[0].to_diagnostic();
    assert_eq!(diagnostic.message, "footnote [4] has no matching link");
    assert_eq!(diagnostic.labels[0].range, 2..5);
    assert_eq!(diagnostic.notes.len(), 1);
}
