use std::io::{self, Write};

use codespan_reporting::term::termcolor::{Color, ColorSpec, WriteColor};

use report::RenderedReport;
use report::block::{Block, InlineSegment};
use report::model::Report;
use viewer::CitationDetail;

/// Title line for a stored report: query, date and length.
pub fn write_header(out: &mut dyn WriteColor, report: &Report) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    write!(out, "{}", report.query_text)?;
    out.reset()?;
    writeln!(
        out,
        "  ({}, {}, {} posts)",
        viewer::detail::format_timestamp(&report.created_at),
        report.report_length,
        report.posts_collected
    )?;
    writeln!(out)
}

pub fn write_report(out: &mut dyn WriteColor, report: &RenderedReport) -> io::Result<()> {
    for block in &report.blocks {
        match block {
            Block::Heading { text, .. } => {
                out.set_color(ColorSpec::new().set_bold(true).set_underline(true))?;
                write!(out, "{}", text)?;
                out.reset()?;
                writeln!(out)?;
            }
            Block::Subheading { text, .. } => {
                out.set_color(ColorSpec::new().set_bold(true))?;
                write!(out, "{}", text)?;
                out.reset()?;
                writeln!(out)?;
            }
            Block::Paragraph { segments, .. } => {
                for segment in segments {
                    write_segment(out, segment)?;
                }
                writeln!(out)?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_segment(out: &mut dyn WriteColor, segment: &InlineSegment) -> io::Result<()> {
    match segment {
        InlineSegment::Text { text, .. } => write!(out, "{}", text),
        InlineSegment::FootnoteRef { marker, link, .. } => {
            let mut spec = ColorSpec::new();
            if link.is_some() {
                spec.set_fg(Some(Color::Blue)).set_underline(true);
            } else {
                spec.set_dimmed(true);
            }
            out.set_color(&spec)?;
            write!(out, "{}", marker)?;
            out.reset()
        }
    }
}

pub fn write_detail(out: &mut dyn WriteColor, detail: &CitationDetail) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "{}", detail.reference)?;
    out.reset()?;
    writeln!(out)?;
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "{}", detail.title)?;
    out.reset()?;
    writeln!(out, "{}", detail.byline)?;
    writeln!(out, "{}", detail.posted)?;
    writeln!(out, "score {} · comments {}", detail.score, detail.comments)?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_underline(true))?;
    write!(out, "{}", detail.url)?;
    out.reset()?;
    writeln!(out)
}
