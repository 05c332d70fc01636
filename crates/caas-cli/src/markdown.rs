//! Markdown → `Document` splitting.
//!
//! A lone leading H1 is the document title. Sections split at the shallowest
//! remaining heading level; deeper headings stay in the section body as raw
//! Markdown, so body-level cues (code fences, a nested "Definitions" heading)
//! survive for weighting.

use std::ops::Range;

use caas_core::Document;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// Title used for text that precedes the first section heading.
const PREAMBLE_TITLE: &str = "Preamble";

struct Heading {
    level: HeadingLevel,
    text: String,
    range: Range<usize>,
}

fn collect_headings(source: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut current: Option<Heading> = None;

    for (event, range) in Parser::new(source).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some(Heading {
                    level,
                    text: String::new(),
                    range,
                });
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut heading) = current.take() {
                    heading.text = heading.text.trim().to_string();
                    headings.push(heading);
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(&text);
                }
            }
            _ => {}
        }
    }
    headings
}

pub fn parse_markdown(id: &str, source: &str) -> Document {
    let headings = collect_headings(source);

    let h1_count = headings.iter().filter(|h| h.level == HeadingLevel::H1).count();
    let (title, rest) = match headings.split_first() {
        Some((first, rest)) if first.level == HeadingLevel::H1 && h1_count == 1 => {
            (Some(first), rest)
        }
        _ => (None, headings.as_slice()),
    };

    let split_level = rest.iter().map(|h| h.level).min();
    let splits: Vec<&Heading> = rest
        .iter()
        .filter(|h| Some(h.level) == split_level)
        .collect();

    let mut doc = Document::new(id, title.map_or(id, |h| h.text.as_str()));

    let preamble_start = title.map_or(0, |h| h.range.end);
    let preamble_end = splits.first().map_or(source.len(), |h| h.range.start);
    let preamble = source[preamble_start..preamble_end].trim();
    if !preamble.is_empty() {
        doc.push_section(title.map_or(PREAMBLE_TITLE, |h| h.text.as_str()), preamble);
    }

    for (i, heading) in splits.iter().enumerate() {
        let end = splits.get(i + 1).map_or(source.len(), |next| next.range.start);
        doc.push_section(&heading.text, source[heading.range.end..end].trim());
    }
    doc
}
