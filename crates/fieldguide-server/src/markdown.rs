//! Markdown to plain text, for search indexing and snippets.

use pulldown_cmark::{Event, Options, Parser, Tag};

/// Flattens markdown into a single line of plain text. Formatting, link
/// targets, and raw HTML are dropped; link labels, code, and alt text are
/// kept. Runs of whitespace collapse to single spaces.
pub(crate) fn strip_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut text = String::new();
    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::Paragraph | Tag::Item | Tag::Heading { .. } | Tag::CodeBlock(_)) => {
                text.push(' ');
            }
            Event::Text(chunk) | Event::Code(chunk) => text.push_str(&chunk),
            Event::SoftBreak | Event::HardBreak | Event::Rule => text.push(' '),
            _ => {}
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
