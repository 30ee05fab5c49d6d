//! Turns raw source bodies into narration-ready text.
//!
//! Markup goes, paragraph breaks become single spaces, and the result is
//! capped so a single story never outgrows the narrator.

use html2text::render::text_renderer::TrivialDecorator;

/// Wide enough that html2text never wraps a line on its own
const RENDER_WIDTH: usize = 10_000;

/// Markdown emphasis markers the source leaves in bodies
const EMPHASIS_MARKERS: [&str; 3] = ["**", "__", "~~"];

/// Full pipeline for a plain (markdown) body
pub fn normalize_story_text(raw: &str, max_chars: usize) -> String {
    let decoded = decode_entities(raw);
    let plain = strip_emphasis(&decoded);
    let collapsed = collapse_paragraphs(&plain);
    truncate_chars(&collapsed, max_chars).to_string()
}

/// Full pipeline for an HTML-rendered body
pub fn normalize_story_html(html: &str, max_chars: usize) -> String {
    // The source escapes its rendered HTML once more on the wire
    let html = decode_entities(html);
    let text = html2text::from_read_with_decorator(
        html.as_bytes(),
        RENDER_WIDTH,
        TrivialDecorator::new(),
    );
    normalize_story_text(&text, max_chars)
}

/// Decode the handful of entities the source escapes in post bodies
pub fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x200B;", "")
        .replace('\u{200B}', "")
}

pub fn strip_emphasis(text: &str) -> String {
    EMPHASIS_MARKERS
        .iter()
        .fold(text.to_string(), |acc, marker| acc.replace(marker, ""))
}

/// Join paragraphs (separated by blank lines) with a single space.
///
/// Line breaks inside a paragraph are kept.
pub fn collapse_paragraphs(text: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(trimmed);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs.join(" ")
}

/// Cap `text` at `max_chars` characters, respecting UTF-8 boundaries
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
