//! Doc comment processing: synopsis extraction and HTML rendering
//!
//! Rendering is pure. [`LazyHtml`] memoizes the result on the value that owns
//! the text so repeated `html()` calls return the same string without
//! re-rendering.

use std::sync::OnceLock;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

/// Heading level used for package documentation
pub const PACKAGE_HEADING_LEVEL: u8 = 2;

/// Heading level used for symbol documentation
pub const SYMBOL_HEADING_LEVEL: u8 = 3;

const LEGACY_NOTICE_PREFIXES: &[&str] = &["copyright", "all rights", "author"];

/// Returns the first sentence of a doc comment with whitespace collapsed.
///
/// Text that opens with a copyright or authorship notice has no synopsis.
pub fn synopsis(text: &str) -> String {
    let trimmed = text.trim();
    let paragraph = trimmed.split("\n\n").next().unwrap_or_default();
    let collapsed = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");

    let lower = collapsed.to_lowercase();
    if LEGACY_NOTICE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return String::new();
    }

    first_sentence(&collapsed).to_string()
}

fn first_sentence(text: &str) -> &str {
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (i, &(pos, ch)) in chars.iter().enumerate() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }

        let at_end = i + 1 == chars.len();
        let followed_by_space = chars.get(i + 1).is_some_and(|(_, c)| c.is_whitespace());
        if !at_end && !followed_by_space {
            continue;
        }

        // "J. Smith": a period after a lone capital letter is an initial
        if ch == '.' && i >= 1 {
            let prev = chars[i - 1].1;
            let before_prev = if i >= 2 { Some(chars[i - 2].1) } else { None };
            if prev.is_uppercase() && before_prev.is_none_or(|c| c.is_whitespace()) {
                continue;
            }
        }

        return &text[..pos + ch.len_utf8()];
    }

    text
}

/// Renders doc text to HTML, shifting headings so that a top-level `#`
/// heading becomes `<h{heading_level}>`.
pub fn render_html(text: &str, heading_level: u8) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let shift = usize::from(heading_level.clamp(1, 6)) - 1;
    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Start(Tag::Heading {
            level,
            id,
            classes,
            attrs,
        }) => Event::Start(Tag::Heading {
            level: shift_heading(level, shift),
            id,
            classes,
            attrs,
        }),
        Event::End(TagEnd::Heading(level)) => Event::End(TagEnd::Heading(shift_heading(level, shift))),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 2);
    html::push_html(&mut out, parser);
    out
}

fn shift_heading(level: HeadingLevel, shift: usize) -> HeadingLevel {
    HeadingLevel::try_from((level as usize + shift).min(6)).unwrap_or(HeadingLevel::H6)
}

/// HTML derived from doc text, rendered on first access and then reused
#[derive(Debug, Default, Clone)]
pub struct LazyHtml {
    cell: OnceLock<String>,
}

impl LazyHtml {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rendered HTML, rendering `text` the first time only
    pub fn get_or_render(&self, text: &str, heading_level: u8) -> &str {
        self.cell.get_or_init(|| render_html(text, heading_level))
    }

    pub fn is_rendered(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Derived state never participates in equality
impl PartialEq for LazyHtml {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synopsis_first_sentence() {
        let text = "Package fmt implements formatted I/O with functions analogous\nto C's printf and scanf. The format verbs are derived from C's.";
        assert_eq!(
            synopsis(text),
            "Package fmt implements formatted I/O with functions analogous to C's printf and scanf."
        );
    }

    #[test]
    fn test_synopsis_stops_at_paragraph() {
        assert_eq!(
            synopsis("Package x does things\n\nMore detail here."),
            "Package x does things"
        );
    }

    #[test]
    fn test_synopsis_skips_initials_and_notices() {
        assert_eq!(
            synopsis("Written with J. Smith in mind. Second."),
            "Written with J. Smith in mind."
        );
        assert_eq!(synopsis("Copyright 2024 The Authors."), "");
        assert_eq!(synopsis(""), "");
    }

    #[test]
    fn test_synopsis_ignores_embedded_dots() {
        assert_eq!(
            synopsis("Package http provides net/http.Client helpers. Use it."),
            "Package http provides net/http.Client helpers."
        );
    }

    #[test]
    fn test_render_html_shifts_headings() {
        let html = render_html("Intro.\n\n# Usage\n\nCall it.", SYMBOL_HEADING_LEVEL);
        assert!(html.contains("<h3>Usage</h3>"), "{html}");
        assert!(html.contains("<p>Intro.</p>"));

        let html = render_html("# Usage", PACKAGE_HEADING_LEVEL);
        assert!(html.contains("<h2>Usage</h2>"), "{html}");
    }

    #[test]
    fn test_render_html_code_block() {
        let html = render_html("Example:\n\n\tfmt.Println(\"hi\")\n", SYMBOL_HEADING_LEVEL);
        assert!(html.contains("<pre><code>"), "{html}");
    }

    #[test]
    fn test_render_html_empty() {
        assert_eq!(render_html("   ", SYMBOL_HEADING_LEVEL), "");
    }

    #[test]
    fn test_lazy_html_renders_once() {
        let lazy = LazyHtml::new();
        assert!(!lazy.is_rendered());

        let first = lazy.get_or_render("Hello *world*.", SYMBOL_HEADING_LEVEL).to_string();
        assert!(lazy.is_rendered());

        // Different input after the first render must not change the value
        let second = lazy.get_or_render("something else", SYMBOL_HEADING_LEVEL);
        assert_eq!(first, second);
        assert_eq!(first, render_html("Hello *world*.", SYMBOL_HEADING_LEVEL));
    }
}
