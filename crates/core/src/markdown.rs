//! Markdown rendering service.
//!
//! A thin adapter over markdown-rs. Every call takes an explicit
//! [`RenderOptions`]; there is no shared renderer state to reconfigure.

use crate::ContentError;
use crate::code_fence::{FenceState, advance_fence_state, is_indented_code_block};
use crate::error::SourceLocation;
use crate::outline::parse_heading_line;
use crate::slug::normalize;
use markdown::message::{Message, Place};

/// Rendering options threaded through every render call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Enable GitHub Flavored Markdown constructs.
    pub gfm: bool,
    /// Pass raw HTML through untouched (required for transformed blocks).
    pub allow_raw_html: bool,
    /// Emit `id` attributes on ATX headings using [`normalize`].
    pub heading_ids: bool,
}

impl RenderOptions {
    /// Options for a full document render (heading ids on).
    pub const fn document() -> Self {
        Self {
            gfm: true,
            allow_raw_html: true,
            heading_ids: true,
        }
    }

    /// Options for fragments such as callout bodies and section content.
    pub const fn fragment() -> Self {
        Self {
            gfm: true,
            allow_raw_html: true,
            heading_ids: false,
        }
    }

    /// Same options with heading-id injection switched on or off.
    pub const fn with_heading_ids(self, heading_ids: bool) -> Self {
        Self {
            heading_ids,
            ..self
        }
    }

    /// Convert to markdown-rs `Options`.
    pub fn to_markdown(self) -> markdown::Options {
        let mut parse = if self.gfm {
            markdown::ParseOptions::gfm()
        } else {
            markdown::ParseOptions::default()
        };
        parse.constructs.html_flow = self.allow_raw_html;
        parse.constructs.html_text = self.allow_raw_html;

        markdown::Options {
            parse,
            compile: markdown::CompileOptions {
                allow_dangerous_html: self.allow_raw_html,
                // `concept:` and `principle:` hrefs are read by the presentation layer
                allow_dangerous_protocol: true,
                ..markdown::CompileOptions::default()
            },
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::document()
    }
}

/// Render Markdown to HTML.
pub fn render_markdown(input: &str, options: &RenderOptions) -> Result<String, ContentError> {
    let md_options = options.to_markdown();
    if options.heading_ids {
        let prepared = inject_heading_ids(input, &md_options);
        to_html(&prepared, &md_options)
    } else {
        to_html(input, &md_options)
    }
}

/// Render a single line of inline Markdown without the paragraph wrapper.
///
/// Falls back to escaped text when the line does not render as one
/// paragraph (for example `- item`).
pub fn render_inline(text: &str, options: &RenderOptions) -> String {
    render_inline_with(text, &options.with_heading_ids(false).to_markdown())
}

fn render_inline_with(text: &str, md_options: &markdown::Options) -> String {
    let escaped = || html_escape::encode_text(text).into_owned();
    match to_html(text.trim(), md_options) {
        Ok(html) => html
            .trim_end()
            .strip_prefix("<p>")
            .and_then(|rest| rest.strip_suffix("</p>"))
            .filter(|inner| !inner.contains("<p>"))
            .map(str::to_string)
            .unwrap_or_else(escaped),
        Err(_) => escaped(),
    }
}

fn to_html(input: &str, md_options: &markdown::Options) -> Result<String, ContentError> {
    markdown::to_html_with_options(input, md_options)
        .map_err(|err| ContentError::render_error(err.to_string(), message_location(&err)))
}

/// Replace ATX heading lines with raw `<hN id="...">` blocks.
fn inject_heading_ids(input: &str, md_options: &markdown::Options) -> String {
    let mut fence_state = FenceState::default();
    let mut output = String::with_capacity(input.len() + 64);

    for line in input.lines() {
        let outcome = advance_fence_state(line, fence_state);
        fence_state = outcome.next_state;

        let heading = if outcome.in_code || is_indented_code_block(line) {
            None
        } else {
            parse_heading_line(line)
        };

        match heading {
            Some(heading) => {
                let inner = render_inline_with(heading.title, md_options);
                output.push_str(&format!(
                    "<h{level} id=\"{id}\">{inner}</h{level}>\n\n",
                    level = heading.level,
                    id = normalize(heading.title),
                ));
            }
            None => {
                output.push_str(line);
                output.push('\n');
            }
        }
    }

    output
}

/// Make rendered HTML safe to embed in Markdown source as one HTML block.
///
/// An HTML block ends at the first blank line, so blank lines (which only
/// survive inside `<pre>`) are folded into the previous line as `&#10;`.
/// Later stages scan the text line by line, so a line may not start with a
/// heading marker or a fence marker either; those are written as entities.
pub fn seal_html_block(html: &str) -> String {
    let mut sealed = String::with_capacity(html.len());
    for (idx, line) in html.trim_end_matches('\n').split('\n').enumerate() {
        if idx > 0 {
            if line.trim().is_empty() {
                sealed.push_str("&#10;");
            } else {
                sealed.push('\n');
            }
        }
        push_inert_line(&mut sealed, line);
    }
    sealed
}

/// Append `line`, replacing a leading `#`, `` ` `` or `~` with its entity.
fn push_inert_line(out: &mut String, line: &str) {
    let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
    let (lead, rest) = line.split_at(indent);
    out.push_str(lead);
    let mut chars = rest.chars();
    match chars.next() {
        Some('#') => out.push_str("&#35;"),
        Some('`') => out.push_str("&#96;"),
        Some('~') => out.push_str("&#126;"),
        Some(other) => out.push(other),
        None => {}
    }
    out.push_str(chars.as_str());
}

fn message_location(message: &Message) -> SourceLocation {
    match &message.place {
        Some(place) => match place.as_ref() {
            Place::Point(point) => SourceLocation::new(point.line, point.column),
            Place::Position(position) => {
                SourceLocation::new(position.start.line, position.start.column)
            }
        },
        None => SourceLocation::new(1, 1),
    }
}
