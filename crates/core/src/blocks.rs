//! Block transformation: callouts, figures and expandable sections.
//!
//! Works line by line with the same fence tracking as every other stage.
//! Recognized constructs are rendered to HTML right away and spliced back
//! into the Markdown as sealed HTML blocks (no blank lines inside, blank
//! lines around) so a later full-document render passes them through.
//!
//! Surface syntax:
//!
//! ````text
//! ```warning Var försiktig        :::tip[Titel]          +++ Titel +++ kropp +++
//! Body                            Body
//! ```                             :::
//!
//! ![Alt](./bild.png "Bildtext"){width=300 .bred}
//! ````
//!
//! Fenced blocks tagged with anything other than a callout kind are ordinary
//! code and pass through byte-for-byte.

use crate::code_fence::{FenceState, advance_fence_state, is_indented_code_block};
use crate::error::{Diagnostic, Diagnostics, SourceLocation};
use crate::markdown::{RenderOptions, render_inline, render_markdown, seal_html_block};
use crate::spans::{link_end, matching};

/// Callout kinds recognized in fence info strings and `:::` directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalloutKind {
    /// Neutral remark.
    Note,
    /// Practical advice.
    Tip,
    /// Something that can go wrong.
    Warning,
    /// Something that must not be done.
    Danger,
    /// Background information.
    Info,
    /// Key requirement.
    Important,
    /// Worked example.
    Example,
}

/// Presentation metadata for one callout kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalloutStyle {
    /// Icon shown before the title.
    pub icon: &'static str,
    /// CSS classes on the container.
    pub class: &'static str,
    /// Title used when the source gives none.
    pub default_title: &'static str,
}

const CALLOUT_STYLES: [CalloutStyle; 7] = [
    CalloutStyle {
        icon: "📝",
        class: "callout callout--note",
        default_title: "Notera",
    },
    CalloutStyle {
        icon: "💡",
        class: "callout callout--tip",
        default_title: "Tips",
    },
    CalloutStyle {
        icon: "⚠️",
        class: "callout callout--warning",
        default_title: "Varning",
    },
    CalloutStyle {
        icon: "🛑",
        class: "callout callout--danger",
        default_title: "Fara",
    },
    CalloutStyle {
        icon: "ℹ️",
        class: "callout callout--info",
        default_title: "Information",
    },
    CalloutStyle {
        icon: "❗",
        class: "callout callout--important",
        default_title: "Viktigt",
    },
    CalloutStyle {
        icon: "📋",
        class: "callout callout--example",
        default_title: "Exempel",
    },
];

impl CalloutKind {
    /// Every kind, in lookup-table order.
    pub const ALL: [CalloutKind; 7] = [
        CalloutKind::Note,
        CalloutKind::Tip,
        CalloutKind::Warning,
        CalloutKind::Danger,
        CalloutKind::Info,
        CalloutKind::Important,
        CalloutKind::Example,
    ];

    /// Parse a kind name, ignoring ASCII case.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }

    /// Lower-case name as written in source.
    pub fn as_str(self) -> &'static str {
        match self {
            CalloutKind::Note => "note",
            CalloutKind::Tip => "tip",
            CalloutKind::Warning => "warning",
            CalloutKind::Danger => "danger",
            CalloutKind::Info => "info",
            CalloutKind::Important => "important",
            CalloutKind::Example => "example",
        }
    }

    /// Icon, class and default title for this kind.
    pub fn style(self) -> &'static CalloutStyle {
        &CALLOUT_STYLES[self as usize]
    }
}

/// Supplies element ids for expandable sections.
pub trait IdSource {
    /// Next unused id.
    fn next_id(&mut self) -> String;
}

/// `<prefix>-1`, `<prefix>-2`, ... in call order.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    issued: usize,
}

impl SequentialIds {
    /// Counter starting at 1 with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            issued: 0,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("expandable")
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        self.issued += 1;
        format!("{}-{}", self.prefix, self.issued)
    }
}

/// How many constructs a transformer has rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockCounts {
    /// Callouts, fenced and colon form.
    pub callouts: usize,
    /// Figures.
    pub figures: usize,
    /// Expandable sections.
    pub expandables: usize,
}

/// Rewrites callouts, figures and expandables in Markdown text.
///
/// One transformer is meant to live for one document so that expandable ids
/// stay unique across everything it renders.
pub struct BlockTransformer<I = SequentialIds> {
    options: RenderOptions,
    ids: I,
    diagnostics: Diagnostics,
    counts: BlockCounts,
    /// Document line of the text being transformed; non-zero inside bodies.
    line_offset: usize,
}

impl BlockTransformer<SequentialIds> {
    /// Fragment rendering with the default id counter.
    pub fn with_defaults() -> Self {
        Self::new(RenderOptions::fragment(), SequentialIds::default())
    }
}

impl<I: IdSource> BlockTransformer<I> {
    /// Create a transformer rendering bodies with `options` (heading ids are
    /// always off for bodies).
    pub fn new(options: RenderOptions, ids: I) -> Self {
        Self {
            options: options.with_heading_ids(false),
            ids,
            diagnostics: Diagnostics::new(),
            counts: BlockCounts::default(),
            line_offset: 0,
        }
    }

    /// Constructs rewritten so far.
    pub fn counts(&self) -> BlockCounts {
        self.counts
    }

    /// Findings so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Hand over the findings collected so far.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Transform every recognized construct in `text`.
    ///
    /// Text without any construct is returned unchanged.
    pub fn transform(&mut self, text: &str) -> String {
        let lines: Vec<&str> = text.lines().collect();
        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        let mut changed = false;
        let mut fence_state = FenceState::default();
        let mut open_fence: Option<(usize, char)> = None;
        let mut idx = 0usize;

        while idx < lines.len() {
            let line = lines[idx];
            let outcome = advance_fence_state(line, fence_state);

            if let Some(opening) = outcome.opening.as_ref() {
                if let Some(kind) = CalloutKind::parse(opening.language()) {
                    match find_fence_close(&lines, idx + 1, outcome.next_state) {
                        Some(close) => {
                            let title = Some(opening.rest()).filter(|t| !t.is_empty());
                            let body = lines[idx + 1..close].join("\n");
                            if let Some(html) =
                                self.render_callout(kind, title, &body, idx + 1)
                            {
                                push_block(&mut out, &html);
                                changed = true;
                            } else {
                                out.extend(lines[idx..=close].iter().map(|l| l.to_string()));
                            }
                            idx = close + 1;
                            continue;
                        }
                        None => {
                            self.unclosed(idx, "callout");
                            fence_state = outcome.next_state;
                            out.push(line.to_string());
                            idx += 1;
                            continue;
                        }
                    }
                }
                open_fence = Some((idx, opening.marker));
            }
            if outcome.closed {
                open_fence = None;
            }
            fence_state = outcome.next_state;

            if outcome.in_code || is_indented_code_block(line) {
                out.push(line.to_string());
                idx += 1;
                continue;
            }

            if let Some(directive) = parse_directive(line) {
                if let Some(body) = directive.inline_body.as_deref() {
                    if let Some(html) = self.render_callout(
                        directive.kind,
                        directive.title.as_deref(),
                        body,
                        idx,
                    ) {
                        push_block(&mut out, &html);
                        changed = true;
                        idx += 1;
                        continue;
                    }
                } else {
                    match find_directive_close(&lines, idx + 1) {
                        Some(close) => {
                            let body = lines[idx + 1..close].join("\n");
                            if let Some(html) = self.render_callout(
                                directive.kind,
                                directive.title.as_deref(),
                                &body,
                                idx + 1,
                            ) {
                                push_block(&mut out, &html);
                                changed = true;
                            } else {
                                out.extend(lines[idx..=close].iter().map(|l| l.to_string()));
                            }
                            idx = close + 1;
                            continue;
                        }
                        None => self.unclosed(idx, "callout"),
                    }
                }
                out.push(line.to_string());
                idx += 1;
                continue;
            }

            if let Some((title, after)) = parse_expandable_opening(line) {
                let found = match after.find("+++") {
                    Some(pos) if after[pos + 3..].trim().is_empty() => {
                        Some((idx, after[..pos].trim().to_string()))
                    }
                    Some(_) => None,
                    None => match find_expandable_close(&lines, idx + 1) {
                        Some(close) => Some((close, expandable_body(after, &lines, idx, close))),
                        None => {
                            self.unclosed(idx, "expandable");
                            None
                        }
                    },
                };
                if let Some((close, body)) = found {
                    let body_line = if close == idx || !after.trim().is_empty() {
                        idx
                    } else {
                        idx + 1
                    };
                    if let Some(html) = self.render_expandable(title, &body, body_line) {
                        push_block(&mut out, &html);
                        changed = true;
                    } else {
                        out.extend(lines[idx..=close].iter().map(|l| l.to_string()));
                    }
                    idx = close + 1;
                    continue;
                }
                out.push(line.to_string());
                idx += 1;
                continue;
            }

            if let Some(figure) = parse_figure_line(line) {
                push_block(&mut out, &figure.to_html());
                self.counts.figures += 1;
                changed = true;
                idx += 1;
                continue;
            }

            out.push(line.to_string());
            idx += 1;
        }

        if let Some((line, marker)) = open_fence {
            self.diagnostics.push(Diagnostic::UnclosedCodeFence {
                location: SourceLocation::line_start(self.line_offset + line),
                marker,
            });
        }

        if !changed {
            return text.to_string();
        }
        let mut result = out.join("\n");
        if text.ends_with('\n') {
            result.push('\n');
        }
        result
    }

    fn unclosed(&mut self, line: usize, construct: &str) {
        log::warn!(
            "unclosed {} at line {}, left as text",
            construct,
            self.line_offset + line + 1
        );
        self.diagnostics.push(Diagnostic::UnclosedBlock {
            location: SourceLocation::line_start(self.line_offset + line),
            construct: construct.to_string(),
        });
    }

    /// Block-transform then render a callout or expandable body starting at
    /// line `first_line` of the current text.
    fn render_body(&mut self, body: &str, first_line: usize) -> Option<String> {
        let outer = self.line_offset;
        self.line_offset = outer + first_line;
        let inner = self.transform(body);
        self.line_offset = outer;
        match render_markdown(&inner, &self.options) {
            Ok(html) => Some(html.trim_end().to_string()),
            Err(err) => {
                log::warn!("block body failed to render, left as text: {}", err);
                None
            }
        }
    }

    fn render_callout(
        &mut self,
        kind: CalloutKind,
        title: Option<&str>,
        body: &str,
        body_line: usize,
    ) -> Option<String> {
        let style = kind.style();
        let title_html = match title {
            Some(title) => render_inline(title, &self.options),
            None => style.default_title.to_string(),
        };
        let body_html = self.render_body(body, body_line)?;
        self.counts.callouts += 1;

        Some(format!(
            "<aside class=\"{class}\" data-callout=\"{kind}\">\n\
             <div class=\"callout__title\"><span class=\"callout__icon\" aria-hidden=\"true\">{icon}</span><span class=\"callout__label\">{title}</span></div>\n\
             <div class=\"callout__body\">\n{body}\n</div>\n\
             </aside>",
            class = style.class,
            kind = kind.as_str(),
            icon = style.icon,
            title = title_html,
            body = body_html,
        ))
    }

    fn render_expandable(
        &mut self,
        title: &str,
        body: &str,
        body_line: usize,
    ) -> Option<String> {
        let title_html = render_inline(title, &self.options);
        let body_html = self.render_body(body, body_line)?;
        let id = self.ids.next_id();
        let id = html_escape::encode_double_quoted_attribute(&id);
        self.counts.expandables += 1;

        Some(format!(
            "<div class=\"expandable\">\n\
             <button type=\"button\" class=\"expandable__toggle\" aria-expanded=\"false\" aria-controls=\"{id}\">{title}</button>\n\
             <div class=\"expandable__content\" id=\"{id}\" hidden>\n{body}\n</div>\n\
             </div>",
            id = id,
            title = title_html,
            body = body_html,
        ))
    }
}

/// Transform `text` with fragment rendering and a fresh id counter.
pub fn transform(text: &str) -> String {
    BlockTransformer::with_defaults().transform(text)
}

fn push_block(out: &mut Vec<String>, html: &str) {
    if out.last().is_some_and(|line| !line.trim().is_empty()) {
        out.push(String::new());
    }
    out.push(seal_html_block(html));
    out.push(String::new());
}

fn find_fence_close(lines: &[&str], from: usize, mut state: FenceState) -> Option<usize> {
    for (offset, line) in lines[from..].iter().enumerate() {
        let outcome = advance_fence_state(line, state);
        if outcome.closed {
            return Some(from + offset);
        }
        state = outcome.next_state;
    }
    None
}

/// Matching `:::` closer, counting nested block directives.
fn find_directive_close(lines: &[&str], from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut state = FenceState::default();
    for (offset, line) in lines[from..].iter().enumerate() {
        let outcome = advance_fence_state(line, state);
        state = outcome.next_state;
        if outcome.in_code || is_indented_code_block(line) {
            continue;
        }
        if is_directive_closer(line) {
            depth -= 1;
            if depth == 0 {
                return Some(from + offset);
            }
        } else if parse_directive(line).is_some_and(|d| d.inline_body.is_none()) {
            depth += 1;
        }
    }
    None
}

/// Matching closer of a multi-line expandable, counting nested multi-line
/// openers. Single-line expandables inside the body are skipped.
fn find_expandable_close(lines: &[&str], from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut state = FenceState::default();
    for (offset, line) in lines[from..].iter().enumerate() {
        let outcome = advance_fence_state(line, state);
        state = outcome.next_state;
        if outcome.in_code || is_indented_code_block(line) {
            continue;
        }
        if let Some((_, after)) = parse_expandable_opening(line) {
            if !after.contains("+++") {
                depth += 1;
            }
            continue;
        }
        if line.trim_end().ends_with("+++") {
            depth -= 1;
            if depth == 0 {
                return Some(from + offset);
            }
        }
    }
    None
}

fn expandable_body(first: &str, lines: &[&str], open: usize, close: usize) -> String {
    let mut body: Vec<&str> = Vec::new();
    if !first.trim().is_empty() {
        body.push(first.trim());
    }
    body.extend(&lines[open + 1..close]);
    let last = lines[close].trim_end();
    let last = last.strip_suffix("+++").unwrap_or(last);
    if !last.trim().is_empty() {
        body.push(last.trim_end());
    }
    body.join("\n")
}

/// Parsed `:::kind[Title]` / `:::kind Title` / `:::kind body :::` line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DirectiveOpening {
    kind: CalloutKind,
    title: Option<String>,
    /// Set for the single-line form.
    inline_body: Option<String>,
}

fn parse_directive(line: &str) -> Option<DirectiveOpening> {
    if is_indented_code_block(line) {
        return None;
    }
    let after_colons = line.trim().strip_prefix(":::")?.trim_start();

    let name_len = after_colons
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .count();
    let kind = CalloutKind::parse(&after_colons[..name_len])?;
    let mut rest = &after_colons[name_len..];

    let mut title = None;
    if rest.starts_with('[') {
        // Titles may hold links, so the closing bracket is the balanced one
        let close = matching(rest.as_bytes(), 0, b'[', b']')?;
        title = Some(rest[1..close].trim().to_string()).filter(|t| !t.is_empty());
        rest = &rest[close + 1..];
    } else if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let rest = rest.trim();
    if let Some(body) = rest.strip_suffix(":::") {
        return Some(DirectiveOpening {
            kind,
            title,
            inline_body: Some(body.trim().to_string()),
        });
    }
    if title.is_none() && !rest.is_empty() {
        title = Some(rest.to_string());
    }
    Some(DirectiveOpening {
        kind,
        title,
        inline_body: None,
    })
}

fn is_directive_closer(line: &str) -> bool {
    line.trim() == ":::"
}

/// `+++ title +++<rest>`: title and whatever follows the second marker.
fn parse_expandable_opening(line: &str) -> Option<(&str, &str)> {
    if is_indented_code_block(line) {
        return None;
    }
    let rest = line.trim_start().strip_prefix("+++")?;
    let close = rest.find("+++")?;
    let title = rest[..close].trim();
    if title.is_empty() {
        return None;
    }
    Some((title, &rest[close + 3..]))
}

/// A line holding nothing but an image, optionally with `{attrs}`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Figure<'a> {
    alt: &'a str,
    src: &'a str,
    title: Option<&'a str>,
    attrs: FigureAttrs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FigureAttrs {
    width: Option<String>,
    height: Option<String>,
    classes: Vec<String>,
}

fn parse_figure_line(line: &str) -> Option<Figure<'_>> {
    if is_indented_code_block(line) {
        return None;
    }
    let trimmed = line.trim();
    if !trimmed.starts_with("![") {
        return None;
    }
    let bytes = trimmed.as_bytes();
    let end = link_end(bytes, 1)?;
    let close = matching(bytes, 1, b'[', b']')?;

    let alt = &trimmed[2..close];
    let (src, title) = split_image_target(trimmed[close + 2..end - 1].trim())?;

    let tail = trimmed[end..].trim();
    let attrs = if tail.is_empty() {
        FigureAttrs::default()
    } else {
        let inner = tail.strip_prefix('{')?.strip_suffix('}')?;
        parse_figure_attrs(inner)
    };

    Some(Figure {
        alt,
        src,
        title,
        attrs,
    })
}

/// Split `src "title"` (or `<src> 'title'`, `src (title)`).
fn split_image_target(target: &str) -> Option<(&str, Option<&str>)> {
    let (src, rest) = match target.strip_prefix('<') {
        Some(inner) => {
            let gt = inner.find('>')?;
            (&inner[..gt], &inner[gt + 1..])
        }
        None => match target.find(char::is_whitespace) {
            Some(ws) => (&target[..ws], &target[ws..]),
            None => (target, ""),
        },
    };
    if src.is_empty() {
        return None;
    }

    let rest = rest.trim();
    if rest.is_empty() {
        return Some((src, None));
    }
    let title = [('"', '"'), ('\'', '\''), ('(', ')')]
        .into_iter()
        .find_map(|(open, close)| rest.strip_prefix(open)?.strip_suffix(close))?;
    Some((src, Some(title)))
}

fn parse_figure_attrs(raw: &str) -> FigureAttrs {
    let mut attrs = FigureAttrs::default();
    for token in tokenize_attrs(raw) {
        if let Some(class) = token.strip_prefix('.') {
            attrs.classes.extend(class_name(class));
            continue;
        }
        let Some((key, value)) = token.split_once('=') else {
            log::debug!("ignoring figure attribute '{}'", token);
            continue;
        };
        let value = unquote(value.trim());
        match key.trim().to_ascii_lowercase().as_str() {
            "width" => attrs.width = css_length(value),
            "height" => attrs.height = css_length(value),
            "class" => attrs
                .classes
                .extend(value.split_whitespace().filter_map(class_name)),
            other => log::debug!("ignoring figure attribute '{}'", other),
        }
    }
    attrs
}

/// Split on whitespace, keeping quoted values together.
fn tokenize_attrs(attrs: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut token_start: Option<usize> = None;
    let mut quote: Option<char> = None;

    for (i, c) in attrs.char_indices() {
        match c {
            '"' | '\'' if quote.is_none() => {
                token_start.get_or_insert(i);
                quote = Some(c);
            }
            c if quote == Some(c) => quote = None,
            c if c.is_whitespace() && quote.is_none() => {
                if let Some(start) = token_start.take() {
                    tokens.push(&attrs[start..i]);
                }
            }
            _ => {
                token_start.get_or_insert(i);
            }
        }
    }
    if let Some(start) = token_start {
        tokens.push(&attrs[start..]);
    }

    tokens
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|q| value.strip_prefix(q)?.strip_suffix(q))
        .unwrap_or(value)
}

fn class_name(raw: &str) -> Option<String> {
    let name: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

/// Bare numbers become pixels; anything that is not a plain CSS length is dropped.
fn css_length(value: &str) -> Option<String> {
    if value.is_empty() || !value.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        return Some(format!("{}px", value));
    }
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '%')
        .then(|| value.to_string())
}

impl Figure<'_> {
    fn is_logo(&self) -> bool {
        self.src.to_lowercase().contains("logo") || self.alt.to_lowercase().contains("logo")
    }

    fn to_html(&self) -> String {
        let mut classes = vec!["figure".to_string()];
        if self.is_logo() {
            classes.push("figure--logo".to_string());
        }
        classes.extend(self.attrs.classes.iter().cloned());

        let mut style = Vec::new();
        if let Some(width) = &self.attrs.width {
            style.push(format!("width: {}", width));
        }
        if let Some(height) = &self.attrs.height {
            style.push(format!("height: {}", height));
        }
        let style = if style.is_empty() {
            String::new()
        } else {
            format!(" style=\"{};\"", style.join("; "))
        };

        let caption = self
            .title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or_else(|| Some(self.alt.trim()).filter(|a| !a.is_empty()));
        let caption = caption
            .map(|c| format!("\n<figcaption>{}</figcaption>", html_escape::encode_text(c)))
            .unwrap_or_default();

        format!(
            "<figure class=\"{}\">\n<img src=\"{}\" alt=\"{}\"{} loading=\"lazy\">{}\n</figure>",
            classes.join(" "),
            html_escape::encode_double_quoted_attribute(&normalize_image_src(self.src)),
            html_escape::encode_double_quoted_attribute(self.alt),
            style,
            caption
        )
    }
}

/// Make a relative image path root-relative; absolute URLs and
/// root-relative paths are returned unchanged.
pub fn normalize_image_src(src: &str) -> String {
    if src.starts_with('/') || has_scheme(src) {
        return src.to_string();
    }
    let mut rest = src;
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("../") {
            rest = stripped;
        } else {
            break;
        }
    }
    format!("/{}", rest)
}

fn has_scheme(src: &str) -> bool {
    match src.find(':') {
        Some(idx) if idx > 0 => {
            let scheme = &src[..idx];
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> (String, Diagnostics) {
        let mut transformer = BlockTransformer::with_defaults();
        let out = transformer.transform(text);
        (out, transformer.take_diagnostics())
    }

    #[test]
    fn warning_fence_becomes_callout_but_java_stays_code() {
        let (warning, _) = run("```warning\nDo not proceed\n```");
        insta::assert_snapshot!(warning, @r#"
        <aside class="callout callout--warning" data-callout="warning">
        <div class="callout__title"><span class="callout__icon" aria-hidden="true">⚠️</span><span class="callout__label">Varning</span></div>
        <div class="callout__body">
        <p>Do not proceed</p>
        </div>
        </aside>
        "#);

        let java = "```java\nDo not proceed\n```";
        assert_eq!(run(java).0, java);
    }

    #[test]
    fn fence_title_and_case_insensitive_kind() {
        let (out, _) = run("```TIP Spara **ofta**\nText\n```\n");
        assert!(out.contains("callout callout--tip"), "{out}");
        assert!(
            out.contains("<span class=\"callout__label\">Spara <strong>ofta</strong></span>"),
            "{out}"
        );
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn tilde_fence_callout_closes_on_matching_marker() {
        let (out, _) = run("~~~~note\n```\ninner code\n```\n~~~~");
        assert!(out.starts_with("<aside class=\"callout callout--note\""), "{out}");
        assert!(out.contains("<pre><code>inner code\n</code></pre>"), "{out}");
    }

    #[test]
    fn colon_callouts_in_every_form() {
        let (block, _) = run(":::info[Bakgrund]\nNågot att *veta*.\n:::");
        assert!(block.contains("callout callout--info"), "{block}");
        assert!(block.contains(">Bakgrund</span>"), "{block}");
        assert!(block.contains("<p>Något att <em>veta</em>.</p>"), "{block}");

        let (plain_title, _) = run(":::danger Stopp\nGör inte så.\n:::");
        assert!(plain_title.contains(">Stopp</span>"), "{plain_title}");

        let (single, _) = run("Före\n:::important Läs detta :::\nEfter");
        assert!(single.starts_with("Före\n\n<aside"), "{single}");
        assert!(single.contains(">Viktigt</span>"), "{single}");
        assert!(single.contains("<p>Läs detta</p>"), "{single}");
        assert!(single.ends_with("</aside>\n\nEfter"), "{single}");
    }

    #[test]
    fn unknown_directive_is_left_alone() {
        let text = ":::aside\nx\n:::";
        assert_eq!(run(text).0, text);
    }

    #[test]
    fn nested_colon_callouts() {
        let (out, diagnostics) = run(":::note\nYttre\n:::tip\nInre\n:::\n:::");
        assert!(diagnostics.is_empty());
        assert_eq!(out.matches("<aside").count(), 2, "{out}");
        let inner = out.find("callout--tip").unwrap();
        let outer_end = out.rfind("</aside>").unwrap();
        assert!(inner < outer_end);
    }

    #[test]
    fn unclosed_callout_is_verbatim_with_diagnostic() {
        let text = ":::note\nnever closed";
        let (out, diagnostics) = run(text);
        assert_eq!(out, text);
        assert_eq!(
            diagnostics.items,
            vec![Diagnostic::UnclosedBlock {
                location: SourceLocation::new(1, 1),
                construct: "callout".into(),
            }]
        );
    }

    #[test]
    fn unclosed_plain_fence_is_reported() {
        let (out, diagnostics) = run("text\n```rust\nfn main() {}");
        assert_eq!(out, "text\n```rust\nfn main() {}");
        assert_eq!(
            diagnostics.items,
            vec![Diagnostic::UnclosedCodeFence {
                location: SourceLocation::new(2, 1),
                marker: '`',
            }]
        );
    }

    #[test]
    fn figure_with_attributes() {
        let (out, _) = run("![Flödet](./img/flow.png \"Så går det till\"){width=300 height=\"50%\" .bred class=\"a b\"}");
        insta::assert_snapshot!(out, @r#"
        <figure class="figure bred a b">
        <img src="/img/flow.png" alt="Flödet" style="width: 300px; height: 50%;" loading="lazy">
        <figcaption>Så går det till</figcaption>
        </figure>
        "#);
    }

    #[test]
    fn figure_caption_falls_back_to_alt_and_logo_heuristic() {
        let (out, _) = run("![Myndighetens logotyp](../../assets/brand.svg)");
        assert!(out.contains("class=\"figure figure--logo\""), "{out}");
        assert!(out.contains("src=\"/assets/brand.svg\""), "{out}");
        assert!(out.contains("<figcaption>Myndighetens logotyp</figcaption>"), "{out}");

        let (bare, _) = run("![](https://example.se/a.png)");
        assert!(bare.contains("src=\"https://example.se/a.png\""), "{bare}");
        assert!(!bare.contains("figcaption"), "{bare}");
    }

    #[test]
    fn inline_images_are_not_figures() {
        let text = "Se ![ikon](a.png) här";
        assert_eq!(run(text).0, text);
        let trailing = "![ikon](a.png) och text";
        assert_eq!(run(trailing).0, trailing);
    }

    #[test]
    fn expandables_get_sequential_ids() {
        let (out, _) = run("+++ Första +++ Kort svar +++\n\n+++ Andra +++\nRad ett\n\nRad två\n+++");
        assert!(out.contains("aria-controls=\"expandable-1\">Första</button>"), "{out}");
        assert!(out.contains("id=\"expandable-2\" hidden"), "{out}");
        assert!(out.contains("<p>Rad ett</p>\n<p>Rad två</p>"), "{out}");
        assert!(!out.contains("+++"), "{out}");
    }

    #[test]
    fn custom_id_source() {
        let mut transformer =
            BlockTransformer::new(RenderOptions::fragment(), SequentialIds::new("faq"));
        let out = transformer.transform("+++ Fråga +++ Svar +++");
        assert!(out.contains("id=\"faq-1\""), "{out}");
        assert_eq!(transformer.counts().expandables, 1);
    }

    #[test]
    fn unclosed_expandable() {
        let text = "+++ Titel +++\nkropp utan slut";
        let (out, diagnostics) = run(text);
        assert_eq!(out, text);
        assert!(matches!(
            diagnostics.items.as_slice(),
            [Diagnostic::UnclosedBlock { construct, .. }] if construct == "expandable"
        ));
    }

    #[test]
    fn expandable_skips_nested_single_line_closers() {
        let (out, diagnostics) = run("+++ Yttre +++\nrad\n+++ Inre +++ kort +++\nmer\n+++");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(out.matches("class=\"expandable\"").count(), 2, "{out}");
        assert!(out.contains("<p>mer</p>"), "{out}");
        assert!(!out.contains("+++"), "{out}");
    }

    #[test]
    fn nested_multi_line_expandables() {
        let mut transformer = BlockTransformer::with_defaults();
        let out = transformer.transform("+++ A +++\n+++ B +++\nb\n+++\na\n+++");
        assert!(transformer.take_diagnostics().is_empty());
        assert_eq!(transformer.counts().expandables, 2);
        let inner = out.find(">B</button>").unwrap();
        let tail = out.find("<p>a</p>").unwrap();
        assert!(inner < tail, "{out}");
        assert!(!out.contains("+++"), "{out}");
    }

    #[test]
    fn directive_title_keeps_links() {
        let (out, _) = run(":::note[Om [Policy](concept:policy \"Policy\")]\nText.\n:::");
        assert!(
            out.contains(
                "<span class=\"callout__label\">Om <a href=\"concept:policy\" title=\"Policy\">Policy</a></span>"
            ),
            "{out}"
        );
        assert!(out.contains("<p>Text.</p>"), "{out}");
        assert!(!out.contains("Om [Policy"), "{out}");
    }

    #[test]
    fn nested_diagnostics_use_document_lines() {
        let (_, fence) = run("intro\n\n````note\nText\n```rust\nfn x() {}\n````");
        assert_eq!(
            fence.items,
            vec![Diagnostic::UnclosedCodeFence {
                location: SourceLocation::new(5, 1),
                marker: '`',
            }]
        );

        let (_, callout) = run("intro\n````note\nText\n:::tip\nnever closed\n````");
        assert_eq!(
            callout.items,
            vec![Diagnostic::UnclosedBlock {
                location: SourceLocation::new(4, 1),
                construct: "callout".into(),
            }]
        );
    }

    #[test]
    fn constructs_inside_code_are_untouched() {
        let text = "```md\n+++ a +++ b +++\n:::note x :::\n![a](b.png)\n```";
        assert_eq!(run(text).0, text);
    }

    #[test]
    fn emitted_blocks_have_no_blank_lines() {
        let (out, _) = run("````note\nEtt\n\n```text\na\n\nb\n```\n````");
        let block = out.trim();
        assert!(
            !block.split('\n').any(|line| line.trim().is_empty()),
            "{block}"
        );
    }

    #[test]
    fn transformed_output_survives_full_render() {
        let out = transform("Intro\n```tip\nBody\n```\nOutro");
        let html = render_markdown(&out, &RenderOptions::fragment()).unwrap();
        assert!(html.contains("<p>Intro</p>"), "{html}");
        assert!(html.contains("<aside class=\"callout callout--tip\""), "{html}");
        assert!(html.contains("<p>Outro</p>"), "{html}");
    }

    #[test]
    fn image_sources() {
        assert_eq!(normalize_image_src("img/a.png"), "/img/a.png");
        assert_eq!(normalize_image_src("./img/a.png"), "/img/a.png");
        assert_eq!(normalize_image_src("../../img/a.png"), "/img/a.png");
        assert_eq!(normalize_image_src("/static/a.png"), "/static/a.png");
        assert_eq!(normalize_image_src("//cdn.se/a.png"), "//cdn.se/a.png");
        assert_eq!(normalize_image_src("data:image/png;base64,xx"), "data:image/png;base64,xx");
    }

    #[test]
    fn attribute_tokens_keep_quotes_together() {
        assert_eq!(
            tokenize_attrs("width=10 class=\"a b\" .c"),
            vec!["width=10", "class=\"a b\"", ".c"]
        );
        assert_eq!(css_length("12"), Some("12px".into()));
        assert_eq!(css_length("2.5rem"), Some("2.5rem".into()));
        assert_eq!(css_length("10px;color:red"), None);
        assert_eq!(css_length("auto"), None);
    }

    #[test]
    fn callout_table_is_complete() {
        for kind in CalloutKind::ALL {
            assert_eq!(CalloutKind::parse(kind.as_str()), Some(kind));
            assert!(kind.style().class.ends_with(kind.as_str()));
        }
        assert_eq!(CalloutKind::Danger.style().default_title, "Fara");
    }
}
