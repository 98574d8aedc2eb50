//! Claimed-span scanning.
//!
//! One forward pass over document text records every region that reference
//! resolution must not rewrite into: heading lines, code, existing links and
//! images, raw HTML tags, and the citation / cross-reference tokens that
//! resolution rewrites itself. Substitutions are then checked against the
//! resulting interval list instead of re-scanning context per match.
//!
//! Inline constructs are recognised within a single line. Callout fences
//! (```` ```warning ````) are prose: only their fence lines and any code
//! nested in them are claimed.

use crate::blocks::CalloutKind;
use crate::code_fence::{FenceState, advance_fence_state};
use crate::outline::parse_heading_line;

/// What claimed a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// An ATX heading line.
    HeadingLine,
    /// A fenced code block line (opener, body or closer).
    CodeBlock,
    /// A backtick code span.
    InlineCode,
    /// A complete `[label](target)` link.
    Link,
    /// A complete `![alt](src)` image.
    Image,
    /// A raw HTML tag or `<autolink>`.
    HtmlTag,
    /// A `[P:id]` citation token.
    Citation,
    /// A `[[text]]` cross-reference token.
    CrossReference,
}

/// A claimed byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// What claimed it.
    pub kind: SpanKind,
}

/// Sorted, non-overlapping claimed spans of one text.
#[derive(Debug, Clone, Default)]
pub struct SpanMap {
    spans: Vec<Span>,
}

impl SpanMap {
    /// Scan `text` and record its claimed spans.
    pub fn scan(text: &str) -> Self {
        let mut spans = Vec::new();
        let mut fence_state = FenceState::default();
        // Fence state of the body while inside a callout fence
        let mut callout_body: Option<FenceState> = None;
        let mut offset = 0usize;

        for raw_line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += raw_line.len();
            let line = raw_line.trim_end_matches(['\n', '\r']);

            let outcome = advance_fence_state(line, fence_state);
            fence_state = outcome.next_state;

            if let Some(opening) = outcome.opening.as_ref()
                && CalloutKind::parse(opening.language()).is_some()
            {
                push_merged(&mut spans, line_start, offset, SpanKind::CodeBlock);
                callout_body = Some(FenceState::default());
                continue;
            }
            match callout_body.as_mut() {
                Some(_) if outcome.closed => {
                    push_merged(&mut spans, line_start, offset, SpanKind::CodeBlock);
                    callout_body = None;
                    continue;
                }
                Some(body_state) => {
                    let inner = advance_fence_state(line, *body_state);
                    *body_state = inner.next_state;
                    if inner.in_code {
                        push_merged(&mut spans, line_start, offset, SpanKind::CodeBlock);
                        continue;
                    }
                }
                None if outcome.in_code => {
                    push_merged(&mut spans, line_start, offset, SpanKind::CodeBlock);
                    continue;
                }
                None => {}
            }
            if parse_heading_line(line).is_some() {
                spans.push(Span {
                    start: line_start,
                    end: offset,
                    kind: SpanKind::HeadingLine,
                });
                continue;
            }
            scan_inline(line, line_start, &mut spans);
        }

        Self { spans }
    }

    /// All spans in source order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Spans of one kind, in source order.
    pub fn of_kind(&self, kind: SpanKind) -> impl Iterator<Item = &Span> {
        self.spans.iter().filter(move |span| span.kind == kind)
    }

    /// Whether `[start, end)` touches no claimed span.
    pub fn is_free(&self, start: usize, end: usize) -> bool {
        let idx = self.spans.partition_point(|span| span.end <= start);
        self.spans.get(idx).is_none_or(|span| span.start >= end)
    }

    /// The claimed span containing `pos`, if any.
    pub fn containing(&self, pos: usize) -> Option<&Span> {
        let idx = self.spans.partition_point(|span| span.end <= pos);
        self.spans.get(idx).filter(|span| span.start <= pos)
    }
}

fn push_merged(spans: &mut Vec<Span>, start: usize, end: usize, kind: SpanKind) {
    if let Some(last) = spans.last_mut()
        && last.kind == kind
        && last.end == start
    {
        last.end = end;
        return;
    }
    spans.push(Span { start, end, kind });
}

fn scan_inline(line: &str, base: usize, spans: &mut Vec<Span>) {
    let bytes = line.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let claimed = match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'`' => code_span_end(bytes, i).map(|end| (end, SpanKind::InlineCode)),
            b'<' => html_tag_end(bytes, i).map(|end| (end, SpanKind::HtmlTag)),
            b'!' if bytes.get(i + 1) == Some(&b'[') => {
                link_end(bytes, i + 1).map(|end| (end, SpanKind::Image))
            }
            b'[' if bytes.get(i + 1) == Some(&b'[') => {
                cross_reference_end(bytes, i).map(|end| (end, SpanKind::CrossReference))
            }
            b'[' if bytes[i..].starts_with(b"[P:") => citation_end(bytes, i)
                .map(|end| (end, SpanKind::Citation))
                .or_else(|| link_end(bytes, i).map(|end| (end, SpanKind::Link))),
            b'[' => link_end(bytes, i).map(|end| (end, SpanKind::Link)),
            _ => None,
        };

        match claimed {
            Some((end, kind)) => {
                spans.push(Span {
                    start: base + i,
                    end: base + end,
                    kind,
                });
                i = end;
            }
            None if bytes[i] == b'`' => {
                // Unmatched backtick run: skip the whole run
                i += bytes[i..].iter().take_while(|b| **b == b'`').count();
            }
            None => i += 1,
        }
    }
}

/// End of a code span opened by the backtick run at `start`.
fn code_span_end(bytes: &[u8], start: usize) -> Option<usize> {
    let run = bytes[start..].iter().take_while(|b| **b == b'`').count();
    let mut i = start + run;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let closing = bytes[i..].iter().take_while(|b| **b == b'`').count();
            if closing == run {
                return Some(i + closing);
            }
            i += closing;
        } else {
            i += 1;
        }
    }
    None
}

/// End of `<tag ...>`, `</tag>`, `<!-- -->` or `<scheme:...>` starting at `start`.
fn html_tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let next = *bytes.get(start + 1)?;
    if !(next.is_ascii_alphabetic() || next == b'/' || next == b'!') {
        return None;
    }
    bytes[start + 1..]
        .iter()
        .position(|b| *b == b'>')
        .map(|pos| start + 1 + pos + 1)
}

/// End of `[[text]]` starting at `start`; the inner text may not contain brackets.
fn cross_reference_end(bytes: &[u8], start: usize) -> Option<usize> {
    let inner_start = start + 2;
    let mut i = inner_start;
    while i < bytes.len() {
        match bytes[i] {
            b']' if bytes.get(i + 1) == Some(&b']') && i > inner_start => return Some(i + 2),
            b'[' | b']' => return None,
            _ => i += 1,
        }
    }
    None
}

/// End of `[P:id]` starting at `start`.
fn citation_end(bytes: &[u8], start: usize) -> Option<usize> {
    let id_start = start + 3;
    let close = bytes[id_start..].iter().position(|b| *b == b']')? + id_start;
    let id = &bytes[id_start..close];
    if id.iter().all(u8::is_ascii_whitespace) || id.contains(&b'[') {
        return None;
    }
    // `[P:x](url)` is an ordinary link
    if bytes.get(close + 1) == Some(&b'(') {
        return None;
    }
    Some(close + 1)
}

/// End of a well-formed `[label](target)` whose `[` is at `open`.
///
/// Brackets in the label and parentheses in the target must balance, and the
/// `(` has to follow the closing `]` directly.
pub(crate) fn link_end(bytes: &[u8], open: usize) -> Option<usize> {
    let close = matching(bytes, open, b'[', b']')?;
    if bytes.get(close + 1) != Some(&b'(') {
        return None;
    }
    let paren_close = matching(bytes, close + 1, b'(', b')')?;
    Some(paren_close + 1)
}

pub(crate) fn matching(bytes: &[u8], open: usize, left: u8, right: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        if b == left {
            depth += 1;
        } else if b == right {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}
