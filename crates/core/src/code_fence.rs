//! Fenced code block tracking.
//!
//! Every line-oriented stage (outline splitting, heading-id injection, block
//! transformation, span scanning) runs the same state machine so that a `#`
//! or `+++` inside a code sample is never mistaken for structure.

/// Fence parsing phases tracked across lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FencePhase {
    /// Not currently inside a fence.
    #[default]
    Outside,
    /// Within fence contents.
    InsideFence,
}

/// Current fence state (phase, marker, length).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenceState {
    /// Current fence phase.
    pub phase: FencePhase,
    /// Fence marker character (``` or ~~~).
    pub marker: Option<char>,
    /// Length of the opening fence (number of ` or ~ characters).
    pub length: usize,
}

impl FenceState {
    /// Whether the state is inside a fence.
    pub fn is_inside(&self) -> bool {
        matches!(self.phase, FencePhase::InsideFence)
    }
}

/// A parsed opening fence line such as ```` ```warning Var försiktig ````.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceOpening<'a> {
    /// Marker character.
    pub marker: char,
    /// Number of marker characters.
    pub length: usize,
    /// Info string after the markers, trimmed.
    pub info: &'a str,
}

impl<'a> FenceOpening<'a> {
    /// First word of the info string (the language tag).
    pub fn language(&self) -> &'a str {
        self.info.split_whitespace().next().unwrap_or("")
    }

    /// Info string text after the language tag, trimmed.
    pub fn rest(&self) -> &'a str {
        let info = self.info;
        match info.find(char::is_whitespace) {
            Some(idx) => info[idx..].trim(),
            None => "",
        }
    }
}

/// Outcome of processing a single line for fence state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineParseOutcome<'a> {
    /// State to carry into the next line.
    pub next_state: FenceState,
    /// Whether this line belongs to a code fence (opener, body or closer).
    pub in_code: bool,
    /// Set when this line opened a fence.
    pub opening: Option<FenceOpening<'a>>,
    /// Set when this line closed a fence.
    pub closed: bool,
}

/// Advance fence state based on a single line of text.
pub fn advance_fence_state(line: &str, state: FenceState) -> LineParseOutcome<'_> {
    let (visual_indent, byte_offset) = leading_whitespace_info(line);
    let after_indent = &line[byte_offset..];

    if !state.is_inside() {
        // CommonMark: fence opener must have 0-3 spaces of indentation
        if visual_indent <= 3
            && let Some(opening) = parse_fence_opening(after_indent)
        {
            return LineParseOutcome {
                next_state: FenceState {
                    phase: FencePhase::InsideFence,
                    marker: Some(opening.marker),
                    length: opening.length,
                },
                in_code: true,
                opening: Some(opening),
                closed: false,
            };
        }
        return LineParseOutcome {
            next_state: state,
            in_code: false,
            opening: None,
            closed: false,
        };
    }

    let closes = visual_indent <= 3
        && is_closing_fence(after_indent)
        && detect_fence_marker_with_length(after_indent)
            .is_some_and(|(marker, len)| Some(marker) == state.marker && len >= state.length);

    LineParseOutcome {
        next_state: if closes { FenceState::default() } else { state },
        in_code: true,
        opening: None,
        closed: closes,
    }
}

/// Parse an opening fence (already stripped of indentation).
fn parse_fence_opening(after_indent: &str) -> Option<FenceOpening<'_>> {
    let (marker, length) = detect_fence_marker_with_length(after_indent)?;
    let info = after_indent[length..].trim();
    // CommonMark: backtick fences may not carry backticks in the info string
    if marker == '`' && info.contains('`') {
        return None;
    }
    Some(FenceOpening {
        marker,
        length,
        info,
    })
}

/// Returns (visual_columns, byte_offset) for leading whitespace.
/// Visual columns expand tabs to 4-column boundaries per CommonMark.
fn leading_whitespace_info(line: &str) -> (usize, usize) {
    let mut col = 0;
    let mut bytes = 0;
    for b in line.bytes() {
        match b {
            b' ' => {
                col += 1;
                bytes += 1;
            }
            b'\t' => {
                col += 4 - (col % 4);
                bytes += 1;
            }
            _ => break,
        }
    }
    (col, bytes)
}

fn detect_fence_marker_with_length(after_indent: &str) -> Option<(char, usize)> {
    let first = after_indent.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run_len = after_indent.chars().take_while(|c| *c == first).count();
    (run_len >= 3).then_some((first, run_len))
}

/// A closing fence has only fence markers followed by optional whitespace.
fn is_closing_fence(after_indent: &str) -> bool {
    match detect_fence_marker_with_length(after_indent) {
        Some((_, len)) => after_indent[len..].trim().is_empty(),
        None => false,
    }
}

/// Checks if a line is an indented code block (4+ spaces or tab at start).
pub fn is_indented_code_block(line: &str) -> bool {
    leading_whitespace_info(line).0 >= 4
}
