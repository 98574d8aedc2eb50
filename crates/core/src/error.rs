use serde::Serialize;
use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Location of the start of the given 0-indexed line.
    pub fn line_start(index: usize) -> Self {
        Self::new(index + 1, 1)
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors that can occur while turning document text into HTML.
#[derive(Debug, Error)]
pub enum ContentError {
    /// markdown-rs rejected the input.
    #[error("Render error at {location}: {message}")]
    Render {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
}

impl ContentError {
    /// Create a render error at `location`.
    pub fn render_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::Render {
            message: message.into(),
            location,
        }
    }
}

/// Non-fatal findings reported while processing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// Code fence opened but never closed.
    UnclosedCodeFence {
        /// Where the fence started
        location: SourceLocation,
        /// Fence marker character (backtick or tilde)
        marker: char,
    },
    /// Callout or expandable opened but never closed; left verbatim.
    UnclosedBlock {
        /// Where the block started
        location: SourceLocation,
        /// Construct name (`callout`, `expandable`)
        construct: String,
    },
    /// `[P:id]` whose id is not in the principle index.
    UnresolvedCitation {
        /// Identifier as written
        id: String,
    },
    /// Two headings normalized to the same anchor id.
    DuplicateHeadingId {
        /// The shared id
        id: String,
        /// Title of the later heading
        title: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnclosedCodeFence { location, marker } => {
                write!(f, "Unclosed code fence ({}) at {}", marker, location)
            }
            Diagnostic::UnclosedBlock {
                location,
                construct,
            } => write!(f, "Unclosed {} at {}, left as text", construct, location),
            Diagnostic::UnresolvedCitation { id } => {
                write!(f, "Unresolved citation [P:{}]", id)
            }
            Diagnostic::DuplicateHeadingId { id, title } => {
                write!(f, "Heading '{}' reuses anchor id '{}'", title, id)
            }
        }
    }
}

/// Collection of diagnostics gathered across the pipeline stages.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    /// Findings in the order they were reported.
    pub items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create a new empty diagnostics collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        log::debug!("{}", diagnostic);
        self.items.push(diagnostic);
    }

    /// Move every finding from `other` into this collection.
    pub fn append(&mut self, other: &mut Diagnostics) {
        self.items.append(&mut other.items);
    }

    /// Check if there are any diagnostics
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total count of findings.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate over findings.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }
}
