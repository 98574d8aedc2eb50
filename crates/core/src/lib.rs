#![deny(missing_docs)]
//! HERAF core: the content-transformation engine.
//!
//! Turns one Markdown document plus a reference catalog into cross-linked
//! HTML, a section tree and a table of contents. Everything here is pure and
//! synchronous; loading files or fetching text is left to the caller.

/// Callouts, figures and expandable sections.
pub mod blocks;
/// Fenced code block tracking.
pub mod code_fence;
/// Core error and diagnostic types.
pub mod error;
/// Markdown rendering service.
pub mod markdown;
/// Section splitting and the heading hierarchy.
pub mod outline;
/// The per-document pipeline.
pub mod pipeline;
/// Catalog types and lookup indexes.
pub mod reference;
/// Inline reference resolution.
pub mod resolver;
/// Anchor slug normalization.
pub mod slug;
/// Claimed-span scanning.
pub mod spans;
/// Table-of-contents projection.
pub mod toc;

pub use blocks::{BlockCounts, BlockTransformer, CalloutKind, IdSource, SequentialIds, transform};
pub use code_fence::{FencePhase, FenceState, LineParseOutcome, advance_fence_state};
pub use error::{ContentError, Diagnostic, Diagnostics, SourceLocation};
pub use markdown::{RenderOptions, render_markdown};
pub use outline::{Section, build_hierarchy, find_section, split_sections};
pub use pipeline::{PipelineOptions, ProcessedDocument, process_document};
pub use reference::{
    ConceptTerm, IndexOptions, InflectionRules, PrincipleCitation, PrincipleIndex,
    ReferenceCatalog, ReferenceEntity, ReferenceIndex, TermVariantIndex,
};
pub use resolver::{Resolution, resolve, resolve_with_index};
pub use slug::normalize;
pub use toc::{DEFAULT_TOC_DEPTH, TocEntry, navigation_sections, project};
