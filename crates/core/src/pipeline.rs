//! Document pipeline: index build, reference resolution, block
//! transformation, rendering and outline extraction for one document.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ContentError;
use crate::blocks::{BlockTransformer, IdSource, SequentialIds};
use crate::error::{Diagnostic, Diagnostics};
use crate::markdown::{RenderOptions, render_markdown};
use crate::outline::{Section, build_hierarchy, first_title, split_sections};
use crate::reference::{IndexOptions, ReferenceCatalog, ReferenceIndex};
use crate::resolver::resolve_with_index;
use crate::toc::{DEFAULT_TOC_DEPTH, TocEntry, project};

/// Title used when a document has no level-1 heading.
pub const DEFAULT_FALLBACK_TITLE: &str = "HERAF Vägledning";

/// Options for one [`process_document`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineOptions {
    /// Renderer options for the full document; section bodies and block
    /// bodies use the same options with heading ids off.
    #[serde(skip)]
    pub render: RenderOptions,
    /// Concept and principle indexing.
    pub index: IndexOptions,
    /// Deepest heading level listed in the TOC.
    pub toc_depth: u8,
    /// Title when the text has no level-1 heading.
    pub fallback_title: String,
    /// Prefix of generated expandable-section ids.
    pub expandable_prefix: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            render: RenderOptions::document(),
            index: IndexOptions::default(),
            toc_depth: DEFAULT_TOC_DEPTH,
            fallback_title: DEFAULT_FALLBACK_TITLE.to_string(),
            expandable_prefix: "expandable".to_string(),
        }
    }
}

/// Everything produced for one document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDocument {
    /// First level-1 heading, or the fallback title.
    pub title: String,
    /// The whole document rendered with heading ids.
    pub html: String,
    /// Section tree with rendered content per node.
    pub sections: Vec<Section>,
    /// Depth-bounded navigation tree.
    pub toc: Vec<TocEntry>,
    /// Non-fatal findings from every stage.
    pub diagnostics: Diagnostics,
}

/// Run the full pipeline over `text`.
///
/// Section ids and titles come from the heading lines as written; section
/// content is the body after resolution and block transformation, rendered
/// on its own.
pub fn process_document(
    text: &str,
    catalog: &ReferenceCatalog,
    options: &PipelineOptions,
) -> Result<ProcessedDocument, ContentError> {
    let index = ReferenceIndex::from_catalog(catalog, &options.index);
    let mut blocks = BlockTransformer::new(
        options.render,
        SequentialIds::new(options.expandable_prefix.as_str()),
    );
    let mut diagnostics = Diagnostics::new();

    let prepared = prepare(text, &index, &mut blocks, &mut diagnostics);
    let html = render_markdown(&prepared, &options.render.with_heading_ids(true))?;

    let mut flat = split_sections(text);
    report_duplicate_ids(&flat, &mut diagnostics);

    // Findings inside section bodies were already reported for the full text
    let mut repeated = Diagnostics::new();
    let fragment = options.render.with_heading_ids(false);
    for section in &mut flat {
        let body = prepare(&section.content, &index, &mut blocks, &mut repeated);
        section.content = render_markdown(&body, &fragment)?;
    }

    let sections = build_hierarchy(flat);
    let toc = project(&sections, options.toc_depth);
    let title = first_title(text)
        .map(str::to_string)
        .unwrap_or_else(|| options.fallback_title.clone());

    log::debug!(
        "processed '{}': {} top-level sections, {} toc entries, {} diagnostics",
        title,
        sections.len(),
        toc.len(),
        diagnostics.len()
    );

    Ok(ProcessedDocument {
        title,
        html,
        sections,
        toc,
        diagnostics,
    })
}

/// Resolve references and transform blocks, leaving Markdown ready to render.
fn prepare<I: IdSource>(
    text: &str,
    index: &ReferenceIndex,
    blocks: &mut BlockTransformer<I>,
    diagnostics: &mut Diagnostics,
) -> String {
    let mut resolution = resolve_with_index(text, index);
    diagnostics.append(&mut resolution.diagnostics);
    let transformed = blocks.transform(&resolution.text);
    diagnostics.append(&mut blocks.take_diagnostics());
    transformed
}

fn report_duplicate_ids(flat: &[Section], diagnostics: &mut Diagnostics) {
    let mut seen = HashSet::new();
    for section in flat {
        if !seen.insert(section.id.as_str()) {
            diagnostics.push(Diagnostic::DuplicateHeadingId {
                id: section.id.clone(),
                title: section.title.clone(),
            });
        }
    }
}
