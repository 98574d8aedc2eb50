use heraf_core::{
    BlockCounts, BlockTransformer, Diagnostics, IndexOptions, PipelineOptions, ReferenceCatalog,
    ReferenceIndex, normalize, process_document, resolve_with_index,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

// ============================================================================
// Boundary helpers
// ============================================================================

fn js_error(context: &str, err: impl std::fmt::Display) -> js_sys::Error {
    js_sys::Error::new(&format!("{}: {}", context, err))
}

/// Deserialize an optional JS argument; `undefined` and `null` give the default.
fn from_js<T: DeserializeOwned + Default>(value: JsValue, what: &str) -> Result<T, js_sys::Error> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| js_error(&format!("Invalid {}", what), e))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, js_sys::Error> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| js_error("Serialization error", e))
}

// ============================================================================
// Result Types
// ============================================================================

/// Result of [`resolve_references`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedText {
    /// Markdown with concept, citation and cross-reference links.
    pub text: String,
    /// Concept mentions linked.
    pub concept_links: usize,
    /// Citations linked.
    pub citations: usize,
    /// Cross-references linked.
    pub cross_references: usize,
    /// Unresolved citations.
    pub diagnostics: Diagnostics,
}

/// Result of [`transform_blocks`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedBlocks {
    /// Markdown with callouts, figures and expandables as HTML blocks.
    pub text: String,
    /// Callouts emitted.
    pub callouts: usize,
    /// Figures emitted.
    pub figures: usize,
    /// Expandable sections emitted.
    pub expandables: usize,
    /// Unclosed constructs.
    pub diagnostics: Diagnostics,
}

// ============================================================================
// Document API
// ============================================================================

/// Runs the whole pipeline over one Markdown document.
///
/// # Arguments
///
/// * `source` - Markdown text
/// * `catalog` - `{ concepts: [{title, slug}], principles: [{id, header}] }`
/// * `config` - Optional pipeline options (`tocDepth`, `fallbackTitle`,
///   `expandablePrefix`, `index.metaTerms`)
///
/// # Returns
///
/// `{ title, html, sections, toc, diagnostics }`.
///
/// # Example (JavaScript)
///
/// ```javascript
/// import { processDocument } from './heraf_wasm';
///
/// const doc = processDocument('# Styrning\n\nEn Policy.', {
///   concepts: [{ title: 'Policy', slug: 'policy' }],
///   principles: [],
/// });
/// // doc.html contains <a href="concept:policy" title="Policy">Policy</a>
/// ```
#[wasm_bindgen(js_name = processDocument)]
pub fn process_document_js(
    source: &str,
    catalog: JsValue,
    config: JsValue,
) -> Result<JsValue, js_sys::Error> {
    let catalog: ReferenceCatalog = from_js(catalog, "catalog")?;
    let options: PipelineOptions = from_js(config, "options")?;
    let document =
        process_document(source, &catalog, &options).map_err(|e| js_error("Render error", e))?;
    to_js(&document)
}

/// Anchor id for a heading or cross-reference text.
#[wasm_bindgen(js_name = normalizeSlug)]
pub fn normalize_slug(text: &str) -> String {
    normalize(text)
}

/// Rewrites concept mentions, `[P:id]` citations and `[[text]]`
/// cross-references into Markdown links, without rendering.
#[wasm_bindgen(js_name = resolveReferences)]
pub fn resolve_references(source: &str, catalog: JsValue) -> Result<JsValue, js_sys::Error> {
    let catalog: ReferenceCatalog = from_js(catalog, "catalog")?;
    let index = ReferenceIndex::from_catalog(&catalog, &IndexOptions::default());
    let resolution = resolve_with_index(source, &index);
    to_js(&ResolvedText {
        text: resolution.text,
        concept_links: resolution.concept_links,
        citations: resolution.citations,
        cross_references: resolution.cross_references,
        diagnostics: resolution.diagnostics,
    })
}

/// Replaces callouts, figures and expandable sections with HTML blocks.
#[wasm_bindgen(js_name = transformBlocks)]
pub fn transform_blocks(source: &str) -> Result<JsValue, js_sys::Error> {
    let mut transformer = BlockTransformer::with_defaults();
    let text = transformer.transform(source);
    let BlockCounts {
        callouts,
        figures,
        expandables,
    } = transformer.counts();
    to_js(&TransformedBlocks {
        text,
        callouts,
        figures,
        expandables,
        diagnostics: transformer.take_diagnostics(),
    })
}
