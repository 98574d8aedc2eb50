//! The guidance manual: one long Markdown document, fetched from a source,
//! rendered through the engine and split into navigable sections.

use std::path::{Path, PathBuf};

use heraf_core::{PipelineOptions, ReferenceCatalog, Section, TocEntry, process_document};
use serde::Serialize;

use crate::error::SiteError;
use crate::links::decorate_links;

/// Somewhere the manual text can be fetched from.
pub trait ManualSource {
    /// Human-readable name used in logs and errors.
    fn name(&self) -> String;

    /// Fetch the whole manual text.
    fn fetch(&self) -> Result<String, SiteError>;
}

/// Manual read from a file on disk.
#[derive(Debug, Clone)]
pub struct FileManualSource {
    path: PathBuf,
}

impl FileManualSource {
    /// Source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ManualSource for FileManualSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<String, SiteError> {
        std::fs::read_to_string(&self.path).map_err(|err| SiteError::io(&self.path, err))
    }
}

/// Manual text held in memory.
impl ManualSource for str {
    fn name(&self) -> String {
        "inline manual".to_string()
    }

    fn fetch(&self) -> Result<String, SiteError> {
        Ok(self.to_string())
    }
}

/// The rendered manual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceContent {
    /// First level-1 heading, or the configured fallback.
    pub title: String,
    /// Section tree; every `content` is rendered, decorated HTML.
    pub sections: Vec<Section>,
    /// Depth-bounded table of contents.
    pub toc: Vec<TocEntry>,
    /// The whole manual as one decorated HTML document.
    pub full_content: String,
}

/// Fetch the manual once and render it against `catalog`.
///
/// A failed fetch is not retried; it surfaces as
/// [`SiteError::ManualUnavailable`].
pub fn load_guidance<S: ManualSource + ?Sized>(
    source: &S,
    catalog: &ReferenceCatalog,
    options: &PipelineOptions,
) -> Result<GuidanceContent, SiteError> {
    let text = source.fetch().map_err(|err| {
        log::error!("failed to load guidance content from {}: {}", source.name(), err);
        SiteError::ManualUnavailable {
            source_name: source.name(),
            reason: err.to_string(),
        }
    })?;

    let document = process_document(&text, catalog, options)?;
    for diagnostic in document.diagnostics.iter() {
        log::debug!("{}: {}", source.name(), diagnostic);
    }

    let mut sections = document.sections;
    decorate_sections(&mut sections)?;

    Ok(GuidanceContent {
        title: document.title,
        sections,
        toc: document.toc,
        full_content: decorate_links(&document.html)?,
    })
}

fn decorate_sections(sections: &mut [Section]) -> Result<(), SiteError> {
    for section in sections {
        section.content = decorate_links(&section.content)?;
        decorate_sections(&mut section.children)?;
    }
    Ok(())
}
