//! Content-data export consumed by the site build.

use std::path::Path;

use serde::Serialize;

use crate::catalog::{Concept, ContentCatalog, Principle};
use crate::error::SiteError;

/// Every rendered principle and concept, as written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct ContentData<'a> {
    /// Principles in catalog order.
    pub principles: &'a [Principle],
    /// Concepts in catalog order.
    pub concepts: &'a [Concept],
}

impl<'a> From<&'a ContentCatalog> for ContentData<'a> {
    fn from(catalog: &'a ContentCatalog) -> Self {
        Self {
            principles: &catalog.principles,
            concepts: &catalog.concepts,
        }
    }
}

/// Pretty-printed JSON for `data`.
pub fn to_json(data: &ContentData<'_>) -> Result<String, SiteError> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Write `data` to `path`, creating parent directories as needed.
pub fn write_content_data(data: &ContentData<'_>, path: &Path) -> Result<(), SiteError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| SiteError::io(parent, err))?;
    }
    let json = to_json(data)?;
    std::fs::write(path, json).map_err(|err| SiteError::io(path, err))?;
    log::debug!(
        "wrote {} principles and {} concepts to {}",
        data.principles.len(),
        data.concepts.len(),
        path.display()
    );
    Ok(())
}
