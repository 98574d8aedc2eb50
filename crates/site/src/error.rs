use std::path::PathBuf;

use heraf_core::ContentError;
use thiserror::Error;

use crate::frontmatter::FrontMatterError;

/// Errors raised while loading, rendering or exporting site content.
#[derive(Debug, Error)]
pub enum SiteError {
    /// Filesystem access failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// A content file had unusable front matter.
    #[error("Invalid front matter in {}: {source}", path.display())]
    FrontMatter {
        /// Offending file
        path: PathBuf,
        /// What was wrong with it
        source: FrontMatterError,
    },
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// The guidance manual could not be fetched.
    #[error("Failed to load guidance content from {source_name}: {reason}")]
    ManualUnavailable {
        /// Name of the manual source
        source_name: String,
        /// Why the fetch failed
        reason: String,
    },
    /// Link decoration over rendered HTML failed.
    #[error("HTML rewriting failed: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),
    /// The engine failed to render a document.
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl SiteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
