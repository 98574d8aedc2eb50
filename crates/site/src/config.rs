//! Site configuration.

use std::path::{Path, PathBuf};

use heraf_core::{IndexOptions, PipelineOptions, RenderOptions};
use serde::{Deserialize, Serialize};

use crate::error::SiteError;

/// Where content lives and how it is processed.
///
/// Accepts camelCase keys (`contentRoot`) as well as snake_case ones
/// (`content_root`). Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfig {
    /// Directory holding the content subdirectories.
    #[serde(alias = "content_root")]
    pub content_root: PathBuf,
    /// Principles subdirectory name.
    #[serde(alias = "principles_dir")]
    pub principles_dir: String,
    /// Concepts subdirectory name.
    #[serde(alias = "concepts_dir")]
    pub concepts_dir: String,
    /// Guidance manual Markdown file.
    #[serde(alias = "manual_path")]
    pub manual_path: PathBuf,
    /// Where the content-data JSON is written.
    #[serde(alias = "output_path")]
    pub output_path: PathBuf,
    /// Deepest heading level in tables of contents.
    #[serde(alias = "toc_depth")]
    pub toc_depth: u8,
    /// Concept titles never auto-linked.
    #[serde(alias = "meta_terms")]
    pub meta_terms: Vec<String>,
    /// Manual title when it has no level-1 heading.
    #[serde(alias = "fallback_title")]
    pub fallback_title: String,
    /// Cap on rendering threads; `None` uses the global pool.
    #[serde(alias = "max_threads")]
    pub max_threads: Option<usize>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let pipeline = PipelineOptions::default();
        Self {
            content_root: PathBuf::from("src/content"),
            principles_dir: "principles".to_string(),
            concepts_dir: "concepts".to_string(),
            manual_path: PathBuf::from("static/vagledning.md"),
            output_path: PathBuf::from("src/lib/content-data.generated.json"),
            toc_depth: pipeline.toc_depth,
            meta_terms: pipeline.index.meta_terms,
            fallback_title: pipeline.fallback_title,
            max_threads: None,
        }
    }
}

impl SiteConfig {
    /// Parse YAML configuration.
    pub fn from_yaml_str(input: &str) -> Result<Self, SiteError> {
        serde_yaml::from_str(input).map_err(|err| SiteError::Config(err.to_string()))
    }

    /// Parse JSON configuration.
    pub fn from_json_str(input: &str) -> Result<Self, SiteError> {
        serde_json::from_str(input).map_err(|err| SiteError::Config(err.to_string()))
    }

    /// Read a `.json`, `.yaml` or `.yml` configuration file.
    pub fn load(path: &Path) -> Result<Self, SiteError> {
        let text = std::fs::read_to_string(path).map_err(|err| SiteError::io(path, err))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            other => Err(SiteError::Config(format!(
                "unsupported config format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    /// Principles directory under the content root.
    pub fn principles_path(&self) -> PathBuf {
        self.content_root.join(&self.principles_dir)
    }

    /// Concepts directory under the content root.
    pub fn concepts_path(&self) -> PathBuf {
        self.content_root.join(&self.concepts_dir)
    }

    /// Engine options derived from this configuration.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            render: RenderOptions::document(),
            index: IndexOptions {
                meta_terms: self.meta_terms.clone(),
                ..IndexOptions::default()
            },
            toc_depth: self.toc_depth,
            fallback_title: self.fallback_title.clone(),
            ..PipelineOptions::default()
        }
    }
}
