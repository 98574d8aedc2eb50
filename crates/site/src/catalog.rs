//! Principle and concept catalogs loaded from Markdown content directories.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use heraf_core::{
    ConceptTerm, PipelineOptions, PrincipleCitation, ReferenceCatalog, process_document,
};
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::SiteConfig;
use crate::error::SiteError;
use crate::frontmatter::parse_front_matter;
use crate::links::decorate_links;

/// Lifecycle state of a principle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipleStatus {
    /// Not yet in force.
    #[default]
    Draft,
    /// In force.
    Active,
    /// Retired.
    Deprecated,
}

/// Front matter of a principle file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipleMetadata {
    /// Citation id, as used in `[P:<id>]`.
    pub id: String,
    /// The principle statement, also its display header.
    pub principle: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// External references.
    #[serde(default)]
    pub references: Vec<String>,
    /// Lifecycle state.
    #[serde(default)]
    pub status: PrincipleStatus,
}

/// Front matter of a concept file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptMetadata {
    /// Concept id.
    pub id: String,
    /// Canonical title, matched in running text.
    pub title: String,
    /// Icon name used by the presentation layer.
    #[serde(default)]
    pub icon: String,
    /// Grouping.
    #[serde(default)]
    pub category: String,
    /// Slugs of related concepts.
    #[serde(default)]
    pub relationships: Vec<String>,
    /// Usage examples.
    #[serde(default)]
    pub examples: Vec<String>,
    /// Last revision date as written.
    #[serde(default)]
    pub date: Option<String>,
}

/// Which directory an item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Principle file.
    Principle,
    /// Concept file.
    Concept,
}

/// One content file: metadata, Markdown body and (once rendered) HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem<M> {
    /// Typed front matter.
    pub metadata: M,
    /// Markdown body.
    pub content: String,
    /// Rendered, link-decorated body; empty until rendered.
    #[serde(default)]
    pub html_content: String,
    /// File stem.
    pub slug: String,
    /// Source directory kind.
    #[serde(rename = "type")]
    pub kind: ContentKind,
}

/// A principle file.
pub type Principle = ContentItem<PrincipleMetadata>;
/// A concept file.
pub type Concept = ContentItem<ConceptMetadata>;

/// Every principle and concept of a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCatalog {
    /// Principles, active first, then by name.
    pub principles: Vec<Principle>,
    /// Concepts in file-name order.
    pub concepts: Vec<Concept>,
}

impl ContentCatalog {
    /// Project onto the engine's reference catalog.
    pub fn reference_catalog(&self) -> ReferenceCatalog {
        ReferenceCatalog {
            concepts: self
                .concepts
                .iter()
                .map(|concept| ConceptTerm {
                    title: concept.metadata.title.clone(),
                    slug: concept.slug.clone(),
                })
                .collect(),
            principles: self
                .principles
                .iter()
                .map(|principle| PrincipleCitation {
                    id: principle.metadata.id.clone(),
                    header: principle.metadata.principle.clone(),
                })
                .collect(),
        }
    }

    /// Principle by slug.
    pub fn find_principle(&self, slug: &str) -> Option<&Principle> {
        self.principles.iter().find(|p| p.slug == slug)
    }

    /// Concept by slug.
    pub fn find_concept(&self, slug: &str) -> Option<&Concept> {
        self.concepts.iter().find(|c| c.slug == slug)
    }

    /// Concepts keyed by slug.
    pub fn concepts_by_slug(&self) -> HashMap<&str, &Concept> {
        self.concepts
            .iter()
            .map(|concept| (concept.slug.as_str(), concept))
            .collect()
    }
}

/// Load every principle and concept under `config`'s content root.
///
/// Missing directories are empty. Files that cannot be read or whose front
/// matter does not parse are logged and skipped.
pub fn load_catalog(config: &SiteConfig) -> Result<ContentCatalog, SiteError> {
    let mut principles: Vec<Principle> =
        load_items(&config.principles_path(), ContentKind::Principle)?;
    principles.sort_by(compare_principles);
    warn_duplicate_ids(&principles);
    let concepts = load_items(&config.concepts_path(), ContentKind::Concept)?;

    log::debug!(
        "loaded {} principles and {} concepts from {}",
        principles.len(),
        concepts.len(),
        config.content_root.display()
    );
    Ok(ContentCatalog {
        principles,
        concepts,
    })
}

fn compare_principles(a: &Principle, b: &Principle) -> Ordering {
    let active = |p: &Principle| p.metadata.status != PrincipleStatus::Active;
    active(a).cmp(&active(b)).then_with(|| {
        a.metadata
            .principle
            .to_lowercase()
            .cmp(&b.metadata.principle.to_lowercase())
    })
}

fn warn_duplicate_ids(principles: &[Principle]) {
    let mut seen = HashSet::new();
    for principle in principles {
        if !seen.insert(principle.metadata.id.as_str()) {
            log::warn!(
                "principle id {} is used by more than one file ({})",
                principle.metadata.id,
                principle.slug
            );
        }
    }
}

fn load_items<M: DeserializeOwned>(
    dir: &Path,
    kind: ContentKind,
) -> Result<Vec<ContentItem<M>>, SiteError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("{} does not exist, no {:?} items", dir.display(), kind);
            return Ok(Vec::new());
        }
        Err(err) => return Err(SiteError::io(dir, err)),
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();

    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        match load_item(&path, kind) {
            Ok(item) => items.push(item),
            Err(err) => log::warn!("skipping {}: {}", path.display(), err),
        }
    }
    Ok(items)
}

fn load_item<M: DeserializeOwned>(
    path: &Path,
    kind: ContentKind,
) -> Result<ContentItem<M>, SiteError> {
    let text = std::fs::read_to_string(path).map_err(|err| SiteError::io(path, err))?;
    let parsed = parse_front_matter::<M>(&text).map_err(|source| SiteError::FrontMatter {
        path: path.to_path_buf(),
        source,
    })?;
    let slug = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ContentItem {
        metadata: parsed.data,
        content: parsed.body.to_string(),
        html_content: String::new(),
        slug,
        kind,
    })
}

/// Render every item body through the engine and decorate its links.
///
/// Items are rendered in parallel, inside a pool of `max_threads` workers
/// when given.
pub fn render_catalog(
    catalog: &mut ContentCatalog,
    options: &PipelineOptions,
    max_threads: Option<usize>,
) -> Result<(), SiteError> {
    let references = catalog.reference_catalog();
    let pool = max_threads.and_then(|threads| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .ok()
    });

    let render_all = |catalog: &mut ContentCatalog| -> Result<(), SiteError> {
        catalog
            .principles
            .par_iter_mut()
            .try_for_each(|item| render_item(item, &references, options))?;
        catalog
            .concepts
            .par_iter_mut()
            .try_for_each(|item| render_item(item, &references, options))
    };

    match pool {
        Some(pool) => pool.install(|| render_all(catalog)),
        None => render_all(catalog),
    }
}

fn render_item<M>(
    item: &mut ContentItem<M>,
    references: &ReferenceCatalog,
    options: &PipelineOptions,
) -> Result<(), SiteError> {
    let document = process_document(&item.content, references, options)?;
    if !document.diagnostics.is_empty() {
        log::debug!(
            "{} finding(s) while rendering {}",
            document.diagnostics.len(),
            item.slug
        );
    }
    item.html_content = decorate_links(&document.html)?;
    Ok(())
}
