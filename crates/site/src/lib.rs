#![deny(missing_docs)]
//! HERAF site layer: content catalogs, the guidance manual, link decoration
//! and the content-data export around the core engine.

/// Principle and concept catalogs.
pub mod catalog;
/// Site configuration.
pub mod config;
/// Site-level errors.
pub mod error;
/// Content-data JSON export.
pub mod export;
/// YAML front matter.
pub mod frontmatter;
/// Anchor link decoration.
pub mod links;
/// Guidance manual loading.
pub mod manual;
/// Catalog search helpers.
pub mod search;

pub use catalog::{
    Concept, ConceptMetadata, ContentCatalog, ContentItem, ContentKind, Principle,
    PrincipleMetadata, PrincipleStatus, load_catalog, render_catalog,
};
pub use config::SiteConfig;
pub use error::SiteError;
pub use export::{ContentData, write_content_data};
pub use frontmatter::{FrontMatter, FrontMatterError, parse_front_matter};
pub use links::decorate_links;
pub use manual::{FileManualSource, GuidanceContent, ManualSource, load_guidance};
pub use search::{SearchResults, principles_by_tag, related_principles, search_content};

/// Load, render and export the whole catalog described by `config`.
pub fn build_content(config: &SiteConfig) -> Result<ContentCatalog, SiteError> {
    let mut catalog = load_catalog(config)?;
    render_catalog(&mut catalog, &config.pipeline_options(), config.max_threads)?;
    write_content_data(&ContentData::from(&catalog), &config.output_path)?;
    log::info!(
        "built {} principles and {} concepts into {}",
        catalog.principles.len(),
        catalog.concepts.len(),
        config.output_path.display()
    );
    Ok(catalog)
}
