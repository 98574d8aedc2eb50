//! Table-of-contents projection and navigation helpers.

use serde::Serialize;

use crate::outline::Section;

/// Deepest heading level listed in a table of contents by default.
pub const DEFAULT_TOC_DEPTH: u8 = 3;

/// Deepest heading level a navigation root may have.
const NAVIGATION_ROOT_DEPTH: u8 = 2;

/// Navigation-only view of a [`Section`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Anchor id.
    pub id: String,
    /// Heading text.
    pub title: String,
    /// Heading level (1-6).
    pub level: u8,
    /// Nested entries in source order.
    pub children: Vec<TocEntry>,
}

/// Project a section tree onto the levels `1..=max_depth`.
///
/// Sections deeper than `max_depth` are skipped, but any of their
/// descendants that are within the bound are spliced into the skipped
/// section's place.
pub fn project(tree: &[Section], max_depth: u8) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    project_into(tree, max_depth, &mut entries);
    entries
}

fn project_into(sections: &[Section], max_depth: u8, entries: &mut Vec<TocEntry>) {
    for section in sections {
        if section.level <= max_depth {
            entries.push(TocEntry {
                id: section.id.clone(),
                title: section.title.clone(),
                level: section.level,
                children: project(&section.children, max_depth),
            });
        } else {
            project_into(&section.children, max_depth, entries);
        }
    }
}

/// Depth-first flattening of a TOC tree, children emptied.
pub fn flatten(entries: &[TocEntry]) -> Vec<TocEntry> {
    let mut flat = Vec::new();
    for entry in entries {
        flat.push(TocEntry {
            children: Vec::new(),
            ..entry.clone()
        });
        flat.extend(flatten(&entry.children));
    }
    flat
}

/// Main navigation: top-level sections at level 1-2 with their
/// sub-sections down to level 3.
pub fn navigation_sections(tree: &[Section]) -> Vec<TocEntry> {
    tree.iter()
        .filter(|section| section.level <= NAVIGATION_ROOT_DEPTH)
        .map(|section| TocEntry {
            id: section.id.clone(),
            title: section.title.clone(),
            level: section.level,
            children: project(&section.children, DEFAULT_TOC_DEPTH),
        })
        .collect()
}
