//! Catalog search helpers used by the presentation layer.

use serde::Serialize;

use crate::catalog::{Concept, Principle};

/// Most principles returned by [`related_principles`].
pub const MAX_RELATED: usize = 3;

/// Matches of one query, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults<'a> {
    /// Matching principles.
    pub principles: Vec<&'a Principle>,
    /// Matching concepts.
    pub concepts: Vec<&'a Concept>,
}

impl SearchResults<'_> {
    /// No principle and no concept matched.
    pub fn is_empty(&self) -> bool {
        self.principles.is_empty() && self.concepts.is_empty()
    }
}

/// Case-insensitive substring search.
///
/// Principles match on their name, tags or body; concepts on their title or
/// body. A blank query matches nothing.
pub fn search_content<'a>(
    principles: &'a [Principle],
    concepts: &'a [Concept],
    query: &str,
) -> SearchResults<'a> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return SearchResults::default();
    }
    let hit = |text: &str| text.to_lowercase().contains(&needle);

    SearchResults {
        principles: principles
            .iter()
            .filter(|p| {
                hit(&p.metadata.principle)
                    || p.metadata.tags.iter().any(|tag| hit(tag))
                    || hit(&p.content)
            })
            .collect(),
        concepts: concepts
            .iter()
            .filter(|c| hit(&c.metadata.title) || hit(&c.content))
            .collect(),
    }
}

/// Principles carrying `tag`, compared case-insensitively.
pub fn principles_by_tag<'a>(principles: &'a [Principle], tag: &str) -> Vec<&'a Principle> {
    let tag = tag.to_lowercase();
    principles
        .iter()
        .filter(|p| p.metadata.tags.iter().any(|t| t.to_lowercase() == tag))
        .collect()
}

/// Up to [`MAX_RELATED`] other principles sharing at least one tag with
/// `current`.
pub fn related_principles<'a>(current: &Principle, all: &'a [Principle]) -> Vec<&'a Principle> {
    all.iter()
        .filter(|p| p.metadata.id != current.metadata.id)
        .filter(|p| {
            p.metadata
                .tags
                .iter()
                .any(|tag| current.metadata.tags.contains(tag))
        })
        .take(MAX_RELATED)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConceptMetadata, ContentItem, ContentKind, PrincipleMetadata};

    fn principle(id: &str, name: &str, tags: &[&str], body: &str) -> Principle {
        ContentItem {
            metadata: PrincipleMetadata {
                id: id.into(),
                principle: name.into(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                references: Vec::new(),
                status: Default::default(),
            },
            content: body.into(),
            html_content: String::new(),
            slug: id.to_lowercase(),
            kind: ContentKind::Principle,
        }
    }

    fn concept(slug: &str, title: &str, body: &str) -> Concept {
        ContentItem {
            metadata: ConceptMetadata {
                id: slug.into(),
                title: title.into(),
                icon: String::new(),
                category: String::new(),
                relationships: Vec::new(),
                examples: Vec::new(),
                date: None,
            },
            content: body.into(),
            html_content: String::new(),
            slug: slug.into(),
            kind: ContentKind::Concept,
        }
    }

    fn principles() -> Vec<Principle> {
        vec![
            principle("GOV-1", "Tydligt ägarskap", &["styrning", "ansvar"], "Varje system har en ägare."),
            principle("GOV-2", "Dokumenterade beslut", &["styrning"], "Beslut sparas."),
            principle("SEC-1", "Minsta behörighet", &["säkerhet", "Ansvar"], "Ge bara det som behövs."),
            principle("SEC-2", "Spårbarhet", &["säkerhet", "styrning"], "Logga åtkomst."),
            principle("DAT-1", "Öppna data", &["styrning", "data"], "Publicera det som kan delas."),
        ]
    }

    #[test]
    fn search_matches_name_tags_and_body() {
        let principles = principles();
        let concepts = vec![concept("policy", "Policy", "Ett styrande dokument.")];

        let by_name = search_content(&principles, &concepts, "ÄGARSKAP");
        assert_eq!(by_name.principles.len(), 1);
        assert_eq!(by_name.principles[0].metadata.id, "GOV-1");

        let by_tag = search_content(&principles, &concepts, "säkerhet");
        assert_eq!(by_tag.principles.len(), 2);

        let by_body = search_content(&principles, &concepts, "styrande");
        assert!(by_body.principles.is_empty());
        assert_eq!(by_body.concepts.len(), 1);
    }

    #[test]
    fn blank_query_matches_nothing() {
        let principles = principles();
        assert!(search_content(&principles, &[], "  ").is_empty());
    }

    #[test]
    fn tag_lookup_ignores_case() {
        let principles = principles();
        let ids: Vec<&str> = principles_by_tag(&principles, "ANSVAR")
            .iter()
            .map(|p| p.metadata.id.as_str())
            .collect();
        assert_eq!(ids, vec!["GOV-1", "SEC-1"]);
    }

    #[test]
    fn related_excludes_self_and_caps_at_three() {
        let principles = principles();
        let related = related_principles(&principles[0], &principles);
        let ids: Vec<&str> = related.iter().map(|p| p.metadata.id.as_str()).collect();
        assert_eq!(ids, vec!["GOV-2", "SEC-2", "DAT-1"]);
    }

    #[test]
    fn related_needs_an_exact_shared_tag() {
        let principles = principles();
        // "Ansvar" on SEC-1 differs in case from GOV-1's "ansvar"
        let related = related_principles(&principles[2], &principles);
        let ids: Vec<&str> = related.iter().map(|p| p.metadata.id.as_str()).collect();
        assert_eq!(ids, vec!["SEC-2"]);
    }
}
