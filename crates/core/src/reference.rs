//! Reference catalog types and the lookup indexes built from them.
//!
//! Indexes are derived fresh for every processing run and never mutated
//! afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A glossary entry: canonical title and the slug of its page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptTerm {
    /// Canonical title, e.g. `Informationsägare`.
    pub title: String,
    /// Target slug used in `concept:<slug>` links.
    pub slug: String,
}

/// A governance principle that can be cited as `[P:<id>]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipleCitation {
    /// Formal identifier.
    pub id: String,
    /// Display header used as link text.
    pub header: String,
}

/// One catalog entry of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceEntity {
    /// Glossary term.
    Concept(ConceptTerm),
    /// Principle citation.
    Principle(PrincipleCitation),
}

/// Catalog supplied by the content-loading collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    /// Glossary terms.
    #[serde(default)]
    pub concepts: Vec<ConceptTerm>,
    /// Citable principles.
    #[serde(default)]
    pub principles: Vec<PrincipleCitation>,
}

impl ReferenceCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect a catalog from mixed entities, keeping their order.
    pub fn from_entities(entities: impl IntoIterator<Item = ReferenceEntity>) -> Self {
        let mut catalog = Self::new();
        for entity in entities {
            match entity {
                ReferenceEntity::Concept(term) => catalog.concepts.push(term),
                ReferenceEntity::Principle(citation) => catalog.principles.push(citation),
            }
        }
        catalog
    }

    /// Whether the catalog has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty() && self.principles.is_empty()
    }
}

/// Suffix patterns used to generate inflected surface forms of a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InflectionRules {
    /// Definite singular suffixes, always generated.
    pub definite: Vec<String>,
    /// Plural suffixes.
    pub plural: Vec<String>,
    /// Definite plural suffixes.
    pub definite_plural: Vec<String>,
    /// Endings that mark a title as already plural-like.
    pub plural_endings: Vec<String>,
}

impl InflectionRules {
    /// Swedish suffix patterns.
    pub fn swedish() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            definite: owned(&["en", "et"]),
            plural: owned(&["er", "ar"]),
            definite_plural: owned(&["erna", "arna"]),
            plural_endings: owned(&["er", "ar", "or"]),
        }
    }

    /// No inflection: only the bare term is indexed.
    pub fn none() -> Self {
        Self {
            definite: Vec::new(),
            plural: Vec::new(),
            definite_plural: Vec::new(),
            plural_endings: Vec::new(),
        }
    }

    /// Surface forms for an already lower-cased term, bare form first.
    pub fn variants(&self, term: &str) -> Vec<String> {
        let mut forms = vec![term.to_string()];
        forms.extend(self.definite.iter().map(|suffix| format!("{term}{suffix}")));

        let plural_like = self
            .plural_endings
            .iter()
            .any(|ending| term.ends_with(ending.as_str()));
        if !plural_like {
            forms.extend(self.plural.iter().map(|suffix| format!("{term}{suffix}")));
            forms.extend(
                self.definite_plural
                    .iter()
                    .map(|suffix| format!("{term}{suffix}")),
            );
        }
        forms
    }
}

impl Default for InflectionRules {
    fn default() -> Self {
        Self::swedish()
    }
}

/// Options for building the reference indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexOptions {
    /// Titles never linked (compared case-insensitively), e.g. the corpus's
    /// own brand term.
    pub meta_terms: Vec<String>,
    /// Inflection patterns.
    pub inflections: InflectionRules,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            meta_terms: vec!["HERAF".to_string()],
            inflections: InflectionRules::default(),
        }
    }
}

impl IndexOptions {
    fn is_meta(&self, title: &str) -> bool {
        self.meta_terms
            .iter()
            .any(|meta| meta.trim().to_lowercase() == title)
    }
}

/// Where a concept variant points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptTarget {
    /// Concept slug.
    pub slug: String,
    /// Canonical title, used as the link title attribute.
    pub title: String,
}

/// Lower-cased surface form → owning concept.
#[derive(Debug, Clone, Default)]
pub struct TermVariantIndex {
    targets: HashMap<String, ConceptTarget>,
    /// Variants grouped by first char, longest first.
    by_initial: HashMap<char, Vec<String>>,
}

impl TermVariantIndex {
    /// Build from concept terms. Later terms overwrite earlier ones that
    /// generate the same variant.
    pub fn build(concepts: &[ConceptTerm], options: &IndexOptions) -> Self {
        let mut targets: HashMap<String, ConceptTarget> = HashMap::new();

        for concept in concepts {
            let term = concept.title.trim().to_lowercase();
            if term.is_empty() || options.is_meta(&term) {
                continue;
            }
            let target = ConceptTarget {
                slug: concept.slug.clone(),
                title: concept.title.trim().to_string(),
            };
            for variant in options.inflections.variants(&term) {
                if let Some(previous) = targets.insert(variant.clone(), target.clone())
                    && previous.slug != target.slug
                {
                    log::debug!(
                        "variant '{}' moves from '{}' to '{}'",
                        variant,
                        previous.slug,
                        target.slug
                    );
                }
            }
        }

        let mut by_initial: HashMap<char, Vec<String>> = HashMap::new();
        for variant in targets.keys() {
            if let Some(first) = variant.chars().next() {
                by_initial.entry(first).or_default().push(variant.clone());
            }
        }
        for group in by_initial.values_mut() {
            group.sort_by(|a, b| {
                b.chars()
                    .count()
                    .cmp(&a.chars().count())
                    .then_with(|| a.cmp(b))
            });
        }

        Self {
            targets,
            by_initial,
        }
    }

    /// Look up a surface form (case-insensitive).
    pub fn get(&self, variant: &str) -> Option<&ConceptTarget> {
        self.targets.get(&variant.to_lowercase())
    }

    /// Candidate variants starting with `initial` (lower-case), longest first.
    pub fn candidates(&self, initial: char) -> impl Iterator<Item = (&str, &ConceptTarget)> {
        self.by_initial
            .get(&initial)
            .into_iter()
            .flatten()
            .filter_map(|variant| {
                self.targets
                    .get(variant)
                    .map(|target| (variant.as_str(), target))
            })
    }

    /// Number of indexed surface forms.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Case-insensitive principle id → citation.
#[derive(Debug, Clone, Default)]
pub struct PrincipleIndex {
    by_id: HashMap<String, PrincipleCitation>,
}

impl PrincipleIndex {
    /// Build from principle citations; a repeated id keeps the last entry.
    pub fn build(principles: &[PrincipleCitation]) -> Self {
        let mut by_id = HashMap::new();
        for principle in principles {
            let key = principle.id.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            if by_id.insert(key, principle.clone()).is_some() {
                log::debug!("duplicate principle id '{}', keeping the last", principle.id);
            }
        }
        Self { by_id }
    }

    /// Look up a principle by id (case-insensitive).
    pub fn get(&self, id: &str) -> Option<&PrincipleCitation> {
        self.by_id.get(&id.trim().to_lowercase())
    }

    /// Number of indexed principles.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Both indexes for one processing run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    /// Concept surface forms.
    pub concepts: TermVariantIndex,
    /// Principles by id.
    pub principles: PrincipleIndex,
}

impl ReferenceIndex {
    /// Build both indexes.
    pub fn build(
        concepts: &[ConceptTerm],
        principles: &[PrincipleCitation],
        options: &IndexOptions,
    ) -> Self {
        let index = Self {
            concepts: TermVariantIndex::build(concepts, options),
            principles: PrincipleIndex::build(principles),
        };
        log::debug!(
            "reference index: {} concept variants, {} principles",
            index.concepts.len(),
            index.principles.len()
        );
        index
    }

    /// Build both indexes from a catalog.
    pub fn from_catalog(catalog: &ReferenceCatalog, options: &IndexOptions) -> Self {
        Self::build(&catalog.concepts, &catalog.principles, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(title: &str, slug: &str) -> ConceptTerm {
        ConceptTerm {
            title: title.to_string(),
            slug: slug.to_string(),
        }
    }

    #[test]
    fn swedish_variants_for_singular_term() {
        let forms = InflectionRules::swedish().variants("policy");
        assert_eq!(
            forms,
            vec![
                "policy",
                "policyen",
                "policyet",
                "policyer",
                "policyar",
                "policyerna",
                "policyarna"
            ]
        );
    }

    #[test]
    fn plural_like_terms_skip_plural_forms() {
        let forms = InflectionRules::swedish().variants("riktlinjer");
        assert_eq!(forms, vec!["riktlinjer", "riktlinjeren", "riktlinjeret"]);
    }

    #[test]
    fn all_variants_map_to_the_same_slug() {
        let index = TermVariantIndex::build(
            &[concept("Riskanalys", "riskanalys")],
            &IndexOptions::default(),
        );
        assert_eq!(index.len(), 7);
        for form in ["riskanalys", "Riskanalysen", "RISKANALYSERNA"] {
            let target = index.get(form).expect(form);
            assert_eq!(target.slug, "riskanalys");
            assert_eq!(target.title, "Riskanalys");
        }
    }

    #[test]
    fn meta_terms_are_excluded() {
        let index = TermVariantIndex::build(
            &[concept("HERAF", "heraf"), concept("Risk", "risk")],
            &IndexOptions::default(),
        );
        assert!(index.get("heraf").is_none());
        assert!(index.get("risk").is_some());
    }

    #[test]
    fn collisions_resolve_last_write_wins() {
        // "risker" is both a plural of "Risk" and its own term
        let index = TermVariantIndex::build(
            &[concept("Risk", "risk"), concept("Risker", "risker-begrepp")],
            &IndexOptions::default(),
        );
        assert_eq!(index.get("risker").unwrap().slug, "risker-begrepp");
        assert_eq!(index.get("risken").unwrap().slug, "risk");
    }

    #[test]
    fn candidates_are_longest_first() {
        let index = TermVariantIndex::build(
            &[concept("Data", "data"), concept("Dataskydd", "dataskydd")],
            &IndexOptions {
                meta_terms: Vec::new(),
                inflections: InflectionRules::none(),
            },
        );
        let order: Vec<&str> = index.candidates('d').map(|(variant, _)| variant).collect();
        assert_eq!(order, vec!["dataskydd", "data"]);
        assert_eq!(index.candidates('x').count(), 0);
    }

    #[test]
    fn principle_lookup_is_case_insensitive() {
        let index = PrincipleIndex::build(&[PrincipleCitation {
            id: "GOV-01".into(),
            header: "Tydligt ägarskap".into(),
        }]);
        assert_eq!(index.get("gov-01").unwrap().header, "Tydligt ägarskap");
        assert_eq!(index.get(" GOV-01 ").unwrap().id, "GOV-01");
        assert!(index.get("GOV-02").is_none());
    }

    #[test]
    fn catalog_from_entities_splits_kinds() {
        let catalog = ReferenceCatalog::from_entities([
            ReferenceEntity::Concept(concept("Risk", "risk")),
            ReferenceEntity::Principle(PrincipleCitation {
                id: "P1".into(),
                header: "Ett".into(),
            }),
        ]);
        assert_eq!(catalog.concepts.len(), 1);
        assert_eq!(catalog.principles.len(), 1);
        assert!(!catalog.is_empty());
        assert!(ReferenceCatalog::new().is_empty());
    }
}
