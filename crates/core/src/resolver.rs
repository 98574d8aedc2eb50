//! Inline reference resolution.
//!
//! Three rewrites over the same input, all computed against the text as it
//! stood before resolution started:
//!
//! - `[P:<id>]` → `[<header>](principle:<id>)` when the id is catalogued
//! - `[[<text>]]` → `[<text>](#<slug>)`
//! - bare concept mentions → `[<mention>](concept:<slug> "<title>")`
//!
//! Concept mentions are only linked outside claimed spans (see
//! [`SpanMap`]), so existing links, headings, code and the two token kinds
//! above are never rewritten twice.

use crate::error::{Diagnostic, Diagnostics};
use crate::reference::{ConceptTarget, PrincipleIndex, ReferenceIndex, TermVariantIndex};
use crate::slug::normalize;
use crate::spans::{SpanKind, SpanMap};

/// Result of resolving one text.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Rewritten text.
    pub text: String,
    /// Concept mentions linked.
    pub concept_links: usize,
    /// Citations linked.
    pub citations: usize,
    /// Cross-references linked.
    pub cross_references: usize,
    /// Unresolved citations and similar findings.
    pub diagnostics: Diagnostics,
}

struct Replacement {
    start: usize,
    end: usize,
    text: String,
}

/// Resolve references in `text`.
pub fn resolve(text: &str, concepts: &TermVariantIndex, principles: &PrincipleIndex) -> String {
    resolve_with_report(text, concepts, principles).text
}

/// Resolve references using a combined [`ReferenceIndex`].
pub fn resolve_with_index(text: &str, index: &ReferenceIndex) -> Resolution {
    resolve_with_report(text, &index.concepts, &index.principles)
}

/// Resolve references in `text`, reporting what was rewritten.
pub fn resolve_with_report(
    text: &str,
    concepts: &TermVariantIndex,
    principles: &PrincipleIndex,
) -> Resolution {
    let spans = SpanMap::scan(text);
    let mut resolution = Resolution::default();
    let mut replacements = Vec::new();

    for span in spans.of_kind(SpanKind::Citation) {
        let id = text[span.start + 3..span.end - 1].trim();
        match principles.get(id) {
            Some(principle) => {
                resolution.citations += 1;
                replacements.push(Replacement {
                    start: span.start,
                    end: span.end,
                    text: format!(
                        "[{}]({})",
                        escape_label(&principle.header),
                        destination(&format!("principle:{}", principle.id))
                    ),
                });
            }
            None => resolution
                .diagnostics
                .push(Diagnostic::UnresolvedCitation { id: id.to_string() }),
        }
    }

    for span in spans.of_kind(SpanKind::CrossReference) {
        let reference = &text[span.start + 2..span.end - 2];
        if reference.trim().is_empty() {
            continue;
        }
        resolution.cross_references += 1;
        replacements.push(Replacement {
            start: span.start,
            end: span.end,
            text: format!("[{}](#{})", reference, normalize(reference)),
        });
    }

    if !concepts.is_empty() {
        for (start, end, target) in concept_mentions(text, concepts, &spans) {
            resolution.concept_links += 1;
            replacements.push(Replacement {
                start,
                end,
                text: concept_link(&text[start..end], target),
            });
        }
    }

    replacements.sort_by_key(|replacement| replacement.start);
    resolution.text = apply(text, &replacements);

    log::debug!(
        "resolved {} concept links, {} citations, {} cross-references",
        resolution.concept_links,
        resolution.citations,
        resolution.cross_references
    );
    resolution
}

/// Whole-word, case-insensitive concept mentions outside claimed spans.
///
/// Scans left to right; at each word start the longest matching variant
/// wins and its text is consumed.
fn concept_mentions<'a>(
    text: &str,
    concepts: &'a TermVariantIndex,
    spans: &SpanMap,
) -> Vec<(usize, usize, &'a ConceptTarget)> {
    let mut mentions = Vec::new();
    let mut prev_is_word = false;
    let mut pos = 0usize;

    while let Some(ch) = text[pos..].chars().next() {
        if let Some(span) = spans.containing(pos) {
            prev_is_word = text[..span.end]
                .chars()
                .next_back()
                .is_some_and(is_word_char);
            pos = span.end;
            continue;
        }

        if is_word_char(ch)
            && !prev_is_word
            && let Some((len, target)) = longest_match_at(&text[pos..], concepts)
            && spans.is_free(pos, pos + len)
        {
            mentions.push((pos, pos + len, target));
            pos += len;
            prev_is_word = true;
            continue;
        }

        prev_is_word = is_word_char(ch);
        pos += ch.len_utf8();
    }

    mentions
}

fn longest_match_at<'a>(
    haystack: &str,
    concepts: &'a TermVariantIndex,
) -> Option<(usize, &'a ConceptTarget)> {
    let initial = haystack.chars().next()?.to_lowercase().next()?;
    concepts.candidates(initial).find_map(|(variant, target)| {
        let len = match_ignore_case(haystack, variant)?;
        let ends_word = haystack[len..].chars().next().is_none_or(|c| !is_word_char(c));
        ends_word.then_some((len, target))
    })
}

/// Byte length of the prefix of `haystack` equal to `needle` (lower-case)
/// when compared case-insensitively.
fn match_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let mut expected = needle.chars();
    for (idx, ch) in haystack.char_indices() {
        for lower in ch.to_lowercase() {
            if expected.next() != Some(lower) {
                return None;
            }
        }
        if expected.as_str().is_empty() {
            return Some(idx + ch.len_utf8());
        }
    }
    None
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn concept_link(surface: &str, target: &ConceptTarget) -> String {
    format!(
        "[{}]({} \"{}\")",
        surface,
        destination(&format!("concept:{}", target.slug)),
        target.title.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Wrap destinations that would otherwise end the link early.
fn destination(dest: &str) -> String {
    if dest.contains(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == '<') {
        format!("<{}>", dest.replace('<', "%3C").replace('>', "%3E"))
    } else {
        dest.to_string()
    }
}

fn escape_label(label: &str) -> String {
    label.replace('[', "\\[").replace(']', "\\]")
}

fn apply(text: &str, replacements: &[Replacement]) -> String {
    let mut output = String::with_capacity(text.len() + replacements.len() * 32);
    let mut cursor = 0usize;
    for replacement in replacements {
        if replacement.start < cursor {
            continue;
        }
        output.push_str(&text[cursor..replacement.start]);
        output.push_str(&replacement.text);
        cursor = replacement.end;
    }
    output.push_str(&text[cursor..]);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{ConceptTerm, IndexOptions, PrincipleCitation};

    fn index() -> ReferenceIndex {
        ReferenceIndex::build(
            &[
                ConceptTerm {
                    title: "Policy".into(),
                    slug: "policy".into(),
                },
                ConceptTerm {
                    title: "Risk".into(),
                    slug: "risk".into(),
                },
                ConceptTerm {
                    title: "Riskanalys".into(),
                    slug: "riskanalys".into(),
                },
                ConceptTerm {
                    title: "HERAF".into(),
                    slug: "heraf".into(),
                },
            ],
            &[PrincipleCitation {
                id: "GOV-1".into(),
                header: "Tydligt ägarskap".into(),
            }],
            &IndexOptions::default(),
        )
    }

    fn run(text: &str) -> String {
        resolve_with_index(text, &index()).text
    }

    #[test]
    fn links_bare_mention_but_not_existing_link_label() {
        let out = run("The Policy requires review. See [Policy](concept:policy).");
        assert_eq!(
            out,
            "The [Policy](concept:policy \"Policy\") requires review. See [Policy](concept:policy)."
        );
    }

    #[test]
    fn preserves_surface_case_and_inflection() {
        let out = run("Riskerna och risken i POLICYN.");
        assert_eq!(
            out,
            "[Riskerna](concept:risk \"Risk\") och [risken](concept:risk \"Risk\") i POLICYN."
        );
    }

    #[test]
    fn whole_words_only() {
        assert_eq!(run("Riskfri policyhantering"), "Riskfri policyhantering");
        assert_eq!(run("risk_x"), "risk_x");
    }

    #[test]
    fn longest_variant_wins_at_same_position() {
        let out = run("En riskanalys görs.");
        assert_eq!(out, "En [riskanalys](concept:riskanalys \"Riskanalys\") görs.");
    }

    #[test]
    fn swedish_letters_are_word_characters() {
        // "Risk" followed by "ä" is one word, not a mention
        assert_eq!(run("Riskä"), "Riskä");
    }

    #[test]
    fn heading_lines_are_left_alone() {
        let out = run("## Policy\nPolicy");
        assert_eq!(out, "## Policy\n[Policy](concept:policy \"Policy\")");
    }

    #[test]
    fn code_is_left_alone() {
        let out = run("`Policy` and\n```\nPolicy [P:GOV-1]\n```\n");
        assert_eq!(out, "`Policy` and\n```\nPolicy [P:GOV-1]\n```\n");
    }

    #[test]
    fn callout_fence_body_is_prose() {
        let out = run("```note\nThe Policy\n```");
        assert_eq!(out, "```note\nThe [Policy](concept:policy \"Policy\")\n```");
    }

    #[test]
    fn meta_term_never_linked() {
        assert_eq!(run("Om HERAF"), "Om HERAF");
    }

    #[test]
    fn citation_resolves_case_insensitively() {
        let resolution = resolve_with_index("Se [P:gov-1].", &index());
        assert_eq!(resolution.text, "Se [Tydligt ägarskap](principle:GOV-1).");
        assert_eq!(resolution.citations, 1);
        assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn unresolved_citation_stays_literal() {
        let resolution = resolve_with_index("Se [P:ZZZ].", &index());
        assert_eq!(resolution.text, "Se [P:ZZZ].");
        assert_eq!(
            resolution.diagnostics.items,
            vec![Diagnostic::UnresolvedCitation { id: "ZZZ".into() }]
        );
    }

    #[test]
    fn cross_reference_targets_normalized_text() {
        let out = run("Läs [[Roller och Ansvar]].");
        assert_eq!(out, "Läs [Roller och Ansvar](#roller-och-ansvar).");
    }

    #[test]
    fn concept_inside_token_text_is_not_relinked() {
        let out = run("[[Policy]] och [P:GOV-1]");
        assert_eq!(out, "[Policy](#policy) och [Tydligt ägarskap](principle:GOV-1)");
    }

    #[test]
    fn concept_inside_principle_header_is_not_linked() {
        let idx = ReferenceIndex::build(
            &[ConceptTerm {
                title: "Ägarskap".into(),
                slug: "agarskap".into(),
            }],
            &[PrincipleCitation {
                id: "GOV-1".into(),
                header: "Tydligt ägarskap".into(),
            }],
            &IndexOptions::default(),
        );
        let out = resolve_with_index("[P:GOV-1] kräver ägarskap", &idx).text;
        assert_eq!(
            out,
            "[Tydligt ägarskap](principle:GOV-1) kräver [ägarskap](concept:agarskap \"Ägarskap\")"
        );
    }

    #[test]
    fn slugs_with_spaces_use_angle_destinations() {
        let idx = ReferenceIndex::build(
            &[ConceptTerm {
                title: "Öppna data".into(),
                slug: "oppna data".into(),
            }],
            &[],
            &IndexOptions::default(),
        );
        let out = resolve_with_index("Om öppna data", &idx).text;
        assert_eq!(out, "Om [öppna data](<concept:oppna data> \"Öppna data\")");
    }

    #[test]
    fn empty_index_returns_text_unchanged() {
        let empty = ReferenceIndex::default();
        let text = "Policy [P:X] [[Y]]";
        let resolution = resolve_with_index(text, &empty);
        assert_eq!(resolution.text, "Policy [P:X] [Y](#y)");
    }

    #[test]
    fn match_ignore_case_handles_multibyte() {
        assert_eq!(match_ignore_case("ÄGARE x", "ägare"), Some("ÄGARE".len()));
        assert_eq!(match_ignore_case("ägar", "ägare"), None);
        assert_eq!(match_ignore_case("abc", ""), None);
    }
}
