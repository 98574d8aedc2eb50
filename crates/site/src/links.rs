//! Anchor decoration over rendered HTML.
//!
//! The engine emits `concept:` and `principle:` pseudo-scheme links plus
//! `#fragment` cross-references. The presentation layer styles and routes
//! them by class and data attribute, which this pass adds. Hrefs are left
//! as they are.

use std::borrow::Cow;

use lol_html::html_content::Element;
use lol_html::{ElementContentHandlers, RewriteStrSettings, Selector, element, rewrite_str};

use crate::error::SiteError;

/// Class added to concept links.
pub const CONCEPT_LINK_CLASS: &str = "concept-link";
/// Class added to principle links.
pub const PRINCIPLE_LINK_CLASS: &str = "principle-link";
/// Class added to in-page cross-references.
pub const CROSS_REFERENCE_CLASS: &str = "cross-reference";

/// Handlers for every kind of engine-produced link.
pub fn link_handlers() -> Vec<(Cow<'static, Selector>, ElementContentHandlers<'static>)> {
    vec![
        concept_link_handler(),
        principle_link_handler(),
        cross_reference_handler(),
    ]
}

/// Decorate engine-produced links in `html`.
pub fn decorate_links(html: &str) -> Result<String, SiteError> {
    let decorated = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: link_handlers(),
            ..RewriteStrSettings::new()
        },
    )?;
    Ok(decorated)
}

fn concept_link_handler() -> (Cow<'static, Selector>, ElementContentHandlers<'static>) {
    element!(r#"a[href^="concept:"]"#, |el| {
        let slug = href_target(el, "concept:");
        add_class(el, CONCEPT_LINK_CLASS)?;
        el.set_attribute("data-concept", &slug)?;
        Ok(())
    })
}

fn principle_link_handler() -> (Cow<'static, Selector>, ElementContentHandlers<'static>) {
    element!(r#"a[href^="principle:"]"#, |el| {
        let id = href_target(el, "principle:");
        add_class(el, PRINCIPLE_LINK_CLASS)?;
        el.set_attribute("data-principle", &id)?;
        Ok(())
    })
}

fn cross_reference_handler() -> (Cow<'static, Selector>, ElementContentHandlers<'static>) {
    element!(r##"a[href^="#"]"##, |el| {
        add_class(el, CROSS_REFERENCE_CLASS)?;
        Ok(())
    })
}

/// The href with `scheme` stripped and `%20` turned back into spaces.
fn href_target(el: &Element<'_, '_>, scheme: &str) -> String {
    el.get_attribute("href")
        .and_then(|href| href.strip_prefix(scheme).map(|rest| rest.replace("%20", " ")))
        .unwrap_or_default()
}

fn add_class(
    el: &mut Element<'_, '_>,
    class: &str,
) -> Result<(), lol_html::errors::AttributeNameError> {
    let existing = el.get_attribute("class").unwrap_or_default();
    if existing.split_whitespace().any(|c| c == class) {
        return Ok(());
    }
    let merged = if existing.trim().is_empty() {
        class.to_string()
    } else {
        format!("{} {}", existing.trim(), class)
    };
    el.set_attribute("class", &merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_links_get_class_and_slug() {
        let html = decorate_links(
            r#"<p>En <a href="concept:policy" title="Policy">Policy</a>.</p>"#,
        )
        .unwrap();
        assert_eq!(
            html,
            r#"<p>En <a href="concept:policy" title="Policy" class="concept-link" data-concept="policy">Policy</a>.</p>"#
        );
    }

    #[test]
    fn principle_and_cross_reference_links() {
        let html = decorate_links(
            r##"<a href="principle:GOV-1">Ägarskap</a> <a class="x" href="#roller">Roller</a>"##,
        )
        .unwrap();
        assert!(html.contains(r#"class="principle-link" data-principle="GOV-1""#), "{html}");
        assert!(html.contains(r##"<a class="x cross-reference" href="#roller">"##), "{html}");
    }

    #[test]
    fn other_links_are_untouched() {
        let input = r#"<a href="https://example.se">x</a><a name="top"></a>"#;
        assert_eq!(decorate_links(input).unwrap(), input);
    }

    #[test]
    fn decoration_is_idempotent() {
        let once = decorate_links(r#"<a href="concept:risk">risk</a>"#).unwrap();
        let twice = decorate_links(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn encoded_spaces_in_slugs() {
        let html = decorate_links(r#"<a href="concept:oppna%20data">x</a>"#).unwrap();
        assert!(html.contains(r#"data-concept="oppna data""#), "{html}");
    }
}
