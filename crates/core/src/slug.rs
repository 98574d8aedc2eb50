//! Anchor slug normalization.
//!
//! The same [`normalize`] call produces heading ids and cross-reference
//! targets, so a `[[Some Heading]]` link always lands on `# Some Heading`.

/// Letters folded to their ASCII base after lower-casing.
const LOCALE_FOLDS: &[(char, char)] = &[
    ('å', 'a'),
    ('ä', 'a'),
    ('à', 'a'),
    ('á', 'a'),
    ('ö', 'o'),
    ('ó', 'o'),
    ('ø', 'o'),
    ('é', 'e'),
    ('è', 'e'),
    ('ë', 'e'),
    ('ü', 'u'),
    ('í', 'i'),
];

fn fold_letter(ch: char) -> char {
    LOCALE_FOLDS
        .iter()
        .find(|(from, _)| *from == ch)
        .map(|(_, to)| *to)
        .unwrap_or(ch)
}

/// Normalize free text into a URL-safe anchor fragment.
///
/// 1. Lowercase
/// 2. Fold locale letters (`å`, `ä`, `ö`, ...) to ASCII
/// 3. Drop everything outside `[a-z0-9]`, whitespace and `-`
/// 4. Whitespace runs become one hyphen, hyphen runs collapse
/// 5. Leading and trailing hyphens are trimmed
///
/// No uniqueness enforcement and no length cap. Text with no usable
/// characters yields an empty slug.
///
/// # Examples
///
/// ```
/// use heraf_core::slug::normalize;
///
/// assert_eq!(normalize("Ägarskap och Ansvar"), "agarskap-och-ansvar");
/// assert_eq!(normalize("  Steg 2: Översyn!  "), "steg-2-oversyn");
/// ```
pub fn normalize(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.chars().flat_map(char::to_lowercase).map(fold_letter) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else if ch == '-' || ch.is_whitespace() {
            pending_hyphen = true;
        }
        // Punctuation, emoji and unfolded letters are dropped without
        // breaking the surrounding word.
    }

    slug
}
