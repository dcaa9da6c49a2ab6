//! URL-safe slug generation shared by documents and tags.
//!
//! Legal texts are mostly in French, so accented Latin letters are folded to
//! their ASCII base before the non-alphanumeric run collapsing.

/// Fold a single character to its ASCII equivalent.
///
/// Returns `None` for characters that have no sensible ASCII form; those are
/// treated as separators by [`slugify`].
fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'œ' => "oe",
        'æ' => "ae",
        _ => return None,
    };
    Some(folded)
}

/// Generate a URL-safe slug.
///
/// Lowercases, folds accents, replaces every other non-alphanumeric run
/// with a single hyphen, and trims leading/trailing hyphens.
pub fn slugify(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut prev_hyphen = true;

    for c in input.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if let Some(folded) = fold_char(c) {
            result.push_str(folded);
            prev_hyphen = false;
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }
    result
}

/// Whether `slug` only contains lowercase ASCII alphanumerics and single
/// interior hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
