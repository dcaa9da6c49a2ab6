//! Polymorphic tagging rules.

use crate::error::CoreError;
use crate::slug::slugify;

/// Taggable type for articles.
pub const TAGGABLE_ARTICLE: &str = "article";

/// Taggable type for documents.
pub const TAGGABLE_DOCUMENT: &str = "document";

/// All entity types that accept tags.
pub const TAGGABLE_TYPES: &[&str] = &[TAGGABLE_ARTICLE, TAGGABLE_DOCUMENT];

/// Maximum tag name length in characters.
pub const MAX_TAG_NAME_LEN: usize = 100;

/// Maximum number of tags in a single apply/replace request.
pub const MAX_TAGS_PER_REQUEST: usize = 50;

/// Validate a taggable entity type.
pub fn validate_taggable_type(entity_type: &str) -> Result<(), CoreError> {
    if !TAGGABLE_TYPES.contains(&entity_type) {
        return Err(CoreError::Validation(format!(
            "Invalid entity type '{entity_type}'. Valid types: {}",
            TAGGABLE_TYPES.join(", ")
        )));
    }
    Ok(())
}

/// Normalize a tag name for display: trim and collapse inner whitespace.
pub fn normalize_tag_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validate a tag name and return `(display_name, slug)`.
pub fn prepare_tag(name: &str) -> Result<(String, String), CoreError> {
    let display = normalize_tag_name(name);
    if display.is_empty() {
        return Err(CoreError::Validation("Tag name must not be empty".into()));
    }
    if display.chars().count() > MAX_TAG_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Tag name must be at most {MAX_TAG_NAME_LEN} characters"
        )));
    }
    let slug = slugify(&display);
    if slug.is_empty() {
        return Err(CoreError::Validation(format!(
            "Tag name '{display}' has no alphanumeric characters"
        )));
    }
    Ok((display, slug))
}

/// Validate the tag list of an apply/replace request.
pub fn validate_tag_names(names: &[String]) -> Result<(), CoreError> {
    if names.len() > MAX_TAGS_PER_REQUEST {
        return Err(CoreError::Validation(format!(
            "At most {MAX_TAGS_PER_REQUEST} tags may be sent at once"
        )));
    }
    for name in names {
        prepare_tag(name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn taggable_types() {
        assert!(validate_taggable_type("article").is_ok());
        assert!(validate_taggable_type("document").is_ok());
        assert_matches!(validate_taggable_type("node"), Err(CoreError::Validation(_)));
        assert!(validate_taggable_type("Article").is_err());
    }

    #[test]
    fn prepare_tag_normalizes() {
        let (display, slug) = prepare_tag("  Droit   de la Famille ").unwrap();
        assert_eq!(display, "Droit de la Famille");
        assert_eq!(slug, "droit-de-la-famille");
    }

    #[test]
    fn prepare_tag_folds_accents_in_slug() {
        let (_, slug) = prepare_tag("Propriété foncière").unwrap();
        assert_eq!(slug, "propriete-fonciere");
    }

    #[test]
    fn prepare_tag_rejects_blank_and_symbols() {
        assert!(prepare_tag("   ").is_err());
        assert!(prepare_tag("§§").is_err());
    }

    #[test]
    fn prepare_tag_rejects_overlong() {
        assert!(prepare_tag(&"x".repeat(MAX_TAG_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn too_many_tags_rejected() {
        let names: Vec<String> = (0..=MAX_TAGS_PER_REQUEST).map(|i| format!("t{i}")).collect();
        assert!(validate_tag_names(&names).is_err());
        assert!(validate_tag_names(&names[..MAX_TAGS_PER_REQUEST]).is_ok());
    }
}
