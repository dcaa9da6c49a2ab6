//! Full-text search constants and helpers.
//!
//! The weighted search document of an article version is
//! `setweight(to_tsvector(cfg, content), 'A') || setweight(to_tsvector(cfg,
//! tag names), 'B')`. The database trigger in the initial migration and the
//! manual reindex path in the repository layer must build the same
//! expression; [`search_document_sql`] is the single Rust rendering of it.

// ---------------------------------------------------------------------------
// Relevance weights
// ---------------------------------------------------------------------------

/// tsvector weight for the article's own wording.
pub const WEIGHT_CONTENT: char = 'A';

/// tsvector weight for the names of the tags attached to the article.
pub const WEIGHT_TAGS: char = 'B';

/// PostgreSQL text-search configuration used for stemming.
pub const TEXT_SEARCH_CONFIG: &str = "french";

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of search results per page.
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Maximum number of search results per page.
pub const MAX_SEARCH_LIMIT: i64 = 100;

/// Default number of typeahead suggestions.
pub const DEFAULT_TYPEAHEAD_LIMIT: i64 = 10;

/// Maximum number of typeahead suggestions.
pub const MAX_TYPEAHEAD_LIMIT: i64 = 25;

/// Default number of semantic search results.
pub const DEFAULT_SEMANTIC_LIMIT: i64 = 10;

/// Maximum number of semantic search results.
pub const MAX_SEMANTIC_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Search document
// ---------------------------------------------------------------------------

/// Render the weighted search-document expression.
///
/// `content_expr` and `tags_expr` are SQL expressions evaluating to text
/// (column references or sub-selects), never user input.
pub fn search_document_sql(content_expr: &str, tags_expr: &str) -> String {
    format!(
        "setweight(to_tsvector('{TEXT_SEARCH_CONFIG}', COALESCE({content_expr}, '')), '{WEIGHT_CONTENT}') || \
         setweight(to_tsvector('{TEXT_SEARCH_CONFIG}', COALESCE({tags_expr}, '')), '{WEIGHT_TAGS}')"
    )
}

/// SQL sub-select producing the space-joined tag names of article `article_id_expr`.
pub fn article_tag_names_sql(article_id_expr: &str) -> String {
    format!(
        "(SELECT string_agg(t.name, ' ' ORDER BY t.name) \
           FROM taggables tg JOIN tags t ON t.id = tg.tag_id \
          WHERE tg.taggable_type = 'article' AND tg.taggable_id = {article_id_expr})"
    )
}

// ---------------------------------------------------------------------------
// Query builder helpers
// ---------------------------------------------------------------------------

/// Sanitize user input into a list of terms suitable for tsquery construction.
///
/// Splits on whitespace, strips characters other than alphanumerics and `_`
/// from each term's edges (apostrophes inside words like `l'État` split the
/// word), and drops empty terms.
fn sanitize_terms(query: &str) -> Option<Vec<String>> {
    let terms: Vec<String> = query
        .split(|c: char| c.is_whitespace() || c == '\'' || c == '’')
        .map(|t| {
            t.chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|t| !t.is_empty())
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms)
    }
}

/// Sanitize and convert user input into a PostgreSQL `tsquery` string.
///
/// Terms are joined with `&` (AND). Returns `None` when nothing usable
/// remains.
///
/// ```
/// use mibeko_core::search::build_tsquery;
/// assert_eq!(build_tsquery("liberté presse"), Some("liberté & presse".to_string()));
/// assert_eq!(build_tsquery("  "), None);
/// ```
pub fn build_tsquery(query: &str) -> Option<String> {
    sanitize_terms(query).map(|terms| terms.join(" & "))
}

/// Build a prefix tsquery for typeahead: the last term gets `:*`.
///
/// ```
/// use mibeko_core::search::build_prefix_tsquery;
/// assert_eq!(build_prefix_tsquery("mari"), Some("mari:*".to_string()));
/// assert_eq!(build_prefix_tsquery("droit succ"), Some("droit & succ:*".to_string()));
/// ```
pub fn build_prefix_tsquery(query: &str) -> Option<String> {
    let terms = sanitize_terms(query)?;
    let (last, exact) = terms.split_last()?;

    if exact.is_empty() {
        return Some(format!("{last}:*"));
    }
    Some(format!("{} & {last}:*", exact.join(" & ")))
}

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- search document ----------------------------------------------------

    #[test]
    fn search_document_uses_content_a_tags_b() {
        let sql = search_document_sql("v.content", "NULL");
        assert_eq!(
            sql,
            "setweight(to_tsvector('french', COALESCE(v.content, '')), 'A') || \
             setweight(to_tsvector('french', COALESCE(NULL, '')), 'B')"
        );
    }

    #[test]
    fn tag_names_subselect_filters_articles() {
        let sql = article_tag_names_sql("NEW.article_id");
        assert!(sql.contains("taggable_type = 'article'"));
        assert!(sql.contains("taggable_id = NEW.article_id"));
        assert!(sql.contains("ORDER BY t.name"));
    }

    // -- build_tsquery ------------------------------------------------------

    #[test]
    fn tsquery_single_term() {
        assert_eq!(build_tsquery("mariage"), Some("mariage".to_string()));
    }

    #[test]
    fn tsquery_multiple_terms_joined_with_and() {
        assert_eq!(
            build_tsquery("droit foncier"),
            Some("droit & foncier".to_string())
        );
    }

    #[test]
    fn tsquery_strips_operators() {
        assert_eq!(
            build_tsquery("peine! & (prison) | amende:*"),
            Some("peine & prison & amende".to_string())
        );
    }

    #[test]
    fn tsquery_splits_elided_articles() {
        assert_eq!(
            build_tsquery("l'État d’urgence"),
            Some("l & État & d & urgence".to_string())
        );
    }

    #[test]
    fn tsquery_empty_returns_none() {
        assert_eq!(build_tsquery(""), None);
        assert_eq!(build_tsquery("  !! "), None);
    }

    // -- build_prefix_tsquery -----------------------------------------------

    #[test]
    fn prefix_single_term() {
        assert_eq!(build_prefix_tsquery("hérit"), Some("hérit:*".to_string()));
    }

    #[test]
    fn prefix_three_terms() {
        assert_eq!(
            build_prefix_tsquery("code du trav"),
            Some("code & du & trav:*".to_string())
        );
    }

    #[test]
    fn prefix_empty_returns_none() {
        assert_eq!(build_prefix_tsquery(""), None);
    }

    // -- clamp --------------------------------------------------------------

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(None, 20, 100), 20);
        assert_eq!(clamp_limit(Some(200), 20, 100), 100);
        assert_eq!(clamp_limit(Some(0), 20, 100), 1);
        assert_eq!(clamp_limit(Some(50), 20, 100), 50);
    }

    #[test]
    fn clamp_offset_bounds() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(-10)), 0);
        assert_eq!(clamp_offset(Some(40)), 40);
    }
}
