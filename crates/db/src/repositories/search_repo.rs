//! Full-text and semantic search over article versions.
//!
//! Queries arrive already sanitized into tsquery syntax (see
//! `mibeko_core::search::build_tsquery`) or as pgvector literals.

use mibeko_core::search::TEXT_SEARCH_CONFIG;
use mibeko_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::search::{SearchResultRow, SemanticResultRow, TypeaheadResult};

/// `ts_headline` options for result snippets.
const HEADLINE_OPTIONS: &str = "MaxWords=35, MinWords=15, MaxFragments=2, StartSel=<mark>, StopSel=</mark>";

/// Provides search queries.
pub struct SearchRepo;

impl SearchRepo {
    /// Ranked full-text search.
    ///
    /// Without `at`, searches current versions. With `at`, searches the
    /// version of each article in force at that instant.
    pub async fn fulltext(
        pool: &PgPool,
        tsquery: &str,
        document_id: Option<DbId>,
        at: Option<Timestamp>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SearchResultRow>, sqlx::Error> {
        let query = format!(
            "SELECT a.id AS article_id, v.id AS version_id, d.id AS document_id,
                    d.title AS document_title, a.number AS article_number,
                    v.valid_from, v.valid_until,
                    ts_rank(v.search_vector, q) AS rank,
                    ts_headline('{TEXT_SEARCH_CONFIG}', v.content, q, '{HEADLINE_OPTIONS}') AS headline
             FROM article_versions v
             JOIN articles a ON a.id = v.article_id
             JOIN documents d ON d.id = a.document_id
             CROSS JOIN to_tsquery('{TEXT_SEARCH_CONFIG}', $1) AS q
             WHERE v.search_vector @@ q
               AND a.deleted_at IS NULL
               AND d.deleted_at IS NULL
               AND ($2::BIGINT IS NULL OR d.id = $2)
               AND CASE WHEN $3::TIMESTAMPTZ IS NULL THEN v.valid_until IS NULL
                        ELSE v.valid_from <= $3 AND (v.valid_until IS NULL OR v.valid_until > $3)
                   END
             ORDER BY rank DESC, v.id
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, SearchResultRow>(&query)
            .bind(tsquery)
            .bind(document_id)
            .bind(at)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Typeahead over current versions with a prefix tsquery.
    pub async fn typeahead(
        pool: &PgPool,
        prefix_tsquery: &str,
        limit: i64,
    ) -> Result<Vec<TypeaheadResult>, sqlx::Error> {
        let query = format!(
            "SELECT a.id AS article_id, d.id AS document_id, d.title AS document_title,
                    a.number AS article_number, ts_rank(v.search_vector, q) AS rank
             FROM article_versions v
             JOIN articles a ON a.id = v.article_id
             JOIN documents d ON d.id = a.document_id
             CROSS JOIN to_tsquery('{TEXT_SEARCH_CONFIG}', $1) AS q
             WHERE v.search_vector @@ q
               AND v.valid_until IS NULL
               AND a.deleted_at IS NULL
               AND d.deleted_at IS NULL
             ORDER BY rank DESC, a.id
             LIMIT $2"
        );
        sqlx::query_as::<_, TypeaheadResult>(&query)
            .bind(prefix_tsquery)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Nearest current versions by cosine distance to `vector_literal`.
    pub async fn semantic(
        pool: &PgPool,
        vector_literal: &str,
        document_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<SemanticResultRow>, sqlx::Error> {
        sqlx::query_as::<_, SemanticResultRow>(
            "SELECT a.id AS article_id, v.id AS version_id, d.id AS document_id,
                    d.title AS document_title, a.number AS article_number, v.content,
                    1 - (v.embedding <=> $1::vector) AS similarity
             FROM article_versions v
             JOIN articles a ON a.id = v.article_id
             JOIN documents d ON d.id = a.document_id
             WHERE v.embedding IS NOT NULL
               AND v.valid_until IS NULL
               AND a.deleted_at IS NULL
               AND d.deleted_at IS NULL
               AND ($2::BIGINT IS NULL OR d.id = $2)
             ORDER BY v.embedding <=> $1::vector
             LIMIT $3",
        )
        .bind(vector_literal)
        .bind(document_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
