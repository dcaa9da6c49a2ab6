//! Manual maintenance of `article_versions.search_vector`.
//!
//! The triggers keep the index current on every write. These methods
//! rebuild it on demand with the same weighted expression.

use mibeko_core::search::{article_tag_names_sql, search_document_sql};
use mibeko_core::types::DbId;
use sqlx::PgPool;

/// Provides search-index rebuilds.
pub struct SearchIndexRepo;

impl SearchIndexRepo {
    /// Recompute the search vector of every version of one article.
    ///
    /// Returns the number of versions updated.
    pub async fn reindex_article(pool: &PgPool, article_id: DbId) -> Result<u64, sqlx::Error> {
        let query = format!(
            "UPDATE article_versions v SET search_vector = {} WHERE v.article_id = $1",
            Self::document_expr()
        );
        let result = sqlx::query(&query).bind(article_id).execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Recompute the search vector of every version of every article.
    pub async fn reindex_all(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let query = format!(
            "UPDATE article_versions v SET search_vector = {}",
            Self::document_expr()
        );
        let result = sqlx::query(&query).execute(pool).await?;
        tracing::info!(versions = result.rows_affected(), "Search index rebuilt");
        Ok(result.rows_affected())
    }

    /// Whether the stored vector of a version equals a fresh computation.
    pub async fn is_current(pool: &PgPool, version_id: DbId) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT v.search_vector = {} FROM article_versions v WHERE v.id = $1",
            Self::document_expr()
        );
        sqlx::query_scalar(&query).bind(version_id).fetch_one(pool).await
    }

    fn document_expr() -> String {
        search_document_sql("v.content", &article_tag_names_sql("v.article_id"))
    }
}
