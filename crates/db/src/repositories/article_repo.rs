//! Repository for the `articles` table.

use mibeko_core::error::CoreError;
use mibeko_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::error::RepoResult;
use crate::models::article::{Article, UpdateArticle};
use crate::models::article_version::{ArticleVersion, NewArticleVersion};
use crate::repositories::{ArticleVersionRepo, DocumentRepo, StructureNodeRepo};

/// Column list shared across queries.
const COLUMNS: &str =
    "id, document_id, structure_node_id, number, sort_order, deleted_at, created_at, updated_at";

/// Predicate on `articles`: the owning document is not soft-deleted.
pub(crate) const IN_LIVE_DOCUMENT: &str =
    "EXISTS (SELECT 1 FROM documents d WHERE d.id = articles.document_id AND d.deleted_at IS NULL)";

/// Values for creating an article with its first version. `number` is
/// already normalized.
#[derive(Debug, Clone)]
pub struct NewArticle<'a> {
    pub number: &'a str,
    pub structure_node_id: Option<DbId>,
    pub sort_order: Option<i32>,
    pub content: &'a str,
    pub valid_from: Timestamp,
    pub amending_document_id: Option<DbId>,
}

/// Provides CRUD operations for articles.
pub struct ArticleRepo;

impl ArticleRepo {
    /// Create an article together with its first (open) version.
    pub async fn create(
        pool: &PgPool,
        document_id: DbId,
        input: &NewArticle<'_>,
    ) -> RepoResult<(Article, ArticleVersion)> {
        let mut tx = pool.begin().await?;

        if !DocumentRepo::lock(&mut *tx, document_id).await? {
            return Err(CoreError::NotFound {
                entity: "Document",
                id: document_id,
            }
            .into());
        }
        if let Some(node_id) = input.structure_node_id {
            StructureNodeRepo::find_in_document(&mut *tx, document_id, node_id).await?;
        }

        let query = format!(
            "INSERT INTO articles (document_id, structure_node_id, number, sort_order)
             VALUES ($1, $2, $3, COALESCE($4, (
                 SELECT COALESCE(MAX(sort_order) + 1, 0) FROM articles
                 WHERE document_id = $1 AND structure_node_id IS NOT DISTINCT FROM $2
             )))
             RETURNING {COLUMNS}"
        );
        let article = sqlx::query_as::<_, Article>(&query)
            .bind(document_id)
            .bind(input.structure_node_id)
            .bind(input.number)
            .bind(input.sort_order)
            .fetch_one(&mut *tx)
            .await?;

        let version = ArticleVersionRepo::insert(
            &mut *tx,
            article.id,
            &NewArticleVersion {
                content: input.content,
                valid_from: input.valid_from,
                amending_document_id: input.amending_document_id,
            },
        )
        .await?;

        tx.commit().await?;
        Ok((article, version))
    }

    /// Find a live article of a live document by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Article>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM articles
             WHERE id = $1 AND deleted_at IS NULL AND {IN_LIVE_DOCUMENT}"
        );
        sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the live articles of a document by sort order.
    pub async fn list_by_document(
        pool: &PgPool,
        document_id: DbId,
    ) -> Result<Vec<Article>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM articles
             WHERE document_id = $1 AND deleted_at IS NULL
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, Article>(&query)
            .bind(document_id)
            .fetch_all(pool)
            .await
    }

    /// List the live articles attached directly to a node.
    pub async fn list_by_node(pool: &PgPool, node_id: DbId) -> Result<Vec<Article>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM articles
             WHERE structure_node_id = $1 AND deleted_at IS NULL
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, Article>(&query)
            .bind(node_id)
            .fetch_all(pool)
            .await
    }

    /// Update article metadata. `number` is already normalized.
    ///
    /// A new node must belong to the article's document. Returns `None` if
    /// the article does not exist or is soft-deleted.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        number: Option<&str>,
        input: &UpdateArticle,
    ) -> RepoResult<Option<Article>> {
        let mut tx = pool.begin().await?;

        let Some(existing) = Self::find_for_update(&mut *tx, id).await? else {
            return Ok(None);
        };
        if let Some(Some(node_id)) = input.structure_node_id {
            StructureNodeRepo::find_in_document(&mut *tx, existing.document_id, node_id).await?;
        }

        let query = format!(
            "UPDATE articles SET
                number = COALESCE($2, number),
                structure_node_id = CASE WHEN $3 THEN $4 ELSE structure_node_id END,
                sort_order = COALESCE($5, sort_order)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let article = sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .bind(number)
            .bind(input.structure_node_id.is_some())
            .bind(input.structure_node_id.flatten())
            .bind(input.sort_order)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(article))
    }

    /// Soft-delete an article. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE articles SET deleted_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL AND {IN_LIVE_DOCUMENT}"
        );
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Article>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM articles
             WHERE id = $1 AND deleted_at IS NULL AND {IN_LIVE_DOCUMENT}
             FOR UPDATE"
        );
        sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }
}
