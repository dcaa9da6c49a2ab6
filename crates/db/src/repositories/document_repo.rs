//! Repository for the `documents` table.

use mibeko_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::document::{CreateDocument, Document, DocumentListParams, UpdateDocument};

/// Column list shared across queries.
const COLUMNS: &str = "id, title, slug, document_type, reference_number, publication_date, \
    source_url, status, deleted_at, created_at, updated_at";

/// Default page size for document listing.
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for document listing.
const MAX_LIMIT: i64 = 200;

/// Provides CRUD operations for documents.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Insert a new document. `slug` has already been resolved and validated.
    ///
    /// `status` defaults to `draft`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDocument,
        slug: &str,
    ) -> Result<Document, sqlx::Error> {
        let query = format!(
            "INSERT INTO documents
                (title, slug, document_type, reference_number, publication_date, source_url, status)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'draft'))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(input.title.trim())
            .bind(slug)
            .bind(&input.document_type)
            .bind(&input.reference_number)
            .bind(input.publication_date)
            .bind(&input.source_url)
            .bind(&input.status)
            .fetch_one(pool)
            .await
    }

    /// Find a live document by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List live documents, newest first, optionally filtered by status and type.
    pub async fn list(
        pool: &PgPool,
        params: &DocumentListParams,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = format!(
            "SELECT {COLUMNS} FROM documents
             WHERE deleted_at IS NULL
               AND ($1::TEXT IS NULL OR status = $1)
               AND ($2::TEXT IS NULL OR document_type = $2)
             ORDER BY publication_date DESC NULLS LAST, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(&params.status)
            .bind(&params.document_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a document. Only non-`None` fields in `input` are applied;
    /// `Some(None)` clears a nullable column.
    ///
    /// `slug` is the already validated replacement slug, if any. Returns
    /// `None` if the document does not exist or is soft-deleted.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDocument,
        slug: Option<&str>,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!(
            "UPDATE documents SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                document_type = COALESCE($4, document_type),
                reference_number = CASE WHEN $5 THEN $6 ELSE reference_number END,
                publication_date = CASE WHEN $7 THEN $8 ELSE publication_date END,
                source_url = CASE WHEN $9 THEN $10 ELSE source_url END,
                status = COALESCE($11, status)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(slug)
            .bind(&input.document_type)
            .bind(input.reference_number.is_some())
            .bind(input.reference_number.clone().flatten())
            .bind(input.publication_date.is_some())
            .bind(input.publication_date.flatten())
            .bind(input.source_url.is_some())
            .bind(input.source_url.clone().flatten())
            .bind(&input.status)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a document. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE documents SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Restore a soft-deleted document. Returns the restored row, or `None`
    /// if no deleted document with this ID exists.
    ///
    /// The document's nodes, live articles and their versions are touched in
    /// the same transaction: sync clients dropped them on the tombstone and
    /// must receive them again.
    pub async fn restore(pool: &PgPool, id: DbId) -> Result<Option<Document>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE documents SET deleted_at = NULL
             WHERE id = $1 AND deleted_at IS NOT NULL
             RETURNING {COLUMNS}"
        );
        let Some(document) = sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query("UPDATE structure_nodes SET updated_at = NOW() WHERE document_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE articles SET updated_at = NOW() WHERE document_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE article_versions v SET updated_at = NOW()
             FROM articles a
             WHERE a.id = v.article_id AND a.document_id = $1 AND a.deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(document))
    }

    /// Lock a live document row for the rest of the transaction.
    ///
    /// Returns `false` if the document does not exist or is soft-deleted.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM documents WHERE id = $1 AND deleted_at IS NULL FOR UPDATE")
                .bind(id)
                .fetch_optional(conn)
                .await?;
        Ok(row.is_some())
    }

    /// Bump `updated_at` so sync clients refetch the document.
    pub async fn touch(conn: &mut PgConnection, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE documents SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
