//! Repository for the `article_versions` table.
//!
//! Writes that touch more than one version lock the article row first
//! (`SELECT ... FOR UPDATE`), so concurrent edits of one article are
//! serialized. The partial unique index and the exclusion constraint stay
//! the final word on the history invariants.

use mibeko_core::error::CoreError;
use mibeko_core::hashing::content_hash;
use mibeko_core::types::{DbId, Timestamp};
use mibeko_core::versioning::{self, EditMode, ValidityPeriod, Versioned};
use sqlx::{PgConnection, PgPool};

use crate::error::RepoResult;
use crate::repositories::article_repo::IN_LIVE_DOCUMENT;
use crate::models::article_version::{
    ArticleVersion, NewArticleVersion, SaveOutcome, VersionEmbeddingSource,
};

/// Column list shared across queries. `embedding` and `search_vector` are
/// never selected.
const COLUMNS: &str = "id, article_id, content, content_hash, valid_from, valid_until, \
    amending_document_id, embedding_model, embedded_at, created_at, updated_at";

/// Provides history and resolver operations for article versions.
pub struct ArticleVersionRepo;

impl ArticleVersionRepo {
    // ── Reads ────────────────────────────────────────────────────────

    /// Find one version of an article.
    pub async fn find_by_id(
        pool: &PgPool,
        article_id: DbId,
        version_id: DbId,
    ) -> Result<Option<ArticleVersion>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM article_versions WHERE id = $1 AND article_id = $2");
        sqlx::query_as::<_, ArticleVersion>(&query)
            .bind(version_id)
            .bind(article_id)
            .fetch_optional(pool)
            .await
    }

    /// Full history of an article, newest first.
    pub async fn list_by_article(
        pool: &PgPool,
        article_id: DbId,
    ) -> Result<Vec<ArticleVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM article_versions
             WHERE article_id = $1
             ORDER BY valid_from DESC"
        );
        sqlx::query_as::<_, ArticleVersion>(&query)
            .bind(article_id)
            .fetch_all(pool)
            .await
    }

    /// The open (current) version of an article, if any.
    pub async fn find_current(
        pool: &PgPool,
        article_id: DbId,
    ) -> Result<Option<ArticleVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM article_versions
             WHERE article_id = $1 AND valid_until IS NULL"
        );
        sqlx::query_as::<_, ArticleVersion>(&query)
            .bind(article_id)
            .fetch_optional(pool)
            .await
    }

    /// Resolve the version in force at `at`.
    ///
    /// Ordered by `valid_from DESC` so that, should intervals ever overlap,
    /// the latest-starting version wins.
    pub async fn find_active_at(
        pool: &PgPool,
        article_id: DbId,
        at: Timestamp,
    ) -> Result<Option<ArticleVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM article_versions
             WHERE article_id = $1
               AND valid_from <= $2
               AND (valid_until IS NULL OR valid_until > $2)
             ORDER BY valid_from DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, ArticleVersion>(&query)
            .bind(article_id)
            .bind(at)
            .fetch_optional(pool)
            .await
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Insert a version row. The content hash is computed here.
    pub async fn insert(
        conn: &mut PgConnection,
        article_id: DbId,
        new: &NewArticleVersion<'_>,
    ) -> Result<ArticleVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO article_versions
                (article_id, content, content_hash, valid_from, amending_document_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ArticleVersion>(&query)
            .bind(article_id)
            .bind(new.content)
            .bind(content_hash(new.content))
            .bind(new.valid_from)
            .bind(new.amending_document_id)
            .fetch_one(conn)
            .await
    }

    /// Save new content for an article.
    ///
    /// - [`EditMode::NewVersion`] closes the current version at
    ///   `effective_from` and opens a new one from that instant. Identical
    ///   content is rejected.
    /// - [`EditMode::InPlace`] rewrites the open version. Identical content
    ///   is a no-op (`changed: false`). Rewriting clears the stored
    ///   embedding.
    pub async fn save_content(
        pool: &PgPool,
        article_id: DbId,
        content: &str,
        mode: EditMode,
        effective_from: Timestamp,
        amending_document_id: Option<DbId>,
    ) -> RepoResult<SaveOutcome> {
        let mut tx = pool.begin().await?;

        Self::lock_article(&mut *tx, article_id).await?;
        let history = Self::history(&mut *tx, article_id).await?;
        let current = versioning::find_open(&history);
        let hash = content_hash(content);

        let outcome = match mode {
            EditMode::InPlace => {
                let current = current.ok_or_else(|| {
                    CoreError::Conflict(format!(
                        "Article {article_id} has no current version to edit in place"
                    ))
                })?;
                versioning::ensure_editable_in_place(&current.validity())?;

                if current.content_hash == hash {
                    SaveOutcome {
                        version: current.clone(),
                        changed: false,
                    }
                } else {
                    let query = format!(
                        "UPDATE article_versions SET
                            content = $2,
                            content_hash = $3,
                            amending_document_id = COALESCE($4, amending_document_id),
                            embedding = NULL,
                            embedding_model = NULL,
                            embedded_at = NULL
                         WHERE id = $1
                         RETURNING {COLUMNS}"
                    );
                    let version = sqlx::query_as::<_, ArticleVersion>(&query)
                        .bind(current.id)
                        .bind(content)
                        .bind(&hash)
                        .bind(amending_document_id)
                        .fetch_one(&mut *tx)
                        .await?;
                    SaveOutcome {
                        version,
                        changed: true,
                    }
                }
            }
            EditMode::NewVersion => {
                if current.is_some_and(|c| c.content_hash == hash) {
                    return Err(CoreError::Validation(
                        "content unchanged: the current version already has this text".into(),
                    )
                    .into());
                }

                let periods: Vec<ValidityPeriod> = history.iter().map(Versioned::validity).collect();
                let plan = versioning::plan_new_version(&periods, effective_from)?;

                if let (Some(close_at), Some(current)) = (plan.close_current_at, current) {
                    Self::close(&mut *tx, current.id, close_at).await?;
                }

                let version = Self::insert(
                    &mut *tx,
                    article_id,
                    &NewArticleVersion {
                        content,
                        valid_from: plan.new_period.valid_from,
                        amending_document_id,
                    },
                )
                .await?;
                SaveOutcome {
                    version,
                    changed: true,
                }
            }
        };

        tx.commit().await?;

        tracing::info!(
            article_id,
            version_id = outcome.version.id,
            ?mode,
            changed = outcome.changed,
            "Article content saved"
        );
        Ok(outcome)
    }

    /// Close the open version of an article at `at` without opening a new one.
    pub async fn repeal(pool: &PgPool, article_id: DbId, at: Timestamp) -> RepoResult<ArticleVersion> {
        let mut tx = pool.begin().await?;

        Self::lock_article(&mut *tx, article_id).await?;
        let history = Self::history(&mut *tx, article_id).await?;
        let current = versioning::find_open(&history).ok_or_else(|| {
            CoreError::Conflict(format!("Article {article_id} has no version in force"))
        })?;
        versioning::plan_close(&current.validity(), at)?;

        let closed = Self::close(&mut *tx, current.id, at).await?;
        tx.commit().await?;

        tracing::info!(article_id, version_id = closed.id, %at, "Article repealed");
        Ok(closed)
    }

    // ── Embeddings ───────────────────────────────────────────────────

    /// Text needed to embed one version, joined with its article and document.
    pub async fn embedding_source(
        pool: &PgPool,
        version_id: DbId,
    ) -> Result<Option<VersionEmbeddingSource>, sqlx::Error> {
        sqlx::query_as::<_, VersionEmbeddingSource>(
            "SELECT v.id AS version_id, v.content, v.content_hash,
                    a.number AS article_number, d.title AS document_title
             FROM article_versions v
             JOIN articles a ON a.id = v.article_id
             JOIN documents d ON d.id = a.document_id
             WHERE v.id = $1",
        )
        .bind(version_id)
        .fetch_optional(pool)
        .await
    }

    /// Versions of live articles that have no embedding yet, with an id
    /// above `after_id`, oldest id first.
    ///
    /// Only current versions unless `include_history` is set.
    pub async fn list_missing_embeddings(
        pool: &PgPool,
        after_id: DbId,
        limit: i64,
        include_history: bool,
    ) -> Result<Vec<VersionEmbeddingSource>, sqlx::Error> {
        sqlx::query_as::<_, VersionEmbeddingSource>(
            "SELECT v.id AS version_id, v.content, v.content_hash,
                    a.number AS article_number, d.title AS document_title
             FROM article_versions v
             JOIN articles a ON a.id = v.article_id
             JOIN documents d ON d.id = a.document_id
             WHERE v.embedding IS NULL
               AND v.id > $1
               AND a.deleted_at IS NULL
               AND d.deleted_at IS NULL
               AND ($3 OR v.valid_until IS NULL)
             ORDER BY v.id
             LIMIT $2",
        )
        .bind(after_id)
        .bind(limit)
        .bind(include_history)
        .fetch_all(pool)
        .await
    }

    /// Store an embedding given as a pgvector literal.
    ///
    /// Matches on `content_hash` so an embedding computed from stale text is
    /// dropped. Returns `true` if the row was updated.
    pub async fn store_embedding(
        pool: &PgPool,
        version_id: DbId,
        expected_hash: &str,
        vector_literal: &str,
        model: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE article_versions
             SET embedding = $3::vector, embedding_model = $4, embedded_at = NOW()
             WHERE id = $1 AND content_hash = $2",
        )
        .bind(version_id)
        .bind(expected_hash)
        .bind(vector_literal)
        .bind(model)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// Lock a live article row of a live document for the rest of the
    /// transaction.
    async fn lock_article(conn: &mut PgConnection, article_id: DbId) -> RepoResult<()> {
        let query = format!(
            "SELECT id FROM articles
             WHERE id = $1 AND deleted_at IS NULL AND {IN_LIVE_DOCUMENT}
             FOR UPDATE"
        );
        let row: Option<(DbId,)> = sqlx::query_as(&query)
            .bind(article_id)
            .fetch_optional(conn)
            .await?;

        row.map(|_| ()).ok_or_else(|| {
            CoreError::NotFound {
                entity: "Article",
                id: article_id,
            }
            .into()
        })
    }

    /// Every version of an article, oldest first.
    async fn history(
        conn: &mut PgConnection,
        article_id: DbId,
    ) -> Result<Vec<ArticleVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM article_versions WHERE article_id = $1 ORDER BY valid_from"
        );
        sqlx::query_as::<_, ArticleVersion>(&query)
            .bind(article_id)
            .fetch_all(conn)
            .await
    }

    /// Set the upper bound of a version.
    async fn close(
        conn: &mut PgConnection,
        version_id: DbId,
        at: Timestamp,
    ) -> Result<ArticleVersion, sqlx::Error> {
        let query = format!(
            "UPDATE article_versions SET valid_until = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ArticleVersion>(&query)
            .bind(version_id)
            .bind(at)
            .fetch_one(conn)
            .await
    }
}
