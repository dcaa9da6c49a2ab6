//! Repository for the `tags` and `taggables` tables.
//!
//! Provides tag CRUD, polymorphic entity-tag associations and autocomplete
//! suggestions. Association changes fire the search-index triggers, so the
//! articles involved are reindexed in the same transaction.

use std::collections::HashSet;

use mibeko_core::error::CoreError;
use mibeko_core::slug::slugify;
use mibeko_core::tagging::{self, TAGGABLE_ARTICLE, TAGGABLE_DOCUMENT};
use mibeko_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::RepoResult;
use crate::models::tag::{Tag, TagInfo, TagListParams};
use crate::repositories::article_repo::IN_LIVE_DOCUMENT;

/// Column list for `tags` queries.
const TAG_COLUMNS: &str = "id, name, slug, usage_count, created_at, updated_at";

/// Default page size for tag listing.
const DEFAULT_LIMIT: i64 = 100;

/// Maximum page size for tag listing.
const MAX_LIMIT: i64 = 500;

/// Default suggestion count for autocomplete.
const DEFAULT_SUGGEST_LIMIT: i64 = 10;

/// Maximum suggestion count for autocomplete.
const MAX_SUGGEST_LIMIT: i64 = 50;

/// Provides CRUD operations for tags and entity-tag associations.
pub struct TagRepo;

impl TagRepo {
    // -----------------------------------------------------------------------
    // Tag CRUD
    // -----------------------------------------------------------------------

    /// Create a tag or return the existing one with the same slug.
    ///
    /// The stored name of an existing tag is left untouched. The no-op
    /// `DO UPDATE` makes a concurrent insert of the same slug wait and then
    /// return the committed row.
    pub async fn create_or_get(conn: &mut PgConnection, name: &str) -> RepoResult<Tag> {
        let (display, slug) = tagging::prepare_tag(name)?;

        let query = format!(
            "INSERT INTO tags (name, slug) VALUES ($1, $2)
             ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug
             RETURNING {TAG_COLUMNS}"
        );
        let tag = sqlx::query_as::<_, Tag>(&query)
            .bind(&display)
            .bind(&slug)
            .fetch_one(conn)
            .await?;
        Ok(tag)
    }

    /// Find a tag by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tags, most used first.
    pub async fn list_all(pool: &PgPool, params: &TagListParams) -> Result<Vec<Tag>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = format!(
            "SELECT {TAG_COLUMNS} FROM tags
             ORDER BY usage_count DESC, name
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Autocomplete suggestions: prefix match on the slug, most used first.
    pub async fn suggest(
        pool: &PgPool,
        prefix: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Tag>, sqlx::Error> {
        let slug_prefix = slugify(prefix);
        if slug_prefix.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit
            .unwrap_or(DEFAULT_SUGGEST_LIMIT)
            .clamp(1, MAX_SUGGEST_LIMIT);

        // Slugs only contain [a-z0-9-], so the pattern needs no escaping.
        let query = format!(
            "SELECT {TAG_COLUMNS} FROM tags
             WHERE slug LIKE $1
             ORDER BY usage_count DESC, name
             LIMIT $2"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(format!("{slug_prefix}%"))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Rename a tag. The slug follows the new name.
    ///
    /// Returns `None` if no tag with the given ID exists.
    pub async fn rename(pool: &PgPool, id: DbId, name: &str) -> RepoResult<Option<Tag>> {
        let (display, slug) = tagging::prepare_tag(name)?;

        let query = format!(
            "UPDATE tags SET name = $2, slug = $3 WHERE id = $1 RETURNING {TAG_COLUMNS}"
        );
        let tag = sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .bind(&display)
            .bind(&slug)
            .fetch_optional(pool)
            .await?;
        Ok(tag)
    }

    /// Delete a tag by ID. Cascade deletes all associations.
    ///
    /// Returns `true` if a tag was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Entity-tag associations
    // -----------------------------------------------------------------------

    /// Whether a live entity of the given taggable type exists. Articles of
    /// a soft-deleted document count as gone.
    pub async fn entity_exists(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
    ) -> RepoResult<bool> {
        tagging::validate_taggable_type(entity_type)?;
        let query = match entity_type {
            TAGGABLE_ARTICLE => format!(
                "SELECT EXISTS (
                     SELECT 1 FROM articles
                     WHERE id = $1 AND deleted_at IS NULL AND {IN_LIVE_DOCUMENT}
                 )"
            ),
            TAGGABLE_DOCUMENT => {
                "SELECT EXISTS (SELECT 1 FROM documents WHERE id = $1 AND deleted_at IS NULL)"
                    .to_string()
            }
            other => {
                return Err(CoreError::Internal(format!("No table for taggable type '{other}'")).into())
            }
        };

        let exists: bool = sqlx::query_scalar(&query)
            .bind(entity_id)
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }

    /// Apply a tag to an entity. Idempotent: does nothing if already applied.
    ///
    /// Increments the tag's `usage_count` only when a new association is created.
    pub async fn apply(
        conn: &mut PgConnection,
        entity_type: &str,
        entity_id: DbId,
        tag_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO taggables (tag_id, taggable_type, taggable_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (tag_id, taggable_type, taggable_id) DO NOTHING",
        )
        .bind(tag_id)
        .bind(entity_type)
        .bind(entity_id)
        .execute(&mut *conn)
        .await?;

        let was_inserted = result.rows_affected() > 0;

        if was_inserted {
            sqlx::query("UPDATE tags SET usage_count = usage_count + 1 WHERE id = $1")
                .bind(tag_id)
                .execute(conn)
                .await?;
        }

        Ok(was_inserted)
    }

    /// Remove a tag from an entity.
    ///
    /// Decrements the tag's `usage_count` only when an association is actually removed.
    pub async fn remove(
        conn: &mut PgConnection,
        entity_type: &str,
        entity_id: DbId,
        tag_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM taggables \
             WHERE tag_id = $1 AND taggable_type = $2 AND taggable_id = $3",
        )
        .bind(tag_id)
        .bind(entity_type)
        .bind(entity_id)
        .execute(&mut *conn)
        .await?;

        let was_deleted = result.rows_affected() > 0;

        if was_deleted {
            sqlx::query("UPDATE tags SET usage_count = GREATEST(usage_count - 1, 0) WHERE id = $1")
                .bind(tag_id)
                .execute(conn)
                .await?;
        }

        Ok(was_deleted)
    }

    /// Remove one tag from an entity in its own transaction.
    pub async fn remove_one(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
        tag_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let removed = Self::remove(&mut *tx, entity_type, entity_id, tag_id).await?;
        tx.commit().await?;
        Ok(removed)
    }

    /// List all tags for a specific entity, by name.
    pub async fn get_entity_tags(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<TagInfo>, sqlx::Error> {
        sqlx::query_as::<_, TagInfo>(
            "SELECT t.id, t.name, t.slug \
             FROM taggables tg \
             JOIN tags t ON t.id = tg.tag_id \
             WHERE tg.taggable_type = $1 AND tg.taggable_id = $2 \
             ORDER BY t.name",
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Set operations
    // -----------------------------------------------------------------------

    /// Apply tags (by name) to an entity, creating tags on first use.
    ///
    /// Returns the number of new associations.
    pub async fn apply_names(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
        tag_names: &[String],
    ) -> RepoResult<u64> {
        tagging::validate_tag_names(tag_names)?;

        let mut tx = pool.begin().await?;
        let mut applied = 0;
        for name in tag_names {
            let tag = Self::create_or_get(&mut *tx, name).await?;
            if Self::apply(&mut *tx, entity_type, entity_id, tag.id).await? {
                applied += 1;
            }
        }
        tx.commit().await?;

        Ok(applied)
    }

    /// Replace the whole tag set of an entity with `tag_names`.
    ///
    /// Returns `(applied, removed)` association counts.
    pub async fn sync_tags(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
        tag_names: &[String],
    ) -> RepoResult<(u64, u64)> {
        tagging::validate_tag_names(tag_names)?;

        let mut tx = pool.begin().await?;

        let mut desired: HashSet<DbId> = HashSet::with_capacity(tag_names.len());
        for name in tag_names {
            desired.insert(Self::create_or_get(&mut *tx, name).await?.id);
        }

        let existing: Vec<DbId> = sqlx::query_scalar(
            "SELECT tag_id FROM taggables WHERE taggable_type = $1 AND taggable_id = $2",
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut removed = 0;
        for tag_id in existing.iter().filter(|id| !desired.contains(*id)) {
            if Self::remove(&mut *tx, entity_type, entity_id, *tag_id).await? {
                removed += 1;
            }
        }

        let mut applied = 0;
        for &tag_id in &desired {
            if Self::apply(&mut *tx, entity_type, entity_id, tag_id).await? {
                applied += 1;
            }
        }

        tx.commit().await?;
        Ok((applied, removed))
    }
}
