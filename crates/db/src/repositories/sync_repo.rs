//! Change feed for offline clients.
//!
//! Each entity list is read independently with `updated_at > since`, in
//! `(updated_at, id)` order, capped at `limit` rows. A capped list also
//! carries every further row sharing the `updated_at` of its last row, so
//! rows written in one transaction never straddle two pages.

use chrono::Utc;
use mibeko_core::sync::{has_more, page_cursor};
use mibeko_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::article::Article;
use crate::models::article_version::ArticleVersion;
use crate::models::document::Document;
use crate::models::structure_node::StructureNode;
use crate::models::sync::{SyncChanges, SyncTombstones};

/// Provides the sync feed query.
pub struct SyncRepo;

impl SyncRepo {
    /// Everything that changed after `since` (or everything, without it).
    pub async fn changes(
        pool: &PgPool,
        since: Option<Timestamp>,
        limit: i64,
    ) -> Result<SyncChanges, sqlx::Error> {
        let server_time = Utc::now();

        let documents = sqlx::query_as::<_, Document>(&page_query(
            "SELECT id, title, slug, document_type, reference_number, publication_date,
                    source_url, status, deleted_at, created_at, updated_at
             FROM documents
             WHERE deleted_at IS NULL
               AND ($1::TIMESTAMPTZ IS NULL OR updated_at > $1)",
        ))
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        let structure_nodes = sqlx::query_as::<_, StructureNode>(&page_query(
            "SELECT n.id, n.document_id, n.parent_id, n.node_type, n.number, n.title,
                    n.sort_order, n.path, n.created_at, n.updated_at
             FROM structure_nodes n
             JOIN documents d ON d.id = n.document_id
             WHERE d.deleted_at IS NULL
               AND ($1::TIMESTAMPTZ IS NULL OR n.updated_at > $1)",
        ))
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        let articles = sqlx::query_as::<_, Article>(&page_query(
            "SELECT a.id, a.document_id, a.structure_node_id, a.number, a.sort_order,
                    a.deleted_at, a.created_at, a.updated_at
             FROM articles a
             JOIN documents d ON d.id = a.document_id
             WHERE a.deleted_at IS NULL
               AND d.deleted_at IS NULL
               AND ($1::TIMESTAMPTZ IS NULL OR a.updated_at > $1)",
        ))
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        let versions = sqlx::query_as::<_, ArticleVersion>(&page_query(
            "SELECT v.id, v.article_id, v.content, v.content_hash, v.valid_from, v.valid_until,
                    v.amending_document_id, v.embedding_model, v.embedded_at,
                    v.created_at, v.updated_at
             FROM article_versions v
             JOIN articles a ON a.id = v.article_id
             JOIN documents d ON d.id = a.document_id
             WHERE a.deleted_at IS NULL
               AND d.deleted_at IS NULL
               AND ($1::TIMESTAMPTZ IS NULL OR v.updated_at > $1)",
        ))
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        let (deleted_documents, deleted_articles) = match since {
            Some(since) => (
                Self::tombstones(pool, "documents", since, limit).await?,
                Self::tombstones(pool, "articles", since, limit).await?,
            ),
            None => (Vec::new(), Vec::new()),
        };

        let seen = documents
            .iter()
            .map(|r| r.updated_at)
            .chain(structure_nodes.iter().map(|r| r.updated_at))
            .chain(articles.iter().map(|r| r.updated_at))
            .chain(versions.iter().map(|r| r.updated_at))
            .chain(deleted_documents.iter().map(|(_, ts)| *ts))
            .chain(deleted_articles.iter().map(|(_, ts)| *ts));

        let page_sizes = [
            documents.len(),
            structure_nodes.len(),
            articles.len(),
            versions.len(),
            deleted_documents.len(),
            deleted_articles.len(),
        ];
        let last_rows = [
            documents.last().map(|r| r.updated_at),
            structure_nodes.last().map(|r| r.updated_at),
            articles.last().map(|r| r.updated_at),
            versions.last().map(|r| r.updated_at),
            deleted_documents.last().map(|(_, ts)| *ts),
            deleted_articles.last().map(|(_, ts)| *ts),
        ];
        let full_page_ends = page_sizes
            .iter()
            .zip(last_rows)
            .filter(|(n, _)| has_more(&[**n], limit))
            .filter_map(|(_, last)| last);

        let next_since = page_cursor(since, seen, full_page_ends);
        let more = has_more(&page_sizes, limit);

        Ok(SyncChanges {
            documents,
            structure_nodes,
            articles,
            versions,
            deleted: SyncTombstones {
                documents: deleted_documents.into_iter().map(|(id, _)| id).collect(),
                articles: deleted_articles.into_iter().map(|(id, _)| id).collect(),
            },
            server_time,
            next_since,
            has_more: more,
        })
    }

    /// Soft-deleted rows of `table` touched after `since`.
    async fn tombstones(
        pool: &PgPool,
        table: &str,
        since: Timestamp,
        limit: i64,
    ) -> Result<Vec<(DbId, Timestamp)>, sqlx::Error> {
        let query = page_query(&format!(
            "SELECT id, updated_at FROM {table}
             WHERE deleted_at IS NOT NULL AND updated_at > $1"
        ));
        sqlx::query_as::<_, (DbId, Timestamp)>(&query)
            .bind(since)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

/// Wrap a change query (`$1` = since) into one page of at most `$2` rows,
/// extended by the rows tied with the last row's `updated_at`.
///
/// `changed` must select `id` and `updated_at` columns.
fn page_query(changed: &str) -> String {
    format!(
        "WITH changed AS ({changed})
         SELECT * FROM changed
         WHERE updated_at <= COALESCE(
             (SELECT updated_at FROM changed ORDER BY updated_at, id OFFSET $2 - 1 LIMIT 1),
             'infinity'::TIMESTAMPTZ
         )
         ORDER BY updated_at, id"
    )
}
