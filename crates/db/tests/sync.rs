//! Integration tests for the offline sync feed.

use std::collections::HashSet;

use chrono::Utc;
use mibeko_core::structure::SyncNode;
use mibeko_core::types::DbId;
use mibeko_db::models::document::{CreateDocument, UpdateDocument};
use mibeko_db::models::structure_node::SyncStructureRequest;
use mibeko_db::repositories::article_repo::NewArticle;
use mibeko_db::repositories::{ArticleRepo, DocumentRepo, StructureNodeRepo, SyncRepo};
use sqlx::PgPool;

async fn seed_document(pool: &PgPool, slug: &str) -> DbId {
    let input = CreateDocument {
        title: slug.to_string(),
        slug: None,
        document_type: "decree".to_string(),
        reference_number: None,
        publication_date: None,
        source_url: None,
        status: Some("published".to_string()),
    };
    DocumentRepo::create(pool, &input, slug).await.unwrap().id
}

async fn seed_article(pool: &PgPool, document_id: DbId) -> DbId {
    ArticleRepo::create(
        pool,
        document_id,
        &NewArticle {
            number: "1",
            structure_node_id: None,
            sort_order: None,
            content: "Texte.",
            valid_from: Utc::now(),
            amending_document_id: None,
        },
    )
    .await
    .unwrap()
    .0
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_sync_returns_everything(pool: PgPool) {
    let doc = seed_document(&pool, "decret-1").await;
    seed_article(&pool, doc).await;

    let changes = SyncRepo::changes(&pool, None, 500).await.unwrap();
    assert_eq!(changes.documents.len(), 1);
    assert_eq!(changes.articles.len(), 1);
    assert_eq!(changes.versions.len(), 1);
    assert!(changes.deleted.documents.is_empty());
    assert!(!changes.has_more);
    assert!(changes.next_since.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_incremental_sync_and_tombstones(pool: PgPool) {
    let doc_a = seed_document(&pool, "decret-a").await;
    let doc_b = seed_document(&pool, "decret-b").await;
    let article = seed_article(&pool, doc_a).await;

    let first = SyncRepo::changes(&pool, None, 500).await.unwrap();
    let cursor = first.next_since;

    let empty = SyncRepo::changes(&pool, cursor, 500).await.unwrap();
    assert!(empty.documents.is_empty());
    assert!(empty.versions.is_empty());
    assert_eq!(empty.next_since, cursor);

    DocumentRepo::update(
        &pool,
        doc_b,
        &UpdateDocument {
            title: Some("Décret modifié".to_string()),
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap()
    .unwrap();
    ArticleRepo::soft_delete(&pool, article).await.unwrap();

    let delta = SyncRepo::changes(&pool, cursor, 500).await.unwrap();
    assert_eq!(delta.documents.len(), 1);
    assert_eq!(delta.documents[0].id, doc_b);
    assert!(delta.articles.is_empty());
    assert_eq!(delta.deleted.articles, vec![article]);
    assert!(delta.next_since > cursor);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_truncated_page_caps_cursor(pool: PgPool) {
    let doc_a = seed_document(&pool, "decret-x").await;
    let doc_b = seed_document(&pool, "decret-y").await;

    let page = SyncRepo::changes(&pool, None, 1).await.unwrap();
    assert!(page.has_more);
    assert_eq!(page.documents.len(), 1);
    assert_eq!(page.documents[0].id, doc_a);
    assert_eq!(page.next_since, Some(page.documents[0].updated_at));

    let next = SyncRepo::changes(&pool, page.next_since, 1).await.unwrap();
    assert_eq!(next.documents.len(), 1);
    assert_eq!(next.documents[0].id, doc_b);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rows_sharing_a_timestamp_are_not_split_across_pages(pool: PgPool) {
    let doc = seed_document(&pool, "decret-structure").await;
    let nodes = (1..=5)
        .map(|i| SyncNode {
            key: format!("t{i}"),
            parent_key: None,
            node_type: "title".to_string(),
            number: Some(i.to_string()),
            title: None,
        })
        .collect();
    let synced = StructureNodeRepo::sync_document(
        &pool,
        doc,
        &SyncStructureRequest {
            nodes,
            articles: vec![],
        },
    )
    .await
    .unwrap();
    assert_eq!(synced.nodes.len(), 5);

    let mut received: HashSet<DbId> = HashSet::new();
    let mut cursor = None;
    for _ in 0..10 {
        let page = SyncRepo::changes(&pool, cursor, 2).await.unwrap();
        received.extend(page.structure_nodes.iter().map(|n| n.id));
        cursor = page.next_since;
        if !page.has_more {
            break;
        }
    }

    let expected: HashSet<DbId> = synced.nodes.iter().map(|n| n.id).collect();
    assert_eq!(received, expected);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_restored_document_resends_its_content(pool: PgPool) {
    let doc = seed_document(&pool, "decret-restaure").await;
    let article = seed_article(&pool, doc).await;

    let initial = SyncRepo::changes(&pool, None, 500).await.unwrap();

    DocumentRepo::soft_delete(&pool, doc).await.unwrap();
    let tombstone = SyncRepo::changes(&pool, initial.next_since, 500)
        .await
        .unwrap();
    assert_eq!(tombstone.deleted.documents, vec![doc]);
    assert!(tombstone.articles.is_empty());
    let cursor = tombstone.next_since;

    DocumentRepo::restore(&pool, doc).await.unwrap().unwrap();

    let delta = SyncRepo::changes(&pool, cursor, 500).await.unwrap();
    assert_eq!(delta.documents.len(), 1);
    assert_eq!(delta.articles.len(), 1);
    assert_eq!(delta.articles[0].id, article);
    assert_eq!(delta.versions.len(), 1);
    assert_eq!(delta.versions[0].article_id, article);
}
