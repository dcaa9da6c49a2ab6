//! Integration tests for document structure editing.
//!
//! - Node creation assigns materialized paths and sibling order
//! - Moving a node rewrites its subtree's paths
//! - Invalid moves and cross-document parents are rejected
//! - Deleting a node removes its subtree and detaches articles
//! - Whole-structure sync replaces the tree and re-attaches articles

use assert_matches::assert_matches;
use chrono::Utc;
use mibeko_core::error::CoreError;
use mibeko_core::structure::{NodeType, SyncNode};
use mibeko_core::types::DbId;
use mibeko_db::error::RepoError;
use mibeko_db::models::document::CreateDocument;
use mibeko_db::models::structure_node::{
    ArticlePlacement, CreateStructureNode, MoveStructureNode, StructureNode, SyncStructureRequest,
};
use mibeko_db::repositories::article_repo::NewArticle;
use mibeko_db::repositories::{ArticleRepo, DocumentRepo, StructureNodeRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_document(pool: &PgPool, slug: &str) -> DbId {
    let input = CreateDocument {
        title: slug.to_string(),
        slug: None,
        document_type: "law".to_string(),
        reference_number: None,
        publication_date: None,
        source_url: None,
        status: None,
    };
    DocumentRepo::create(pool, &input, slug).await.unwrap().id
}

async fn add_node(
    pool: &PgPool,
    document_id: DbId,
    parent_id: Option<DbId>,
    node_type: NodeType,
    number: &str,
) -> StructureNode {
    StructureNodeRepo::create(
        pool,
        document_id,
        node_type,
        &CreateStructureNode {
            parent_id,
            node_type: node_type.as_str().to_string(),
            number: Some(number.to_string()),
            title: None,
            sort_order: None,
        },
    )
    .await
    .unwrap()
}

async fn add_article(pool: &PgPool, document_id: DbId, node_id: Option<DbId>) -> DbId {
    ArticleRepo::create(
        pool,
        document_id,
        &NewArticle {
            number: "1",
            structure_node_id: node_id,
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

fn sync_node(key: &str, parent_key: Option<&str>, node_type: &str) -> SyncNode {
    SyncNode {
        key: key.to_string(),
        parent_key: parent_key.map(str::to_string),
        node_type: node_type.to_string(),
        number: None,
        title: Some(format!("Titre {key}")),
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_assigns_paths_and_order(pool: PgPool) {
    let doc = seed_document(&pool, "loi-1").await;
    let title = add_node(&pool, doc, None, NodeType::Title, "I").await;
    let ch1 = add_node(&pool, doc, Some(title.id), NodeType::Chapter, "1").await;
    let ch2 = add_node(&pool, doc, Some(title.id), NodeType::Chapter, "2").await;

    assert_eq!(title.path, title.id.to_string());
    assert_eq!(ch1.path, format!("{}.{}", title.id, ch1.id));
    assert_eq!(ch1.sort_order, 0);
    assert_eq!(ch2.sort_order, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_parent_from_other_document_rejected(pool: PgPool) {
    let doc_a = seed_document(&pool, "loi-a").await;
    let doc_b = seed_document(&pool, "loi-b").await;
    let foreign = add_node(&pool, doc_a, None, NodeType::Title, "I").await;

    let err = StructureNodeRepo::create(
        &pool,
        doc_b,
        NodeType::Chapter,
        &CreateStructureNode {
            parent_id: Some(foreign.id),
            node_type: "chapter".to_string(),
            number: None,
            title: None,
            sort_order: None,
        },
    )
    .await
    .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Validation(_)));
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_move_rewrites_subtree_paths(pool: PgPool) {
    let doc = seed_document(&pool, "loi-2").await;
    let t1 = add_node(&pool, doc, None, NodeType::Title, "I").await;
    let t2 = add_node(&pool, doc, None, NodeType::Title, "II").await;
    let ch = add_node(&pool, doc, Some(t1.id), NodeType::Chapter, "1").await;
    let sec = add_node(&pool, doc, Some(ch.id), NodeType::Section, "1").await;

    let moved = StructureNodeRepo::move_node(
        &pool,
        ch.id,
        &MoveStructureNode {
            parent_id: Some(t2.id),
            sort_order: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(moved.parent_id, Some(t2.id));
    assert_eq!(moved.path, format!("{}.{}", t2.id, ch.id));

    let sec = StructureNodeRepo::find_by_id(&pool, sec.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sec.path, format!("{}.{}.{}", t2.id, ch.id, sec.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_move_to_root(pool: PgPool) {
    let doc = seed_document(&pool, "loi-3").await;
    let t1 = add_node(&pool, doc, None, NodeType::Title, "I").await;
    let ch = add_node(&pool, doc, Some(t1.id), NodeType::Chapter, "1").await;

    let moved = StructureNodeRepo::move_node(
        &pool,
        ch.id,
        &MoveStructureNode {
            parent_id: None,
            sort_order: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(moved.parent_id, None);
    assert_eq!(moved.path, ch.id.to_string());
    assert_eq!(moved.sort_order, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_move_under_descendant_rejected(pool: PgPool) {
    let doc = seed_document(&pool, "loi-4").await;
    let t1 = add_node(&pool, doc, None, NodeType::Title, "I").await;
    let ch = add_node(&pool, doc, Some(t1.id), NodeType::Chapter, "1").await;

    for target in [t1.id, ch.id] {
        let err = StructureNodeRepo::move_node(
            &pool,
            t1.id,
            &MoveStructureNode {
                parent_id: Some(target),
                sort_order: None,
            },
        )
        .await
        .unwrap_err();
        assert_matches!(err, RepoError::Core(CoreError::Validation(_)));
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_removes_subtree_and_detaches_articles(pool: PgPool) {
    let doc = seed_document(&pool, "loi-5").await;
    let t1 = add_node(&pool, doc, None, NodeType::Title, "I").await;
    let ch = add_node(&pool, doc, Some(t1.id), NodeType::Chapter, "1").await;
    let article_id = add_article(&pool, doc, Some(ch.id)).await;
    let before = DocumentRepo::find_by_id(&pool, doc).await.unwrap().unwrap();

    assert!(StructureNodeRepo::delete(&pool, t1.id).await.unwrap());

    assert!(StructureNodeRepo::find_by_id(&pool, ch.id).await.unwrap().is_none());
    let article = ArticleRepo::find_by_id(&pool, article_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(article.structure_node_id, None);

    let after = DocumentRepo::find_by_id(&pool, doc).await.unwrap().unwrap();
    assert!(after.updated_at > before.updated_at);

    assert!(!StructureNodeRepo::delete(&pool, t1.id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Whole-structure sync
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sync_replaces_tree_and_places_articles(pool: PgPool) {
    let doc = seed_document(&pool, "loi-6").await;
    let old = add_node(&pool, doc, None, NodeType::Book, "I").await;
    let placed = add_article(&pool, doc, Some(old.id)).await;
    let unplaced = add_article(&pool, doc, Some(old.id)).await;

    let request = SyncStructureRequest {
        nodes: vec![
            sync_node("c1", Some("t1"), "chapter"),
            sync_node("t1", None, "title"),
            sync_node("c2", Some("t1"), "chapter"),
        ],
        articles: vec![ArticlePlacement {
            article_id: placed,
            node_key: Some("c2".to_string()),
            sort_order: Some(4),
        }],
    };

    let result = StructureNodeRepo::sync_document(&pool, doc, &request)
        .await
        .unwrap();

    assert_eq!(result.nodes.len(), 3);
    assert!(StructureNodeRepo::find_by_id(&pool, old.id).await.unwrap().is_none());

    let t1 = result.key_map["t1"];
    let c1 = result.key_map["c1"];
    let c2 = result.key_map["c2"];
    let by_id = |id: DbId| result.nodes.iter().find(|n| n.id == id).unwrap();
    assert_eq!(by_id(c1).parent_id, Some(t1));
    assert_eq!(by_id(c1).sort_order, 0);
    assert_eq!(by_id(c2).sort_order, 1);
    assert_eq!(by_id(c2).path, format!("{t1}.{c2}"));

    let placed = ArticleRepo::find_by_id(&pool, placed).await.unwrap().unwrap();
    assert_eq!(placed.structure_node_id, Some(c2));
    assert_eq!(placed.sort_order, 4);

    let unplaced = ArticleRepo::find_by_id(&pool, unplaced).await.unwrap().unwrap();
    assert_eq!(unplaced.structure_node_id, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sync_rejects_cycle_without_writing(pool: PgPool) {
    let doc = seed_document(&pool, "loi-7").await;
    let existing = add_node(&pool, doc, None, NodeType::Title, "I").await;

    let request = SyncStructureRequest {
        nodes: vec![
            sync_node("a", Some("b"), "chapter"),
            sync_node("b", Some("a"), "chapter"),
        ],
        articles: vec![],
    };

    let err = StructureNodeRepo::sync_document(&pool, doc, &request)
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Validation(msg)) if msg.contains("cycle"));

    assert!(StructureNodeRepo::find_by_id(&pool, existing.id)
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sync_rejects_foreign_article(pool: PgPool) {
    let doc = seed_document(&pool, "loi-8").await;
    let other = seed_document(&pool, "loi-9").await;
    let foreign_article = add_article(&pool, other, None).await;

    let request = SyncStructureRequest {
        nodes: vec![sync_node("t1", None, "title")],
        articles: vec![ArticlePlacement {
            article_id: foreign_article,
            node_key: Some("t1".to_string()),
            sort_order: None,
        }],
    };

    let err = StructureNodeRepo::sync_document(&pool, doc, &request)
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sync_unknown_document(pool: PgPool) {
    let request = SyncStructureRequest {
        nodes: vec![sync_node("t1", None, "title")],
        articles: vec![],
    };

    let err = StructureNodeRepo::sync_document(&pool, 424_242, &request)
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::NotFound { .. }));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_nodes_of_deleted_document_are_hidden(pool: PgPool) {
    let doc = seed_document(&pool, "loi-abrogee").await;
    let node = add_node(&pool, doc, None, NodeType::Title, "I").await;
    DocumentRepo::soft_delete(&pool, doc).await.unwrap();

    assert!(StructureNodeRepo::find_by_id(&pool, node.id).await.unwrap().is_none());
    assert!(!StructureNodeRepo::delete(&pool, node.id).await.unwrap());

    let err = StructureNodeRepo::move_node(
        &pool,
        node.id,
        &MoveStructureNode {
            parent_id: None,
            sort_order: Some(3),
        },
    )
    .await
    .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::NotFound { .. }));
}
