//! Integration tests for bitemporal article versioning.
//!
//! Exercises `ArticleRepo` and `ArticleVersionRepo` against a real database:
//! - Article creation opens a first version
//! - `new_version` closes the current version and opens a new one
//! - The resolver returns the version in force at an instant (half-open)
//! - `in_place` edits, no-op saves, and repeal
//! - The database rejects overlapping and inverted intervals

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use mibeko_core::error::CoreError;
use mibeko_core::hashing::content_hash;
use mibeko_core::types::{DbId, Timestamp};
use mibeko_core::versioning::EditMode;
use mibeko_db::error::RepoError;
use mibeko_db::models::document::CreateDocument;
use mibeko_db::repositories::article_repo::NewArticle;
use mibeko_db::repositories::{ArticleRepo, ArticleVersionRepo, DocumentRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ts(year: i32, month: u32, day: u32) -> Timestamp {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

async fn seed_document(pool: &PgPool) -> DbId {
    let input = CreateDocument {
        title: "Code de la famille".to_string(),
        slug: None,
        document_type: "code".to_string(),
        reference_number: None,
        publication_date: None,
        source_url: None,
        status: None,
    };
    DocumentRepo::create(pool, &input, "code-de-la-famille")
        .await
        .unwrap()
        .id
}

async fn seed_article(pool: &PgPool, content: &str, valid_from: Timestamp) -> DbId {
    let document_id = seed_document(pool).await;
    let (article, _) = ArticleRepo::create(
        pool,
        document_id,
        &NewArticle {
            number: "12",
            structure_node_id: None,
            sort_order: None,
            content,
            valid_from,
            amending_document_id: None,
        },
    )
    .await
    .unwrap();
    article.id
}

async fn save_new(pool: &PgPool, article_id: DbId, content: &str, at: Timestamp) {
    ArticleVersionRepo::save_content(pool, article_id, content, EditMode::NewVersion, at, None)
        .await
        .unwrap();
}

fn pg_code(err: &RepoError) -> Option<String> {
    match err {
        RepoError::Database(sqlx::Error::Database(db)) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Creation and new versions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_article_opens_first_version(pool: PgPool) {
    let article_id = seed_article(&pool, "Le mariage est un contrat.", ts(2000, 1, 1)).await;

    let current = ArticleVersionRepo::find_current(&pool, article_id)
        .await
        .unwrap()
        .expect("first version is current");
    assert_eq!(current.valid_from, ts(2000, 1, 1));
    assert!(current.valid_until.is_none());
    assert_eq!(current.content_hash, content_hash("Le mariage est un contrat."));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_version_closes_previous(pool: PgPool) {
    let article_id = seed_article(&pool, "Version une.", ts(2000, 1, 1)).await;
    save_new(&pool, article_id, "Version deux.", ts(2010, 6, 1)).await;

    let history = ArticleVersionRepo::list_by_article(&pool, article_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);

    // Newest first.
    assert_eq!(history[0].content, "Version deux.");
    assert_eq!(history[0].valid_from, ts(2010, 6, 1));
    assert!(history[0].valid_until.is_none());
    assert_eq!(history[1].content, "Version une.");
    assert_eq!(history[1].valid_until, Some(ts(2010, 6, 1)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_resolver_is_half_open(pool: PgPool) {
    let article_id = seed_article(&pool, "Ancien texte.", ts(2000, 1, 1)).await;
    save_new(&pool, article_id, "Nouveau texte.", ts(2010, 1, 1)).await;

    let before = ArticleVersionRepo::find_active_at(&pool, article_id, ts(1999, 12, 31))
        .await
        .unwrap();
    assert!(before.is_none());

    let old = ArticleVersionRepo::find_active_at(&pool, article_id, ts(2005, 1, 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(old.content, "Ancien texte.");

    // The boundary instant belongs to the new version.
    let boundary = ArticleVersionRepo::find_active_at(&pool, article_id, ts(2010, 1, 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(boundary.content, "Nouveau texte.");

    let now = ArticleVersionRepo::find_active_at(&pool, article_id, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(now.id, boundary.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_version_with_unchanged_content_rejected(pool: PgPool) {
    let article_id = seed_article(&pool, "Même texte.", ts(2000, 1, 1)).await;

    let err = ArticleVersionRepo::save_content(
        &pool,
        article_id,
        "Même texte.\n",
        EditMode::NewVersion,
        ts(2001, 1, 1),
        None,
    )
    .await
    .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Validation(msg)) if msg.contains("content unchanged"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_version_must_start_after_current(pool: PgPool) {
    let article_id = seed_article(&pool, "Texte.", ts(2000, 1, 1)).await;

    for at in [ts(2000, 1, 1), ts(1990, 1, 1)] {
        let err = ArticleVersionRepo::save_content(
            &pool,
            article_id,
            "Autre texte.",
            EditMode::NewVersion,
            at,
            None,
        )
        .await
        .unwrap_err();
        assert_matches!(err, RepoError::Core(CoreError::Validation(_)));
    }

    // Nothing was written.
    let history = ArticleVersionRepo::list_by_article(&pool, article_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_content_on_missing_article(pool: PgPool) {
    let err = ArticleVersionRepo::save_content(
        &pool,
        999_999,
        "x",
        EditMode::NewVersion,
        ts(2000, 1, 1),
        None,
    )
    .await
    .unwrap_err();
    assert_matches!(
        err,
        RepoError::Core(CoreError::NotFound { entity: "Article", .. })
    );
}

// ---------------------------------------------------------------------------
// In-place edits
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_in_place_rewrites_current_version(pool: PgPool) {
    let article_id = seed_article(&pool, "Texte avec coquille.", ts(2000, 1, 1)).await;
    let before = ArticleVersionRepo::find_current(&pool, article_id)
        .await
        .unwrap()
        .unwrap();

    let outcome = ArticleVersionRepo::save_content(
        &pool,
        article_id,
        "Texte corrigé.",
        EditMode::InPlace,
        Utc::now(),
        None,
    )
    .await
    .unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.version.id, before.id);
    assert_eq!(outcome.version.valid_from, before.valid_from);
    assert_eq!(outcome.version.content, "Texte corrigé.");
    assert_eq!(outcome.version.content_hash, content_hash("Texte corrigé."));

    let history = ArticleVersionRepo::list_by_article(&pool, article_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_in_place_with_same_content_is_noop(pool: PgPool) {
    let article_id = seed_article(&pool, "Inchangé.", ts(2000, 1, 1)).await;
    let before = ArticleVersionRepo::find_current(&pool, article_id)
        .await
        .unwrap()
        .unwrap();

    let outcome = ArticleVersionRepo::save_content(
        &pool,
        article_id,
        "Inchangé.",
        EditMode::InPlace,
        Utc::now(),
        None,
    )
    .await
    .unwrap();

    assert!(!outcome.changed);
    assert_eq!(outcome.version.updated_at, before.updated_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_in_place_without_open_version_conflicts(pool: PgPool) {
    let article_id = seed_article(&pool, "Texte.", ts(2000, 1, 1)).await;
    ArticleVersionRepo::repeal(&pool, article_id, ts(2005, 1, 1))
        .await
        .unwrap();

    let err = ArticleVersionRepo::save_content(
        &pool,
        article_id,
        "Autre.",
        EditMode::InPlace,
        Utc::now(),
        None,
    )
    .await
    .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Conflict(_)));
}

// ---------------------------------------------------------------------------
// Repeal
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_repeal_closes_open_version(pool: PgPool) {
    let article_id = seed_article(&pool, "Disposition.", ts(2000, 1, 1)).await;

    let closed = ArticleVersionRepo::repeal(&pool, article_id, ts(2015, 3, 1))
        .await
        .unwrap();
    assert_eq!(closed.valid_until, Some(ts(2015, 3, 1)));

    assert!(ArticleVersionRepo::find_current(&pool, article_id)
        .await
        .unwrap()
        .is_none());
    assert!(ArticleVersionRepo::find_active_at(&pool, article_id, ts(2016, 1, 1))
        .await
        .unwrap()
        .is_none());
    assert!(ArticleVersionRepo::find_active_at(&pool, article_id, ts(2014, 1, 1))
        .await
        .unwrap()
        .is_some());

    let again = ArticleVersionRepo::repeal(&pool, article_id, ts(2016, 1, 1))
        .await
        .unwrap_err();
    assert_matches!(again, RepoError::Core(CoreError::Conflict(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_repeal_before_start_rejected(pool: PgPool) {
    let article_id = seed_article(&pool, "Disposition.", ts(2000, 1, 1)).await;

    let err = ArticleVersionRepo::repeal(&pool, article_id, ts(2000, 1, 1))
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reenactment_after_repeal_must_not_overlap(pool: PgPool) {
    let article_id = seed_article(&pool, "Première rédaction.", ts(2000, 1, 1)).await;
    ArticleVersionRepo::repeal(&pool, article_id, ts(2010, 1, 1))
        .await
        .unwrap();

    let err = ArticleVersionRepo::save_content(
        &pool,
        article_id,
        "Rétabli.",
        EditMode::NewVersion,
        ts(2005, 1, 1),
        None,
    )
    .await
    .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Conflict(_)));

    save_new(&pool, article_id, "Rétabli.", ts(2012, 1, 1)).await;
    let gap = ArticleVersionRepo::find_active_at(&pool, article_id, ts(2011, 1, 1))
        .await
        .unwrap();
    assert!(gap.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleted_document_hides_and_freezes_articles(pool: PgPool) {
    let article_id = seed_article(&pool, "Texte initial.", ts(2020, 1, 1)).await;
    let document_id: DbId = sqlx::query_scalar("SELECT document_id FROM articles WHERE id = $1")
        .bind(article_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(DocumentRepo::soft_delete(&pool, document_id).await.unwrap());

    assert!(ArticleRepo::find_by_id(&pool, article_id).await.unwrap().is_none());

    let err = ArticleVersionRepo::save_content(
        &pool,
        article_id,
        "Texte modifié.",
        EditMode::NewVersion,
        ts(2024, 1, 1),
        None,
    )
    .await
    .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::NotFound { entity: "Article", .. }));

    let err = ArticleVersionRepo::repeal(&pool, article_id, ts(2024, 1, 1))
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::NotFound { entity: "Article", .. }));
    assert!(!ArticleRepo::soft_delete(&pool, article_id).await.unwrap());

    DocumentRepo::restore(&pool, document_id).await.unwrap().unwrap();
    assert!(ArticleRepo::find_by_id(&pool, article_id).await.unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Database invariants
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_exclusion_constraint_rejects_overlap(pool: PgPool) {
    let article_id = seed_article(&pool, "Texte.", ts(2000, 1, 1)).await;
    ArticleVersionRepo::repeal(&pool, article_id, ts(2010, 1, 1))
        .await
        .unwrap();

    let err = sqlx::query(
        "INSERT INTO article_versions (article_id, content, content_hash, valid_from, valid_until)
         VALUES ($1, 'x', 'x', $2, $3)",
    )
    .bind(article_id)
    .bind(ts(2005, 1, 1))
    .bind(ts(2012, 1, 1))
    .execute(&pool)
    .await
    .unwrap_err();

    assert_eq!(pg_code(&RepoError::Database(err)).as_deref(), Some("23P01"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_touching_intervals_are_allowed(pool: PgPool) {
    let article_id = seed_article(&pool, "Texte.", ts(2000, 1, 1)).await;
    ArticleVersionRepo::repeal(&pool, article_id, ts(2010, 1, 1))
        .await
        .unwrap();

    sqlx::query(
        "INSERT INTO article_versions (article_id, content, content_hash, valid_from, valid_until)
         VALUES ($1, 'x', 'x', $2, $3)",
    )
    .bind(article_id)
    .bind(ts(2010, 1, 1))
    .bind(ts(2012, 1, 1))
    .execute(&pool)
    .await
    .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_inverted_interval_rejected(pool: PgPool) {
    let article_id = seed_article(&pool, "Texte.", ts(2000, 1, 1)).await;
    ArticleVersionRepo::repeal(&pool, article_id, ts(2001, 1, 1))
        .await
        .unwrap();

    let err = sqlx::query(
        "INSERT INTO article_versions (article_id, content, content_hash, valid_from, valid_until)
         VALUES ($1, 'x', 'x', $2, $2)",
    )
    .bind(article_id)
    .bind(ts(2005, 1, 1))
    .execute(&pool)
    .await
    .unwrap_err();

    let sqlx::Error::Database(db) = &err else {
        panic!("expected database error, got {err:?}");
    };
    assert_eq!(db.code().as_deref(), Some("23514"));
    assert_eq!(db.constraint(), Some("ck_article_versions_interval"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_open_version_rejected(pool: PgPool) {
    let article_id = seed_article(&pool, "Texte.", ts(2000, 1, 1)).await;

    let err = sqlx::query(
        "INSERT INTO article_versions (article_id, content, content_hash, valid_from)
         VALUES ($1, 'x', 'x', $2)",
    )
    .bind(article_id)
    .bind(ts(2020, 1, 1))
    .execute(&pool)
    .await
    .unwrap_err();

    // Either the open-version index or the exclusion constraint fires first.
    let code = pg_code(&RepoError::Database(err));
    assert!(
        matches!(code.as_deref(), Some("23505") | Some("23P01")),
        "unexpected error code {code:?}"
    );
}
