//! Handlers for articles and their version history.
//!
//! Content changes go through `PUT /articles/{id}/content`, which either
//! supersedes the current version or corrects it in place. Every save that
//! changes text schedules an embedding refresh.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use mibeko_core::article::{normalize_number, validate_content};
use mibeko_core::error::CoreError;
use mibeko_core::tagging::TAGGABLE_ARTICLE;
use mibeko_core::types::DbId;
use mibeko_db::models::article::{ArticleDetail, CreateArticle, UpdateArticle};
use mibeko_db::models::article_version::{ActiveVersionParams, RepealRequest, SaveContentRequest};
use mibeko_db::repositories::article_repo::NewArticle;
use mibeko_db::repositories::{ArticleRepo, ArticleVersionRepo, TagRepo};
use validator::Validate;

use super::structure::ensure_document;
use crate::background::embedding::spawn_embed_version;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Document-scoped
// ---------------------------------------------------------------------------

/// GET /api/v1/documents/{id}/articles
pub async fn list_document_articles(
    State(state): State<AppState>,
    Path(document_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_document(&state, document_id).await?;
    let articles = ArticleRepo::list_by_document(&state.pool, document_id).await?;

    Ok(Json(DataResponse { data: articles }))
}

/// POST /api/v1/documents/{id}/articles
///
/// Creates the article and its first version, valid from `valid_from`
/// (default: now).
pub async fn create_article(
    State(state): State<AppState>,
    Path(document_id): Path<DbId>,
    Json(input): Json<CreateArticle>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let number = normalize_number(&input.number)?;
    validate_content(&input.content)?;

    let (article, version) = ArticleRepo::create(
        &state.pool,
        document_id,
        &NewArticle {
            number: &number,
            structure_node_id: input.structure_node_id,
            sort_order: input.sort_order,
            content: &input.content,
            valid_from: input.valid_from.unwrap_or_else(Utc::now),
            amending_document_id: input.amending_document_id,
        },
    )
    .await?;

    tracing::info!(
        document_id,
        article_id = article.id,
        version_id = version.id,
        number = %article.number,
        "Article created",
    );
    spawn_embed_version(&state, version.id);

    let detail = ArticleDetail {
        article,
        current_version: Some(version),
        tags: Vec::new(),
    };
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

// ---------------------------------------------------------------------------
// Article-scoped
// ---------------------------------------------------------------------------

/// GET /api/v1/articles/{id}
///
/// The article with its current version and tags.
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let article = ArticleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(article_not_found(id))?;
    let current_version = ArticleVersionRepo::find_current(&state.pool, id).await?;
    let tags = TagRepo::get_entity_tags(&state.pool, TAGGABLE_ARTICLE, id).await?;

    Ok(Json(DataResponse {
        data: ArticleDetail {
            article,
            current_version,
            tags,
        },
    }))
}

/// PUT /api/v1/articles/{id}
///
/// Number, node and order only; the node must belong to the same document.
pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateArticle>,
) -> AppResult<impl IntoResponse> {
    let number = input.number.as_deref().map(normalize_number).transpose()?;
    let article = ArticleRepo::update(&state.pool, id, number.as_deref(), &input)
        .await?
        .ok_or(article_not_found(id))?;

    tracing::info!(article_id = id, "Article updated");

    Ok(Json(DataResponse { data: article }))
}

/// DELETE /api/v1/articles/{id}
pub async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !ArticleRepo::soft_delete(&state.pool, id).await? {
        return Err(article_not_found(id));
    }

    tracing::info!(article_id = id, "Article soft-deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/articles/{id}/content
///
/// `mode` is `new_version` (default) or `in_place`. A new version starts at
/// `valid_from` (default: now).
pub async fn save_content(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SaveContentRequest>,
) -> AppResult<impl IntoResponse> {
    validate_content(&input.content)?;

    let outcome = ArticleVersionRepo::save_content(
        &state.pool,
        id,
        &input.content,
        input.mode,
        input.valid_from.unwrap_or_else(Utc::now),
        input.amending_document_id,
    )
    .await?;

    if outcome.changed {
        spawn_embed_version(&state, outcome.version.id);
    }

    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/articles/{id}/repeal
///
/// Close the version in force at `at` (default: now).
pub async fn repeal_article(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RepealRequest>,
) -> AppResult<impl IntoResponse> {
    let at = input.at.unwrap_or_else(Utc::now);
    let version = ArticleVersionRepo::repeal(&state.pool, id, at).await?;

    Ok(Json(DataResponse { data: version }))
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// GET /api/v1/articles/{id}/versions
///
/// Full history, newest first.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_article(&state, id).await?;
    let versions = ArticleVersionRepo::list_by_article(&state.pool, id).await?;

    Ok(Json(DataResponse { data: versions }))
}

/// GET /api/v1/articles/{id}/versions/active
///
/// The version in force at `at` (default: now). 404 when the article was
/// not in force at that instant.
pub async fn get_active_version(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ActiveVersionParams>,
) -> AppResult<impl IntoResponse> {
    ensure_article(&state, id).await?;
    let at = params.at.unwrap_or_else(Utc::now);
    let version = ArticleVersionRepo::find_active_at(&state.pool, id, at)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "ActiveArticleVersion",
                id,
            })
        })?;

    Ok(Json(DataResponse { data: version }))
}

/// GET /api/v1/articles/{id}/versions/{version_id}
pub async fn get_version(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    ensure_article(&state, id).await?;
    let version = ArticleVersionRepo::find_by_id(&state.pool, id, version_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ArticleVersion",
            id: version_id,
        }))?;

    Ok(Json(DataResponse { data: version }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_article(state: &AppState, id: DbId) -> AppResult<()> {
    if ArticleRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(article_not_found(id));
    }
    Ok(())
}

fn article_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Article",
        id,
    })
}
