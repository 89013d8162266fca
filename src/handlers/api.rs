// src/handlers/api.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    gemini::Explainer,
    models::post::{ExplainRequest, ExplainResponse, PostListParams},
    store::PostRepository,
    view::{ALL, DEFAULT_LIMIT},
};

/// Lists posts, newest first.
/// `subreddit` absent or "all" lists every forum.
pub async fn list_posts(
    State(store): State<Arc<dyn PostRepository>>,
    Query(params): Query<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let subreddit = params
        .subreddit
        .as_deref()
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case(ALL));
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

    let posts = store.list_posts(subreddit, limit).await.map_err(|e| {
        tracing::error!("Failed to list posts: {}", e);
        e
    })?;

    Ok(Json(posts))
}

/// Stored row count per forum.
pub async fn stats(
    State(store): State<Arc<dyn PostRepository>>,
) -> Result<impl IntoResponse, AppError> {
    let counts = store.count_by_subreddit().await?;
    Ok(Json(counts))
}

/// Explains a keyword. Service failures come back as the explanation text,
/// so this only fails on invalid input.
pub async fn explain(
    State(explainer): State<Explainer>,
    Json(payload): Json<ExplainRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let keyword = payload.keyword.trim().to_string();
    if keyword.is_empty() {
        return Err(AppError::BadRequest("Keyword must not be blank".to_string()));
    }
    let explanation = explainer.explain(&keyword).await;

    Ok(Json(ExplainResponse {
        keyword,
        explanation,
    }))
}

pub async fn health() -> &'static str {
    "ok"
}
