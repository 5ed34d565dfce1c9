// HTTP adapters - translate requests into ConfessionService calls.
//
// Handlers are generic over the store and classifier so the router can be
// built over any backend (SQLite in production, in-memory in tests).

use super::responses::{success, ApiError};
use crate::core::confessions::{CommentStore, ConfessionService, ConfessionSort, ConfessionStore};
use crate::core::identity::{AnonymousId, FixedIdentity};
use crate::core::moderation::Classifier;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBody {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
pub struct LikeBody {
    #[serde(default, rename = "userId")]
    user_id: String,
}

/// Build the API router over `service`.
pub fn router<S, C>(service: Arc<ConfessionService<S, C>>) -> Router
where
    S: ConfessionStore + CommentStore + 'static,
    C: Classifier + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route(
            "/confessions",
            get(list_confessions::<S, C>).post(submit_confession::<S, C>),
        )
        .route("/confessions/:id/like", post(toggle_like::<S, C>))
        .route(
            "/confessions/:id/comments",
            get(list_comments::<S, C>).post(add_comment::<S, C>),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(service)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_confessions<S, C>(
    State(service): State<Arc<ConfessionService<S, C>>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, ApiError>
where
    S: ConfessionStore + CommentStore,
    C: Classifier,
{
    let Query(query) = query?;
    let sort = match query.sort.as_deref() {
        Some(raw) => raw.parse::<ConfessionSort>().map_err(ApiError::bad_request)?,
        None => ConfessionSort::default(),
    };

    let confessions = service.list_sorted(sort).await?;
    Ok(success(StatusCode::OK, confessions))
}

async fn submit_confession<S, C>(
    State(service): State<Arc<ConfessionService<S, C>>>,
    body: Result<Json<ContentBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
    S: ConfessionStore + CommentStore,
    C: Classifier,
{
    let Json(body) = body?;
    let confession = service.submit(&body.content).await?;
    Ok(success(StatusCode::CREATED, confession))
}

async fn toggle_like<S, C>(
    State(service): State<Arc<ConfessionService<S, C>>>,
    Path(id): Path<String>,
    body: Result<Json<LikeBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
    S: ConfessionStore + CommentStore,
    C: Classifier,
{
    let Json(body) = body?;
    let identity = FixedIdentity::new(
        AnonymousId::parse(&body.user_id).map_err(|e| ApiError::bad_request(e.to_string()))?,
    );
    let confession = service.toggle_like(&id, &identity).await?;
    Ok(success(StatusCode::OK, confession))
}

async fn list_comments<S, C>(
    State(service): State<Arc<ConfessionService<S, C>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    S: ConfessionStore + CommentStore,
    C: Classifier,
{
    let comments = service.list_comments(&id).await?;
    Ok(success(StatusCode::OK, comments))
}

async fn add_comment<S, C>(
    State(service): State<Arc<ConfessionService<S, C>>>,
    Path(id): Path<String>,
    body: Result<Json<ContentBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
    S: ConfessionStore + CommentStore,
    C: Classifier,
{
    let Json(body) = body?;
    let comment = service.add_comment(&id, &body.content).await?;
    Ok(success(StatusCode::CREATED, comment))
}

// ============================================================================
// TESTS
// ============================================================================
