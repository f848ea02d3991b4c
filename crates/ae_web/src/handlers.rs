use std::sync::Arc;

use ae_core::envelope::{DataResponse, ListResponse};
use ae_core::{Article, ArticleDetail, ArticlePatch, ListParams, NewArticle};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<T, ApiError>;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "Article API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ListResponse>> {
    let Query(params) = params?;
    let query = params.build()?;
    debug!("📊 Query: {:?}", query);

    let page = state.repository.list(&query).await?;
    Ok(Json(ListResponse::from(page)))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<ArticleDetail>>> {
    let detail = state.repository.get_by_id(&id).await?;
    Ok(Json(DataResponse::new(detail)))
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewArticle>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DataResponse<Article>>)> {
    let Json(new_article) = payload?;
    let article = state.repository.create(new_article).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message("Article created successfully", article)),
    ))
}

pub async fn update_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ArticlePatch>, JsonRejection>,
) -> ApiResult<Json<DataResponse<Article>>> {
    let Json(patch) = payload?;
    let article = state.repository.update(&id, patch).await?;
    Ok(Json(DataResponse::with_message("Article updated successfully", article)))
}

pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<Value>>> {
    state.repository.delete(&id).await?;
    Ok(Json(DataResponse::with_message("Article deleted successfully", json!({}))))
}
