//! HTTP handlers.

use super::error::ApiError;
use super::state::AppState;
use crate::agent::{BotResponse, McpBotResponse};
use crate::math;
use crate::store::{Item, NewItem, Page};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

type ApiResult<T> = Result<Json<T>, ApiError>;

// === Request/Response Types ===

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ValueResponse<T> {
    pub result: T,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

impl QueryRequest {
    fn validated(self) -> Result<String, ApiError> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err(ApiError::unprocessable("Question must not be empty"));
        }
        Ok(question.to_string())
    }
}

// === Handlers ===

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn divide(
    params: Result<Path<(f64, f64)>, PathRejection>,
) -> ApiResult<ValueResponse<f64>> {
    let Path((numerator, denominator)) = params?;
    let result = math::divide(numerator, denominator)?;
    Ok(Json(ValueResponse { result }))
}

pub async fn fibonacci(n: Result<Path<i64>, PathRejection>) -> ApiResult<ValueResponse<u128>> {
    let Path(n) = n?;
    let result = math::fibonacci(n)?;
    Ok(Json(ValueResponse { result }))
}

pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<NewItem>, JsonRejection>,
) -> ApiResult<Item> {
    let Json(new_item) = payload?;
    let item = state.store.create(&new_item).await?;
    info!("Created item {}", item.id);
    Ok(Json(item))
}

pub async fn list_items(
    State(state): State<AppState>,
    page: Result<Query<Page>, QueryRejection>,
) -> ApiResult<Vec<Item>> {
    let Query(page) = page?;
    let items = state.store.list(page.clamped(state.max_page_size)).await?;
    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    item_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Item> {
    let Path(item_id) = item_id?;
    state
        .store
        .get(item_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Item not found"))
}

pub async fn agent_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<BotResponse> {
    let Json(request) = payload?;
    let question = request.validated()?;
    let answer = state.docs.answer(&question).await?;
    Ok(Json(answer))
}

pub async fn mcp_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<McpBotResponse> {
    let Json(request) = payload?;
    let question = request.validated()?;
    let answer = state.browser.answer(&question).await?;
    Ok(Json(answer))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}
