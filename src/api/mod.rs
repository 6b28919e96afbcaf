//! HTTP API.
//!
//! Arithmetic helpers, item CRUD over the `items` table, and the two agent
//! query endpoints. Every error body is `{"detail": "..."}`.

mod error;
mod handlers;
mod state;

pub use error::ApiError;
pub use state::{AppState, BrowserAgent, DocsAgent};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/divide/{numerator}/{denominator}", get(handlers::divide))
        .route("/fibonacci/{n}", get(handlers::fibonacci))
        .route(
            "/items/",
            post(handlers::create_item).get(handlers::list_items),
        )
        .route(
            "/items",
            post(handlers::create_item).get(handlers::list_items),
        )
        .route("/items/{item_id}", get(handlers::get_item))
        .route("/agent/query", post(handlers::agent_query))
        .route("/mcp/query", post(handlers::mcp_query))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Assistant, BotResponse, McpBotResponse};
    use crate::error::{Result, TrellisError};
    use crate::store::MemoryItemStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct StubDocs;

    #[async_trait]
    impl Assistant for StubDocs {
        type Output = BotResponse;

        async fn answer(&self, question: &str) -> Result<BotResponse> {
            if question == "fail" {
                return Err(TrellisError::Agent("model unavailable".to_string()));
            }
            Ok(BotResponse {
                answer: format!("You asked: {}", question),
                reasoning: "stub".to_string(),
                reference: Some("https://ai.pydantic.dev/".to_string()),
                confidence_percentage: 90,
            })
        }
    }

    struct StubBrowser;

    #[async_trait]
    impl Assistant for StubBrowser {
        type Output = McpBotResponse;

        async fn answer(&self, _question: &str) -> Result<McpBotResponse> {
            Ok(McpBotResponse {
                answer: "Latest post is about Logfire".to_string(),
                reasoning: "navigated to the blog".to_string(),
                websites_accessed: vec!["https://pydantic.dev/articles".to_string()],
                confidence_percentage: 75,
            })
        }
    }

    fn app() -> Router {
        let state = AppState::new(
            Arc::new(MemoryItemStore::new()),
            Arc::new(StubDocs),
            Arc::new(StubBrowser),
        )
        .with_max_page_size(3);
        router(state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = send(app, request).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(&app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_divide() {
        let app = app();

        let (status, body) = get(&app, "/divide/10/4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"result": 2.5}));

        let (status, body) = get(&app, "/divide/1/0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "Division by zero"}));

        let (status, body) = get(&app, "/divide/ten/2").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_fibonacci() {
        let app = app();

        let (status, body) = get(&app, "/fibonacci/10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"result": 55}));

        let (status, body) = get(&app, "/fibonacci/-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Input must be a non-negative integer");

        let (status, _) = get(&app, "/fibonacci/187").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(&app, "/fibonacci/1.5").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_fibonacci_beyond_u64() {
        let request = Request::get("/fibonacci/186").body(Body::empty()).unwrap();
        let (status, body) = send(&app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"result":332825110087067562321196029789634457848}"#);
    }

    #[tokio::test]
    async fn test_item_lifecycle() {
        let app = app();

        let (status, created) = post_json(
            &app,
            "/items/",
            json!({"name": "Widget", "description": "A useful widget"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["name"], "Widget");
        let id = created["id"].as_i64().unwrap();

        let (status, fetched) = get(&app, &format!("/items/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, body) = get(&app, "/items/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Item not found"}));

        let (status, _) = get(&app, "/items/abc").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_list_items_pagination() {
        let app = app();
        for i in 0..5 {
            let (status, _) = post_json(
                &app,
                "/items",
                json!({"name": format!("item-{}", i), "description": "d"}),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = get(&app, "/items/?skip=1&limit=2").await;
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["item-1", "item-2"]);

        // limit is clamped to max_page_size
        let (_, body) = get(&app, "/items?limit=50").await;
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (status, _) = get(&app, "/items/?skip=-1").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_create_item_invalid_body() {
        let (status, body) = post_json(&app(), "/items/", json!({"name": "missing description"})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_agent_query() {
        let app = app();

        let (status, body) =
            post_json(&app, "/agent/query", json!({"question": "How do I create an agent?"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "You asked: How do I create an agent?");
        assert_eq!(body["confidence_percentage"], 90);

        let (status, body) = post_json(&app, "/agent/query", json!({"question": "  "})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "Question must not be empty");

        let (status, body) = post_json(&app, "/agent/query", json!({"question": "fail"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Agent error: model unavailable");
    }

    #[tokio::test]
    async fn test_mcp_query() {
        let (status, body) =
            post_json(&app(), "/mcp/query", json!({"question": "Latest pydantic blog post?"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["websites_accessed"][0], "https://pydantic.dev/articles");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = get(&app(), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Not Found"}));
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let app = app();

        let request = Request::delete("/items/1").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({"detail": "Method Not Allowed"}));

        let request = Request::get("/agent/query").body(Body::empty()).unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
