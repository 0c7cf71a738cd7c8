//! HTTP API for the writing surface.
//!
//! - `GET /api/google-docs`: recent documents
//! - `POST /api/google-docs`: create, list tabs, or fetch as Markdown
//! - `PUT /api/google-docs`: replace a document's content with Markdown
//! - `GET /api/stats`: writing statistics and today's goal progress
//!
//! Every route expects `Authorization: Bearer <token>`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::get,
};
use docs_gateway::{Credential, DocsApi, Gateway, GatewayError};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::signal;
use tower_http::trace::TraceLayer;
use word_ledger::{GoalProgress, GoalStore, SessionStore, current_goal, writing_stats};

/// Shared application state
pub struct AppState {
    pub gateway: Gateway<Arc<dyn DocsApi>>,
    pub sessions: Arc<dyn SessionStore>,
    pub goals: Arc<dyn GoalStore>,
    /// Whose statistics `/api/stats` reports
    pub user_id: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/google-docs",
            get(list_documents).post(document_action).put(update_document),
        )
        .route("/api/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, bind: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Serving API on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// JSON error response: `{ "error": message }`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Map a gateway failure. `upstream_message` is what the caller sees
    /// when the remote service itself failed.
    fn from_gateway(err: GatewayError, upstream_message: &str) -> Self {
        match err {
            GatewayError::Unauthorized => Self::unauthorized(),
            GatewayError::NotFound(what) => {
                tracing::debug!("Not found: {}", what);
                Self::new(StatusCode::NOT_FOUND, "Could not load document")
            }
            GatewayError::Validation { message, .. } => Self::bad_request(message),
            GatewayError::Upstream { status, message } => {
                tracing::error!("Upstream error ({}): {}", status, message);
                Self::new(StatusCode::BAD_GATEWAY, upstream_message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// The caller's bearer token
pub struct Bearer(pub Credential);

impl<S: Send + Sync> FromRequestParts<S> for Bearer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                tracing::debug!("Missing or malformed Authorization header");
                ApiError::unauthorized()
            })?;

        Ok(Bearer(Credential::bearer(token)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentAction {
    action: Option<String>,
    title: Option<Value>,
    document_id: Option<String>,
    tab_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentUpdate {
    document_id: Option<String>,
    markdown: Option<Value>,
    tab_id: Option<String>,
}

async fn list_documents(
    State(state): State<Arc<AppState>>,
    Bearer(credential): Bearer,
) -> Result<Json<Value>, ApiError> {
    let docs = state
        .gateway
        .list_recent_documents(&credential)
        .await
        .map_err(|e| ApiError::from_gateway(e, "Failed to fetch documents"))?;
    Ok(Json(json!({ "docs": docs })))
}

async fn document_action(
    State(state): State<Arc<AppState>>,
    Bearer(credential): Bearer,
    Json(body): Json<DocumentAction>,
) -> Result<Json<Value>, ApiError> {
    let gateway_error =
        |e: GatewayError| ApiError::from_gateway(e, "Failed to process document request");
    let document_id = body.document_id.as_deref().unwrap_or_default();

    match body.action.as_deref() {
        Some("create") => {
            let title = body.title.as_ref().and_then(Value::as_str).unwrap_or_default();
            let doc = state
                .gateway
                .create_document(&credential, title)
                .await
                .map_err(gateway_error)?;
            Ok(Json(json!({ "doc": doc })))
        }
        Some("getTabs") => {
            let tabs = state
                .gateway
                .list_containers(&credential, document_id)
                .await
                .map_err(gateway_error)?;
            Ok(Json(json!({ "tabs": tabs })))
        }
        _ => {
            let markdown = state
                .gateway
                .fetch_as_markup(&credential, document_id, body.tab_id.as_deref())
                .await
                .map_err(gateway_error)?;
            Ok(Json(json!({ "markdown": markdown })))
        }
    }
}

async fn update_document(
    State(state): State<Arc<AppState>>,
    Bearer(credential): Bearer,
    Json(body): Json<DocumentUpdate>,
) -> Result<Json<Value>, ApiError> {
    let document_id = body
        .document_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Document ID is required"))?;
    let markdown = body
        .markdown
        .as_ref()
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::bad_request("Markdown content is required"))?;

    let outcome = state
        .gateway
        .replace_with_markup(&credential, document_id, markdown, body.tab_id.as_deref())
        .await
        .map_err(|e| ApiError::from_gateway(e, "Failed to update document"))?;
    Ok(Json(json!(outcome)))
}

async fn stats(
    State(state): State<Arc<AppState>>,
    Bearer(_credential): Bearer,
) -> Result<Json<Value>, ApiError> {
    let user_id = state.user_id.as_deref().ok_or_else(ApiError::unauthorized)?;
    let store_error = |e: word_ledger::StoreError| {
        tracing::error!("Failed to read ledger: {}", e);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load statistics")
    };

    let today = chrono::Local::now().date_naive();
    let sessions = state.sessions.get_all(user_id).await.map_err(store_error)?;
    let goals = state.goals.goals(user_id).await.map_err(store_error)?;

    let written_today = sessions
        .iter()
        .find(|s| s.date == today)
        .map_or(0, |s| s.word_count);
    let goal = current_goal(&goals, today);

    Ok(Json(json!({
        "stats": writing_stats(&sessions, today),
        "today": GoalProgress::for_day(goal, written_today, today),
        "goal": goal,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use docs_gateway::InMemoryDocsApi;
    use tower::ServiceExt;
    use word_ledger::{Goal, MemoryStore};

    struct Harness {
        api: Arc<InMemoryDocsApi>,
        store: Arc<MemoryStore>,
        app: Router,
    }

    fn harness(user_id: Option<&str>) -> Harness {
        let api = Arc::new(InMemoryDocsApi::new());
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState {
            gateway: Gateway::new(api.clone() as Arc<dyn DocsApi>),
            sessions: store.clone(),
            goals: store.clone(),
            user_id: user_id.map(str::to_string),
        });
        Harness {
            api,
            store,
            app: router(state),
        }
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer ya29.test");
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let h = harness(None);
        let request = Request::builder()
            .uri("/api/google-docs")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_list_documents() {
        let h = harness(None);
        h.api.add_document("First", "");
        h.api.add_document("Second", "");

        let (status, body) = send(&h.app, request("GET", "/api/google-docs", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["docs"].as_array().unwrap().len(), 2);
        assert_eq!(body["docs"][0]["name"], "Second");
    }

    #[tokio::test]
    async fn test_fetch_markdown_is_default_action() {
        let h = harness(None);
        let id = h.api.add_document("Doc", "# Title\n\nSome **bold** text");

        let (status, body) = send(
            &h.app,
            request("POST", "/api/google-docs", Some(json!({ "documentId": id }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["markdown"], "# Title\n\nSome **bold** text");
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let h = harness(None);

        let (status, body) = send(
            &h.app,
            request("POST", "/api/google-docs", Some(json!({ "action": "create", "title": 7 }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Document title is required");

        let (status, body) = send(
            &h.app,
            request(
                "POST",
                "/api/google-docs",
                Some(json!({ "action": "create", "title": "Morning pages" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["doc"]["name"], "Morning pages");
    }

    #[tokio::test]
    async fn test_get_tabs_requires_document_id() {
        let h = harness(None);

        let (status, body) = send(
            &h.app,
            request("POST", "/api/google-docs", Some(json!({ "action": "getTabs" }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Document ID is required");

        let id = h.api.add_document("Doc", "");
        h.api.add_tab(&id, None, "Notes", "").unwrap();
        let (status, body) = send(
            &h.app,
            request(
                "POST",
                "/api/google-docs",
                Some(json!({ "action": "getTabs", "documentId": id })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tabs"][1]["title"], "Notes");
        assert_eq!(body["tabs"][1]["nestingDepth"], 0);
    }

    #[tokio::test]
    async fn test_update_document() {
        let h = harness(None);
        let id = h.api.add_document("Doc", "old");

        let (status, body) = send(
            &h.app,
            request("PUT", "/api/google-docs", Some(json!({ "documentId": id }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Markdown content is required");

        let (status, body) = send(
            &h.app,
            request("PUT", "/api/google-docs", Some(json!({ "markdown": "x" }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Document ID is required");

        let (status, body) = send(
            &h.app,
            request(
                "PUT",
                "/api/google-docs",
                Some(json!({ "documentId": id, "markdown": "## New\n\nthree new words" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "wordCount": 4 }));
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let h = harness(None);

        let (status, body) = send(
            &h.app,
            request("POST", "/api/google-docs", Some(json!({ "documentId": "missing" }))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Could not load document");

        h.api.set_unavailable(true);
        let (status, body) = send(&h.app, request("GET", "/api/google-docs", None)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Failed to fetch documents");

        h.api.set_unavailable(false);
        h.api.accept_only("someone-else");
        let (status, _) = send(&h.app, request("GET", "/api/google-docs", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_stats() {
        let h = harness(Some("writer"));
        let today = chrono::Local::now().date_naive();
        let yesterday = today.pred_opt().unwrap();
        h.store.upsert("writer", yesterday, 300).await.unwrap();
        h.store.upsert("writer", today, 200).await.unwrap();
        let goal = Goal::new("writer", yesterday, today, 800).unwrap();
        h.store.save_goal(goal).await.unwrap();

        let (status, body) = send(&h.app, request("GET", "/api/stats", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["totalWords"], 500);
        assert_eq!(body["stats"]["currentStreak"], 2);
        assert_eq!(body["today"]["target"], 800);
        assert_eq!(body["today"]["remaining"], 600);
        assert_eq!(body["today"]["daysLeft"], 1);
        assert_eq!(body["goal"]["dailyWordTarget"], 800);
    }

    #[tokio::test]
    async fn test_stats_without_user() {
        let h = harness(None);
        let (status, _) = send(&h.app, request("GET", "/api/stats", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
