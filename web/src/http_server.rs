use crate::config::WebSettings;
use crate::frontend::{Badge, TurnView, WebFrontend};
use crate::session::{DisplayMessage, SessionStoreError, SessionStoreRef};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use memchat_core::{ConversationEngine, MemoryPolicy, SessionContext};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

const INDEX_HTML: &str = include_str!("../static/index.html");
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared with all routes
#[derive(Clone)]
pub struct AppState {
    engine: Arc<ConversationEngine>,
    sessions: SessionStoreRef,
    settings: Arc<WebSettings>,
}

impl AppState {
    pub fn new(engine: ConversationEngine, sessions: SessionStoreRef, settings: WebSettings) -> Self {
        Self {
            engine: Arc::new(engine),
            sessions,
            settings: Arc::new(settings),
        }
    }
}

#[derive(Deserialize)]
pub struct MessageRequest {
    content: String,
    /// Overrides the session's "Smart memory" toggle from this turn on
    #[serde(default)]
    auto_memory: Option<bool>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    reply: String,
    badges: Vec<Badge>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    session_id: String,
    user_id: String,
    auto_memory: bool,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct InfoResponse {
    user_id: String,
    model: String,
    auto_memory: bool,
}

#[derive(Serialize)]
pub struct TranscriptResponse {
    messages: Vec<DisplayMessage>,
    auto_memory: bool,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Error type for HTTP server
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// The chat provider failed; nothing was recorded
    Upstream(String),
    InternalError(anyhow::Error),
}

impl From<SessionStoreError> for ApiError {
    fn from(e: SessionStoreError) -> Self {
        match e {
            SessionStoreError::NotFound(_) => Self::NotFound(e.to_string()),
            SessionStoreError::StorageError(_) => Self::InternalError(anyhow::anyhow!(e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Upstream(msg) => {
                warn!(error = %msg, "Chat provider failed");
                (StatusCode::BAD_GATEWAY, msg)
            }
            Self::InternalError(e) => {
                error!(error = %e, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal server error: {}", e),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

fn policy_for(auto_memory: bool) -> MemoryPolicy {
    if auto_memory {
        MemoryPolicy::Automatic
    } else {
        MemoryPolicy::Disabled
    }
}

/// Build the router; split out of `run_server` so it can be driven without a socket
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/info", get(info))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", delete(delete_session))
        .route(
            "/api/sessions/:id/messages",
            get(list_messages).post(post_message).delete(clear_messages),
        )
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server and the idle-session sweeper
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.settings.bind_addr;
    info!("Starting HTTP server on {}", addr);

    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = sessions.cleanup_expired_sessions().await {
                warn!(error = %e, "Session sweep failed");
            }
        }
    });

    axum::Server::bind(&addr)
        .serve(build_router(state).into_make_service())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start HTTP server: {}", e))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check handler
async fn health() -> impl IntoResponse {
    "memchat is running"
}

async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        user_id: state.settings.user_id.clone(),
        model: state.engine.model_name().to_string(),
        auto_memory: state.settings.auto_memory,
    })
}

async fn create_session(State(state): State<AppState>) -> Result<Json<SessionResponse>, ApiError> {
    let context = SessionContext::new(
        state.settings.user_id.clone(),
        policy_for(state.settings.auto_memory),
    );
    let handle = state.sessions.create_session(context).await?;
    let session = handle.lock().await;
    info!(session_id = %session.id, "Session created");

    Ok(Json(SessionResponse {
        session_id: session.id.clone(),
        user_id: session.context.user_id.clone(),
        auto_memory: session.context.memory_policy == MemoryPolicy::Automatic,
        created_at: session.created_at,
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.delete_session(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let handle = state.sessions.get_session(&id).await?;
    let session = handle.lock().await;
    Ok(Json(TranscriptResponse {
        messages: session.transcript.clone(),
        auto_memory: session.context.memory_policy == MemoryPolicy::Automatic,
        created_at: session.created_at,
    }))
}

async fn clear_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let handle = state.sessions.get_session(&id).await?;
    handle.lock().await.clear();
    info!(session_id = %id, "Chat cleared");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for chat messages: runs one turn against the session
async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(ApiError::BadRequest("Please enter a message.".to_string()));
    }

    let handle = state.sessions.get_session(&id).await?;
    let mut session = handle.lock().await;
    if let Some(auto_memory) = payload.auto_memory {
        session.context.memory_policy = policy_for(auto_memory);
    }

    let mut frontend = WebFrontend::new(content);
    state
        .engine
        .run_conversation(&mut session.context, &mut frontend)
        .await
        .map_err(ApiError::InternalError)?;

    match frontend.into_view() {
        TurnView::Reply { reply, badges } => {
            session.record_exchange(content, &reply, badges.clone());
            Ok(Json(MessageResponse { reply, badges }))
        }
        TurnView::Failed(message) => Err(ApiError::Upstream(message)),
        TurnView::Empty => Err(ApiError::BadRequest("Please enter a message.".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use memchat_core::errors::{CoreError, CoreResult};
    use memchat_core::types::{ChatMessage, GenerationOptions};
    use memchat_core::{ChatProvider, MemoryItem, MemoryProvider};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Replies with a fixed message; answers classifier calls with `verdict`
    struct StubChat {
        reply: Option<String>,
        verdict: &'static str,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl ChatProvider for StubChat {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            options: GenerationOptions,
        ) -> CoreResult<String> {
            if options == GenerationOptions::VERDICT {
                return Ok(self.verdict.to_string());
            }
            self.seen.lock().unwrap().push(messages.to_vec());
            self.reply
                .clone()
                .ok_or_else(|| CoreError::RequestError("service unavailable".to_string()))
        }

        fn model_name(&self) -> &str {
            "stub-model"
        }
    }

    #[derive(Default)]
    struct StubMemory {
        stored: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl MemoryProvider for StubMemory {
        async fn search(&self, _query: &str, _user_id: &str) -> anyhow::Result<Vec<MemoryItem>> {
            Ok(vec![MemoryItem::text("Prefers dark mode")])
        }

        async fn add(&self, messages: &[ChatMessage], _user_id: &str) -> anyhow::Result<()> {
            self.stored.lock().unwrap().push(messages.to_vec());
            Ok(())
        }
    }

    struct Harness {
        app: Router,
        chat: Arc<StubChat>,
        memory: Arc<StubMemory>,
    }

    fn harness(reply: Option<&str>, verdict: &'static str) -> Harness {
        let chat = Arc::new(StubChat {
            reply: reply.map(str::to_string),
            verdict,
            seen: Mutex::new(Vec::new()),
        });
        let memory = Arc::new(StubMemory::default());
        let engine = ConversationEngine::new(chat.clone(), memory.clone());
        let settings = WebSettings {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            session_ttl: chrono::Duration::minutes(5),
            user_id: "abdullah_01".to_string(),
            auto_memory: true,
        };
        let sessions: SessionStoreRef = Arc::new(InMemorySessionStore::new(settings.session_ttl));
        Harness {
            app: build_router(AppState::new(engine, sessions, settings)),
            chat,
            memory,
        }
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = call(app, Method::POST, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_index_and_info() {
        let h = harness(Some("hi"), "SKIP");
        let response = h
            .app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, body) = call(&h.app, Method::GET, "/api/info", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"user_id": "abdullah_01", "model": "stub-model", "auto_memory": true}));
    }

    #[tokio::test]
    async fn test_session_reports_creation_time() {
        let h = harness(Some("ok"), "SKIP");
        let before = Utc::now();
        let (status, created) = call(&h.app, Method::POST, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["user_id"], "abdullah_01");
        assert_eq!(created["auto_memory"], true);

        let created_at: DateTime<Utc> = created["created_at"].as_str().unwrap().parse().unwrap();
        assert!(created_at >= before && created_at <= Utc::now());

        let id = created["session_id"].as_str().unwrap();
        let (_, transcript) =
            call(&h.app, Method::GET, &format!("/api/sessions/{}/messages", id), None).await;
        assert_eq!(transcript["created_at"], created["created_at"]);
    }

    #[tokio::test]
    async fn test_message_round_trip_with_badges() {
        let h = harness(Some("Dark mode is easy on the eyes."), "SAVE");
        let id = new_session(&h.app).await;

        let (status, body) = call(
            &h.app,
            Method::POST,
            &format!("/api/sessions/{}/messages", id),
            Some(json!({"content": "  I prefer dark mode  "})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Dark mode is easy on the eyes.");
        assert_eq!(
            body["badges"],
            json!([{"kind": "memories_found", "count": 1}, {"kind": "memory_saved"}])
        );

        let seen = h.chat.seen.lock().unwrap();
        assert!(seen[0][0].content.contains("Prefers dark mode"));
        drop(seen);
        assert_eq!(h.memory.stored.lock().unwrap()[0][0].content, "I prefer dark mode");

        let (_, transcript) =
            call(&h.app, Method::GET, &format!("/api/sessions/{}/messages", id), None).await;
        let messages = transcript["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "I prefer dark mode");
        assert_eq!(messages[1]["role"], "assistant");
    }

    #[tokio::test]
    async fn test_toggle_off_disables_storage() {
        let h = harness(Some("ok"), "SAVE");
        let id = new_session(&h.app).await;

        let (status, body) = call(
            &h.app,
            Method::POST,
            &format!("/api/sessions/{}/messages", id),
            Some(json!({"content": "remember my name is Sam", "auto_memory": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["badges"], json!([{"kind": "memories_found", "count": 1}]));
        assert!(h.memory.stored.lock().unwrap().is_empty());

        let (_, transcript) =
            call(&h.app, Method::GET, &format!("/api/sessions/{}/messages", id), None).await;
        assert_eq!(transcript["auto_memory"], false);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let h = harness(Some("ok"), "SKIP");
        let id = new_session(&h.app).await;

        let (status, body) = call(
            &h.app,
            Method::POST,
            &format!("/api/sessions/{}/messages", id),
            Some(json!({"content": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert!(h.chat.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let h = harness(Some("ok"), "SKIP");
        let (status, _) = call(
            &h.app,
            Method::POST,
            "/api/sessions/nope/messages",
            Some(json!({"content": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_completion_failure_records_nothing() {
        let h = harness(None, "SAVE");
        let id = new_session(&h.app).await;
        let uri = format!("/api/sessions/{}/messages", id);

        let (status, body) = call(&h.app, Method::POST, &uri, Some(json!({"content": "hello"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("service unavailable"));

        let (_, transcript) = call(&h.app, Method::GET, &uri, None).await;
        assert_eq!(transcript["messages"], json!([]));
        assert!(h.memory.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_and_delete() {
        let h = harness(Some("ok"), "SKIP");
        let id = new_session(&h.app).await;
        let uri = format!("/api/sessions/{}/messages", id);

        call(&h.app, Method::POST, &uri, Some(json!({"content": "hello"}))).await;
        let (status, _) = call(&h.app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, transcript) = call(&h.app, Method::GET, &uri, None).await;
        assert_eq!(transcript["messages"], json!([]));

        // Cleared history means the next turn carries only the system message and the new input
        call(&h.app, Method::POST, &uri, Some(json!({"content": "again"}))).await;
        assert_eq!(h.chat.seen.lock().unwrap()[1].len(), 2);

        let (status, _) = call(&h.app, Method::DELETE, &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&h.app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
