//! HTTP server for the sign-in / sign-up flow.
//!
//! API endpoints:
//! - GET    /                         - Built-in page (or --static-dir files)
//! - GET    /api/identities           - {identities: [...]}
//! - POST   /api/verify               - {reference, challenge} base64 WAV -> result
//! - POST   /api/sessions             - {username} -> new session
//! - GET    /api/sessions/{id}        - session state
//! - POST   /api/sessions/{id}/sample - raw WAV body -> submission
//! - DELETE /api/sessions/{id}        - drop a session
//!
//! Sessions idle for longer than the session TTL are dropped, as are
//! sessions that hit the failed-attempt limit.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tower_http::services::ServeDir;
use uuid::Uuid;
use voicegate_identity::{
    AudioSample, IdentityError, IdentityStore, Session, SessionConfig, SessionState, Submission,
    Verifier,
};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Idle time after which a session is dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(15 * 60);

/// A session and the last time a request touched it.
struct SessionSlot {
    session: Session,
    last_used: Instant,
}

impl SessionSlot {
    fn new(session: Session) -> Self {
        Self {
            session,
            last_used: Instant::now(),
        }
    }

    fn expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_used) >= ttl
    }
}

type SessionMap = HashMap<Uuid, Arc<Mutex<SessionSlot>>>;

/// Drops idle sessions. Slots locked by an in-flight request are kept.
fn evict_expired(sessions: &mut SessionMap, ttl: Duration, now: Instant) -> usize {
    let before = sessions.len();
    sessions.retain(|_, slot| match slot.try_lock() {
        Ok(slot) => !slot.expired(ttl, now),
        Err(_) => true,
    });
    before - sessions.len()
}

/// Shared server state. The model inside `verifier` is loaded once.
#[derive(Clone)]
pub struct AppState {
    store: IdentityStore,
    verifier: Verifier,
    session_config: SessionConfig,
    session_ttl: Duration,
    sessions: Arc<RwLock<SessionMap>>,
}

impl AppState {
    pub fn new(store: IdentityStore, verifier: Verifier, session_config: SessionConfig) -> Self {
        Self {
            store,
            verifier,
            session_config,
            session_ttl: DEFAULT_SESSION_TTL,
            sessions: Arc::default(),
        }
    }

    /// Sets how long an untouched session survives.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Locks a live session and marks it used. Expired sessions are removed
    /// and reported as missing.
    async fn checkout(&self, id: Uuid) -> Result<OwnedMutexGuard<SessionSlot>, ApiError> {
        let slot = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| session_not_found(id))?;

        let mut slot = slot.lock_owned().await;
        let now = Instant::now();
        if slot.expired(self.session_ttl, now) {
            drop(slot);
            self.sessions.write().await.remove(&id);
            tracing::debug!(%id, "session expired");
            return Err(session_not_found(id));
        }
        slot.last_used = now;
        Ok(slot)
    }
}

fn session_not_found(id: Uuid) -> ApiError {
    ApiError::not_found(format!("session {id} not found"))
}

/// Error body: `{"error": "..."}`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        let status = match &e {
            IdentityError::NotFound(_) => StatusCode::NOT_FOUND,
            IdentityError::AlreadyRegistered(_) | IdentityError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            e if e.is_bad_input() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("worker failed: {e}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        } else {
            tracing::debug!(status = %self.status, error = %self.message, "request rejected");
        }
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    /// Base64 WAV.
    reference: String,
    /// Base64 WAV.
    challenge: String,
}

#[derive(Debug, Serialize)]
struct VerifyResponse {
    score: f32,
    same_speaker: bool,
    threshold: f32,
    message: &'static str,
}

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    username: String,
}

#[derive(Debug, Serialize)]
struct SessionView {
    id: Uuid,
    #[serde(flatten)]
    state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<String>,
}

impl SessionView {
    fn of(id: Uuid, session: &Session) -> Self {
        Self {
            id,
            state: session.state().clone(),
            redirect: session.redirect().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    #[serde(flatten)]
    session: SessionView,
    #[serde(flatten)]
    submission: Submission,
    message: &'static str,
}

/// Builds the router. `static_dir` replaces the built-in page.
pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/api/identities", get(list_identities))
        .route("/api/verify", post(verify))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/sample", post(submit_sample))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    // Serve static files or fallback to embedded
    match static_dir {
        Some(dir) if dir.exists() => {
            app = app.fallback_service(ServeDir::new(dir));
        }
        Some(dir) => {
            tracing::warn!(dir = %dir.display(), "static dir not found, serving built-in page");
            app = app.route("/", get(fallback_index));
        }
        None => {
            app = app.route("/", get(fallback_index));
        }
    }
    app
}

/// Start the HTTP server and serve until the process exits.
pub async fn start_server(addr: &str, state: AppState, static_dir: Option<PathBuf>) -> Result<()> {
    let app = router(state, static_dir);
    let addr = parse_addr(addr)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "voicegate listening");
    println!("Server started at http://{}", addr);
    println!("  - GET  /                   Web UI");
    println!("  - GET  /api/identities     Registered usernames");
    println!("  - POST /api/verify         Compare two recordings");
    println!("  - POST /api/sessions       Start sign-in / sign-up");
    println!();

    axum::serve(listener, app).await?;
    Ok(())
}

/// Parse address string to SocketAddr.
fn parse_addr(addr: &str) -> Result<SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    Ok(addr.parse()?)
}

/// Fallback index page when no static dir is provided.
async fn fallback_index() -> impl IntoResponse {
    Html(FALLBACK_HTML)
}

async fn list_identities(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let directory = tokio::task::spawn_blocking(move || store.directory()).await?;
    let identities: Vec<&str> = directory.iter().collect();
    Ok(Json(serde_json::json!({ "identities": identities })))
}

async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let decode = |field: &str, value: &str| {
        BASE64
            .decode(value.trim())
            .map(AudioSample::Bytes)
            .map_err(|e| ApiError::bad_request(format!("{field}: invalid base64: {e}")))
    };
    let reference = decode("reference", &req.reference)?;
    let challenge = decode("challenge", &req.challenge)?;

    let verifier = state.verifier.clone();
    let result =
        tokio::task::spawn_blocking(move || verifier.verify(&reference, &challenge)).await??;

    Ok(Json(VerifyResponse {
        score: result.score,
        same_speaker: result.same_speaker,
        threshold: result.threshold,
        message: result.outcome().message(),
    }))
}

async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let directory = tokio::task::spawn_blocking(move || store.directory()).await?;

    let mut session = Session::new(directory, state.session_config.clone());
    session.begin(&req.username)?;

    let id = Uuid::new_v4();
    let view = SessionView::of(id, &session);
    {
        let mut sessions = state.sessions.write().await;
        let evicted = evict_expired(&mut sessions, state.session_ttl, Instant::now());
        if evicted > 0 {
            tracing::debug!(evicted, "dropped idle sessions");
        }
        sessions.insert(id, Arc::new(Mutex::new(SessionSlot::new(session))));
    }

    tracing::info!(%id, state = view.state.name(), "session started");
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let slot = state.checkout(id).await?;
    Ok(Json(SessionView::of(id, &slot.session)))
}

async fn submit_sample(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<SubmitResponse>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("empty request body"));
    }
    let mut slot = state.checkout(id).await?;
    let store = state.store.clone();
    let verifier = state.verifier.clone();
    let sample = AudioSample::Bytes(body.to_vec());

    let (submission, view) = tokio::task::spawn_blocking(move || {
        let submission = slot.session.submit(&sample, &store, &verifier)?;
        Ok::<_, IdentityError>((submission, SessionView::of(id, &slot.session)))
    })
    .await??;

    tracing::info!(
        %id,
        outcome = ?submission.outcome,
        state = view.state.name(),
        "sample submitted"
    );
    if submission.locked_out {
        state.sessions.write().await.remove(&id);
        tracing::info!(%id, "session dropped after too many failed attempts");
    }
    let message = submission.message();
    Ok(Json(SubmitResponse {
        session: view,
        submission,
        message,
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.sessions.write().await.remove(&id) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(session_not_found(id)),
    }
}

const FALLBACK_HTML: &str = include_str!("index.html");
