//! JSON session API
//!
//! - POST   /api/sessions              → create session
//! - GET    /api/sessions/:id          → snapshot
//! - POST   /api/sessions/:id/actions  → apply one action, return snapshot
//! - DELETE /api/sessions/:id          → discard session
//! - GET    /api/questions             → questionnaire and rating scale

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::find_session;
use crate::models::{Bucket, Question, Rating, QUESTIONS};
use crate::workflow::{SessionAction, SessionSnapshot, StateTransition};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct CreatedSession {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    /// Present when the action changed the workflow state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<StateTransition>,
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct RatingScaleEntry {
    pub value: u8,
    pub label: &'static str,
    pub bucket: Bucket,
}

#[derive(Debug, Serialize)]
pub struct QuestionnaireResponse {
    pub questions: &'static [Question],
    pub ratings: Vec<RatingScaleEntry>,
}

/// POST /api/sessions
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreatedSession>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(CreatedSession { session_id }))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session = find_session(&state, session_id).await?;
    let snapshot = session.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// POST /api/sessions/:id/actions
pub async fn apply_action(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    payload: Result<Json<SessionAction>, JsonRejection>,
) -> ApiResult<Json<ActionResponse>> {
    let Json(action) = payload?;
    let session = find_session(&state, session_id).await?;
    let mut session = session.lock().await;

    info!(session_id = %session_id, action = action.name(), "Applying session action");
    let transition = session.apply(action, &state.geocode_cache).await?;

    Ok(Json(ActionResponse {
        transition,
        snapshot: session.snapshot(),
    }))
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.sessions.remove(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::session_not_found(session_id))
    }
}

/// GET /api/questions
pub async fn get_questionnaire() -> Json<QuestionnaireResponse> {
    let ratings = Rating::all()
        .map(|rating| RatingScaleEntry {
            value: rating.value(),
            label: rating.label(),
            bucket: rating.bucket(),
        })
        .collect();

    Json(QuestionnaireResponse {
        questions: &QUESTIONS,
        ratings,
    })
}

/// Build JSON session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/actions", post(apply_action))
        .route("/api/questions", get(get_questionnaire))
}
