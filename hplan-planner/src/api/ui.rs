//! UI routes - server-rendered HTML pages
//!
//! Every form posts one user action; on success the browser is redirected
//! back to the session page (post/redirect/get). Rejected actions re-render
//! the page with a warning banner instead, leaving the session unchanged.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use super::find_session;
use crate::models::{find_question, Rating};
use crate::presentation::HtmlRenderer;
use crate::workflow::SessionWorkflow;
use crate::{ApiResult, AppState};
use hplan_common::Error;

/// What the user asked for after submitting the entry form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormIntent {
    Save,
    Summary,
}

/// Parsed entry form
///
/// Every field is validated while parsing, so applying a parsed form
/// cannot fail halfway through.
#[derive(Debug, Default)]
struct InputForm {
    size: Option<u32>,
    address: Option<String>,
    ratings: Vec<(u32, Rating)>,
    intent: Option<FormIntent>,
}

impl InputForm {
    fn parse(fields: &HashMap<String, String>) -> Result<Self, Error> {
        let mut form = InputForm::default();

        for (key, value) in fields {
            match key.as_str() {
                "size" => {
                    let value = value.trim();
                    if !value.is_empty() {
                        form.size = Some(value.parse::<u32>().map_err(|_| {
                            Error::InvalidInput(format!(
                                "Plot size must be a non-negative whole number, got '{}'",
                                value
                            ))
                        })?);
                    }
                }
                "address" => form.address = Some(value.clone()),
                "then" => {
                    form.intent = Some(match value.as_str() {
                        "summary" => FormIntent::Summary,
                        _ => FormIntent::Save,
                    })
                }
                other => {
                    if let Some(id) = other.strip_prefix('q') {
                        let question_id = id.parse::<u32>().map_err(|_| {
                            Error::InvalidInput(format!("Unknown form field '{}'", other))
                        })?;
                        find_question(question_id)?;
                        let raw = value.trim().parse::<u8>().map_err(|_| {
                            Error::InvalidInput(format!(
                                "Rating must be between {} and {}, got '{}'",
                                Rating::MIN,
                                Rating::MAX,
                                value.trim()
                            ))
                        })?;
                        form.ratings.push((question_id, Rating::new(raw)?));
                    } else {
                        debug!(field = %other, "Ignoring unknown form field");
                    }
                }
            }
        }

        form.ratings.sort_unstable();
        Ok(form)
    }

    /// Apply only the values that differ from the session, so an unchanged
    /// resubmission does not count as an edit
    fn apply(&self, session: &mut SessionWorkflow) -> Result<(), Error> {
        if let Some(size) = self.size {
            if size != session.plot().size_square_meters {
                session.edit_size(size);
            }
        }

        if let Some(address) = &self.address {
            if *address != session.plot().address_text {
                session.edit_address(address.clone());
            }
        }

        for &(question_id, rating) in &self.ratings {
            if current_rating(session, question_id) != Some(rating) {
                session.set_rating(question_id, rating.value())?;
            }
        }

        if self.intent == Some(FormIntent::Summary) {
            session.request_summary()?;
        }
        Ok(())
    }
}

fn current_rating(session: &SessionWorkflow, question_id: u32) -> Option<Rating> {
    session.survey().answer(question_id).map(|a| a.rating)
}

fn session_url(session_id: Uuid) -> String {
    format!("/session/{}", session_id)
}

/// Re-render the session page with a warning for a rejected action
fn rejected(state: &AppState, session: &SessionWorkflow, error: Error) -> Response {
    let status = match error {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::InvalidTransition { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(session_id = %session.session_id(), error = %error, "Action rejected");

    let renderer = HtmlRenderer::new(session.session_id(), &state.config.model);
    let html = renderer.render_page(session, Some(&error.to_string()));
    (status, Html(html)).into_response()
}

/// GET /
///
/// Starts a new session and sends the browser to it
pub async fn root_page(State(state): State<AppState>) -> Redirect {
    let session_id = state.sessions.create().await;
    Redirect::to(&session_url(session_id))
}

/// GET /session/:id
pub async fn session_page(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Html<String>> {
    let session = find_session(&state, session_id).await?;
    let session = session.lock().await;

    let renderer = HtmlRenderer::new(session_id, &state.config.model);
    Ok(Html(renderer.render_page(&session, None)))
}

/// POST /session/:id/inputs
pub async fn submit_inputs(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Form(fields): Form<HashMap<String, String>>,
) -> ApiResult<Response> {
    let session = find_session(&state, session_id).await?;
    let mut session = session.lock().await;

    let result = InputForm::parse(&fields).and_then(|form| form.apply(&mut session));
    Ok(match result {
        Ok(()) => Redirect::to(&session_url(session_id)).into_response(),
        Err(e) => rejected(&state, &session, e),
    })
}

/// POST /session/:id/summary
pub async fn request_summary(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Response> {
    let session = find_session(&state, session_id).await?;
    let mut session = session.lock().await;

    Ok(match session.request_summary() {
        Ok(_) => Redirect::to(&session_url(session_id)).into_response(),
        Err(e) => rejected(&state, &session, e),
    })
}

/// POST /session/:id/confirm
pub async fn confirm(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Response> {
    let session = find_session(&state, session_id).await?;
    let mut session = session.lock().await;

    Ok(match session.confirm(&state.geocode_cache).await {
        Ok(_) => Redirect::to(&session_url(session_id)).into_response(),
        Err(e) => rejected(&state, &session, e),
    })
}

/// POST /session/:id/reset
pub async fn reset(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Redirect> {
    let session = find_session(&state, session_id).await?;
    session.lock().await.reset();
    Ok(Redirect::to(&session_url(session_id)))
}

/// GET /session/:id/buy
///
/// Purchase stub: static text only, and only once the model is unlocked
pub async fn buy(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Response> {
    let session = find_session(&state, session_id).await?;
    let session = session.lock().await;

    if !session.model_unlocked() {
        return Ok(Redirect::to(&session_url(session_id)).into_response());
    }

    let renderer = HtmlRenderer::new(session_id, &state.config.model);
    Ok(Html(renderer.render_purchase_page()).into_response())
}

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_page))
        .route("/session/:id", get(session_page))
        .route("/session/:id/inputs", post(submit_inputs))
        .route("/session/:id/summary", post(request_summary))
        .route("/session/:id/confirm", post(confirm))
        .route("/session/:id/reset", post(reset))
        .route("/session/:id/buy", get(buy))
}
