//! HTTP API handlers for hplan-planner
//!
//! - `ui`: server-rendered pages and form actions
//! - `sessions`: JSON snapshot/action API
//! - `health`: liveness and diagnostics

pub mod health;
pub mod sessions;
pub mod ui;

pub use health::health_routes;
pub use sessions::session_routes;
pub use ui::ui_routes;

use crate::workflow::registry::SharedSession;
use crate::{ApiError, ApiResult, AppState};
use uuid::Uuid;

/// Look up a session or fail with 404
pub(crate) async fn find_session(state: &AppState, session_id: Uuid) -> ApiResult<SharedSession> {
    state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| ApiError::session_not_found(session_id))
}
