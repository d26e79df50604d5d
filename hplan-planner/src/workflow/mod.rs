//! Session workflow state machine
//!
//! A session moves through three states:
//!
//! ```text
//! ENTERING --request_summary--> SUMMARIZED --confirm--> CONFIRMED
//!     ^                             |                       |
//!     +-------- any input edit -----+                       |
//!     +------------------------ reset ----------------------+
//! ```
//!
//! The machine is permissive: neither summary nor confirmation require a
//! complete survey or a non-empty address. There is no terminal state.
//! Reset only clears the view state; plot and survey inputs are kept so the
//! user can confirm again without re-entering anything.

pub mod registry;

pub use registry::SessionRegistry;

use crate::geocode::{GeocodeCache, GeocodeStatus};
use crate::models::{Bucket, PlotRecord, PreferenceSurvey, Rating, QUESTIONS};
use chrono::{DateTime, Utc};
use hplan_common::{time, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

/// Workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    /// Inputs are being edited
    Entering,
    /// Summary is shown
    Summarized,
    /// Summary confirmed, model view unlocked
    Confirmed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Entering => "ENTERING",
            SessionState::Summarized => "SUMMARIZED",
            SessionState::Confirmed => "CONFIRMED",
        };
        f.write_str(name)
    }
}

/// State transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub old_state: SessionState,
    pub new_state: SessionState,
    pub transitioned_at: DateTime<Utc>,
}

/// Discrete user action, as accepted from the presentation layer
///
/// Numeric fields accept any integer; `apply` range-checks them and reports
/// `InvalidInput`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionAction {
    EditSize { size_square_meters: i64 },
    EditAddress { address: String },
    SetRating { question_id: i64, rating: i64 },
    RequestSummary,
    Confirm,
    Reset,
}

impl SessionAction {
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::EditSize { .. } => "edit_size",
            SessionAction::EditAddress { .. } => "edit_address",
            SessionAction::SetRating { .. } => "set_rating",
            SessionAction::RequestSummary => "request_summary",
            SessionAction::Confirm => "confirm",
            SessionAction::Reset => "reset",
        }
    }
}

/// One user's planning session
#[derive(Debug, Clone)]
pub struct SessionWorkflow {
    session_id: Uuid,
    state: SessionState,
    plot: PlotRecord,
    survey: PreferenceSurvey,
    created_at: DateTime<Utc>,
    last_transition: Option<StateTransition>,
}

impl SessionWorkflow {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(session_id: Uuid) -> Self {
        Self {
            session_id,
            state: SessionState::Entering,
            plot: PlotRecord::new(),
            survey: PreferenceSurvey::new(),
            created_at: time::now(),
            last_transition: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn plot(&self) -> &PlotRecord {
        &self.plot
    }

    pub fn survey(&self) -> &PreferenceSurvey {
        &self.survey
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_transition(&self) -> Option<&StateTransition> {
        self.last_transition.as_ref()
    }

    pub fn summary_visible(&self) -> bool {
        matches!(self.state, SessionState::Summarized | SessionState::Confirmed)
    }

    pub fn model_unlocked(&self) -> bool {
        self.state == SessionState::Confirmed
    }

    fn transition_to(&mut self, new_state: SessionState) -> Option<StateTransition> {
        if new_state == self.state {
            return None;
        }

        let transition = StateTransition {
            session_id: self.session_id,
            old_state: self.state,
            new_state,
            transitioned_at: time::now(),
        };
        info!(
            session_id = %self.session_id,
            from = %transition.old_state,
            to = %transition.new_state,
            "Session state transition"
        );

        self.state = new_state;
        self.last_transition = Some(transition.clone());
        Some(transition)
    }

    /// Any input edit hides summary and model view again
    fn after_edit(&mut self) -> Option<StateTransition> {
        self.transition_to(SessionState::Entering)
    }

    pub fn edit_size(&mut self, size_square_meters: u32) -> Option<StateTransition> {
        self.plot.set_size(size_square_meters);
        self.after_edit()
    }

    pub fn edit_address(&mut self, address: impl Into<String>) -> Option<StateTransition> {
        if self.plot.set_address(address) {
            debug!(session_id = %self.session_id, "Address changed, geocode invalidated");
        }
        self.after_edit()
    }

    /// Record a rating; unknown questions and out-of-range ratings are rejected
    /// and leave both data and state untouched
    pub fn set_rating(&mut self, question_id: u32, rating: u8) -> Result<Option<StateTransition>> {
        self.survey.set_rating(question_id, rating)?;
        Ok(self.after_edit())
    }

    /// Show the summary, even for a partially answered survey
    pub fn request_summary(&mut self) -> Result<Option<StateTransition>> {
        match self.state {
            SessionState::Entering => Ok(self.transition_to(SessionState::Summarized)),
            SessionState::Summarized => Ok(None),
            SessionState::Confirmed => Err(Error::invalid_transition(self.state, "request_summary")),
        }
    }

    /// Confirm the summary; geocodes the address first if it has not been
    /// resolved yet and is non-empty
    pub async fn confirm(&mut self, cache: &GeocodeCache) -> Result<StateTransition> {
        if self.state != SessionState::Summarized {
            return Err(Error::invalid_transition(self.state, "confirm"));
        }

        if self.plot.needs_geocode() {
            let address = self.plot.address_text.clone();
            let result = cache.lookup(&address).await?;
            if result.status() != GeocodeStatus::Resolved {
                debug!(
                    session_id = %self.session_id,
                    status = ?result.status(),
                    "Confirming without coordinates"
                );
            }
            self.plot.set_geocode(result);
        }

        self.transition_to(SessionState::Confirmed)
            .ok_or_else(|| Error::Internal("confirm did not change state".to_string()))
    }

    /// Return to data entry; inputs are kept
    pub fn reset(&mut self) -> Option<StateTransition> {
        self.transition_to(SessionState::Entering)
    }

    /// Dispatch a discrete action
    pub async fn apply(
        &mut self,
        action: SessionAction,
        cache: &GeocodeCache,
    ) -> Result<Option<StateTransition>> {
        match action {
            SessionAction::EditSize { size_square_meters } => {
                let size = u32::try_from(size_square_meters).map_err(|_| {
                    Error::InvalidInput(format!(
                        "Plot size must be a non-negative whole number, got {}",
                        size_square_meters
                    ))
                })?;
                Ok(self.edit_size(size))
            }
            SessionAction::EditAddress { address } => Ok(self.edit_address(address)),
            SessionAction::SetRating {
                question_id,
                rating,
            } => {
                let question_id = u32::try_from(question_id).map_err(|_| {
                    Error::InvalidInput(format!("Unknown question id: {}", question_id))
                })?;
                let rating = u8::try_from(rating).map_err(|_| {
                    Error::InvalidInput(format!(
                        "Rating must be between {} and {}, got {}",
                        Rating::MIN,
                        Rating::MAX,
                        rating
                    ))
                })?;
                self.set_rating(question_id, rating)
            }
            SessionAction::RequestSummary => self.request_summary(),
            SessionAction::Confirm => self.confirm(cache).await.map(Some),
            SessionAction::Reset => Ok(self.reset()),
        }
    }

    /// Read-only view for presentation and the JSON API
    pub fn snapshot(&self) -> SessionSnapshot {
        let ranked_answers = self
            .survey
            .ranked_answers()
            .into_iter()
            .map(|answer| RankedAnswerView {
                question_id: answer.question.id,
                question: answer.question.text.to_string(),
                rating: answer.rating.value(),
                label: answer.rating.label().to_string(),
                bucket: answer.rating.bucket(),
            })
            .collect();

        SessionSnapshot {
            session_id: self.session_id,
            state: self.state,
            summary_visible: self.summary_visible(),
            model_unlocked: self.model_unlocked(),
            plot: self.plot.clone(),
            geocode_status: self.plot.geocode.as_ref().map(|g| g.status()),
            answered_count: self.survey.answered_count(),
            question_count: QUESTIONS.len(),
            is_complete: self.survey.is_complete(),
            ranked_answers,
        }
    }
}

impl Default for SessionWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

/// One line of the ranked summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedAnswerView {
    pub question_id: u32,
    pub question: String,
    pub rating: u8,
    pub label: String,
    pub bucket: Bucket,
}

/// Serializable view of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: SessionState,
    pub summary_visible: bool,
    pub model_unlocked: bool,
    pub plot: PlotRecord,
    pub geocode_status: Option<GeocodeStatus>,
    pub answered_count: usize,
    pub question_count: usize,
    pub is_complete: bool,
    pub ranked_answers: Vec<RankedAnswerView>,
}
