//! Presentation boundary
//!
//! The core hands read-only state to a `PresentationAdapter` and never looks
//! at what comes back. `HtmlRenderer` is the server-side HTML implementation
//! used by the web UI.

mod html;

pub use html::{escape_html, HtmlRenderer};

use crate::models::{PlotRecord, PreferenceSurvey, SurveyAnswer};
use crate::workflow::SessionWorkflow;

/// Renders core state; implementations must not mutate it
pub trait PresentationAdapter {
    /// Plot inputs and the questionnaire
    fn render_entry_form(&self, plot: &PlotRecord, survey: &PreferenceSurvey) -> String;

    /// Plot data plus answers in ranked order
    fn render_summary(&self, plot: &PlotRecord, ranked_answers: &[SurveyAnswer]) -> String;

    /// Static house model and purchase call-to-action
    fn render_model_view(&self) -> String;

    /// Map or status banner for the plot's geocode; empty when not looked up
    fn render_location(&self, plot: &PlotRecord) -> String;

    /// Compose the views that belong to the session's current state
    ///
    /// Until confirmation the entry form stays editable, with the summary
    /// below it once requested. A confirmed session shows the summary, the
    /// plot location and the model view.
    fn render_session(&self, session: &SessionWorkflow) -> String {
        let plot = session.plot();
        let survey = session.survey();

        if session.model_unlocked() {
            let mut out = self.render_summary(plot, &survey.ranked_answers());
            out.push_str(&self.render_location(plot));
            out.push_str(&self.render_model_view());
            return out;
        }

        let mut out = self.render_entry_form(plot, survey);
        if session.summary_visible() {
            out.push_str(&self.render_summary(plot, &survey.ranked_answers()));
        }
        out
    }
}
