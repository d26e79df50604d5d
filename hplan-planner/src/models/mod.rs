//! Data model for the planner core
//!
//! - `survey`: fixed questionnaire, ratings and the ranking view
//! - `plot`: land plot inputs plus the resolved geocode

pub mod plot;
pub mod survey;

pub use plot::PlotRecord;
pub use survey::{
    find_question, Bucket, PreferenceSurvey, Question, Rating, SurveyAnswer, QUESTIONS,
};
