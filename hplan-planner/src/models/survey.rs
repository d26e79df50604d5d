//! Preference survey
//!
//! Ten fixed questions, each rated 1..=5 by importance. Answers are kept per
//! question id; the ranking view orders them by rating (highest first) and
//! keeps questionnaire order among equal ratings.

use hplan_common::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One questionnaire entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: u32,
    pub text: &'static str,
}

/// The questionnaire, in presentation order
pub const QUESTIONS: [Question; 10] = [
    Question {
        id: 1,
        text: "How important is it to you to have breakfast with sunshine at the window?",
    },
    Question {
        id: 2,
        text: "How important is a large, open living area to you?",
    },
    Question {
        id: 3,
        text: "How important is a separate study / home office to you?",
    },
    Question {
        id: 4,
        text: "How important is direct access to the terrace/garden from the living area?",
    },
    Question {
        id: 5,
        text: "How important is a modern, open kitchen to you?",
    },
    Question {
        id: 6,
        text: "How important is plenty of natural light in the rooms to you?",
    },
    Question {
        id: 7,
        text: "How important is privacy from the neighbours to you?",
    },
    Question {
        id: 8,
        text: "How important is a guest room to you?",
    },
    Question {
        id: 9,
        text: "How important is an energy-efficient construction to you?",
    },
    Question {
        id: 10,
        text: "How important is sufficient storage space to you?",
    },
];

/// Importance score, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validate a raw value; anything outside 1..=5 is rejected, never clamped
    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidInput(format!(
                "Rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Unimportant",
            2 => "Slightly important",
            3 => "Neutral",
            4 => "Important",
            _ => "Very important",
        }
    }

    pub fn bucket(self) -> Bucket {
        Bucket::of(self)
    }

    /// All valid ratings, ascending
    pub fn all() -> impl Iterator<Item = Rating> {
        (Self::MIN..=Self::MAX).map(Rating)
    }
}

impl TryFrom<u8> for Rating {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Rating::new(value)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.0, self.label())
    }
}

/// Coarse classification used for colouring the summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bucket {
    /// Rating 4 or 5
    High,
    /// Rating 3
    Neutral,
    /// Rating 1 or 2
    Low,
}

impl Bucket {
    pub fn of(rating: Rating) -> Self {
        match rating.value() {
            v if v >= 4 => Bucket::High,
            3 => Bucket::Neutral,
            _ => Bucket::Low,
        }
    }
}

/// A recorded rating for one question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SurveyAnswer {
    pub question: Question,
    pub rating: Rating,
}

/// Questionnaire answers for one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceSurvey {
    answers: BTreeMap<u32, SurveyAnswer>,
}

impl PreferenceSurvey {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed questionnaire
    pub fn questions(&self) -> &'static [Question] {
        &QUESTIONS
    }

    /// Upsert the rating for `question_id`
    pub fn set_rating(&mut self, question_id: u32, rating: u8) -> Result<()> {
        let question = find_question(question_id)?;
        let rating = Rating::new(rating)?;
        self.answers
            .insert(question_id, SurveyAnswer { question, rating });
        Ok(())
    }

    pub fn answer(&self, question_id: u32) -> Option<&SurveyAnswer> {
        self.answers.get(&question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// True once every question has an answer
    pub fn is_complete(&self) -> bool {
        QUESTIONS.iter().all(|q| self.answers.contains_key(&q.id))
    }

    /// Recorded answers, highest rating first; questionnaire order among equals
    pub fn ranked_answers(&self) -> Vec<SurveyAnswer> {
        let mut ranked: Vec<SurveyAnswer> = QUESTIONS
            .iter()
            .filter_map(|q| self.answers.get(&q.id).copied())
            .collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.rating.cmp(&a.rating));
        ranked
    }

    pub fn bucket(rating: Rating) -> Bucket {
        Bucket::of(rating)
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }
}

/// Look up a question by id
pub fn find_question(question_id: u32) -> Result<Question> {
    QUESTIONS
        .iter()
        .find(|q| q.id == question_id)
        .copied()
        .ok_or_else(|| Error::InvalidInput(format!("Unknown question id: {}", question_id)))
}
