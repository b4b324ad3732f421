use crate::interview::{Question, QuestionType};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Response to a resume upload: the backend creates the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub question_count: u32,
}

/// Request body for the pre-extracted-resume bootstrap flow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateQuestionsRequest {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
}

/// Response to the question-generation flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionPlan {
    pub total_questions: u32,

    /// Some deployments issue the session token here as well
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Wire shape of GET /get-question
///
/// The exhaustion sentinel is a placeholder question body without a
/// `question_index`; typed on that absence rather than on the sentinel
/// prose.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionWire {
    pub question: String,
    #[serde(default)]
    pub question_type: Option<QuestionType>,
    #[serde(default)]
    pub question_index: Option<u32>,
    #[serde(default)]
    pub remaining: u32,
}

/// Typed outcome of a question fetch
#[derive(Debug, Clone)]
pub enum QuestionFetch {
    Question(Question),
    Exhausted,
}

impl From<QuestionWire> for QuestionFetch {
    fn from(wire: QuestionWire) -> Self {
        match wire.question_index {
            Some(index) => QuestionFetch::Question(Question {
                text: wire.question,
                question_type: wire.question_type.unwrap_or(QuestionType::General),
                index,
                remaining: wire.remaining,
            }),
            None => QuestionFetch::Exhausted,
        }
    }
}

/// Request body for POST /submit-response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub response: String,
}

/// Outcome of a response submission
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitOutcome {
    /// 0-10 score; the backend may emit a number or a numeric string
    #[serde(deserialize_with = "de_score")]
    pub evaluation: f64,

    #[serde(default)]
    pub question_type: Option<QuestionType>,

    pub interview_complete: bool,
}

/// Final results for a completed (or abandoned) interview
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewResults {
    #[serde(default)]
    pub responses: Vec<ResultEntry>,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub answered_questions: u32,
    #[serde(default)]
    pub average_score: f64,
    #[serde(default)]
    pub feedback_by_type: Option<HashMap<String, TypeFeedback>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultEntry {
    pub question: String,
    pub answer: String,
    #[serde(deserialize_with = "de_score")]
    pub evaluation: f64,
    #[serde(default)]
    pub question_type: Option<QuestionType>,
}

/// Per-question-type aggregate in the results payload
#[derive(Debug, Clone, Deserialize)]
pub struct TypeFeedback {
    pub count: u32,
    #[serde(default)]
    pub total_score: f64,
    #[serde(default)]
    pub average_score: Option<f64>,
}

/// Accept a score as a JSON number or a numeric string
///
/// The backend stores raw evaluator output, so "7" and 7.0 both occur.
fn de_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("score out of f64 range")),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("non-numeric score: {s:?}"))),
        other => Err(D::Error::custom(format!(
            "expected a numeric score, got {other}"
        ))),
    }
}
