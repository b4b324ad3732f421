use crate::speech::TranscriptSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Interview lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    /// No session; waiting for a resume/question bootstrap
    Idle,
    /// Session created, first question not yet fetched
    Preparing,
    /// A question is on screen and an answer is being collected
    Interviewing,
    /// An answer is on the wire
    Submitting,
    /// Every question has been answered
    Completed,
    /// Unrecoverable error; only `restart` leaves this state
    Failed,
}

/// Category tag the backend assigns to each question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Technical,
    Behavioral,
    Situational,
    Background,
    Motivation,
    General,
    #[serde(other)]
    Unknown,
}

/// One interview attempt, identified by a server-issued opaque token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    /// Required on every gateway call after creation
    pub session_id: String,

    /// Role the candidate is interviewing for
    pub role: String,
}

/// The question currently awaiting an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub question_type: QuestionType,

    /// 0-based position; strictly increasing within one session
    pub index: u32,

    /// Unfetched questions after this one; 0 on the last question
    pub remaining: u32,
}

/// A scored answer; records are appended in answer order and never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub question: String,
    pub answer: String,

    /// Server-assigned score on a 0-10 scale
    pub evaluation: f64,

    pub question_type: QuestionType,
    pub answered_at: DateTime<Utc>,
}

/// Point-in-time view of the interview, safe to take at any time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSnapshot {
    pub status: InterviewStatus,
    pub session: Option<InterviewSession>,
    pub question: Option<Question>,
    pub responses: Vec<ResponseRecord>,

    /// Latest transcript published by the recognition session
    pub transcript: TranscriptSnapshot,

    /// User-facing message for the Failed state
    pub error: Option<String>,

    /// Non-fatal guidance, e.g. after a recognition failure
    pub notice: Option<String>,
}
