pub mod controller;
pub mod state;

pub use controller::{InterviewController, SKIP_ANSWER};
pub use state::{
    InterviewSession, InterviewSnapshot, InterviewStatus, Question, QuestionType, ResponseRecord,
};
