pub mod client;
pub mod types;

pub use client::{GatewayError, HttpGateway, InterviewGateway};
pub use types::{
    GenerateQuestionsRequest, InterviewResults, QuestionFetch, QuestionPlan, QuestionWire,
    ResultEntry, SessionCreated, SubmitOutcome, SubmitRequest, TypeFeedback,
};
