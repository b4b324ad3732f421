pub mod config;
pub mod gateway;
pub mod interview;
pub mod speech;

pub use config::Config;
pub use gateway::{
    GatewayError, GenerateQuestionsRequest, HttpGateway, InterviewGateway, InterviewResults,
    QuestionFetch, QuestionPlan, SessionCreated, SubmitOutcome,
};
pub use interview::{
    InterviewController, InterviewSession, InterviewSnapshot, InterviewStatus, Question,
    QuestionType, ResponseRecord, SKIP_ANSWER,
};
pub use speech::{
    Accent, ConsoleSynthesis, EngineEvent, ListenState, RecognitionEngine, RecognitionSession,
    RecognitionUpdate, RecognizedSegment, SpeechError, SynthesisAdapter, SynthesisEngine,
    SynthesisOutcome, TranscriptSnapshot, Utterance, Voice,
};
