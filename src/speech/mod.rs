pub mod console;
pub mod engine;
pub mod recognition;
pub mod synthesis;

pub use console::ConsoleSynthesis;
pub use engine::{
    Accent, EngineEvent, RecognitionEngine, RecognizedSegment, SpeechError, SynthesisEngine,
    SynthesisOutcome, Utterance, Voice,
};
pub use recognition::{ListenState, RecognitionSession, RecognitionUpdate, TranscriptSnapshot};
pub use synthesis::SynthesisAdapter;
