use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Errors surfaced by the speech layer
#[derive(Debug, Error)]
pub enum SpeechError {
    /// No engine of the given kind exists in this environment
    #[error("no {0} engine is available in this environment")]
    EngineUnavailable(&'static str),

    /// A recognition session is already running; a second start was ignored
    #[error("recognition session is already listening")]
    AlreadyListening,

    /// The underlying engine failed
    #[error("speech engine failure: {0}")]
    Engine(String),

    /// The accent code is not in the supported set
    #[error("unsupported accent code: {0}")]
    UnsupportedAccent(String),
}

/// Recognition locales the session accepts for `set_accent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Accent {
    EnUs,
    EnGb,
    EnAu,
    EnIn,
    EnCa,
    EnNz,
}

impl Accent {
    /// Parse a BCP 47 locale tag; unknown tags are rejected
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en-US" => Some(Self::EnUs),
            "en-GB" => Some(Self::EnGb),
            "en-AU" => Some(Self::EnAu),
            "en-IN" => Some(Self::EnIn),
            "en-CA" => Some(Self::EnCa),
            "en-NZ" => Some(Self::EnNz),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::EnGb => "en-GB",
            Self::EnAu => "en-AU",
            Self::EnIn => "en-IN",
            Self::EnCa => "en-CA",
            Self::EnNz => "en-NZ",
        }
    }
}

impl Default for Accent {
    fn default() -> Self {
        Self::EnUs
    }
}

/// One unit of recognized speech reported by the engine
#[derive(Debug, Clone)]
pub struct RecognizedSegment {
    /// Recognized text, including any trailing space the engine emits
    pub text: String,

    /// Final segments are committed; interim segments may still be revised
    pub is_final: bool,
}

impl RecognizedSegment {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }
}

/// Events delivered by a running recognition engine
///
/// A `Result` carries the segments newly finalized since the previous event
/// plus the full current interim window. `Ended` fires once per engine run,
/// whether the engine stopped itself or was asked to stop.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Result(Vec<RecognizedSegment>),
    Ended,
    Error(String),
}

/// Continuous speech-to-text engine
///
/// The session wrapper owns the only instance; nothing else may drive it.
/// `stop` must be idempotent, including while the engine is not running.
#[async_trait::async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Begin continuous recognition under the given accent
    ///
    /// Returns a channel receiver that delivers engine events until the
    /// engine ends or fails. Closing the channel counts as `Ended`.
    async fn start(&mut self, accent: Accent) -> Result<mpsc::Receiver<EngineEvent>>;

    /// Request the engine to stop; the running channel still delivers `Ended`
    async fn stop(&mut self) -> Result<()>;

    /// Get engine name for logging
    fn name(&self) -> &str;
}

/// A synthesis voice advertised by the engine
#[derive(Debug, Clone)]
pub struct Voice {
    pub name: String,
    /// BCP 47 locale tag, e.g. "en-US"
    pub locale: String,
}

/// An utterance with fixed playback parameters (no emphasis applied)
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    /// Voice name, or None for the engine default
    pub voice: Option<String>,
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
}

impl Utterance {
    /// Neutral pitch, rate, and volume
    pub fn plain(text: impl Into<String>, voice: Option<String>) -> Self {
        Self {
            text: text.into(),
            voice,
            pitch: 1.0,
            rate: 1.0,
            volume: 1.0,
        }
    }
}

/// How a single utterance finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    Finished,
    Cancelled,
    Failed(String),
}

/// Text-to-speech engine
#[async_trait::async_trait]
pub trait SynthesisEngine: Send + Sync {
    /// Voices available for selection
    fn voices(&self) -> Vec<Voice>;

    /// Queue the utterance for playback
    ///
    /// Returns promptly with a completion receiver that resolves exactly
    /// once, when playback finishes, fails, or is cancelled. A dropped
    /// sender counts as `Finished`.
    async fn speak(&mut self, utterance: &Utterance) -> Result<oneshot::Receiver<SynthesisOutcome>>;

    /// Abort any in-progress utterance; must be idempotent
    async fn cancel(&mut self) -> Result<()>;

    /// Get engine name for logging
    fn name(&self) -> &str;
}
