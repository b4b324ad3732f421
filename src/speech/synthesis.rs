use super::engine::{SynthesisEngine, SynthesisOutcome, Utterance, Voice};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Voices excluded from selection: low-quality novelty voices some
/// platforms ship under an English locale.
const NOVELTY_VOICES: &[&str] = &[
    "Albert", "Bad News", "Bahh", "Bells", "Boing", "Bubbles", "Cellos", "Deranged", "Fred",
    "Good News", "Jester", "Organ", "Superstar", "Trinoids", "Whisper", "Wobble", "Zarvox",
];

/// Wrapper around a text-to-speech engine
///
/// `speak` resolves exactly once per utterance; a synthesis failure is
/// logged and treated as completion so the interview flow never stalls on
/// audio. `is_speaking` reflects adapter-local state and is kept consistent
/// by every call path.
pub struct SynthesisAdapter {
    engine: Arc<Mutex<Box<dyn SynthesisEngine>>>,

    /// Whether an utterance is currently in progress
    speaking: Arc<AtomicBool>,

    /// Voice selected at construction, or None for the engine default
    voice: Option<String>,
}

impl SynthesisAdapter {
    /// Wrap an engine, selecting a voice up front
    pub fn new(engine: Box<dyn SynthesisEngine>) -> Self {
        let voice = Self::pick_voice(&engine.voices());
        match &voice {
            Some(name) => info!("synthesis voice selected: {}", name),
            None => info!("no suitable English voice found, using engine default"),
        }

        Self {
            engine: Arc::new(Mutex::new(engine)),
            speaking: Arc::new(AtomicBool::new(false)),
            voice,
        }
    }

    /// Read `text` aloud and wait for playback to finish
    ///
    /// Always returns once the engine reports the utterance done, failed,
    /// or cancelled. Failures are reported as a warning, not an error.
    pub async fn speak(&self, text: &str) {
        let utterance = Utterance::plain(text, self.voice.clone());

        // Hold the engine lock only to queue the utterance, so cancel()
        // stays callable while playback runs.
        let done_rx = {
            let mut engine = self.engine.lock().await;
            engine.speak(&utterance).await
        };

        let done_rx = match done_rx {
            Ok(rx) => rx,
            Err(e) => {
                warn!("synthesis failed to start, continuing without audio: {:#}", e);
                return;
            }
        };

        self.speaking.store(true, Ordering::SeqCst);

        match done_rx.await {
            Ok(SynthesisOutcome::Finished) => debug!("utterance finished"),
            Ok(SynthesisOutcome::Cancelled) => debug!("utterance cancelled"),
            Ok(SynthesisOutcome::Failed(message)) => {
                warn!("synthesis error, continuing without audio: {}", message);
            }
            // Engine dropped the sender; treat as finished
            Err(_) => debug!("utterance completion channel closed"),
        }

        self.speaking.store(false, Ordering::SeqCst);
    }

    /// Abort any in-progress utterance; safe to call when idle
    pub async fn cancel(&self) {
        if !self.speaking.load(Ordering::SeqCst) {
            return;
        }

        let mut engine = self.engine.lock().await;
        if let Err(e) = engine.cancel().await {
            warn!("failed to cancel synthesis: {:#}", e);
        }

        self.speaking.store(false, Ordering::SeqCst);
    }

    /// Whether an utterance is currently in progress (adapter-local state)
    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Prefer an English-locale voice that is not a known novelty voice
    fn pick_voice(voices: &[Voice]) -> Option<String> {
        voices
            .iter()
            .find(|v| v.locale.starts_with("en") && !NOVELTY_VOICES.contains(&v.name.as_str()))
            .map(|v| v.name.clone())
    }
}
