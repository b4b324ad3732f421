use super::engine::{Accent, EngineEvent, RecognitionEngine, SpeechError};
use crate::config::SpeechConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Delay before restarting the engine, so it can release its resources
const RESTART_DELAY: Duration = Duration::from_millis(300);

/// Maximum engine-initiated restarts without an intervening result event.
/// A healthy engine that times out on silence keeps getting restarted
/// because the counter resets on every result; a persistently failing
/// engine trips the bound and the session reports a fatal error.
const MAX_CONSECUTIVE_RESTARTS: u32 = 8;

/// Recognition session lifecycle state
///
/// `Restarting` covers both the automatic restart after the engine stops
/// itself and the soft stop used for accent switching; in either case the
/// next engine end event must not complete the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenState {
    Stopped,
    Listening,
    Restarting,
}

/// Accumulated transcript for the current listening session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSnapshot {
    /// Text the engine has committed to, appended across the whole session
    pub final_text: String,

    /// Provisional text, replaced wholesale on each engine result
    pub interim_text: String,
}

/// Updates published to the caller of `start`
#[derive(Debug, Clone)]
pub enum RecognitionUpdate {
    /// The accumulated transcript changed
    Transcript {
        final_text: String,
        interim_text: String,
    },

    /// The session completed after an explicit `stop`
    Ended { final_text: String },

    /// The session stopped on an engine failure; `start` may be called again
    Error { message: String },
}

struct Shared {
    engine: Mutex<Box<dyn RecognitionEngine>>,
    state: Mutex<ListenState>,
    accent: Mutex<Accent>,
    transcript: Mutex<TranscriptSnapshot>,
}

impl Shared {
    async fn state(&self) -> ListenState {
        *self.state.lock().await
    }

    async fn set_state(&self, next: ListenState) {
        *self.state.lock().await = next;
    }

    async fn accent(&self) -> Accent {
        *self.accent.lock().await
    }

    async fn final_text(&self) -> String {
        self.transcript.lock().await.final_text.clone()
    }
}

/// Continuous speech recognition session
///
/// Wraps a [`RecognitionEngine`] with transcript accumulation and the
/// restart policy: continuous engines stop themselves on silence and
/// deliver results in a rolling window, so the session re-starts the engine
/// transparently and keeps appending to the same transcript. The engine
/// instance is exclusively owned here.
pub struct RecognitionSession {
    shared: Arc<Shared>,

    /// Handle for the event pump task of the current session
    pump_handle: Mutex<Option<JoinHandle<()>>>,
}

impl RecognitionSession {
    pub fn new(engine: Box<dyn RecognitionEngine>, accent: Accent) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(engine),
                state: Mutex::new(ListenState::Stopped),
                accent: Mutex::new(accent),
                transcript: Mutex::new(TranscriptSnapshot::default()),
            }),
            pump_handle: Mutex::new(None),
        }
    }

    /// Build a session from the speech config, if recognition is enabled
    ///
    /// The configured accent is validated up front; an enabled config with
    /// no engine available reports `EngineUnavailable` so the caller can
    /// fall back to typed answers.
    pub fn from_config(
        cfg: &SpeechConfig,
        engine: Option<Box<dyn RecognitionEngine>>,
    ) -> Result<Option<Self>, SpeechError> {
        if !cfg.recognition_enabled {
            return Ok(None);
        }

        let accent = Accent::from_code(&cfg.accent)
            .ok_or_else(|| SpeechError::UnsupportedAccent(cfg.accent.clone()))?;

        match engine {
            Some(engine) => Ok(Some(Self::new(engine, accent))),
            None => Err(SpeechError::EngineUnavailable("recognition")),
        }
    }

    /// Begin a new listening session
    ///
    /// Resets the transcript and returns the update channel for this
    /// session. If the session is already listening or restarting the call
    /// is rejected without touching the running engine, so a duplicate
    /// start can never spawn a second engine instance.
    pub async fn start(&self) -> Result<mpsc::UnboundedReceiver<RecognitionUpdate>, SpeechError> {
        {
            let mut state = self.shared.state.lock().await;
            if *state != ListenState::Stopped {
                warn!("recognition start ignored: session is {:?}", *state);
                return Err(SpeechError::AlreadyListening);
            }
            *state = ListenState::Listening;
        }

        // A fresh session starts from an empty transcript; restarts within
        // the session never come back through here.
        *self.shared.transcript.lock().await = TranscriptSnapshot::default();

        let accent = self.shared.accent().await;
        let engine_rx = {
            let mut engine = self.shared.engine.lock().await;
            match engine.start(accent).await {
                Ok(rx) => rx,
                Err(e) => {
                    self.shared.set_state(ListenState::Stopped).await;
                    return Err(SpeechError::Engine(format!("{e:#}")));
                }
            }
        };

        info!("recognition session started ({})", accent.code());

        let (tx, rx) = mpsc::unbounded_channel();
        let pump = tokio::spawn(pump_events(Arc::clone(&self.shared), engine_rx, tx));

        {
            let mut handle = self.pump_handle.lock().await;
            if let Some(old) = handle.replace(pump) {
                // The previous session's pump has already run to completion
                old.abort();
            }
        }

        Ok(rx)
    }

    /// Stop listening; the update channel delivers `Ended` exactly once
    ///
    /// Flips the state before asking the engine to stop so the end event
    /// cannot trigger a restart. Idempotent when already stopped.
    pub async fn stop(&self) -> Result<(), SpeechError> {
        {
            let mut state = self.shared.state.lock().await;
            if *state == ListenState::Stopped {
                return Ok(());
            }
            *state = ListenState::Stopped;
        }

        info!("stopping recognition session");

        let mut engine = self.shared.engine.lock().await;
        engine
            .stop()
            .await
            .map_err(|e| SpeechError::Engine(format!("{e:#}")))
    }

    /// Switch the recognition accent
    ///
    /// Unknown codes are rejected without side effect. While listening this
    /// performs a soft stop: the engine is bounced under the new locale and
    /// the caller keeps the same update channel, observing only a brief
    /// recognition gap. The transcript is untouched.
    pub async fn set_accent(&self, code: &str) -> Result<(), SpeechError> {
        let accent = Accent::from_code(code)
            .ok_or_else(|| SpeechError::UnsupportedAccent(code.to_string()))?;

        *self.shared.accent.lock().await = accent;

        let bounce = {
            let mut state = self.shared.state.lock().await;
            if *state == ListenState::Listening {
                *state = ListenState::Restarting;
                true
            } else {
                false
            }
        };

        if bounce {
            info!("switching recognition accent to {} (soft restart)", accent.code());
            // The pump restarts the engine after the end event arrives; a
            // stop failure leaves the engine on the old locale until then.
            let mut engine = self.shared.engine.lock().await;
            if let Err(e) = engine.stop().await {
                warn!("engine stop during accent switch failed: {:#}", e);
            }
        } else {
            debug!("accent set to {} for the next session", accent.code());
        }

        Ok(())
    }

    /// Whether the session is logically listening (including a restart gap)
    pub async fn is_listening(&self) -> bool {
        self.shared.state().await != ListenState::Stopped
    }

    /// Current accent
    pub async fn accent(&self) -> Accent {
        self.shared.accent().await
    }

    /// Snapshot of the accumulated transcript
    pub async fn transcript(&self) -> TranscriptSnapshot {
        self.shared.transcript.lock().await.clone()
    }
}

/// Event pump for one listening session
///
/// Owns every state transition driven by engine events, so explicit stop,
/// accent switch, and automatic restart cannot race each other: they all
/// funnel through the end-event handling below.
async fn pump_events(
    shared: Arc<Shared>,
    mut engine_rx: mpsc::Receiver<EngineEvent>,
    tx: mpsc::UnboundedSender<RecognitionUpdate>,
) {
    let mut consecutive_restarts = 0u32;

    loop {
        let event = engine_rx.recv().await;

        match event {
            Some(EngineEvent::Result(segments)) => {
                consecutive_restarts = 0;

                let snapshot = {
                    let mut transcript = shared.transcript.lock().await;
                    let mut interim = String::new();
                    for segment in segments {
                        if segment.is_final {
                            transcript.final_text.push_str(&segment.text);
                        } else {
                            interim.push_str(&segment.text);
                        }
                    }
                    transcript.interim_text = interim;
                    transcript.clone()
                };

                let _ = tx.send(RecognitionUpdate::Transcript {
                    final_text: snapshot.final_text,
                    interim_text: snapshot.interim_text,
                });
            }

            Some(EngineEvent::Error(message)) => {
                if shared.state().await == ListenState::Restarting {
                    // The restart path decides what happens next; reporting
                    // here as well would double-count one failure.
                    warn!("engine error during restart, swallowed: {}", message);
                    continue;
                }

                error!("recognition engine error: {}", message);
                shared.set_state(ListenState::Stopped).await;

                {
                    let mut engine = shared.engine.lock().await;
                    if let Err(e) = engine.stop().await {
                        warn!("engine stop after error failed: {:#}", e);
                    }
                }

                let _ = tx.send(RecognitionUpdate::Error { message });
                break;
            }

            // A closed channel counts as an engine end
            Some(EngineEvent::Ended) | None => match shared.state().await {
                ListenState::Stopped => {
                    let final_text = shared.final_text().await;
                    info!(
                        "recognition session ended ({} chars committed)",
                        final_text.len()
                    );
                    let _ = tx.send(RecognitionUpdate::Ended { final_text });
                    break;
                }

                ListenState::Listening => {
                    // The engine stopped itself (e.g. on silence) while we
                    // still want to listen.
                    consecutive_restarts += 1;
                    if consecutive_restarts > MAX_CONSECUTIVE_RESTARTS {
                        error!(
                            "recognition engine ended {} times in a row, giving up",
                            consecutive_restarts
                        );
                        shared.set_state(ListenState::Stopped).await;
                        let _ = tx.send(RecognitionUpdate::Error {
                            message: "speech recognition keeps stopping; \
                                      please type your answer instead"
                                .to_string(),
                        });
                        break;
                    }

                    debug!(
                        "engine ended while listening, restarting ({}/{})",
                        consecutive_restarts, MAX_CONSECUTIVE_RESTARTS
                    );
                    shared.set_state(ListenState::Restarting).await;

                    match restart_engine(&shared, &tx).await {
                        Some(rx) => engine_rx = rx,
                        None => break,
                    }
                }

                ListenState::Restarting => {
                    // Soft stop (accent switch): restart under the current
                    // accent without completing the session.
                    match restart_engine(&shared, &tx).await {
                        Some(rx) => engine_rx = rx,
                        None => break,
                    }
                }
            },
        }
    }

    debug!("recognition event pump finished");
}

/// Restart the engine after a quiesce delay
///
/// Returns the new event receiver, or None when the pump should exit:
/// either an explicit stop arrived during the delay (the session completes
/// normally) or the restart itself failed (fatal, no further retries).
async fn restart_engine(
    shared: &Arc<Shared>,
    tx: &mpsc::UnboundedSender<RecognitionUpdate>,
) -> Option<mpsc::Receiver<EngineEvent>> {
    tokio::time::sleep(RESTART_DELAY).await;

    if shared.state().await == ListenState::Stopped {
        let final_text = shared.final_text().await;
        let _ = tx.send(RecognitionUpdate::Ended { final_text });
        return None;
    }

    let accent = shared.accent().await;
    let started = {
        let mut engine = shared.engine.lock().await;
        engine.start(accent).await
    };

    match started {
        Ok(rx) => {
            shared.set_state(ListenState::Listening).await;
            debug!("engine restarted ({})", accent.code());
            Some(rx)
        }
        Err(e) => {
            error!("failed to restart recognition engine: {:#}", e);
            shared.set_state(ListenState::Stopped).await;
            let _ = tx.send(RecognitionUpdate::Error {
                message: format!("speech recognition could not restart: {e:#}"),
            });
            None
        }
    }
}
