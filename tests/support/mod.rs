// Scripted engine and gateway fakes for driving the session state machines.
#![allow(dead_code)]

use anyhow::Result;
use interview_voice::gateway::{
    GatewayError, GenerateQuestionsRequest, InterviewGateway, InterviewResults, QuestionFetch,
    QuestionPlan, SessionCreated, SubmitOutcome,
};
use interview_voice::speech::{
    Accent, EngineEvent, RecognitionEngine, SynthesisEngine, SynthesisOutcome, Utterance, Voice,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, oneshot, Mutex};

// ============================================================================
// Recognition engine
// ============================================================================

/// Test-side handle for a [`ScriptedRecognition`] engine
#[derive(Default)]
pub struct RecognitionHandle {
    tx: Mutex<Option<mpsc::Sender<EngineEvent>>>,
    starts: AtomicU32,
    stops: AtomicU32,
    accents: StdMutex<Vec<Accent>>,

    /// When non-zero, the Nth and later start calls fail
    fail_starts_from: AtomicU32,

    /// When set, every run ends itself immediately (a dying engine)
    end_immediately: AtomicBool,
}

impl RecognitionHandle {
    /// Deliver an event into the current run
    pub async fn emit(&self, event: EngineEvent) {
        let tx = self.tx.lock().await;
        if let Some(tx) = tx.as_ref() {
            tx.send(event).await.ok();
        }
    }

    /// The engine terminates on its own (e.g. silence timeout)
    pub async fn end_from_engine(&self) {
        self.emit(EngineEvent::Ended).await;
    }

    pub fn starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn accents(&self) -> Vec<Accent> {
        self.accents.lock().unwrap().clone()
    }

    pub fn fail_starts_from(&self, n: u32) {
        self.fail_starts_from.store(n, Ordering::SeqCst);
    }

    pub fn end_immediately(&self, value: bool) {
        self.end_immediately.store(value, Ordering::SeqCst);
    }
}

/// Recognition engine driven by the test through a [`RecognitionHandle`]
pub struct ScriptedRecognition {
    handle: Arc<RecognitionHandle>,
}

impl ScriptedRecognition {
    pub fn new() -> (Self, Arc<RecognitionHandle>) {
        let handle = Arc::new(RecognitionHandle::default());
        (
            Self {
                handle: Arc::clone(&handle),
            },
            handle,
        )
    }
}

#[async_trait::async_trait]
impl RecognitionEngine for ScriptedRecognition {
    async fn start(&mut self, accent: Accent) -> Result<mpsc::Receiver<EngineEvent>> {
        let run = self.handle.starts.fetch_add(1, Ordering::SeqCst) + 1;

        let fail_from = self.handle.fail_starts_from.load(Ordering::SeqCst);
        if fail_from != 0 && run >= fail_from {
            anyhow::bail!("engine refused to start (run {run})");
        }

        self.handle.accents.lock().unwrap().push(accent);

        let (tx, rx) = mpsc::channel(16);
        if self.handle.end_immediately.load(Ordering::SeqCst) {
            tx.send(EngineEvent::Ended).await.ok();
        }
        *self.handle.tx.lock().await = Some(tx);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.handle.stops.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self.handle.tx.lock().await.take() {
            tx.send(EngineEvent::Ended).await.ok();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted-recognition"
    }
}

// ============================================================================
// Synthesis engine
// ============================================================================

#[derive(Default)]
pub struct SynthesisHandle {
    pending: Mutex<Option<oneshot::Sender<SynthesisOutcome>>>,
    spoken: StdMutex<Vec<String>>,
    voices_used: StdMutex<Vec<Option<String>>>,
    voices: StdMutex<Vec<Voice>>,
    cancels: AtomicU32,

    /// When set, utterances finish as soon as they are queued
    auto_finish: AtomicBool,
}

impl SynthesisHandle {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn voices_used(&self) -> Vec<Option<String>> {
        self.voices_used.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> u32 {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn set_voices(&self, voices: Vec<Voice>) {
        *self.voices.lock().unwrap() = voices;
    }

    pub fn auto_finish(&self, value: bool) {
        self.auto_finish.store(value, Ordering::SeqCst);
    }

    /// Resolve the in-progress utterance
    pub async fn finish(&self, outcome: SynthesisOutcome) {
        if let Some(tx) = self.pending.lock().await.take() {
            tx.send(outcome).ok();
        }
    }
}

/// Synthesis engine driven by the test through a [`SynthesisHandle`]
pub struct ScriptedSynthesis {
    handle: Arc<SynthesisHandle>,
}

impl ScriptedSynthesis {
    pub fn new() -> (Self, Arc<SynthesisHandle>) {
        let handle = Arc::new(SynthesisHandle::default());
        handle.auto_finish.store(true, Ordering::SeqCst);
        (
            Self {
                handle: Arc::clone(&handle),
            },
            handle,
        )
    }
}

#[async_trait::async_trait]
impl SynthesisEngine for ScriptedSynthesis {
    fn voices(&self) -> Vec<Voice> {
        self.handle.voices.lock().unwrap().clone()
    }

    async fn speak(&mut self, utterance: &Utterance) -> Result<oneshot::Receiver<SynthesisOutcome>> {
        self.handle
            .spoken
            .lock()
            .unwrap()
            .push(utterance.text.clone());
        self.handle
            .voices_used
            .lock()
            .unwrap()
            .push(utterance.voice.clone());

        let (tx, rx) = oneshot::channel();
        if self.handle.auto_finish.load(Ordering::SeqCst) {
            tx.send(SynthesisOutcome::Finished).ok();
        } else {
            *self.handle.pending.lock().await = Some(tx);
        }
        Ok(rx)
    }

    async fn cancel(&mut self) -> Result<()> {
        self.handle.cancels.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self.handle.pending.lock().await.take() {
            tx.send(SynthesisOutcome::Cancelled).ok();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted-synthesis"
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// In-memory gateway fed with queued outcomes
#[derive(Default)]
pub struct FakeGateway {
    fetches: StdMutex<VecDeque<Result<QuestionFetch, GatewayError>>>,
    submits: StdMutex<VecDeque<Result<SubmitOutcome, GatewayError>>>,
    fetch_calls: AtomicU32,
    submit_calls: AtomicU32,
    submitted: StdMutex<Vec<String>>,
    results: StdMutex<Option<InterviewResults>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queue_fetch(&self, outcome: Result<QuestionFetch, GatewayError>) {
        self.fetches.lock().unwrap().push_back(outcome);
    }

    pub fn queue_submit(&self, outcome: Result<SubmitOutcome, GatewayError>) {
        self.submits.lock().unwrap().push_back(outcome);
    }

    pub fn set_results(&self, results: InterviewResults) {
        *self.results.lock().unwrap() = Some(results);
    }

    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    fn unavailable() -> GatewayError {
        GatewayError::Status {
            status: 503,
            body: "backend unavailable".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl InterviewGateway for FakeGateway {
    async fn upload_resume(
        &self,
        _pdf: Vec<u8>,
        _filename: &str,
        _role: &str,
    ) -> Result<SessionCreated, GatewayError> {
        Ok(SessionCreated {
            session_id: "fake-session".to_string(),
            question_count: 3,
        })
    }

    async fn generate_questions(
        &self,
        _request: &GenerateQuestionsRequest,
    ) -> Result<QuestionPlan, GatewayError> {
        Ok(QuestionPlan {
            total_questions: 3,
            session_id: Some("fake-session".to_string()),
        })
    }

    async fn fetch_question(&self, _session_id: &str) -> Result<QuestionFetch, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::unavailable()))
    }

    async fn submit_response(
        &self,
        _session_id: &str,
        answer: &str,
    ) -> Result<SubmitOutcome, GatewayError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(answer.to_string());
        self.submits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::unavailable()))
    }

    async fn fetch_results(&self, _session_id: &str) -> Result<InterviewResults, GatewayError> {
        self.results
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(Self::unavailable)
    }
}
