use super::state::{
    InterviewSession, InterviewSnapshot, InterviewStatus, Question, ResponseRecord,
};
use crate::gateway::{InterviewGateway, InterviewResults, QuestionFetch};
use crate::speech::{RecognitionSession, RecognitionUpdate, SynthesisAdapter, TranscriptSnapshot};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

/// Fixed answer submitted by `skip`
pub const SKIP_ANSWER: &str = "(skipped)";

/// Question-fetch retry policy: attempts before giving up, delay between
const FETCH_RETRY_MAX: u32 = 5;
const FETCH_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug)]
struct ControllerInner {
    status: InterviewStatus,
    session: Option<InterviewSession>,
    question: Option<Question>,
    responses: Vec<ResponseRecord>,
    retry_count: u32,
    transcript: TranscriptSnapshot,
    error: Option<String>,
    notice: Option<String>,
}

impl Default for ControllerInner {
    fn default() -> Self {
        Self {
            status: InterviewStatus::Idle,
            session: None,
            question: None,
            responses: Vec::new(),
            retry_count: 0,
            transcript: TranscriptSnapshot::default(),
            error: None,
            notice: None,
        }
    }
}

/// The interview session state machine
///
/// Owns the session, the response history, and the speech components, and
/// drives the gateway with a bounded retry policy. At most one question
/// fetch and one submission are in flight at any time; a fetch is never
/// issued while a submission is pending, and vice versa.
///
/// Either speech component may be absent (no engine in the running
/// environment); the interview then runs on typed answers alone.
pub struct InterviewController {
    gateway: Arc<dyn InterviewGateway>,
    synthesis: Option<Arc<SynthesisAdapter>>,
    recognition: Option<Arc<RecognitionSession>>,

    inner: Arc<Mutex<ControllerInner>>,

    /// Coalesces concurrent question fetches
    fetch_in_flight: Arc<AtomicBool>,

    /// Session identity for asynchronous continuations: bumped by
    /// `restart`, checked before any late callback touches state
    epoch: Arc<AtomicU64>,
}

impl InterviewController {
    pub fn new(
        gateway: Arc<dyn InterviewGateway>,
        synthesis: Option<SynthesisAdapter>,
        recognition: Option<RecognitionSession>,
    ) -> Self {
        if synthesis.is_none() {
            info!("no synthesis engine; questions will not be read aloud");
        }
        if recognition.is_none() {
            info!("no recognition engine; answers must be typed");
        }

        Self {
            gateway,
            synthesis: synthesis.map(Arc::new),
            recognition: recognition.map(Arc::new),
            inner: Arc::new(Mutex::new(ControllerInner::default())),
            fetch_in_flight: Arc::new(AtomicBool::new(false)),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Begin an interview for a session created by the bootstrap step
    ///
    /// Transitions Idle -> Preparing, then fetches the first question
    /// (Preparing -> Interviewing on success).
    pub async fn start(&self, session_id: impl Into<String>, role: impl Into<String>) -> Result<()> {
        let session = InterviewSession {
            session_id: session_id.into(),
            role: role.into(),
        };

        {
            let mut inner = self.inner.lock().await;
            if inner.status != InterviewStatus::Idle {
                bail!(
                    "interview already in progress (status {:?}); restart first",
                    inner.status
                );
            }
            info!(
                "starting interview for role {:?} (session {})",
                session.role, session.session_id
            );
            inner.session = Some(session);
            inner.status = InterviewStatus::Preparing;
        }

        self.fetch_next_question().await
    }

    /// Submit the candidate's answer to the current question
    ///
    /// Empty or whitespace-only input is rejected locally; no request is
    /// made. On a failed submission the question and transcript are left
    /// untouched so the call can simply be repeated.
    pub async fn submit_answer(&self, answer: &str) -> Result<()> {
        let answer = answer.trim();
        if answer.is_empty() {
            bail!("answer is empty; say or type something before submitting");
        }

        let (session_id, question) = {
            let mut inner = self.inner.lock().await;
            if inner.status != InterviewStatus::Interviewing {
                bail!("no question awaiting an answer (status {:?})", inner.status);
            }
            let session_id = inner
                .session
                .as_ref()
                .map(|s| s.session_id.clone())
                .context("no active session")?;
            let question = inner.question.clone().context("no current question")?;
            inner.status = InterviewStatus::Submitting;
            (session_id, question)
        };

        // Quiesce audio before the network call so the next question never
        // overlaps this answer's speech I/O. Both calls are idempotent.
        if let Some(recognition) = &self.recognition {
            if let Err(e) = recognition.stop().await {
                warn!("failed to stop recognition before submit: {:#}", e);
            }
        }
        if let Some(synthesis) = &self.synthesis {
            synthesis.cancel().await;
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        info!("submitting answer for question {}", question.index);

        match self.gateway.submit_response(&session_id, answer).await {
            Ok(outcome) => {
                let complete = outcome.interview_complete;
                {
                    let mut inner = self.inner.lock().await;
                    if self.epoch.load(Ordering::SeqCst) != epoch {
                        return Ok(());
                    }
                    inner.responses.push(ResponseRecord {
                        question: question.text.clone(),
                        answer: answer.to_string(),
                        evaluation: outcome.evaluation,
                        question_type: outcome.question_type.unwrap_or(question.question_type),
                        answered_at: Utc::now(),
                    });
                    inner.transcript = TranscriptSnapshot::default();

                    if complete {
                        info!(
                            "interview complete after {} answers",
                            inner.responses.len()
                        );
                        inner.status = InterviewStatus::Completed;
                        inner.question = None;
                    }
                }

                if complete {
                    Ok(())
                } else {
                    self.fetch_next_question().await
                }
            }
            Err(e) => {
                {
                    let mut inner = self.inner.lock().await;
                    if self.epoch.load(Ordering::SeqCst) == epoch {
                        inner.status = InterviewStatus::Interviewing;
                    }
                }
                warn!("answer submission failed: {:#}", e);
                Err(e).context("failed to submit answer; please try again")
            }
        }
    }

    /// Skip the current question by submitting the fixed sentinel answer
    pub async fn skip(&self) -> Result<()> {
        info!("skipping current question");
        self.submit_answer(SKIP_ANSWER).await
    }

    /// Tear the session down and return to Idle
    ///
    /// Cancels synthesis and stops recognition before discarding state, so
    /// no callback can fire into the cleared session.
    pub async fn restart(&self) {
        info!("restarting interview session");

        // Invalidate pending continuations first
        self.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(recognition) = &self.recognition {
            if let Err(e) = recognition.stop().await {
                warn!("failed to stop recognition during restart: {:#}", e);
            }
        }
        if let Some(synthesis) = &self.synthesis {
            synthesis.cancel().await;
        }

        *self.inner.lock().await = ControllerInner::default();
        self.fetch_in_flight.store(false, Ordering::SeqCst);
    }

    /// Side-effect-free view of the interview; safe to call at any time
    pub async fn snapshot(&self) -> InterviewSnapshot {
        let inner = self.inner.lock().await;
        InterviewSnapshot {
            status: inner.status,
            session: inner.session.clone(),
            question: inner.question.clone(),
            responses: inner.responses.clone(),
            transcript: inner.transcript.clone(),
            error: inner.error.clone(),
            notice: inner.notice.clone(),
        }
    }

    /// Fetch the score summary from the backend
    pub async fn results(&self) -> Result<InterviewResults> {
        let session_id = {
            let inner = self.inner.lock().await;
            inner
                .session
                .as_ref()
                .map(|s| s.session_id.clone())
                .context("no active session")?
        };

        self.gateway
            .fetch_results(&session_id)
            .await
            .context("failed to fetch interview results")
    }

    /// Fetch the next question, retrying transient failures
    ///
    /// Calls made while a fetch is already outstanding are ignored.
    async fn fetch_next_question(&self) -> Result<()> {
        if self.fetch_in_flight.swap(true, Ordering::SeqCst) {
            warn!("question fetch already in flight, ignoring");
            return Ok(());
        }

        let result = self.fetch_loop().await;
        self.fetch_in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn fetch_loop(&self) -> Result<()> {
        let epoch = self.epoch.load(Ordering::SeqCst);

        loop {
            let session_id = {
                let inner = self.inner.lock().await;
                match &inner.session {
                    Some(session) => session.session_id.clone(),
                    None => return Ok(()), // torn down while queued
                }
            };

            // Either the question is installed and we are done, or we have
            // a failure description for the retry policy below.
            let failure: String = match self.gateway.fetch_question(&session_id).await {
                Ok(QuestionFetch::Question(question)) => {
                    let rejected = {
                        let mut inner = self.inner.lock().await;
                        if self.epoch.load(Ordering::SeqCst) != epoch {
                            return Ok(());
                        }
                        // index must strictly increase within a session
                        let stale = inner
                            .question
                            .as_ref()
                            .is_some_and(|prev| question.index <= prev.index);
                        if stale {
                            Some(format!(
                                "question index went backwards ({})",
                                question.index
                            ))
                        } else {
                            inner.retry_count = 0;
                            inner.question = Some(question.clone());
                            inner.status = InterviewStatus::Interviewing;
                            None
                        }
                    };

                    match rejected {
                        None => {
                            info!(
                                "question {} fetched ({} remaining)",
                                question.index, question.remaining
                            );
                            self.present_question(&question, epoch).await;
                            return Ok(());
                        }
                        Some(message) => message,
                    }
                }

                Ok(QuestionFetch::Exhausted) => {
                    let answered = {
                        let mut inner = self.inner.lock().await;
                        if self.epoch.load(Ordering::SeqCst) != epoch {
                            return Ok(());
                        }
                        if inner.responses.is_empty() {
                            // Nothing answered yet: the question set is not
                            // ready, which is a transient condition.
                            None
                        } else {
                            inner.status = InterviewStatus::Completed;
                            inner.question = None;
                            Some(inner.responses.len())
                        }
                    };

                    match answered {
                        Some(count) => {
                            info!("question set exhausted after {} answers", count);
                            return Ok(());
                        }
                        None => "backend reports no questions yet".to_string(),
                    }
                }

                Err(e) => format!("{e:#}"),
            };

            let attempts = {
                let mut inner = self.inner.lock().await;
                if self.epoch.load(Ordering::SeqCst) != epoch {
                    return Ok(());
                }
                inner.retry_count += 1;
                inner.retry_count
            };

            if attempts >= FETCH_RETRY_MAX {
                error!(
                    "could not retrieve questions after {} attempts: {}",
                    attempts, failure
                );
                let mut inner = self.inner.lock().await;
                if self.epoch.load(Ordering::SeqCst) == epoch {
                    inner.status = InterviewStatus::Failed;
                    inner.error = Some(
                        "could not retrieve questions; check the backend and restart".to_string(),
                    );
                }
                bail!("could not retrieve questions: {failure}");
            }

            warn!(
                "question fetch failed (attempt {}/{}): {}",
                attempts, FETCH_RETRY_MAX, failure
            );
            tokio::time::sleep(FETCH_RETRY_DELAY).await;

            if self.epoch.load(Ordering::SeqCst) != epoch {
                return Ok(());
            }
        }
    }

    /// Read the question aloud, then open the microphone
    ///
    /// Synthesis completion strictly precedes recognition start, so the
    /// engine never transcribes our own question audio.
    async fn present_question(&self, question: &Question, epoch: u64) {
        if let Some(synthesis) = &self.synthesis {
            synthesis.speak(&question.text).await;
        }

        if self.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }

        if let Some(recognition) = &self.recognition {
            match recognition.start().await {
                Ok(updates) => self.track_transcript(updates, epoch),
                Err(e) => {
                    warn!("could not start voice capture: {:#}", e);
                    let mut inner = self.inner.lock().await;
                    inner.notice =
                        Some("voice capture unavailable; type your answer instead".to_string());
                }
            }
        }
    }

    /// Mirror recognition updates into the controller state
    fn track_transcript(&self, mut updates: mpsc::UnboundedReceiver<RecognitionUpdate>, epoch: u64) {
        let inner = Arc::clone(&self.inner);
        let current_epoch = Arc::clone(&self.epoch);

        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                if current_epoch.load(Ordering::SeqCst) != epoch {
                    break;
                }

                let mut inner = inner.lock().await;
                match update {
                    RecognitionUpdate::Transcript {
                        final_text,
                        interim_text,
                    } => {
                        inner.transcript = TranscriptSnapshot {
                            final_text,
                            interim_text,
                        };
                    }
                    RecognitionUpdate::Ended { .. } => {
                        // Every final segment already arrived through
                        // Transcript updates; writing here could race the
                        // post-submit transcript clear.
                        break;
                    }
                    RecognitionUpdate::Error { message } => {
                        warn!("voice capture stopped: {}", message);
                        inner.notice =
                            Some(format!("{message}; you can type your answer instead"));
                    }
                }
            }
        });
    }
}
