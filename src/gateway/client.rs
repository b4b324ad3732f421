use super::types::{
    GenerateQuestionsRequest, InterviewResults, QuestionFetch, QuestionPlan, QuestionWire,
    SessionCreated, SubmitOutcome, SubmitRequest,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the backend HTTP contract
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response (connect, timeout, TLS, ...)
    #[error("request to interview backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("interview backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the contract
    #[error("malformed payload from interview backend: {0}")]
    Malformed(String),
}

/// Typed client over the interview backend
///
/// Thin by design: every method is one request, one typed response, no
/// retry logic. The controller owns retries and state.
#[async_trait::async_trait]
pub trait InterviewGateway: Send + Sync {
    /// POST /upload-resume: create a session from a PDF resume
    async fn upload_resume(
        &self,
        pdf: Vec<u8>,
        filename: &str,
        role: &str,
    ) -> Result<SessionCreated, GatewayError>;

    /// POST /generate-questions: bootstrap from pre-extracted resume fields
    async fn generate_questions(
        &self,
        request: &GenerateQuestionsRequest,
    ) -> Result<QuestionPlan, GatewayError>;

    /// GET /get-question: fetch the current question, or the exhaustion signal
    async fn fetch_question(&self, session_id: &str) -> Result<QuestionFetch, GatewayError>;

    /// POST /submit-response: submit an answer for scoring
    async fn submit_response(
        &self,
        session_id: &str,
        answer: &str,
    ) -> Result<SubmitOutcome, GatewayError>;

    /// GET /get-results: fetch the score summary
    async fn fetch_results(&self, session_id: &str) -> Result<InterviewResults, GatewayError>;
}

/// reqwest-backed gateway implementation
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url = base_url.into();
        info!("interview backend: {}", base_url);

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a response to a typed body, separating status and decode failures
    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl InterviewGateway for HttpGateway {
    async fn upload_resume(
        &self,
        pdf: Vec<u8>,
        filename: &str,
        role: &str,
    ) -> Result<SessionCreated, GatewayError> {
        debug!("uploading resume {} ({} bytes)", filename, pdf.len());

        let part = reqwest::multipart::Part::bytes(pdf)
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("role", role.to_string());

        let response = self
            .http
            .post(self.url("/upload-resume"))
            .multipart(form)
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn generate_questions(
        &self,
        request: &GenerateQuestionsRequest,
    ) -> Result<QuestionPlan, GatewayError> {
        debug!("generating questions for role {:?}", request.role);

        let response = self
            .http
            .post(self.url("/generate-questions"))
            .json(request)
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn fetch_question(&self, session_id: &str) -> Result<QuestionFetch, GatewayError> {
        let response = self
            .http
            .get(self.url("/get-question"))
            .query(&[("session_id", session_id)])
            .send()
            .await?;

        let wire: QuestionWire = Self::parse(response).await?;
        Ok(wire.into())
    }

    async fn submit_response(
        &self,
        session_id: &str,
        answer: &str,
    ) -> Result<SubmitOutcome, GatewayError> {
        let response = self
            .http
            .post(self.url("/submit-response"))
            .query(&[("session_id", session_id)])
            .json(&SubmitRequest {
                response: answer.to_string(),
            })
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn fetch_results(&self, session_id: &str) -> Result<InterviewResults, GatewayError> {
        let response = self
            .http
            .get(self.url("/get-results"))
            .query(&[("session_id", session_id)])
            .send()
            .await?;

        Self::parse(response).await
    }
}
