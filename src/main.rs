use anyhow::{bail, Context, Result};
use clap::Parser;
use interview_voice::{
    Config, ConsoleSynthesis, GenerateQuestionsRequest, HttpGateway, InterviewController,
    InterviewGateway, InterviewStatus, RecognitionSession, SpeechError, SynthesisAdapter,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

/// Voice-driven mock interview client
#[derive(Debug, Parser)]
#[command(name = "interview-voice", version)]
struct Args {
    /// Config file name (without extension)
    #[arg(long, default_value = "config/interview-voice")]
    config: String,

    /// Role to interview for
    #[arg(long)]
    role: String,

    /// PDF resume to upload (creates the session server-side)
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Comma-separated skills, used when no resume file is given
    #[arg(long)]
    skills: Option<String>,

    /// Work-experience summary, used when no resume file is given
    #[arg(long)]
    experience: Option<String>,

    /// Education summary, used when no resume file is given
    #[arg(long)]
    education: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let gateway = Arc::new(HttpGateway::new(
        cfg.backend.base_url.clone(),
        Duration::from_secs(cfg.backend.request_timeout_secs),
    )?);

    let (session_id, question_count) = bootstrap(gateway.as_ref(), &args).await?;
    info!(
        "session {} created ({} questions)",
        session_id, question_count
    );

    let synthesis = cfg
        .speech
        .synthesis_enabled
        .then(|| SynthesisAdapter::new(Box::new(ConsoleSynthesis)));

    // No continuous recognition engine exists in a plain terminal; the
    // controller falls back to typed answers.
    let recognition = match RecognitionSession::from_config(&cfg.speech, None) {
        Ok(session) => session,
        Err(SpeechError::EngineUnavailable(_)) => {
            warn!("speech recognition is not available here; type your answers");
            None
        }
        Err(e) => bail!("invalid speech configuration: {e}"),
    };

    let controller = InterviewController::new(gateway, synthesis, recognition);
    controller.start(session_id, args.role.clone()).await?;

    run_interview(&controller).await?;
    print_results(&controller).await
}

/// Create the session: upload a resume, or send pre-extracted fields
async fn bootstrap(gateway: &dyn InterviewGateway, args: &Args) -> Result<(String, u32)> {
    if let Some(path) = &args.resume {
        let pdf = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read resume {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume.pdf".to_string());

        let created = gateway.upload_resume(pdf, &filename, &args.role).await?;
        return Ok((created.session_id, created.question_count));
    }

    let plan = gateway
        .generate_questions(&GenerateQuestionsRequest {
            role: args.role.clone(),
            resume: None,
            skills: args.skills.clone(),
            experience: args.experience.clone(),
            education: args.education.clone(),
        })
        .await?;

    // Older deployments keep one implicit session for this flow
    let session_id = plan
        .session_id
        .unwrap_or_else(|| "default".to_string());
    Ok((session_id, plan.total_questions))
}

/// Drive the question/answer loop until the session completes
async fn run_interview(controller: &InterviewController) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let snapshot = controller.snapshot().await;

        match snapshot.status {
            InterviewStatus::Completed => {
                println!("\nInterview complete.");
                return Ok(());
            }
            InterviewStatus::Failed => {
                bail!(
                    "interview failed: {}",
                    snapshot.error.unwrap_or_else(|| "unknown error".to_string())
                );
            }
            InterviewStatus::Interviewing => {
                let question = snapshot
                    .question
                    .context("interviewing with no current question")?;
                println!(
                    "--- Question {} ({:?}, {} remaining) ---",
                    question.index + 1,
                    question.question_type,
                    question.remaining
                );

                stdout.write_all(b"Your answer (or /skip): ").await?;
                stdout.flush().await?;

                let line = match lines.next_line().await? {
                    Some(line) => line,
                    None => bail!("stdin closed before the interview finished"),
                };

                let result = if line.trim() == "/skip" {
                    controller.skip().await
                } else {
                    controller.submit_answer(&line).await
                };

                match result {
                    Ok(()) => {
                        let after = controller.snapshot().await;
                        if let Some(last) = after.responses.last() {
                            println!("Score: {:.1}/10", last.evaluation);
                        }
                    }
                    Err(e) => println!("{e:#}"),
                }
            }
            // Preparing or Submitting: transitions settle quickly
            _ => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
}

/// Print the backend's score summary
async fn print_results(controller: &InterviewController) -> Result<()> {
    let results = controller.results().await?;

    println!(
        "\nAnswered {}/{} questions, average score {:.1}/10",
        results.answered_questions, results.total_questions, results.average_score
    );

    if let Some(by_type) = &results.feedback_by_type {
        for (question_type, feedback) in by_type {
            if let Some(average) = feedback.average_score {
                println!(
                    "  {}: {:.1}/10 over {} questions",
                    question_type, average, feedback.count
                );
            }
        }
    }

    Ok(())
}
