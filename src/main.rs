use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use audit_client::app_state::AppState;
use audit_client::config::ClientConfig;
use audit_client::models::document::DocumentFile;
use audit_client::models::job::{JobFailure, JobStage};
use audit_client::services::session::Session;

/// Submit a PDF for security analysis and save the resulting report.
#[derive(Debug, Parser)]
#[command(name = "audit-client", version)]
struct Args {
    /// PDF document to analyse
    file: PathBuf,

    /// Directory to save the report into (defaults to AUDIT_DOWNLOAD_DIR or ".")
    #[arg(long)]
    out: Option<PathBuf>,

    /// Analysis service base URL (defaults to AUDIT_API_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let args = Args::parse();

    // Load configuration from environment
    let mut config = ClientConfig::from_env().expect("Failed to load configuration from environment");
    if let Some(base_url) = args.base_url {
        config.api_base_url = base_url;
    }
    if let Some(out) = args.out {
        config.download_dir = out;
    }

    // Register client metrics
    metrics::describe_counter!("audit_uploads_total", "Documents submitted for analysis");
    metrics::describe_counter!("audit_upload_failures_total", "Uploads rejected or lost in transit");
    metrics::describe_counter!("audit_status_polls_total", "Job status requests issued");
    metrics::describe_counter!("audit_jobs_completed", "Analysis jobs that completed");
    metrics::describe_counter!("audit_jobs_failed", "Analysis jobs that failed");
    metrics::describe_counter!("audit_health_probes_total", "Service liveness probes by outcome");

    let document = match DocumentFile::from_path(&args.file).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(file = %args.file.display(), error = %e, "Failed to read document");
            return ExitCode::FAILURE;
        }
    };

    let download_dir = config.download_dir.clone();
    let state = AppState::new(config).expect("Failed to build analysis service client");
    let mut session = Session::start(&state);

    let mut health = session.subscribe_health();
    tokio::spawn(async move {
        while health.changed().await.is_ok() {
            let h = health.borrow_and_update().clone();
            tracing::info!(status = %h.status, last_checked_at = ?h.last_checked_at, "Service status");
        }
    });

    let mut progress = session.subscribe_job();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let job = progress.borrow_and_update().clone();
            if job.stage == JobStage::Processing {
                tracing::info!(
                    progress = job.progress,
                    detail = job.message.as_deref().unwrap_or_default(),
                    "Analysis in progress"
                );
            }
        }
    });

    if let Err(e) = session.submit(&document).await {
        tracing::error!(file = %document.name, error = %e, "Could not submit document");
        session.shutdown().await;
        return ExitCode::FAILURE;
    }

    let job = session.wait_for_outcome().await;
    let code = match job.stage {
        JobStage::Completed => {
            if let Some(report) = session.report() {
                for section in report.sections() {
                    tracing::info!(section = %section.kind.title(), "Report section available");
                }
            }
            match session.download_report(&download_dir).await {
                Ok(path) => {
                    tracing::info!(path = %path.display(), "Report downloaded");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to download report");
                    ExitCode::FAILURE
                }
            }
        }
        _ => {
            match &job.error {
                Some(JobFailure::Backend(msg)) => {
                    tracing::error!(detail = %msg, "Analysis service reported failure")
                }
                Some(JobFailure::Transport(msg)) => {
                    tracing::error!(detail = %msg, "Lost track of the analysis job")
                }
                None => tracing::error!(
                    detail = job.upload_error.as_deref().unwrap_or_default(),
                    "Analysis did not complete"
                ),
            }
            ExitCode::FAILURE
        }
    };

    session.shutdown().await;
    code
}
