//! KYC CLI: command-line client for the self-service KYC backend.
//!
//! Reads KYC_API_URL (or API_URL) and the KYC_UPLOAD_* settings from the
//! environment or `.env`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use kyc_api_client::{ApiClient, KycSession, UploadRouter};
use kyc_cli::{init_tracing, print_json, progress_report};
use kyc_core::media::ClipInfo;
use kyc_core::models::{DocumentSlot, RegistrationData, ReviewForm, UploadFile};
use kyc_core::{ErrorMetadata, KycConfig, KycError, UploadServiceKind};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "kyc", about = "Self-service KYC CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Case lifecycle operations
    Case {
        #[command(subcommand)]
        sub: CaseCommands,
    },
    /// Show server progress for a case
    Progress {
        /// KYC case ID
        case_id: String,
    },
    /// Upload a document for one slot of a case
    Upload {
        /// KYC case ID
        case_id: String,
        /// Slot: aadhar_front, aadhar_back, pancard, passport, photo, selfie, video
        slot: String,
        /// Path to the file to upload
        file: PathBuf,
        /// Override the configured upload service: existing or new
        #[arg(long)]
        service: Option<String>,
        /// Recording length in seconds (required for the video slot)
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Register the user for a case
    Register {
        /// KYC case ID
        case_id: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
    },
    /// Show the review form pre-populated from the case
    Review {
        /// KYC case ID
        case_id: String,
    },
    /// Submit the review form from a JSON file
    Submit {
        /// KYC case ID
        case_id: String,
        /// Path to the review form JSON (camelCase fields)
        form: PathBuf,
    },
    /// Risk assessment of a case
    Risk {
        /// KYC case ID
        case_id: String,
    },
    /// Check the main API and the new upload service
    Health,
    /// Show which upload service is active
    Service {
        /// Send this file through the active service as a test upload
        #[arg(long)]
        test: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CaseCommands {
    /// Create a new case
    Create {
        /// User ID (defaults to KYC_DEFAULT_USER_ID)
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Open the current user's case
    Open,
}

fn report_error(err: KycError) -> anyhow::Error {
    anyhow::anyhow!("[{}] {}", err.error_code(), err.client_message())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = KycConfig::from_env()
        .context("Failed to load configuration. Check the KYC_* environment variables")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Case { sub } => {
            let client = ApiClient::from_config(&config)?;
            let case_id = match sub {
                CaseCommands::Create { user_id } => {
                    let user_id = user_id.unwrap_or_else(|| config.default_user_id.clone());
                    KycSession::create_case(&client, &user_id)
                        .await
                        .map_err(report_error)?
                }
                CaseCommands::Open => KycSession::open_case(&client)
                    .await
                    .map_err(report_error)?,
            };
            print_json(&serde_json::json!({ "kyc_case_id": case_id }))?;
        }
        Commands::Progress { case_id } => {
            let mut session = KycSession::from_config(&config, case_id)?;
            if !session.fetch_progress().await {
                anyhow::bail!("Could not fetch progress for case {}", session.case_id());
            }
            print_json(&progress_report(session.flow()))?;
        }
        Commands::Upload {
            case_id,
            slot,
            file,
            service,
            duration,
        } => {
            let slot: DocumentSlot = slot.parse()?;
            let config = match service {
                Some(service) => config
                    .clone()
                    .with_upload_service(service.parse::<UploadServiceKind>()?),
                None => config.clone(),
            };
            let upload = UploadFile::from_path(&file).map_err(report_error)?;

            let mut session = KycSession::from_config(&config, case_id)?;
            let response = match slot {
                DocumentSlot::Video => {
                    let secs = duration.ok_or_else(|| {
                        anyhow::anyhow!("--duration is required when uploading a video recording")
                    })?;
                    let elapsed = Duration::from_secs_f64(secs.max(0.0).min(3600.0));
                    let clip = ClipInfo {
                        duration: elapsed,
                        has_video_track: true,
                        has_audio_track: true,
                    };
                    session.upload_recording(elapsed, &clip, upload).await
                }
                _ => session.upload_document(slot, upload).await,
            }
            .map_err(report_error)?;

            print_json(&serde_json::json!({
                "service": config.upload_service,
                "slot": slot,
                "response": response,
                "uploadedAt": response.success.then(|| chrono::Utc::now().to_rfc3339()),
            }))?;
        }
        Commands::Register {
            case_id,
            email,
            phone,
            password,
        } => {
            let mut session = KycSession::from_config(&config, case_id)?;
            let data = RegistrationData {
                email,
                phone,
                password,
                ..Default::default()
            };
            session.register(&data).await.map_err(report_error)?;
            print_json(&progress_report(session.flow()))?;
        }
        Commands::Review { case_id } => {
            let mut session = KycSession::from_config(&config, case_id)?;
            let review = session.load_review().await.map_err(report_error)?;
            print_json(&review)?;
        }
        Commands::Submit { case_id, form } => {
            let text = std::fs::read_to_string(&form)
                .with_context(|| format!("Failed to read form file: {}", form.display()))?;
            let form: ReviewForm =
                serde_json::from_str(&text).context("Failed to parse review form JSON")?;

            let mut session = KycSession::from_config(&config, case_id)?;
            session.fetch_progress().await;
            session.submit_review(&form).await.map_err(report_error)?;
            print_json(&serde_json::json!({
                "success": true,
                "submittedAt": chrono::Utc::now().to_rfc3339(),
                "progress": progress_report(session.flow()),
            }))?;
        }
        Commands::Risk { case_id } => {
            let session = KycSession::from_config(&config, case_id)?;
            let assessment = session.analyze_risk().await.map_err(report_error)?;
            print_json(&assessment)?;
        }
        Commands::Health => {
            let client = ApiClient::from_config(&config)?;
            let router = UploadRouter::from_config(&config)?;
            let api = client.health().await;
            print_json(&serde_json::json!({
                "api": api.is_ok(),
                "apiError": api.err().map(|e| format!("{:#}", e)),
                "uploadService": router.check_health().await,
            }))?;
        }
        Commands::Service { test } => {
            let router = UploadRouter::from_config(&config)?;
            match test {
                Some(path) => {
                    let file = UploadFile::from_path(&path).map_err(report_error)?;
                    let response = router.test_upload(file).await;
                    print_json(&serde_json::json!({
                        "service": router.service_info(),
                        "response": response,
                    }))?;
                }
                None => print_json(router.service_info())?,
            }
        }
    }

    Ok(())
}
