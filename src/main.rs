use std::process::ExitCode;

use clap::Parser;

use civic_reporter::cli::{Cli, Commands};
use civic_reporter::config::Config;
use civic_reporter::inference::InferenceClient;
use civic_reporter::models::{GeoPosition, ReportId};
use civic_reporter::services::db;
use civic_reporter::services::repository::{MemoryReportRepository, PgReportRepository, ReportRepository};
use civic_reporter::storage::ObjectStore;
use civic_reporter::terminal::TerminalPlatform;
use civic_reporter::workflow::{CaptureWorkflow, RunOutcome, WorkflowSettings, is_notified};
use civic_reporter::{Result, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    logging::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::from_env()?;

    match cli.command {
        Commands::Health => {
            let client = InferenceClient::new(&config.inference_url, config.inference_timeout)?;
            let health = client.health().await?;
            println!("{}: {}", client.endpoint(), health.status);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Migrate => {
            let pool = db::connect(&config.database_url).await?;
            db::migrate(&pool).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Report {
            photo,
            latitude,
            longitude,
            yes,
            deny_location,
            dry_run,
        } => {
            let position = latitude
                .zip(longitude)
                .map(|(latitude, longitude)| GeoPosition { latitude, longitude });
            let platform = TerminalPlatform::new(photo, config.jpeg_quality, position)
                .assume_yes(yes)
                .deny_location(deny_location);
            let classifier = InferenceClient::new(&config.inference_url, config.inference_timeout)?;

            if dry_run {
                let root = config
                    .local_storage_path
                    .clone()
                    .unwrap_or_else(|| std::env::temp_dir().join("civic-reporter"));
                let reports = MemoryReportRepository::new();
                let outcome = report(
                    platform,
                    classifier,
                    ObjectStore::local(root),
                    reports.clone(),
                    config.workflow_settings(),
                )
                .await?;
                if let Some(RunOutcome::Reported(id)) = &outcome {
                    print_stored(&reports, id);
                }
                return Ok(exit_code(outcome.as_ref()));
            }

            let pool = db::connect(&config.database_url).await?;
            if config.auto_migrate {
                db::migrate(&pool).await?;
            }
            let store = object_store(&config).await?;
            let outcome = report(
                platform,
                classifier,
                store,
                PgReportRepository::new(pool),
                config.workflow_settings(),
            )
            .await?;
            Ok(exit_code(outcome.as_ref()))
        }
    }
}

async fn object_store(config: &Config) -> Result<ObjectStore> {
    match &config.local_storage_path {
        Some(path) => Ok(ObjectStore::local(path.clone())),
        None => ObjectStore::gcs(config.bucket_name.clone()).await,
    }
}

/// Runs the workflow once. `Ok(None)` means the run failed and the user was already notified.
async fn report<R: ReportRepository>(
    platform: TerminalPlatform,
    classifier: InferenceClient,
    store: ObjectStore,
    reports: R,
    settings: WorkflowSettings,
) -> Result<Option<RunOutcome>> {
    let mut workflow = CaptureWorkflow::new(platform, classifier, store, reports, settings);
    let outcome = match workflow.run().await {
        Ok(outcome) => outcome,
        Err(e) if is_notified(&e) => {
            log::debug!("Report run ended with {}", e);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    match &outcome {
        RunOutcome::Reported(id) => log::info!("Issue report {} stored", id),
        RunOutcome::Rejected(assessment) => log::info!(
            "Nothing reported: {} at {:.2}% is below the confidence threshold",
            assessment.issue_type,
            assessment.confidence_percent()
        ),
        RunOutcome::Declined => log::info!("Nothing reported: declined"),
    }
    Ok(Some(outcome))
}

fn print_stored(reports: &MemoryReportRepository, id: &ReportId) {
    let Some(stored) = reports.get(id) else {
        return;
    };
    match serde_json::to_string_pretty(&stored) {
        Ok(json) => println!("{}", json),
        Err(e) => log::warn!("Failed to render report {}: {}", id, e),
    }
}

fn exit_code(outcome: Option<&RunOutcome>) -> ExitCode {
    match outcome {
        Some(RunOutcome::Reported(_) | RunOutcome::Declined) => ExitCode::SUCCESS,
        Some(RunOutcome::Rejected(_)) => ExitCode::from(2),
        None => ExitCode::FAILURE,
    }
}
