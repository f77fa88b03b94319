mod cli;

use clap::Parser;
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ProgressObserver};
use scan_batch::{
    api::ApiClient,
    auth::{CredentialProvider, StaticCredentials},
    capture::FileCaptureSource,
    error::{self, ScanError},
    storage, utils, BatchSession, Config, SequentialUploader,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scan_batch=info,warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Upload {
            files,
            assessment,
            student,
            remove,
            yes,
        } => upload_batch(&config, files, assessment, student, &remove, yes).await,

        Commands::Exams { assessment, format } => list_exams(&config, assessment, &format).await,

        Commands::SetReference { assessment, exam } => set_reference(&config, assessment, exam).await,

        Commands::History { limit, format } => show_history(&config, limit, &format),

        Commands::Init => initialize(&config, &cli.config),
    };

    if let Err(e) = result {
        if e.is_user_error() {
            eprintln!("{}", e.to_string().yellow());
        } else {
            error!("{}", format!("Error: {}", e).red());
        }
        std::process::exit(1);
    }
}

async fn upload_batch(
    config: &Config,
    files: Vec<PathBuf>,
    assessment: Option<i64>,
    student: Option<i64>,
    remove: &[u32],
    yes: bool,
) -> error::Result<()> {
    let target = config.upload_target(assessment, student);
    let observer = Arc::new(ProgressObserver::new());
    let mut session = BatchSession::with_observer(target.clone(), observer);

    println!("{}", format!("Capturing batch for {}", target).cyan());
    let mut source = FileCaptureSource::new(files);
    while source.remaining() > 0 {
        if let Err(e) = session.capture(&mut source) {
            warn!("Skipping image: {}", e);
        }
    }

    for order in remove {
        session.remove(*order)?;
    }

    session.review().enter()?;
    print_review(&session);

    if !yes && !utils::confirm_action(&format!("Upload {} scans?", session.images().len())) {
        let dropped = session.cancel()?;
        println!("Cancelled, {} scans discarded", dropped);
        return Ok(());
    }

    let credentials = StaticCredentials::from_config(&config.auth);
    if let Some(user) = credentials.current_user() {
        info!("Uploading as {}", user);
    }
    session.review().confirm_upload(&credentials)?;

    let client = ApiClient::new(&config.api.base_url, config.request_timeout())?;
    let uploader = SequentialUploader::new(Arc::new(client), config.per_call_timeout());
    let result = session.upload(&uploader).await?;

    result.print_summary();

    match storage::Database::new(&config.database.path) {
        Ok(db) => {
            if let Err(e) = db.save_batch_result(&session.id().to_string(), &target, &result) {
                warn!("Failed to record batch in ledger: {}", e);
            }
        }
        Err(e) => warn!("Upload ledger unavailable: {}", e),
    }

    Ok(())
}

fn print_review(session: &BatchSession) {
    println!("\n{}", format!("Review batch ({})", session.images().len()).yellow());
    utils::print_table_border(70);
    utils::print_table_row(&["Order", "Image", "Status"], &[6, 48, 10]);
    utils::print_table_border(70);
    for image in session.images() {
        utils::print_table_row(
            &[
                &format!("#{}", image.order),
                &image.local_ref.to_string(),
                &image.status.to_string(),
            ],
            &[6, 48, 10],
        );
    }
    utils::print_table_border(70);
}

fn require_credential(config: &Config) -> error::Result<String> {
    StaticCredentials::from_config(&config.auth)
        .credential()
        .ok_or(ScanError::Unauthenticated)
}

async fn list_exams(config: &Config, assessment: i64, format: &str) -> error::Result<()> {
    let credential = require_credential(config)?;
    let client = ApiClient::new(&config.api.base_url, config.request_timeout())?;
    let exams = client.list_assessment_exams(&credential, assessment).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&exams)?);
        return Ok(());
    }

    println!("{}", format!("=== Exams for assessment #{} ===", assessment).cyan().bold());
    if exams.is_empty() {
        println!("No exams uploaded yet");
        return Ok(());
    }

    utils::print_table_border(80);
    utils::print_table_row(&["Exam", "Title", "Student", "Score"], &[8, 40, 10, 8]);
    utils::print_table_border(80);
    for exam in &exams {
        utils::print_table_row(
            &[
                &format!("#{}", exam.id),
                &exam.title,
                &utils::format_optional_id(exam.student_id),
                &exam.score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
            ],
            &[8, 40, 10, 8],
        );
    }
    utils::print_table_border(80);

    Ok(())
}

async fn set_reference(config: &Config, assessment: i64, exam: i64) -> error::Result<()> {
    let credential = require_credential(config)?;
    let client = ApiClient::new(&config.api.base_url, config.request_timeout())?;
    let updated = client.set_reference_exam(&credential, assessment, exam).await?;

    println!(
        "{} Exam #{} is now the reference for \"{}\"",
        "✓".green(),
        exam,
        updated.title
    );
    Ok(())
}

fn show_history(config: &Config, limit: usize, format: &str) -> error::Result<()> {
    let db = storage::Database::new(&config.database.path)?;
    let runs = db.get_batch_history(Some(limit))?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    let stats = db.get_stats()?;
    println!("{}", "=== Upload History ===".cyan().bold());
    println!("Runs:       {}", stats.total_runs);
    println!("Uploaded:   {}", stats.total_succeeded.to_string().green());
    println!("Failed:     {}", stats.total_failed.to_string().red());
    println!("Success:    {:.1}%", stats.success_rate());

    if runs.is_empty() {
        return Ok(());
    }

    println!();
    utils::print_table_border(90);
    utils::print_table_row(
        &["Completed", "Session", "Assessment", "Sent", "OK", "Failed"],
        &[24, 16, 12, 6, 6, 6],
    );
    utils::print_table_border(90);
    for run in &runs {
        utils::print_table_row(
            &[
                &utils::format_timestamp(&run.completed_at),
                &utils::format_id(&run.session_id),
                &utils::format_optional_id(run.assessment_id),
                &run.attempted.to_string(),
                &run.succeeded.to_string(),
                &run.failed.to_string(),
            ],
            &[24, 16, 12, 6, 6, 6],
        );
        for failure in db.get_failures(&run.session_id)? {
            println!("    #{:<4} {}", failure.image_order, failure.error_detail.yellow());
        }
    }
    utils::print_table_border(90);

    Ok(())
}

fn initialize(config: &Config, config_path: &str) -> error::Result<()> {
    println!("{}", "Initializing scan-batch...".green());

    if Path::new(config_path).exists() {
        println!("{} Using existing {}", "✓".green(), config_path);
    } else {
        std::fs::write(config_path, config.to_toml()?)?;
        println!("{} Wrote default configuration to {}", "✓".green(), config_path);
    }

    let _db = storage::Database::new(&config.database.path)?;
    println!("{}", "✓ Upload ledger initialized".green());

    println!("\n{}", "Configuration:".cyan());
    println!("  API URL:        {}", config.api.base_url);
    println!("  Upload timeout: {}s per image", config.upload.per_call_timeout_secs);
    println!("  Ledger:         {}", config.database.path);
    println!(
        "  Signed in:      {}",
        if config.auth.token.is_some() { "yes" } else { "no (set SCAN_AUTH__TOKEN)" }
    );

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to upload a batch", "scan-batch upload page1.jpg page2.jpg -a 3".yellow());
    println!("  {} to review past runs", "scan-batch history".yellow());
    Ok(())
}
