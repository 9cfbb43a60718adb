use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use onboard_mailer::backend::create_backend;
use onboard_mailer::cli::Args;
use onboard_mailer::compose::{InlineImage, MessageComposer};
use onboard_mailer::config::RunConfig;
use onboard_mailer::pipeline::RunOrchestrator;
use onboard_mailer::results::recorder::run_stamp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let args = Args::parse();
    let started_at = Local::now();

    // Keep the guard alive so the file writer drains on exit.
    let _log_guard = init_tracing(&args.logs_dir, &started_at)?;

    eprintln!("📧 Onboard Mailer v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Config: {}", args.config.display());
    eprintln!("   Input: {}", args.input_dir.display());
    eprintln!("   Logs: {}", args.logs_dir.display());

    let config = RunConfig::load(&args.config)
        .with_context(|| format!("Cannot load configuration from {}", args.config.display()))?;
    let config = Arc::new(config);
    eprintln!("   Send method: {}", config.send_method.as_str());
    eprintln!("   Domain: {}", config.email_domain);
    eprintln!(
        "   CC: {}",
        config.cc_email.as_deref().unwrap_or("(none)")
    );

    let backend = create_backend(&config)?;
    let composer = MessageComposer::new(config.email_domain.clone(), InlineImage::load(&args.banner));
    eprintln!(
        "   Banner: {}\n",
        if composer.has_banner() {
            args.banner.display().to_string()
        } else {
            "(not found, sending without it)".to_string()
        }
    );
    let orchestrator = RunOrchestrator::new(Arc::clone(&config), composer, backend);

    let report = orchestrator
        .run(&args.input_dir, &args.logs_dir, &started_at)
        .await?;

    eprintln!("\nDone — {}", report.summary);
    eprintln!("   Log: {}", report.log_path.display());
    eprintln!("   Results: {}", report.csv_path.display());
    Ok(())
}

/// Console output on stderr plus a full diagnostic trace in `logs/run_{stamp}.log`.
fn init_tracing(logs_dir: &Path, started_at: &DateTime<Local>) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Cannot create logs directory {}", logs_dir.display()))?;

    let file_appender =
        tracing_appender::rolling::never(logs_dir, format!("run_{}.log", run_stamp(started_at)));
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}
