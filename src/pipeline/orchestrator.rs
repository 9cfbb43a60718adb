//! Run orchestrator.
//!
//! One sequential pass over the input directory:
//! 1. List spreadsheets once, sorted by file name
//! 2. Per file: read → validate → compose → send, or skip
//! 3. Record every outcome as it happens
//! 4. Flush the result files and report the summary
//!
//! Per-file errors become outcomes; only a missing input directory or an
//! unwritable logs directory stops the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::backend::SendBackend;
use crate::compose::MessageComposer;
use crate::config::RunConfig;
use crate::error::{PipelineError, Result};
use crate::results::{ResultRecorder, RunSummary, SendOutcome};
use crate::sheet::{self, is_spreadsheet};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub log_path: PathBuf,
    pub csv_path: PathBuf,
}

pub struct RunOrchestrator {
    config: Arc<RunConfig>,
    composer: MessageComposer,
    backend: Box<dyn SendBackend>,
}

impl RunOrchestrator {
    pub fn new(
        config: Arc<RunConfig>,
        composer: MessageComposer,
        backend: Box<dyn SendBackend>,
    ) -> Self {
        Self {
            config,
            composer,
            backend,
        }
    }

    /// Process every spreadsheet in `input_dir`, writing results to `logs_dir`.
    pub async fn run(
        &self,
        input_dir: &Path,
        logs_dir: &Path,
        started_at: &DateTime<Local>,
    ) -> Result<RunReport> {
        let files = scan_input_dir(input_dir)?;
        let mut recorder = ResultRecorder::create(logs_dir, started_at)?;

        if files.is_empty() {
            warn!(dir = %input_dir.display(), "No spreadsheet files found");
        } else {
            info!(dir = %input_dir.display(), count = files.len(), "Found input file(s)");
        }

        self.process_all(&files, &mut recorder).await;

        let log_path = recorder.log_path().to_path_buf();
        let csv_path = recorder.csv_path().to_path_buf();
        let summary = recorder.finish()?;
        info!("Done — {summary}");

        Ok(RunReport {
            summary,
            log_path,
            csv_path,
        })
    }

    /// Run `files` through the pipeline in order, recording one outcome each.
    pub async fn process_all(&self, files: &[PathBuf], recorder: &mut ResultRecorder) {
        for path in files {
            let outcome = self.process_file(path).await;
            if let Err(e) = recorder.record(outcome) {
                error!(file = %path.display(), error = %e, "Failed to write outcome");
            }
        }
    }

    /// Read, validate and send one file. Never fails: every path ends in an outcome.
    pub async fn process_file(&self, path: &Path) -> SendOutcome {
        let file = display_name(path);
        info!(file = %file, "Processing");

        let fields = match sheet::read_fields(path) {
            Ok(fields) => fields,
            Err(e) => {
                error!(file = %file, error = %e, "Cannot read spreadsheet");
                return SendOutcome::read_failed(&file, e);
            }
        };

        let record = match sheet::validate(&fields) {
            Ok(record) => record,
            Err(missing) => {
                warn!(file = %file, missing = ?missing.labels, "Skipping file with missing fields");
                return SendOutcome::skipped(&file, &missing);
            }
        };

        let message = self.composer.compose(&record);
        match self
            .backend
            .send(&message, self.config.cc_email.as_deref())
            .await
        {
            Ok(()) => {
                info!(file = %file, to = %message.recipient_email, "[SENT]");
                SendOutcome::sent(&file, &record, &message.recipient_email)
            }
            Err(e) => {
                error!(
                    file = %file,
                    to = %message.recipient_email,
                    backend = self.backend.name(),
                    error = %e,
                    "[FAILED]"
                );
                SendOutcome::send_failed(&file, &record, &message.recipient_email, e)
            }
        }
    }
}

/// List spreadsheet files in `dir`, sorted by file name.
///
/// The listing is taken once; files added later are not picked up.
pub fn scan_input_dir(dir: &Path) -> std::result::Result<Vec<PathBuf>, PipelineError> {
    if !dir.exists() {
        return Err(PipelineError::InputDirMissing {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(PipelineError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|source| PipelineError::ListFailed {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PipelineError::ListFailed {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && is_spreadsheet(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
