//! Result recorder — outcome log plus CSV results file for one run.
//!
//! Both files are written as outcomes arrive, so a run that dies halfway
//! still leaves every outcome recorded up to that point.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use super::outcome::{RunSummary, SendOutcome};
use crate::error::RecorderError;

/// Column order of the results file.
pub const CSV_HEADER: [&str; 7] = [
    "file",
    "ritm",
    "aide_id",
    "aide_name",
    "to_email",
    "status",
    "error",
];

/// File name stamp for a run started at `started_at`.
pub fn run_stamp(started_at: &DateTime<Local>) -> String {
    started_at.format("%Y%m%d_%H%M%S").to_string()
}

/// One outcome as a log line.
pub fn format_log_line(outcome: &SendOutcome, at: &DateTime<Local>) -> String {
    let mut line = format!(
        "{} | {} | {}",
        at.format("%Y-%m-%d %H:%M:%S"),
        outcome.status,
        outcome.source_file
    );
    if let Some(to) = &outcome.recipient {
        line.push_str(" -> ");
        line.push_str(to);
    }
    if let Some(error) = &outcome.error {
        line.push_str(" : ");
        line.push_str(error);
    }
    line
}

pub struct ResultRecorder {
    log_path: PathBuf,
    csv_path: PathBuf,
    log: BufWriter<File>,
    csv: csv::Writer<File>,
    outcomes: Vec<SendOutcome>,
}

impl ResultRecorder {
    /// Create `email_log_{stamp}.log` and `results_{stamp}.csv` in `logs_dir`.
    ///
    /// A numeric suffix is added when files for the same second already exist.
    pub fn create(logs_dir: &Path, started_at: &DateTime<Local>) -> Result<Self, RecorderError> {
        std::fs::create_dir_all(logs_dir).map_err(|source| RecorderError::Io {
            path: logs_dir.to_path_buf(),
            source,
        })?;

        let stamp = run_stamp(started_at);
        let mut attempt = 0u32;
        let (log_path, csv_path) = loop {
            let suffix = if attempt == 0 {
                stamp.clone()
            } else {
                format!("{stamp}_{attempt}")
            };
            let log = logs_dir.join(format!("email_log_{suffix}.log"));
            let csv = logs_dir.join(format!("results_{suffix}.csv"));
            if !log.exists() && !csv.exists() {
                break (log, csv);
            }
            attempt += 1;
        };

        let log_file = create_new(&log_path)?;
        let csv_file = create_new(&csv_path)?;

        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(csv_file);
        csv.write_record(CSV_HEADER)?;
        csv.flush().map_err(|source| RecorderError::Io {
            path: csv_path.clone(),
            source,
        })?;

        Ok(Self {
            log_path,
            csv_path,
            log: BufWriter::new(log_file),
            csv,
            outcomes: Vec::new(),
        })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_outcomes(&self.outcomes)
    }

    /// Append `outcome` and write it through to both files.
    ///
    /// The outcome is kept in memory even when the write fails.
    pub fn record(&mut self, outcome: SendOutcome) -> Result<(), RecorderError> {
        let written = self.write_through(&outcome);
        self.outcomes.push(outcome);
        written
    }

    fn write_through(&mut self, outcome: &SendOutcome) -> Result<(), RecorderError> {
        let line = format_log_line(outcome, &Local::now());
        writeln!(self.log, "{line}")
            .and_then(|()| self.log.flush())
            .map_err(|source| RecorderError::Io {
                path: self.log_path.clone(),
                source,
            })?;

        self.csv.serialize(outcome)?;
        self.csv.flush().map_err(|source| RecorderError::Io {
            path: self.csv_path.clone(),
            source,
        })
    }

    /// Flush both files and return the run summary.
    pub fn finish(mut self) -> Result<RunSummary, RecorderError> {
        self.log.flush().map_err(|source| RecorderError::Io {
            path: self.log_path.clone(),
            source,
        })?;
        self.csv.flush().map_err(|source| RecorderError::Io {
            path: self.csv_path.clone(),
            source,
        })?;
        info!(
            log = %self.log_path.display(),
            results = %self.csv_path.display(),
            "Results saved"
        );
        Ok(self.summary())
    }
}

fn create_new(path: &Path) -> Result<File, RecorderError> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| RecorderError::Io {
            path: path.to_path_buf(),
            source,
        })
}
