//! Per-file outcome types.

use std::fmt;

use serde::Serialize;

use crate::sheet::{MissingFields, OnboardingRecord};

/// Final state of one input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SendStatus {
    Sent,
    Failed,
    Skipped,
}

impl SendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendStatus::Sent => "SENT",
            SendStatus::Failed => "FAILED",
            SendStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for SendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the results file. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendOutcome {
    #[serde(rename = "file")]
    pub source_file: String,
    pub ritm: Option<String>,
    pub aide_id: Option<String>,
    pub aide_name: Option<String>,
    #[serde(rename = "to_email")]
    pub recipient: Option<String>,
    pub status: SendStatus,
    pub error: Option<String>,
}

impl SendOutcome {
    fn for_record(
        file: &str,
        record: &OnboardingRecord,
        recipient: &str,
        status: SendStatus,
        error: Option<String>,
    ) -> Self {
        Self {
            source_file: file.to_string(),
            ritm: Some(record.ritm.clone()),
            aide_id: Some(record.aide_id.clone()),
            aide_name: Some(record.aide_name.clone()),
            recipient: Some(recipient.to_string()),
            status,
            error,
        }
    }

    fn bare(file: &str, status: SendStatus, error: String) -> Self {
        Self {
            source_file: file.to_string(),
            ritm: None,
            aide_id: None,
            aide_name: None,
            recipient: None,
            status,
            error: Some(error),
        }
    }

    pub fn sent(file: &str, record: &OnboardingRecord, recipient: &str) -> Self {
        Self::for_record(file, record, recipient, SendStatus::Sent, None)
    }

    pub fn send_failed(
        file: &str,
        record: &OnboardingRecord,
        recipient: &str,
        error: impl fmt::Display,
    ) -> Self {
        Self::for_record(
            file,
            record,
            recipient,
            SendStatus::Failed,
            Some(error.to_string()),
        )
    }

    /// The file could not be opened or parsed.
    pub fn read_failed(file: &str, error: impl fmt::Display) -> Self {
        Self::bare(file, SendStatus::Failed, error.to_string())
    }

    pub fn skipped(file: &str, missing: &MissingFields) -> Self {
        Self::bare(file, SendStatus::Skipped, missing.to_string())
    }
}

/// Counts per status for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a SendOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome.status {
                SendStatus::Sent => summary.sent += 1,
                SendStatus::Failed => summary.failed += 1,
                SendStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.sent + self.failed + self.skipped
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sent: {} | Failed: {} | Skipped: {}",
            self.sent, self.failed, self.skipped
        )
    }
}
