//! Error types for the onboarding mailer.

use std::path::PathBuf;

/// Top-level error type. Only fatal, pre-run conditions surface through it;
/// per-file failures are converted into outcomes by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Recorder error: {0}")]
    Recorder(#[from] RecorderError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Spreadsheet read failures. Surfaced as a FAILED outcome for the file.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("Cannot open {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Cannot parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Workbook {} has no worksheets", path.display())]
    NoWorksheet { path: PathBuf },
}

/// Errors from a send backend.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Send backend {backend} unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    #[error("Connection to {host}:{port} failed: {reason}")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Authentication failed for {host}: {reason}")]
    Auth { host: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),
}

/// Result file errors.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("Cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Fatal run-level errors raised before any file is processed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Input directory not found: {}", path.display())]
    InputDirMissing { path: PathBuf },

    #[error("Input path is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Cannot list input directory {}: {source}", path.display())]
    ListFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for the mailer.
pub type Result<T> = std::result::Result<T, Error>;
