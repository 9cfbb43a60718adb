//! Per-file processing pipeline.
//!
//! Every input file flows through:
//! 1. `sheet::read_fields()` — spreadsheet → label map
//! 2. `sheet::validate()` — required labels present, or the file is skipped
//! 3. `MessageComposer::compose()` — subject, recipient, body
//! 4. `SendBackend::send()` — relay or desktop client
//! 5. `ResultRecorder::record()` — one outcome per file
//!
//! **No file is ever half-sent.** Skipped files never reach a backend.

pub mod orchestrator;

pub use orchestrator::{RunOrchestrator, RunReport, scan_input_dir};
