//! Onboarding mailer — spreadsheet-driven welcome emails.

pub mod backend;
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod results;
pub mod sheet;
