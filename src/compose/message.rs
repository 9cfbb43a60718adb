//! Subject, recipient and body for one onboarding record.

use std::sync::Arc;

use super::banner::InlineImage;
use crate::sheet::OnboardingRecord;

/// Static welcome body. References the banner as `cid:orbit_banner`.
pub const WELCOME_HTML: &str = include_str!("welcome.html");

const SUBJECT_PREFIX: &str = "Welcome to ORBIT Power BI - Your Guide to Getting Started";

/// A message ready for a send backend.
#[derive(Debug, Clone)]
pub struct ComposedMessage {
    pub subject: String,
    pub recipient_email: String,
    pub html_body: &'static str,
    pub banner: Option<Arc<InlineImage>>,
}

/// Builds messages from validated records. Holds the per-run constants.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    domain: String,
    banner: Option<Arc<InlineImage>>,
}

impl MessageComposer {
    pub fn new(domain: impl Into<String>, banner: Option<InlineImage>) -> Self {
        Self {
            domain: domain.into(),
            banner: banner.map(Arc::new),
        }
    }

    pub fn has_banner(&self) -> bool {
        self.banner.is_some()
    }

    pub fn compose(&self, record: &OnboardingRecord) -> ComposedMessage {
        ComposedMessage {
            subject: subject_line(record),
            recipient_email: resolve_recipient(&record.owner, &self.domain),
            html_body: WELCOME_HTML,
            banner: self.banner.clone(),
        }
    }
}

/// `Welcome to ... - [ritm][aide_id][aide_name]`
pub fn subject_line(record: &OnboardingRecord) -> String {
    format!(
        "{SUBJECT_PREFIX} - [{}][{}][{}]",
        record.ritm, record.aide_id, record.aide_name
    )
}

/// Owners containing `@` are used verbatim; bare usernames get `@{domain}`.
pub fn resolve_recipient(owner: &str, domain: &str) -> String {
    if owner.contains('@') {
        owner.to_string()
    } else {
        format!("{owner}@{domain}")
    }
}
