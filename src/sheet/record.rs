//! Required-field validation.

use super::reader::SheetFields;

pub const RITM_LABEL: &str = "RITM";
pub const AIDE_ID_LABEL: &str = "AIDE_ID";
pub const AIDE_NAME_LABEL: &str = "AIDE NAME";
pub const OWNER_LABEL: &str = "Application Owner";

/// Labels every onboarding sheet must carry, in reporting order.
pub const REQUIRED_LABELS: [&str; 4] = [RITM_LABEL, AIDE_ID_LABEL, AIDE_NAME_LABEL, OWNER_LABEL];

/// A fully populated onboarding request. Only built by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingRecord {
    pub ritm: String,
    pub aide_id: String,
    pub aide_name: String,
    /// Bare username or full email address.
    pub owner: String,
}

/// Required labels that were absent or blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing required fields: {}", .labels.join(", "))]
pub struct MissingFields {
    pub labels: Vec<&'static str>,
}

/// Build a record when all four required labels have non-empty values.
pub fn validate(fields: &SheetFields) -> Result<OnboardingRecord, MissingFields> {
    let missing: Vec<&'static str> = REQUIRED_LABELS
        .iter()
        .copied()
        .filter(|label| fields.get(label).is_none())
        .collect();

    if !missing.is_empty() {
        return Err(MissingFields { labels: missing });
    }

    let value = |label: &str| fields.get(label).unwrap_or_default().to_string();
    Ok(OnboardingRecord {
        ritm: value(RITM_LABEL),
        aide_id: value(AIDE_ID_LABEL),
        aide_name: value(AIDE_NAME_LABEL),
        owner: value(OWNER_LABEL),
    })
}
