//! Onboarding spreadsheet input.
//!
//! Each input file is a two-column key/value sheet: column A holds a label,
//! column B its value. `reader` turns a file into a label map, `record`
//! checks that the four required labels are present.

pub mod reader;
pub mod record;

pub use reader::{SheetFields, is_spreadsheet, read_fields};
pub use record::{MissingFields, OnboardingRecord, REQUIRED_LABELS, validate};
