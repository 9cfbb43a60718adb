//! Key/value extraction from the first worksheet of a workbook.

use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::debug;

use crate::error::ReadError;

/// Extensions accepted by the directory scan (compared case-insensitively).
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

/// Labels mapped to their raw values, covering the whole sheet.
///
/// Labels are trimmed and matched case-sensitively. A repeated label keeps
/// the last non-empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetFields {
    values: HashMap<String, String>,
}

impl SheetFields {
    /// Build from (label, value) pairs, dropping pairs where either side is blank.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut values = HashMap::new();
        for (label, value) in pairs {
            let label = label.as_ref().trim();
            let value = value.as_ref().trim();
            if label.is_empty() || value.is_empty() {
                continue;
            }
            values.insert(label.to_string(), value.to_string());
        }
        Self { values }
    }

    /// Value for `label`, if present and non-empty.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.values.get(label.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Whether `path` names a file the scan should pick up.
///
/// Office lock files (`~$Book.xlsx`) are excluded.
pub fn is_spreadsheet(path: &Path) -> bool {
    let is_lock_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("~$"));
    if is_lock_file {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Open `path` and collect column A → column B pairs from its first worksheet.
pub fn read_fields(path: &Path) -> Result<SheetFields, ReadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| ReadError::Open {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReadError::NoWorksheet {
            path: path.to_path_buf(),
        })?
        .map_err(|e| ReadError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    // Range rows are relative to the first used cell, which is not column A
    // when the label column is blank.
    let start_col = range.start().map_or(0, |(_, col)| col as usize);
    let cell = |row: &[Data], absolute_col: usize| -> String {
        absolute_col
            .checked_sub(start_col)
            .and_then(|idx| row.get(idx))
            .map(cell_text)
            .unwrap_or_default()
    };

    let fields = SheetFields::from_pairs(range.rows().map(|row| (cell(row, 0), cell(row, 1))));
    debug!(file = %path.display(), labels = fields.len(), "Read spreadsheet");
    Ok(fields)
}

/// Display text of a cell. Whole numbers drop the trailing `.0`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", *f as i64)
        }
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_trimmed() {
        let fields = SheetFields::from_pairs([("  RITM ", " RITM0001 "), ("AIDE_ID\t", "AIDE_1")]);
        assert_eq!(fields.get("RITM"), Some("RITM0001"));
        assert_eq!(fields.get("AIDE_ID"), Some("AIDE_1"));
    }

    #[test]
    fn label_match_is_case_sensitive() {
        let fields = SheetFields::from_pairs([("ritm", "RITM0001")]);
        assert_eq!(fields.get("RITM"), None);
    }

    #[test]
    fn inner_whitespace_is_significant() {
        let fields = SheetFields::from_pairs([("AIDE  NAME", "Portal")]);
        assert_eq!(fields.get("AIDE NAME"), None);
    }

    #[test]
    fn blank_pairs_are_dropped() {
        let fields = SheetFields::from_pairs([("RITM", "  "), ("", "orphan"), ("Notes", "x")]);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("RITM"), None);
    }

    #[test]
    fn last_non_empty_value_wins() {
        let fields = SheetFields::from_pairs([
            ("Application Owner", "first"),
            ("Application Owner", "second"),
            ("Application Owner", ""),
        ]);
        assert_eq!(fields.get("Application Owner"), Some("second"));
    }

    #[test]
    fn cell_text_formats() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("abc".into())), "abc");
        assert_eq!(cell_text(&Data::Float(94185.0)), "94185");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Int(42)), "42");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
    }

    #[test]
    fn spreadsheet_extensions() {
        assert!(is_spreadsheet(Path::new("in/ticket.xlsx")));
        assert!(is_spreadsheet(Path::new("in/TICKET.XLSX")));
        assert!(is_spreadsheet(Path::new("in/legacy.xls")));
        assert!(is_spreadsheet(Path::new("in/sheet.ods")));
        assert!(!is_spreadsheet(Path::new("in/notes.txt")));
        assert!(!is_spreadsheet(Path::new("in/no_extension")));
        assert!(!is_spreadsheet(Path::new("in/~$ticket.xlsx")));
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_fields(&dir.path().join("absent.xlsx")).unwrap_err();
        assert!(matches!(err, ReadError::Open { .. }));
    }

    #[test]
    fn corrupt_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        assert!(read_fields(&path).is_err());
    }
}
