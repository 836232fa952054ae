use crate::domain::phone::NormalizedNumber;
use crate::error::CoreError;
use serde::Serialize;

/// One old-to-new pair read from the mapping file, trimmed but otherwise raw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRow {
    /// 1-based data line number, header excluded.
    pub line: usize,
    pub old_raw: String,
    pub new_raw: String,
}

impl MappingRow {
    /// Builds a row from optional cell values. Rows with a blank side are
    /// dropped and yield `None`.
    pub fn from_cells(line: usize, old: Option<&str>, new: Option<&str>) -> Option<Self> {
        let old_raw = old.map(str::trim).unwrap_or_default();
        let new_raw = new.map(str::trim).unwrap_or_default();
        if old_raw.is_empty() || new_raw.is_empty() {
            return None;
        }
        Some(Self {
            line,
            old_raw: old_raw.to_string(),
            new_raw: new_raw.to_string(),
        })
    }

    /// `None` when the old side has no digits to match against.
    pub fn old_number(&self) -> Option<NormalizedNumber> {
        NormalizedNumber::parse(&self.old_raw).ok()
    }

    /// The replacement must carry digits; an empty number is never written.
    pub fn new_number(&self) -> Result<NormalizedNumber, CoreError> {
        NormalizedNumber::parse(&self.new_raw)
    }
}
