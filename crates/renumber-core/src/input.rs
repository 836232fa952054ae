use crate::domain::mapping::MappingRow;
use crate::error::{CoreError, MappingError};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const DEFAULT_OLD_COLUMN: &str = "Old Mobile No.";
pub const DEFAULT_NEW_COLUMN: &str = "New Mobile No.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingColumns {
    pub old: String,
    pub new: String,
}

impl MappingColumns {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Result<Self, CoreError> {
        let old = old.into();
        let new = new.into();
        if old.trim().is_empty() || new.trim().is_empty() {
            return Err(CoreError::EmptyColumnName);
        }
        Ok(Self { old, new })
    }
}

impl Default for MappingColumns {
    fn default() -> Self {
        Self {
            old: DEFAULT_OLD_COLUMN.to_string(),
            new: DEFAULT_NEW_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MappingFile {
    pub rows: Vec<MappingRow>,
    /// Data lines dropped because one of the two cells was blank.
    pub skipped: usize,
}

pub fn read_mappings(path: &Path, columns: &MappingColumns) -> Result<MappingFile, MappingError> {
    let file = File::open(path).map_err(|source| MappingError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_mappings(file, columns)
}

pub fn parse_mappings<R: Read>(
    reader: R,
    columns: &MappingColumns,
) -> Result<MappingFile, MappingError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let old_idx = column_index(&headers, &columns.old)?;
    let new_idx = column_index(&headers, &columns.new)?;

    let mut out = MappingFile::default();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        match MappingRow::from_cells(idx + 1, record.get(old_idx), record.get(new_idx)) {
            Some(row) => out.rows.push(row),
            None => out.skipped += 1,
        }
    }
    Ok(out)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, MappingError> {
    let wanted = name.trim();
    headers
        .iter()
        .position(|header| header.trim_start_matches('\u{feff}').trim() == wanted)
        .ok_or_else(|| MappingError::MissingColumn(wanted.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_mappings, MappingColumns};
    use crate::error::MappingError;

    #[test]
    fn parses_rows_by_header_name() {
        let data = "Name,Old Mobile No.,New Mobile No.\nAda,+91 98765 43210,9123456789\n";
        let parsed = parse_mappings(data.as_bytes(), &MappingColumns::default()).expect("parse");
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].old_raw, "+91 98765 43210");
        assert_eq!(parsed.rows[0].new_raw, "9123456789");
        assert_eq!(parsed.rows[0].line, 1);
    }

    #[test]
    fn skips_blank_and_short_rows() {
        let data = "Old Mobile No.,New Mobile No.\n9876543210,\n,9123456789\n9876543210\n1112223333,4445556666\n";
        let parsed = parse_mappings(data.as_bytes(), &MappingColumns::default()).expect("parse");
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped, 3);
        assert_eq!(parsed.rows[0].line, 4);
    }

    #[test]
    fn tolerates_byte_order_mark() {
        let data = "\u{feff}Old Mobile No.,New Mobile No.\n9876543210,9123456789\n";
        let parsed = parse_mappings(data.as_bytes(), &MappingColumns::default()).expect("parse");
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn missing_column_is_an_error() {
        let data = "Old,New\n9876543210,9123456789\n";
        let err = parse_mappings(data.as_bytes(), &MappingColumns::default()).unwrap_err();
        assert!(matches!(err, MappingError::MissingColumn(name) if name == "Old Mobile No."));
    }

    #[test]
    fn custom_columns_are_honoured() {
        let columns = MappingColumns::new("from", "to").expect("columns");
        let data = "from,to\n9876543210,9123456789\n";
        let parsed = parse_mappings(data.as_bytes(), &columns).expect("parse");
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn empty_column_names_are_rejected() {
        assert!(MappingColumns::new(" ", "to").is_err());
    }
}
