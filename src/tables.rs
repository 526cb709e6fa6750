//! Delimited reference tables with named columns.
//!
//! Upstream tables come from spreadsheets exported by hand, so the reader is
//! lenient: lines with more fields than the header are skipped, short lines
//! read as empty trailing cells, a UTF-8 BOM is dropped and invalid UTF-8 is
//! replaced rather than rejected.

use crate::error::{Result, ScoreError};
use std::collections::HashSet;
use tracing::warn;

/// A table read into memory: headers plus string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Read a delimited table. The first line holds the column names.
    pub fn read(name: impl Into<String>, bytes: &[u8], delimiter: u8) -> Result<Self> {
        let name = name.into();
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for record in reader.byte_records() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!(table = %name, error = %e, "Skipping unreadable line");
                    skipped += 1;
                    continue;
                }
            };
            if record.len() > headers.len() {
                skipped += 1;
                continue;
            }
            rows.push(
                record
                    .iter()
                    .map(|cell| String::from_utf8_lossy(cell).into_owned())
                    .collect(),
            );
        }

        if skipped > 0 {
            warn!(table = %name, skipped, "Skipped malformed lines");
        }

        Ok(Self {
            name,
            headers,
            rows,
        })
    }

    /// Index of a column by exact (trimmed) header name.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header.trim())
    }

    /// Like [`Table::column`] but a missing column is an error.
    pub fn require_column(&self, header: &str) -> Result<usize> {
        self.column(header)
            .ok_or_else(|| ScoreError::table(&self.name, format!("missing column '{}'", header)))
    }

    /// Cell at `row`/`column`, or `""` if out of range.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Drop repeated lines of a delimited file, keeping first occurrences.
///
/// Rows are compared on every column. The header line is kept as is.
pub fn dedupe_rows(bytes: &[u8], delimiter: u8) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_byte_record(reader.byte_headers()?)?;

    let mut seen = HashSet::new();
    for record in reader.byte_records() {
        let record = record?;
        let key: Vec<Vec<u8>> = record.iter().map(<[u8]>::to_vec).collect();
        if seen.insert(key) {
            writer.write_byte_record(&record)?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ScoreError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_named_columns() {
        let table = Table::read("qualis", b"ISSN,Titulo,Estrato\n1234-5678,Journal,A1\n", b',').unwrap();
        assert_eq!(table.headers, vec!["ISSN", "Titulo", "Estrato"]);
        assert_eq!(table.len(), 1);
        let col = table.require_column("Estrato").unwrap();
        assert_eq!(table.cell(0, col), "A1");
    }

    #[test]
    fn test_missing_column_is_table_error() {
        let table = Table::read("qualis", b"ISSN,Estrato\n", b',').unwrap();
        let err = table.require_column("Area").unwrap_err();
        assert!(matches!(err, ScoreError::Table { .. }));
        assert!(err.to_string().contains("Area"));
    }

    #[test]
    fn test_skips_overlong_lines() {
        let data = b"Issn;SJR;SJR Best Quartile\n15230864;1,2;Q1\nbroken;line;with;extras\n00347612;0,4;Q3\n";
        let table = Table::read("sjr", data, b';').unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 0), "00347612");
    }

    #[test]
    fn test_short_lines_keep_their_cells() {
        let table = Table::read("qualis", b"ISSN,Estrato,Area\n1234-5678,A1\n", b',').unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, 1), "A1");
        assert_eq!(table.cell(0, 2), "");
    }

    #[test]
    fn test_strips_bom_and_tolerates_latin1() {
        let mut data = b"\xEF\xBB\xBFNome Completo,Categoria\n".to_vec();
        data.extend_from_slice(b"Jos\xE9,DP\n");
        let table = Table::read("roster", &data, b',').unwrap();
        assert_eq!(table.column("Nome Completo"), Some(0));
        assert_eq!(table.len(), 1);
        assert!(table.cell(0, 0).starts_with("Jos"));
    }

    #[test]
    fn test_cell_out_of_range_is_empty() {
        let table = Table::read("t", b"a\n1\n", b',').unwrap();
        assert_eq!(table.cell(5, 0), "");
        assert_eq!(table.cell(0, 3), "");
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let data = b"a,b\n1,2\n3,4\n1,2\n5,6\n3,4\n";
        let out = dedupe_rows(data, b',').unwrap();
        assert_eq!(out, "a,b\n1,2\n3,4\n5,6\n");
    }
}
