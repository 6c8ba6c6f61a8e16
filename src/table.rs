// 📄 Table - the tabular shape exchanged with the upload/export collaborator
//
// Raw string cells only. Column meaning is assigned later by the mapping layer.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::RowError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Table { headers, rows }
    }

    /// Load a CSV file (UTF-8, falling back to ISO-8859-1)
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read CSV file: {:?}", path))?;
        Self::from_bytes(&bytes).with_context(|| format!("Failed to parse CSV file: {:?}", path))
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).context("Failed to read CSV input")?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = decode(bytes);
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = rdr
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(clean_header)
            .collect();

        let mut rows = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.with_context(|| format!("Failed to read CSV row {}", row_index))?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();

            if row.len() > headers.len() {
                tracing::warn!(
                    row_index,
                    cells = row.len(),
                    columns = headers.len(),
                    "row has more cells than headers; extra cells dropped"
                );
                row.truncate(headers.len());
            }
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Table { headers, rows })
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)
            .with_context(|| format!("Failed to create output file: {:?}", path))?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers).context("Failed to write CSV header")?;
        for row in &self.rows {
            wtr.write_record(row).context("Failed to write CSV row")?;
        }
        wtr.flush().context("Failed to flush CSV output")?;
        Ok(())
    }
}

/// UTF-8 when valid, otherwise ISO-8859-1 (every byte is a code point)
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            tracing::debug!("input is not valid UTF-8; decoding as ISO-8859-1");
            Cow::Owned(bytes.iter().map(|&b| b as char).collect())
        }
    }
}

/// Strip surrounding whitespace and any double quotes from a header name
fn clean_header(raw: &str) -> String {
    raw.trim().replace('"', "")
}

// ============================================================================
// ROW ERROR EXPORT
// ============================================================================

#[derive(Debug, Serialize)]
struct ErrorRow<'a> {
    row_index: usize,
    account_id: &'a str,
    severity: &'static str,
    kind: &'static str,
    message: String,
}

pub fn write_errors<W: Write>(errors: &[RowError], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for error in errors {
        wtr.serialize(ErrorRow {
            row_index: error.row_index,
            account_id: error.account_id.as_deref().unwrap_or(""),
            severity: error.severity().as_str(),
            kind: error.kind.code(),
            message: error.kind.to_string(),
        })
        .context("Failed to write error row")?;
    }
    wtr.flush().context("Failed to flush error output")?;
    Ok(())
}

pub fn save_errors(errors: &[RowError], path: &Path) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create error file: {:?}", path))?;
    write_errors(errors, file)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RowErrorKind;

    #[test]
    fn test_load_cleans_headers_and_pads_rows() {
        let csv = "\u{feff} \"Account ID\" ,Domain,Billing Country\n1,acme.com,Germany\n2,acme.de\n";

        let table = Table::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["Account ID", "Domain", "Billing Country"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["2", "acme.de", ""]);
        assert_eq!(table.column_index("Domain"), Some(1));
        assert_eq!(table.cell(0, 2), Some("Germany"));
    }

    #[test]
    fn test_truncates_long_rows() {
        let table = Table::from_bytes(b"a,b\n1,2,3\n").unwrap();
        assert_eq!(table.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn test_latin1_fallback() {
        // "Müller" with ü encoded as 0xFC (ISO-8859-1)
        let bytes = b"Account Name\nM\xfcller GmbH\n";

        let table = Table::from_bytes(bytes).unwrap();

        assert_eq!(table.rows[0][0], "Müller GmbH");
    }

    #[test]
    fn test_write_round_trip() {
        let table = Table::new(
            vec!["Account ID".to_string(), "Account Name".to_string()],
            vec![vec!["1".to_string(), "Acme, Inc".to_string()]],
        );

        let mut out = Vec::new();
        table.to_writer(&mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Account ID,Account Name\n1,\"Acme, Inc\"\n");
    }

    #[test]
    fn test_write_errors() {
        let errors = vec![RowError::new(
            2,
            None,
            RowErrorKind::MissingRequiredField {
                field: "account_id".to_string(),
            },
        )];

        let mut out = Vec::new();
        write_errors(&errors, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("row_index,account_id,severity,kind,message\n"));
        assert!(text.contains("2,,Critical,MissingRequiredField,"));
    }
}
