//! Parameter table reader
//!
//! Reads a delimiter-separated table whose first record is a header naming
//! the columns. Each following record becomes one [`ParameterRow`]. Fields
//! may be double-quoted. Values are kept as opaque strings; the benchmark
//! binaries do their own validation.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};

use crate::common::{Error, Result};

/// One configuration from the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRow {
    /// 1-based index among data rows
    number: usize,
    /// 1-based line in the source file (0 for rows built in memory)
    line: usize,
    fields: HashMap<String, String>,
}

impl ParameterRow {
    /// Build a row from name/value pairs
    pub fn from_pairs<K, V, I>(number: usize, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            number,
            line: 0,
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// 1-based index among data rows
    pub fn number(&self) -> usize {
        self.number
    }

    /// 1-based source line
    pub fn line(&self) -> usize {
        self.line
    }

    /// Look up a field by column name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Streaming reader over a parameter table
///
/// The header is read and checked by [`ParameterTable::open`]; rows are
/// produced lazily by iterating. Single pass: reopen to read again.
pub struct ParameterTable<R = File> {
    path: PathBuf,
    header: Vec<String>,
    records: StringRecordsIntoIter<R>,
    row_no: usize,
    done: bool,
}

impl ParameterTable {
    /// Open a table file and check its header against `required`
    pub fn open(path: &Path, delimiter: u8, required: &[String]) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::config_io(path, e))?;
        Self::from_reader(path, file, delimiter, required)
    }
}

impl<R: Read> ParameterTable<R> {
    /// Read a table from any byte source
    ///
    /// `path` is only used to label errors.
    pub fn from_reader(
        path: &Path,
        reader: R,
        delimiter: u8,
        required: &[String],
    ) -> Result<Self> {
        // Rows may be shorter or longer than the header
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let record = reader
            .headers()
            .map_err(|e| table_error(path, "header", e))?;
        let line = record.position().map_or(1, |pos| pos.line() as usize);
        let header: Vec<String> = record.iter().map(|name| name.trim().to_string()).collect();

        if header.iter().all(String::is_empty) {
            return Err(Error::config_format(
                path,
                line,
                "table is empty, expected a header row",
            ));
        }

        for name in required {
            if !header.contains(name) {
                return Err(Error::config_format(
                    path,
                    line,
                    format!(
                        "header has no column '{}' (columns: {})",
                        name,
                        header.join(", ")
                    ),
                ));
            }
        }

        tracing::debug!("Opened {} with columns [{}]", path.display(), header.join(", "));

        Ok(Self {
            path: path.to_path_buf(),
            header,
            records: reader.into_records(),
            row_no: 0,
            done: false,
        })
    }

    /// Column names in file order
    pub fn header(&self) -> &[String] {
        &self.header
    }

    fn to_row(&self, record: &StringRecord) -> ParameterRow {
        let line = record.position().map_or(0, |pos| pos.line() as usize);

        let surplus: Vec<&str> = record
            .iter()
            .skip(self.header.len())
            .filter(|value| !value.is_empty())
            .collect();
        if !surplus.is_empty() {
            tracing::warn!(
                "Row {} (line {}) has values past the last column, ignoring [{}]",
                self.row_no,
                line,
                surplus.join(", ")
            );
        }

        // Short rows leave their trailing columns absent
        let fields = self
            .header
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();

        ParameterRow {
            number: self.row_no,
            line,
            fields,
        }
    }
}

impl<R: Read> Iterator for ParameterTable<R> {
    type Item = Result<ParameterRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let record = match self.records.next()? {
                Ok(record) if record.iter().all(|v| v.trim().is_empty()) => continue,
                other => other,
            };
            self.row_no += 1;
            return Some(match record {
                Ok(record) => Ok(self.to_row(&record)),
                Err(e) => {
                    let err = table_error(&self.path, &format!("row {}", self.row_no), e);
                    // A failed read leaves nothing sensible to continue from
                    self.done = matches!(err, Error::ConfigIo { .. });
                    Err(err)
                }
            });
        }
    }
}

/// Map a reader error to a table error
///
/// Read failures are fatal `ConfigIo`; undecodable content stays local to
/// the record as `ConfigFormat`.
fn table_error(path: &Path, what: &str, err: csv::Error) -> Error {
    let line = err.position().map_or(0, |pos| pos.line() as usize);
    match err.into_kind() {
        csv::ErrorKind::Io(e) => Error::config_io(path, e),
        csv::ErrorKind::Utf8 { err, .. } => {
            Error::config_format(path, line, format!("{} is not valid UTF-8: {}", what, err))
        }
        other => Error::config_format(path, line, format!("{}: {:?}", what, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn table(text: &str, required: &[&str]) -> Result<ParameterTable<Cursor<Vec<u8>>>> {
        ParameterTable::from_reader(
            Path::new("Parameters1.txt"),
            Cursor::new(text.as_bytes().to_vec()),
            b'\t',
            &names(required),
        )
    }

    #[test]
    fn test_reads_rows_in_order() {
        let rows: Vec<ParameterRow> = table(
            "clientSetSize\tserverSetSize\n100\t200\n300\t400\n",
            &["clientSetSize", "serverSetSize"],
        )
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number(), 1);
        assert_eq!(rows[0].line(), 2);
        assert_eq!(rows[0].get("clientSetSize"), Some("100"));
        assert_eq!(rows[1].get("serverSetSize"), Some("400"));
    }

    #[test]
    fn test_missing_header_column_is_format_error() {
        let err = table("clientSetSize\n1\n", &["clientSetSize", "maxPP"])
            .err()
            .unwrap();
        match err {
            Error::ConfigFormat { line, message, .. } => {
                assert_eq!(line, 1);
                assert!(message.contains("maxPP"));
            }
            other => panic!("Expected ConfigFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_table_is_format_error() {
        assert!(matches!(
            table("\n\n", &["maxPP"]),
            Err(Error::ConfigFormat { .. })
        ));
    }

    #[test]
    fn test_blank_lines_and_crlf() {
        let rows: Vec<ParameterRow> = table("\r\nmaxPP\tnSimpleHF\r\n\r\n10\t2\r\n\n", &["maxPP"])
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("maxPP"), Some("10"));
        assert_eq!(rows[0].get("nSimpleHF"), Some("2"));
    }

    #[test]
    fn test_header_names_are_trimmed() {
        let t = table(" maxPP \t nSimpleHF\n1\t2\n", &["maxPP", "nSimpleHF"]).unwrap();
        assert_eq!(t.header(), &["maxPP".to_string(), "nSimpleHF".to_string()]);
    }

    #[test]
    fn test_short_row_leaves_columns_absent() {
        let mut t = table("maxPP\tnSimpleHF\n10\n", &["maxPP", "nSimpleHF"]).unwrap();
        let row = t.next().unwrap().unwrap();
        assert_eq!(row.get("maxPP"), Some("10"));
        assert_eq!(row.get("nSimpleHF"), None);
        assert!(t.next().is_none());
    }

    #[test]
    fn test_trailing_delimiter_is_ignored() {
        let rows: Vec<ParameterRow> = table(
            "clientSetSize\tserverSetSize\n100\t200\t\n300\t400\n",
            &["clientSetSize", "serverSetSize"],
        )
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("clientSetSize"), Some("100"));
        assert_eq!(rows[0].get("serverSetSize"), Some("200"));
        assert_eq!(rows[1].get("serverSetSize"), Some("400"));
    }

    #[test]
    fn test_values_past_last_column_are_ignored() {
        let mut t = table("maxPP\n1\t2\n3\n", &["maxPP"]).unwrap();
        let row = t.next().unwrap().unwrap();
        assert_eq!(row.number(), 1);
        assert_eq!(row.get("maxPP"), Some("1"));
        assert_eq!(t.next().unwrap().unwrap().get("maxPP"), Some("3"));
        assert!(t.next().is_none());
    }

    #[test]
    fn test_quoted_fields_are_unquoted() {
        let row = table(
            "clientSetSize\tcurve\n\"100\"\t\"P\t256 \"\"x\"\"\"\n",
            &["clientSetSize", "curve"],
        )
        .unwrap()
        .next()
        .unwrap()
        .unwrap();

        assert_eq!(row.get("clientSetSize"), Some("100"));
        assert_eq!(row.get("curve"), Some("P\t256 \"x\""));
    }

    #[test]
    fn test_invalid_utf8_row_is_row_error() {
        let mut t = ParameterTable::from_reader(
            Path::new("Parameters1.txt"),
            Cursor::new(b"maxPP\n1\n\xff\xfe\n3\n".to_vec()),
            b'\t',
            &names(&["maxPP"]),
        )
        .unwrap();

        assert_eq!(t.next().unwrap().unwrap().get("maxPP"), Some("1"));
        match t.next() {
            Some(Err(err @ Error::ConfigFormat { .. })) => {
                assert!(err.is_row_error());
                assert!(err.to_string().contains("row 2"));
            }
            other => panic!("Expected ConfigFormat, got {:?}", other),
        }
        let row = t.next().unwrap().unwrap();
        assert_eq!(row.number(), 3);
        assert_eq!(row.get("maxPP"), Some("3"));
    }

    #[test]
    fn test_empty_value_is_kept() {
        let row = table("maxPP\tnSimpleHF\n\t2\n", &["maxPP"])
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(row.get("maxPP"), Some(""));
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let err = ParameterTable::open(
            Path::new("/nonexistent/Parameters1.txt"),
            b'\t',
            &names(&["maxPP"]),
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::ConfigIo { .. }));
    }
}
