//! Delimited-text reader for scanner exports
//!
//! Parsing is permissive about row width: rows are returned exactly as they
//! appear and the loader enforces that they match the header.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, instrument};

/// One parsed row, fields in file order
pub type RawRecord = Vec<String>;

/// Label used in errors when reading from an anonymous stream
const STREAM_ORIGIN: &str = "<stream>";

/// Reader settings
#[derive(Debug, Clone, Copy)]
pub struct TabularReader {
    delimiter: u8,
    has_header: bool,
}

impl Default for TabularReader {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }
}

impl TabularReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Treat the first row as column names (default), or synthesize names
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Read every row of the file at `path`
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn read_path(&self, path: &Path) -> Result<Vec<RawRecord>> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        self.read_records(file, path)
    }

    /// Read every row from an arbitrary byte stream
    pub fn read<R: Read>(&self, reader: R) -> Result<Vec<RawRecord>> {
        self.read_records(reader, Path::new(STREAM_ORIGIN))
    }

    /// Read a file and split it into header and data rows
    pub fn read_scan_file(&self, path: &Path) -> Result<ScanFile> {
        let records = self.read_path(path)?;
        ScanFile::from_records(records, self.has_header)
    }

    fn read_records<R: Read>(&self, reader: R, origin: &Path) -> Result<Vec<RawRecord>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in csv_reader.records() {
            let record = result.map_err(|e| map_csv_error(e, origin))?;
            records.push(record.iter().map(str::to_string).collect());
        }

        debug!(records = records.len(), "Parsed delimited text");
        Ok(records)
    }
}

fn map_csv_error(err: csv::Error, origin: &Path) -> Error {
    let position = err
        .position()
        .map(|p| format!("line {}, record {}", p.line(), p.record()))
        .unwrap_or_else(|| format!("{}", origin.display()));
    let message = err.to_string();

    match err.into_kind() {
        csv::ErrorKind::Io(source) => Error::io(origin, source),
        _ => Error::Parse { position, message },
    }
}

/// Parsed export: header plus data rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFile {
    pub header: RawRecord,
    pub rows: Vec<RawRecord>,
}

impl ScanFile {
    /// Split parsed rows into header and data.
    ///
    /// Without a header row, columns are named `column_1..column_N` after
    /// the width of the first row.
    pub fn from_records(mut records: Vec<RawRecord>, has_header: bool) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::schema("input contains no rows, a header row is required"));
        }

        let header = if has_header {
            records.remove(0)
        } else {
            (1..=records[0].len())
                .map(|i| format!("column_{}", i))
                .collect()
        };

        Ok(Self {
            header,
            rows: records,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_quoted_fields() {
        let data = "Host,Name\nh1,\"Apache, httpd \"\"mod_ssl\"\"\"\n";
        let records = TabularReader::new().read(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1], vec!["h1", "Apache, httpd \"mod_ssl\""]);
    }

    #[test]
    fn test_ragged_rows_are_not_rejected() {
        let data = "a,b,c\n1,2\n1,2,3,4\n";
        let records = TabularReader::new().read(data.as_bytes()).unwrap();

        assert_eq!(records[1].len(), 2);
        assert_eq!(records[2].len(), 4);
    }

    #[test]
    fn test_custom_delimiter() {
        let data = "Host;CVSS\nh1;9.8\n";
        let records = TabularReader::new()
            .delimiter(b';')
            .read(data.as_bytes())
            .unwrap();

        assert_eq!(records[1], vec!["h1", "9.8"]);
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let data: &[u8] = b"Host,Name\nh1,\xff\xfe\n";
        let err = TabularReader::new().read(data).unwrap_err();

        assert!(matches!(err, Error::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TabularReader::new()
            .read_path(Path::new("/definitely/not/here.csv"))
            .unwrap_err();

        match err {
            Error::Io { path, .. } => assert!(path.ends_with("here.csv")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_scan_file_splits_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Host,CVSS").unwrap();
        writeln!(file, "h1,10").unwrap();
        writeln!(file, "h2,3").unwrap();

        let scan = TabularReader::new().read_scan_file(file.path()).unwrap();
        assert_eq!(scan.header, vec!["Host", "CVSS"]);
        assert_eq!(scan.row_count(), 2);
    }

    #[test]
    fn test_headerless_input_synthesizes_names() {
        let records = vec![vec!["h1".to_string(), "10".to_string()]];
        let scan = ScanFile::from_records(records, false).unwrap();

        assert_eq!(scan.header, vec!["column_1", "column_2"]);
        assert_eq!(scan.row_count(), 1);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = ScanFile::from_records(Vec::new(), true).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }
}
