use super::ReportSink;
use crate::error::Result;
use scanrep_core::ReportGrid;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::PathBuf;

/// JSON document keyed by sheet name, each sheet an array of row objects
pub struct JsonSink<W: Write> {
    writer: W,
    path: Option<PathBuf>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, path: None }
    }

    /// Sink whose writer is backed by the file at `path`
    pub fn to_file(writer: W, path: PathBuf) -> Self {
        Self {
            writer,
            path: Some(path),
        }
    }
}

/// Rows of `grid` as objects keyed by header label
pub fn grid_to_json(grid: &dyn ReportGrid) -> Result<Value> {
    let headers = grid.headers();
    let rows = grid
        .rows()
        .into_iter()
        .map(|row| {
            let mut object = Map::new();
            for (header, value) in headers.iter().zip(row) {
                object.insert(header.clone(), serde_json::to_value(value)?);
            }
            Ok(Value::Object(object))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Value::Array(rows))
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn write(&mut self, grids: &[&dyn ReportGrid]) -> Result<Vec<PathBuf>> {
        let mut document = Map::new();
        for grid in grids {
            document.insert(grid.sheet_name().to_string(), grid_to_json(*grid)?);
        }

        serde_json::to_writer_pretty(&mut self.writer, &Value::Object(document))?;
        writeln!(self.writer)?;
        self.writer.flush()?;

        Ok(self.path.iter().cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use scanrep_core::report::{HostScore, TypeCounts};

    #[test]
    fn test_document_shape() {
        let hosts = vec![HostScore {
            host: "h1".to_string(),
            cvss_total: 18,
            critical: 1,
            severe: 0,
            high: 1,
            medium: 0,
            low: 0,
        }];
        let types = TypeCounts {
            ssl: 2,
            ..Default::default()
        };

        let mut buffer = Vec::new();
        let files = JsonSink::new(&mut buffer).write(&[&hosts, &types]).unwrap();
        assert!(files.is_empty());

        let value: Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["Top Vulnerable Hosts"][0]["Host"], "h1");
        assert_eq!(value["Top Vulnerable Hosts"][0]["CVSS Total"], 18);
        assert_eq!(value["Vulnerabilities By Type"][0]["SSL"], 2);
    }

    #[test]
    fn test_sheet_and_column_order_is_kept() {
        let hosts = vec![HostScore {
            host: "h1".to_string(),
            cvss_total: 18,
            critical: 1,
            severe: 0,
            high: 1,
            medium: 0,
            low: 0,
        }];
        let types = TypeCounts::default();

        let mut buffer = Vec::new();
        JsonSink::new(&mut buffer).write(&[&types, &hosts]).unwrap();

        let value: Value = serde_json::from_slice(&buffer).unwrap();
        let sheets: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(sheets, vec!["Vulnerabilities By Type", "Top Vulnerable Hosts"]);

        let columns: Vec<&str> = value["Top Vulnerable Hosts"][0]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            columns,
            vec!["Host", "CVSS Total", "Critical", "Severe", "High", "Medium", "Low"]
        );
    }
}
