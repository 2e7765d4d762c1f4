use crate::model::{Row, Scalar};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

/// Input encodings accepted for the row dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFormat {
    #[default]
    Csv,
    Json,
}

impl DataFormat {
    /// Guess the format from a file extension, defaulting to CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DataFormat::Json,
            _ => DataFormat::Csv,
        }
    }
}

impl FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(DataFormat::Csv),
            "json" => Ok(DataFormat::Json),
            other => Err(format!("Unsupported data format '{}' (expected csv or json)", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableData {
    pub rows: Vec<Row>,
}

impl TableData {
    /// Create TableData from a JSON Array of Objects
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        let mut rows = Vec::with_capacity(array.len());
        for (idx, item) in array.iter().enumerate() {
            if !item.is_object() {
                return Err(anyhow!("Item {} in array must be an object", idx));
            }
            let row: Row = serde_json::from_value(item.clone())
                .with_context(|| format!("Unsupported value type in row {}", idx + 1))?;
            rows.push(row);
        }

        Ok(Self { rows })
    }

    /// Create TableData from CSV with a header line.
    ///
    /// Cells are kept as text; empty cells become null so that a blank value
    /// column drops the row instead of reading as zero.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (idx, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV row {}", idx + 1))?;
            let row: Row = headers
                .iter()
                .zip(record.iter())
                .map(|(header, cell)| {
                    let value = if cell.is_empty() {
                        Scalar::Null
                    } else {
                        Scalar::Text(cell.to_string())
                    };
                    (header.clone(), value)
                })
                .collect();
            rows.push(row);
        }

        Ok(Self { rows })
    }

    pub fn from_reader<R: Read>(reader: R, format: DataFormat) -> Result<Self> {
        match format {
            DataFormat::Csv => Self::from_csv(reader),
            DataFormat::Json => {
                let value: Value =
                    serde_json::from_reader(reader).context("Failed to parse JSON data")?;
                Self::from_json(&value)
            }
        }
    }

    /// Read rows from a file, or from stdin when no path is given
    pub fn load(path: Option<&Path>, format: Option<DataFormat>) -> Result<Self> {
        match path {
            Some(path) => {
                let format = format.unwrap_or_else(|| DataFormat::from_path(path));
                let file = File::open(path)
                    .with_context(|| format!("Failed to open data file '{}'", path.display()))?;
                Self::from_reader(BufReader::new(file), format)
            }
            None => {
                let stdin = io::stdin();
                Self::from_reader(stdin.lock(), format.unwrap_or_default())
            }
        }
    }
}
