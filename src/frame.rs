use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};

/// Column-oriented tabular payload: ordered columns of equal length.
///
/// Cells are plain strings; the remote template decides how to interpret
/// them. Construction enforces that every column has the same number of
/// rows and that column names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Column {
    name: String,
    values: Vec<String>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a frame from `(name, values)` pairs, preserving order.
    pub fn from_columns<N, I>(columns: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Vec<String>)>,
    {
        let mut frame = Self::new();
        for (name, values) in columns {
            frame.push_column(name, values)?;
        }
        Ok(frame)
    }

    /// Appends a column. Every column after the first must match the
    /// existing row count.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidData("column name must not be empty".into()));
        }
        if self.columns.iter().any(|c| c.name == name) {
            return Err(Error::InvalidData(format!("duplicate column {name:?}")));
        }
        if let Some(first) = self.columns.first() {
            if values.len() != first.values.len() {
                return Err(Error::InvalidData(format!(
                    "column {name:?} has {} row(s), expected {}",
                    values.len(),
                    first.values.len()
                )));
            }
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// Builds a frame from a header row plus row-major records, as returned
    /// by the export endpoint.
    pub(crate) fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column {
                name,
                values: Vec::with_capacity(rows.len()),
            })
            .collect();

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::InvalidData(format!(
                    "row {i} has {} cell(s), expected {}",
                    row.len(),
                    columns.len()
                )));
            }
            for (col, cell) in columns.iter_mut().zip(row) {
                col.values.push(cell);
            }
        }

        Ok(Self { columns })
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// True when the frame has no data rows (it may still have columns).
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Cell values of the named column, if present.
    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Serializes to canonical CSV: one header row, then data rows.
    ///
    /// This is the single wire payload every import path normalizes to.
    pub fn to_csv(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Err(Error::InvalidData("frame has no columns".into()));
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.columns.iter().map(|c| c.name.as_str()))
            .map_err(|e| Error::InvalidData(format!("failed to encode CSV header: {e}")))?;

        for i in 0..self.num_rows() {
            writer
                .write_record(self.columns.iter().map(|c| c.values[i].as_str()))
                .map_err(|e| Error::InvalidData(format!("failed to encode CSV row {i}: {e}")))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::InvalidData(format!("failed to flush CSV: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| Error::InvalidData(format!("CSV output is not UTF-8: {e}")))
    }

    /// Row-of-records JSON form, used when uploading data to a staged job.
    pub fn to_records(&self) -> Vec<Value> {
        (0..self.num_rows())
            .map(|i| {
                let mut record = serde_json::Map::with_capacity(self.columns.len());
                for col in &self.columns {
                    record.insert(col.name.clone(), Value::String(col.values[i].clone()));
                }
                Value::Object(record)
            })
            .collect()
    }
}

/// An import source: an in-memory [`Frame`], a CSV file on disk, or a
/// caller-owned reader producing CSV text.
///
/// Every variant normalizes to the same canonical CSV payload before the
/// request is built, so the wire body is identical regardless of where the
/// data came from. Readers are consumed but never closed by the client.
pub enum ImportInput<'a> {
    Frame(&'a Frame),
    Path(&'a Path),
    Reader(Box<dyn Read + 'a>),
}

impl std::fmt::Debug for ImportInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportInput::Frame(frame) => f.debug_tuple("Frame").field(frame).finish(),
            ImportInput::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ImportInput::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl<'a> From<&'a Frame> for ImportInput<'a> {
    fn from(frame: &'a Frame) -> Self {
        ImportInput::Frame(frame)
    }
}

impl<'a> From<&'a Path> for ImportInput<'a> {
    fn from(path: &'a Path) -> Self {
        ImportInput::Path(path)
    }
}

impl<'a> ImportInput<'a> {
    pub fn from_reader(reader: impl Read + 'a) -> Self {
        ImportInput::Reader(Box::new(reader))
    }

    /// Normalizes the input to the canonical CSV payload.
    pub(crate) fn into_csv(self) -> Result<String> {
        let csv = match self {
            ImportInput::Frame(frame) => {
                if frame.is_empty() {
                    return Err(Error::InvalidData("frame has no rows".into()));
                }
                frame.to_csv()?
            }
            ImportInput::Path(path) => {
                std::fs::read_to_string(path).map_err(|source| Error::Io {
                    path: path.display().to_string(),
                    source,
                })?
            }
            ImportInput::Reader(mut reader) => {
                let mut buf = String::new();
                reader.read_to_string(&mut buf).map_err(|source| Error::Io {
                    path: "<reader>".to_string(),
                    source,
                })?;
                buf
            }
        };

        if csv.trim().is_empty() {
            return Err(Error::InvalidData("import payload is empty".into()));
        }
        Ok(csv)
    }
}
