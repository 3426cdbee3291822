use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::SinkError;
use crate::models::DowntimeRecord;

/// Durable destination for closed downtime intervals.
pub trait DowntimeSink {
    fn append(&self, record: &DowntimeRecord) -> Result<(), SinkError>;
}

/// Append-only CSV file, opened and closed for every record.
pub struct CsvLog {
    path: PathBuf,
}

impl CsvLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

impl DowntimeSink for CsvLog {
    fn append(&self, record: &DowntimeRecord) -> Result<(), SinkError> {
        info!("Adding a downtime line to the CSV log file: {}", self.path.display());
        self.write_line(&format!("{}\n", record))
            .map_err(|source| SinkError::Write { path: self.path.clone(), source })
    }
}
