//! CSV record writer.

use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{RecordRow, RecordSink, RowFormat, HEADER};
use crate::error::AppResult;
use crate::measurement::Sample;

/// Writes one CSV row per sample, flushing after each so an interrupted run
/// leaves only complete rows behind.
pub struct CsvRecordSink {
    path: PathBuf,
    format: RowFormat,
    writer: Option<csv::Writer<File>>,
    rows: u64,
}

impl CsvRecordSink {
    /// Open `path` for appending and write the header row.
    ///
    /// Collision handling happens before this, see [`super::resolve_output_path`].
    pub fn create<P: Into<PathBuf>>(path: P, format: RowFormat) -> AppResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush()?;

        info!("CSV record initialized at '{}'.", path.display());
        Ok(Self {
            path,
            format,
            writer: Some(writer),
            rows: 0,
        })
    }

    /// Location of the record file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of sample rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }
}

#[async_trait]
impl RecordSink for CsvRecordSink {
    async fn append(&mut self, sample: &Sample) -> AppResult<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.serialize(RecordRow::new(sample, &self.format))?;
            writer.flush()?;
            self.rows += 1;
        }
        Ok(())
    }

    async fn close(&mut self) -> AppResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            debug!(rows = self.rows, "CSV record closed");
        }
        Ok(())
    }
}
