//! Dataset output as JSON lines or CSV.

use crate::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// One JSON object per line
    Jsonl,
    /// Header row from the record field names
    Csv,
}

impl DatasetFormat {
    /// Guesses the format from a file extension, defaulting to JSON lines.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => DatasetFormat::Csv,
            _ => DatasetFormat::Jsonl,
        }
    }
}

enum Sink {
    Jsonl(BufWriter<File>),
    Csv(csv::Writer<File>),
}

/// Writes flat records to a dataset file
pub struct DatasetWriter {
    sink: Sink,
    written: usize,
}

impl DatasetWriter {
    pub fn create<P: AsRef<Path>>(path: P, format: DatasetFormat) -> Result<Self> {
        let sink = match format {
            DatasetFormat::Jsonl => Sink::Jsonl(BufWriter::new(File::create(path)?)),
            DatasetFormat::Csv => Sink::Csv(csv::Writer::from_path(path)?),
        };
        Ok(Self { sink, written: 0 })
    }

    pub fn write_all<T: Serialize>(&mut self, records: &[T]) -> Result<usize> {
        for record in records {
            self.write(record)?;
        }
        Ok(records.len())
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        match &mut self.sink {
            Sink::Jsonl(writer) => {
                serde_json::to_writer(&mut *writer, record)?;
                writer.write_all(b"\n")?;
            }
            Sink::Csv(writer) => writer.serialize(record)?,
        }
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        match &mut self.sink {
            Sink::Jsonl(writer) => writer.flush()?,
            Sink::Csv(writer) => writer.flush()?,
        }
        Ok(())
    }
}

impl Drop for DatasetWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
