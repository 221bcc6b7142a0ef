//! Append-only training-record writer.
//!
//! Records go out one at a time, in order, and are never rewritten; the
//! stream carries no header or count, so a file is valid after any whole
//! number of records. Compression, when wanted, is a wrapper supplied by
//! the caller around the sink.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::record::TrainingRecord;

/// Writes training records to any byte sink.
pub struct TrainingDataWriter<W: Write> {
    sink: W,
    records_written: u64,
}

impl TrainingDataWriter<BufWriter<File>> {
    /// Creates a buffered writer over a new file, truncating any previous
    /// content.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<TrainingDataWriter<BufWriter<File>>> {
        let file = File::create(path)?;
        Ok(TrainingDataWriter::new(BufWriter::new(file)))
    }
}

impl<W: Write> TrainingDataWriter<W> {
    pub fn new(sink: W) -> TrainingDataWriter<W> {
        TrainingDataWriter {
            sink,
            records_written: 0,
        }
    }

    /// Appends one record.
    pub fn write_record(&mut self, record: &TrainingRecord) -> io::Result<()> {
        self.sink.write_all(&record.to_bytes())?;
        self.records_written += 1;
        Ok(())
    }

    /// Records appended so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flushes buffered bytes to the sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    /// Flushes and returns the underlying sink.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}
