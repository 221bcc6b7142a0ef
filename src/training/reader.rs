//! Training-record stream reader.
//!
//! Reads fixed-size records from any byte source. The stream has no
//! header: end of input at a record boundary is a clean end of stream,
//! while input that ends mid-record means the file is corrupt. The source
//! is plain bytes; decompression wrappers belong to the caller.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::record::{RecordError, TrainingRecord, RECORD_SIZE};

/// Reads training records from a byte source.
pub struct TrainingDataReader<R: Read> {
    source: R,
}

impl TrainingDataReader<BufReader<File>> {
    /// Opens a buffered reader over a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<TrainingDataReader<BufReader<File>>, RecordError> {
        let file = File::open(path)?;
        Ok(TrainingDataReader::new(BufReader::new(file)))
    }
}

impl<R: Read> TrainingDataReader<R> {
    pub fn new(source: R) -> TrainingDataReader<R> {
        TrainingDataReader { source }
    }

    /// Reads the next record.
    ///
    /// Returns `Ok(None)` at a clean end of stream, and
    /// `RecordError::Truncated` when the stream ends mid-record.
    pub fn read_record(&mut self) -> Result<Option<TrainingRecord>, RecordError> {
        let mut buf = [0u8; RECORD_SIZE];
        let mut filled = 0;
        while filled < RECORD_SIZE {
            let n = self.source.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        match filled {
            0 => Ok(None),
            RECORD_SIZE => Ok(Some(TrainingRecord::from_bytes(&buf)?)),
            short => Err(RecordError::Truncated(short)),
        }
    }

    /// Iterates all remaining records.
    pub fn records(self) -> Records<R> {
        Records { reader: self }
    }
}

/// Iterator adapter over a record stream.
pub struct Records<R: Read> {
    reader: TrainingDataReader<R>,
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<TrainingRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::encoding::{InputFormat, InputPlane, TOTAL_PLANES};
    use crate::training::record::RECORD_VERSION;
    use crate::training::writer::TrainingDataWriter;

    fn sample_record(p1: u32) -> TrainingRecord {
        let planes = [InputPlane::default(); TOTAL_PLANES];
        TrainingRecord::from_planes(
            RECORD_VERSION,
            InputFormat::CastlingPlane,
            &planes,
            1.0,
            0.0,
            p1,
            9,
        )
    }

    fn stream_of(records: &[TrainingRecord]) -> Vec<u8> {
        let mut writer = TrainingDataWriter::new(Vec::new());
        for record in records {
            writer.write_record(record).unwrap();
        }
        writer.into_inner().unwrap()
    }

    #[test]
    fn reads_back_whole_stream() {
        let bytes = stream_of(&[sample_record(1), sample_record(2), sample_record(3)]);
        let mut reader = TrainingDataReader::new(bytes.as_slice());
        for expected in 1..=3u32 {
            let record = reader.read_record().unwrap().unwrap();
            assert_eq!(record.p1_index, expected);
        }
        assert!(reader.read_record().unwrap().is_none());
        // End of stream is stable.
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn short_tail_is_corruption() {
        let mut bytes = stream_of(&[sample_record(1)]);
        bytes.extend_from_slice(&[0u8; 17]);
        let mut reader = TrainingDataReader::new(bytes.as_slice());
        assert!(reader.read_record().unwrap().is_some());
        assert!(matches!(
            reader.read_record(),
            Err(RecordError::Truncated(17))
        ));
    }

    #[test]
    fn empty_stream_is_clean_eof() {
        let mut reader = TrainingDataReader::new(&[] as &[u8]);
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn iterator_yields_all_records() {
        let bytes = stream_of(&[sample_record(5), sample_record(6)]);
        let reader = TrainingDataReader::new(bytes.as_slice());
        let records: Result<Vec<_>, _> = reader.records().collect();
        let records = records.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].p1_index, 5);
        assert_eq!(records[1].p1_index, 6);
    }
}
