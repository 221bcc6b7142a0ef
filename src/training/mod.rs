//! Training-data persistence.
//!
//! The fixed-layout binary record pairing encoded planes with game
//! outcomes, plus the append-only writer and the stream reader that share
//! its exact byte layout.

pub mod reader;
pub mod record;
pub mod writer;

pub use reader::TrainingDataReader;
pub use record::{
    drift_correct, RecordError, TrainingRecord, PLANE_WORDS, RECORD_SIZE, RECORD_VERSION,
};
pub use writer::TrainingDataWriter;
