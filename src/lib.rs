//! Octant -- chess position encoding for self-play training.
//!
//! Exposes the board model, the canonicalizing plane encoder, the
//! training-record codec, and the file conversion pipeline for use by
//! integration tests and the binary entry point.

pub mod board;
pub mod nn;
pub mod pipeline;
pub mod training;
