//! Neural-network input encoding.
//!
//! Converts position histories into the fixed 112-plane input tensor the
//! value/policy networks consume, including the symmetry canonicalization
//! that collapses up to eight equivalent board orientations into one.

pub mod backend;
pub mod encoding;
pub mod transform;

pub use backend::{Evaluator, OnnxEvaluator};
pub use encoding::{
    encode_position_for_nn, transform_for_position, FillEmptyHistory, InputFormat, InputPlane,
    InputPlanes, UnsupportedFormat, AUX_PLANE_BASE, MOVE_HISTORY, PLANES_PER_BOARD, TOTAL_PLANES,
};
pub use transform::{
    apply_transform, choose_transform, FLIP_TRANSFORM, MIRROR_TRANSFORM, NO_TRANSFORM,
    TRANSPOSE_TRANSFORM,
};
