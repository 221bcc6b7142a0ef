//! Network evaluation via ONNX Runtime.
//!
//! The inference boundary of the crate: a batch of encoded positions goes
//! in, one evaluation scalar per position comes out. The concrete backend
//! loads an ONNX value network through the `ort` crate when the `neural`
//! feature is enabled; without it (or without a model file) evaluation
//! returns `None` and callers fall back to whatever they have.

#[cfg(feature = "neural")]
use ort::session::{builder::GraphOptimizationLevel, Session};
#[cfg(feature = "neural")]
use std::sync::Mutex;

use super::encoding::InputPlanes;
#[cfg(feature = "neural")]
use super::encoding::TOTAL_PLANES;

/// Batch evaluation of encoded positions.
pub trait Evaluator {
    /// Evaluates a batch, returning one scalar per input, or `None` when
    /// no backend is available.
    fn evaluate_batch(&self, batch: &[InputPlanes]) -> Option<Vec<f32>>;
}

/// ONNX-backed value evaluator.
pub struct OnnxEvaluator {
    #[cfg(feature = "neural")]
    session: Option<Mutex<Session>>,
}

impl OnnxEvaluator {
    /// Creates an evaluator, loading the ONNX model from the given path.
    ///
    /// If the model cannot be loaded the evaluator stays empty and all
    /// batch calls return `None`.
    pub fn new(model_path: Option<&str>) -> OnnxEvaluator {
        #[cfg(feature = "neural")]
        {
            let session = model_path.and_then(load_session).map(Mutex::new);
            if session.is_some() {
                eprintln!("info string Loaded value ONNX model");
            }
            OnnxEvaluator { session }
        }

        #[cfg(not(feature = "neural"))]
        {
            let _ = model_path;
            OnnxEvaluator {}
        }
    }

    /// Returns true if a model is loaded.
    pub fn has_model(&self) -> bool {
        #[cfg(feature = "neural")]
        {
            self.session.is_some()
        }
        #[cfg(not(feature = "neural"))]
        {
            false
        }
    }
}

impl Evaluator for OnnxEvaluator {
    fn evaluate_batch(&self, batch: &[InputPlanes]) -> Option<Vec<f32>> {
        #[cfg(feature = "neural")]
        {
            let mutex = self.session.as_ref()?;
            let mut session = mutex.lock().ok()?;
            run_value_batch(&mut session, batch)
        }
        #[cfg(not(feature = "neural"))]
        {
            let _ = batch;
            None
        }
    }
}

/// Loads an ONNX session from a file path. Returns None on failure.
#[cfg(feature = "neural")]
fn load_session(path: &str) -> Option<Session> {
    match Session::builder()
        .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
        .and_then(|b| b.with_intra_threads(4))
        .and_then(|b| b.commit_from_file(path))
    {
        Ok(session) => Some(session),
        Err(e) => {
            eprintln!("info string Failed to load ONNX model {}: {}", path, e);
            None
        }
    }
}

/// Runs batched value inference over expanded plane tensors.
#[cfg(feature = "neural")]
fn run_value_batch(session: &mut Session, batch: &[InputPlanes]) -> Option<Vec<f32>> {
    use ort::value::Value;

    if batch.is_empty() {
        return Some(Vec::new());
    }

    let mut data = Vec::with_capacity(batch.len() * TOTAL_PLANES * 64);
    for planes in batch {
        expand_planes(planes, &mut data);
    }
    let input = Value::from_array(([batch.len(), TOTAL_PLANES, 8, 8], data)).ok()?;

    let outputs = session.run(ort::inputs![input]).ok()?;
    let (_shape, values) = outputs[0].try_extract_tensor::<f32>().ok()?;
    if values.len() < batch.len() {
        return None;
    }
    Some(values[..batch.len()].to_vec())
}

/// Expands one plane sequence into 112 * 64 floats: the plane's value on
/// set squares, zero elsewhere.
#[allow(dead_code)]
fn expand_planes(planes: &InputPlanes, out: &mut Vec<f32>) {
    for plane in planes {
        for bit in 0..64 {
            if plane.mask & (1u64 << bit) != 0 {
                out.push(plane.value);
            } else {
                out.push(0.0);
            }
        }
    }
}
