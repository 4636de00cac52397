//! HF propagation prediction adapter.
//!
//! Encodes path requests for an external prediction engine, runs the engine
//! as a subprocess, and decodes its report into per-frequency reliability data.

pub mod common;
pub mod domain;
pub mod modules;

pub use common::{BandTable, EngineConfig};
pub use domain::{PredictError, PredictResult, PredictionRequest, PredictionResult};
pub use modules::{
    BatchOrchestrator, EnginePort, Predictor, ProcessEngine, RequestValidator, map_bands,
};
