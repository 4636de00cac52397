use hfprop_core::{BandTable, EngineConfig, Predictor};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub bands: Arc<BandTable>,
    pub engine: Arc<EngineConfig>,
}

impl AppState {
    pub fn new(predictor: Predictor, bands: Arc<BandTable>, engine: Arc<EngineConfig>) -> Self {
        Self {
            predictor,
            bands,
            engine,
        }
    }
}
