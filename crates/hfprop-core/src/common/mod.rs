pub mod bands;
pub mod config;

pub use bands::{
    BAND_MATCH_TOLERANCE_MHZ, Band, BandTable, ENGINE_MAX_FREQUENCY_MHZ, ENGINE_MIN_FREQUENCY_MHZ,
    within_engine_range,
};
pub use config::EngineConfig;
