pub mod bands;
pub mod batch;
pub mod health;
pub mod input;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod serialization;
pub mod traits;
pub mod validator;

pub use bands::map_bands;
pub use batch::BatchOrchestrator;
pub use health::{HealthReport, probe};
pub use input::{EngineLayout, serialize_request};
pub use pipeline::Predictor;
pub use report::{ParsedReport, parse_report};
pub use runner::{ProcessEngine, ScratchFiles};
pub use traits::EnginePort;
pub use validator::{PredictionQuery, RequestValidator};
