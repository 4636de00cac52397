use super::input::EngineLayout;
use crate::domain::{EngineRun, PredictResult};
use async_trait::async_trait;
use std::time::Duration;

/// Capability to run the prediction engine on a serialized input deck.
///
/// The production implementation is [`super::ProcessEngine`]; tests substitute
/// canned reports without spawning processes.
#[async_trait]
pub trait EnginePort: Send + Sync {
    /// Directories the input deck must point the engine at.
    fn layout(&self) -> EngineLayout<'_>;

    async fn invoke(&self, input: &str, timeout: Duration) -> PredictResult<EngineRun>;
}
