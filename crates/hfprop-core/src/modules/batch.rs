//! Fan-out of the single-point pipeline across the 24 hours of a day.

use super::pipeline::Predictor;
use crate::domain::{HOURS_PER_DAY, HourlyBatchResult, HourlyOutcome, PredictionRequest};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct BatchOrchestrator<'a> {
    predictor: &'a Predictor,
    workers: usize,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(predictor: &'a Predictor, workers: usize) -> Self {
        Self {
            predictor,
            workers: workers.max(1),
        }
    }

    /// Predicts every hour of `base`'s day. The hour on `base` is ignored.
    ///
    /// A failing hour is recorded in its own slot and never aborts the batch.
    pub async fn run(&self, base: &PredictionRequest) -> HourlyBatchResult {
        let outcomes = stream::iter(0..HOURS_PER_DAY)
            .map(|hour| {
                let request = base.at_hour(hour);
                async move {
                    let result = self.predictor.predict(&request).await;
                    if let Err(error) = &result {
                        warn!(
                            hour,
                            code = error.code(),
                            "hourly prediction failed: {}",
                            error.message()
                        );
                    }
                    (hour, HourlyOutcome::from_result(result))
                }
            })
            .buffer_unordered(self.workers)
            .collect::<Vec<_>>()
            .await;

        let batch = HourlyBatchResult::assemble(outcomes);
        info!(
            succeeded = batch.succeeded,
            failed = batch.failed,
            workers = self.workers,
            "hourly batch finished"
        );
        batch
    }
}
