use async_trait::async_trait;
use hfprop_core::domain::{
    Coordinates, EngineRun, HourlyOutcome, NoiseEnvironment, PredictError, PredictResult,
    PredictionRequest,
};
use hfprop_core::modules::EngineLayout;
use hfprop_core::{BatchOrchestrator, EnginePort, Predictor};
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

/// Fails the configured engine hours and answers the rest after a delay that
/// shrinks with the hour, so late hours complete first.
struct ScriptedEngine {
    failing_engine_hours: Vec<u32>,
    completion_order: Mutex<Vec<u32>>,
}

impl ScriptedEngine {
    fn failing(hours: &[u32]) -> Self {
        Self {
            failing_engine_hours: hours.to_vec(),
            completion_order: Mutex::new(Vec::new()),
        }
    }
}

fn engine_hour(input: &str) -> u32 {
    input
        .lines()
        .find_map(|line| line.strip_prefix("Path.hour "))
        .and_then(|value| value.trim().parse().ok())
        .expect("deck should carry Path.hour")
}

#[async_trait]
impl EnginePort for ScriptedEngine {
    fn layout(&self) -> EngineLayout<'_> {
        EngineLayout {
            data_dir: Path::new("/opt/engine/data"),
            report_dir: Path::new("/tmp/hfprop"),
        }
    }

    async fn invoke(&self, input: &str, _timeout: Duration) -> PredictResult<EngineRun> {
        let hour = engine_hour(input);
        tokio::time::sleep(Duration::from_millis(u64::from(25 - hour) * 3)).await;
        self.completion_order
            .lock()
            .expect("order lock should not be poisoned")
            .push(hour);

        if self.failing_engine_hours.contains(&hour) {
            return Err(PredictError::engine_non_zero_exit(
                "RUN.ENGINE_EXIT",
                format!("engine crashed at hour {hour}"),
            ));
        }
        Ok(EngineRun {
            invocation_id: format!("{hour:016x}"),
            report: format!(
                "MUF = {muf}.0\nCalculated Parameters\n\
                 1, {hour}, 14.100, -100.0, 10.0, 80.0\nEnd Calculated\n",
                muf = 10 + hour % 10
            ),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
            succeeded: true,
            elapsed: Duration::from_millis(3),
        })
    }
}

fn base_request() -> PredictionRequest {
    PredictionRequest {
        tx: Coordinates::new(40.7128, -74.006),
        rx: Coordinates::new(51.5074, -0.1278),
        year: 2024,
        month: 6,
        hour: 12,
        ssn: 100,
        tx_power_watts: 100.0,
        frequencies_mhz: vec![14.1],
        noise: NoiseEnvironment::Residential,
        required_reliability: 90,
        required_snr_db: 10.0,
    }
}

#[tokio::test]
async fn failed_hours_keep_their_slots() {
    let engine = Arc::new(ScriptedEngine::failing(&[3, 17]));
    let predictor = Predictor::new(engine.clone(), Duration::from_secs(5));

    let batch = BatchOrchestrator::new(&predictor, 6).run(&base_request()).await;

    assert_eq!(batch.hours.len(), 24);
    assert_eq!(batch.failed, 2);
    assert_eq!(batch.succeeded, 22);
    for (index, entry) in batch.hours.iter().enumerate() {
        assert_eq!(entry.hour as usize, index);
        match (&entry.outcome, entry.hour) {
            (HourlyOutcome::Failed { error }, 3 | 17) => {
                assert!(error.contains(&format!("hour {}", entry.hour)), "error: {error}");
            }
            (HourlyOutcome::Predicted(prediction), hour) if hour != 3 && hour != 17 => {
                assert_eq!(prediction.frequencies.len(), 1);
                assert!(prediction.warning.is_none());
            }
            (outcome, hour) => panic!("unexpected outcome for hour {hour}: {outcome:?}"),
        }
    }

    let completion = engine
        .completion_order
        .lock()
        .expect("order lock should not be poisoned")
        .clone();
    assert_eq!(completion.len(), 24);
    assert_ne!(completion, (1..=24).collect::<Vec<_>>());
}

#[tokio::test]
async fn midnight_uses_engine_hour_twenty_four() {
    let engine = Arc::new(ScriptedEngine::failing(&[24]));
    let predictor = Predictor::new(engine, Duration::from_secs(5));

    let batch = BatchOrchestrator::new(&predictor, 24).run(&base_request()).await;

    let midnight = batch.entry(0).expect("hour 0 should be present");
    assert!(midnight.outcome.is_failed());
    assert_eq!(batch.failed, 1);
    assert!(!batch.entry(23).expect("hour 23 should be present").outcome.is_failed());
}

#[tokio::test]
async fn sequential_and_parallel_batches_agree() {
    let sequential = {
        let predictor = Predictor::new(
            Arc::new(ScriptedEngine::failing(&[5])),
            Duration::from_secs(5),
        );
        BatchOrchestrator::new(&predictor, 1).run(&base_request()).await
    };
    let parallel = {
        let predictor = Predictor::new(
            Arc::new(ScriptedEngine::failing(&[5])),
            Duration::from_secs(5),
        );
        BatchOrchestrator::new(&predictor, 12).run(&base_request()).await
    };

    assert_eq!(sequential, parallel);
    let serialized = serde_json::to_value(&parallel).expect("batch should serialize");
    assert_eq!(serialized["hours"][5]["error"], "engine crashed at hour 5");
    assert_eq!(serialized["hours"][6]["muf"], 16.0);
}
