//! Single-point prediction: serialize, invoke, parse.

use super::input::serialize_request;
use super::report::parse_report;
use super::serialization::{RAW_REPORT_LIMIT, truncate_diagnostic};
use super::traits::EnginePort;
use crate::domain::{EngineDiagnostics, PredictResult, PredictionRequest, PredictionResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Predictor {
    engine: Arc<dyn EnginePort>,
    timeout: Duration,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Predictor {
    pub fn new(engine: Arc<dyn EnginePort>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    /// Runs one engine pass for `request`.
    ///
    /// Engine failures are returned as errors carrying diagnostics. A report
    /// that cannot be parsed still produces a result with `error` set.
    pub async fn predict(&self, request: &PredictionRequest) -> PredictResult<PredictionResult> {
        let input = serialize_request(request, &self.engine.layout());
        debug!(hour = request.hour, frequencies = request.frequencies_mhz.len(), "invoking engine");

        let run = self
            .engine
            .invoke(&input, self.timeout)
            .await
            .map_err(|error| error.with_input(&input))?;

        let parsed = parse_report(&run.report);
        if let Some(error) = &parsed.error {
            warn!(invocation = %run.invocation_id, code = error.code(), "{}", error.message());
        }

        let engine_warning = (!run.succeeded).then(|| match run.exit_code {
            Some(code) => {
                format!("engine exited with status {code}; results were read from its report")
            }
            None => {
                "engine was terminated by a signal; results were read from its report".to_string()
            }
        });

        Ok(PredictionResult {
            muf: parsed.muf,
            error: parsed.error_message(),
            frequencies: parsed.lines,
            engine_warning,
            invocation_id: run.invocation_id,
            elapsed_ms: u64::try_from(run.elapsed.as_millis()).unwrap_or(u64::MAX),
            diagnostics: EngineDiagnostics {
                input,
                stdout: run.stdout,
                stderr: run.stderr,
                raw_report: truncate_diagnostic(&run.report, RAW_REPORT_LIMIT),
                exit_code: run.exit_code,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Predictor;
    use crate::domain::{
        Coordinates, EngineRun, ErrorCategory, NoiseEnvironment, PredictError, PredictResult,
        PredictionRequest,
    };
    use crate::modules::input::EngineLayout;
    use crate::modules::traits::EnginePort;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    struct CannedEngine {
        report: String,
        exit_code: Option<i32>,
        fail: bool,
    }

    #[async_trait]
    impl EnginePort for CannedEngine {
        fn layout(&self) -> EngineLayout<'_> {
            EngineLayout {
                data_dir: Path::new("/opt/engine/data"),
                report_dir: Path::new("/tmp/hfprop"),
            }
        }

        async fn invoke(&self, _input: &str, _timeout: Duration) -> PredictResult<EngineRun> {
            if self.fail {
                return Err(PredictError::engine_timeout("RUN.ENGINE_TIMEOUT", "engine timed out"));
            }
            Ok(EngineRun {
                invocation_id: "abcd".to_string(),
                report: self.report.clone(),
                stdout: "ok".to_string(),
                stderr: String::new(),
                exit_code: self.exit_code,
                succeeded: self.exit_code == Some(0),
                elapsed: Duration::from_millis(25),
            })
        }
    }

    fn request() -> PredictionRequest {
        PredictionRequest {
            tx: Coordinates::new(40.7, -74.0),
            rx: Coordinates::new(51.5, -0.1),
            year: 2024,
            month: 3,
            hour: 0,
            ssn: 100,
            tx_power_watts: 100.0,
            frequencies_mhz: vec![14.1],
            noise: NoiseEnvironment::Residential,
            required_reliability: 90,
            required_snr_db: 10.0,
        }
    }

    fn predictor(engine: CannedEngine) -> Predictor {
        Predictor::new(Arc::new(engine), Duration::from_secs(5))
    }

    const REPORT: &str = "\
BMUF: 15.0
Calculated Parameters
1, 2, 14.100, -99.0, 11.0, 75.0
End Calculated
";

    #[tokio::test]
    async fn clean_run_produces_rows_and_diagnostics() {
        let result = predictor(CannedEngine {
            report: REPORT.to_string(),
            exit_code: Some(0),
            fail: false,
        })
        .predict(&request())
        .await
        .expect("prediction should succeed");

        assert_eq!(result.frequencies.len(), 1);
        assert_eq!(result.muf, Some(15.0));
        assert!(result.error.is_none());
        assert!(result.engine_warning.is_none());
        assert_eq!(result.elapsed_ms, 25);
        assert!(result.diagnostics.input.contains("Path.hour 24"));
        assert_eq!(result.diagnostics.raw_report, REPORT);
    }

    #[tokio::test]
    async fn non_zero_exit_keeps_rows_and_warns() {
        let result = predictor(CannedEngine {
            report: REPORT.to_string(),
            exit_code: Some(3),
            fail: false,
        })
        .predict(&request())
        .await
        .expect("tolerated exit should still predict");

        assert_eq!(result.frequencies.len(), 1);
        assert_eq!(result.diagnostics.exit_code, Some(3));
        assert!(result.engine_warning.as_deref().is_some_and(|warning| warning.contains('3')));
    }

    #[tokio::test]
    async fn unparseable_report_is_a_result_with_error() {
        let result = predictor(CannedEngine {
            report: "*".repeat(5000),
            exit_code: Some(0),
            fail: false,
        })
        .predict(&request())
        .await
        .expect("parse failures are absorbed");

        assert!(result.frequencies.is_empty());
        assert!(result.error.is_some());
        assert!(result.diagnostics.raw_report.ends_with("[truncated]"));
    }

    #[tokio::test]
    async fn engine_errors_carry_generated_input() {
        let error = predictor(CannedEngine {
            report: String::new(),
            exit_code: None,
            fail: true,
        })
        .predict(&request())
        .await
        .expect_err("engine failure should propagate");

        assert_eq!(error.category(), ErrorCategory::EngineTimeout);
        let diagnostics = error.diagnostics().expect("diagnostics should be attached");
        assert!(diagnostics.input.contains("Path.frequency 14.100"));
    }
}
