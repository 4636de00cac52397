pub mod errors;

pub use errors::{ErrorCategory, ErrorReport, PredictError, PredictResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const HOURS_PER_DAY: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Man-made noise category understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NoiseEnvironment {
    City,
    #[default]
    Residential,
    Rural,
    Quiet,
}

impl NoiseEnvironment {
    pub const ALL: [NoiseEnvironment; 4] =
        [Self::City, Self::Residential, Self::Rural, Self::Quiet];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::City => "CITY",
            Self::Residential => "RESIDENTIAL",
            Self::Rural => "RURAL",
            Self::Quiet => "QUIET",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        let normalized = token.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(normalized))
    }
}

impl Display for NoiseEnvironment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// A validated single-point prediction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub tx: Coordinates,
    pub rx: Coordinates,
    pub year: i32,
    pub month: u32,
    /// Hour of day, 0-23. The engine counts 1-24, see [`Self::engine_hour`].
    pub hour: u32,
    pub ssn: u32,
    pub tx_power_watts: f64,
    pub frequencies_mhz: Vec<f64>,
    pub noise: NoiseEnvironment,
    pub required_reliability: u32,
    pub required_snr_db: f64,
}

impl PredictionRequest {
    /// Midnight is hour 24 of the previous day in the engine's indexing.
    pub const fn engine_hour(&self) -> u32 {
        if self.hour == 0 { 24 } else { self.hour }
    }

    pub fn at_hour(&self, hour: u32) -> Self {
        Self {
            hour,
            ..self.clone()
        }
    }
}

/// One row of the engine's "Calculated Parameters" table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineReportLine {
    pub frequency: f64,
    pub received_power: f64,
    pub snr: f64,
    pub reliability: f64,
}

/// Raw text kept alongside results for troubleshooting.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineDiagnostics {
    pub input: String,
    pub stdout: String,
    pub stderr: String,
    pub raw_report: String,
    pub exit_code: Option<i32>,
}

/// Outcome of a single engine process invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRun {
    pub invocation_id: String,
    pub report: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub succeeded: bool,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub muf: Option<f64>,
    pub frequencies: Vec<EngineReportLine>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_warning: Option<String>,
    pub invocation_id: String,
    pub elapsed_ms: u64,
    pub diagnostics: EngineDiagnostics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BandStatus {
    Good,
    Fair,
    Poor,
}

impl BandStatus {
    pub const GOOD_THRESHOLD: f64 = 70.0;
    pub const FAIR_THRESHOLD: f64 = 40.0;

    pub fn from_reliability(reliability: f64) -> Self {
        if reliability >= Self::GOOD_THRESHOLD {
            Self::Good
        } else if reliability >= Self::FAIR_THRESHOLD {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::Poor => "POOR",
        }
    }
}

impl Display for BandStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandEntry {
    pub band: String,
    pub nominal_frequency: f64,
    #[serde(flatten)]
    pub line: EngineReportLine,
    pub status: BandStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandResult {
    pub muf: Option<f64>,
    pub bands: Vec<BandEntry>,
    pub best_band: Option<String>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_warning: Option<String>,
}

impl BandResult {
    pub fn get(&self, band: &str) -> Option<&BandEntry> {
        self.bands.iter().find(|entry| entry.band == band)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPrediction {
    pub muf: Option<f64>,
    pub frequencies: Vec<EngineReportLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HourlyOutcome {
    Predicted(HourlyPrediction),
    Failed { error: String },
}

impl HourlyOutcome {
    pub fn from_result(result: PredictResult<PredictionResult>) -> Self {
        match result {
            Ok(prediction) => Self::Predicted(HourlyPrediction {
                muf: prediction.muf,
                frequencies: prediction.frequencies,
                warning: prediction.error.or(prediction.engine_warning),
            }),
            Err(error) => Self::Failed {
                error: error.message().to_string(),
            },
        }
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyEntry {
    pub hour: u32,
    #[serde(flatten)]
    pub outcome: HourlyOutcome,
}

/// Exactly one entry per hour of day, ordered 0..=23.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyBatchResult {
    pub hours: Vec<HourlyEntry>,
    pub succeeded: usize,
    pub failed: usize,
}

impl HourlyBatchResult {
    /// Places outcomes by hour; hours without an outcome are recorded as failures.
    pub fn assemble(outcomes: impl IntoIterator<Item = (u32, HourlyOutcome)>) -> Self {
        let mut slots: Vec<Option<HourlyOutcome>> = (0..HOURS_PER_DAY).map(|_| None).collect();
        for (hour, outcome) in outcomes {
            if let Some(slot) = slots.get_mut(hour as usize) {
                *slot = Some(outcome);
            }
        }

        let hours = slots
            .into_iter()
            .zip(0..HOURS_PER_DAY)
            .map(|(outcome, hour)| HourlyEntry {
                hour,
                outcome: outcome.unwrap_or_else(|| HourlyOutcome::Failed {
                    error: format!("no prediction was recorded for hour {hour}"),
                }),
            })
            .collect::<Vec<_>>();
        let failed = hours.iter().filter(|entry| entry.outcome.is_failed()).count();

        Self {
            succeeded: hours.len() - failed,
            failed,
            hours,
        }
    }

    pub fn entry(&self, hour: u32) -> Option<&HourlyEntry> {
        self.hours.get(hour as usize)
    }
}
