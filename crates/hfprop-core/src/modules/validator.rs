use crate::common::{
    BandTable, ENGINE_MAX_FREQUENCY_MHZ, ENGINE_MIN_FREQUENCY_MHZ, within_engine_range,
};
use crate::domain::{
    Coordinates, NoiseEnvironment, PredictError, PredictResult, PredictionRequest,
};
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Deserialize;
use std::str::FromStr;

pub const DEFAULT_SSN: u32 = 100;
pub const DEFAULT_TX_POWER_WATTS: f64 = 100.0;
pub const DEFAULT_REQUIRED_RELIABILITY: u32 = 90;
pub const DEFAULT_REQUIRED_SNR_DB: f64 = 10.0;

/// Raw, unvalidated request parameters as they arrive from a query string or CLI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionQuery {
    pub tx_lat: Option<String>,
    pub tx_lon: Option<String>,
    pub rx_lat: Option<String>,
    pub rx_lon: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub hour: Option<String>,
    pub ssn: Option<String>,
    pub tx_power: Option<String>,
    pub frequencies: Option<String>,
    pub noise: Option<String>,
    pub reliability: Option<String>,
    pub snr: Option<String>,
}

pub struct RequestValidator<'a> {
    bands: &'a BandTable,
    now: DateTime<Utc>,
}

impl<'a> RequestValidator<'a> {
    pub fn new(bands: &'a BandTable) -> Self {
        Self::at(bands, Utc::now())
    }

    /// Uses `now` for the year/month/hour defaults.
    pub fn at(bands: &'a BandTable, now: DateTime<Utc>) -> Self {
        Self { bands, now }
    }

    pub fn validate(&self, query: &PredictionQuery) -> PredictResult<PredictionRequest> {
        let tx = Coordinates::new(
            required_coordinate(query.tx_lat.as_deref(), "txLat", "INPUT.TX_LAT", 90.0)?,
            required_coordinate(query.tx_lon.as_deref(), "txLon", "INPUT.TX_LON", 180.0)?,
        );
        let rx = Coordinates::new(
            required_coordinate(query.rx_lat.as_deref(), "rxLat", "INPUT.RX_LAT", 90.0)?,
            required_coordinate(query.rx_lon.as_deref(), "rxLon", "INPUT.RX_LON", 180.0)?,
        );

        let year = optional_number(query.year.as_deref(), "year", "INPUT.YEAR")?
            .unwrap_or(self.now.year());
        if !(1900..=2100).contains(&year) {
            return Err(out_of_range("INPUT.YEAR", "year", year, "1900-2100"));
        }

        let month = optional_number(query.month.as_deref(), "month", "INPUT.MONTH")?
            .unwrap_or(self.now.month());
        if !(1..=12).contains(&month) {
            return Err(out_of_range("INPUT.MONTH", "month", month, "1-12"));
        }

        let hour = optional_number(query.hour.as_deref(), "hour", "INPUT.HOUR")?
            .unwrap_or(self.now.hour());
        if hour > 23 {
            return Err(out_of_range("INPUT.HOUR", "hour", hour, "0-23"));
        }

        let ssn = optional_number(query.ssn.as_deref(), "ssn", "INPUT.SSN")?.unwrap_or(DEFAULT_SSN);

        let tx_power_watts =
            optional_finite(query.tx_power.as_deref(), "txPower", "INPUT.TX_POWER")?
                .unwrap_or(DEFAULT_TX_POWER_WATTS);
        if tx_power_watts <= 0.0 {
            return Err(out_of_range("INPUT.TX_POWER", "txPower", tx_power_watts, "> 0 W"));
        }

        let frequencies_mhz = match present(query.frequencies.as_deref()) {
            Some(raw) => parse_frequency_list(raw)?,
            None => self.bands.probe_frequencies(),
        };
        if frequencies_mhz.is_empty() {
            return Err(PredictError::invalid_request(
                "INPUT.FREQUENCIES",
                "no probe frequencies inside the engine's 2-30 MHz range",
            ));
        }

        let noise = match present(query.noise.as_deref()) {
            Some(raw) => NoiseEnvironment::from_token(raw).ok_or_else(|| {
                PredictError::invalid_request(
                    "INPUT.NOISE",
                    format!(
                        "parameter 'noise' must be CITY, RESIDENTIAL, RURAL or QUIET, got '{raw}'"
                    ),
                )
            })?,
            None => NoiseEnvironment::default(),
        };

        let required_reliability =
            optional_number(query.reliability.as_deref(), "reliability", "INPUT.RELIABILITY")?
                .unwrap_or(DEFAULT_REQUIRED_RELIABILITY);
        if required_reliability > 100 {
            return Err(out_of_range(
                "INPUT.RELIABILITY",
                "reliability",
                required_reliability,
                "0-100",
            ));
        }

        let required_snr_db = optional_finite(query.snr.as_deref(), "snr", "INPUT.SNR")?
            .unwrap_or(DEFAULT_REQUIRED_SNR_DB);

        Ok(PredictionRequest {
            tx,
            rx,
            year,
            month,
            hour,
            ssn,
            tx_power_watts,
            frequencies_mhz,
            noise,
            required_reliability,
            required_snr_db,
        })
    }
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn required_coordinate(
    raw: Option<&str>,
    name: &str,
    code: &'static str,
    limit: f64,
) -> PredictResult<f64> {
    let value = optional_finite(raw, name, code)?.ok_or_else(|| {
        PredictError::invalid_request(code, format!("missing required parameter '{name}'"))
    })?;
    if value.abs() > limit {
        return Err(out_of_range(code, name, value, &format!("-{limit}..{limit}")));
    }
    Ok(value)
}

fn optional_finite(
    raw: Option<&str>,
    name: &str,
    code: &'static str,
) -> PredictResult<Option<f64>> {
    let Some(raw) = present(raw) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(PredictError::invalid_request(
            code,
            format!("parameter '{name}' must be a finite number, got '{raw}'"),
        )),
    }
}

fn optional_number<T: FromStr>(
    raw: Option<&str>,
    name: &str,
    code: &'static str,
) -> PredictResult<Option<T>> {
    let Some(raw) = present(raw) else {
        return Ok(None);
    };
    raw.parse::<T>().map(Some).map_err(|_| {
        PredictError::invalid_request(
            code,
            format!("parameter '{name}' must be a whole number, got '{raw}'"),
        )
    })
}

fn out_of_range(
    code: &'static str,
    name: &str,
    value: impl std::fmt::Display,
    expected: &str,
) -> PredictError {
    PredictError::invalid_request(
        code,
        format!("parameter '{name}' is out of range: {value} (expected {expected})"),
    )
}

fn parse_frequency_list(raw: &str) -> PredictResult<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.parse::<f64>() {
            Ok(frequency) if within_engine_range(frequency) => Ok(frequency),
            Ok(frequency) => Err(out_of_range(
                "INPUT.FREQUENCIES",
                "frequencies",
                frequency,
                &format!("{ENGINE_MIN_FREQUENCY_MHZ}-{ENGINE_MAX_FREQUENCY_MHZ} MHz"),
            )),
            Err(_) => Err(PredictError::invalid_request(
                "INPUT.FREQUENCIES",
                format!("parameter 'frequencies' contains a non-numeric entry '{token}'"),
            )),
        })
        .collect()
}
