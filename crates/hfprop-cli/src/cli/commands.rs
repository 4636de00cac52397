use super::CliError;
use super::helpers::{build_predictor, engine_config, print_json};
use crate::server::{AppState, build_router};
use anyhow::Context;
use hfprop_core::common::config::{
    DEFAULT_BATCH_WORKERS, DEFAULT_ENGINE_TIMEOUT, DEFAULT_REQUIRED_DATA_FILE,
};
use hfprop_core::modules::{PredictionQuery, probe};
use hfprop_core::{BandTable, BatchOrchestrator, RequestValidator, map_bands};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(clap::Args, Debug, Clone)]
pub(super) struct EngineArgs {
    /// Prediction engine executable
    #[arg(long, env = "HFPROP_ENGINE")]
    pub(super) engine: PathBuf,

    /// Directory holding the engine's shared libraries (default: engine's directory)
    #[arg(long, env = "HFPROP_ENGINE_DIR")]
    pub(super) engine_dir: Option<PathBuf>,

    /// Engine reference-data directory
    #[arg(long, env = "HFPROP_DATA_DIR")]
    pub(super) data_dir: PathBuf,

    /// Directory for per-invocation input and report files
    #[arg(long, env = "HFPROP_SCRATCH_DIR")]
    pub(super) scratch_dir: Option<PathBuf>,

    /// Engine wall-clock limit in seconds
    #[arg(
        long,
        env = "HFPROP_TIMEOUT_SECS",
        default_value_t = DEFAULT_ENGINE_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub(super) timeout_secs: u64,

    /// Concurrent engine processes for hourly batches
    #[arg(long, env = "HFPROP_WORKERS", default_value_t = DEFAULT_BATCH_WORKERS)]
    pub(super) workers: usize,

    /// Reference-data file that must exist for the engine to be ready
    #[arg(long, default_value = DEFAULT_REQUIRED_DATA_FILE)]
    pub(super) required_file: String,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub(super) struct QueryArgs {
    /// Transmitter latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    tx_lat: Option<String>,

    /// Transmitter longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    tx_lon: Option<String>,

    /// Receiver latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    rx_lat: Option<String>,

    /// Receiver longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    rx_lon: Option<String>,

    /// Year (default: current UTC year)
    #[arg(long)]
    year: Option<String>,

    /// Month 1-12 (default: current UTC month)
    #[arg(long)]
    month: Option<String>,

    /// Hour of day 0-23 (default: current UTC hour; ignored by `hourly`)
    #[arg(long)]
    hour: Option<String>,

    /// Sunspot number
    #[arg(long)]
    ssn: Option<String>,

    /// Transmit power in watts
    #[arg(long)]
    tx_power: Option<String>,

    /// Comma separated probe frequencies in MHz
    #[arg(long)]
    frequencies: Option<String>,

    /// Man-made noise environment: CITY, RESIDENTIAL, RURAL or QUIET
    #[arg(long)]
    noise: Option<String>,

    /// Required circuit reliability in percent
    #[arg(long)]
    reliability: Option<String>,

    /// Required signal-to-noise ratio in dB
    #[arg(long, allow_hyphen_values = true)]
    snr: Option<String>,
}

impl QueryArgs {
    fn into_query(self) -> PredictionQuery {
        PredictionQuery {
            tx_lat: self.tx_lat,
            tx_lon: self.tx_lon,
            rx_lat: self.rx_lat,
            rx_lon: self.rx_lon,
            year: self.year,
            month: self.month,
            hour: self.hour,
            ssn: self.ssn,
            tx_power: self.tx_power,
            frequencies: self.frequencies,
            noise: self.noise,
            reliability: self.reliability,
            snr: self.snr,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub(super) struct PredictArgs {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(flatten)]
    query: QueryArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub(super) struct HealthArgs {
    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub(super) struct ServeArgs {
    /// Socket address to bind, e.g. 127.0.0.1:8080
    #[arg(long, env = "HFPROP_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    #[command(flatten)]
    engine: EngineArgs,
}

pub(super) async fn run_predict_command(args: PredictArgs) -> Result<i32, CliError> {
    let bands = BandTable::amateur_hf();
    let request = RequestValidator::new(&bands).validate(&args.query.into_query())?;
    let predictor = build_predictor(&engine_config(&args.engine))?;

    let result = predictor.predict(&request).await?;
    print_json(&result)?;
    Ok(0)
}

pub(super) async fn run_hourly_command(args: PredictArgs) -> Result<i32, CliError> {
    let bands = BandTable::amateur_hf();
    let request = RequestValidator::new(&bands).validate(&args.query.into_query())?;
    let config = engine_config(&args.engine);
    let predictor = build_predictor(&config)?;

    let batch = BatchOrchestrator::new(&predictor, config.batch_workers)
        .run(&request)
        .await;
    print_json(&batch)?;
    Ok(0)
}

pub(super) async fn run_bands_command(args: PredictArgs) -> Result<i32, CliError> {
    let bands = BandTable::amateur_hf();
    let request = RequestValidator::new(&bands).validate(&args.query.into_query())?;
    let predictor = build_predictor(&engine_config(&args.engine))?;

    let result = predictor.predict(&request).await?;
    print_json(&map_bands(&result, &bands))?;
    Ok(0)
}

pub(super) fn run_health_command(args: HealthArgs) -> Result<i32, CliError> {
    let report = probe(&engine_config(&args.engine));
    print_json(&report)?;
    Ok(if report.ready { 0 } else { 1 })
}

pub(super) async fn run_serve_command(args: ServeArgs) -> Result<i32, CliError> {
    let config = engine_config(&args.engine);
    let predictor = build_predictor(&config)?;
    let state = AppState::new(predictor, Arc::new(BandTable::amateur_hf()), Arc::new(config));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    info!(
        "hfprop listening on {}",
        listener.local_addr().context("listener has no local address")?
    );
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::{PredictArgs, QueryArgs};
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: PredictArgs,
    }

    #[test]
    fn negative_coordinates_parse_as_values() {
        let harness = Harness::try_parse_from([
            "hfprop",
            "--engine",
            "/opt/p533/bin/p533",
            "--data-dir",
            "/opt/p533/data",
            "--tx-lat",
            "-33.9",
            "--tx-lon",
            "-70.6",
            "--rx-lat",
            "51.5",
            "--rx-lon",
            "-0.12",
            "--workers",
            "2",
        ])
        .expect("arguments should parse");

        assert_eq!(harness.args.engine.workers, 2);
        assert_eq!(harness.args.engine.timeout_secs, 30);
        let query = harness.args.query.into_query();
        assert_eq!(query.tx_lat.as_deref(), Some("-33.9"));
        assert_eq!(query.rx_lon.as_deref(), Some("-0.12"));
        assert!(query.frequencies.is_none());
    }

    #[test]
    fn empty_query_args_leave_every_field_unset() {
        let query = QueryArgs::default().into_query();
        assert!(query.tx_lat.is_none());
        assert!(query.hour.is_none());
    }
}
